//! Query service routes, relative to a node's base URL

use seqquorum_core::{NamespaceId, TaggedBase64};

pub const BLOCK_HEIGHT: &str = "status/block-height";
pub const SUBMIT: &str = "submit/submit";

pub fn header(height: u64) -> String {
    format!("availability/header/{}", height)
}

/// Headers in `[from, until)`
pub fn header_range(from: u64, until: u64) -> String {
    format!("availability/header/{}/{}", from, until)
}

pub fn transaction_by_hash(hash: &TaggedBase64) -> String {
    format!("availability/transaction/hash/{}", hash)
}

pub fn explorer_transaction_by_hash(hash: &TaggedBase64) -> String {
    format!("explorer/transaction/hash/{}", hash)
}

pub fn vid_common(height: u64) -> String {
    format!("availability/vid/common/{}", height)
}

pub fn namespace(height: u64, namespace: NamespaceId) -> String {
    format!("availability/block/{}/namespace/{}", height, namespace)
}

pub fn block_merkle_proof(root_height: u64, height: u64) -> String {
    format!("block-state/{}/{}", root_height, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        let hash = TaggedBase64::new("TX", b"hello");

        assert_eq!(header(5), "availability/header/5");
        assert_eq!(header_range(1, 4), "availability/header/1/4");
        assert_eq!(transaction_by_hash(&hash), "availability/transaction/hash/TX~aGVsbG8");
        assert_eq!(explorer_transaction_by_hash(&hash), "explorer/transaction/hash/TX~aGVsbG8");
        assert_eq!(namespace(9, 42), "availability/block/9/namespace/42");
        assert_eq!(block_merkle_proof(10, 3), "block-state/10/3");
    }
}
