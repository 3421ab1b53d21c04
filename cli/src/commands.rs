//! CLI Commands

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use seqquorum_core::{
    CallContext, ClientConfig, ErrorKind, QueryService, QuorumError, QuorumResult, SubmitApi,
    TaggedBase64, Transaction,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// A query to run against the node set
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Height,
    Header { height: u64 },
    Headers { from: u64, until: u64 },
    Transaction { hash: String },
    ExplorerTransaction { hash: String },
    VidCommon { height: u64 },
    Namespace { height: u64, namespace: u64 },
    MerkleProof { root_height: u64, height: u64 },
    Submit { namespace: u64, payload: Vec<u8> },
}

/// Default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("seqquorum").join("config.json"))
}

/// Load the configuration.
///
/// A missing file at the default location yields the defaults; a missing file that was
/// asked for explicitly is an error.
pub fn load_config(path: Option<&Path>, explicit: bool) -> QuorumResult<ClientConfig> {
    match path {
        Some(path) if path.exists() => ClientConfig::load(path),
        Some(path) if explicit => Err(QuorumError::Config(format!(
            "config file {} does not exist",
            path.display()
        ))),
        _ => Ok(ClientConfig::default()),
    }
}

/// Write a default configuration file
pub fn init_config(path: &Path, config: &ClientConfig, force: bool) -> QuorumResult<()> {
    if path.exists() && !force {
        return Err(QuorumError::Config(format!(
            "{} already exists, use --force to overwrite",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| QuorumError::Config(format!("cannot create {}: {}", parent.display(), e)))?;
    }
    std::fs::write(path, config.to_json()?)
        .map_err(|e| QuorumError::Config(format!("cannot write {}: {}", path.display(), e)))
}

/// Decode a payload given as hex or standard base64
pub fn parse_payload(hex_payload: Option<&str>, base64_payload: Option<&str>) -> QuorumResult<Vec<u8>> {
    match (hex_payload, base64_payload) {
        (Some(text), None) => hex::decode(text.trim_start_matches("0x"))
            .map_err(|e| QuorumError::InvalidRequest(format!("invalid hex payload: {}", e))),
        (None, Some(text)) => STANDARD
            .decode(text)
            .map_err(|e| QuorumError::InvalidRequest(format!("invalid base64 payload: {}", e))),
        _ => Err(QuorumError::InvalidRequest(
            "exactly one of --payload-hex and --payload-base64 is required".into(),
        )),
    }
}

fn to_json<T: Serialize>(value: &T) -> QuorumResult<Value> {
    serde_json::to_value(value).map_err(|e| QuorumError::Internal(e.to_string()))
}

/// Run one query and render its result as JSON
pub async fn run_query<C>(client: &C, ctx: &CallContext, query: Query) -> QuorumResult<Value>
where
    C: QueryService + SubmitApi + ?Sized,
{
    match query {
        Query::Height => {
            let height = client.fetch_latest_block_height(ctx).await?;
            Ok(json!(height))
        }
        Query::Header { height } => to_json(&client.fetch_header_by_height(ctx, height).await?),
        Query::Headers { from, until } => {
            to_json(&client.fetch_headers_by_range(ctx, from, until).await?)
        }
        Query::Transaction { hash } => {
            let hash = TaggedBase64::parse(&hash)?;
            to_json(&client.fetch_transaction_by_hash(ctx, &hash).await?)
        }
        Query::ExplorerTransaction { hash } => {
            let hash = TaggedBase64::parse(&hash)?;
            to_json(&client.fetch_explorer_transaction_by_hash(ctx, &hash).await?)
        }
        Query::VidCommon { height } => to_json(&client.fetch_vid_common_by_height(ctx, height).await?),
        Query::Namespace { height, namespace } => {
            to_json(&client.fetch_transactions_in_block(ctx, height, namespace).await?)
        }
        Query::MerkleProof { root_height, height } => {
            to_json(&client.fetch_block_merkle_proof(ctx, root_height, height).await?)
        }
        Query::Submit { namespace, payload } => {
            let hash = client
                .submit_transaction(ctx, &Transaction::new(namespace, payload))
                .await?;
            Ok(json!({ "hash": hash }))
        }
    }
}

/// Process exit code for a failed query
pub fn exit_code(err: &QuorumError) -> i32 {
    match err.kind() {
        ErrorKind::Permanent => 2,
        ErrorKind::Ephemeral => 1,
    }
}
