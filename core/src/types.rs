//! Core types for SEQQUORUM
//!
//! Wire-level data returned by sequencer query nodes. Headers, proofs and VID data are
//! carried as opaque JSON trees; only the fields the client validates are typed.

use crate::error::QuorumError;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// 32-byte digest of the canonical form of a JSON response
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    pub const ZERO: Fingerprint = Fingerprint([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Fingerprint(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", &self.to_hex()[..16])
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint(0x{})", self.to_hex())
    }
}

/// Tagged base64 identifier such as `TX~aGVsbG8`
///
/// Used for transaction and block hashes. The tag is alphanumeric, the payload is
/// URL-safe base64 without padding.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaggedBase64(String);

impl TaggedBase64 {
    /// Parse and validate a tagged base64 string
    pub fn parse(s: &str) -> Result<Self, QuorumError> {
        let (tag, payload) = s
            .split_once('~')
            .ok_or_else(|| QuorumError::InvalidRequest(format!("missing '~' in tagged base64 {:?}", s)))?;

        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(QuorumError::InvalidRequest(format!("invalid tag in {:?}", s)));
        }

        URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| QuorumError::InvalidRequest(format!("invalid base64 in {:?}: {}", s, e)))?;

        Ok(TaggedBase64(s.to_string()))
    }

    /// Build from a tag and raw bytes
    pub fn new(tag: &str, bytes: &[u8]) -> Self {
        TaggedBase64(format!("{}~{}", tag, URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn tag(&self) -> &str {
        self.0.split_once('~').map(|(tag, _)| tag).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for TaggedBase64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TaggedBase64::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for TaggedBase64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TaggedBase64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaggedBase64({})", self.0)
    }
}

/// Byte string encoded as standard base64 on the wire
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes(bytes)
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD
            .decode(s.as_bytes())
            .map(Bytes)
            .map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes(0x{})", hex::encode(&self.0))
    }
}

/// Namespace identifier
pub type NamespaceId = u64;

/// Transaction submitted to, or returned by, the sequencer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub namespace: NamespaceId,
    pub payload: Bytes,
}

impl Transaction {
    pub fn new(namespace: NamespaceId, payload: impl Into<Bytes>) -> Self {
        Self {
            namespace,
            payload: payload.into(),
        }
    }
}

/// Block header of any protocol version
///
/// Kept as a JSON tree: version 0.1 headers are flat, later versions nest the
/// fields under `fields` next to a `version` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(pub Value);

impl Header {
    fn field(&self, name: &str) -> Option<&Value> {
        self.0
            .get(name)
            .or_else(|| self.0.get("fields").and_then(|fields| fields.get(name)))
    }

    /// Block height recorded in the header
    pub fn height(&self) -> Option<u64> {
        self.field("height").and_then(Value::as_u64)
    }

    /// Block timestamp recorded in the header
    pub fn timestamp(&self) -> Option<u64> {
        self.field("timestamp").and_then(Value::as_u64)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

/// Transaction lookup result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionQueryData {
    pub transaction: Transaction,
    pub hash: TaggedBase64,
    pub index: u64,
    pub proof: Value,
    pub block_hash: TaggedBase64,
    pub block_height: u64,
}

/// Explorer view of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerTransactionQueryData {
    #[serde(rename = "transaction_detail")]
    pub transaction_details: ExplorerTransactionDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerTransactionDetails {
    pub details: ExplorerDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerDetails {
    #[serde(rename = "height")]
    pub block_height: u64,
    pub hash: TaggedBase64,
}

/// Opaque VID common data
pub type VidCommon = Value;

/// VID common data lookup result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VidCommonQueryData {
    pub height: u64,
    pub block_hash: TaggedBase64,
    pub payload_hash: TaggedBase64,
    pub common: VidCommon,
}

/// Raw response of the namespace endpoint, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceResponse {
    #[serde(default)]
    pub proof: Option<Value>,
    #[serde(default)]
    pub transactions: Option<Vec<Transaction>>,
}

/// Validated transactions of one namespace in one block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionsInBlock {
    pub transactions: Vec<Bytes>,
    pub proof: Option<Value>,
    pub vid_common: Option<VidCommon>,
}

/// Block merkle proof at a snapshot height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMerkleProof {
    pub proof: Value,
}
