//! Decoding and validation of query responses
//!
//! Runs after a payload has been accepted, so every failure here is Permanent: asking
//! again returns the same payload.

use seqquorum_core::{Bytes, NamespaceId, NamespaceResponse, QuorumError, QuorumResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode an accepted payload
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> QuorumResult<T> {
    Ok(serde_json::from_slice(payload)?)
}

/// Namespace payloads that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceContent {
    pub transactions: Vec<Bytes>,
    /// `None` when the block has nothing in the namespace
    pub proof: Option<Value>,
}

/// Check a namespace response against the namespace it was requested for
pub fn validate_namespace_response(
    response: NamespaceResponse,
    namespace: NamespaceId,
) -> QuorumResult<NamespaceContent> {
    let transactions = response.transactions.ok_or(QuorumError::MissingField {
        field: "transactions",
        type_name: "NamespaceResponse",
    })?;

    let mut payloads = Vec::with_capacity(transactions.len());
    for (i, tx) in transactions.into_iter().enumerate() {
        if tx.namespace != namespace {
            return Err(QuorumError::InvalidResponse(format!(
                "transaction {} has wrong namespace ({}, expected {})",
                i, tx.namespace, namespace
            )));
        }
        payloads.push(tx.payload);
    }

    if !payloads.is_empty() && response.proof.is_none() {
        return Err(QuorumError::MissingField {
            field: "proof",
            type_name: "NamespaceResponse",
        });
    }

    Ok(NamespaceContent {
        transactions: payloads,
        proof: response.proof,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqquorum_core::Transaction;
    use serde_json::json;

    fn response(proof: Option<Value>, transactions: Option<Vec<Transaction>>) -> NamespaceResponse {
        NamespaceResponse { proof, transactions }
    }

    #[test]
    fn test_valid_namespace() {
        let txs = vec![Transaction::new(7, b"a".to_vec()), Transaction::new(7, b"b".to_vec())];
        let content = validate_namespace_response(response(Some(json!({"p": 1})), Some(txs)), 7).unwrap();

        assert_eq!(content.transactions, vec![Bytes(b"a".to_vec()), Bytes(b"b".to_vec())]);
        assert_eq!(content.proof, Some(json!({"p": 1})));
    }

    #[test]
    fn test_missing_transactions() {
        let err = validate_namespace_response(response(Some(json!({})), None), 7).unwrap_err();

        assert!(err.is_permanent());
        assert_eq!(err.to_string(), "Field transactions of type NamespaceResponse is required");
    }

    #[test]
    fn test_wrong_namespace() {
        let txs = vec![Transaction::new(7, b"a".to_vec()), Transaction::new(8, b"b".to_vec())];
        let err = validate_namespace_response(response(Some(json!({})), Some(txs)), 7).unwrap_err();

        assert!(err.is_permanent());
        assert!(err.to_string().contains("transaction 1 has wrong namespace (8, expected 7)"));
    }

    #[test]
    fn test_transactions_without_proof() {
        let txs = vec![Transaction::new(7, b"a".to_vec())];
        let err = validate_namespace_response(response(None, Some(txs)), 7).unwrap_err();

        assert!(matches!(err, QuorumError::MissingField { field: "proof", .. }));
    }

    #[test]
    fn test_empty_namespace() {
        let content = validate_namespace_response(response(None, Some(vec![])), 7).unwrap();

        assert!(content.transactions.is_empty());
        assert!(content.proof.is_none());
    }

    #[test]
    fn test_decode_failure_is_permanent() {
        let err = decode::<u64>(b"\"not a number\"").unwrap_err();

        assert!(matches!(err, QuorumError::MalformedResponse(_)));
        assert!(err.is_permanent());
    }
}
