//! Error types for SEQQUORUM
//!
//! Every failure carries an [`ErrorKind`] telling the caller whether retrying the
//! same request can possibly help. Failures gathered from several nodes during one
//! call are folded into an [`AggregatedError`].

use crate::types::Fingerprint;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Retry classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request is invalid or was rejected for cause; retrying it unchanged is pointless
    Permanent,
    /// Network, server or timing trouble; the same request may succeed later
    Ephemeral,
}

impl ErrorKind {
    /// Classify a non-200 HTTP status.
    ///
    /// Server errors and rate limiting are worth retrying, every other rejection is not.
    pub fn from_status(status: u16) -> Self {
        if status >= 500 || status == 429 {
            ErrorKind::Ephemeral
        } else {
            ErrorKind::Permanent
        }
    }

    pub fn is_permanent(self) -> bool {
        self == ErrorKind::Permanent
    }

    pub fn is_ephemeral(self) -> bool {
        self == ErrorKind::Ephemeral
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Permanent => write!(f, "permanent"),
            ErrorKind::Ephemeral => write!(f, "ephemeral"),
        }
    }
}

/// Main error type for SEQQUORUM
#[derive(Error, Debug, Clone)]
pub enum QuorumError {
    // ============ Request Errors ============
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request failed with status {status} and body {body}")]
    Status { status: u16, body: String },

    // ============ Response Errors ============
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Field {field} of type {type_name} is required")]
    MissingField {
        field: &'static str,
        type_name: &'static str,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to normalize response: {0}")]
    Canonicalization(String),

    // ============ Network Errors ============
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Close timed out after {0:?}")]
    CloseTimeout(Duration),

    // ============ Quorum Errors ============
    #[error(transparent)]
    Aggregated(AggregatedError),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    Config(String),

    // ============ General Errors ============
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuorumError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuorumError::InvalidRequest(_)
            | QuorumError::MalformedResponse(_)
            | QuorumError::MissingField { .. }
            | QuorumError::InvalidResponse(_)
            | QuorumError::CloseTimeout(_)
            | QuorumError::Config(_) => ErrorKind::Permanent,

            QuorumError::Status { status, .. } => ErrorKind::from_status(*status),

            QuorumError::Canonicalization(_)
            | QuorumError::Network(_)
            | QuorumError::Timeout(_)
            | QuorumError::Cancelled(_)
            | QuorumError::Internal(_) => ErrorKind::Ephemeral,

            QuorumError::Aggregated(aggregated) => aggregated.kind(),
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.kind().is_permanent()
    }

    pub fn is_ephemeral(&self) -> bool {
        self.kind().is_ephemeral()
    }

    /// Per-node detail, if this error was aggregated across several nodes
    pub fn aggregated(&self) -> Option<&AggregatedError> {
        match self {
            QuorumError::Aggregated(aggregated) => Some(aggregated),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for QuorumError {
    fn from(err: serde_json::Error) -> Self {
        QuorumError::MalformedResponse(err.to_string())
    }
}

impl From<AggregatedError> for QuorumError {
    fn from(err: AggregatedError) -> Self {
        QuorumError::Aggregated(err)
    }
}

/// What went wrong with one node during a multi-node call
#[derive(Debug, Clone)]
pub enum NodeFailure {
    /// The node failed outright
    Error(QuorumError),
    /// The node answered, but its answer did not reach a majority
    Disagreement(Fingerprint),
}

/// One node's contribution to an [`AggregatedError`]
#[derive(Debug, Clone)]
pub struct NodeReport {
    pub node: String,
    pub failure: NodeFailure,
}

impl fmt::Display for NodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            NodeFailure::Error(err) => write!(f, "{}: {}", self.node, err),
            NodeFailure::Disagreement(fingerprint) => {
                write!(f, "{}: answered {} without majority", self.node, fingerprint)
            }
        }
    }
}

/// Failure detail collected from every node consulted during one call.
///
/// The overall kind is Permanent only when every report is a Permanent error. A single
/// Ephemeral error or a disagreeing answer makes the whole call Ephemeral.
#[derive(Debug, Clone)]
pub struct AggregatedError {
    summary: String,
    reports: Vec<NodeReport>,
    all_permanent: bool,
}

impl AggregatedError {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            reports: Vec::new(),
            all_permanent: true,
        }
    }

    /// Record a node that failed
    pub fn push_error(&mut self, node: impl Into<String>, error: QuorumError) {
        if !error.is_permanent() {
            self.all_permanent = false;
        }
        self.reports.push(NodeReport {
            node: node.into(),
            failure: NodeFailure::Error(error),
        });
    }

    /// Record a node whose answer did not win
    pub fn push_disagreement(&mut self, node: impl Into<String>, fingerprint: Fingerprint) {
        self.all_permanent = false;
        self.reports.push(NodeReport {
            node: node.into(),
            failure: NodeFailure::Disagreement(fingerprint),
        });
    }

    pub fn kind(&self) -> ErrorKind {
        if self.all_permanent && !self.reports.is_empty() {
            ErrorKind::Permanent
        } else {
            ErrorKind::Ephemeral
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn reports(&self) -> &[NodeReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl fmt::Display for AggregatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}). Errors: [", self.summary, self.kind())?;
        for (i, report) in self.reports.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", report)?;
        }
        write!(f, "]")
    }
}

impl std::error::Error for AggregatedError {}
