//! Persistence Module
//!
//! Remote-primary, local-fallback persistence for workflow schemas and
//! the HTTP boundary to the record backend.
//!
//! # Structure
//!
//! - [`session`]: process-wide bearer-token session store
//! - [`api`]: typed JSON-over-HTTP client for the backend
//! - [`local`]: file-backed fallback store under `.formflow/`
//! - [`store`]: the remote-primary / local-fallback CRUD façade
//! - [`loader`]: record edit-session orchestration

pub mod api;
pub mod loader;
pub mod local;
pub mod session;
pub mod store;

pub use api::{ApiClient, ValidationOutcome};
pub use loader::{EditSession, LoadOutcome};
pub use local::LocalStore;
pub use store::{SchemaPatch, Saved, WorkflowStore};

use thiserror::Error;

/// Failures surfaced by the persistence layer.
///
/// Recoverability follows the error taxonomy of the design: schema-load
/// failures fall back to the local cache; record-load failures block the
/// edit screen (a blank edit form would silently corrupt existing data);
/// submission failures are retryable and never discard entered values.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to load workflow schema '{id}': {message}")]
    SchemaLoad { id: String, message: String },

    #[error("failed to load record '{record_id}' of workflow '{workflow_id}': {message}")]
    RecordLoad {
        workflow_id: String,
        record_id: String,
        message: String,
    },

    #[error("workflow '{0}' not found")]
    NotFound(String),

    #[error("server returned status {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("submission failed (retry is safe, entered values are preserved): {0}")]
    Submission(String),
}

impl StoreError {
    /// Returns true for failures the user may simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Submission(_) | Self::Http(_) | Self::Remote { .. }
        )
    }
}
