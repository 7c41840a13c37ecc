//! Lupine Store
//!
//! This crate provides the storage trait and SQLite implementation for batch
//! processes and their execution sessions. Data is persisted to a single
//! SQLite database owned by the store.
//!
//! The [`BatchStore`] trait defines operations for:
//! - Saving, fetching, canceling, and deleting batch process records
//! - Creating session records and walking them through their lifecycle
//! - Pulling the next `created` session for a batch
//!
//! All operations are serialized over one shared connection, so callers on
//! many tasks observe a total order of effects. Creation operations are
//! idempotent: re-saving an existing batch id or re-creating an existing
//! session keeps the stored row and discards the fresh data.

mod conn;
mod options;
mod row;
mod schema;
mod sqlite;

pub use options::{DecodePolicy, StoreOptions};
pub use sqlite::SqliteBatchStore;

use async_trait::async_trait;
use lupine_batch::{BatchProcess, BatchSession, BatchSessionChanges};

/// Error type for batch store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The store could not be opened or its schema could not be created.
  #[error("failed to open batch store")]
  Open(#[source] sqlx::Error),

  /// No batch process matched, or the lookup itself failed.
  #[error("batch process not found")]
  NotFound {
    #[source]
    source: Option<sqlx::Error>,
  },

  /// A batch process insert or update could not be committed.
  #[error("failed to save batch process")]
  Save(#[source] sqlx::Error),

  /// A batch process delete could not be committed.
  #[error("failed to delete batch process")]
  Delete(#[source] sqlx::Error),

  /// No batch session matched, or the lookup itself failed.
  #[error("batch session not found")]
  SessionNotFound {
    #[source]
    source: Option<sqlx::Error>,
  },

  /// A batch session insert or update could not be committed.
  #[error("failed to save batch session")]
  SessionSave(#[source] sqlx::Error),

  /// A stored row did not match the expected shape, or a payload could not
  /// be encoded or decoded.
  #[error("invalid stored {context}")]
  Payload {
    context: &'static str,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
  },
}

/// Storage trait for batch processes and their sessions.
#[async_trait]
pub trait BatchStore: Send + Sync {
  /// Save a new batch process record.
  ///
  /// Idempotent: if the batch id already exists the stored row is kept and
  /// the fresh data discarded. Returns the canonical stored row either way.
  async fn save_batch_process(&self, process: BatchProcess) -> Result<BatchProcess, Error>;

  /// Get a batch process record by id.
  async fn get_batch_process(&self, batch_id: &str) -> Result<BatchProcess, Error>;

  /// Mark a batch process as canceled. The flag is monotonic and the
  /// operation idempotent; unknown ids are a no-op.
  async fn cancel_batch_process(&self, batch_id: &str) -> Result<(), Error>;

  /// Delete a batch process record and, via cascade, all of its sessions.
  /// Unknown ids succeed silently.
  async fn delete_batch_process(&self, batch_id: &str) -> Result<(), Error>;

  /// Create a session attached to a batch process.
  ///
  /// Idempotent: if `(batch_id, session_id)` already exists the stored row
  /// is kept unchanged. Returns the canonical stored row either way.
  async fn create_session(&self, session: BatchSession) -> Result<BatchSession, Error>;

  /// Get a session by session id alone.
  ///
  /// Session ids are expected to be globally unique across batches; the
  /// schema only enforces uniqueness per batch, so this is a caller
  /// contract.
  async fn get_session(&self, session_id: &str) -> Result<BatchSession, Error>;

  /// Get the earliest-created session still in the `created` state for a
  /// batch, for callers pulling the next unit of work.
  async fn get_created_session(&self, batch_id: &str) -> Result<BatchSession, Error>;

  /// Get all sessions in the `created` state for a batch, in creation
  /// order. Returns an empty vector when none exist.
  async fn get_created_sessions(&self, batch_id: &str) -> Result<Vec<BatchSession>, Error>;

  /// Apply a partial update to a session and return the refreshed row.
  ///
  /// An empty changes object performs no write but still returns the
  /// current row.
  async fn update_session_state(
    &self,
    batch_id: &str,
    session_id: &str,
    changes: BatchSessionChanges,
  ) -> Result<BatchSession, Error>;
}
