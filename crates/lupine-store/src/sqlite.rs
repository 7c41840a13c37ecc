//! SQLite-backed batch store over a single serialized connection.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Connection, SqliteConnection};
use tracing::debug;

use lupine_batch::{BatchProcess, BatchSession, BatchSessionChanges};

use crate::conn::SerialConnection;
use crate::row::{decode_batch_process, decode_batch_session};
use crate::schema;
use crate::{BatchStore, Error, StoreOptions};

/// Outcome of an idempotent `INSERT OR IGNORE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertOutcome {
  Inserted,
  AlreadyExists,
}

impl InsertOutcome {
  fn from_rows_affected(rows: u64) -> Self {
    if rows == 0 {
      Self::AlreadyExists
    } else {
      Self::Inserted
    }
  }
}

/// SQLite-based [`BatchStore`] implementation.
///
/// Owns the only connection to its database file. All operations acquire
/// the serialization guard before touching the connection, run their
/// statements in a transaction, and release the guard afterward, including
/// on error — so the effective concurrency model is one operation in
/// flight at a time, globally.
pub struct SqliteBatchStore {
  conn: SerialConnection,
  options: StoreOptions,
}

impl SqliteBatchStore {
  /// Open (or create) the store backing file at the given path.
  pub async fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, Error> {
    let connect = SqliteConnectOptions::new()
      .filename(path)
      .create_if_missing(true)
      .foreign_keys(true);
    Self::connect(connect, options).await
  }

  /// Open a store on an in-memory database. Nothing survives the store
  /// being dropped; intended for tests.
  pub async fn in_memory(options: StoreOptions) -> Result<Self, Error> {
    let connect = SqliteConnectOptions::new()
      .in_memory(true)
      .foreign_keys(true);
    Self::connect(connect, options).await
  }

  async fn connect(connect: SqliteConnectOptions, options: StoreOptions) -> Result<Self, Error> {
    let mut conn = SqliteConnection::connect_with(&connect)
      .await
      .map_err(Error::Open)?;
    schema::create_tables(&mut conn).await.map_err(Error::Open)?;

    Ok(Self {
      conn: SerialConnection::new(conn),
      options,
    })
  }
}

#[async_trait]
impl BatchStore for SqliteBatchStore {
  async fn save_batch_process(&self, process: BatchProcess) -> Result<BatchProcess, Error> {
    let batches = serde_json::to_string(&process.batches).map_err(|e| Error::Payload {
      context: "batches",
      source: Some(Box::new(e)),
    })?;
    let graph = serde_json::to_string(&process.graph).map_err(|e| Error::Payload {
      context: "graph",
      source: Some(Box::new(e)),
    })?;

    let mut conn = self.conn.acquire().await;

    let mut tx = conn.begin().await.map_err(Error::Save)?;
    let result = sqlx::query(
      r#"
      INSERT OR IGNORE INTO batch_process (batch_id, batches, graph)
      VALUES (?, ?, ?);
      "#,
    )
    .bind(&process.batch_id)
    .bind(batches)
    .bind(graph)
    .execute(&mut *tx)
    .await
    .map_err(Error::Save)?;
    tx.commit().await.map_err(Error::Save)?;

    let outcome = InsertOutcome::from_rows_affected(result.rows_affected());
    debug!(batch_id = %process.batch_id, outcome = ?outcome, "saved batch process");

    // Return the canonical stored row, not the caller's input.
    let row = fetch_batch_process(&mut conn, &process.batch_id)
      .await
      .map_err(|e| Error::NotFound { source: Some(e) })?
      .ok_or(Error::NotFound { source: None })?;
    decode_batch_process(&row, self.options.decode_policy)
  }

  async fn get_batch_process(&self, batch_id: &str) -> Result<BatchProcess, Error> {
    let mut conn = self.conn.acquire().await;

    let row = fetch_batch_process(&mut conn, batch_id)
      .await
      .map_err(|e| Error::NotFound { source: Some(e) })?
      .ok_or(Error::NotFound { source: None })?;
    decode_batch_process(&row, self.options.decode_policy)
  }

  async fn cancel_batch_process(&self, batch_id: &str) -> Result<(), Error> {
    let mut conn = self.conn.acquire().await;

    let mut tx = conn.begin().await.map_err(Error::Save)?;
    sqlx::query(
      r#"
      UPDATE batch_process
      SET canceled = 1
      WHERE batch_id = ?;
      "#,
    )
    .bind(batch_id)
    .execute(&mut *tx)
    .await
    .map_err(Error::Save)?;
    tx.commit().await.map_err(Error::Save)?;

    debug!(batch_id = %batch_id, "canceled batch process");
    Ok(())
  }

  async fn delete_batch_process(&self, batch_id: &str) -> Result<(), Error> {
    let mut conn = self.conn.acquire().await;

    let mut tx = conn.begin().await.map_err(Error::Delete)?;
    sqlx::query(
      r#"
      DELETE FROM batch_process
      WHERE batch_id = ?;
      "#,
    )
    .bind(batch_id)
    .execute(&mut *tx)
    .await
    .map_err(Error::Delete)?;
    tx.commit().await.map_err(Error::Delete)?;

    debug!(batch_id = %batch_id, "deleted batch process");
    Ok(())
  }

  async fn create_session(&self, session: BatchSession) -> Result<BatchSession, Error> {
    let mut conn = self.conn.acquire().await;

    let mut tx = conn.begin().await.map_err(Error::SessionSave)?;
    let result = sqlx::query(
      r#"
      INSERT OR IGNORE INTO batch_session (batch_id, session_id, state)
      VALUES (?, ?, ?);
      "#,
    )
    .bind(&session.batch_id)
    .bind(&session.session_id)
    .bind(session.state.as_str())
    .execute(&mut *tx)
    .await
    .map_err(Error::SessionSave)?;
    tx.commit().await.map_err(Error::SessionSave)?;

    let outcome = InsertOutcome::from_rows_affected(result.rows_affected());
    debug!(
      batch_id = %session.batch_id,
      session_id = %session.session_id,
      outcome = ?outcome,
      "created batch session"
    );

    let row = fetch_batch_session(&mut conn, &session.batch_id, &session.session_id)
      .await
      .map_err(|e| Error::SessionNotFound { source: Some(e) })?
      .ok_or(Error::SessionNotFound { source: None })?;
    decode_batch_session(&row, self.options.decode_policy)
  }

  async fn get_session(&self, session_id: &str) -> Result<BatchSession, Error> {
    let mut conn = self.conn.acquire().await;

    let row = sqlx::query(
      r#"
      SELECT *
      FROM batch_session
      WHERE session_id = ?;
      "#,
    )
    .bind(session_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| Error::SessionNotFound { source: Some(e) })?
    .ok_or(Error::SessionNotFound { source: None })?;
    decode_batch_session(&row, self.options.decode_policy)
  }

  async fn get_created_session(&self, batch_id: &str) -> Result<BatchSession, Error> {
    let mut conn = self.conn.acquire().await;

    // Earliest created first; rowid breaks sub-millisecond timestamp ties.
    let row = sqlx::query(
      r#"
      SELECT *
      FROM batch_session
      WHERE batch_id = ? AND state = 'created'
      ORDER BY created_at, rowid
      LIMIT 1;
      "#,
    )
    .bind(batch_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| Error::SessionNotFound { source: Some(e) })?
    .ok_or(Error::SessionNotFound { source: None })?;
    decode_batch_session(&row, self.options.decode_policy)
  }

  async fn get_created_sessions(&self, batch_id: &str) -> Result<Vec<BatchSession>, Error> {
    let mut conn = self.conn.acquire().await;

    let rows = sqlx::query(
      r#"
      SELECT *
      FROM batch_session
      WHERE batch_id = ? AND state = 'created'
      ORDER BY created_at, rowid;
      "#,
    )
    .bind(batch_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| Error::SessionNotFound { source: Some(e) })?;

    rows
      .iter()
      .map(|row| decode_batch_session(row, self.options.decode_policy))
      .collect()
  }

  async fn update_session_state(
    &self,
    batch_id: &str,
    session_id: &str,
    changes: BatchSessionChanges,
  ) -> Result<BatchSession, Error> {
    let mut conn = self.conn.acquire().await;

    if let Some(state) = changes.state {
      let mut tx = conn.begin().await.map_err(Error::SessionSave)?;
      sqlx::query(
        r#"
        UPDATE batch_session
        SET state = ?
        WHERE batch_id = ? AND session_id = ?;
        "#,
      )
      .bind(state.as_str())
      .bind(batch_id)
      .bind(session_id)
      .execute(&mut *tx)
      .await
      .map_err(Error::SessionSave)?;
      tx.commit().await.map_err(Error::SessionSave)?;

      debug!(
        batch_id = %batch_id,
        session_id = %session_id,
        state = state.as_str(),
        "updated batch session state"
      );
    }

    let row = fetch_batch_session(&mut conn, batch_id, session_id)
      .await
      .map_err(|e| Error::SessionNotFound { source: Some(e) })?
      .ok_or(Error::SessionNotFound { source: None })?;
    decode_batch_session(&row, self.options.decode_policy)
  }
}

async fn fetch_batch_process(
  conn: &mut SqliteConnection,
  batch_id: &str,
) -> Result<Option<SqliteRow>, sqlx::Error> {
  sqlx::query(
    r#"
    SELECT *
    FROM batch_process
    WHERE batch_id = ?;
    "#,
  )
  .bind(batch_id)
  .fetch_optional(conn)
  .await
}

async fn fetch_batch_session(
  conn: &mut SqliteConnection,
  batch_id: &str,
  session_id: &str,
) -> Result<Option<SqliteRow>, sqlx::Error> {
  sqlx::query(
    r#"
    SELECT *
    FROM batch_session
    WHERE batch_id = ? AND session_id = ?;
    "#,
  )
  .bind(batch_id)
  .bind(session_id)
  .fetch_optional(conn)
  .await
}
