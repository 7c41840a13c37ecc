//! Schema bootstrap for the batch store.

use sqlx::SqliteConnection;

/// DDL executed at open, one statement per execute. Every statement is
/// idempotent, so reopening an existing database is safe.
///
/// `updated_at` on both tables is refreshed by an `AFTER UPDATE` trigger;
/// `deleted_at` is reserved for soft deletes and not written by any current
/// operation.
const CREATE_STATEMENTS: &[&str] = &[
  r#"
  CREATE TABLE IF NOT EXISTS batch_process (
    batch_id TEXT NOT NULL PRIMARY KEY,
    batches TEXT NOT NULL,
    graph TEXT NOT NULL,
    canceled BOOLEAN NOT NULL DEFAULT(0),
    created_at DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
    updated_at DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
    deleted_at DATETIME
  );
  "#,
  r#"
  CREATE INDEX IF NOT EXISTS idx_batch_process_created_at
    ON batch_process (created_at);
  "#,
  r#"
  CREATE TRIGGER IF NOT EXISTS tg_batch_process_updated_at
  AFTER UPDATE ON batch_process FOR EACH ROW
  BEGIN
    UPDATE batch_process SET updated_at = STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')
      WHERE batch_id = old.batch_id;
  END;
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS batch_session (
    batch_id TEXT NOT NULL,
    session_id TEXT NOT NULL,
    state TEXT NOT NULL,
    created_at DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
    updated_at DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
    deleted_at DATETIME,
    PRIMARY KEY (batch_id, session_id),
    FOREIGN KEY (batch_id) REFERENCES batch_process (batch_id) ON DELETE CASCADE
  );
  "#,
  r#"
  CREATE INDEX IF NOT EXISTS idx_batch_session_batch_id
    ON batch_session (batch_id);
  "#,
  r#"
  CREATE INDEX IF NOT EXISTS idx_batch_session_batch_id_created_at
    ON batch_session (batch_id, created_at);
  "#,
  r#"
  CREATE TRIGGER IF NOT EXISTS tg_batch_session_updated_at
  AFTER UPDATE ON batch_session FOR EACH ROW
  BEGIN
    UPDATE batch_session SET updated_at = STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')
      WHERE batch_id = old.batch_id AND session_id = old.session_id;
  END;
  "#,
];

/// Create the `batch_process` table, the `batch_session` junction table,
/// their indexes, and the `updated_at` triggers.
pub(crate) async fn create_tables(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
  for statement in CREATE_STATEMENTS {
    sqlx::query(statement).execute(&mut *conn).await?;
  }
  Ok(())
}
