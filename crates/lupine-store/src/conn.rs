//! Serialized access to the store's single database connection.

use std::sync::atomic::{AtomicUsize, Ordering};

use sqlx::SqliteConnection;
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

/// Exclusive guard over the single SQLite connection.
///
/// Every storage operation funnels through [`SerialConnection::acquire`], so
/// the store runs one operation at a time, globally. An operation that reads
/// back a row it just wrote does so through the guard it already holds
/// rather than re-acquiring, which keeps the call chain deadlock-free while
/// distinct callers still block on each other.
pub(crate) struct SerialConnection {
  conn: Mutex<SqliteConnection>,
  waiting: AtomicUsize,
}

impl SerialConnection {
  pub(crate) fn new(conn: SqliteConnection) -> Self {
    Self {
      conn: Mutex::new(conn),
      waiting: AtomicUsize::new(0),
    }
  }

  /// Wait for exclusive use of the connection.
  pub(crate) async fn acquire(&self) -> MutexGuard<'_, SqliteConnection> {
    let waiting = self.waiting.fetch_add(1, Ordering::Relaxed) + 1;
    trace!(waiting, "waiting for store connection");
    let guard = self.conn.lock().await;
    let waiting = self.waiting.fetch_sub(1, Ordering::Relaxed) - 1;
    trace!(waiting, "acquired store connection");
    guard
  }
}
