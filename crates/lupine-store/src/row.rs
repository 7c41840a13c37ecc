//! Row decoding for stored batch records.

use lupine_batch::{Batch, BatchProcess, BatchSession, SessionState};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::{DecodePolicy, Error};

/// Sentinel substituted for text columns missing from the stored row shape
/// under [`DecodePolicy::Lenient`].
const UNKNOWN: &str = "unknown";

fn text_column(
  row: &SqliteRow,
  column: &'static str,
  policy: DecodePolicy,
) -> Result<String, Error> {
  match row.try_get::<String, _>(column) {
    Ok(value) => Ok(value),
    Err(_) if policy == DecodePolicy::Lenient => Ok(UNKNOWN.to_string()),
    Err(e) => Err(Error::Payload {
      context: column,
      source: Some(Box::new(e)),
    }),
  }
}

fn bool_column(row: &SqliteRow, column: &'static str, policy: DecodePolicy) -> Result<bool, Error> {
  match row.try_get::<bool, _>(column) {
    Ok(value) => Ok(value),
    Err(_) if policy == DecodePolicy::Lenient => Ok(false),
    Err(e) => Err(Error::Payload {
      context: column,
      source: Some(Box::new(e)),
    }),
  }
}

pub(crate) fn decode_batch_process(
  row: &SqliteRow,
  policy: DecodePolicy,
) -> Result<BatchProcess, Error> {
  let batch_id = text_column(row, "batch_id", policy)?;
  let batches_raw = text_column(row, "batches", policy)?;
  let graph_raw = text_column(row, "graph", policy)?;
  let canceled = bool_column(row, "canceled", policy)?;

  // Sentinels only cover missing columns; a payload that is present but
  // undecodable is a hard error under either policy.
  let batches: Vec<Batch> = serde_json::from_str(&batches_raw).map_err(|e| Error::Payload {
    context: "batches",
    source: Some(Box::new(e)),
  })?;
  let graph: serde_json::Value = serde_json::from_str(&graph_raw).map_err(|e| Error::Payload {
    context: "graph",
    source: Some(Box::new(e)),
  })?;

  Ok(BatchProcess {
    batch_id,
    batches,
    canceled,
    graph,
  })
}

pub(crate) fn decode_batch_session(
  row: &SqliteRow,
  policy: DecodePolicy,
) -> Result<BatchSession, Error> {
  let batch_id = text_column(row, "batch_id", policy)?;
  let session_id = text_column(row, "session_id", policy)?;
  let state_raw = text_column(row, "state", policy)?;

  let state = SessionState::parse(&state_raw).ok_or(Error::Payload {
    context: "state",
    source: None,
  })?;

  Ok(BatchSession {
    batch_id,
    session_id,
    state,
  })
}
