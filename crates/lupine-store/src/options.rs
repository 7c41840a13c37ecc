use serde::{Deserialize, Serialize};

/// Decoding policy for rows read back from the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
  /// Substitute sentinels for expected columns missing from the stored row
  /// shape: `"unknown"` for text, `false` for flags. Keeps the store
  /// tolerant of rows written by older or newer schema revisions.
  #[default]
  Lenient,
  /// Fail with [`Error::Payload`](crate::Error::Payload) when an expected
  /// column is missing.
  Strict,
}

/// Options for opening a [`SqliteBatchStore`](crate::SqliteBatchStore).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
  /// How to treat stored rows whose shape is older or newer than expected.
  #[serde(default)]
  pub decode_policy: DecodePolicy,
}
