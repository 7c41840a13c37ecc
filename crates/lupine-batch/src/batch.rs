use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::BatchValue;

/// A batched override set targeting a single node.
///
/// Each entry in `data` holds one run's field→value assignments; the engine
/// spawns one session per entry, substituting the values into the target
/// node before execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
  /// ID of the node to batch over.
  pub node_id: String,
  /// Per-run mappings of node field to override value.
  #[serde(default)]
  pub data: Vec<HashMap<String, BatchValue>>,
}
