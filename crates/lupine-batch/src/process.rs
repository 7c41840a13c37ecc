use serde::{Deserialize, Serialize};

use crate::batch::Batch;

/// A submitted batch process: an opaque work graph plus the batches to
/// apply across the sessions spawned from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchProcess {
  /// Identifier for this batch process.
  pub batch_id: String,
  /// Batch configs to apply across this process's sessions.
  #[serde(default)]
  pub batches: Vec<Batch>,
  /// Whether the process has been canceled. Once set it stays set;
  /// sessions belonging to a canceled process should not be run.
  #[serde(default)]
  pub canceled: bool,
  /// The serialized graph to execute. Opaque to the store.
  pub graph: serde_json::Value,
}

impl BatchProcess {
  /// Create a new process with a generated batch id.
  pub fn new(graph: serde_json::Value, batches: Vec<Batch>) -> Self {
    Self {
      batch_id: uuid::Uuid::new_v4().to_string(),
      batches,
      canceled: false,
      graph,
    }
  }
}
