use serde::{Deserialize, Serialize};

/// Lifecycle state of a batch session.
///
/// Sessions move `created → inprogress → completed`, with `error` reachable
/// from any non-terminal state. The store records whatever state it is told;
/// enforcing legal transition order is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
  Created,
  InProgress,
  Completed,
  Error,
}

impl SessionState {
  /// The literal stored in the `state` column.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Created => "created",
      Self::InProgress => "inprogress",
      Self::Completed => "completed",
      Self::Error => "error",
    }
  }

  /// Parse a stored state literal.
  pub fn parse(value: &str) -> Option<Self> {
    match value {
      "created" => Some(Self::Created),
      "inprogress" => Some(Self::InProgress),
      "completed" => Some(Self::Completed),
      "error" => Some(Self::Error),
      _ => None,
    }
  }
}

/// One execution session spawned from a batch process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSession {
  /// Identifier of the batch process this session belongs to.
  pub batch_id: String,
  /// Session ID created for this batch entry. Session ids are expected to
  /// be globally unique across processes.
  pub session_id: String,
  /// Current lifecycle state.
  pub state: SessionState,
}

/// Partial update applied to a batch session.
///
/// Only `state` is mutable after creation; unknown fields are rejected on
/// deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSessionChanges {
  /// New state for the session, if set.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub state: Option<SessionState>,
}
