//! Integration tests for batch session operations and the state machine.

use std::sync::Arc;

use lupine_batch::{BatchProcess, BatchSession, BatchSessionChanges, SessionState};
use lupine_store::{BatchStore, Error, SqliteBatchStore, StoreOptions};
use serde_json::json;

async fn open_store() -> SqliteBatchStore {
  SqliteBatchStore::in_memory(StoreOptions::default())
    .await
    .expect("failed to open store")
}

/// Save a minimal batch process and return its id.
async fn seed_process(store: &SqliteBatchStore) -> String {
  let process = BatchProcess::new(json!({ "nodes": {}, "edges": [] }), Vec::new());
  store
    .save_batch_process(process.clone())
    .await
    .expect("failed to seed process");
  process.batch_id
}

fn created_session(batch_id: &str, session_id: &str) -> BatchSession {
  BatchSession {
    batch_id: batch_id.to_string(),
    session_id: session_id.to_string(),
    state: SessionState::Created,
  }
}

fn state_change(state: SessionState) -> BatchSessionChanges {
  BatchSessionChanges { state: Some(state) }
}

#[tokio::test]
async fn test_create_then_get_session() {
  let store = open_store().await;
  let batch_id = seed_process(&store).await;

  let session = created_session(&batch_id, "s1");
  let created = store
    .create_session(session.clone())
    .await
    .expect("create_session failed");
  assert_eq!(created, session);

  let fetched = store.get_session("s1").await.expect("get_session failed");
  assert_eq!(fetched, session);
}

#[tokio::test]
async fn test_create_session_is_idempotent() {
  let store = open_store().await;
  let batch_id = seed_process(&store).await;

  store
    .create_session(created_session(&batch_id, "s1"))
    .await
    .expect("create_session failed");

  // Re-creating the same pair with a different state keeps the stored row.
  let clash = BatchSession {
    batch_id: batch_id.clone(),
    session_id: "s1".to_string(),
    state: SessionState::Completed,
  };
  let returned = store
    .create_session(clash)
    .await
    .expect("second create_session failed");
  assert_eq!(returned.state, SessionState::Created);

  let fetched = store.get_session("s1").await.unwrap();
  assert_eq!(fetched.state, SessionState::Created);
}

#[tokio::test]
async fn test_create_session_requires_parent_process() {
  let store = open_store().await;

  let result = store
    .create_session(created_session("no-such-batch", "s1"))
    .await;
  assert!(matches!(result, Err(Error::SessionSave(_))));
}

#[tokio::test]
async fn test_get_session_missing_fails() {
  let store = open_store().await;

  let result = store.get_session("nonexistent-session").await;
  assert!(matches!(result, Err(Error::SessionNotFound { .. })));
}

#[tokio::test]
async fn test_get_created_session_returns_earliest() {
  let store = open_store().await;
  let batch_id = seed_process(&store).await;

  store
    .create_session(created_session(&batch_id, "s1"))
    .await
    .unwrap();
  store
    .create_session(created_session(&batch_id, "s2"))
    .await
    .unwrap();

  let next = store
    .get_created_session(&batch_id)
    .await
    .expect("get_created_session failed");
  assert_eq!(next.session_id, "s1");

  store
    .update_session_state(&batch_id, "s1", state_change(SessionState::Completed))
    .await
    .unwrap();

  let next = store.get_created_session(&batch_id).await.unwrap();
  assert_eq!(next.session_id, "s2");
}

#[tokio::test]
async fn test_get_created_session_none_fails() {
  let store = open_store().await;
  let batch_id = seed_process(&store).await;

  let result = store.get_created_session(&batch_id).await;
  assert!(matches!(result, Err(Error::SessionNotFound { .. })));
}

#[tokio::test]
async fn test_get_created_sessions_in_creation_order() {
  let store = open_store().await;
  let batch_id = seed_process(&store).await;

  store
    .create_session(created_session(&batch_id, "s1"))
    .await
    .unwrap();
  store
    .create_session(created_session(&batch_id, "s2"))
    .await
    .unwrap();
  store
    .create_session(created_session(&batch_id, "s3"))
    .await
    .unwrap();

  let sessions = store.get_created_sessions(&batch_id).await.unwrap();
  let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
  assert_eq!(ids, ["s1", "s2", "s3"]);
}

#[tokio::test]
async fn test_get_created_sessions_empty_is_ok() {
  let store = open_store().await;
  let batch_id = seed_process(&store).await;

  let sessions = store
    .get_created_sessions(&batch_id)
    .await
    .expect("empty result should not error");
  assert!(sessions.is_empty());

  store
    .create_session(created_session(&batch_id, "s1"))
    .await
    .unwrap();
  store
    .update_session_state(&batch_id, "s1", state_change(SessionState::Error))
    .await
    .unwrap();

  let sessions = store.get_created_sessions(&batch_id).await.unwrap();
  assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_update_session_state_is_visible() {
  let store = open_store().await;
  let batch_id = seed_process(&store).await;
  store
    .create_session(created_session(&batch_id, "s1"))
    .await
    .unwrap();

  let updated = store
    .update_session_state(&batch_id, "s1", state_change(SessionState::InProgress))
    .await
    .expect("update failed");
  assert_eq!(updated.state, SessionState::InProgress);

  let updated = store
    .update_session_state(&batch_id, "s1", state_change(SessionState::Completed))
    .await
    .unwrap();
  assert_eq!(updated.state, SessionState::Completed);

  let fetched = store.get_session("s1").await.unwrap();
  assert_eq!(fetched.state, SessionState::Completed);
}

#[tokio::test]
async fn test_update_with_empty_changes_returns_current_row() {
  let store = open_store().await;
  let batch_id = seed_process(&store).await;
  store
    .create_session(created_session(&batch_id, "s1"))
    .await
    .unwrap();

  let returned = store
    .update_session_state(&batch_id, "s1", BatchSessionChanges::default())
    .await
    .expect("no-op update failed");
  assert_eq!(returned.state, SessionState::Created);
}

#[tokio::test]
async fn test_update_missing_session_fails() {
  let store = open_store().await;
  let batch_id = seed_process(&store).await;

  let result = store
    .update_session_state(&batch_id, "nonexistent", state_change(SessionState::Completed))
    .await;
  assert!(matches!(result, Err(Error::SessionNotFound { .. })));
}

#[tokio::test]
async fn test_delete_cascades_to_sessions() {
  let store = open_store().await;
  let batch_id = seed_process(&store).await;

  store
    .create_session(created_session(&batch_id, "s1"))
    .await
    .unwrap();
  store
    .create_session(created_session(&batch_id, "s2"))
    .await
    .unwrap();

  store
    .delete_batch_process(&batch_id)
    .await
    .expect("delete failed");

  for session_id in ["s1", "s2"] {
    let result = store.get_session(session_id).await;
    assert!(matches!(result, Err(Error::SessionNotFound { .. })));
  }
  let sessions = store.get_created_sessions(&batch_id).await.unwrap();
  assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_batch_lifecycle_scenario() {
  let store = open_store().await;
  let batch_id = seed_process(&store).await;

  store
    .create_session(created_session(&batch_id, "s1"))
    .await
    .unwrap();
  store
    .create_session(created_session(&batch_id, "s2"))
    .await
    .unwrap();

  let created = store.get_created_sessions(&batch_id).await.unwrap();
  let ids: Vec<&str> = created.iter().map(|s| s.session_id.as_str()).collect();
  assert_eq!(ids, ["s1", "s2"]);

  store
    .update_session_state(&batch_id, "s1", state_change(SessionState::Completed))
    .await
    .unwrap();

  let created = store.get_created_sessions(&batch_id).await.unwrap();
  let ids: Vec<&str> = created.iter().map(|s| s.session_id.as_str()).collect();
  assert_eq!(ids, ["s2"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_state_updates_serialize() {
  let store = Arc::new(open_store().await);
  let batch_id = seed_process(&store).await;

  for i in 0..8 {
    store
      .create_session(created_session(&batch_id, &format!("s{i}")))
      .await
      .unwrap();
  }

  let mut handles = Vec::new();
  for i in 0..8 {
    let store = store.clone();
    let batch_id = batch_id.clone();
    handles.push(tokio::spawn(async move {
      let session_id = format!("s{i}");
      store
        .update_session_state(&batch_id, &session_id, state_change(SessionState::Completed))
        .await
        .expect("update failed")
    }));
  }

  for handle in handles {
    let updated = handle.await.expect("task panicked");
    assert_eq!(updated.state, SessionState::Completed);
  }

  let remaining = store.get_created_sessions(&batch_id).await.unwrap();
  assert!(remaining.is_empty());
}
