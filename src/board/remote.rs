//! The remote task service the board converges with.
//!
//! The board only ever needs four calls: a full reload, a status update for a
//! moved card, and create/delete. `HttpBoardRemote` speaks JSON over REST;
//! `InMemoryRemote` keeps everything in process and can be told to fail or to
//! hold status updates until released.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::debug;

use super::models::{Card, CardId, ColumnId, NewCard};
use crate::errors::RemoteError;

#[async_trait]
pub trait BoardRemote: Send + Sync {
    /// Every card the service knows about.
    async fn fetch_all_cards(&self) -> Result<Vec<Card>, RemoteError>;

    /// Persist a column change.
    async fn update_card_status(&self, card_id: &CardId, column: &ColumnId) -> Result<(), RemoteError>;

    async fn create_card(&self, card: &NewCard) -> Result<Card, RemoteError>;

    async fn delete_card(&self, card_id: &CardId) -> Result<(), RemoteError>;
}

// ── HTTP ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum CardList {
    Bare(Vec<Card>),
    Wrapped { tasks: Vec<Card> },
}

impl CardList {
    fn into_cards(self) -> Vec<Card> {
        match self {
            Self::Bare(cards) => cards,
            Self::Wrapped { tasks } => tasks,
        }
    }
}

/// REST client for the task service.
///
/// | Call                 | Request                                   |
/// |----------------------|-------------------------------------------|
/// | `fetch_all_cards`    | `GET {base}/tasks`                        |
/// | `update_card_status` | `PATCH {base}/tasks/{id}` `{"status": c}` |
/// | `create_card`        | `POST {base}/tasks`                       |
/// | `delete_card`        | `DELETE {base}/tasks/{id}`                |
#[derive(Clone)]
pub struct HttpBoardRemote {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBoardRemote {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            code: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl BoardRemote for HttpBoardRemote {
    async fn fetch_all_cards(&self) -> Result<Vec<Card>, RemoteError> {
        let response = Self::send(self.request(reqwest::Method::GET, "/tasks")).await?;
        let bytes = response.bytes().await?;
        let list: CardList = serde_json::from_slice(&bytes)?;
        Ok(list.into_cards())
    }

    async fn update_card_status(&self, card_id: &CardId, column: &ColumnId) -> Result<(), RemoteError> {
        let path = format!("/tasks/{}", card_id);
        Self::send(
            self.request(reqwest::Method::PATCH, &path)
                .json(&serde_json::json!({ "status": column })),
        )
        .await?;
        debug!(card_id = %card_id, column = %column, "remote status updated");
        Ok(())
    }

    async fn create_card(&self, card: &NewCard) -> Result<Card, RemoteError> {
        let response = Self::send(self.request(reqwest::Method::POST, "/tasks").json(card)).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn delete_card(&self, card_id: &CardId) -> Result<(), RemoteError> {
        let path = format!("/tasks/{}", card_id);
        Self::send(self.request(reqwest::Method::DELETE, &path)).await?;
        Ok(())
    }
}

// ── In-memory ────────────────────────────────────────────────────────

/// Process-local task service.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    cards: Mutex<Vec<Card>>,
    next_id: AtomicI64,
    fail_all: AtomicBool,
    failing: Mutex<HashSet<CardId>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    status_calls: Mutex<Vec<(CardId, ColumnId)>>,
}

impl InMemoryRemote {
    pub fn new(cards: Vec<Card>) -> Self {
        let remote = Self::default();
        remote.next_id.store(1000, Ordering::SeqCst);
        if let Ok(mut guard) = remote.cards.lock() {
            *guard = cards;
        }
        remote
    }

    /// Reject every status update until cleared.
    pub fn fail_all_updates(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Reject status updates for one card.
    pub fn fail_updates_for(&self, card_id: impl Into<CardId>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(card_id.into());
        }
    }

    /// Park status updates until `release_updates` hands out permits.
    pub fn hold_updates(&self) {
        if let Ok(mut gate) = self.gate.lock() {
            *gate = Some(Arc::new(Semaphore::new(0)));
        }
    }

    /// Let `n` parked (or future) status updates through, in arrival order.
    pub fn release_updates(&self, n: usize) {
        if let Ok(gate) = self.gate.lock() {
            if let Some(sem) = gate.as_ref() {
                sem.add_permits(n);
            }
        }
    }

    /// Status updates that reached the service, in order.
    pub fn status_calls(&self) -> Vec<(CardId, ColumnId)> {
        self.status_calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the service's own records.
    pub fn stored_cards(&self) -> Vec<Card> {
        self.cards.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn poisoned() -> RemoteError {
        RemoteError::Rejected("in-memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl BoardRemote for InMemoryRemote {
    async fn fetch_all_cards(&self) -> Result<Vec<Card>, RemoteError> {
        self.cards.lock().map(|c| c.clone()).map_err(|_| Self::poisoned())
    }

    async fn update_card_status(&self, card_id: &CardId, column: &ColumnId) -> Result<(), RemoteError> {
        let gate = self.gate.lock().map_err(|_| Self::poisoned())?.clone();
        if let Some(sem) = gate {
            let permit = sem
                .acquire()
                .await
                .map_err(|_| RemoteError::Rejected("update gate closed".to_string()))?;
            permit.forget();
        }

        self.status_calls
            .lock()
            .map_err(|_| Self::poisoned())?
            .push((card_id.clone(), column.clone()));

        let rejected = self.fail_all.load(Ordering::SeqCst)
            || self
                .failing
                .lock()
                .map_err(|_| Self::poisoned())?
                .contains(card_id);
        if rejected {
            return Err(RemoteError::Rejected(format!(
                "status update for {} refused",
                card_id
            )));
        }

        let mut cards = self.cards.lock().map_err(|_| Self::poisoned())?;
        let card = cards
            .iter_mut()
            .find(|c| &c.id == card_id)
            .ok_or_else(|| RemoteError::Rejected(format!("task {} not found", card_id)))?;
        card.column = column.clone();
        Ok(())
    }

    async fn create_card(&self, card: &NewCard) -> Result<Card, RemoteError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = Card {
            description: card.description.clone(),
            assignee: card.assignee.clone(),
            ..Card::new(id, card.column.clone(), card.title.clone())
        };
        self.cards
            .lock()
            .map_err(|_| Self::poisoned())?
            .push(created.clone());
        Ok(created)
    }

    async fn delete_card(&self, card_id: &CardId) -> Result<(), RemoteError> {
        let mut cards = self.cards.lock().map_err(|_| Self::poisoned())?;
        let before = cards.len();
        cards.retain(|c| &c.id != card_id);
        if cards.len() == before {
            return Err(RemoteError::Rejected(format!("task {} not found", card_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> InMemoryRemote {
        InMemoryRemote::new(vec![
            Card::new("a", "assigned", "A"),
            Card::new("b", "in_progress", "B"),
        ])
    }

    #[tokio::test]
    async fn test_update_status_persists() {
        let r = remote();
        r.update_card_status(&CardId::from("a"), &ColumnId::from("completed"))
            .await
            .unwrap();
        let stored = r.stored_cards();
        assert_eq!(stored[0].column, ColumnId::from("completed"));
        assert_eq!(r.status_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_update_status_injected_failure() {
        let r = remote();
        r.fail_updates_for("b");
        let err = r
            .update_card_status(&CardId::from("b"), &ColumnId::from("dropped"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(_)));
        assert_eq!(r.stored_cards()[1].column, ColumnId::from("in_progress"));
    }

    #[tokio::test]
    async fn test_update_unknown_card_rejected() {
        let r = remote();
        assert!(
            r.update_card_status(&CardId::from("zz"), &ColumnId::from("dropped"))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_create_assigns_fresh_ids() {
        let r = remote();
        let first = r.create_card(&NewCard::new("assigned", "One")).await.unwrap();
        let second = r.create_card(&NewCard::new("assigned", "Two")).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(r.fetch_all_cards().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_delete_missing_card_rejected() {
        let r = remote();
        r.delete_card(&CardId::from("a")).await.unwrap();
        assert!(r.delete_card(&CardId::from("a")).await.is_err());
    }

    #[tokio::test]
    async fn test_held_update_waits_for_release() {
        let r = Arc::new(remote());
        r.hold_updates();
        let task = {
            let r = r.clone();
            tokio::spawn(async move {
                r.update_card_status(&CardId::from("a"), &ColumnId::from("approved"))
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert!(r.status_calls().is_empty());
        r.release_updates(1);
        task.await.unwrap().unwrap();
        assert_eq!(r.status_calls().len(), 1);
    }

    #[test]
    fn test_card_list_accepts_wrapped_shape() {
        let json = r#"{"tasks": [{"id": 1, "status": "assigned", "title": "x"}]}"#;
        let list: CardList = serde_json::from_str(json).unwrap();
        assert_eq!(list.into_cards().len(), 1);
    }
}
