use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{RemoteError, Result, ReviewLogSource, ReviewOutcomeGateway, SnapshotSource};
use crate::review::models::{
    deserialize_lenient_timestamp, Item, ItemType, NotebookCounts, NotebookInfo, ReviewLogEntry,
    ReviewOutcome, ReviewState, SentenceItem, Snapshot, VocabItem,
};

/// Client for the hosted review API
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// `{ success, data, error }` wrapper used by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

/// Body of `GET /api/user/notebooks/{id}/items`
#[derive(Debug, Deserialize)]
struct NotebookItemsPayload {
    #[serde(default)]
    notebook: Option<NotebookInfo>,
    #[serde(default)]
    vocabs: Vec<WithState<VocabItem>>,
    #[serde(default)]
    sentences: Vec<WithState<SentenceItem>>,
}

/// An item with its review state embedded, as the items endpoint returns it
#[derive(Debug, Deserialize)]
struct WithState<T> {
    #[serde(flatten)]
    item: T,
    #[serde(default, rename = "reviewState", alias = "review_state")]
    review_state: Option<serde_json::Value>,
}

/// Review state as embedded in an item; it carries no item identity
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedState {
    #[serde(
        default,
        alias = "next_review_at",
        deserialize_with = "deserialize_lenient_timestamp"
    )]
    next_review_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "familiarity_level", alias = "proficiency")]
    familiarity_level: Option<f64>,
    #[serde(
        default,
        alias = "last_reviewed_at",
        deserialize_with = "deserialize_lenient_timestamp"
    )]
    last_reviewed_at: Option<DateTime<Utc>>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: String, token: Option<String>, timeout_secs: u64) -> Result<Self> {
        // Normalize URL - ensure no trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(RemoteError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(30)))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map HTTP status to an error, then unwrap the `{success, data}` envelope
    async fn read_envelope<T: DeserializeOwned>(response: Response, path: &str) -> Result<Option<T>> {
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(RemoteError::AuthFailed);
            }
            StatusCode::NOT_FOUND => {
                return Err(RemoteError::NotFound(path.to_string()));
            }
            status if !status.is_success() => {
                return Err(RemoteError::Server {
                    status: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                });
            }
            _ => {}
        }

        let envelope: Envelope<T> = response.json().await?;
        if !envelope.success {
            return Err(RemoteError::Rejected(
                envelope
                    .error
                    .unwrap_or_else(|| format!("{} returned success: false", path)),
            ));
        }
        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let response = self
            .authorized(self.client.get(self.url(path)))
            .send()
            .await?;
        Self::read_envelope(response, path).await
    }
}

#[async_trait]
impl SnapshotSource for ApiClient {
    async fn notebooks(&self) -> Result<Vec<NotebookCounts>> {
        let notebooks: Option<Vec<NotebookCounts>> = self.get("/api/user/notebooks").await?;
        Ok(notebooks.unwrap_or_default())
    }

    async fn notebook_snapshot(&self, notebook_id: &str, item_type: ItemType) -> Result<Snapshot> {
        let path = format!("/api/user/notebooks/{}/items", notebook_id);
        let payload: NotebookItemsPayload = self
            .get(&path)
            .await?
            .ok_or_else(|| RemoteError::Rejected(format!("{} returned no data", path)))?;

        Ok(split_payload(payload, notebook_id, item_type, Utc::now()))
    }
}

#[async_trait]
impl ReviewOutcomeGateway for ApiClient {
    async fn record(&self, outcome: &ReviewOutcome) -> Result<Option<ReviewState>> {
        let path = "/api/user/review-states";
        let body = serde_json::json!({
            "item_type": outcome.item_type,
            "item_id": outcome.item_id,
            "video_id": outcome.video_id,
            "notebook_id": outcome.notebook_id,
            "last_result_known": outcome.is_known,
            "review_mode": outcome.review_mode,
        });

        let response = self
            .authorized(self.client.post(self.url(path)))
            .json(&body)
            .send()
            .await?;

        let data: Option<serde_json::Value> = Self::read_envelope(response, path).await?;
        Ok(data.and_then(|value| match serde_json::from_value::<ReviewState>(value) {
            Ok(state) => Some(state),
            Err(e) => {
                log::debug!("Review state echo not understood: {}", e);
                None
            }
        }))
    }
}

#[async_trait]
impl ReviewLogSource for ApiClient {
    async fn review_logs(&self, days: u32) -> Result<Vec<ReviewLogEntry>> {
        let logs: Option<Vec<ReviewLogEntry>> = self
            .get(&format!("/api/user/review-logs?days={}", days))
            .await?;
        Ok(logs.unwrap_or_default())
    }
}

/// Turn the items payload into a snapshot of one item type, lifting the
/// embedded review states out of the items.
fn split_payload(
    payload: NotebookItemsPayload,
    notebook_id: &str,
    item_type: ItemType,
    taken_at: DateTime<Utc>,
) -> Snapshot {
    let notebook = payload.notebook.unwrap_or_else(|| NotebookInfo {
        id: notebook_id.to_string(),
        name: String::new(),
        color: None,
    });

    let entries: Vec<(Item, Option<serde_json::Value>)> = match item_type {
        ItemType::Vocab => payload
            .vocabs
            .into_iter()
            .map(|w| (Item::Vocab(w.item), w.review_state))
            .collect(),
        ItemType::Sentence => payload
            .sentences
            .into_iter()
            .map(|w| (Item::Sentence(w.item), w.review_state))
            .collect(),
    };

    let mut items = Vec::with_capacity(entries.len());
    let mut states = Vec::new();
    for (item, raw_state) in entries {
        if let Some(raw) = raw_state.filter(|v| !v.is_null()) {
            states.push(embedded_state(&item, raw));
        }
        items.push(item);
    }

    Snapshot {
        notebook,
        item_type,
        items,
        states,
        taken_at,
    }
}

/// A state that is present but unreadable still counts as "reviewed, not due"
fn embedded_state(item: &Item, raw: serde_json::Value) -> ReviewState {
    let embedded = serde_json::from_value::<EmbeddedState>(raw).unwrap_or_else(|e| {
        log::warn!(
            "Unreadable review state for {} {}: {}",
            item.item_type(),
            item.id(),
            e
        );
        EmbeddedState::default()
    });

    ReviewState {
        item_type: item.item_type(),
        item_id: item.id().to_string(),
        next_review_at: embedded.next_review_at,
        familiarity_level: embedded.familiarity_level,
        last_reviewed_at: embedded.last_reviewed_at,
    }
}
