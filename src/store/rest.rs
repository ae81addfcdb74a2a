//! Realtime-database REST client.
//!
//! Every path maps to `{base}/{path}.json`. Reads return the JSON stored there
//! (`null` when absent), `PUT` replaces, `PATCH` merges direct children and
//! `DELETE` removes. Change feeds use the server-sent-events form of `GET`.

use crate::errors::{Error, Result};
use crate::store::{ChangeFeed, PushIdGenerator, RecordStore, segments};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::stream::StreamExt;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Response, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

/// Error body the service returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// A [`RecordStore`] speaking the realtime-database REST protocol.
#[derive(Debug)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
    keys: PushIdGenerator,
}

impl RestStore {
    /// Creates a client for the database at `base_url`.
    ///
    /// `auth_token`, when present, is sent as the `auth` query parameter on every request.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the URL is invalid, or [`Error::Http`] if the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str, auth_token: Option<String>) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| Error::Config {
            message: format!("Invalid store URL '{base_url}': {e}"),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("Store URL '{base_url}' cannot hold paths"),
            });
        }
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url,
            auth_token: auth_token.filter(|t| !t.is_empty()),
            keys: PushIdGenerator::new(),
        })
    }

    /// Builds the `.json` URL for `path`.
    fn url_for(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|()| Error::service("store URL cannot hold paths"))?;
            parts.pop_if_empty();
            match segments(path).split_last() {
                Some((last, parents)) => {
                    parts.extend(parents);
                    parts.push(&format!("{last}.json"));
                }
                None => {
                    parts.push(".json");
                }
            }
        }
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }
}

/// Turns a non-2xx response into [`Error::Service`].
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body).map_or_else(
        |_| format!("store returned {status}: {body}"),
        |parsed| format!("store returned {status}: {}", parsed.error),
    );
    warn!(%status, "store request rejected");
    Err(Error::Service { message })
}

#[async_trait]
impl RecordStore for RestStore {
    #[instrument(skip(self, value))]
    async fn set(&self, path: &str, value: Value) -> Result<()> {
        let response = self.client.put(self.url_for(path)?).json(&value).send().await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, path: &str, patch: Map<String, Value>) -> Result<()> {
        let response = self
            .client
            .patch(self.url_for(path)?)
            .json(&patch)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, path: &str) -> Result<()> {
        let response = self.client.delete(self.url_for(path)?).send().await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let response = check(self.client.get(self.url_for(path)?).send().await?).await?;
        let value: Value = response.json().await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    #[instrument(skip(self))]
    async fn watch(&self, collection: &str) -> Result<ChangeFeed> {
        let response = self
            .client
            .get(self.url_for(collection)?)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .send()
            .await?;
        let response = check(response).await?;
        debug!(collection, "change stream opened");

        let collection = collection.to_string();
        let ticks = response.bytes_stream().eventsource().filter_map(move |item| {
            let collection = collection.clone();
            async move {
                match item {
                    Ok(event) => match event.event.as_str() {
                        "put" | "patch" => Some(Ok(())),
                        "keep-alive" => None,
                        "cancel" => Some(Err(Error::service(format!(
                            "store cancelled the listener on '{collection}'"
                        )))),
                        "auth_revoked" => Some(Err(Error::service(
                            "store credential expired while listening",
                        ))),
                        other => {
                            debug!(event = other, "ignoring unknown stream event");
                            None
                        }
                    },
                    Err(e) => Some(Err(Error::service(format!("change stream error: {e}")))),
                }
            }
        });

        Ok(Box::pin(ticks))
    }

    fn push_key(&self) -> String {
        self.keys.next_id()
    }
}
