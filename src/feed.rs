//! Polling of the worm backend.
//!
//! A background thread fetches `/api/rpc` (movement history) and
//! `/api/recent` (recent transactions) and hands each result to a
//! `FeedSink`. The UI thread folds results into `FeedState`, which keeps
//! the last good payload when a fetch fails.

use std::fmt;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::{HistoryEntry, TransactionRecord};

/// Backend endpoints polled by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    History,
    Recent,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::History => "/api/rpc",
            Endpoint::Recent => "/api/recent",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },
    #[error("failed to decode {endpoint} payload: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {endpoint} payload: {reason}")]
    Invalid { endpoint: Endpoint, reason: String },
}

/// Decode a `/api/rpc` body and check that indexes strictly ascend.
pub fn decode_history(body: &str) -> Result<Vec<HistoryEntry>, FeedError> {
    let history: Vec<HistoryEntry> = decode(Endpoint::History, body)?;
    validate_history(&history)?;
    Ok(history)
}

/// Decode a `/api/recent` body.
pub fn decode_recent(body: &str) -> Result<Vec<TransactionRecord>, FeedError> {
    decode(Endpoint::Recent, body)
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, body: &str) -> Result<T, FeedError> {
    serde_json::from_str(body).map_err(|source| FeedError::Decode { endpoint, source })
}

pub fn validate_history(history: &[HistoryEntry]) -> Result<(), FeedError> {
    for pair in history.windows(2) {
        if pair[1].index <= pair[0].index {
            return Err(FeedError::Invalid {
                endpoint: Endpoint::History,
                reason: format!(
                    "index {} follows index {}; history must strictly ascend",
                    pair[1].index, pair[0].index
                ),
            });
        }
    }
    Ok(())
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Anything the poller can pull payloads from.
pub trait FeedSource {
    fn fetch_history(&self) -> Result<Vec<HistoryEntry>, FeedError>;
    fn fetch_recent(&self) -> Result<Vec<TransactionRecord>, FeedError>;
}

/// Blocking HTTP client for the backend.
pub struct FeedClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl FeedClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FeedError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        join_url(&self.base_url, endpoint.path())
    }

    fn get_body(&self, endpoint: Endpoint) -> Result<String, FeedError> {
        let response = self
            .http
            .get(self.url(endpoint))
            .send()
            .map_err(|source| FeedError::Request { endpoint, source })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<unavailable>".to_string());
            return Err(FeedError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        response
            .text()
            .map_err(|source| FeedError::Request { endpoint, source })
    }
}

impl FeedSource for FeedClient {
    fn fetch_history(&self) -> Result<Vec<HistoryEntry>, FeedError> {
        decode_history(&self.get_body(Endpoint::History)?)
    }

    fn fetch_recent(&self) -> Result<Vec<TransactionRecord>, FeedError> {
        decode_recent(&self.get_body(Endpoint::Recent)?)
    }
}

/// One fetch result on its way to the UI thread.
#[derive(Debug)]
pub enum FeedUpdate {
    History(Result<Vec<HistoryEntry>, FeedError>),
    Recent(Result<Vec<TransactionRecord>, FeedError>),
}

/// Where the poller delivers updates. `deliver` returns false once the
/// receiving side is gone, which stops the poller.
pub trait FeedSink {
    fn deliver(&self, update: FeedUpdate) -> bool;
}

impl FeedSink for Sender<FeedUpdate> {
    fn deliver(&self, update: FeedUpdate) -> bool {
        self.send(update).is_ok()
    }
}

/// Fetch both endpoints now and then every `interval` on a new thread.
pub fn spawn_poller<S, K>(source: S, interval: Duration, sink: K) -> std::io::Result<JoinHandle<()>>
where
    S: FeedSource + Send + 'static,
    K: FeedSink + Send + 'static,
{
    thread::Builder::new()
        .name("feed-poller".to_string())
        .spawn(move || {
            log::info!("feed poller started, interval {:?}", interval);
            loop {
                if !poll_once(&source, &sink) {
                    break;
                }
                thread::sleep(interval);
            }
            log::info!("feed poller stopped: receiver closed");
        })
}

/// One round of fetches. False when the sink has gone away.
pub fn poll_once<S: FeedSource, K: FeedSink>(source: &S, sink: &K) -> bool {
    let history = source.fetch_history();
    match &history {
        Ok(h) => log::debug!("fetched {} history entries", h.len()),
        Err(e) => log::warn!("{e}"),
    }
    if !sink.deliver(FeedUpdate::History(history)) {
        return false;
    }

    let recent = source.fetch_recent();
    match &recent {
        Ok(r) => log::debug!("fetched {} recent transactions", r.len()),
        Err(e) => log::warn!("{e}"),
    }
    sink.deliver(FeedUpdate::Recent(recent))
}

/// Last-known-good feed data as seen by the UI thread.
#[derive(Debug, Default)]
pub struct FeedState {
    history: Vec<HistoryEntry>,
    recent: Vec<TransactionRecord>,
    history_seen: bool,
    recent_seen: bool,
    history_error: Option<String>,
    recent_error: Option<String>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one update in. Returns true when the history was replaced.
    pub fn apply(&mut self, update: FeedUpdate) -> bool {
        match update {
            FeedUpdate::History(result) => {
                self.history_seen = true;
                match result {
                    Ok(history) => {
                        self.history = history;
                        self.history_error = None;
                        true
                    }
                    Err(e) => {
                        self.history_error = Some(e.to_string());
                        false
                    }
                }
            }
            FeedUpdate::Recent(result) => {
                self.recent_seen = true;
                match result {
                    Ok(recent) => {
                        self.recent = recent;
                        self.recent_error = None;
                    }
                    Err(e) => self.recent_error = Some(e.to_string()),
                }
                false
            }
        }
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn recent(&self) -> &[TransactionRecord] {
        &self.recent
    }

    /// True until the first history response, success or failure.
    pub fn loading(&self) -> bool {
        !self.history_seen
    }

    /// True until the first recent-transactions response.
    pub fn recent_loading(&self) -> bool {
        !self.recent_seen
    }

    /// True while the latest fetch of either endpoint failed.
    pub fn stale(&self) -> bool {
        self.history_error.is_some() || self.recent_error.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.history_error
            .as_deref()
            .or(self.recent_error.as_deref())
    }
}
