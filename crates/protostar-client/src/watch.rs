//! Reconnecting watch of unbound pods.
//!
//! The API server streams newline-delimited `{type, object}` JSON on
//! `/api/v1/watch/pods`. The watch task forwards `ADDED` pods on one channel
//! and errors on a second; on any failure it reconnects after a fixed delay
//! until the consumer goes away or the token is cancelled.

use crate::client::ApiClient;
use crate::error::{ClientError, Result};
use futures_util::TryStreamExt;
use k8s_openapi::api::core::v1::Pod;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const ACCEPT_JSON: &str = "application/json, */*";

/// Delay before re-dialing the watch endpoint after a failure.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Watch event as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchEvent<T> {
    #[serde(rename = "type")]
    pub event_type: WatchEventType,
    pub object: T,
}

/// Watch event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WatchEventType {
    Added,
    Modified,
    Deleted,
    Error,
}

/// Receiver half of an unbound-pod watch: newly added pods on one channel,
/// transport and decode errors on the other.
pub struct PodWatch {
    pub pods: mpsc::Receiver<Pod>,
    pub errors: mpsc::Receiver<ClientError>,
}

impl ApiClient {
    /// GET /api/v1/watch/pods with an empty-nodeName selector.
    ///
    /// Spawns the watch task and returns immediately; the stream is infinite
    /// and restartable, and ends only when the token is cancelled or the pod
    /// receiver is dropped.
    pub fn watch_unbound_pods(&self, token: CancellationToken) -> PodWatch {
        let (pod_tx, pod_rx) = mpsc::channel(16);
        let (err_tx, err_rx) = mpsc::channel(16);

        let http = self.http().clone();
        let url = format!("{}/api/v1/watch/pods", self.base_url());

        tokio::spawn(watch_loop(http, url, pod_tx, err_tx, token));

        PodWatch {
            pods: pod_rx,
            errors: err_rx,
        }
    }
}

async fn watch_loop(
    http: reqwest::Client,
    url: String,
    pod_tx: mpsc::Sender<Pod>,
    err_tx: mpsc::Sender<ClientError>,
    token: CancellationToken,
) {
    loop {
        if token.is_cancelled() {
            debug!("Watch task shutting down");
            return;
        }

        match connect_and_stream(&http, &url, &pod_tx, &token).await {
            Ok(()) => return,
            Err(e) => {
                let _ = err_tx.send(e).await;
            }
        }

        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }
}

/// One watch connection. Returns `Ok(())` only when the watch should stop
/// for good (cancellation or a dropped consumer); any other outcome is an
/// error for the caller to report before reconnecting.
async fn connect_and_stream(
    http: &reqwest::Client,
    url: &str,
    pod_tx: &mpsc::Sender<Pod>,
    token: &CancellationToken,
) -> Result<()> {
    let resp = http
        .get(url)
        .query(&[("fieldSelector", "spec.nodeName=")])
        .header(ACCEPT, ACCEPT_JSON)
        .send()
        .await?;

    if resp.status() != StatusCode::OK {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::unexpected_status("watch pods", status, body));
    }

    debug!("Watching {}", url);

    let byte_stream = resp
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
    let mut lines = BufReader::new(StreamReader::new(byte_stream)).lines();

    loop {
        let line = tokio::select! {
            _ = token.cancelled() => {
                debug!("Watch task shutting down");
                return Ok(());
            }
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<WatchEvent<Pod>>(&line) {
                    Ok(event) if event.event_type == WatchEventType::Added => {
                        if pod_tx.send(event.object).await.is_err() {
                            // Consumer is gone; the watch has no one to feed.
                            return Ok(());
                        }
                    }
                    // MODIFIED and DELETED carry nothing for a scheduler that
                    // only places unbound pods.
                    Ok(_) => {}
                    Err(e) => {
                        return Err(ClientError::decode(
                            format!("invalid watch event: {}", line),
                            Some(Box::new(e)),
                        ));
                    }
                }
            }
            // Server closed the stream; treat like any other drop and re-dial.
            Ok(None) => {
                return Err(ClientError::decode("watch stream ended", None));
            }
            Err(e) => {
                return Err(ClientError::decode(
                    "watch stream read failed",
                    Some(Box::new(e)),
                ));
            }
        }
    }
}
