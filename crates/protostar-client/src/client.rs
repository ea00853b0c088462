use crate::error::{ClientError, Result};
use k8s_openapi::api::core::v1::{Binding, Event, Node, Pod};
use k8s_openapi::List;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Accept header sent on every read against the API server.
const ACCEPT_JSON: &str = "application/json, */*";

/// Lightweight HTTP client for the scheduler to talk to the API server.
///
/// Holds a base URL like `http://127.0.0.1:8080` and a shared connection
/// pool. The client carries a connect timeout but no total request timeout:
/// the watch response body is deliberately never-ending.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// GET /api/v1/nodes
    pub async fn list_nodes(&self) -> Result<Vec<Node>> {
        let url = format!("{}/api/v1/nodes", self.base_url);
        debug!("GET {}", url);

        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, ACCEPT_JSON)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::unexpected_status("list nodes", status, body));
        }

        let list: List<Node> = resp.json().await?;
        Ok(list.items)
    }

    /// GET /api/v1/pods, restricted to running and pending phases.
    ///
    /// This is the pod set that counts against node resources.
    pub async fn list_pods(&self) -> Result<Vec<Pod>> {
        let url = format!("{}/api/v1/pods", self.base_url);
        debug!("GET {}", url);

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("fieldSelector", "status.phase=Running"),
                ("fieldSelector", "status.phase=Pending"),
            ])
            .header(ACCEPT, ACCEPT_JSON)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::unexpected_status("list pods", status, body));
        }

        let list: List<Pod> = resp.json().await?;
        Ok(list.items)
    }

    /// GET /api/v1/pods with an empty-nodeName selector, filtered client-side
    /// to pods that opted into the named scheduler.
    pub async fn list_unbound_pods(&self, scheduler_name: &str) -> Result<Vec<Pod>> {
        let url = format!("{}/api/v1/pods", self.base_url);
        debug!("GET {} (unbound)", url);

        let resp = self
            .http
            .get(&url)
            .query(&[("fieldSelector", "spec.nodeName=")])
            .header(ACCEPT, ACCEPT_JSON)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::unexpected_status(
                "list unbound pods",
                status,
                body,
            ));
        }

        let list: List<Pod> = resp.json().await?;
        Ok(list
            .items
            .into_iter()
            .filter(|pod| protostar_core::opted_in(pod, scheduler_name))
            .collect())
    }

    /// POST /api/v1/namespaces/default/pods/{name}/binding/
    ///
    /// Anything but 201 is an error; a conflict means another placement won.
    pub async fn post_binding(&self, pod_name: &str, binding: &Binding) -> Result<()> {
        let url = format!(
            "{}/api/v1/namespaces/default/pods/{}/binding/",
            self.base_url, pod_name
        );
        debug!("POST {}", url);

        let resp = self.http.post(&url).json(binding).send().await?;

        if resp.status() != StatusCode::CREATED {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::unexpected_status("post binding", status, body));
        }

        Ok(())
    }

    /// POST /api/v1/namespaces/default/events
    pub async fn post_event(&self, event: &Event) -> Result<()> {
        let url = format!("{}/api/v1/namespaces/default/events", self.base_url);
        debug!("POST {}", url);

        let resp = self.http.post(&url).json(event).send().await?;

        if resp.status() != StatusCode::CREATED {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::unexpected_status("post event", status, body));
        }

        Ok(())
    }
}
