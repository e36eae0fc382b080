// FeatureServer HTTP client
//
// Wraps `reqwest::Client` with layer-scoped URL construction, token
// injection, service-error envelope detection, and transfer-limit paging.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Error;
use crate::models::{LayerInfo, QueryResponse, RawFeature, ServiceErrorEnvelope};
use crate::query::QueryRequest;
use crate::transport::TransportConfig;

/// Upper bound on transfer-limit pages followed by [`FeatureServiceClient::query_all`].
const MAX_PAGES: usize = 500;

/// Raw HTTP client for one ArcGIS FeatureServer.
///
/// The `base_url` is the service root, e.g.
/// `https://services2.arcgis.com/<org>/arcgis/rest/services/<name>/FeatureServer`.
/// Layers are addressed by their numeric sublayer id.
#[derive(Clone)]
pub struct FeatureServiceClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    timeout: Duration,
}

impl FeatureServiceClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(
        base_url: Url,
        token: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            token,
            timeout: transport.timeout,
        })
    }

    /// The service root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/{layer_id}`
    pub fn layer_url(&self, layer_id: u32) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{layer_id}"))?)
    }

    /// `{base}/{layer_id}/query`
    pub fn query_url(&self, layer_id: u32) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{layer_id}/query"))?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch layer metadata (name, geometry type, field schema).
    pub async fn layer_info(&self, layer_id: u32) -> Result<LayerInfo, Error> {
        let url = self.layer_url(layer_id)?;
        self.get(url, vec![("f", "json".into())]).await
    }

    /// Run a single query page.
    pub async fn query(&self, layer_id: u32, request: &QueryRequest) -> Result<QueryResponse, Error> {
        let url = self.query_url(layer_id)?;
        debug!(layer_id, where_clause = %request.where_clause, "layer query");
        self.get(url, request.to_params()).await
    }

    /// Run a query, following `exceededTransferLimit` with `resultOffset`
    /// until the service reports the result set is complete.
    ///
    /// Stops after `MAX_PAGES` pages; every fetched page is kept.
    pub async fn query_all(
        &self,
        layer_id: u32,
        request: &QueryRequest,
    ) -> Result<Vec<RawFeature>, Error> {
        let mut all = Vec::new();
        let mut page = self.query(layer_id, request).await?;
        let mut pages = 1;

        loop {
            let received = page.features.len();
            all.extend(page.features);

            if !page.exceeded_transfer_limit || received == 0 {
                break;
            }
            if pages >= MAX_PAGES {
                warn!(layer_id, pages, features = all.len(), "page limit reached, result set truncated");
                break;
            }

            let offset = u64::try_from(all.len()).unwrap_or(u64::MAX);
            trace!(layer_id, offset, "transfer limit exceeded, fetching next page");
            page = self.query(layer_id, &request.at_offset(offset)).await?;
            pages += 1;
        }

        Ok(all)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<T, Error> {
        if let Some(ref token) = self.token {
            params.push(("token", token.expose_secret().to_owned()));
        }
        trace!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        parse_body(status, &body)
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// Decode a response body, surfacing `{"error": {...}}` bodies as
/// [`Error::Service`] regardless of the HTTP status.
fn parse_body<T: DeserializeOwned>(status: reqwest::StatusCode, body: &str) -> Result<T, Error> {
    if let Ok(wrapper) = serde_json::from_str::<ServiceErrorEnvelope>(body) {
        if let Some(err) = wrapper.error {
            return Err(Error::Service {
                code: err.code,
                message: err.message.unwrap_or_default(),
                details: err.details,
            });
        }
    }

    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}
