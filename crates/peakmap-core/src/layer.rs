// ── Remote feature layer ──
//
// `LayerSource` over a FeatureServer sublayer. Metadata is fetched once in
// `load_all`; queries go straight to the service. The display filter lives
// client-side, swapped atomically on each facet change.

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info, warn};

use peakmap_api::transport::{TlsMode, TransportConfig};
use peakmap_api::{FeatureServiceClient, QueryRequest};

use crate::config::{ServiceConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{Attributes, Feature, LayerId, LayerSchema};
use crate::predicate::Predicate;
use crate::settle::settle_all;
use crate::source::LayerSource;

pub struct FeatureLayer {
    client: FeatureServiceClient,
    id: LayerId,
    title: String,
    schema: LayerSchema,
    out_sr: Option<u32>,
    display_filter: ArcSwap<Predicate>,
}

impl std::fmt::Debug for FeatureLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureLayer")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("fields", &self.schema.fields().len())
            .finish_non_exhaustive()
    }
}

impl FeatureLayer {
    /// Fetch one layer's metadata.
    pub async fn load(
        client: FeatureServiceClient,
        id: LayerId,
        out_sr: Option<u32>,
    ) -> Result<Self, CoreError> {
        let info = client
            .layer_info(id.0)
            .await
            .map_err(|e| match CoreError::from(e) {
                CoreError::Api { code: Some(404 | 400), .. } => CoreError::LayerNotFound { layer: id },
                other => other.for_layer(id),
            })?;
        debug!(layer = %id, name = %info.name, fields = info.fields.len(), "layer metadata loaded");

        Ok(Self {
            client,
            id,
            title: info.name,
            schema: LayerSchema::from(info.fields.as_slice()),
            out_sr,
            display_filter: ArcSwap::from_pointee(Predicate::MatchAll),
        })
    }

    /// Load every configured layer in parallel, in configured order.
    ///
    /// Layers whose metadata cannot be fetched are logged and skipped. Fails
    /// only when no layer loads at all.
    pub async fn load_all(config: &ServiceConfig) -> Result<Vec<Arc<Self>>, CoreError> {
        let client = build_client(config)?;
        let tasks = config.layers.iter().map(|&id| {
            let client = client.clone();
            (id, Self::load(client, id, config.out_sr))
        });

        let settled = settle_all("load layer metadata", tasks).await;
        if settled.ok.is_empty() {
            return Err(settled.failed.into_iter().next().map_or_else(
                || CoreError::Config {
                    message: "no layers configured".into(),
                },
                |(_, e)| e,
            ));
        }
        if !settled.failed.is_empty() {
            warn!(
                loaded = settled.ok.len(),
                failed = settled.failed.len(),
                "some layers could not be loaded"
            );
        }

        let layers: Vec<Arc<Self>> = settled.into_values().into_iter().map(Arc::new).collect();
        info!(layers = layers.len(), url = %config.url, "layer catalog loaded");
        Ok(layers)
    }
}

fn build_client(config: &ServiceConfig) -> Result<FeatureServiceClient, CoreError> {
    let transport = TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    };
    Ok(FeatureServiceClient::new(
        config.url.clone(),
        config.token.clone(),
        &transport,
    )?)
}

impl LayerSource for FeatureLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn schema(&self) -> &LayerSchema {
        &self.schema
    }

    fn distinct_values(
        &self,
        fields: &[&str],
        predicate: &Predicate,
    ) -> impl Future<Output = Result<Vec<Attributes>, CoreError>> + Send {
        let request = QueryRequest::distinct(predicate.to_string(), fields);
        async move {
            let rows = self
                .client
                .query_all(self.id.0, &request)
                .await
                .map_err(|e| CoreError::from(e).for_layer(self.id))?;
            Ok(rows.into_iter().map(|row| row.attributes).collect())
        }
    }

    fn query_features(
        &self,
        predicate: &Predicate,
        include_geometry: bool,
    ) -> impl Future<Output = Result<Vec<Feature>, CoreError>> + Send {
        let mut request = QueryRequest::features(predicate.to_string(), include_geometry);
        if let Some(wkid) = self.out_sr.filter(|_| include_geometry) {
            request = request.with_out_sr(wkid);
        }
        async move {
            let rows = self
                .client
                .query_all(self.id.0, &request)
                .await
                .map_err(|e| CoreError::from(e).for_layer(self.id))?;
            Ok(rows
                .into_iter()
                .map(|raw| Feature::from_raw(self.id, raw))
                .collect())
        }
    }

    fn set_display_filter(&self, predicate: Predicate) {
        debug!(layer = %self.id, title = %self.title, where_clause = %predicate, "display filter applied");
        self.display_filter.store(Arc::new(predicate));
    }

    fn display_filter(&self) -> Arc<Predicate> {
        self.display_filter.load_full()
    }
}
