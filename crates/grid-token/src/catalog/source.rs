//! Where tech trees come from.

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::catalog::TechTree;
use crate::error::CatalogError;

/// Fetches the tech tree for a ship type.
#[async_trait]
pub trait TechTreeSource: Send + Sync {
    async fn fetch_tech_tree(&self, ship_type: &str) -> Result<TechTree, CatalogError>;
}

/// Serves tech trees held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticTechTreeSource {
    trees: FxHashMap<String, TechTree>,
}

impl StaticTechTreeSource {
    /// Creates a source with no trees.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the tree for `ship_type`.
    pub fn with_tree(mut self, ship_type: impl Into<String>, tree: TechTree) -> Self {
        self.trees.insert(ship_type.into(), tree);
        self
    }
}

#[async_trait]
impl TechTreeSource for StaticTechTreeSource {
    async fn fetch_tech_tree(&self, ship_type: &str) -> Result<TechTree, CatalogError> {
        self.trees
            .get(ship_type)
            .cloned()
            .ok_or_else(|| CatalogError::Unavailable {
                ship_type: ship_type.to_string(),
            })
    }
}

#[cfg(feature = "http")]
pub use http::HttpTechTreeSource;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::TechTreeSource;
    use crate::catalog::TechTree;
    use crate::codec::percent::encode_component;
    use crate::config::CatalogConfig;
    use crate::error::CatalogError;

    /// Fetches tech trees from `GET {api_base}/tech_tree/{ship_type}`.
    #[derive(Debug, Clone)]
    pub struct HttpTechTreeSource {
        client: reqwest::Client,
        api_base: String,
    }

    impl HttpTechTreeSource {
        /// Creates a source for the configured service.
        pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .map_err(|e| CatalogError::Transport {
                    url: config.api_base.clone(),
                    message: e.to_string(),
                })?;
            Ok(Self {
                client,
                api_base: config.api_base.trim_end_matches('/').to_string(),
            })
        }

        /// URL of the tech tree for `ship_type`.
        pub fn tech_tree_url(&self, ship_type: &str) -> String {
            format!("{}/tech_tree/{}", self.api_base, encode_component(ship_type))
        }
    }

    #[async_trait]
    impl TechTreeSource for HttpTechTreeSource {
        async fn fetch_tech_tree(&self, ship_type: &str) -> Result<TechTree, CatalogError> {
            let url = self.tech_tree_url(ship_type);
            log::debug!("fetching tech tree from {url}");

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| transport_error(&url, e))?;
            if !response.status().is_success() {
                return Err(CatalogError::Status {
                    url,
                    status: response.status().as_u16(),
                });
            }
            let body = response.text().await.map_err(|e| transport_error(&url, e))?;
            TechTree::from_json(&body)
        }
    }

    fn transport_error(url: &str, e: reqwest::Error) -> CatalogError {
        CatalogError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticTechTreeSource::new().with_tree("standard", TechTree::default());
        assert!(source.fetch_tech_tree("standard").await.is_ok());
        assert_eq!(
            source.fetch_tech_tree("freighter").await,
            Err(CatalogError::Unavailable { ship_type: "freighter".to_string() })
        );
    }
}
