//! HTTP client for the public course catalog.

use super::error::CatalogError;
use super::parse::{parse_majors, parse_minor_list, parse_minor_page};
use super::CatalogSource;
use crate::config::CatalogConfig;
use crate::requirements::{MinorListing, MinorRequirements};
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Scrapes minors, requirement pages and majors over HTTP.
pub struct HttpCatalog {
    client: Client,
    config: CatalogConfig,
    base_url: Url,
}

impl HttpCatalog {
    /// Creates a new catalog client with the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let base_url = Url::parse(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .build()
            .map_err(|e| CatalogError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// GETs a page and returns its body, failing on non-success statuses.
    async fn fetch_page(&self, url: &str) -> Result<String, CatalogError> {
        let start = Instant::now();
        debug!(url = %url, "Fetching catalog page");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::UnexpectedResponse {
                url: url.to_string(),
                message: format!("status {}", status),
            });
        }

        let html = response.text().await?;
        debug!(
            url = %url,
            html_len = html.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched catalog page"
        );
        Ok(html)
    }
}

impl CatalogSource for HttpCatalog {
    async fn list_minors(&self) -> Result<Vec<MinorListing>, CatalogError> {
        let html = self.fetch_page(&self.config.minors_page).await?;
        let minors = parse_minor_list(&html, &self.base_url)?;
        if minors.is_empty() {
            warn!(url = %self.config.minors_page, "No minors found on index page");
        } else {
            info!(count = minors.len(), "Discovered minors");
        }
        Ok(minors)
    }

    async fn get_requirements(&self, url: &str) -> Result<MinorRequirements, CatalogError> {
        let html = self.fetch_page(url).await?;
        let requirements = parse_minor_page(&html);
        debug!(
            url = %url,
            sections = requirements.sections.len(),
            notes = requirements.notes.len(),
            "Parsed minor page"
        );
        Ok(requirements)
    }

    async fn list_majors(&self) -> Result<Vec<String>, CatalogError> {
        let html = self.fetch_page(&self.config.majors_page).await?;
        let majors = parse_majors(&html);
        if majors.is_empty() {
            warn!(url = %self.config.majors_page, "No majors found on admissions page");
        }
        Ok(majors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_base_url() {
        let config = CatalogConfig {
            base_url: "catalog without scheme".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpCatalog::new(config),
            Err(CatalogError::Url { .. })
        ));
    }

    #[test]
    fn test_builds_with_defaults() {
        let catalog = HttpCatalog::new(CatalogConfig::default()).unwrap();
        assert_eq!(catalog.config.fetch_concurrency, 1);
        assert_eq!(catalog.base_url.host_str(), Some("catalog.purdue.edu"));
    }
}
