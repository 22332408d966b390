//! Course catalog access: the minor index, each minor's requirement page and
//! the list of majors.
mod cache;
mod client;
mod error;
mod parse;
mod snapshot;

pub use cache::{CacheStats, CachedCatalog, TtlCache};
pub use client::HttpCatalog;
pub use error::CatalogError;
pub use parse::{parse_majors, parse_minor_list, parse_minor_page};
pub use snapshot::{Snapshot, StaticCatalog};

use crate::requirements::{MinorListing, MinorRequirements};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A source of catalog data.
///
/// Implementations must be cheap to share across tasks; every method may be
/// called concurrently.
pub trait CatalogSource: Send + Sync {
    /// Every minor in catalog order.
    fn list_minors(&self) -> impl Future<Output = Result<Vec<MinorListing>, CatalogError>> + Send;

    /// Sections and notes from one minor's page.
    fn get_requirements(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<MinorRequirements, CatalogError>> + Send;

    /// Names of all majors, sorted.
    fn list_majors(&self) -> impl Future<Output = Result<Vec<String>, CatalogError>> + Send;
}

/// A minor together with its fetched requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub listing: MinorListing,
    #[serde(flatten)]
    pub requirements: MinorRequirements,
}

/// The source a running application reads from.
pub enum CatalogBackend {
    Http(HttpCatalog),
    Snapshot(StaticCatalog),
}

impl CatalogSource for CatalogBackend {
    async fn list_minors(&self) -> Result<Vec<MinorListing>, CatalogError> {
        match self {
            CatalogBackend::Http(c) => c.list_minors().await,
            CatalogBackend::Snapshot(c) => c.list_minors().await,
        }
    }

    async fn get_requirements(&self, url: &str) -> Result<MinorRequirements, CatalogError> {
        match self {
            CatalogBackend::Http(c) => c.get_requirements(url).await,
            CatalogBackend::Snapshot(c) => c.get_requirements(url).await,
        }
    }

    async fn list_majors(&self) -> Result<Vec<String>, CatalogError> {
        match self {
            CatalogBackend::Http(c) => c.list_majors().await,
            CatalogBackend::Snapshot(c) => c.list_majors().await,
        }
    }
}
