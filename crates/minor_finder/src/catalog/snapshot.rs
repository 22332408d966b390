//! In-memory catalog loaded from a JSON snapshot, for offline runs.

use super::error::CatalogError;
use super::{CatalogEntry, CatalogSource};
use crate::requirements::{MinorListing, MinorRequirements};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk snapshot format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub minors: Vec<CatalogEntry>,
    #[serde(default)]
    pub majors: Vec<String>,
}

/// Serves minors and majors from memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    snapshot: Snapshot,
}

impl StaticCatalog {
    pub fn new(minors: Vec<CatalogEntry>, mut majors: Vec<String>) -> Self {
        majors.sort();
        majors.dedup();
        Self {
            snapshot: Snapshot { minors, majors },
        }
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let snapshot: Snapshot = serde_json::from_str(content)?;
        Ok(Self::new(snapshot.minors, snapshot.majors))
    }

    /// Reads a snapshot file written by [`StaticCatalog::save`] or by hand.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let content = serde_json::to_string_pretty(&self.snapshot)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.snapshot.minors
    }

    /// Copies everything `source` currently serves into memory.
    ///
    /// Unlike the recommendation pass, a failed requirement page aborts the
    /// capture so a snapshot never silently contains empty minors.
    pub async fn capture<S: CatalogSource>(source: &S) -> Result<Self, CatalogError> {
        let mut minors = Vec::new();
        for listing in source.list_minors().await? {
            let requirements = source.get_requirements(&listing.link).await?;
            minors.push(CatalogEntry {
                listing,
                requirements,
            });
        }
        let majors = source.list_majors().await?;
        Ok(Self::new(minors, majors))
    }
}

impl CatalogSource for StaticCatalog {
    async fn list_minors(&self) -> Result<Vec<MinorListing>, CatalogError> {
        Ok(self
            .snapshot
            .minors
            .iter()
            .map(|entry| entry.listing.clone())
            .collect())
    }

    async fn get_requirements(&self, url: &str) -> Result<MinorRequirements, CatalogError> {
        self.snapshot
            .minors
            .iter()
            .find(|entry| entry.listing.link == url)
            .map(|entry| entry.requirements.clone())
            .ok_or_else(|| CatalogError::NotFound {
                url: url.to_string(),
            })
    }

    async fn list_majors(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.snapshot.majors.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::RawItems;

    const SNAPSHOT: &str = r#"{
        "minors": [
            {
                "name": "Statistics Minor",
                "link": "https://catalog.example.edu/stat",
                "sections": {
                    "A. Required": ["STAT35000"],
                    "B. Choose one": [["STAT41600", "STAT41700"], ["STAT51200"]]
                },
                "notes": ["At least 50% at Purdue."]
            },
            { "name": "Art Minor", "link": "https://catalog.example.edu/art" }
        ],
        "majors": ["Statistics", "Art", "Statistics"]
    }"#;

    #[tokio::test]
    async fn test_loads_snapshot() {
        let catalog = StaticCatalog::from_json(SNAPSHOT).unwrap();

        let minors = catalog.list_minors().await.unwrap();
        assert_eq!(minors.len(), 2);
        assert_eq!(minors[0].name, "Statistics Minor");

        let stat = catalog
            .get_requirements("https://catalog.example.edu/stat")
            .await
            .unwrap();
        assert_eq!(stat.notes.len(), 1);
        assert!(matches!(stat.sections["B. Choose one"], RawItems::Grouped(_)));

        let art = catalog
            .get_requirements("https://catalog.example.edu/art")
            .await
            .unwrap();
        assert!(art.sections.is_empty());

        assert_eq!(
            catalog.list_majors().await.unwrap(),
            vec!["Art".to_string(), "Statistics".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_link_is_not_found() {
        let catalog = StaticCatalog::from_json(SNAPSHOT).unwrap();
        let err = catalog
            .get_requirements("https://catalog.example.edu/nope")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_capture_round_trips_through_file() {
        let original = StaticCatalog::from_json(SNAPSHOT).unwrap();
        let captured = StaticCatalog::capture(&original).await.unwrap();
        assert_eq!(captured.entries(), original.entries());

        let path = std::env::temp_dir().join(format!(
            "minor_finder_snapshot_{}.json",
            std::process::id()
        ));
        captured.save(&path).unwrap();
        let reloaded = StaticCatalog::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(reloaded.entries(), original.entries());
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            StaticCatalog::from_json("{\"minors\": 3}"),
            Err(CatalogError::Json { .. })
        ));
    }
}
