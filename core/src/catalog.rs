//! Distinct-value lookups (`/root-causes`, `/equipment-types`, `/departments`)

use crate::error::Result;
use crate::suggest::StaticVocabulary;
use crate::sync::{HttpRequest, RequestKind, SyncCoordinator};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Which distinct column to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    RootCauses,
    EquipmentTypes,
    Departments,
}

impl Catalog {
    pub const ALL: [Catalog; 3] = [
        Catalog::RootCauses,
        Catalog::EquipmentTypes,
        Catalog::Departments,
    ];

    /// Endpoint path
    fn path(self) -> &'static str {
        match self {
            Catalog::RootCauses => "/root-causes",
            Catalog::EquipmentTypes => "/equipment-types",
            Catalog::Departments => "/departments",
        }
    }

    /// Field holding the values in the response
    fn key(self) -> &'static str {
        match self {
            Catalog::RootCauses => "root_causes",
            Catalog::EquipmentTypes => "equipment_types",
            Catalog::Departments => "departments",
        }
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct CatalogResponse(serde_json::Map<String, serde_json::Value>);

pub struct CatalogClient {
    sync: Arc<SyncCoordinator>,
}

impl CatalogClient {
    pub fn new(sync: Arc<SyncCoordinator>) -> Self {
        Self { sync }
    }

    /// Sorted distinct values of one column
    pub async fn values(&self, catalog: Catalog) -> Result<Vec<String>> {
        let response: CatalogResponse = self
            .sync
            .fetch(RequestKind::FetchCatalog, HttpRequest::get(catalog.path()))
            .await?;

        let mut values: Vec<String> = response
            .0
            .get(catalog.key())
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        values.sort();
        values.dedup();

        debug!("Catalog {} has {} values", catalog, values.len());
        Ok(values)
    }

    /// Suggestion vocabulary built from the service's known root causes
    pub async fn root_cause_vocabulary(&self) -> Result<StaticVocabulary> {
        let causes = self.values(Catalog::RootCauses).await?;
        Ok(StaticVocabulary::from_terms(causes))
    }
}
