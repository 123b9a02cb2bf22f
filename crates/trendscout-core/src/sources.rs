//! Best-seller source catalogue loaded from `config/sources.yaml`.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::region::Region;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    /// Path appended to the region's `base_url`, e.g. `/gp/bestsellers/beauty/`.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSource {
    pub region: Region,
    pub base_url: String,
    /// Overrides the region's own currency symbol when finding prices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub categories: Vec<CategoryConfig>,
}

impl RegionSource {
    #[must_use]
    pub fn currency_symbol(&self) -> &str {
        self.currency
            .as_deref()
            .unwrap_or_else(|| self.region.currency_symbol())
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn category_url(&self, category: &CategoryConfig) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), category.path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesFile {
    pub regions: Vec<RegionSource>,
}

impl SourcesFile {
    #[must_use]
    pub fn region(&self, region: Region) -> Option<&RegionSource> {
        self.regions.iter().find(|r| r.region == region)
    }
}

/// Load and validate the source catalogue from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_sources(&content)
}

/// Parse and validate catalogue YAML.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_sources(content: &str) -> Result<SourcesFile, ConfigError> {
    let sources: SourcesFile = serde_yaml::from_str(content)?;
    validate_sources(&sources)?;
    Ok(sources)
}

fn validate_sources(sources: &SourcesFile) -> Result<(), ConfigError> {
    let mut seen_regions = HashSet::new();

    for region in &sources.regions {
        if !seen_regions.insert(region.region) {
            return Err(ConfigError::Validation(format!(
                "region {} is listed more than once",
                region.region
            )));
        }

        if region.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "region {} has an empty base_url",
                region.region
            )));
        }

        if region.categories.is_empty() {
            return Err(ConfigError::Validation(format!(
                "region {} has no categories",
                region.region
            )));
        }

        let mut seen_names = HashSet::new();
        for category in &region.categories {
            if category.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "region {} has a category with an empty name",
                    region.region
                )));
            }
            if !seen_names.insert(category.name.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "region {} lists category '{}' twice",
                    region.region, category.name
                )));
            }
        }
    }

    Ok(())
}
