use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::EmissionMode;
use crate::error::IdmapError;
use crate::fetch::DEFAULT_SOURCE_URL;

pub const DEFAULT_CONFIG_FILE: &str = "rhea-idmap.json";
pub const DEFAULT_STAGING_PATH: &str = "resources/rhea2xrefs.txt";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub staging_path: Option<String>,
    #[serde(default)]
    pub emission: Option<String>,
    #[serde(default)]
    pub metadata: Option<MetadataEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MetadataEntry {
    #[serde(default)]
    pub datasource_name: Option<String>,
    #[serde(default)]
    pub datasource_version: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub datatype: Option<String>,
}

/// Fixed `info` rows written into every database, apart from the build date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildMetadata {
    pub datasource_name: String,
    pub datasource_version: String,
    pub series: String,
    pub datatype: String,
}

impl Default for BuildMetadata {
    fn default() -> Self {
        Self {
            datasource_name: "EBI-RHEA".to_string(),
            datasource_version: "1.0.0".to_string(),
            series: "standard-interaction".to_string(),
            datatype: "Interaction".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub source_url: String,
    pub staging_path: Utf8PathBuf,
    pub emission: EmissionMode,
    pub metadata: BuildMetadata,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            staging_path: Utf8PathBuf::from(DEFAULT_STAGING_PATH),
            emission: EmissionMode::default(),
            metadata: BuildMetadata::default(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `path`, or `rhea-idmap.json` from the working directory when no
    /// path is given. A missing default file yields the built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, IdmapError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| IdmapError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| IdmapError::ConfigParse(err.to_string()))?;

        tracing::debug!(path = %config_path.display(), "loaded config file");
        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, IdmapError> {
        let defaults = ResolvedConfig::default();
        let entry = config.metadata.unwrap_or_default();
        let base = defaults.metadata;

        let emission = match config.emission {
            Some(value) => value.parse::<EmissionMode>()?,
            None => defaults.emission,
        };

        Ok(ResolvedConfig {
            source_url: config.source_url.unwrap_or(defaults.source_url),
            staging_path: config
                .staging_path
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.staging_path),
            emission,
            metadata: BuildMetadata {
                datasource_name: entry.datasource_name.unwrap_or(base.datasource_name),
                datasource_version: entry
                    .datasource_version
                    .unwrap_or(base.datasource_version),
                series: entry.series.unwrap_or(base.series),
                datatype: entry.datatype.unwrap_or(base.datatype),
            },
        })
    }
}
