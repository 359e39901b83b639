//! Optional RON configuration layered over the engine defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use harvest_logging::harvest_info;
use roster_engine::{FetchSettings, PipelineSettings};
use serde::Deserialize;

/// Every field is optional; absent fields keep the engine default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub index_url_template: Option<String>,
    pub records_per_page: Option<usize>,
    pub detail_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub ids_filename: Option<String>,
    pub records_filename: Option<String>,
    pub redirect_limit: Option<usize>,
    pub max_bytes: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        harvest_info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn apply(self, pipeline: &mut PipelineSettings, fetch: &mut FetchSettings) {
        if let Some(template) = self.index_url_template {
            pipeline.index.url_template = template;
        }
        if let Some(per_page) = self.records_per_page {
            pipeline.index.records_per_page = per_page;
        }
        if let Some(url) = self.detail_url {
            pipeline.detail.detail_url = url;
        }
        if let Some(dir) = self.output_dir {
            pipeline.output.output_dir = dir;
        }
        if let Some(name) = self.ids_filename {
            pipeline.output.ids_filename = name;
        }
        if let Some(name) = self.records_filename {
            pipeline.output.records_filename = name;
        }
        if let Some(limit) = self.redirect_limit {
            fetch.redirect_limit = limit;
        }
        if let Some(max) = self.max_bytes {
            fetch.max_bytes = max;
        }
        if let Some(secs) = self.connect_timeout_secs {
            fetch.connect_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = self.request_timeout_secs {
            fetch.request_timeout = Some(Duration::from_secs(secs));
        }
    }
}
