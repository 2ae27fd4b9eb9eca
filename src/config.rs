use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Branded lines of the institutional header band on every PDF page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branding {
    #[serde(default = "default_league")]
    pub league: String,
    #[serde(default = "default_charter")]
    pub charter: String,
    #[serde(default = "default_tournament")]
    pub tournament: String,
}

fn default_league() -> String {
    "Liga Deportiva Bienestar Familiar de Calderón".to_string()
}

fn default_charter() -> String {
    "Ministerial agreement No. 0184 | 15 August 2023".to_string()
}

fn default_tournament() -> String {
    "Player roster – 6th men's indoor football championship".to_string()
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            league: default_league(),
            charter: default_charter(),
            tournament: default_tournament(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Hostname fragment of the image service whose URLs accept transform segments.
    #[serde(default = "default_image_host")]
    pub image_host: String,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// League logo, drawn in the header band and as the page watermark.
    #[serde(default)]
    pub watermark: Option<PathBuf>,

    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,

    #[serde(default)]
    pub branding: Branding,
}

fn default_image_host() -> String {
    "res.cloudinary.com".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    20
}

fn default_filename_prefix() -> String {
    "Reporte_".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            image_host: default_image_host(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            watermark: None,
            filename_prefix: default_filename_prefix(),
            branding: Branding::default(),
        }
    }
}

impl ReportConfig {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, Error> {
        Ok(toml::from_str(content)?)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = ReportConfig::from_toml("").unwrap();
        assert_eq!(cfg, ReportConfig::default());
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn partial_branding_keeps_other_lines() {
        let cfg = ReportConfig::from_toml(
            "fetch_timeout_secs = 5\n[branding]\nleague = \"Liga Norte\"\n",
        )
        .unwrap();
        assert_eq!(cfg.fetch_timeout_secs, 5);
        assert_eq!(cfg.branding.league, "Liga Norte");
        assert_eq!(cfg.branding.charter, default_charter());
        assert_eq!(cfg.image_host, "res.cloudinary.com");
    }
}
