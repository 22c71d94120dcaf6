//! Layered settings: defaults, optional TOML file, then `DUMPTRAC_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use config::{Config, Environment, File};
use dumptrac_core::{
    GeoPoint,
    map::{DEFAULT_CENTER, DEFAULT_ZOOM},
    table::{DEFAULT_TIME_FORMAT, is_valid_time_format},
};
use dumptrac_rest::DEFAULT_BASE_URL;
use serde::Deserialize;

use crate::map_layer::MAX_ZOOM;

/// Config file looked up in the working directory when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "dumptrac.toml";

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Settings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub time_format: String,
    pub map_center_lat: f64,
    pub map_center_lng: f64,
    pub map_zoom: u8,
}

impl Settings {
    /// Load settings; an explicitly given file must exist, the default one may not.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let settings: Settings = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("timeout_secs", 10_i64)?
            .set_default("user_agent", concat!("dumptrac/", env!("CARGO_PKG_VERSION")))?
            .set_default("log_level", "info")?
            .set_default("log_dir", "logs")?
            .set_default("time_format", DEFAULT_TIME_FORMAT)?
            .set_default("map_center_lat", DEFAULT_CENTER.latitude)?
            .set_default("map_center_lng", DEFAULT_CENTER.longitude)?
            .set_default("map_zoom", i64::from(DEFAULT_ZOOM))?
            .add_source(File::from(file.clone()).required(required))
            .add_source(Environment::with_prefix("DUMPTRAC").try_parsing(true))
            .build()
            .and_then(Config::try_deserialize)
            .with_context(|| format!("failed to load settings from {}", file.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            bail!("base_url must not be empty");
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("base_url must start with http:// or https://, got {base_url}");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        if self.map_zoom > MAX_ZOOM {
            bail!("map_zoom must be at most {MAX_ZOOM}, got {}", self.map_zoom);
        }
        if !self.map_center().is_valid() {
            bail!(
                "map center {}, {} is out of range",
                self.map_center_lat,
                self.map_center_lng
            );
        }
        if !is_valid_time_format(&self.time_format) {
            bail!("time_format {:?} is not a valid chrono format", self.time_format);
        }
        Ok(())
    }

    pub(crate) fn map_center(&self) -> GeoPoint {
        GeoPoint::new(self.map_center_lat, self.map_center_lng)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("create temp config");
        file.write_all(contents.as_bytes()).expect("write temp config");
        file
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_config(
            r#"
base_url = "https://bins.example.org/api"
timeout_secs = 3
map_zoom = 14
"#,
        );

        let settings = Settings::load(Some(file.path())).expect("settings");

        assert_eq!(settings.base_url, "https://bins.example.org/api");
        assert_eq!(settings.timeout_secs, 3);
        assert_eq!(settings.map_zoom, 14);
        assert_eq!(settings.time_format, DEFAULT_TIME_FORMAT);
        assert_eq!(settings.map_center(), DEFAULT_CENTER);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/dumptrac.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        for contents in [
            r#"base_url = "ftp://bins""#,
            "timeout_secs = 0",
            "map_zoom = 25",
            "map_center_lat = 120.0",
            r#"time_format = "%Q""#,
        ] {
            let file = write_config(contents);
            assert!(
                Settings::load(Some(file.path())).is_err(),
                "{contents} should be rejected"
            );
        }
    }
}
