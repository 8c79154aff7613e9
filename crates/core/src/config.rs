use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

/// Default Gemini REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
/// Default multimodal model with Maps grounding support.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Inline image payload limit of the service.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;
/// Default IP geolocation endpoint.
pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub ingest: IngestConfig,
    pub location: LocationConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<Secret<String>>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    pub max_image_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocationConfig {
    pub provider: LocationSource,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub lookup_url: String,
}

/// Where the device coordinate comes from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    None,
    Fixed,
    Ip,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    pub log_filter: String,
    pub json_logs: bool,
}

impl AppConfig {
    /// Load configuration from defaults, config files and the environment.
    ///
    /// Later sources win: `config/default`, `config/{SHOPSEEKER_ENV}`,
    /// the explicit `extra` file, then `SHOPSEEKER__SECTION__KEY` variables.
    pub fn load(extra: Option<&Path>) -> Result<Self, ConfigError> {
        let env = std::env::var("SHOPSEEKER_ENV").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("analysis.endpoint", DEFAULT_ENDPOINT)?
            .set_default("analysis.model", DEFAULT_MODEL)?
            .set_default("ingest.max_image_bytes", DEFAULT_MAX_IMAGE_BYTES as i64)?
            .set_default("location.provider", "none")?
            .set_default("location.lookup_url", DEFAULT_LOOKUP_URL)?
            .set_default("telemetry.log_filter", "info,shopseeker=debug")?
            .set_default("telemetry.json_logs", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        if let Some(path) = extra {
            builder = builder.add_source(File::from(path));
        }

        // Map SHOPSEEKER__ANALYSIS__MODEL=... to analysis.model
        let s = builder
            .add_source(Environment::with_prefix("SHOPSEEKER").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

impl AnalysisConfig {
    /// The service credential: configured key first, then `GEMINI_API_KEY`,
    /// then `API_KEY`.
    pub fn resolve_api_key(&self) -> Option<Secret<String>> {
        if let Some(key) = self.api_key.as_ref() {
            if !key.expose_secret().trim().is_empty() {
                return Some(key.clone());
            }
        }
        ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
            .map(Secret::new)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig {
                endpoint: DEFAULT_ENDPOINT.into(),
                model: DEFAULT_MODEL.into(),
                api_key: None,
                request_timeout_secs: None,
            },
            ingest: IngestConfig {
                max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            },
            location: LocationConfig {
                provider: LocationSource::None,
                latitude: None,
                longitude: None,
                lookup_url: DEFAULT_LOOKUP_URL.into(),
            },
            telemetry: TelemetryConfig {
                log_filter: "info,shopseeker=debug".into(),
                json_logs: false,
            },
        }
    }
}
