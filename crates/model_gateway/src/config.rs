use std::time::Duration;

use secrecy::Secret;
use url::Url;

use shopseeker_core::{
    config::{AnalysisConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL},
    Error, Result,
};

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Service root; request paths are joined onto it.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Service credential.
    pub api_key: Secret<String>,
    /// Overall request timeout. `None` keeps the HTTP client default.
    pub request_timeout: Option<Duration>,
}

impl GeminiConfig {
    /// Default endpoint and model with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: Secret::new(api_key.into()),
            request_timeout: None,
        }
    }

    /// Build from the `analysis` config section.
    pub fn from_analysis_config(config: &AnalysisConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            Error::config("no API key: set analysis.api_key, GEMINI_API_KEY or API_KEY")
        })?;

        parse_endpoint(&config.endpoint)?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Point the client at another service root.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        parse_endpoint(endpoint)?;
        self.endpoint = endpoint.to_string();
        Ok(self)
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Full URL of the `generateContent` call for the configured model.
    pub fn generate_content_url(&self) -> Result<Url> {
        parse_endpoint(&self.endpoint)?
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|e| Error::config(format!("invalid model name {:?}: {}", self.model, e)))
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let mut url =
        Url::parse(raw).map_err(|e| Error::config(format!("invalid endpoint {:?}: {}", raw, e)))?;
    // Url::join replaces the last segment unless the path ends in '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_content_url() {
        let cfg = GeminiConfig::new("key");
        assert_eq!(
            cfg.generate_content_url().unwrap().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_endpoint_with_path_prefix() {
        let cfg = GeminiConfig::new("key")
            .with_endpoint("http://127.0.0.1:8080/proxy")
            .unwrap()
            .with_model("gemini-2.5-pro");
        assert_eq!(
            cfg.generate_content_url().unwrap().as_str(),
            "http://127.0.0.1:8080/proxy/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_from_analysis_config_carries_timeout() {
        let mut analysis = shopseeker_core::config::AppConfig::default().analysis;
        analysis.api_key = Some(Secret::new("cfg-key".to_string()));
        analysis.request_timeout_secs = Some(45);
        analysis.model = "gemini-2.5-pro".into();

        let cfg = GeminiConfig::from_analysis_config(&analysis).unwrap();
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(45)));
        assert_eq!(cfg.model, "gemini-2.5-pro");
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let err = GeminiConfig::new("key").with_endpoint("not a url").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
