//! Device location providers and the session's location handle.
//!
//! The lookup runs in the background as soon as the session starts. A search
//! reads whatever is known at that moment and never waits for it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::watch;

use shopseeker_core::{
    config::{LocationConfig, LocationSource},
    traits::LocationProvider,
    types::Coordinate,
    Error, Result,
};

/// Timeout for the IP lookup request.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Providers
// =============================================================================

/// A position known up front, e.g. from the command line.
pub struct FixedLocation {
    coordinate: Coordinate,
}

impl FixedLocation {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn current_position(&self) -> Result<Coordinate> {
        Ok(self.coordinate)
    }
}

/// No location support on this device.
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    fn name(&self) -> &str {
        "none"
    }

    async fn current_position(&self) -> Result<Coordinate> {
        Err(Error::location_unavailable("geolocation is not supported"))
    }
}

/// Approximate position from an IP geolocation service.
///
/// Accepts `lat`/`lon` (ip-api.com) or `latitude`/`longitude` (ipapi.co).
pub struct IpGeolocation {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "latitude")]
    lat: Option<f64>,
    #[serde(default, alias = "longitude")]
    lon: Option<f64>,
}

impl IpGeolocation {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl LocationProvider for IpGeolocation {
    fn name(&self) -> &str {
        "ip"
    }

    async fn current_position(&self) -> Result<Coordinate> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::location_unavailable(format!("IP lookup failed: {}", e)))?;

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| Error::location_unavailable(format!("IP lookup returned bad JSON: {}", e)))?;

        if body.status.as_deref() == Some("fail") {
            return Err(Error::location_unavailable(
                body.message.unwrap_or_else(|| "IP lookup failed".to_string()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon),
            _ => Err(Error::location_unavailable("IP lookup returned no coordinates")),
        }
    }
}

/// Pick the provider named in config. An explicit coordinate wins over config.
pub fn provider_from_config(
    config: &LocationConfig,
    explicit: Option<Coordinate>,
) -> Result<Arc<dyn LocationProvider>> {
    if let Some(coordinate) = explicit {
        return Ok(Arc::new(FixedLocation::new(coordinate)));
    }

    match config.provider {
        LocationSource::None => Ok(Arc::new(NoLocation)),
        LocationSource::Fixed => match (config.latitude, config.longitude) {
            (Some(lat), Some(lon)) => Ok(Arc::new(FixedLocation::new(
                Coordinate::new(lat, lon).map_err(|e| Error::config(e.message()))?,
            ))),
            _ => Err(Error::config(
                "location.provider = \"fixed\" needs location.latitude and location.longitude",
            )),
        },
        LocationSource::Ip => Ok(Arc::new(IpGeolocation::new(config.lookup_url.clone())?)),
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Write-once view of the device position.
///
/// Cloning is cheap; all clones see the same value. Once a coordinate is
/// published it stays for the life of the handle.
#[derive(Debug, Clone)]
pub struct LocationHandle {
    rx: watch::Receiver<Option<Coordinate>>,
}

impl LocationHandle {
    /// Start a background lookup. Must be called inside a tokio runtime.
    ///
    /// Failure is logged and otherwise ignored; the handle then stays empty.
    pub fn spawn(provider: Arc<dyn LocationProvider>) -> Self {
        let (tx, rx) = watch::channel(None);
        tokio::spawn(async move {
            match provider.current_position().await {
                Ok(coordinate) => {
                    tracing::info!(
                        provider = provider.name(),
                        latitude = coordinate.latitude(),
                        longitude = coordinate.longitude(),
                        "Location resolved"
                    );
                    // No receivers left means the session is gone.
                    let _ = tx.send(Some(coordinate));
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "Location access denied. Search results may be less accurate."
                    );
                }
            }
        });
        Self { rx }
    }

    /// Start from config. An explicit coordinate is available immediately;
    /// configured providers resolve in the background.
    pub fn start(config: &LocationConfig, explicit: Option<Coordinate>) -> Result<Self> {
        if let Some(coordinate) = explicit {
            return Ok(Self::ready(coordinate));
        }
        match config.provider {
            LocationSource::None => Ok(Self::unavailable()),
            LocationSource::Fixed | LocationSource::Ip => {
                Ok(Self::spawn(provider_from_config(config, None)?))
            }
        }
    }

    /// A handle that already holds `coordinate`.
    pub fn ready(coordinate: Coordinate) -> Self {
        let (_tx, rx) = watch::channel(Some(coordinate));
        Self { rx }
    }

    /// A handle that never resolves.
    pub fn unavailable() -> Self {
        let (_tx, rx) = watch::channel(None);
        Self { rx }
    }

    /// The position known right now, without waiting.
    pub fn current(&self) -> Option<Coordinate> {
        *self.rx.borrow()
    }

    /// Whether a position is known.
    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }

    /// Wait until the lookup has finished, successfully or not.
    pub async fn resolved(&self) -> Option<Coordinate> {
        let mut rx = self.rx.clone();
        loop {
            if let Some(coordinate) = *rx.borrow_and_update() {
                return Some(coordinate);
            }
            if rx.changed().await.is_err() {
                return *rx.borrow();
            }
        }
    }
}
