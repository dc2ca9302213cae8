//! GeoJSON feeds.
//!
//! Only the geometry types the map draws are modelled. Anything else parses
//! as [`Geometry::Unsupported`] and is skipped by the layers.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use crate::config::MapConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de> + Default"))]
pub struct FeatureCollection<P = serde_json::Value> {
    #[serde(default)]
    pub features: Vec<Feature<P>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de> + Default"))]
pub struct Feature<P = serde_json::Value> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: P,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Vec<f64> },
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    #[serde(other)]
    Unsupported,
}

/// Properties of a USGS earthquake summary feature.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuakeProperties {
    #[serde(default)]
    pub mag: Option<f64>,
    #[serde(default)]
    pub place: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

pub fn parse_collection<P>(bytes: &[u8]) -> Result<FeatureCollection<P>>
where
    P: DeserializeOwned + Default,
{
    Ok(serde_json::from_slice(bytes)?)
}

/// Loads feeds over HTTP or from disk.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    pub fn new(config: &MapConfig) -> Result<Self> {
        Self::with_settings(&config.user_agent, config.request_timeout)
    }

    pub fn with_settings(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }

    /// Loads a FeatureCollection from an http(s) URL or a file path.
    pub fn load<P>(&self, source: &str) -> Result<FeatureCollection<P>>
    where
        P: DeserializeOwned + Default,
    {
        let bytes = if is_remote(source) {
            debug!("fetching feed {source}");
            self.fetch_bytes(source)?
        } else {
            let path = Path::new(source);
            std::fs::read(path).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?
        };

        let collection = parse_collection::<P>(&bytes)?;
        info!(
            "loaded {} features ({} bytes) from {source}",
            collection.features.len(),
            bytes.len()
        );
        Ok(collection)
    }
}
