// server/src/services/geocoding.rs

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
  pub latitude: f64,
  pub longitude: f64,
}

impl Coordinates {
  pub const ORIGIN: Coordinates = Coordinates {
    latitude: 0.0,
    longitude: 0.0,
  };
}

#[async_trait]
pub trait Geocoder: Send + Sync {
  async fn coordinates(&self, address: &str) -> anyhow::Result<Coordinates>;
}

/// Geocoding failures never block a canteen write: they degrade to `(0, 0)`.
pub async fn coordinates_or_origin(geocoder: &dyn Geocoder, address: &str) -> Coordinates {
  match geocoder.coordinates(address).await {
    Ok(coordinates) => coordinates,
    Err(e) => {
      warn!(address, error = %e, "Geocoding failed; using (0, 0).");
      Coordinates::ORIGIN
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct Place {
  /// `[south, north, west, east]`, as decimal strings.
  pub boundingbox: Vec<String>,
}

impl Place {
  /// Centre of the bounding box.
  pub fn midpoint(&self) -> anyhow::Result<Coordinates> {
    let edges = self
      .boundingbox
      .iter()
      .map(|edge| edge.trim().parse::<f64>().with_context(|| format!("bad bounding box edge '{}'", edge)))
      .collect::<anyhow::Result<Vec<f64>>>()?;
    match edges.as_slice() {
      [south, north, west, east] => Ok(Coordinates {
        latitude: (south + north) / 2.0,
        longitude: (west + east) / 2.0,
      }),
      other => Err(anyhow!("bounding box has {} edges, expected 4", other.len())),
    }
  }
}

/// Forward geocoding through a geocode.maps.co compatible search endpoint.
pub struct MapsCoGeocoder {
  client: reqwest::Client,
  api_url: String,
  api_key: Option<String>,
}

impl MapsCoGeocoder {
  pub fn new(client: reqwest::Client, api_url: String, api_key: Option<String>) -> Self {
    Self {
      client,
      api_url,
      api_key,
    }
  }
}

#[async_trait]
impl Geocoder for MapsCoGeocoder {
  #[instrument(name = "geocoding::coordinates", skip(self), err(Display))]
  async fn coordinates(&self, address: &str) -> anyhow::Result<Coordinates> {
    let mut request = self.client.get(&self.api_url).query(&[("q", address)]);
    if let Some(key) = &self.api_key {
      request = request.query(&[("api_key", key.as_str())]);
    }
    let places: Vec<Place> = request
      .send()
      .await
      .context("Geocoding request failed")?
      .error_for_status()
      .context("Geocoding service returned an error status")?
      .json()
      .await
      .context("Geocoding response was not the expected JSON")?;

    places
      .first()
      .ok_or_else(|| anyhow!("no place found for address"))?
      .midpoint()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct FailingGeocoder;

  #[async_trait]
  impl Geocoder for FailingGeocoder {
    async fn coordinates(&self, _address: &str) -> anyhow::Result<Coordinates> {
      Err(anyhow!("service unavailable"))
    }
  }

  #[test]
  fn midpoint_of_bounding_box() {
    let place = Place {
      boundingbox: vec!["1.29".into(), "1.31".into(), "103.76".into(), "103.78".into()],
    };
    let c = place.midpoint().unwrap();
    assert!((c.latitude - 1.30).abs() < 1e-9);
    assert!((c.longitude - 103.77).abs() < 1e-9);
  }

  #[test]
  fn malformed_bounding_box_is_an_error() {
    let short = Place {
      boundingbox: vec!["1.0".into(), "2.0".into()],
    };
    assert!(short.midpoint().is_err());
    let garbage = Place {
      boundingbox: vec!["a".into(), "2".into(), "3".into(), "4".into()],
    };
    assert!(garbage.midpoint().is_err());
  }

  #[tokio::test]
  async fn failure_degrades_to_origin() {
    let c = coordinates_or_origin(&FailingGeocoder, "1 Engineering Drive").await;
    assert_eq!(c, Coordinates::ORIGIN);
  }
}
