// Nominatim reverse geocoder
use crate::application::geocoder::{GeocodeError, GeocodeResolver};
use crate::domain::location::AddressSummary;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn build_reverse_url(&self, latitude: f64, longitude: f64) -> String {
        format!(
            "{}/reverse?format=json&lat={}&lon={}&zoom=18&addressdetails=1",
            self.base_url, latitude, longitude
        )
    }
}

#[async_trait]
impl GeocodeResolver for NominatimGeocoder {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<AddressSummary, GeocodeError> {
        let url = self.build_reverse_url(latitude, longitude);
        tracing::debug!("Reverse geocoding {}, {}", latitude, longitude);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let body = response
            .json::<ReverseResponse>()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        summarize(body, latitude, longitude)
    }
}

fn summarize(body: ReverseResponse, latitude: f64, longitude: f64) -> Result<AddressSummary, GeocodeError> {
    match body.display_name {
        Some(name) if !name.trim().is_empty() => {
            Ok(AddressSummary::from_display_name(&name, latitude, longitude))
        }
        _ => Err(GeocodeError::NoAddress),
    }
}
