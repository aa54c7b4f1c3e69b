//! Cliente HTTP de la API Air Pollution de OpenWeatherMap.
//!
//! Todas las peticiones llevan timeout de conexión y de respuesta: una API
//! colgada no puede bloquear el barrido indefinidamente.


use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use crate::config::http_client::{CONNECT_TIMEOUT, TIMEOUT};
use crate::pollution::domain::{AirPollutionResponse, PollutionError, PollutionReading, PollutionSource};


#[derive(Clone, Debug)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}


impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, PollutionError> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}


#[async_trait]
impl PollutionSource for OpenWeatherClient {
    #[instrument(name = "pollution.get_current_pollution", skip(self))]
    async fn get_current_pollution(&self,
                                   latitude: f64,
                                   longitude: f64) -> Result<PollutionReading, PollutionError> {

        let url = format!("{}/data/2.5/air_pollution", self.base_url);

        let response = self.client
            .get(&url)
            .query(&[("lat", latitude.to_string()),
                     ("lon", longitude.to_string()),
                     ("appid", self.api_key.clone())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollutionError::Status(status.as_u16()));
        }

        let body: AirPollutionResponse = response.json().await?;
        let reading = body.into_reading()?;
        debug!("Debug: AQI recibido {} ({} componentes, dt={})",
               reading.aqi, reading.components.len(), reading.timestamp);
        Ok(reading)
    }
}
