//! Dominio del colaborador de contaminación.
//!
//! Define el contrato para obtener el AQI actual de una coordenada y los modelos
//! de respuesta de la API Air Pollution de OpenWeatherMap.


use std::collections::HashMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Lectura de contaminación para una coordenada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutionReading {
    /// Índice de calidad del aire (escala OpenWeatherMap 1..5).
    pub aqi: i32,
    /// Concentraciones en μg/m3 (`co`, `no2`, `o3`, `pm2_5`, ...).
    pub components: HashMap<String, f64>,
    /// Marca de tiempo UNIX de la medición.
    pub timestamp: i64,
}


#[derive(Debug, Error)]
pub enum PollutionError {
    #[error("petición a la API de contaminación fallida: {0}")]
    Request(#[from] reqwest::Error),

    #[error("la API de contaminación respondió HTTP {0}")]
    Status(u16),

    #[error("la API de contaminación no devolvió mediciones")]
    EmptyResponse,
}


/// Contrato del proveedor de datos de contaminación.
#[async_trait]
pub trait PollutionSource: Send + Sync {
    async fn get_current_pollution(&self,
                                   latitude: f64,
                                   longitude: f64) -> Result<PollutionReading, PollutionError>;
}


/// Respuesta de `GET /data/2.5/air_pollution`.
#[derive(Debug, Deserialize)]
pub struct AirPollutionResponse {
    #[serde(default)]
    pub list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AirPollutionEntry {
    pub main: AirPollutionMain,
    #[serde(default)]
    pub components: HashMap<String, f64>,
    #[serde(default)]
    pub dt: i64,
}

#[derive(Debug, Deserialize)]
pub struct AirPollutionMain {
    pub aqi: i32,
}


impl AirPollutionResponse {
    /// La primera medición de la lista es la lectura actual.
    pub fn into_reading(self) -> Result<PollutionReading, PollutionError> {
        let entry = self.list
            .into_iter()
            .next()
            .ok_or(PollutionError::EmptyResponse)?;

        Ok(PollutionReading {
            aqi: entry.main.aqi,
            components: entry.components,
            timestamp: entry.dt,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_entry_is_the_reading() {
        let body = r#"{
            "coord": {"lon": 2.35, "lat": 48.85},
            "list": [
                {"main": {"aqi": 4}, "components": {"pm2_5": 31.2}, "dt": 1700000000},
                {"main": {"aqi": 1}, "components": {}, "dt": 1700003600}
            ]
        }"#;
        let response: AirPollutionResponse = serde_json::from_str(body).unwrap();
        let reading = response.into_reading().unwrap();

        assert_eq!(reading.aqi, 4);
        assert_eq!(reading.timestamp, 1700000000);
        assert_eq!(reading.components.get("pm2_5"), Some(&31.2));
    }

    #[test]
    fn empty_list_is_an_error() {
        let response: AirPollutionResponse = serde_json::from_str(r#"{"list": []}"#).unwrap();
        assert!(matches!(response.into_reading(), Err(PollutionError::EmptyResponse)));
    }
}
