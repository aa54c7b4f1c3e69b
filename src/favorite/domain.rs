//! Modelos de entrada/salida de la gestión de ciudades favoritas.


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::database::domain::FavoriteCity;
use crate::system::domain::ServiceError;


/// Ciudad candidata enviada por el cliente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFavoriteCity {
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
}


impl NewFavoriteCity {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.city_name.trim().is_empty() {
            return Err(ServiceError::Validation("El nombre de la ciudad es obligatorio".into()));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ServiceError::Validation(format!("Latitud fuera de rango: {}", self.latitude)));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ServiceError::Validation(format!("Longitud fuera de rango: {}", self.longitude)));
        }
        Ok(())
    }
}


/// Proyección de lectura de una ciudad favorita.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCityDto {
    pub id: i64,
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub current_aqi: Option<i32>,
    pub last_checked: DateTime<Utc>,
}


impl From<FavoriteCity> for FavoriteCityDto {
    fn from(city: FavoriteCity) -> Self {
        Self {
            id: city.id,
            city_name: city.city_name,
            latitude: city.latitude,
            longitude: city.longitude,
            current_aqi: city.current_aqi,
            last_checked: city.last_checked,
        }
    }
}
