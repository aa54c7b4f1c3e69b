//! Caché de umbrales de AQI por usuario.
//!
//! Memoiza `aqi_threshold` de cada usuario. Sin TTL ni límite de tamaño: la
//! entrada vive hasta que alguien llama a `invalidate` (borrado de una ciudad
//! favorita o cambio de preferencias).


use std::sync::Arc;
use dashmap::DashMap;
use tracing::debug;
use crate::database::domain::UserStore;
use crate::system::domain::ServiceError;


pub struct ThresholdCache {
    entries: DashMap<i64, i32>,
    users: Arc<dyn UserStore>,
}


impl ThresholdCache {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            entries: DashMap::new(),
            users,
        }
    }

    /// Devuelve el umbral del usuario, cargándolo de la base de datos la primera vez.
    ///
    /// # Errores
    /// * `ServiceError::UserNotFound` si el usuario no existe (no se cachea nada).
    pub async fn get_user_aqi_threshold(&self, user_id: i64) -> Result<i32, ServiceError> {
        if let Some(threshold) = self.entries.get(&user_id) {
            return Ok(*threshold);
        }

        debug!("Debug: umbral del usuario {user_id} no cacheado, consultando base de datos");
        let user = self.users
            .find_user(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        self.entries.insert(user_id, user.aqi_threshold);
        Ok(user.aqi_threshold)
    }

    pub fn invalidate(&self, user_id: i64) {
        if self.entries.remove(&user_id).is_some() {
            debug!("Debug: umbral del usuario {user_id} invalidado");
        }
    }
}
