//! Definición del Contexto de Aplicación (Shared State).
//!
//! Este módulo implementa el patrón de **Estado Compartido** para aplicaciones asíncronas.
//! El `AppContext` actúa como un contenedor de "Inyección de Dependencias" manual,
//! agrupando los recursos que deben ser accesibles por múltiples tareas concurrentes
//! (Base de datos, Configuración, Caché de umbrales, colaboradores externos).


use std::sync::Arc;
use tokio::sync::mpsc;
use crate::alert::domain::{AlertEvent, AlertSink};
use crate::alert::logic::ChannelAlertSink;
use crate::database::domain::{AlertStore, FavoriteCityStore, UserStore};
use crate::database::repository::Repository;
use crate::pollution::domain::{PollutionError, PollutionSource};
use crate::pollution::logic::OpenWeatherClient;
use crate::system::domain::System;
use crate::threshold::domain::ThresholdCache;


#[derive(Clone)]
pub struct AppContext {
    pub users: Arc<dyn UserStore>,
    pub cities: Arc<dyn FavoriteCityStore>,
    pub alert_store: Arc<dyn AlertStore>,
    pub thresholds: Arc<ThresholdCache>,
    pub pollution: Arc<dyn PollutionSource>,
    pub alerts: Arc<dyn AlertSink>,
    pub system: Arc<System>,
}


impl AppContext {
    /// Conecta la base de datos (reintentando hasta lograrlo) y crea los colaboradores.
    ///
    /// # Argumentos
    /// * `system`: Configuración cargada del entorno.
    /// * `alert_tx`: Canal hacia la tarea de alertas.
    pub async fn new(system: System,
                     alert_tx: mpsc::Sender<AlertEvent>) -> Result<Self, PollutionError> {

        let repo = Arc::new(
            Repository::create_repository(&system.database_url, system.db_pool_size).await
        );
        let pollution = OpenWeatherClient::new(&system.pollution_api_url, &system.pollution_api_key)?;

        Ok(Self {
            users: repo.clone(),
            cities: repo.clone(),
            alert_store: repo.clone(),
            thresholds: Arc::new(ThresholdCache::new(repo)),
            pollution: Arc::new(pollution),
            alerts: Arc::new(ChannelAlertSink::new(alert_tx)),
            system: Arc::new(system),
        })
    }
}
