//! Dominio de alertas de calidad de aire.
//!
//! Una alerta se despacha con `AlertSink::process_alert` y se procesa en segundo
//! plano: quien la emite no espera ni observa el resultado de la entrega.


use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use crate::config::postgres::BATCH_SIZE;
use crate::database::domain::{AlertRecord, FavoriteCity, User};


/// Alerta pendiente de procesar por la tarea de alertas.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub user: User,
    pub city: FavoriteCity,
    pub aqi: i32,
    pub created_at: DateTime<Utc>,
}


#[derive(Debug, Error)]
pub enum AlertError {
    #[error("cola de alertas llena")]
    QueueFull,

    #[error("cola de alertas cerrada")]
    QueueClosed,

    #[error("webhook de alertas no disponible: {0}")]
    Webhook(#[from] reqwest::Error),

    #[error("webhook de alertas respondió HTTP {0}")]
    Status(u16),
}


/// Contrato del colaborador de despacho de alertas.
pub trait AlertSink: Send + Sync {
    fn process_alert(&self, user: &User, city: &FavoriteCity, aqi: i32) -> Result<(), AlertError>;
}


/// Canales de notificación activos de un usuario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    App,
}


/// Cuerpo JSON enviado al webhook de notificaciones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertNotification {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub aqi: i32,
    pub threshold: i32,
    pub channels: Vec<NotificationChannel>,
    pub created_at: DateTime<Utc>,
}


impl AlertEvent {
    pub fn to_record(&self) -> AlertRecord {
        AlertRecord {
            user_id: self.user.id,
            city_id: self.city.id,
            city_name: self.city.city_name.clone(),
            aqi: self.aqi,
            threshold: self.user.aqi_threshold,
            created_at: self.created_at,
        }
    }

    /// Devuelve `None` si el usuario desactivó todas las notificaciones.
    pub fn to_notification(&self) -> Option<AlertNotification> {
        let mut channels = Vec::with_capacity(2);
        if self.user.email_notifications_enabled {
            channels.push(NotificationChannel::Email);
        }
        if self.user.app_notifications_enabled {
            channels.push(NotificationChannel::App);
        }
        if channels.is_empty() {
            return None;
        }

        Some(AlertNotification {
            user_id: self.user.id,
            username: self.user.username.clone(),
            email: self.user.email.clone(),
            city_name: self.city.city_name.clone(),
            latitude: self.city.latitude,
            longitude: self.city.longitude,
            aqi: self.aqi,
            threshold: self.user.aqi_threshold,
            channels,
            created_at: self.created_at,
        })
    }
}


/// Buffer de alertas pendientes de persistir.
///
/// Acumula registros en memoria para escribirlos en un único `INSERT` masivo.
#[derive(Debug)]
pub struct AlertBuffer {
    records: Vec<AlertRecord>,
}


impl AlertBuffer {

    /// Crea el buffer con capacidad `BATCH_SIZE` reservada.
    pub fn new() -> Self {
        Self {
            records: Vec::with_capacity(BATCH_SIZE),
        }
    }

    pub fn push(&mut self, record: AlertRecord) {
        self.records.push(record);
    }

    /// Disparador del volcado (flush) a la base de datos.
    pub fn is_full(&self) -> bool {
        self.records.len() >= BATCH_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Extrae los registros acumulados conservando la capacidad reservada.
    pub fn drain(&mut self) -> Vec<AlertRecord> {
        self.records.drain(..).collect()
    }
}
