//! Estructuras de dominio para la persistencia de datos.
//!
//! Este módulo define las entidades que se guardan en PostgreSQL (`User`,
//! `FavoriteCity`, `AlertRecord`) y los puertos de almacenamiento que consumen
//! los servicios. Los servicios dependen de los traits, no del pool, lo que
//! permite ejecutarlos sobre un almacén en memoria en los tests.


use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;


/// Usuario registrado con sus preferencias de notificación.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// AQI a partir del cual se dispara una alerta (inclusive).
    pub aqi_threshold: i32,
    pub email_notifications_enabled: bool,
    pub app_notifications_enabled: bool,
}


/// Datos de alta de un usuario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub aqi_threshold: i32,
    #[serde(default = "enabled")]
    pub email_notifications_enabled: bool,
    #[serde(default = "enabled")]
    pub app_notifications_enabled: bool,
}

fn enabled() -> bool {
    true
}


/// Ciudad favorita de un usuario.
///
/// `(user_id, latitude, longitude)` es único.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct FavoriteCity {
    pub id: i64,
    pub user_id: i64,
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Último AQI observado. `None` si nunca se pudo consultar.
    pub current_aqi: Option<i32>,
    pub last_checked: DateTime<Utc>,
}


/// Ciudad favorita aún no persistida (sin `id`).
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteCityDraft {
    pub user_id: i64,
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub current_aqi: Option<i32>,
    pub last_checked: DateTime<Utc>,
}


/// Registro histórico de una alerta despachada.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRecord {
    pub user_id: i64,
    pub city_id: i64,
    pub city_name: String,
    pub aqi: i32,
    pub threshold: i32,
    pub created_at: DateTime<Utc>,
}


#[derive(Debug, Error)]
pub enum StoreError {
    /// Violación de una restricción `UNIQUE`.
    #[error("registro duplicado")]
    Duplicate,

    #[error("error de base de datos: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::Duplicate;
            }
        }
        StoreError::Database(e)
    }
}


#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;
    async fn insert_user(&self, new_user: &NewUser) -> Result<User, StoreError>;
    /// Actualiza umbral y preferencias de notificación.
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;
}


#[async_trait]
pub trait FavoriteCityStore: Send + Sync {
    async fn exists_by_user_and_coordinate(&self,
                                           user_id: i64,
                                           latitude: f64,
                                           longitude: f64) -> Result<bool, StoreError>;
    async fn insert_city(&self, draft: FavoriteCityDraft) -> Result<FavoriteCity, StoreError>;
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<FavoriteCity>, StoreError>;
    async fn find_by_id_and_user(&self, city_id: i64, user_id: i64) -> Result<Option<FavoriteCity>, StoreError>;
    /// Devuelve `true` si se borró alguna fila.
    async fn delete_city(&self, city_id: i64) -> Result<bool, StoreError>;
    /// Todas las ciudades junto con su propietario, para el barrido periódico.
    async fn find_all_with_owner(&self) -> Result<Vec<(FavoriteCity, User)>, StoreError>;
    async fn update_aqi(&self,
                        city_id: i64,
                        aqi: i32,
                        checked_at: DateTime<Utc>) -> Result<(), StoreError>;
}


#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert_alerts(&self, alerts: Vec<AlertRecord>) -> Result<(), StoreError>;
}
