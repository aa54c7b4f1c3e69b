//! Dobles de prueba compartidos por los tests de los servicios.


use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::alert::domain::{AlertError, AlertSink};
use crate::context::domain::AppContext;
use crate::database::domain::{AlertRecord, AlertStore, FavoriteCity, FavoriteCityDraft,
                              FavoriteCityStore, NewUser, StoreError, User, UserStore};
use crate::pollution::domain::{PollutionError, PollutionReading, PollutionSource};
use crate::system::domain::System;
use crate::threshold::domain::ThresholdCache;


pub fn sample_user(id: i64, aqi_threshold: i32) -> User {
    User {
        id,
        username: format!("user{id}"),
        email: format!("user{id}@example.com"),
        aqi_threshold,
        email_notifications_enabled: true,
        app_notifications_enabled: true,
    }
}


pub fn sample_city(id: i64, user_id: i64, name: &str) -> FavoriteCity {
    FavoriteCity {
        id,
        user_id,
        city_name: name.to_string(),
        latitude: 45.76,
        longitude: 4.83,
        current_aqi: None,
        last_checked: Utc::now(),
    }
}


pub fn test_system() -> System {
    System {
        database_url: "postgres://localhost/aqi_test".to_string(),
        db_pool_size: 1,
        http_host: "127.0.0.1".to_string(),
        http_port: 0,
        allowed_origin: "http://localhost:3000".to_string(),
        pollution_api_url: "http://localhost".to_string(),
        pollution_api_key: "test".to_string(),
        alert_webhook_url: None,
        sweep_interval_secs: 3600,
        sweep_initial_delay_secs: 0,
        environment: "test".to_string(),
        rust_log: "debug".to_string(),
    }
}


pub fn test_context(store: Arc<MemoryStore>,
                    pollution: Arc<ScriptedPollution>,
                    alerts: Arc<RecordingAlertSink>) -> AppContext {
    AppContext {
        users: store.clone(),
        cities: store.clone(),
        alert_store: store.clone(),
        thresholds: Arc::new(ThresholdCache::new(store)),
        pollution,
        alerts,
        system: Arc::new(test_system()),
    }
}


#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    cities: Vec<FavoriteCity>,
    alerts: Vec<AlertRecord>,
    failing_updates: HashSet<i64>,
    skip_existence_check: bool,
    next_id: i64,
}


/// Almacén en memoria que implementa los tres puertos de persistencia.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    user_loads: AtomicUsize,
}


impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(state: &mut MemoryState) -> i64 {
        state.next_id += 1;
        state.next_id
    }

    pub fn add_user(&self, username: &str, aqi_threshold: i32) -> User {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state);
        let user = User {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            ..sample_user(id, aqi_threshold)
        };
        state.users.push(user.clone());
        user
    }

    pub fn add_city(&self, user_id: i64, name: &str, latitude: f64, longitude: f64) -> FavoriteCity {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state);
        let city = FavoriteCity {
            latitude,
            longitude,
            ..sample_city(id, user_id, name)
        };
        state.cities.push(city.clone());
        city
    }

    pub fn set_threshold(&self, user_id: i64, aqi_threshold: i32) {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.aqi_threshold = aqi_threshold;
        }
    }

    pub fn fail_updates_for(&self, city_id: i64) {
        self.state.lock().unwrap().failing_updates.insert(city_id);
    }

    /// `exists_by_user_and_coordinate` siempre responde `false`; el alta
    /// queda protegida sólo por la restricción única de `insert_city`.
    pub fn skip_existence_check(&self) {
        self.state.lock().unwrap().skip_existence_check = true;
    }

    pub fn city(&self, city_id: i64) -> Option<FavoriteCity> {
        self.state.lock().unwrap().cities.iter().find(|c| c.id == city_id).cloned()
    }

    pub fn city_count(&self) -> usize {
        self.state.lock().unwrap().cities.len()
    }

    pub fn alert_records(&self) -> Vec<AlertRecord> {
        self.state.lock().unwrap().alerts.clone()
    }

    /// Número de lecturas de usuario realizadas contra el almacén.
    pub fn user_loads(&self) -> usize {
        self.user_loads.load(Ordering::SeqCst)
    }
}


#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.user_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().users.iter().find(|u| u.id == id).cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.state.lock().unwrap().users.iter().any(|u| u.username == username))
    }

    async fn insert_user(&self, new_user: &NewUser) -> Result<User, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.username == new_user.username) {
            return Err(StoreError::Duplicate);
        }
        let user = User {
            id: Self::next_id(&mut state),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            aqi_threshold: new_user.aqi_threshold,
            email_notifications_enabled: new_user.email_notifications_enabled,
            app_notifications_enabled: new_user.app_notifications_enabled,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(stored) = state.users.iter_mut().find(|u| u.id == user.id) {
            *stored = user.clone();
        }
        Ok(())
    }
}


#[async_trait]
impl FavoriteCityStore for MemoryStore {
    async fn exists_by_user_and_coordinate(&self,
                                           user_id: i64,
                                           latitude: f64,
                                           longitude: f64) -> Result<bool, StoreError> {
        let state = self.state.lock().unwrap();
        if state.skip_existence_check {
            return Ok(false);
        }
        Ok(state.cities.iter().any(|c| {
            c.user_id == user_id && c.latitude == latitude && c.longitude == longitude
        }))
    }

    async fn insert_city(&self, draft: FavoriteCityDraft) -> Result<FavoriteCity, StoreError> {
        let mut state = self.state.lock().unwrap();
        let duplicate = state.cities.iter().any(|c| {
            c.user_id == draft.user_id && c.latitude == draft.latitude && c.longitude == draft.longitude
        });
        if duplicate {
            return Err(StoreError::Duplicate);
        }
        let city = FavoriteCity {
            id: Self::next_id(&mut state),
            user_id: draft.user_id,
            city_name: draft.city_name,
            latitude: draft.latitude,
            longitude: draft.longitude,
            current_aqi: draft.current_aqi,
            last_checked: draft.last_checked,
        };
        state.cities.push(city.clone());
        Ok(city)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<FavoriteCity>, StoreError> {
        Ok(self.state.lock().unwrap().cities.iter().filter(|c| c.user_id == user_id).cloned().collect())
    }

    async fn find_by_id_and_user(&self, city_id: i64, user_id: i64) -> Result<Option<FavoriteCity>, StoreError> {
        Ok(self.state.lock().unwrap().cities.iter()
            .find(|c| c.id == city_id && c.user_id == user_id)
            .cloned())
    }

    async fn delete_city(&self, city_id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        let before = state.cities.len();
        state.cities.retain(|c| c.id != city_id);
        Ok(state.cities.len() < before)
    }

    async fn find_all_with_owner(&self) -> Result<Vec<(FavoriteCity, User)>, StoreError> {
        let state = self.state.lock().unwrap();
        let users: HashMap<i64, User> = state.users.iter().map(|u| (u.id, u.clone())).collect();
        Ok(state.cities.iter()
            .filter_map(|c| users.get(&c.user_id).map(|u| (c.clone(), u.clone())))
            .collect())
    }

    async fn update_aqi(&self,
                        city_id: i64,
                        aqi: i32,
                        checked_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_updates.contains(&city_id) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        if let Some(city) = state.cities.iter_mut().find(|c| c.id == city_id) {
            city.current_aqi = Some(aqi);
            city.last_checked = checked_at;
        }
        Ok(())
    }
}


#[async_trait]
impl AlertStore for MemoryStore {
    async fn insert_alerts(&self, alerts: Vec<AlertRecord>) -> Result<(), StoreError> {
        self.state.lock().unwrap().alerts.extend(alerts);
        Ok(())
    }
}


/// Proveedor de contaminación con respuestas programadas por coordenada.
#[derive(Default)]
pub struct ScriptedPollution {
    readings: Mutex<HashMap<String, Result<i32, u16>>>,
    calls: AtomicUsize,
}


impl ScriptedPollution {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(latitude: f64, longitude: f64) -> String {
        format!("{latitude},{longitude}")
    }

    pub fn set_aqi(&self, latitude: f64, longitude: f64, aqi: i32) {
        self.readings.lock().unwrap().insert(Self::key(latitude, longitude), Ok(aqi));
    }

    pub fn fail(&self, latitude: f64, longitude: f64) {
        self.readings.lock().unwrap().insert(Self::key(latitude, longitude), Err(503));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}


#[async_trait]
impl PollutionSource for ScriptedPollution {
    async fn get_current_pollution(&self,
                                   latitude: f64,
                                   longitude: f64) -> Result<PollutionReading, PollutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.readings.lock().unwrap().get(&Self::key(latitude, longitude)).cloned();
        match scripted {
            Some(Ok(aqi)) => Ok(PollutionReading {
                aqi,
                components: HashMap::new(),
                timestamp: Utc::now().timestamp(),
            }),
            Some(Err(status)) => Err(PollutionError::Status(status)),
            None => Err(PollutionError::EmptyResponse),
        }
    }
}


/// Sumidero de alertas que sólo registra `(user_id, city_id, aqi)`.
#[derive(Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<(i64, i64, i32)>>,
}


impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<(i64, i64, i32)> {
        self.alerts.lock().unwrap().clone()
    }
}


impl AlertSink for RecordingAlertSink {
    fn process_alert(&self, user: &User, city: &FavoriteCity, aqi: i32) -> Result<(), AlertError> {
        self.alerts.lock().unwrap().push((user.id, city.id, aqi));
        Ok(())
    }
}
