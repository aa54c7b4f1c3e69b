use serde::{Deserialize, Serialize};
use crate::database::domain::{NewUser, User};
use crate::system::domain::ServiceError;


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesDto {
    pub aqi_threshold: i32,
    pub email_notifications_enabled: bool,
    pub app_notifications_enabled: bool,
}


/// Detalle público de un usuario y sus preferencias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailsDto {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub preferences: PreferencesDto,
}


impl From<User> for UserDetailsDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            preferences: PreferencesDto {
                aqi_threshold: user.aqi_threshold,
                email_notifications_enabled: user.email_notifications_enabled,
                app_notifications_enabled: user.app_notifications_enabled,
            },
        }
    }
}


/// Cambios parciales de preferencias; los campos ausentes no se modifican.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    pub aqi_threshold: Option<i32>,
    pub email_notifications_enabled: Option<bool>,
    pub app_notifications_enabled: Option<bool>,
}


impl PreferencesPatch {
    pub fn apply(self, user: &mut User) {
        if let Some(threshold) = self.aqi_threshold {
            user.aqi_threshold = threshold;
        }
        if let Some(enabled) = self.email_notifications_enabled {
            user.email_notifications_enabled = enabled;
        }
        if let Some(enabled) = self.app_notifications_enabled {
            user.app_notifications_enabled = enabled;
        }
    }
}


pub fn validate_threshold(threshold: i32) -> Result<(), ServiceError> {
    if threshold < 1 {
        return Err(ServiceError::Validation(format!("El umbral de AQI debe ser positivo: {threshold}")));
    }
    Ok(())
}


pub fn validate_new_user(new_user: &NewUser) -> Result<(), ServiceError> {
    if new_user.username.trim().is_empty() {
        return Err(ServiceError::Validation("El nombre de usuario es obligatorio".into()));
    }
    if !new_user.email.contains('@') {
        return Err(ServiceError::Validation(format!("Email inválido: {}", new_user.email)));
    }
    validate_threshold(new_user.aqi_threshold)
}
