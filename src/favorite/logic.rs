//! Gestión de ciudades favoritas: alta, listado y baja.
//!
//! El alta consulta el AQI una vez de forma síncrona, pero sólo como mejor
//! esfuerzo: si la API de contaminación falla, la ciudad se guarda sin AQI.


use chrono::Utc;
use tracing::{error, info, instrument, warn};
use crate::context::domain::AppContext;
use crate::database::domain::{FavoriteCityDraft, StoreError};
use crate::favorite::domain::{FavoriteCityDto, NewFavoriteCity};
use crate::system::domain::ServiceError;


/// Agrega una ciudad favorita al usuario.
///
/// # Errores
/// * `UserNotFound` si el usuario no existe.
/// * `DuplicateCity` si el usuario ya tiene esa coordenada.
/// * `Validation` si el nombre o las coordenadas no son válidos.
///
/// El usuario y el duplicado se comprueban antes que el formato del candidato.
#[instrument(name = "favorite.add", skip(ctx, candidate), fields(city = %candidate.city_name))]
pub async fn add_favorite_city(ctx: &AppContext,
                               user_id: i64,
                               candidate: NewFavoriteCity) -> Result<FavoriteCityDto, ServiceError> {

    let user = ctx.users
        .find_user(user_id)
        .await?
        .ok_or(ServiceError::UserNotFound(user_id))?;

    if ctx.cities
        .exists_by_user_and_coordinate(user_id, candidate.latitude, candidate.longitude)
        .await?
    {
        return Err(ServiceError::DuplicateCity);
    }

    candidate.validate()?;

    let current_aqi = match ctx.pollution
        .get_current_pollution(candidate.latitude, candidate.longitude)
        .await
    {
        Ok(reading) => Some(reading.aqi),
        Err(e) => {
            error!("Error: no se pudo obtener el AQI inicial de {}: {e}", candidate.city_name);
            None
        }
    };

    let draft = FavoriteCityDraft {
        user_id,
        city_name: candidate.city_name,
        latitude: candidate.latitude,
        longitude: candidate.longitude,
        current_aqi,
        last_checked: Utc::now(),
    };

    let city = ctx.cities.insert_city(draft).await.map_err(|e| match e {
        StoreError::Duplicate => ServiceError::DuplicateCity,
        other => ServiceError::Database(other),
    })?;

    if let Some(aqi) = current_aqi {
        if aqi >= user.aqi_threshold {
            info!("Info: AQI {aqi} supera el umbral {} en {}", user.aqi_threshold, city.city_name);
            if let Err(e) = ctx.alerts.process_alert(&user, &city, aqi) {
                warn!("Warning: no se pudo despachar la alerta de {}: {e}", city.city_name);
            }
        }
    }

    info!("Info: ciudad {} agregada a favoritos del usuario {user_id}", city.city_name);
    Ok(city.into())
}


/// Lista las ciudades favoritas del usuario. Sin efectos secundarios.
pub async fn get_favorite_cities(ctx: &AppContext,
                                 user_id: i64) -> Result<Vec<FavoriteCityDto>, ServiceError> {
    let cities = ctx.cities.find_by_user(user_id).await?;
    Ok(cities.into_iter().map(FavoriteCityDto::from).collect())
}


/// Elimina una ciudad favorita del usuario e invalida su umbral cacheado.
///
/// Una ciudad que existe pero pertenece a otro usuario se trata como inexistente.
#[instrument(name = "favorite.remove", skip(ctx))]
pub async fn remove_favorite_city(ctx: &AppContext,
                                  user_id: i64,
                                  city_id: i64) -> Result<(), ServiceError> {

    let city = ctx.cities
        .find_by_id_and_user(city_id, user_id)
        .await?
        .ok_or(ServiceError::CityNotFound(city_id))?;

    if !ctx.cities.delete_city(city.id).await? {
        return Err(ServiceError::CityNotFound(city_id));
    }

    ctx.thresholds.invalidate(user_id);
    info!("Info: ciudad {} eliminada de favoritos del usuario {user_id}", city.city_name);
    Ok(())
}
