//! Consulta, alta y preferencias de usuarios.


use tracing::{info, instrument};
use crate::context::domain::AppContext;
use crate::database::domain::{NewUser, StoreError, User};
use crate::system::domain::ServiceError;
use crate::user::domain::{validate_new_user, validate_threshold, PreferencesPatch, UserDetailsDto};


pub async fn get_user(ctx: &AppContext, user_id: i64) -> Result<User, ServiceError> {
    ctx.users
        .find_user(user_id)
        .await?
        .ok_or(ServiceError::UserNotFound(user_id))
}


pub async fn get_user_details(ctx: &AppContext, user_id: i64) -> Result<UserDetailsDto, ServiceError> {
    get_user(ctx, user_id).await.map(UserDetailsDto::from)
}


#[instrument(name = "user.create", skip(ctx, new_user), fields(username = %new_user.username))]
pub async fn create_user(ctx: &AppContext, new_user: NewUser) -> Result<UserDetailsDto, ServiceError> {
    validate_new_user(&new_user)?;

    if ctx.users.username_exists(&new_user.username).await? {
        return Err(ServiceError::DuplicateUsername);
    }

    let user = ctx.users.insert_user(&new_user).await.map_err(|e| match e {
        StoreError::Duplicate => ServiceError::DuplicateUsername,
        other => ServiceError::Database(other),
    })?;

    info!("Info: usuario {} creado con id {}", user.username, user.id);
    Ok(user.into())
}


/// Actualiza las preferencias e invalida el umbral cacheado del usuario.
#[instrument(name = "user.update_preferences", skip(ctx, patch))]
pub async fn update_preferences(ctx: &AppContext,
                                user_id: i64,
                                patch: PreferencesPatch) -> Result<UserDetailsDto, ServiceError> {

    if let Some(threshold) = patch.aqi_threshold {
        validate_threshold(threshold)?;
    }

    let mut user = get_user(ctx, user_id).await?;
    patch.apply(&mut user);
    ctx.users.update_user(&user).await?;
    ctx.thresholds.invalidate(user_id);

    info!("Info: preferencias del usuario {user_id} actualizadas");
    Ok(user.into())
}
