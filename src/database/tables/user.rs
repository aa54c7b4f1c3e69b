use sqlx::{Executor, PgPool};
use crate::database::domain::{NewUser, User};


/// Inicializa la tabla `app_user` en la base de datos si no existe.
pub async fn create_table_user(pool: &PgPool) -> Result<(), sqlx::Error>  {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS app_user (
            id                            BIGSERIAL PRIMARY KEY,
            username                      TEXT NOT NULL UNIQUE,
            email                         TEXT NOT NULL,
            aqi_threshold                 INTEGER NOT NULL,
            email_notifications_enabled   BOOLEAN NOT NULL DEFAULT TRUE,
            app_notifications_enabled     BOOLEAN NOT NULL DEFAULT TRUE
        );
        "#
    )
        .await?;
    Ok(())
}


pub async fn select_user(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, aqi_threshold,
                email_notifications_enabled, app_notifications_enabled
         FROM app_user WHERE id = $1"
    )
        .bind(id)
        .fetch_optional(pool)
        .await
}


pub async fn exists_username(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM app_user WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await
}


pub async fn insert_user(pool: &PgPool, new_user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO app_user (
            username, email, aqi_threshold,
            email_notifications_enabled, app_notifications_enabled
        )
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, username, email, aqi_threshold,
                  email_notifications_enabled, app_notifications_enabled
        "#
    )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(new_user.aqi_threshold)
        .bind(new_user.email_notifications_enabled)
        .bind(new_user.app_notifications_enabled)
        .fetch_one(pool)
        .await
}


pub async fn update_user(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE app_user
        SET aqi_threshold = $2,
            email_notifications_enabled = $3,
            app_notifications_enabled = $4
        WHERE id = $1
        "#
    )
        .bind(user.id)
        .bind(user.aqi_threshold)
        .bind(user.email_notifications_enabled)
        .bind(user.app_notifications_enabled)
        .execute(pool)
        .await?;
    Ok(())
}
