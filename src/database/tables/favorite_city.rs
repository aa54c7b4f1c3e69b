//! Persistencia de las ciudades favoritas.
//!
//! La unicidad `(user_id, latitude, longitude)` se garantiza también a nivel de
//! tabla; una inserción concurrente duplicada termina en violación de `UNIQUE`.


use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, PgPool};
use crate::database::domain::{FavoriteCity, FavoriteCityDraft, User};


pub async fn create_table_favorite_city(pool: &PgPool) -> Result<(), sqlx::Error>  {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS favorite_city (
            id              BIGSERIAL PRIMARY KEY,
            user_id         BIGINT NOT NULL REFERENCES app_user(id) ON DELETE CASCADE,
            city_name       TEXT NOT NULL,
            latitude        DOUBLE PRECISION NOT NULL,
            longitude       DOUBLE PRECISION NOT NULL,
            current_aqi     INTEGER,
            last_checked    TIMESTAMPTZ NOT NULL,
            UNIQUE (user_id, latitude, longitude)
        );
        "#
    )
        .await?;
    Ok(())
}


const CITY_COLUMNS: &str = "id, user_id, city_name, latitude, longitude, current_aqi, last_checked";


pub async fn exists_city(pool: &PgPool,
                         user_id: i64,
                         latitude: f64,
                         longitude: f64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM favorite_city
            WHERE user_id = $1 AND latitude = $2 AND longitude = $3
        )"
    )
        .bind(user_id)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(pool)
        .await
}


pub async fn insert_city(pool: &PgPool, draft: FavoriteCityDraft) -> Result<FavoriteCity, sqlx::Error> {
    let sql = format!(
        "INSERT INTO favorite_city (
            user_id, city_name, latitude, longitude, current_aqi, last_checked
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {CITY_COLUMNS}"
    );

    sqlx::query_as::<_, FavoriteCity>(&sql)
        .bind(draft.user_id)
        .bind(draft.city_name)
        .bind(draft.latitude)
        .bind(draft.longitude)
        .bind(draft.current_aqi)
        .bind(draft.last_checked)
        .fetch_one(pool)
        .await
}


pub async fn select_cities_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<FavoriteCity>, sqlx::Error> {
    let sql = format!("SELECT {CITY_COLUMNS} FROM favorite_city WHERE user_id = $1 ORDER BY id");

    sqlx::query_as::<_, FavoriteCity>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
}


pub async fn select_city_by_id_and_user(pool: &PgPool,
                                        city_id: i64,
                                        user_id: i64) -> Result<Option<FavoriteCity>, sqlx::Error> {
    let sql = format!("SELECT {CITY_COLUMNS} FROM favorite_city WHERE id = $1 AND user_id = $2");

    sqlx::query_as::<_, FavoriteCity>(&sql)
        .bind(city_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}


pub async fn delete_city(pool: &PgPool, city_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM favorite_city WHERE id = $1")
        .bind(city_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}


pub async fn update_city_aqi(pool: &PgPool,
                             city_id: i64,
                             aqi: i32,
                             checked_at: DateTime<Utc>) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE favorite_city SET current_aqi = $2, last_checked = $3 WHERE id = $1")
        .bind(city_id)
        .bind(aqi)
        .bind(checked_at)
        .execute(pool)
        .await?;
    Ok(())
}


/// Fila del JOIN ciudad + propietario.
#[derive(FromRow)]
struct CityOwnerRow {
    id: i64,
    user_id: i64,
    city_name: String,
    latitude: f64,
    longitude: f64,
    current_aqi: Option<i32>,
    last_checked: DateTime<Utc>,
    username: String,
    email: String,
    aqi_threshold: i32,
    email_notifications_enabled: bool,
    app_notifications_enabled: bool,
}

impl CityOwnerRow {
    fn into_parts(self) -> (FavoriteCity, User) {
        let user = User {
            id: self.user_id,
            username: self.username,
            email: self.email,
            aqi_threshold: self.aqi_threshold,
            email_notifications_enabled: self.email_notifications_enabled,
            app_notifications_enabled: self.app_notifications_enabled,
        };
        let city = FavoriteCity {
            id: self.id,
            user_id: self.user_id,
            city_name: self.city_name,
            latitude: self.latitude,
            longitude: self.longitude,
            current_aqi: self.current_aqi,
            last_checked: self.last_checked,
        };
        (city, user)
    }
}


pub async fn select_cities_with_owner(pool: &PgPool) -> Result<Vec<(FavoriteCity, User)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CityOwnerRow>(
        r#"
        SELECT c.id, c.user_id, c.city_name, c.latitude, c.longitude,
               c.current_aqi, c.last_checked,
               u.username, u.email, u.aqi_threshold,
               u.email_notifications_enabled, u.app_notifications_enabled
        FROM favorite_city c
        JOIN app_user u ON u.id = c.user_id
        ORDER BY c.id
        "#
    )
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(CityOwnerRow::into_parts).collect())
}
