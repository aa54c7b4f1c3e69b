use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::error;
use tokio::time::sleep;
use crate::config::postgres::WAIT_FOR;
use crate::database::domain::{AlertRecord, AlertStore, FavoriteCity, FavoriteCityDraft,
                              FavoriteCityStore, NewUser, StoreError, User, UserStore};
use crate::database::tables::alert::{create_table_alert, insert_alert};
use crate::database::tables::favorite_city::{create_table_favorite_city, delete_city, exists_city,
                                             insert_city, select_cities_by_user,
                                             select_cities_with_owner, select_city_by_id_and_user,
                                             update_city_aqi};
use crate::database::tables::user::{create_table_user, exists_username, insert_user, select_user,
                                    update_user};


/// Repositorio PostgreSQL que implementa todos los puertos de almacenamiento.
#[derive(Clone, Debug)]
pub struct Repository {
    pool: PgPool,
}

impl Repository {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = create_pool(database_url, max_connections).await?;
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Reintenta la conexión hasta que la base de datos esté disponible.
    pub async fn create_repository(database_url: &str, max_connections: u32) -> Self {
        loop {
            match Self::new(database_url, max_connections).await {
                Ok(repo) => return repo,
                Err(e) => {
                    error!("Error inicializando repo: {:?}", e);
                    sleep(WAIT_FOR).await;
                }
            }
        }
    }
}


async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(WAIT_FOR)
        .connect(database_url)
        .await?;

    Ok(pool)
}


async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    create_table_user(pool).await?;
    create_table_favorite_city(pool).await?;
    create_table_alert(pool).await?;
    Ok(())
}


#[async_trait]
impl UserStore for Repository {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(select_user(&self.pool, id).await?)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(exists_username(&self.pool, username).await?)
    }

    async fn insert_user(&self, new_user: &NewUser) -> Result<User, StoreError> {
        Ok(insert_user(&self.pool, new_user).await?)
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        Ok(update_user(&self.pool, user).await?)
    }
}


#[async_trait]
impl FavoriteCityStore for Repository {
    async fn exists_by_user_and_coordinate(&self,
                                           user_id: i64,
                                           latitude: f64,
                                           longitude: f64) -> Result<bool, StoreError> {
        Ok(exists_city(&self.pool, user_id, latitude, longitude).await?)
    }

    async fn insert_city(&self, draft: FavoriteCityDraft) -> Result<FavoriteCity, StoreError> {
        Ok(insert_city(&self.pool, draft).await?)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<FavoriteCity>, StoreError> {
        Ok(select_cities_by_user(&self.pool, user_id).await?)
    }

    async fn find_by_id_and_user(&self, city_id: i64, user_id: i64) -> Result<Option<FavoriteCity>, StoreError> {
        Ok(select_city_by_id_and_user(&self.pool, city_id, user_id).await?)
    }

    async fn delete_city(&self, city_id: i64) -> Result<bool, StoreError> {
        Ok(delete_city(&self.pool, city_id).await?)
    }

    async fn find_all_with_owner(&self) -> Result<Vec<(FavoriteCity, User)>, StoreError> {
        Ok(select_cities_with_owner(&self.pool).await?)
    }

    async fn update_aqi(&self,
                        city_id: i64,
                        aqi: i32,
                        checked_at: DateTime<Utc>) -> Result<(), StoreError> {
        Ok(update_city_aqi(&self.pool, city_id, aqi, checked_at).await?)
    }
}


#[async_trait]
impl AlertStore for Repository {
    async fn insert_alerts(&self, alerts: Vec<AlertRecord>) -> Result<(), StoreError> {
        Ok(insert_alert(&self.pool, alerts).await?)
    }
}
