use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use crate::context::domain::AppContext;
use crate::database::domain::NewUser;
use crate::favorite::domain::{FavoriteCityDto, NewFavoriteCity};
use crate::favorite::logic::{add_favorite_city, get_favorite_cities, remove_favorite_city};
use crate::system::domain::ServiceError;
use crate::user::domain::{PreferencesPatch, UserDetailsDto};
use crate::user::logic::{create_user, get_user_details, update_preferences};


#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: i64,
}


pub async fn add_favorite_handler(State(ctx): State<AppContext>,
                                  query: Result<Query<UserQuery>, QueryRejection>,
                                  payload: Result<Json<NewFavoriteCity>, JsonRejection>) -> Result<Json<FavoriteCityDto>, ServiceError> {
    let Query(query) = query?;
    let Json(city) = payload?;
    add_favorite_city(&ctx, query.user_id, city).await.map(Json)
}


pub async fn list_favorites_handler(State(ctx): State<AppContext>,
                                    query: Result<Query<UserQuery>, QueryRejection>) -> Result<Json<Vec<FavoriteCityDto>>, ServiceError> {
    let Query(query) = query?;
    get_favorite_cities(&ctx, query.user_id).await.map(Json)
}


pub async fn remove_favorite_handler(State(ctx): State<AppContext>,
                                     Path(city_id): Path<i64>,
                                     query: Result<Query<UserQuery>, QueryRejection>) -> Result<Json<Value>, ServiceError> {
    let Query(query) = query?;
    remove_favorite_city(&ctx, query.user_id, city_id).await?;
    Ok(Json(json!({ "message": "Ciudad eliminada de favoritos" })))
}


pub async fn create_user_handler(State(ctx): State<AppContext>,
                                 payload: Result<Json<NewUser>, JsonRejection>) -> Result<Json<UserDetailsDto>, ServiceError> {
    let Json(new_user) = payload?;
    create_user(&ctx, new_user).await.map(Json)
}


pub async fn get_user_handler(State(ctx): State<AppContext>,
                              Path(user_id): Path<i64>) -> Result<Json<UserDetailsDto>, ServiceError> {
    get_user_details(&ctx, user_id).await.map(Json)
}


pub async fn update_preferences_handler(State(ctx): State<AppContext>,
                                        Path(user_id): Path<i64>,
                                        payload: Result<Json<PreferencesPatch>, JsonRejection>) -> Result<Json<UserDetailsDto>, ServiceError> {
    let Json(patch) = payload?;
    update_preferences(&ctx, user_id, patch).await.map(Json)
}
