pub mod alert;
pub mod favorite_city;
pub mod user;
