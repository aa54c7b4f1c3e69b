use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use crate::system::domain::ServiceError;


impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::UserNotFound(_)
            | ServiceError::CityNotFound(_)
            | ServiceError::DuplicateCity
            | ServiceError::DuplicateUsername
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Upstream(_)
            | ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}


/// Un cuerpo JSON mal formado o incompleto es un error de validación (400).
impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}


impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}


impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            // El detalle interno sólo va al log
            ServiceError::Database(ref e) => {
                error!("Error: base de datos: {e}");
                self.to_string()
            }
            ServiceError::Upstream(ref e) => {
                error!("Error: servicio externo: {e}");
                "Servicio externo no disponible".to_string()
            }
            ref other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
