mod unauthenticated;
mod unprocessable_entity;

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
pub use unauthenticated::*;
pub use unprocessable_entity::*;

/// Body of every error response: `{ "error": "<message>" }`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type JsonError = status::Custom<Json<ErrorBody>>;

pub fn json_error(status: Status, message: impl Into<String>) -> JsonError {
    status::Custom(
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

#[catch(400)]
pub fn bad_request() -> JsonError {
    json_error(Status::BadRequest, "Requisição inválida")
}

#[catch(403)]
pub fn forbidden() -> JsonError {
    json_error(Status::Forbidden, "Assinatura inativa")
}

#[catch(404)]
pub fn not_found() -> JsonError {
    json_error(Status::NotFound, "Não encontrado")
}

#[catch(500)]
pub fn internal_error() -> JsonError {
    json_error(Status::InternalServerError, "Erro interno do servidor")
}
