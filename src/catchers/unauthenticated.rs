use crate::catchers::{json_error, JsonError};
use rocket::http::Status;

#[catch(401)]
pub fn unauthorized() -> JsonError {
    json_error(Status::Unauthorized, "Não autenticado")
}
