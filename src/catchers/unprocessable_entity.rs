use crate::catchers::{json_error, JsonError};
use rocket::http::Status;
use rocket::Request;

/// Rocket answers 422 for bodies that are valid JSON of the wrong shape.
#[catch(422)]
pub fn unprocessable_entity_to_bad_request(_req: &Request) -> JsonError {
    json_error(Status::BadRequest, "Requisição inválida")
}
