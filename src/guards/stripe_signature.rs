use crate::guards::{into_outcome, OrStatus};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;

/// Raw `Stripe-Signature` header; verification happens against the body later.
pub struct StripeSignature(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for StripeSignature {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let header = request
            .headers()
            .get_one("Stripe-Signature")
            .map(|value| StripeSignature(value.to_string()))
            .or_status(Status::BadRequest, "The 'Stripe-Signature' header was missing.");
        into_outcome(request, header)
    }
}
