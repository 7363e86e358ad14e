use std::future::{ready, Ready};

use actix_web::{
    dev::Payload, error::ErrorUnauthorized, Error, FromRequest, HttpMessage, HttpRequest,
};

use crate::middleware::auth::Claims;

/// The caller resolved from the bearer token.
#[derive(Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub subject: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AuthenticatedUser {
                user_id: claims.user_id.clone(),
                subject: claims.sub.clone(),
            })),
            None => ready(Err(ErrorUnauthorized("User not authenticated"))),
        }
    }
}
