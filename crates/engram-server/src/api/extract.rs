//! `OwnerId` extractor: every request is scoped by a tenant key carried in
//! the `X-Owner-Id` header, this project's choice of carrier for the
//! engine's ownerId boundary.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::ApiError;

pub struct OwnerId(pub String);

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner_id = parts
            .headers
            .get("x-owner-id")
            .ok_or_else(|| ApiError::bad_request("missing X-Owner-Id header"))?
            .to_str()
            .map_err(|_| ApiError::bad_request("X-Owner-Id header must be ASCII"))?
            .trim();

        if owner_id.is_empty() {
            return Err(ApiError::bad_request("X-Owner-Id header must not be empty"));
        }

        Ok(OwnerId(owner_id.to_string()))
    }
}
