//! Custom Axum extractors

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::Deserialize;

use super::error::ApiError;
use crate::models::{Quantity, ValidationError};

/// Body of `POST /fortunes`
#[derive(Debug, Default, Deserialize)]
pub struct FortunesRequest {
    pub quantity: Option<i64>,
}

/// Extract and validate the requested quantity from a JSON body.
///
/// An empty body or `{}` means the default quantity. Malformed JSON is a
/// validation error, so every bad request gets the same JSON 422 shape.
pub struct ValidQuantity(pub Quantity);

impl<S> FromRequest<S> for ValidQuantity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|e| {
            ApiError::Validation(ValidationError::Malformed {
                reason: e.body_text(),
            })
        })?;

        let request = if body.iter().all(u8::is_ascii_whitespace) {
            FortunesRequest::default()
        } else {
            serde_json::from_slice::<FortunesRequest>(&body).map_err(|e| {
                ApiError::Validation(ValidationError::Malformed {
                    reason: e.to_string(),
                })
            })?
        };

        Ok(Self(Quantity::from_optional(request.quantity)?))
    }
}
