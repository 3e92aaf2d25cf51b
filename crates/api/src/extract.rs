//! Request body extractors.

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body extractor whose rejections use the API error envelope.
///
/// Malformed or mistyped bodies become `400 VALIDATION_ERROR` instead of
/// axum's plain-text 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}

/// Parse an optional JSON body; an empty body yields `T::default()`.
pub fn optional_json<T>(bytes: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quoteflow_db::models::access_code::PublishRequest;

    #[test]
    fn empty_body_is_default() {
        let parsed: PublishRequest = optional_json(b"").unwrap();
        assert_eq!(parsed.expires_in_days, None);
        assert_eq!(parsed.send_email, None);
    }

    #[test]
    fn body_fields_are_parsed() {
        let parsed: PublishRequest =
            optional_json(br#"{"expires_in_days": 7, "send_email": false}"#).unwrap();
        assert_eq!(parsed.expires_in_days, Some(7));
        assert_eq!(parsed.send_email, Some(false));
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let result: Result<PublishRequest, _> = optional_json(b"{not json");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
