use super::error::ApiErrorCode;
use crate::application_port::{AccessToken, TokenCodec};
use crate::domain_model::UserId;
use std::sync::Arc;
use warp::{Filter, http, reject};

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
/// The scheme is matched case-insensitively.
pub fn bearer_token(header: Option<&str>) -> Result<&str, ApiErrorCode> {
    let header = header.ok_or(ApiErrorCode::MissingToken)?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(ApiErrorCode::InvalidToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiErrorCode::InvalidToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiErrorCode::InvalidToken);
    }
    Ok(token)
}

/// Rejects before the handler runs unless the request carries a valid access token.
pub fn with_bearer(
    token_codec: Arc<dyn TokenCodec>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_str()).and_then(
        move |header: Option<String>| {
            let token_codec = token_codec.clone();
            async move {
                let token = bearer_token(header.as_deref()).map_err(reject::custom)?;
                let user_id = token_codec
                    .verify_access_token(&AccessToken(token.to_string()))
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                Ok::<_, warp::Rejection>(user_id)
            }
        },
    )
}
