use super::error::*;
use super::validation;
use crate::application_port::*;
use crate::domain_model::{RefreshToken, User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::{StatusCode, header::SET_COOKIE};
use warp::reply::Response;
use warp::{self, Rejection, Reply, reject};

pub const REFRESH_COOKIE: &str = "__Host-refresh_token";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: &'static str, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

pub fn refresh_cookie(token: &RefreshToken, expires_at: DateTime<Utc>) -> String {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    format!(
        "{REFRESH_COOKIE}={}; Max-Age={max_age}; Path=/; Secure; HttpOnly; SameSite=Strict",
        token.as_str()
    )
}

pub fn clear_refresh_cookie() -> String {
    format!("{REFRESH_COOKIE}=; Max-Age=0; Path=/; Secure; HttpOnly; SameSite=Strict")
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub surname: String,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), ApiErrorCode> {
        validation::short_text("username", &self.username)?;
        validation::email(&self.email)?;
        validation::new_password(&self.password)?;
        validation::short_text("name", &self.name)?;
        validation::short_text("surname", &self.surname)?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
}

pub async fn register(
    body: RegisterRequest,
    ctx: CallContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<Response, Rejection> {
    body.validate().map_err(reject::custom)?;

    let register_input = RegisterInput {
        username: body.username,
        email: body.email,
        password: body.password,
        name: body.name,
        surname: body.surname,
    };
    let user_id = auth_service
        .register(&ctx, register_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let json = warp::reply::json(&ApiResponse::ok(RegisterResponse { user_id }));
    Ok(warp::reply::with_status(json, StatusCode::CREATED).into_response())
}

#[derive(Deserialize)]
pub struct UsernameLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct EmailLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub auth_tokens: AuthTokens,
}

pub async fn login_by_username(
    body: UsernameLoginRequest,
    ctx: CallContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<Response, Rejection> {
    validation::short_text("username", &body.username).map_err(reject::custom)?;
    validation::presented_password(&body.password).map_err(reject::custom)?;

    let login_input = LoginInput {
        identifier: LoginIdentifier::Username(body.username),
        password: body.password,
    };
    login(login_input, ctx, auth_service).await
}

pub async fn login_by_email(
    body: EmailLoginRequest,
    ctx: CallContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<Response, Rejection> {
    validation::email(&body.email).map_err(reject::custom)?;
    validation::presented_password(&body.password).map_err(reject::custom)?;

    let login_input = LoginInput {
        identifier: LoginIdentifier::Email(body.email),
        password: body.password,
    };
    login(login_input, ctx, auth_service).await
}

async fn login(
    login_input: LoginInput,
    ctx: CallContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<Response, Rejection> {
    let login_result = auth_service
        .login(&ctx, login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let cookie = refresh_cookie(
        &login_result.tokens.refresh_token,
        login_result.tokens.refresh_token_expires_at,
    );
    let login_response = LoginResponse {
        user: login_result.user,
        auth_tokens: login_result.tokens,
    };
    let json = warp::reply::json(&ApiResponse::ok(login_response));

    Ok(warp::reply::with_header(json, SET_COOKIE, cookie).into_response())
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub auth_tokens: AuthTokens,
}

pub async fn refresh(
    refresh_cookie_value: Option<String>,
    ctx: CallContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<Response, Rejection> {
    let presented = refresh_cookie_value
        .filter(|value| !value.is_empty())
        .map(RefreshToken)
        .ok_or_else(|| reject::custom(ApiErrorCode::MissingToken))?;

    match auth_service.refresh(&ctx, &presented).await {
        Ok(tokens) => {
            let cookie = refresh_cookie(&tokens.refresh_token, tokens.refresh_token_expires_at);
            let json = warp::reply::json(&ApiResponse::ok(RefreshResponse {
                auth_tokens: tokens,
            }));
            Ok(warp::reply::with_header(json, SET_COOKIE, cookie).into_response())
        }
        // Clear the dead cookie so the browser stops replaying it.
        Err(AuthError::InvalidToken) => Ok(warp::reply::with_header(
            ApiErrorCode::InvalidToken,
            SET_COOKIE,
            clear_refresh_cookie(),
        )
        .into_response()),
        Err(e) => Err(reject::custom(ApiErrorCode::from(e))),
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse;

pub async fn logout(
    user_id: UserId,
    ctx: CallContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<Response, Rejection> {
    auth_service
        .revoke(&ctx, user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let json = warp::reply::json(&ApiResponse::ok(LogoutResponse));
    Ok(warp::reply::with_header(json, SET_COOKIE, clear_refresh_cookie()).into_response())
}

pub async fn ping(user_id: UserId) -> Result<Response, Rejection> {
    let json = warp::reply::json(&ApiResponse::ok(format!("Hello, user {user_id}")));
    Ok(json.into_response())
}
