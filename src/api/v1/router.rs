use super::bearer::with_bearer;
use super::handler::{self, REFRESH_COOKIE};
use crate::application_port::CallContext;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

const MAX_BODY_BYTES: u64 = 16 * 1024;

// Paths are matched before methods so an unknown path stays a 404.
pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = warp::path("register")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_context(server.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login_by_username = warp::path!("login" / "username")
        .and(warp::post())
        .and(json_body())
        .and(with_context(server.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::login_by_username);

    let login_by_email = warp::path!("login" / "email")
        .and(warp::post())
        .and(json_body())
        .and(with_context(server.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::login_by_email);

    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::cookie::optional::<String>(REFRESH_COOKIE))
        .and(with_context(server.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::path("logout")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_bearer(server.token_codec.clone()))
        .and(with_context(server.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let ping = warp::path("ping")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_bearer(server.token_codec.clone()))
        .and_then(handler::ping);

    register
        .or(login_by_username)
        .or(login_by_email)
        .or(refresh)
        .or(logout)
        .or(ping)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with_context(
    server: Arc<Server>,
) -> impl Filter<Extract = (CallContext,), Error = Infallible> + Clone {
    warp::any().map(move || server.request_context())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1::recover_error;
    use serde_json::{Value, json};
    use warp::http::{StatusCode, header::SET_COOKIE};
    use warp::hyper::body::Bytes;

    async fn test_server() -> Arc<Server> {
        Arc::new(
            Server::try_new(&fake_settings(), b"router-test-key".to_vec())
                .await
                .unwrap(),
        )
    }

    fn body_json(body: &Bytes) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    fn cookie_value(response: &warp::http::Response<Bytes>) -> String {
        let header = response.headers()[SET_COOKIE].to_str().unwrap();
        let pair = header.split(';').next().unwrap();
        pair.strip_prefix("__Host-refresh_token=").unwrap().to_string()
    }

    fn register_body() -> Value {
        json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "Passw0rd!",
            "name": "Alice",
            "surname": "Liddell",
        })
    }

    #[tokio::test]
    async fn register_login_refresh_logout() {
        let api = routes(test_server().await).recover(recover_error);

        let response = warp::test::request()
            .method("POST")
            .path("/register")
            .json(&register_body())
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let user_id = body_json(response.body())["data"]["user_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = warp::test::request()
            .method("POST")
            .path("/register")
            .json(&register_body())
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response.body())["error"]["code"], "already_exists");

        let response = warp::test::request()
            .method("POST")
            .path("/login/email")
            .json(&json!({ "email": "alice@example.com", "password": "Passw0rd!" }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response.body());
        assert_eq!(body["data"]["user"]["id"], user_id.as_str());
        assert!(body["data"]["user"].get("password_hash").is_none());
        assert!(body["data"]["auth_tokens"].get("refresh_token").is_none());
        let access = body["data"]["auth_tokens"]["access_token"]
            .as_str()
            .unwrap()
            .to_string();
        let first_refresh = cookie_value(&response);
        assert!(first_refresh.starts_with("rt1."));

        let response = warp::test::request()
            .method("GET")
            .path("/ping")
            .header("authorization", format!("Bearer {access}"))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response.body())["data"],
            format!("Hello, user {user_id}")
        );

        let response = warp::test::request()
            .method("POST")
            .path("/refresh")
            .header("cookie", format!("__Host-refresh_token={first_refresh}"))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let second_refresh = cookie_value(&response);
        assert_ne!(first_refresh, second_refresh);

        // The rotated-out token is dead and its cookie gets cleared.
        let response = warp::test::request()
            .method("POST")
            .path("/refresh")
            .header("cookie", format!("__Host-refresh_token={first_refresh}"))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(
            response.headers()[SET_COOKIE]
                .to_str()
                .unwrap()
                .contains("Max-Age=0")
        );

        let response = warp::test::request()
            .method("POST")
            .path("/logout")
            .header("authorization", format!("Bearer {access}"))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = warp::test::request()
            .method("POST")
            .path("/refresh")
            .header("cookie", format!("__Host-refresh_token={second_refresh}"))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let api = routes(test_server().await).recover(recover_error);
        warp::test::request()
            .method("POST")
            .path("/register")
            .json(&register_body())
            .reply(&api)
            .await;

        let wrong_password = warp::test::request()
            .method("POST")
            .path("/login/username")
            .json(&json!({ "username": "alice", "password": "Wrong0ne!" }))
            .reply(&api)
            .await;
        let unknown_user = warp::test::request()
            .method("POST")
            .path("/login/username")
            .json(&json!({ "username": "bob", "password": "Passw0rd!" }))
            .reply(&api)
            .await;

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.body(), unknown_user.body());
    }

    #[tokio::test]
    async fn protected_routes_need_a_bearer() {
        let api = routes(test_server().await).recover(recover_error);

        let response = warp::test::request()
            .method("GET")
            .path("/ping")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response.body())["error"]["code"], "missing_token");

        let response = warp::test::request()
            .method("POST")
            .path("/logout")
            .header("authorization", "Bearer not-a-jwt")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response.body())["error"]["code"], "invalid_token");
    }

    #[tokio::test]
    async fn refresh_without_cookie_is_unauthorized() {
        let api = routes(test_server().await).recover(recover_error);

        let response = warp::test::request()
            .method("POST")
            .path("/refresh")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response.body())["error"]["code"], "missing_token");
    }

    #[tokio::test]
    async fn weak_password_is_a_bad_request() {
        let api = routes(test_server().await).recover(recover_error);
        let mut body = register_body();
        body["password"] = json!("password");

        let response = warp::test::request()
            .method("POST")
            .path("/register")
            .json(&body)
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response.body())["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn non_json_content_type_is_a_client_error() {
        let api = routes(test_server().await).recover(recover_error);
        let response = warp::test::request()
            .method("POST")
            .path("/login/username")
            .header("content-type", "text/plain")
            .body(r#"{"username":"alice","password":"Passw0rd!"}"#)
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            body_json(response.body())["error"]["code"],
            "unsupported_media_type"
        );
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let api = routes(test_server().await).recover(recover_error);
        let mut body = register_body();
        body["name"] = json!("a".repeat(MAX_BODY_BYTES as usize));

        let response = warp::test::request()
            .method("POST")
            .path("/register")
            .json(&body)
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn wrong_method_is_not_allowed() {
        let api = routes(test_server().await).recover(recover_error);
        let response = warp::test::request()
            .method("GET")
            .path("/register")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let api = routes(test_server().await).recover(recover_error);
        let response = warp::test::request()
            .method("GET")
            .path("/nowhere")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
