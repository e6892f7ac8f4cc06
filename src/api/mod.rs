// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::middleware::require_signature,
    auth::providers::ProviderKind,
    auth::roles::Role,
    state::AppState,
};

use self::auth::{SessionStatus, SessionTokens};
use self::envelope::ApiResponse;

pub mod auth;
pub mod envelope;
pub mod health;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/auth/sign-in/credentials", post(auth::sign_in_credentials))
        .route("/auth/sign-in/social", post(auth::sign_in_social))
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/status", get(auth::status))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_signature,
        ))
        .with_state(state);

    Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::sign_in_credentials,
        auth::sign_in_social,
        auth::sign_up,
        auth::refresh,
        auth::status,
        auth::verify_email,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            auth::CredentialsDto,
            auth::SignUpDto,
            auth::VerifyEmailDto,
            SessionTokens,
            SessionStatus,
            ApiResponse<SessionTokens>,
            ApiResponse<SessionStatus>,
            Role,
            ProviderKind,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Session issuance and account identity"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, Response, StatusCode};
    use base64ct::{Base64, Encoding};
    use tower::ServiceExt;

    use crate::auth::keys::KeyRing;
    use crate::auth::middleware::{
        KEY_ID_HEADER, NONCE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
    };
    use crate::auth::providers::{DiscordVerifier, GoogleVerifier, ProviderRegistry};
    use crate::auth::service::AuthService;
    use crate::auth::signature::SignatureVerifier;
    use crate::auth::tokens::{TokenSecrets, TokenService};
    use crate::notify::TracingMailSink;
    use crate::storage::InMemoryUserDirectory;
    use crate::store::{MemoryStore, SessionStore};

    fn test_state() -> AppState {
        let secrets = TokenSecrets {
            access: "access-secret".to_string(),
            refresh: "refresh-secret".to_string(),
            verify_email: "verify-email-secret".to_string(),
            stream: "stream-secret".to_string(),
            internal: "internal-secret".to_string(),
        };
        let tokens = Arc::new(TokenService::new(&secrets));
        let sessions: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
        let providers = ProviderRegistry::new(
            Arc::new(GoogleVerifier::new("client-id")),
            Arc::new(DiscordVerifier::new()),
        );
        let auth = AuthService::new(
            tokens.clone(),
            sessions.clone(),
            Arc::new(InMemoryUserDirectory::new()),
            providers,
            Arc::new(TracingMailSink),
            "https://app.example.test",
        );
        let spec = format!("k1:{}", Base64::encode_string(b"signing-secret"));
        let ring = Arc::new(KeyRing::parse(&spec, "k1").unwrap());
        let signatures = Arc::new(SignatureVerifier::new(ring, sessions.clone()));
        AppState::new(auth, tokens, signatures, sessions, false)
    }

    fn signed_json(state: &AppState, method: &str, uri: &str, body: &str) -> Request<Body> {
        let payload = state.signatures.sign(method, uri, body.as_bytes()).unwrap();
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(KEY_ID_HEADER, &payload.key_id)
            .header(TIMESTAMP_HEADER, payload.timestamp.to_string())
            .header(NONCE_HEADER, &payload.nonce)
            .header(SIGNATURE_HEADER, &payload.signature)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn issued_cookie(response: &Response<Body>, name: &str) -> String {
        let prefix = format!("{name}=");
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .find_map(|value| {
                value
                    .to_str()
                    .ok()
                    .and_then(|cookie| cookie.strip_prefix(&prefix))
                    .and_then(|rest| rest.split(';').next())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| panic!("cookie {name} not set"))
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const SIGN_UP_BODY: &str = r#"{"fullName":"Ada Lovelace","email":"ada@example.com","password":"Str0ng@Pass","confirmPassword":"Str0ng@Pass"}"#;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(test_state());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn signed_sign_up_issues_a_session() {
        let state = test_state();
        let app = router(state.clone());

        let response = app
            .oneshot(signed_json(&state, "POST", "/auth/sign-up", SIGN_UP_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response
                .headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .count(),
            4
        );

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "User created successfully");
    }

    #[tokio::test]
    async fn unsigned_mutations_are_rejected() {
        let app = router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/sign-up")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(SIGN_UP_BODY))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Unauthorized");
    }

    #[tokio::test]
    async fn status_reads_ride_on_the_access_cookie() {
        let state = test_state();
        let app = router(state.clone());

        let created = app
            .clone()
            .oneshot(signed_json(&state, "POST", "/auth/sign-up", SIGN_UP_BODY))
            .await
            .unwrap();
        let access = issued_cookie(&created, "access_token");

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/auth/status")
                    .header(header::COOKIE, format!("access_token={access}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["email"], "ada@example.com");
        assert_eq!(body["data"]["provider"], "CREDENTIALS");
    }

    #[tokio::test]
    async fn signed_refresh_rotates_the_cookies() {
        let state = test_state();
        let app = router(state.clone());

        let created = app
            .clone()
            .oneshot(signed_json(&state, "POST", "/auth/sign-up", SIGN_UP_BODY))
            .await
            .unwrap();
        let refresh_token = issued_cookie(&created, "refresh_token");

        let mut request = signed_json(&state, "POST", "/auth/refresh", "");
        request.headers_mut().insert(
            header::COOKIE,
            format!("refresh_token={refresh_token}").parse().unwrap(),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_ne!(issued_cookie(&response, "refresh_token"), refresh_token);
    }

    #[tokio::test]
    async fn health_needs_no_signature() {
        let app = router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["checks"]["session_store"], "ok");
    }

    #[tokio::test]
    async fn openapi_document_is_served_unsigned() {
        let app = router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api-doc/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["paths"]["/auth/sign-up"].is_object());
    }
}
