use crate::opt::Auth;
use crate::{AppConfig, routes};
use axum::routing::get;
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayerBuilder;
use http::{Method, header};
use sea_orm::DatabaseConnection;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::{task, time};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use yume_core::llm::LlmClient;
use yume_oidc::{DefaultJwkClient, OidcConfig, ValidationOptions};

pub(crate) struct InnerAuthConfig {
    jwk_client: DefaultJwkClient,
    validation: ValidationOptions,
}

impl InnerAuthConfig {
    pub(crate) fn jwk(&self) -> &DefaultJwkClient {
        &self.jwk_client
    }

    pub(crate) fn validation(&self) -> &ValidationOptions {
        &self.validation
    }
}

#[derive(Clone)]
pub(crate) struct AuthConfig(Arc<InnerAuthConfig>);

impl AuthConfig {
    fn new(jwk_client: DefaultJwkClient, validation: ValidationOptions) -> Self {
        Self(Arc::new(InnerAuthConfig { jwk_client, validation }))
    }
}

impl AsRef<InnerAuthConfig> for AuthConfig {
    fn as_ref(&self) -> &InnerAuthConfig {
        &self.0
    }
}

pub(crate) async fn create_app(auth: &Auth, llm: LlmClient, seaorm_pool: DatabaseConnection) -> anyhow::Result<Router> {
    let (prometheus_layer, metric_handle) = PrometheusMetricLayerBuilder::new()
        .with_prefix("api")
        .with_default_metrics()
        .build_pair();

    let http_client = reqwest::Client::new();
    let oidc_config = OidcConfig::from_issuer_url(&http_client, &auth.oidc_issuer_url).await?;
    tracing::info!(issuer = %oidc_config.issuer, "discovered oidc provider");
    let jwk_client = DefaultJwkClient::new(http_client, oidc_config.jwks_uri).await?;

    let refresh_jwk_client = jwk_client.clone();
    task::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            match refresh_jwk_client.refresh().await {
                Ok(true) => tracing::debug!("refreshed jwk set"),
                Ok(false) => {}
                Err(error) => tracing::warn!(error = &error as &dyn Error, "failed to refresh jwk set"),
            }
        }
    });

    let audiences = if auth.audience.is_empty() {
        None
    } else {
        tracing::info!(audiences = ?auth.audience, "allowing audiences");
        Some(auth.audience.clone())
    };
    let auth_config = AuthConfig::new(jwk_client, ValidationOptions { audiences });

    let cors = build_cors(&auth.origins)?;

    let app = build_router(auth_config, llm, seaorm_pool, cors)
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer);
    Ok(app)
}

fn build_cors(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    Ok(CorsLayer::new()
        .allow_origin(
            origins
                .iter()
                .map(|origin| origin.parse())
                .collect::<Result<Vec<_>, _>>()?,
        )
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::AUTHORIZATION, header::ORIGIN])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .max_age(Duration::from_secs(3600)))
}

pub(crate) fn build_router(
    auth_config: AuthConfig,
    llm: LlmClient,
    seaorm_pool: DatabaseConnection,
    cors: CorsLayer,
) -> Router {
    Router::new()
        .merge(routes::docs::create_router())
        .merge(routes::dream::create_router())
        .nest("/journal", routes::journal::create_router())
        .merge(routes::status::create_router())
        .layer(
            // Router layers are called bottom to top
            // ServiceBuilder layers are called top to bottom
            ServiceBuilder::new()
                .layer(cors)
                .layer(Extension(AppConfig::new(llm)))
                .layer(Extension(auth_config))
                .layer(Extension(seaorm_pool)),
        )
        .with_state(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use jsonwebtoken::jwk::JwkSet;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;
    use tower::ServiceExt;
    use url::Url;
    use yume_core::llm::LlmConfig;
    use yume_db::schema::ensure_schema;

    const TEST_KID: &str = "yume-test";
    const TEST_SECRET: &[u8] = b"yume-test-signing-secret-0123456789abcdef";
    const TEST_JWKS: &str = r#"{
        "keys": [
            {
                "kty": "oct",
                "use": "sig",
                "alg": "HS256",
                "kid": "yume-test",
                "k": "eXVtZS10ZXN0LXNpZ25pbmctc2VjcmV0LTAxMjM0NTY3ODlhYmNkZWY"
            }
        ]
    }"#;

    fn auth_config() -> AuthConfig {
        let jwks: JwkSet = serde_json::from_str(TEST_JWKS).expect("test jwk set");
        let url = Url::parse("http://127.0.0.1:9/jwks.json").expect("jwks url");
        let jwk_client = DefaultJwkClient::from_jwk_set(reqwest::Client::new(), url, &jwks);
        AuthConfig::new(jwk_client, ValidationOptions::default())
    }

    fn mint_token(sub: &str) -> String {
        let mut header = Header::default();
        header.kid = Some(TEST_KID.to_owned());
        let expiry = chrono::Utc::now().timestamp() + 3600;
        let claims = json!({ "sub": sub, "exp": expiry });
        jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(TEST_SECRET)).expect("token")
    }

    fn expired_token(sub: &str) -> String {
        let mut header = Header::default();
        header.kid = Some(TEST_KID.to_owned());
        let expiry = chrono::Utc::now().timestamp() - 3600;
        let claims = json!({ "sub": sub, "exp": expiry });
        jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(TEST_SECRET)).expect("token")
    }

    fn unconfigured_llm() -> LlmClient {
        LlmClient::new(LlmConfig::builder().build()).expect("llm client")
    }

    fn stub_llm(base_url: &str) -> LlmClient {
        LlmClient::new(
            LlmConfig::builder()
                .api_key(Some("test-key".to_owned()))
                .api_base(Some(base_url.to_owned()))
                .build(),
        )
        .expect("llm client")
    }

    async fn test_app(llm: LlmClient) -> Router {
        let pool = sea_orm::Database::connect("sqlite::memory:").await.expect("database");
        ensure_schema(&pool).await.expect("schema");
        build_router(auth_config(), llm, pool, CorsLayer::permissive())
    }

    struct StubLlm {
        base_url: String,
        chat_hits: Arc<AtomicUsize>,
        image_hits: Arc<AtomicUsize>,
    }

    async fn spawn_stub(chat_response: Value, image_status: StatusCode, image_response: Value) -> StubLlm {
        use axum::routing::post;

        let chat_hits = Arc::new(AtomicUsize::new(0));
        let image_hits = Arc::new(AtomicUsize::new(0));
        let chat_counter = Arc::clone(&chat_hits);
        let image_counter = Arc::clone(&image_hits);

        let router = Router::new()
            .route(
                "/v1/chat/completions",
                post(move || {
                    let response = chat_response.clone();
                    let counter = Arc::clone(&chat_counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        axum::Json(response)
                    }
                }),
            )
            .route(
                "/v1/images/generations",
                post(move || {
                    let response = image_response.clone();
                    let counter = Arc::clone(&image_counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        (image_status, axum::Json(response))
                    }
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("stub listener");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub server");
        });

        StubLlm {
            base_url: format!("http://{addr}/v1"),
            chat_hits,
            image_hits,
        }
    }

    fn interpretation_json() -> Value {
        json!({
            "dream_summary": "Flying over a quiet city at night.",
            "tags": ["flying", "night"],
            "mood": "calm",
            "symbolism": "Flight often stands for release from pressure.",
            "psychological_perspective": "A wish for more control over daily life.",
            "reflective_prompts": ["Where in your life do you feel weightless?"],
            "tone": "reassuring"
        })
    }

    fn chat_response(arguments: &Value) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": [
                {
                    "index": 0,
                    "finish_reason": "tool_calls",
                    "message": {
                        "role": "assistant",
                        "tool_calls": [
                            {
                                "id": "call_1",
                                "type": "function",
                                "function": {
                                    "name": "record_interpretation",
                                    "arguments": arguments.to_string()
                                }
                            }
                        ]
                    }
                }
            ]
        })
    }

    fn image_response() -> Value {
        json!({
            "created": 1_700_000_000,
            "data": [{ "url": "https://images.example/dream.png" }]
        })
    }

    fn image_error() -> Value {
        json!({
            "error": {
                "message": "boom",
                "type": "server_error",
                "param": null,
                "code": null
            }
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).expect("request")
    }

    #[test_log::test(tokio::test)]
    async fn a_missing_token_is_unauthorized() {
        let app = test_app(unconfigured_llm()).await;
        let (status, body) = send(&app, get_request("/journal", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
        assert!(body.get("dreams").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn a_garbage_token_is_unauthorized() {
        let app = test_app(unconfigured_llm()).await;
        let (status, body) = send(&app, get_request("/journal", Some("not-a-jwt"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[test_log::test(tokio::test)]
    async fn an_expired_token_is_unauthorized() {
        let app = test_app(unconfigured_llm()).await;
        let token = expired_token("alice");
        let (status, body) = send(&app, get_request("/journal", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[test_log::test(tokio::test)]
    async fn the_journal_round_trips_an_entry() {
        let app = test_app(unconfigured_llm()).await;
        let token = mint_token("alice");

        let entry = json!({
            "dream_text": "I was flying over the city.",
            "interpretation": interpretation_json()
        });
        let (status, body) = send(&app, post_json("/journal", Some(&token), &entry)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (status, body) = send(&app, get_request("/journal", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let dreams = body["dreams"].as_array().expect("dreams");
        assert_eq!(dreams.len(), 1);
        assert_eq!(dreams[0]["dream_text"], "I was flying over the city.");
        assert_eq!(dreams[0]["interpretation"], interpretation_json());
        assert!(dreams[0].get("image_url").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn the_journal_rejects_an_entry_without_dream_text() {
        let app = test_app(unconfigured_llm()).await;
        let token = mint_token("alice");

        let entry = json!({
            "dream_text": "   ",
            "interpretation": interpretation_json()
        });
        let (status, body) = send(&app, post_json("/journal", Some(&token), &entry)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_data");

        let (_, body) = send(&app, get_request("/journal", Some(&token))).await;
        assert_eq!(body["dreams"].as_array().expect("dreams").len(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn the_journal_rejects_an_entry_without_interpretation() {
        let app = test_app(unconfigured_llm()).await;
        let token = mint_token("alice");

        let entry = json!({ "dream_text": "I was flying." });
        let (status, body) = send(&app, post_json("/journal", Some(&token), &entry)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_data");
    }

    #[test_log::test(tokio::test)]
    async fn journals_are_scoped_to_their_user() {
        let app = test_app(unconfigured_llm()).await;
        let alice = mint_token("alice");
        let bob = mint_token("bob");

        let entry = json!({
            "dream_text": "Alice dreamed of gardens.",
            "interpretation": interpretation_json()
        });
        let (status, _) = send(&app, post_json("/journal", Some(&alice), &entry)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, get_request("/journal", Some(&bob))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dreams"].as_array().expect("dreams").len(), 0);

        let (_, body) = send(&app, get_request("/journal", Some(&alice))).await;
        assert_eq!(body["dreams"].as_array().expect("dreams").len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn the_journal_lists_newest_first() {
        let app = test_app(unconfigured_llm()).await;
        let token = mint_token("alice");

        for dream in ["first", "second", "third"] {
            let entry = json!({
                "dream_text": dream,
                "interpretation": interpretation_json()
            });
            let (status, _) = send(&app, post_json("/journal", Some(&token), &entry)).await;
            assert_eq!(status, StatusCode::OK);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let (_, body) = send(&app, get_request("/journal", Some(&token))).await;
        let dreams = body["dreams"].as_array().expect("dreams");
        let texts: Vec<&str> = dreams
            .iter()
            .map(|dream| dream["dream_text"].as_str().expect("dream text"))
            .collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
    }

    #[test_log::test(tokio::test)]
    async fn interpret_rejects_a_missing_dream() {
        let app = test_app(unconfigured_llm()).await;
        let (status, body) = send(&app, post_json("/interpret", None, &json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_dream");
    }

    #[test_log::test(tokio::test)]
    async fn interpret_rejects_an_empty_dream_before_checking_credentials() {
        let app = test_app(unconfigured_llm()).await;
        let (status, body) = send(&app, post_json("/interpret", None, &json!({ "dream": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_dream");
    }

    #[test_log::test(tokio::test)]
    async fn interpret_without_an_api_key_is_a_server_error() {
        let app = test_app(unconfigured_llm()).await;
        let request = json!({ "dream": "I was flying over the city." });
        let (status, body) = send(&app, post_json("/interpret", None, &request)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "missing_credential");
    }

    #[test_log::test(tokio::test)]
    async fn interpret_never_sends_an_empty_dream_upstream() {
        let stub = spawn_stub(chat_response(&interpretation_json()), StatusCode::OK, image_response()).await;
        let app = test_app(stub_llm(&stub.base_url)).await;

        let (status, _) = send(&app, post_json("/interpret", None, &json!({ "dream": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(stub.chat_hits.load(Ordering::SeqCst), 0);
    }

    #[test_log::test(tokio::test)]
    async fn interpret_round_trips_through_the_model() {
        let stub = spawn_stub(chat_response(&interpretation_json()), StatusCode::OK, image_response()).await;
        let app = test_app(stub_llm(&stub.base_url)).await;

        let request = json!({ "dream": "I was flying over the city." });
        let (status, body) = send(&app, post_json("/interpret", None, &request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["interpretation"]["dream_summary"],
            "Flying over a quiet city at night."
        );
        assert!(body["interpretation"].get("image_url").is_none());
        assert_eq!(stub.chat_hits.load(Ordering::SeqCst), 1);
        assert_eq!(stub.image_hits.load(Ordering::SeqCst), 0);
    }

    #[test_log::test(tokio::test)]
    async fn interpret_illustrates_when_asked() {
        let stub = spawn_stub(chat_response(&interpretation_json()), StatusCode::OK, image_response()).await;
        let app = test_app(stub_llm(&stub.base_url)).await;

        let request = json!({ "dream": "I was flying over the city.", "illustrate": true });
        let (status, body) = send(&app, post_json("/interpret", None, &request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["interpretation"]["image_url"], "https://images.example/dream.png");
        assert_eq!(stub.image_hits.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn a_failed_illustration_keeps_the_interpretation() {
        let stub = spawn_stub(
            chat_response(&interpretation_json()),
            StatusCode::INTERNAL_SERVER_ERROR,
            image_error(),
        )
        .await;
        let app = test_app(stub_llm(&stub.base_url)).await;

        let request = json!({ "dream": "I was flying over the city.", "illustrate": true });
        let (status, body) = send(&app, post_json("/interpret", None, &request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["interpretation"]["dream_summary"],
            "Flying over a quiet city at night."
        );
        assert!(body["interpretation"].get("image_url").is_none());
        // One upstream attempt, the failure is not retried.
        assert_eq!(stub.image_hits.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn visualize_rejects_a_missing_description() {
        let app = test_app(unconfigured_llm()).await;
        let (status, body) = send(&app, post_json("/visualize", None, &json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_description");
    }

    #[test_log::test(tokio::test)]
    async fn visualize_without_an_api_key_is_a_server_error() {
        let app = test_app(unconfigured_llm()).await;
        let request = json!({ "description": "a lighthouse in fog" });
        let (status, body) = send(&app, post_json("/visualize", None, &request)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "missing_credential");
    }

    #[test_log::test(tokio::test)]
    async fn visualize_round_trips_through_the_model() {
        let stub = spawn_stub(chat_response(&interpretation_json()), StatusCode::OK, image_response()).await;
        let app = test_app(stub_llm(&stub.base_url)).await;

        let request = json!({ "description": "a lighthouse in fog" });
        let (status, body) = send(&app, post_json("/visualize", None, &request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "imageUrl": "https://images.example/dream.png" }));
    }

    #[test_log::test(tokio::test)]
    async fn the_status_route_reports_database_health() {
        let app = test_app(unconfigured_llm()).await;
        let (status, body) = send(&app, get_request("/status", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "database": "ok" }));
    }

    #[test_log::test(tokio::test)]
    async fn the_openapi_document_is_served() {
        let app = test_app(unconfigured_llm()).await;
        let (status, body) = send(&app, get_request("/api-docs/openapi.json", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/interpret").is_some());
        assert!(body["paths"].get("/journal").is_some());
    }
}
