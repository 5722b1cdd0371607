use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Request, Response},
    response::IntoResponse,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{
    Span, debug_span,
    field::{Empty, display},
    info, instrument,
};

use relay_webhook::InboundEvent;

mod config;
mod invoke;

use invoke::reject_body;

pub use config::{ConfigError, ConfigSource, Credentials, ProcessEnv};
pub use invoke::{InvocationError, InvocationResponse, Settings, invoke};

#[derive(Clone)]
struct ApiState {
    settings: Arc<Settings>,
    source: Arc<dyn ConfigSource>,
}

/// Build the webhook router.
///
/// Every request to a webhook route is one invocation; credentials are
/// read from `source` each time.
pub fn router(settings: Settings, source: impl ConfigSource + 'static) -> Router {
    let api_span = Span::current();
    let state = ApiState {
        settings: Arc::new(settings),
        source: Arc::new(source),
    };

    Router::new()
        .route("/ping", get(|| async { "OK" }))
        .route("/", post(webhook))
        .route("/webhook", post(webhook))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    debug_span!(parent: &api_span, "request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        status = Empty,
                    )
                })
                .on_response(|response: &Response<Body>, _: Duration, span: &Span| {
                    span.record("status", display(response.status()));
                }),
        )
        .with_state(state)
}

/// Start the API
///
/// Receives a TCP listener already bound to the right address and port.
#[instrument(name = "api", skip_all)]
pub async fn start(
    listener: TcpListener,
    settings: Settings,
    source: impl ConfigSource + 'static,
) -> std::io::Result<()> {
    let app = router(settings, source);

    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await
}

/// Handle `POST /` and `POST /webhook`
async fn webhook(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response<Body> {
    let body = match std::str::from_utf8(&body) {
        Ok(body) => body,
        Err(err) => return reject_body(state.source.as_ref(), err).into_response(),
    };

    let event = InboundEvent::new(headers, body);
    invoke(&event, state.source.as_ref(), &state.settings)
        .await
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::collections::HashMap;

    use relay_cloud::CloudConfig;
    use relay_util::types::Secret;
    use relay_webhook::{TOKEN_HEADER, message_token};

    const BODY: &str = r#"[{"n":"temperature","v":21.5}]"#;

    fn env() -> HashMap<String, String> {
        HashMap::from([
            ("ARDUINO_CLIENT_ID".to_owned(), "client-id".to_owned()),
            ("ARDUINO_CLIENT_SECRET".to_owned(), "client-secret".to_owned()),
            ("ARDUINO_THING_ID".to_owned(), "thing-1".to_owned()),
            ("ARDUINO_PROPERTY_ID".to_owned(), "prop-1".to_owned()),
            ("KPN_SHARED_SECRET".to_owned(), "s3cr3t".to_owned()),
        ])
    }

    async fn setup_test_server(cloud: &Server) -> u16 {
        setup_test_server_with(cloud, env()).await
    }

    async fn setup_test_server_with(cloud: &Server, env: HashMap<String, String>) -> u16 {
        let settings = Settings {
            cloud: CloudConfig {
                api_endpoint: cloud.url().try_into().unwrap(),
                ..CloudConfig::default()
            },
            ..Settings::default()
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(start(listener, settings, env));

        tokio::time::sleep(Duration::from_millis(10)).await;

        port
    }

    #[tokio::test]
    async fn test_ping() {
        let cloud = Server::new_async().await;
        let port = setup_test_server(&cloud).await;

        let body = reqwest::get(format!("http://127.0.0.1:{port}/ping"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_webhook_publishes_measurement() {
        let mut cloud = Server::new_async().await;
        let _token = cloud
            .mock("POST", "/iot/v1/clients/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok"}"#)
            .create_async()
            .await;
        let publish = cloud
            .mock("PUT", "/iot/v2/things/thing-1/properties/prop-1/publish")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::Json(json!({"value": 21.5})))
            .with_status(200)
            .create_async()
            .await;

        let port = setup_test_server(&cloud).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://127.0.0.1:{port}/webhook"))
            .header("Things-Message-Token", message_token(BODY, &Secret::from("s3cr3t")))
            .header("content-type", "application/json")
            .body(BODY)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response.text().await.unwrap(),
            r#""Successfully updated Arduino Cloud!""#
        );
        publish.assert_async().await;
    }

    #[tokio::test]
    async fn test_webhook_rejects_wrong_token() {
        let mut cloud = Server::new_async().await;
        let token = cloud
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let port = setup_test_server(&cloud).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://127.0.0.1:{port}/"))
            .header(TOKEN_HEADER, "deadbeef")
            .body(BODY)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 401);
        assert_eq!(response.text().await.unwrap(), "Unauthorized");
        token.assert_async().await;
    }

    #[tokio::test]
    async fn test_webhook_rejects_non_utf8_bodies() {
        let cloud = Server::new_async().await;
        let port = setup_test_server(&cloud).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://127.0.0.1:{port}/webhook"))
            .body(vec![0xff, 0xfe, 0xfd])
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        assert_eq!(response.text().await.unwrap(), "Invalid request body format.");
    }

    #[tokio::test]
    async fn test_webhook_reports_missing_configuration_before_bad_bodies() {
        let cloud = Server::new_async().await;
        let mut env = env();
        env.remove("ARDUINO_PROPERTY_ID");
        let port = setup_test_server_with(&cloud, env).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://127.0.0.1:{port}/webhook"))
            .body(vec![0xff, 0xfe, 0xfd])
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        assert_eq!(
            response.text().await.unwrap(),
            "Configuration error: Missing ARDUINO_PROPERTY_ID"
        );
    }

    #[tokio::test]
    async fn test_webhook_only_accepts_post() {
        let cloud = Server::new_async().await;
        let port = setup_test_server(&cloud).await;

        let response = reqwest::get(format!("http://127.0.0.1:{port}/webhook"))
            .await
            .unwrap();

        assert_eq!(response.status(), 405);
    }
}
