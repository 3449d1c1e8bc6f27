use std::net::SocketAddr;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, foods, images, profile};

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(profile::router())
                .merge(foods::router())
                .merge(images::router())
                .route("/health", get(|| async { "ok" })),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms = latency.as_millis() as u64, "response");
                        } else {
                            tracing::info!(%status, latency_ms = latency.as_millis() as u64, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::testing::{empty_request, multipart_request, Part, TestEnv};

    #[tokio::test]
    async fn health_is_public() {
        let env = TestEnv::new();
        let res = env
            .app()
            .oneshot(empty_request(Method::GET, "/api/v1/health", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn oversized_upload_is_refused() {
        let env = TestEnv::new();
        let (_, token) = env
            .user_with_token("a@b.co", "pw", Default::default())
            .await;
        let big = vec![0u8; env.state.config.max_upload_bytes + 1];
        let res = env
            .app()
            .oneshot(multipart_request(
                Method::POST,
                "/api/v1/foods",
                Some(&token),
                &[
                    Part::Text("name", "x"),
                    Part::Text("meal", "Lunch"),
                    Part::Text("date", "2023-10-27"),
                    Part::File("image", "big.png", "image/png", &big),
                ],
            ))
            .await
            .unwrap();
        assert!(res.status().is_client_error());
        assert!(env.storage.keys().is_empty());
    }
}
