use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};

use crate::config::Environment;

/// Headers every response carries, whatever the environment.
const BASELINE: [(&str, &str); 3] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
];

const HSTS: &str = "max-age=31536000; includeSubDomains";

/// Stamp the baseline headers onto a response, plus HSTS in production.
///
/// Runs after the handler, so error responses and 404s are covered too.
pub async fn security_headers_middleware(
    environment: Environment,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in BASELINE {
        headers.insert(
            header::HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    // Development runs over plain http
    if environment.is_production() {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS),
        );
    }

    response
}

pub fn apply_security_headers<S>(router: Router<S>, environment: Environment) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn(move |req, next| {
        security_headers_middleware(environment.clone(), req, next)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    async fn fetch(environment: Environment, uri: &str) -> (StatusCode, HeaderMap) {
        let app = apply_security_headers(
            Router::new().route("/stories", get(|| async { "[]" })),
            environment,
        );
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        (response.status(), response.headers().clone())
    }

    #[tokio::test]
    async fn test_production_adds_hsts() {
        let (status, headers) = fetch(Environment::Production, "/stories").await;

        assert_eq!(status, StatusCode::OK);
        for (name, value) in BASELINE {
            assert_eq!(headers[name], value);
        }
        assert_eq!(headers[header::STRICT_TRANSPORT_SECURITY], HSTS);
    }

    #[tokio::test]
    async fn test_development_skips_hsts() {
        let (_, headers) = fetch(Environment::Development, "/stories").await;

        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    }

    #[tokio::test]
    async fn test_unrouted_paths_get_headers() {
        let (status, headers) = fetch(Environment::Production, "/nowhere").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
    }
}
