use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};
use url::form_urlencoded;
use waypoint_core::{RedirectDecision, RedirectRequest};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Answers with a redirect when a rule matches, otherwise passes the
/// request on unchanged.
pub async fn redirect_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let redirect_request = to_redirect_request(&request);

    match state.redirector().resolve(&redirect_request).await {
        Ok(Some(decision)) => {
            debug!(
                host = %redirect_request.host,
                path = %redirect_request.path,
                status = decision.status_code().as_u16(),
                location = %decision.location,
                "Redirecting"
            );
            redirect_response(&decision)
        }
        Ok(None) => Ok(next.run(request).await),
        Err(e) => {
            error!(
                host = %redirect_request.host,
                path = %redirect_request.path,
                error = %e,
                "Failed to resolve redirect"
            );
            Err(AppError::from(e))
        }
    }
}

pub async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn redirect_response(decision: &RedirectDecision) -> Result<Response> {
    let location = HeaderValue::from_str(&decision.location).map_err(|e| {
        AppError::Internal(format!(
            "redirect location '{}' is not a valid header value: {e}",
            decision.location
        ))
    })?;

    let mut response = decision.status_code().into_response();
    response.headers_mut().insert(header::LOCATION, location);
    Ok(response)
}

fn to_redirect_request(request: &Request) -> RedirectRequest {
    let uri = request.uri();
    let headers = request.headers();

    RedirectRequest::builder()
        .host(host(headers, uri))
        .secure(is_secure(headers, uri))
        .path(uri.path())
        .method(request.method().clone())
        .query(query_pairs(uri))
        .build()
}

fn host(headers: &HeaderMap, uri: &Uri) -> String {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.authority().map(|authority| authority.as_str()))
        .unwrap_or_default()
        .to_string()
}

fn is_secure(headers: &HeaderMap, uri: &Uri) -> bool {
    if uri.scheme_str() == Some("https") {
        return true;
    }

    // First hop wins when proxies append to the header
    headers
        .get(X_FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|query| form_urlencoded::parse(query.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Method;

    fn request(uri: &str, headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn host_header_takes_precedence() {
        let req = request("http://authority.test/x", &[("host", "header.test:8080")]);
        assert_eq!(to_redirect_request(&req).host, "header.test:8080");

        let req = request("http://authority.test/x", &[]);
        assert_eq!(to_redirect_request(&req).host, "authority.test");

        let req = request("/x", &[]);
        assert_eq!(to_redirect_request(&req).host, "");
    }

    #[test]
    fn secure_from_scheme_or_forwarded_proto() {
        assert!(!to_redirect_request(&request("/x", &[])).secure);
        assert!(to_redirect_request(&request("https://a.test/x", &[])).secure);
        assert!(to_redirect_request(&request("/x", &[("x-forwarded-proto", "HTTPS")])).secure);
        let proxied = request("/x", &[("x-forwarded-proto", "https, http")]);
        assert!(to_redirect_request(&proxied).secure);
        assert!(!to_redirect_request(&request("/x", &[("x-forwarded-proto", "http")])).secure);
    }

    #[test]
    fn query_is_decoded_in_order() {
        let req = request("/s?tag=a+b&tag=c%26d&empty=", &[]);
        let redirect_request = to_redirect_request(&req);

        assert_eq!(redirect_request.path, "/s");
        assert_eq!(redirect_request.method, Method::GET);
        assert_eq!(
            redirect_request.query,
            vec![
                ("tag".to_string(), "a b".to_string()),
                ("tag".to_string(), "c&d".to_string()),
                ("empty".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn redirect_response_has_location_and_empty_body() {
        let decision = RedirectDecision::new(
            waypoint_core::RedirectKind::Permanent,
            "http://b.example.com/x",
        );
        let response = redirect_response(&decision).unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "http://b.example.com/x");
    }
}
