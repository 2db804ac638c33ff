use crate::rule::RedirectKind;
use http::{Method, StatusCode};
use typed_builder::TypedBuilder;

/// The parts of an incoming HTTP request that redirect decisions depend on.
///
/// # Example
///
/// ```rust
/// use waypoint_core::RedirectRequest;
///
/// let request = RedirectRequest::builder()
///     .host("www.example.com")
///     .path("/docs")
///     .query(vec![("page".to_string(), "2".to_string())])
///     .build();
/// assert_eq!(request.scheme(), "http");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct RedirectRequest {
    /// Host as received, including the port if the client sent one.
    #[builder(setter(into))]
    pub host: String,
    /// Whether the request arrived over a secure connection.
    #[builder(default)]
    pub secure: bool,
    /// Raw request path.
    #[builder(setter(into))]
    pub path: String,
    #[builder(default = Method::GET)]
    pub method: Method,
    /// Query parameters in their original order; keys may repeat.
    #[builder(default)]
    pub query: Vec<(String, String)>,
}

impl RedirectRequest {
    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }
}

/// A decision to redirect the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDecision {
    pub kind: RedirectKind,
    pub location: String,
}

impl RedirectDecision {
    pub fn new(kind: RedirectKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }
}
