use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::form_urlencoded;
use waypoint_core::RedirectRequest;

/// Bytes escaped in the path of a built location.
///
/// `/` and `%` pass through: the request path is already a raw
/// request-target path and existing escapes must not be encoded twice.
/// Non-ASCII bytes are always escaped.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Bytes escaped in a configured replacement location.
///
/// A replacement may be a full URL, so its delimiters (`?`, `#`, `:`) and
/// existing escapes pass through. Non-ASCII is always escaped.
const REPLACEMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// Location for moving `request` to `target_domain`, keeping scheme and path.
///
/// The query string is carried over only for `GET` requests, re-encoded as
/// `application/x-www-form-urlencoded` with parameter order and repeats kept.
pub fn domain_location(request: &RedirectRequest, target_domain: &str) -> String {
    let mut location = format!(
        "{}://{}{}",
        request.scheme(),
        target_domain,
        utf8_percent_encode(&request.path, PATH)
    );

    if request.method == Method::GET && !request.query.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(request.query.iter())
            .finish();
        location.push('?');
        location.push_str(&query);
    }

    location
}

/// Location for a matched path redirect, safe to send in a `Location` header.
pub fn replacement_location(replacement: &str) -> String {
    utf8_percent_encode(replacement, REPLACEMENT).to_string()
}
