//! Response header injection
//!
//! Every response leaving the server carries the same five headers: CORS
//! allow-all, cache disabling, and the COOP/COEP pair that opts pages into
//! cross-origin isolation.

use hyper::header::{HeaderName, HeaderValue};
use hyper::Response;

/// Injected headers, in the order they are written
pub const ISOLATION_HEADERS: [(&str, &str); 5] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET"),
    ("cache-control", "no-store, no-cache, must-revalidate"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-embedder-policy", "require-corp"),
];

/// Append the fixed header set after whatever headers the response already has.
///
/// Values are appended, never replaced, so they always follow the
/// file-serving headers in the serialized head.
pub fn inject_isolation_headers<B>(response: &mut Response<B>) {
    let headers = response.headers_mut();
    for (name, value) in ISOLATION_HEADERS {
        headers.append(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_appended_in_order() {
        let mut response = Response::builder()
            .header("Content-Type", "text/plain")
            .body(())
            .unwrap();
        inject_isolation_headers(&mut response);

        let names: Vec<&str> = response.headers().keys().map(HeaderName::as_str).collect();
        assert_eq!(
            names,
            vec![
                "content-type",
                "access-control-allow-origin",
                "access-control-allow-methods",
                "cache-control",
                "cross-origin-opener-policy",
                "cross-origin-embedder-policy",
            ]
        );
        assert_eq!(response.headers()["cache-control"], "no-store, no-cache, must-revalidate");
        assert_eq!(response.headers()["cross-origin-embedder-policy"], "require-corp");
    }

    #[test]
    fn test_existing_header_is_kept() {
        let mut response = Response::builder()
            .header("Cache-Control", "public")
            .body(())
            .unwrap();
        inject_isolation_headers(&mut response);

        let values: Vec<_> = response.headers().get_all("cache-control").iter().collect();
        assert_eq!(values, vec!["public", "no-store, no-cache, must-revalidate"]);
    }
}
