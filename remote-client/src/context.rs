//! Headers of the inbound request currently being served.
//!
//! Servers wrap each handler in [`scope`]; interceptors running inside the
//! handler read from it to carry headers onto outbound calls.

use std::future::Future;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

tokio::task_local! {
    static INBOUND_HEADERS: HeaderMap;
}

/// Run `f` with `headers` visible to [`inbound_header`]
pub async fn scope<F: Future>(headers: HeaderMap, f: F) -> F::Output {
    INBOUND_HEADERS.scope(headers, f).await
}

/// Value of `name` on the inbound request, if called inside [`scope`]
pub fn inbound_header(name: &HeaderName) -> Option<HeaderValue> {
    INBOUND_HEADERS
        .try_with(|headers| headers.get(name).cloned())
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_header_visible_only_in_scope() {
        let name = HeaderName::from_static("x-request-id");
        let mut headers = HeaderMap::new();
        headers.insert(name.clone(), HeaderValue::from_static("abc"));

        let inside = scope(headers, async { inbound_header(&name) }).await;
        assert_eq!(inside.unwrap(), "abc");
        assert!(inbound_header(&name).is_none());
    }
}
