use bytes::Bytes;
use headers::{CacheControl, ContentType, ETag, HeaderMapExt as _, IfNoneMatch};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;

pub const SCRIPT_PATH: &str = "/static/schmatch.js";

static SCHMATCH_JS: &str = include_str!("../../static/schmatch.js");

// bump when the script changes
const SCHMATCH_JS_ETAG: &str = "\"schmatch-js-1\"";

pub fn schmatch_js(request_headers: &HeaderMap) -> Response<Full<Bytes>> {
    let etag = SCHMATCH_JS_ETAG.parse::<ETag>().ok();
    let not_modified = match (&etag, request_headers.typed_get::<IfNoneMatch>()) {
        (Some(etag), Some(if_none_match)) => !if_none_match.precondition_passes(etag),
        _ => false,
    };

    let mut response = if not_modified {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::NOT_MODIFIED;
        response
    } else {
        let mut response = Response::new(Full::new(Bytes::from_static(SCHMATCH_JS.as_bytes())));
        response
            .headers_mut()
            .typed_insert(ContentType::from(mime::TEXT_JAVASCRIPT));
        response
    };
    let headers = response.headers_mut();
    if let Some(etag) = etag {
        headers.typed_insert(etag);
    }
    headers.typed_insert(CacheControl::new().with_no_cache());
    response
}

#[cfg(test)]
mod tests {
    use http::header::{CONTENT_TYPE, ETAG, IF_NONE_MATCH};
    use http::HeaderValue;

    use super::*;

    #[test]
    fn serves_script_with_etag() {
        let response = schmatch_js(&HeaderMap::new());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(ETAG),
            Some(&HeaderValue::from_static(SCHMATCH_JS_ETAG))
        );
        assert_eq!(
            response.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("text/javascript"))
        );
    }

    #[test]
    fn matching_etag_is_not_modified() {
        let mut request_headers = HeaderMap::new();
        request_headers.insert(IF_NONE_MATCH, HeaderValue::from_static(SCHMATCH_JS_ETAG));
        assert_eq!(
            schmatch_js(&request_headers).status(),
            StatusCode::NOT_MODIFIED
        );

        request_headers.insert(IF_NONE_MATCH, HeaderValue::from_static("\"outdated\""));
        assert_eq!(schmatch_js(&request_headers).status(), StatusCode::OK);
    }
}
