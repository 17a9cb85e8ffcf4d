// src/fetch.rs
use reqwest::blocking::Client;
use std::time::Instant;
use tracing::info;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("GET {url}: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
}

/// GET `url` and return the whole body. One request, no retry.
pub fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let request_err = |source: reqwest::Error| FetchError::Request {
        url: url.to_string(),
        source,
    };

    let start = Instant::now();
    let bytes = client
        .get(parsed)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes())
        .map_err(request_err)?;
    info!(url, size = bytes.len(), elapsed = ?start.elapsed(), "downloaded");

    Ok(bytes.to_vec())
}


#[cfg(test)]
mod tests {
    use super::testing::serve_once;
    use super::*;

    #[test]
    fn returns_the_response_body() {
        let url = serve_once("200 OK", b"workbook bytes".to_vec());
        let bytes = fetch_bytes(&Client::new(), &url).unwrap();
        assert_eq!(bytes, b"workbook bytes");
    }

    #[test]
    fn error_status_is_a_request_error() {
        let url = serve_once("404 Not Found", b"no such indicator".to_vec());
        let err = fetch_bytes(&Client::new(), &url).unwrap_err();
        match err {
            FetchError::Request { url: failed, source } => {
                assert_eq!(failed, url);
                assert_eq!(source.status(), Some(reqwest::StatusCode::NOT_FOUND));
            }
            other => panic!("expected a request error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_url_is_rejected_before_any_request() {
        let client = Client::new();
        let err = fetch_bytes(&client, "not a url").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn unreachable_host_is_a_request_error() {
        let client = Client::new();
        // Port 9 on localhost (discard) is closed on any sane test box.
        let err = fetch_bytes(&client, "http://127.0.0.1:9/indicator.xls").unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }

    #[test]
    #[ignore = "needs network access"]
    fn downloads_gdp_workbook() {
        let client = Client::new();
        let bytes = fetch_bytes(
            &client,
            "https://api.worldbank.org/v2/en/indicator/NY.GDP.MKTP.KD.ZG?downloadformat=excel",
        )
        .unwrap();
        assert!(!bytes.is_empty());
    }
}
