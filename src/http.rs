//! Shared blocking HTTP plumbing for the knowledge-base clients.
//!
//! One [`reqwest::blocking::Client`] is built per run from `[http]` and
//! handed to each client explicitly. There is no retry and no rate limiting:
//! a failed request aborts the pass.

use anyhow::Result;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::config::HttpConfig;

/// Failure talking to an external service.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{service} request to {url} failed: {source}")]
    Transport {
        service: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status} for {url}: {body}")]
    Status {
        service: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("{service} returned a malformed response: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },
}

pub fn build_client(http: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(http.timeout_secs))
        .user_agent(http.user_agent.clone())
        .build()?;
    Ok(client)
}

/// GET `url` with `query` and return the body.
///
/// HTTP 404 maps to `Ok(None)`; every other non-2xx status is an error.
pub fn get_text(
    client: &Client,
    service: &'static str,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Option<String>, LookupError> {
    tracing::debug!(service, url, ?query, "GET");

    let resp = client
        .get(url)
        .query(query)
        .send()
        .map_err(|source| LookupError::Transport {
            service,
            url: url.to_string(),
            source,
        })?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(LookupError::Status {
            service,
            url: url.to_string(),
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        });
    }

    let body = resp.text().map_err(|source| LookupError::Transport {
        service,
        url: url.to_string(),
        source,
    })?;
    Ok(Some(body))
}

/// Like [`get_text`], decoding the body as JSON.
pub fn get_json(
    client: &Client,
    service: &'static str,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Option<serde_json::Value>, LookupError> {
    match get_text(client, service, url, query)? {
        Some(body) => serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| LookupError::Malformed {
                service,
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve one canned response on a local port. The handle yields the
    /// request line that was received.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/entity", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            let request = String::from_utf8_lossy(&request).into_owned();
            request.lines().next().unwrap_or_default().to_string()
        });
        (url, handle)
    }

    fn client() -> Client {
        Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[test]
    fn client_builds_from_default_config() {
        assert!(build_client(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn success_returns_body_and_sends_query() {
        let (url, server) = serve_once("200 OK", "hello");
        let body = get_text(&client(), "test", &url, &[("query", "nid=118")]).unwrap();
        assert_eq!(body.as_deref(), Some("hello"));
        let request_line = server.join().unwrap();
        assert!(request_line.starts_with("GET /entity?query=nid%3D118 "));
    }

    #[test]
    fn not_found_is_none() {
        let (url, server) = serve_once("404 Not Found", "no such entity");
        let body = get_text(&client(), "test", &url, &[]).unwrap();
        assert!(body.is_none());
        server.join().unwrap();

        let (url, server) = serve_once("404 Not Found", "no such entity");
        assert!(get_json(&client(), "test", &url, &[]).unwrap().is_none());
        server.join().unwrap();
    }

    #[test]
    fn server_error_carries_status_and_truncated_body() {
        let long_body = "x".repeat(800);
        let (url, server) = serve_once("500 Internal Server Error", &long_body);
        let err = get_text(&client(), "test", &url, &[]).unwrap_err();
        server.join().unwrap();
        match err {
            LookupError::Status {
                service,
                status,
                body,
                ..
            } => {
                assert_eq!(service, "test");
                assert_eq!(status, 500);
                assert_eq!(body.len(), 500);
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_malformed() {
        let (url, server) = serve_once("200 OK", "<html>maintenance</html>");
        let err = get_json(&client(), "wikidata", &url, &[]).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, LookupError::Malformed { service: "wikidata", .. }));
    }

    #[test]
    fn json_body_is_decoded() {
        let (url, server) = serve_once("200 OK", r#"{"entities":{}}"#);
        let json = get_json(&client(), "wikidata", &url, &[]).unwrap().unwrap();
        server.join().unwrap();
        assert!(json["entities"].is_object());
    }
}
