//! Classification of transport and HTTP failures

use lhub_core::SessionError;
use reqwest::StatusCode;

/// Errors from the client are the same ones the credential store sees when
/// validating a new profile.
pub type ClientError = SessionError;

/// Result type for client calls
pub type Result<T> = std::result::Result<T, ClientError>;

/// Longest response body kept in an error
const MAX_BODY: usize = 500;

/// Markers of certificate and TLS failures in error messages down the source chain
const TLS_MARKERS: [&str; 8] = [
    "certificate",
    "unknownissuer",
    "invalidcertificate",
    "notvalidforname",
    "self signed",
    "self-signed",
    "handshake",
    "tls",
];

/// Map a reqwest error onto the session error taxonomy
pub(crate) fn classify(host: &str, err: &reqwest::Error) -> ClientError {
    if is_tls_failure(err) {
        return SessionError::Ssl {
            host: host.to_string(),
            message: root_message(err),
        };
    }
    if err.is_connect() || err.is_timeout() {
        return SessionError::Connect {
            host: host.to_string(),
            message: root_message(err),
        };
    }
    if err.is_decode() {
        return SessionError::Decode {
            host: host.to_string(),
            message: err.to_string(),
        };
    }
    SessionError::Other(format!("Request to {} failed: {}", host, root_message(err)))
}

/// Map a non-success status onto an error
pub(crate) fn status_error(host: &str, status: StatusCode, body: &str) -> ClientError {
    let body = truncate(body.trim());
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return SessionError::Auth {
            host: host.to_string(),
            message: if body.is_empty() {
                status.to_string()
            } else {
                format!("{}: {}", status, body)
            },
        };
    }
    SessionError::Http {
        host: host.to_string(),
        status: status.as_u16(),
        body,
    }
}

/// Walk `err` and its sources looking for TLS or certificate failures
pub(crate) fn is_tls_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if TLS_MARKERS.iter().any(|m| text.contains(m)) {
            return true;
        }
        current = e.source();
    }
    false
}

fn root_message(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_BODY {
        return body.to_string();
    }
    let mut end = MAX_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Layer {
        msg: &'static str,
        source: Option<Box<Layer>>,
    }

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.msg)
        }
    }

    impl std::error::Error for Layer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.source.as_deref().map(|e| e as _)
        }
    }

    fn chain(messages: &[&'static str]) -> Layer {
        let mut layer: Option<Box<Layer>> = None;
        for msg in messages.iter().rev() {
            layer = Some(Box::new(Layer { msg: *msg, source: layer }));
        }
        *layer.unwrap()
    }

    #[test]
    fn test_tls_detected_deep_in_chain() {
        let err = chain(&[
            "error sending request",
            "client error (Connect)",
            "invalid peer certificate: UnknownIssuer",
        ]);
        assert!(is_tls_failure(&err));
        assert_eq!(root_message(&err), "invalid peer certificate: UnknownIssuer");
    }

    #[test]
    fn test_plain_connect_failure_is_not_tls() {
        let err = chain(&["error sending request", "Connection refused (os error 111)"]);
        assert!(!is_tls_failure(&err));
    }

    #[test]
    fn test_status_mapping() {
        assert!(status_error("h", StatusCode::UNAUTHORIZED, "").is_auth());
        assert!(status_error("h", StatusCode::FORBIDDEN, "nope").is_auth());

        let err = status_error("h", StatusCode::BAD_REQUEST, &"x".repeat(2000));
        match err {
            SessionError::Http { status, body, .. } => {
                assert_eq!(status, 400);
                assert!(body.len() <= MAX_BODY + 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
