use workpass_core::error::{codes, AppError};

const BODY_SNIPPET_CHARS: usize = 400;

/// Maps a ureq failure into the shared error shape. HTTP 429 becomes
/// `AI_RATE_LIMITED` so retry policies can single it out; 5xx and transport
/// failures are marked retryable.
pub(crate) fn map_ureq_error(err: ureq::Error, code: &str, what: &str) -> AppError {
    match err {
        ureq::Error::Status(429, resp) => {
            let body = body_snippet(resp);
            AppError::new(codes::AI_RATE_LIMITED, format!("{what} was rate limited"))
                .with_details(format!("status=429; body={body}"))
                .with_retryable(true)
        }
        ureq::Error::Status(status, resp) => {
            let body = body_snippet(resp);
            AppError::new(code, format!("{what} failed"))
                .with_details(format!("status={status}; body={body}"))
                .with_retryable(status >= 500)
        }
        ureq::Error::Transport(t) => AppError::new(
            codes::AI_PROVIDER_UNREACHABLE,
            format!("Failed to reach provider for {what}"),
        )
        .with_details(t.to_string())
        .with_retryable(true),
    }
}

fn body_snippet(resp: ureq::Response) -> String {
    match resp.into_string() {
        Ok(body) => body.chars().take(BODY_SNIPPET_CHARS).collect(),
        Err(_) => "<body unavailable>".to_string(),
    }
}
