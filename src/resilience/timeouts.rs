//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Translate failures into forwarding errors
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout
//! - A request body that trips the size limit mid-stream is the client's fault (413)

use std::error::Error;
use std::future::Future;
use std::time::Duration;

use http_body_util::LengthLimitError;

use crate::http::response::ForwardError;

/// Await `fut` for at most `secs` seconds.
pub async fn with_deadline<F, T, E>(secs: u64, fut: F) -> Result<T, ForwardError>
where
    F: Future<Output = Result<T, E>>,
    E: Error + 'static,
{
    match tokio::time::timeout(Duration::from_secs(secs), fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) if body_limit_exceeded(&e) => Err(ForwardError::PayloadTooLarge),
        Ok(Err(e)) => Err(ForwardError::Connect(error_chain(&e))),
        Err(_) => Err(ForwardError::Timeout(secs)),
    }
}

/// Whether `err` or any of its sources is the request body limit.
fn body_limit_exceeded(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Render an error with all of its sources, `outer: inner: root`.
pub fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
