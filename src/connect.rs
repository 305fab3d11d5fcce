//! Error-wrapping call layer.
//!
//! [`try_connect`] is the boundary where failures become values: it awaits a
//! fallible future, catches panics, and turns every failure into
//! [`Response::Error`] with a readable message. Timeout-class failures get a
//! distinct `"Timeout error."` prefix; everything else is reported as
//! `"Unknown error."` with the full error chain attached.
//!
//! # Examples
//!
//! ```rust
//! use yomu::connect::try_connect;
//! use yomu::{Error, Response};
//!
//! # async fn example() {
//! let ok = try_connect("", async { Ok::<_, Error>(5) }).await;
//! assert_eq!(ok, Response::Success(5));
//!
//! let slow: Response<()> = try_connect("page: 2", async { Err(Error::timeout("read")) }).await;
//! assert!(slow.error_message().unwrap().starts_with("Timeout error."));
//! # }
//! ```

use futures::FutureExt;
use std::any::Any;
use std::fmt::Write as _;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::Response;

/// Prefix of messages produced for timeout-class failures.
pub const TIMEOUT_PREFIX: &str = "Timeout error.";

/// Prefix of messages produced for every other failure.
pub const UNKNOWN_PREFIX: &str = "Unknown error.";

/// Awaits `call` and wraps its outcome in a [`Response`].
///
/// `context` is extra diagnostic text (page number, URL) included in the
/// error message when it is not empty. Panics inside `call` are caught and
/// reported as unknown errors.
pub async fn try_connect<T, F>(context: &str, call: F) -> Response<T>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(data)) => Response::Success(data),
        Ok(Err(e)) => {
            warn!(context, error = %e, "wrapped call failed");
            Response::Error(error_message(context, &e))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(context, panic = %message, "wrapped call panicked");
            Response::Error(format!(
                "{}\n\n{}Message:\n{}\n\nStacktrace:\n<panic>",
                UNKNOWN_PREFIX,
                info_section(context),
                message
            ))
        }
    }
}

/// Blocking variant of [`try_connect`] for call sites outside any runtime.
///
/// Runs `call` to completion on a fresh current-thread runtime. Called from
/// inside an async context it returns an error value without running `call`.
pub fn try_connect_blocking<T, F>(context: &str, call: F) -> Response<T>
where
    F: Future<Output = Result<T>>,
{
    if tokio::runtime::Handle::try_current().is_ok() {
        warn!(context, "blocking call made from inside a runtime");
        let error = Error::Other("try_connect_blocking called from within an async runtime".to_string());
        return Response::Error(error_message(context, &error));
    }

    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(try_connect(context, call)),
        Err(e) => Response::Error(error_message(context, &Error::Io(e))),
    }
}

/// Formats the message [`try_connect`] stores for a failed call.
pub fn error_message(context: &str, error: &Error) -> String {
    if error.is_timeout() {
        format!(
            "{}\n\n{}Message:\n{}",
            TIMEOUT_PREFIX,
            info_section(context),
            error
        )
    } else {
        format!(
            "{}\n\n{}Message:\n{}\n\nStacktrace:\n{}",
            UNKNOWN_PREFIX,
            info_section(context),
            error,
            error_chain(error)
        )
    }
}

fn info_section(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("Info:\n{}\n\n", context)
    }
}

fn error_chain(error: &Error) -> String {
    let mut chain = format!("{:?}", error);
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let _ = write!(chain, "\ncaused by: {}", cause);
        source = cause.source();
    }
    chain
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
