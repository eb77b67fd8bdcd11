use std::{future::Future, pin::Pin, time::Duration};

use log::warn;

use crate::booking_api::errors::BookingError;

/// Runs a call to a collaborator with an upper bound on how long it may take.
///
/// Errors from the call are converted into [`BookingError`]s. Running out of time is reported as an
/// `ExternalServiceError`, which callers treat exactly like any other failed step.
pub async fn bounded_call<T, E, F>(limit: Duration, what: &str, call: F) -> Result<T, BookingError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<BookingError>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            warn!("🔄️ {what} did not complete within {}ms", limit.as_millis());
            Err(BookingError::ExternalServiceError(format!("{what} timed out after {}ms", limit.as_millis())))
        },
    }
}

/// The result of waiting a limited time for a call that changes state in a collaborator.
pub enum Deadline<F: Future> {
    /// The call completed in time.
    Met(F::Output),
    /// The call is still running. It may yet succeed, so it is handed back to the caller rather than dropped.
    Missed(Pin<Box<F>>),
}

/// Like [`bounded_call`], but a call that overruns `limit` is not cancelled.
///
/// Dropping a half-finished write leaves the caller with no way of knowing whether it was applied. Callers that need
/// to undo writes should await the returned future before compensating, so that a late success is undone too.
pub async fn call_with_deadline<F: Future>(limit: Duration, call: F) -> Deadline<F> {
    let mut call = Box::pin(call);
    match tokio::time::timeout(limit, &mut call).await {
        Ok(output) => Deadline::Met(output),
        Err(_) => Deadline::Missed(call),
    }
}
