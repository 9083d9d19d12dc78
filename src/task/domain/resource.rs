//! Loading/success/error envelope for asynchronous task operations.

use futures::StreamExt;
use futures::stream::BoxStream;

/// Observable state of an asynchronous operation.
///
/// Per operation cycle a stream of these carries zero or more `Loading`
/// values and exactly one terminal `Success` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
    /// Progress marker; `true` when work starts, `false` when it ends.
    Loading(bool),
    /// Terminal success carrying the operation's value.
    Success(T),
    /// Terminal failure carrying a short user-facing message.
    Error(String),
}

impl<T> Resource<T> {
    /// Returns `true` for `Success` and `Error`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            Self::Loading(_) | Self::Success(_) => None,
        }
    }

    /// Converts a terminal value into a `Result`; `Loading` yields `None`.
    #[must_use]
    pub fn into_outcome(self) -> Option<Result<T, String>> {
        match self {
            Self::Loading(_) => None,
            Self::Success(value) => Some(Ok(value)),
            Self::Error(message) => Some(Err(message)),
        }
    }
}

/// Boxed stream of [`Resource`] values returned by every task service.
pub type ResourceStream<T> = BoxStream<'static, Resource<T>>;

/// Drives a resource stream to its first terminal value and drops the rest.
///
/// Returns `None` when the stream ends without a terminal value.
pub async fn first_outcome<T>(mut stream: ResourceStream<T>) -> Option<Result<T, String>> {
    while let Some(item) = stream.next().await {
        if let Some(outcome) = item.into_outcome() {
            return Some(outcome);
        }
    }
    None
}
