//! Message-text classification for untyped client errors.
//!
//! Only used for errors a binding reports as [`ErrorKind::Unclassified`].

use super::ErrorKind;

const UNAUTHENTICATED: &[&str] = &["unauthenticated", "invalid api key", "invalid token"];
const NOT_FOUND: &[&str] = &["not found", "does not exist"];
const DEADLINE_EXCEEDED: &[&str] = &["deadline exceeded", "deadlineexceeded", "timed out"];
const COMPILATION: &[&str] = &["compilation error", "compilation failed"];

/// Classifies an error from its message text (case-insensitive).
///
/// # Example
///
/// ```
/// use shared::client::{classify::sniff, ErrorKind};
///
/// assert_eq!(sniff("rpc error: invalid API key"), ErrorKind::Unauthenticated);
/// assert_eq!(sniff("cluster abc does not exist"), ErrorKind::NotFound);
/// assert_eq!(sniff("connection reset by peer"), ErrorKind::Internal);
/// ```
#[must_use]
pub fn sniff(message: &str) -> ErrorKind {
    let message = message.to_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

    if contains_any(UNAUTHENTICATED) {
        ErrorKind::Unauthenticated
    } else if contains_any(COMPILATION) {
        ErrorKind::Compilation
    } else if contains_any(NOT_FOUND) {
        ErrorKind::NotFound
    } else if contains_any(DEADLINE_EXCEEDED) {
        ErrorKind::DeadlineExceeded
    } else {
        ErrorKind::Internal
    }
}
