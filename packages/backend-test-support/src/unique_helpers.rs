//! Unique ids so parallel tests never share sessions.

use uuid::Uuid;

/// `{prefix}-{uuid}`, usable as an `x-session-id`.
///
/// ```
/// use backend_test_support::unique_helpers::unique_session;
///
/// let a = unique_session("alice");
/// assert!(a.starts_with("alice-"));
/// assert_ne!(a, unique_session("alice"));
/// ```
pub fn unique_session(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

/// A display name that fits the 32 character limit.
pub fn unique_name(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &suffix[..8])
}
