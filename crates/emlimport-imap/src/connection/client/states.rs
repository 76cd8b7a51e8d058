//! Type-state markers for IMAP client connection states.

/// Marker type for the not-authenticated state.
///
/// In this state, only LOGIN and LOGOUT are offered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Marker type for the authenticated state.
///
/// In this state, mailbox operations (STATUS, APPEND) are valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;
