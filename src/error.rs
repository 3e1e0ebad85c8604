use std::fmt;

use thiserror::Error;

/// Error raised by the [`CloudApi`](crate::api::CloudApi) collaborator.
///
/// The variants mirror the client's own error codes. The lifecycle never
/// matches on them directly; it goes through [`classify`] and acts on the
/// [`Outcome`].
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The session token was rejected mid-session.
    #[error("session no longer authorized: {0}")]
    Unauthorized(String),
    /// The cloud rejected the account credentials at login.
    #[error("login rejected: {0}")]
    Login(String),
    /// A request failed at the HTTP layer.
    #[error("http request failed: {0}")]
    Http(String),
    /// A request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The cloud sent a message the client could not make sense of.
    #[error("malformed message: {0}")]
    Protocol(String),
    /// Anything the client could not attribute.
    #[error("{0}")]
    Other(String),
}

/// Classification of a failed session operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The session token is dead; only a reconnect can help.
    Unauthorized,
    /// Transient network or server trouble; safe to retry in place.
    HttpTransient,
    /// The credentials themselves were rejected; retrying cannot help.
    LoginFailure,
    /// Unclassified failure; retried like a transient but logged loudly.
    Unknown,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Unauthorized => "unauthorized",
            Outcome::HttpTransient => "http-transient",
            Outcome::LoginFailure => "login-failure",
            Outcome::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Maps a session error to the outcome the lifecycle acts on.
///
/// Total over every [`SessionError`], present and future: variants the state
/// machine does not distinguish collapse to [`Outcome::Unknown`].
pub fn classify(error: &SessionError) -> Outcome {
    match error {
        SessionError::Unauthorized(_) => Outcome::Unauthorized,
        SessionError::Login(_) => Outcome::LoginFailure,
        SessionError::Http(_) => Outcome::HttpTransient,
        _ => Outcome::Unknown,
    }
}
