//! Error classification shared by all services.
//!
//! Each layer has its own `thiserror` enum; they all report one of these
//! kinds so the presentation layer can render failures uniformly.

use core::fmt;

/// How a failed user action should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected locally before any remote call.
    Validation,
    /// An email-based lookup found nothing.
    LookupMiss,
    /// The remote service answered with an error; its message is shown verbatim.
    RemoteRejection,
    /// Transport failure or an unreadable response.
    Network,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::LookupMiss => write!(f, "lookup-miss"),
            Self::RemoteRejection => write!(f, "remote-rejection"),
            Self::Network => write!(f, "network"),
        }
    }
}
