use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that abort startup before any session is spawned. Everything that
/// happens after pool start is absorbed by the per-session reconnect loop and
/// never surfaces here.
#[derive(Debug)]
pub enum StartupError {
    /// The entered access code is not exactly four digits. Rejected locally,
    /// no request is made to the gate server.
    CodeFormat,
    /// The gate server answered, but the code is unknown or disabled.
    GateDenied,
    GateUnreachable(reqwest::Error),
    CredentialsUnreadable { path: PathBuf, source: io::Error },
    Stdin(io::Error),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::CodeFormat => write!(f, "code must be 4 digits"),
            StartupError::GateDenied => write!(f, "wrong code or disabled, access denied"),
            StartupError::GateUnreachable(e) => {
                write!(f, "could not reach license server: {e}")
            }
            StartupError::CredentialsUnreadable { path, source } => {
                write!(f, "could not read credentials file {}: {source}", path.display())
            }
            StartupError::Stdin(e) => write!(f, "could not read access code: {e}"),
        }
    }
}

impl From<reqwest::Error> for StartupError {
    fn from(e: reqwest::Error) -> Self {
        StartupError::GateUnreachable(e)
    }
}
