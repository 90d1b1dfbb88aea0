use std::error::Error;
use std::fmt;

/// Errors that cross the client boundary: transport failures, undecodable
/// packets that the connection gave up on, bad configuration.
#[derive(Debug)]
pub enum StrataError {
    IoError(std::io::Error),
    ProtocolError(String),
    ConnectionError(String),
    ConfigError(String),
}

impl fmt::Display for StrataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrataError::IoError(err) => write!(f, "IO error: {}", err),
            StrataError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            StrataError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            StrataError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl Error for StrataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StrataError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StrataError {
    fn from(err: std::io::Error) -> Self {
        StrataError::IoError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_display() {
        let err = StrataError::ProtocolError("bad packet".to_string());
        assert_eq!(err.to_string(), "Protocol error: bad packet");

        let err = StrataError::ConfigError("missing port".to_string());
        assert_eq!(err.to_string(), "Config error: missing port");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: StrataError = io.into();
        assert_matches!(err, StrataError::IoError(_));
        assert!(err.source().is_some());
    }
}
