use serde::Deserialize;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Display for LogSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LogSeverity::Debug => write!(f, "DEBUG"),
            LogSeverity::Info => write!(f, "INFO"),
            LogSeverity::Warning => write!(f, "WARNING"),
            LogSeverity::Error => write!(f, "ERROR"),
            LogSeverity::Fatal => write!(f, "FATAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_severity_display() {
        assert_eq!(format!("{}", LogSeverity::Debug), "DEBUG");
        assert_eq!(format!("{}", LogSeverity::Info), "INFO");
        assert_eq!(format!("{}", LogSeverity::Warning), "WARNING");
        assert_eq!(format!("{}", LogSeverity::Error), "ERROR");
        assert_eq!(format!("{}", LogSeverity::Fatal), "FATAL");
    }

    #[test]
    fn test_log_severity_ordering() {
        assert!(LogSeverity::Debug < LogSeverity::Info);
        assert!(LogSeverity::Warning < LogSeverity::Error);
        assert!(LogSeverity::Fatal > LogSeverity::Error);
    }

    #[test]
    fn test_log_severity_deserialize() {
        let severity: LogSeverity = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(severity, LogSeverity::Warning);
        assert!(serde_json::from_str::<LogSeverity>("\"loud\"").is_err());
    }
}
