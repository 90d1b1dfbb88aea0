use crate::severity::LogSeverity;
use crate::systime::now;
use parking_lot::Mutex;

/// Prints a line to stdout as `[SEVERITY] time message`.
pub fn log(msg: String, log_severity: LogSeverity) {
    println!("[{}] {} {}", log_severity, now(), msg);
}

/// Sink for diagnostics. The world and the packet handler hold one of these
/// instead of printing directly, so tests can capture what was reported.
pub trait Logger: Send + Sync {
    fn log(&self, msg: &str, severity: LogSeverity);

    fn debug(&self, msg: &str) {
        self.log(msg, LogSeverity::Debug);
    }

    fn info(&self, msg: &str) {
        self.log(msg, LogSeverity::Info);
    }

    fn warning(&self, msg: &str) {
        self.log(msg, LogSeverity::Warning);
    }

    fn error(&self, msg: &str) {
        self.log(msg, LogSeverity::Error);
    }
}

/// Writes to stdout through [`log`], dropping anything below `min_severity`.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleLogger {
    pub min_severity: LogSeverity,
}

impl ConsoleLogger {
    pub fn new(min_severity: LogSeverity) -> Self {
        ConsoleLogger { min_severity }
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        ConsoleLogger::new(LogSeverity::Info)
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str, severity: LogSeverity) {
        if severity >= self.min_severity {
            log(msg.to_string(), severity);
        }
    }
}

/// Keeps every entry in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogSeverity, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        MemoryLogger::default()
    }

    pub fn entries(&self) -> Vec<(LogSeverity, String)> {
        self.entries.lock().clone()
    }

    /// Messages logged at exactly `severity`.
    pub fn messages(&self, severity: LogSeverity) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(entry_severity, _)| *entry_severity == severity)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn contains(&self, severity: LogSeverity, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|(entry_severity, msg)| *entry_severity == severity && msg.contains(needle))
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, msg: &str, severity: LogSeverity) {
        self.entries.lock().push((severity, msg.to_string()));
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _msg: &str, _severity: LogSeverity) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_memory_logger_records_entries() {
        let logger = MemoryLogger::new();
        logger.warning("chunk missing");
        logger.debug("recount");

        assert_eq!(logger.entries().len(), 2);
        assert_eq!(logger.messages(LogSeverity::Warning), vec!["chunk missing".to_string()]);
        assert!(logger.contains(LogSeverity::Debug, "recount"));
        assert!(!logger.contains(LogSeverity::Error, "recount"));

        logger.clear();
        assert!(logger.entries().is_empty());
    }

    #[test]
    fn test_logger_as_trait_object() {
        let memory = Arc::new(MemoryLogger::new());
        let logger: Arc<dyn Logger> = memory.clone();
        logger.info("connected");
        assert!(memory.contains(LogSeverity::Info, "connected"));

        let null: Arc<dyn Logger> = Arc::new(NullLogger);
        null.error("ignored");
    }
}
