pub mod log;
pub mod severity;
pub mod systime;

pub use log::{log, ConsoleLogger, Logger, MemoryLogger, NullLogger};
pub use severity::LogSeverity;
