use std::sync::Arc;

use sampgdk_common::log::{GdkLog, LogLevel};

/// Where log records end up: the host's `logprintf` or anything else.
pub type LogSink = Arc<dyn Fn(&GdkLog) + Send + Sync>;

/// The default sink, writing `[sampgdk:<level>] <message>` to stderr.
pub fn stderr_sink() -> LogSink {
    Arc::new(|log: &GdkLog| eprintln!("{}", log))
}

/// Logger object.
#[derive(Clone)]
pub struct EnvLogger {
    level: LogLevel,
    sink: LogSink,
}

impl EnvLogger {
    pub(crate) fn new(level: LogLevel, sink: LogSink) -> Self {
        Self { level, sink }
    }

    pub(crate) fn set_sink(&mut self, sink: LogSink) {
        self.sink = sink;
    }

    /// Minimum level relayed to the sink.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    fn relay(&self, level: LogLevel, message: impl ToString, data: Option<Vec<u8>>) {
        if level < self.level {
            return;
        }

        let log = GdkLog {
            level,
            message: message.to_string(),
            data,
        };

        (self.sink)(&log);
    }

    /// Logs an error to the host.
    pub fn error(&self, message: impl ToString, data: Option<Vec<u8>>) {
        self.relay(LogLevel::Error, message, data)
    }

    /// Logs a warning to the host.
    pub fn warning(&self, message: impl ToString, data: Option<Vec<u8>>) {
        self.relay(LogLevel::Warning, message, data)
    }

    /// Logs an informational message to the host.
    pub fn info(&self, message: impl ToString, data: Option<Vec<u8>>) {
        self.relay(LogLevel::Info, message, data)
    }

    /// Logs a debug event to the host.
    pub fn debug(&self, message: impl ToString, data: Option<Vec<u8>>) {
        self.relay(LogLevel::Debug, message, data)
    }
}
