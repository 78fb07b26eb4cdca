
use crate::configuration::models::test_context_settings::TestContextSettings;
use env_filter::Filter;
use k8s_openapi::chrono::{DateTime, Utc};
use log::kv::{Error, Key, Value, VisitSource};
use log::{Log, Metadata, Record, SetLoggerError, set_boxed_logger, set_max_level};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

const TIMESTAMP_FORMAT: &str = "%b %e %H:%M:%S%.3f";

/// Writes log records as `<timestamp>: <LEVEL>: <message>` lines.
pub struct TestLogger {
    filter: Filter,
    writer: Mutex<Box<dyn Write + Send>>,
}

pub struct TestLoggerBuilder {
    filter: env_filter::Builder,
    writer: Option<Box<dyn Write + Send>>,
}

impl TestLogger {
    pub fn builder() -> TestLoggerBuilder {
        TestLoggerBuilder::new()
    }
}

impl Default for TestLoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLoggerBuilder {
    pub fn new() -> Self {
        TestLoggerBuilder {
            filter: env_filter::Builder::new(),
            writer: None,
        }
    }

    pub fn from_settings(settings: &TestContextSettings) -> Self {
        Self::new().parse(&settings.log_filter)
    }

    /// Filter directives such as `info,e2e_framework=debug`.
    pub fn parse(mut self, directives: &str) -> Self {
        self.filter.parse(directives);
        self
    }

    pub fn with_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Appends to `path`, creating the file if needed.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> std::io::Result<Self> {
        let file: File = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(self.with_writer(Box::new(file)))
    }

    pub fn build(mut self) -> TestLogger {
        TestLogger {
            filter: self.filter.build(),
            writer: Mutex::new(self.writer.unwrap_or_else(|| Box::new(std::io::stderr()))),
        }
    }

    pub fn init(self) -> Result<(), SetLoggerError> {
        let logger = self.build();
        let max_level = logger.filter.filter();
        set_boxed_logger(Box::new(logger))?;
        set_max_level(max_level);
        Ok(())
    }
}

struct KeyValueWriter(String);

impl<'kvs> VisitSource<'kvs> for KeyValueWriter {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), Error> {
        self.0.push_str(&format!(" {}={}", key, value));
        Ok(())
    }
}

pub fn format_record(timestamp: &DateTime<Utc>, record: &Record<'_>) -> String {
    let mut pairs = KeyValueWriter(String::new());
    // a failing visitor only loses the structured fields
    let _ = record.key_values().visit(&mut pairs);
    format!(
        "{}: {}: {}{}",
        timestamp.format(TIMESTAMP_FORMAT),
        record.level(),
        record.args(),
        pairs.0
    )
}

impl Log for TestLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.filter.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.filter.matches(record) {
            return;
        }
        let line = format_record(&Utc::now(), record);
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
