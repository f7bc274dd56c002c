//src/logging.rs

use log::{Log, Metadata, Record};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// `[HH:MM:SS]` since the logger was installed.
fn elapsed_stamp() -> String {
    let secs = START_TIME.get_or_init(Instant::now).elapsed().as_secs();
    format!("[{:02}:{:02}:{:02}]", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn format_line(record: &Record<'_>) -> String {
    format!("{} {}: {}", elapsed_stamp(), record.level(), record.args())
}

/// Handle to every line the installed logger emitted so far.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

/// Writes through to env_logger and keeps a copy of each line it lets pass.
pub struct CapturingLogger {
    inner: env_logger::Logger,
    capture: LogCapture,
}

impl CapturingLogger {
    pub fn new(inner: env_logger::Logger) -> Self {
        Self {
            inner,
            capture: LogCapture::default(),
        }
    }

    pub fn capture(&self) -> LogCapture {
        self.capture.clone()
    }
}

impl Log for CapturingLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.inner.matches(record) {
            return;
        }
        self.capture.lines.lock().push(format_line(record));
        self.inner.log(record);
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the process logger: `[HH:MM:SS] LEVEL: message` on stderr,
/// filtered by `RUST_LOG` (default `info`), with every emitted line also
/// kept for the results document.
pub fn init_logger() -> Result<LogCapture, log::SetLoggerError> {
    START_TIME.get_or_init(Instant::now);

    let inner = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "{}", format_line(record)))
        .target(env_logger::Target::Stderr)
        .build();
    let max_level = inner.filter();

    let logger = CapturingLogger::new(inner);
    let capture = logger.capture();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);
    Ok(capture)
}
