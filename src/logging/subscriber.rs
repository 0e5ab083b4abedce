//! Tracing subscriber setup: console formatter, optional file layer, and
//! initialisation.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use super::{PHASE_TARGET, STAGE_TARGET};

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn event_message(event: &tracing::Event<'_>) -> String {
    let mut extractor = MessageExtractor::default();
    event.record(&mut extractor);
    extractor.message
}

/// Render one console line (without the trailing newline).
///
/// Phase events get a coloured tag derived from the message's leading word,
/// so `"green: proceed"` is shown as a green `GREEN` badge.
pub(super) fn render_console(level: tracing::Level, target: &str, msg: &str) -> String {
    match level {
        tracing::Level::ERROR => format!("\x1b[31mERROR\x1b[0m {msg}"),
        tracing::Level::WARN => format!("\x1b[33mWARN\x1b[0m  {msg}"),
        tracing::Level::INFO if target == STAGE_TARGET => {
            format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m")
        }
        tracing::Level::INFO if target == PHASE_TARGET => {
            let colour = if msg.starts_with("green") { "32" } else { "31" };
            let (tag, rest) = msg.split_once(':').unwrap_or((msg, ""));
            format!(
                "  \x1b[1;{colour}m{:<5}\x1b[0m{rest}",
                tag.to_ascii_uppercase()
            )
        }
        tracing::Level::INFO => format!("  {msg}"),
        _ => format!("  \x1b[2m{msg}\x1b[0m"),
    }
}

/// Render one plain log-file line (without the trailing newline).
pub(super) fn render_file(
    elapsed_ms: u128,
    level: tracing::Level,
    target: &str,
    msg: &str,
) -> String {
    let ts = format!("+{elapsed_ms:>8}ms");
    match (level, target) {
        (tracing::Level::INFO, t) if t == STAGE_TARGET => format!("[{ts}] ==> {msg}"),
        (tracing::Level::INFO, t) if t == PHASE_TARGET => format!("[{ts}]     [phase] {msg}"),
        (tracing::Level::ERROR, _) => format!("[{ts}]     [error] {msg}"),
        (tracing::Level::WARN, _) => format!("[{ts}]     [warn] {msg}"),
        (tracing::Level::DEBUG | tracing::Level::TRACE, _) => {
            format!("[{ts}]     [debug] {msg}")
        }
        _ => format!("[{ts}]     {msg}"),
    }
}

/// A [`tracing_subscriber::Layer`] that appends every event to a log file
/// with the elapsed time since the layer was created.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
    start: Instant,
}

impl FileLayer {
    /// Create (truncating) the log file at `path` and write a run header.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be written.
    pub(super) fn new(path: &Path) -> std::io::Result<Self> {
        let version =
            option_env!("SIGNAL_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let header = format!(
            "==========================================\n\
             traffic-signal {version}\n\
             ==========================================\n",
        );
        fs::write(path, header)?;
        let file = fs::OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            start: Instant::now(),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let line = render_file(
            self.start.elapsed().as_millis(),
            *metadata.level(),
            metadata.target(),
            &event_message(event),
        );
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that emits signal-style
/// console output.
struct SignalFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for SignalFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let line = render_console(*metadata.level(), metadata.target(), &event_message(event));
        writeln!(writer, "{line}")
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Console output goes to stdout (`INFO` and below) and stderr (`WARN` and
/// above).  The console level is `DEBUG` when `verbose` is set and `INFO`
/// otherwise; a `RUST_LOG` directive overrides both.  When `log_file` is
/// given, every event at `DEBUG` and above is also appended there; if the
/// file cannot be created a warning is logged to the console instead.
/// Must be called once at program startup, before any logging.
pub fn init_subscriber(verbose: bool, log_file: Option<&Path>) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(SignalFormatter)
        .with_writer(make_writer)
        .with_filter(console_filter);

    let (file_layer, file_error) = match log_file.map(FileLayer::new) {
        Some(Ok(layer)) => (Some(layer.with_filter(LevelFilter::DEBUG)), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    if let (Some(path), Some(e)) = (log_file, file_error) {
        tracing::warn!("cannot write log file {}: {e}", path.display());
    }
}
