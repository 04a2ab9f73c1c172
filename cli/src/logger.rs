//! Stderr logger initialization, trimmed from the teacher's logger module: a `logforth`
//! dispatch with a UTC timestamp layout and an env-style filter string, no OTEL/fastrace/TUI
//! exporters since this binary has no distributed-tracing or terminal-UI surface to feed them.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::str::FromStr;

use jiff::tz::TimeZone;
use jiff::Zoned;
use logforth::append::Stderr;
use logforth::filter::EnvFilter;
use logforth::layout::Layout;

/// Initializes the global logger. `log_filter` is an env-style string, e.g. `"info"` or
/// `"proxy=debug,credentials=debug"`.
pub fn init(log_filter: &str) {
    let filter = EnvFilter::from_str(log_filter).unwrap_or_else(|_| EnvFilter::from_str("info").expect("default filter is valid"));

    let layout = if std::io::stderr().is_terminal() {
        UtcLayout::new()
    } else {
        UtcLayout::new().no_color()
    };

    logforth::builder()
        .dispatch(|d| d.filter(filter).append(Stderr::default().with_layout(layout)))
        .apply();
}

#[derive(Debug)]
struct UtcLayout {
    no_color: bool,
}

impl UtcLayout {
    fn new() -> Self {
        Self { no_color: false }
    }

    fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }
}

impl Layout for UtcLayout {
    fn format(
        &self,
        record: &log::Record<'_>,
        _diagnostics: &[Box<dyn logforth::diagnostic::Diagnostic>],
    ) -> anyhow::Result<Vec<u8>> {
        let mut output = String::new();
        let now = Zoned::now().with_time_zone(TimeZone::UTC);
        write!(output, "{} ", now.strftime("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = if self.no_color {
            format!("{:>5}", record.level())
        } else {
            match record.level() {
                log::Level::Error => format!("\x1b[31m{:>5}\x1b[0m", record.level()),
                log::Level::Warn => format!("\x1b[33m{:>5}\x1b[0m", record.level()),
                log::Level::Info => format!("\x1b[32m{:>5}\x1b[0m", record.level()),
                log::Level::Debug => format!("\x1b[34m{:>5}\x1b[0m", record.level()),
                log::Level::Trace => format!("\x1b[35m{:>5}\x1b[0m", record.level()),
            }
        };
        write!(output, "{level}  {}", record.args())?;

        Ok(output.into_bytes())
    }
}
