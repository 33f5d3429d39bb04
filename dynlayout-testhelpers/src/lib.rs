#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub use color_eyre::eyre;
pub use dynlayout_testhelpers_macros::test;

use log::{Level, LevelFilter, Log, Metadata, Record};
use owo_colors::{OwoColorize, Style};
use std::io::Write;
use std::sync::Once;

/// Environment variable that picks the log level for tests
pub const LOG_LEVEL_VAR: &str = "DYNLAYOUT_LOG";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level_style = match record.level() {
            Level::Error => Style::new().red().bold(),
            Level::Warn => Style::new().yellow(),
            Level::Info => Style::new().green(),
            Level::Debug => Style::new().blue(),
            Level::Trace => Style::new().cyan(),
        };

        eprintln!(
            "{:>5} {}: {}",
            record.level().style(level_style),
            record.target().dimmed(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Reads [`LOG_LEVEL_VAR`]; unset or unrecognized values mean `Trace`.
fn level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_VAR)
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Trace)
}

/// Installs color-eyre and color-backtrace (except on miri), and sets up the logger.
///
/// Safe to call from every test: only the first call does anything.
pub fn setup() {
    static SETUP: Once = Once::new();
    SETUP.call_once(|| {
        #[cfg(not(miri))]
        install_hooks();

        // Another logger may already be installed by the test binary
        if log::set_boxed_logger(Box::new(StderrLogger)).is_ok() {
            log::set_max_level(level_from_env());
        }
    });
}

#[cfg(not(miri))]
fn install_hooks() {
    use color_eyre::config::HookBuilder;
    use regex::Regex;
    use std::sync::LazyLock;

    /// Frames from the panic machinery and the test runner, which only get in the way.
    static IGNORE_FRAMES: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^(std::panic|core::panic|test::run_test|test::__rust_begin_short_backtrace|std::sys::(pal|backtrace)|std::thread::Builder|core::ops::function|<core::panic::|<alloc::boxed::Box<F,A> as core::ops::function::FnOnce<Args>>::call_once)")
            .expect("frame filter regex is valid")
    });

    let eyre_filter = move |frames: &mut Vec<&color_eyre::config::Frame>| {
        frames.retain(|frame| {
            frame
                .name
                .as_ref()
                .is_none_or(|name| !IGNORE_FRAMES.is_match(&name.to_string()))
        });
    };
    // Fails only if a hook is already in place, which is fine
    let _ = HookBuilder::default()
        .add_frame_filter(Box::new(eyre_filter))
        .install();

    let backtrace_filter = move |frames: &mut Vec<&color_backtrace::Frame>| {
        frames.retain(|frame| {
            frame
                .name
                .as_ref()
                .is_none_or(|name| !IGNORE_FRAMES.is_match(name))
        });
    };
    let stderr = color_backtrace::termcolor::StandardStream::stderr(
        color_backtrace::termcolor::ColorChoice::Auto,
    );
    color_backtrace::BacktracePrinter::new()
        .add_frame_filter(Box::new(backtrace_filter))
        .install(Box::new(stderr));
}
