use std::fmt::Display;

use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, SetLoggerError};

/// Verbosity of cabline's own records, other crates are always limited to warnings
pub const LOG_LEVEL_VAR: &str = "CABLINE_LOG";

const LOCAL_CRATES: [&str; 3] = ["cabline", "cabline_core", "cabline_server"];

pub fn init_logger() -> Result<(), SetLoggerError> {
    let verbosity = verbosity(std::env::var(LOG_LEVEL_VAR).ok().as_deref());

    let dispatch = LOCAL_CRATES.iter().fold(
        fern::Dispatch::new().level(LevelFilter::Warn),
        |dispatch, name| dispatch.level_for(*name, verbosity),
    );

    dispatch
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {} {:<6} {}",
                badge(record.level()),
                chrono::Local::now().format("%H:%M:%S").to_string().bright_black(),
                Area::of(record.target()),
                message
            ))
        })
        .chain(std::io::stdout())
        .apply()
}

/// Unset or unparseable values fall back to info
fn verbosity(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// The part of cabline a record comes from
#[derive(Debug, PartialEq)]
enum Area {
    App,
    Http,
    Gate,
    Auth,
    Store,
    Core,
    External(String),
}

impl Area {
    fn of(target: &str) -> Self {
        let mut path = target.split("::");

        match (path.next(), path.next()) {
            (Some("cabline"), _) => Self::App,
            (Some("cabline_server"), Some("gate")) => Self::Gate,
            (Some("cabline_server" | "cabline_core"), Some("auth")) => Self::Auth,
            (Some("cabline_server"), _) => Self::Http,
            (Some("cabline_core"), Some("db")) => Self::Store,
            (Some("cabline_core"), _) => Self::Core,
            (name, _) => Self::External(name.unwrap_or_default().to_string()),
        }
    }

    fn label(&self) -> ColoredString {
        match self {
            Self::App => "APP".bright_yellow(),
            Self::Http => "HTTP".bright_green(),
            Self::Gate => "GATE".bright_magenta(),
            Self::Auth => "AUTH".bright_cyan(),
            Self::Store => "STORE".blue(),
            Self::Core => "CORE".blue(),
            Self::External(name) => name.as_str().dimmed(),
        }
    }
}

impl Display for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.label(), f)
    }
}

fn badge(level: Level) -> ColoredString {
    match level {
        Level::Error => " ERR ".black().on_red().bold(),
        Level::Warn => " WRN ".black().on_yellow().bold(),
        Level::Info => " INF ".black().on_blue().bold(),
        Level::Debug => " DBG ".white().on_black(),
        Level::Trace => " TRC ".normal(),
    }
}
