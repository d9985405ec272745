use std::fmt;
use std::fmt::Write as _;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// ANSI color codes for console output
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_CYAN: &str = "\x1b[36m";
const COLOR_GREEN: &str = "\x1b[32m";
const COLOR_BRIGHT_YELLOW: &str = "\x1b[93m";
const COLOR_BRIGHT_RED: &str = "\x1b[91m";
const COLOR_BRIGHT_GRAY: &str = "\x1b[90m";

/// Column widths for alignment
const COMPONENT_WIDTH: usize = 20;
const LOG_LEVEL_WIDTH: usize = 7; // +2 for icons

/// Line formatter: `[timestamp] [component] [LEVEL] message key=value ...`
pub struct CarrierLogFormatter {
    service_name: String,
    color_enabled: bool,
}

/// Log with a `component` field
#[macro_export]
macro_rules! component_info {
    ($component:expr, $($arg:tt)*) => {
        tracing::info!(component = $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! component_warn {
    ($component:expr, $($arg:tt)*) => {
        tracing::warn!(component = $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! component_debug {
    ($component:expr, $($arg:tt)*) => {
        tracing::debug!(component = $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! component_error {
    ($component:expr, $($arg:tt)*) => {
        tracing::error!(component = $component, $($arg)*)
    };
}

impl CarrierLogFormatter {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            color_enabled: color_supported(),
        }
    }

    /// Events without a component fall back to the emitting crate, then the service name
    fn format_component(&self, component: Option<&str>, target: &str) -> String {
        let name = match component {
            Some(comp) => format!("carrier-{}", comp),
            None if target.starts_with("carrier_") => target
                .split("::")
                .next()
                .unwrap_or(target)
                .replace('_', "-"),
            None => self.service_name.clone(),
        };

        if name.chars().count() > COMPONENT_WIDTH {
            let truncated: String = name.chars().take(COMPONENT_WIDTH - 1).collect();
            format!("{}…", truncated)
        } else {
            format!("{:<width$}", name, width = COMPONENT_WIDTH)
        }
    }

    fn format_log_level(&self, level: &tracing::Level) -> String {
        let level_str = match *level {
            tracing::Level::ERROR => "✗ ERROR",
            tracing::Level::WARN => "⚠ WARN",
            tracing::Level::INFO => "ℹ INFO",
            tracing::Level::DEBUG => "◦ DEBUG",
            tracing::Level::TRACE => "◦ TRACE",
        };

        format!("{:<width$}", level_str, width = LOG_LEVEL_WIDTH + 2)
    }

    fn color_for_level(&self, level: &tracing::Level) -> &'static str {
        if !self.color_enabled {
            return "";
        }

        match *level {
            tracing::Level::ERROR => COLOR_BRIGHT_RED,
            tracing::Level::WARN => COLOR_BRIGHT_YELLOW,
            tracing::Level::INFO => COLOR_GREEN,
            tracing::Level::DEBUG | tracing::Level::TRACE => COLOR_BRIGHT_GRAY,
        }
    }
}

impl<S, N> FormatEvent<S, N> for CarrierLogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let metadata = event.metadata();
        let level = metadata.level();

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let component = self.format_component(visitor.component.as_deref(), metadata.target());
        let formatted_level = self.format_log_level(level);

        let color = self.color_for_level(level);
        let (reset, cyan, gray) = if self.color_enabled {
            (COLOR_RESET, COLOR_CYAN, COLOR_BRIGHT_GRAY)
        } else {
            ("", "", "")
        };

        write!(
            writer,
            "{}[{}] [{}] [{}{}{}] ",
            cyan, timestamp, component, color, formatted_level, reset
        )?;
        write!(writer, "{}", visitor.message)?;
        if !visitor.fields.is_empty() {
            write!(writer, " {}{}{}", gray, visitor.fields.trim_end(), reset)?;
        }
        writeln!(writer)
    }
}

/// Collects the message, the component, and every other field as `key=value`
#[derive(Default)]
struct FieldVisitor {
    message: String,
    component: Option<String>,
    fields: String,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            "component" => self.component = Some(unquote(&format!("{:?}", value)).to_string()),
            name => {
                let _ = write!(self.fields, "{}={:?} ", name, value);
            }
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "component" => self.component = Some(value.to_string()),
            name => {
                let _ = write!(self.fields, "{}={} ", name, value);
            }
        }
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

/// Colors unless `NO_COLOR` is set or the terminal is dumb or unknown
fn color_supported() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    match std::env::var("TERM") {
        Ok(term) => term != "dumb",
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> CarrierLogFormatter {
        CarrierLogFormatter {
            service_name: "pngcarrier".to_string(),
            color_enabled: false,
        }
    }

    #[test]
    fn test_component_names() {
        let f = plain();
        assert_eq!(f.format_component(Some("pack"), "pngcarrier").trim_end(), "carrier-pack");
        assert_eq!(
            f.format_component(None, "carrier_codec::decoder").trim_end(),
            "carrier-codec"
        );
        assert_eq!(f.format_component(None, "pngcarrier").trim_end(), "pngcarrier");
        assert_eq!(f.format_component(None, "pngcarrier").len(), COMPONENT_WIDTH);
    }

    #[test]
    fn test_long_component_truncated() {
        let name = plain().format_component(Some("a-very-long-component-name"), "pngcarrier");
        assert_eq!(name.chars().count(), COMPONENT_WIDTH);
        assert!(name.ends_with('…'));
    }

    #[test]
    fn test_no_color_codes_when_disabled() {
        assert_eq!(plain().color_for_level(&tracing::Level::ERROR), "");
        assert_eq!(plain().format_log_level(&tracing::Level::WARN).trim_end(), "⚠ WARN");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"pack\""), "pack");
        assert_eq!(unquote("pack"), "pack");
    }
}
