//! Output formatting shared by the command-line tool
//!
//! Records are rendered either as tables (through `tabled`, behind the
//! `display` feature) or as JSON in one of three layouts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default maximum length for free-text columns in tables
pub const DEFAULT_TEXT_MAX_LEN: usize = 40;

/// Unified output format for all commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty table with borders (default)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// Compact JSON (a single array)
    Json,
    /// Pretty-printed JSON with indentation
    JsonPretty,
    /// JSON Lines format (one JSON object per line)
    JsonLine,
}

impl OutputFormat {
    /// Check if this is a JSON variant
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty | Self::JsonLine)
    }

    /// Get a list of all format names for help text
    pub fn all_names() -> &'static [&'static str] {
        &["table", "markdown", "json", "json-pretty", "json-line"]
    }

    /// Render a list of serializable items as JSON
    ///
    /// Returns `None` for table formats.
    pub fn render_json<T: Serialize>(&self, items: &[T]) -> Option<serde_json::Result<String>> {
        match self {
            Self::Json => Some(serde_json::to_string(items)),
            Self::JsonPretty => Some(serde_json::to_string_pretty(items)),
            Self::JsonLine => Some(
                items
                    .iter()
                    .map(serde_json::to_string)
                    .collect::<serde_json::Result<Vec<_>>>()
                    .map(|lines| lines.join("\n")),
            ),
            Self::Table | Self::Markdown => None,
        }
    }

    /// Render items as a table
    ///
    /// Returns `None` for JSON formats.
    #[cfg(feature = "display")]
    pub fn render_table<T: tabled::Tabled>(&self, rows: &[T]) -> Option<String> {
        use tabled::settings::Style;
        use tabled::Table;

        match self {
            Self::Table => Some(Table::new(rows).with(Style::rounded()).to_string()),
            Self::Markdown => Some(Table::new(rows).with(Style::markdown()).to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
            Self::JsonLine => write!(f, "json-line"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            "json-line" | "jsonline" | "jsonl" | "ndjson" => Ok(Self::JsonLine),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}

/// Truncate a string to the specified length, adding "..." if truncated
///
/// # Examples
///
/// ```
/// use rowstore::output::truncate_text;
///
/// assert_eq!(truncate_text("Short", 20), "Short");
/// assert_eq!(truncate_text("This is a very long comment", 20), "This is a very lo...");
/// ```
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Display an optional value, using an empty cell for `None`
pub fn display_optional<T: fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(
            "table".parse::<OutputFormat>().unwrap(),
            OutputFormat::Table
        );
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!(
            "jsonl".parse::<OutputFormat>().unwrap(),
            OutputFormat::JsonLine
        );
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_json_line() {
        #[derive(Serialize)]
        struct Item {
            n: u32,
        }

        let out = OutputFormat::JsonLine
            .render_json(&[Item { n: 1 }, Item { n: 2 }])
            .unwrap()
            .unwrap();
        assert_eq!(out, "{\"n\":1}\n{\"n\":2}");
        assert!(OutputFormat::Table.render_json(&[Item { n: 1 }]).is_none());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 3), "abc");
        assert_eq!(truncate_text("abcdef", 5), "ab...");
    }

    #[test]
    fn test_display_optional() {
        assert_eq!(display_optional(&Some(3)), "3");
        assert_eq!(display_optional::<String>(&None), "");
    }
}
