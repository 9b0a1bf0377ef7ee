//! Styling for terminal output.
//!
//! Every command paints through [`paint`] so that `NO_COLOR` and
//! `MEMDUMP_COLOR` are honoured in one place.

use colored::{ColoredString, Colorize};

use super::OutputConfig;

/// What a piece of text is, as far as coloring goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// A file was written or a check passed (green)
    Success,
    /// Something was dropped or looks off (yellow)
    Warning,
    /// An address or a class name (cyan)
    Identifier,
    /// Nothing to show (dimmed)
    Muted,
    /// Report header (bold)
    Heading,
}

impl Style {
    fn apply(self, text: &str) -> ColoredString {
        match self {
            Self::Success => text.green(),
            Self::Warning => text.yellow(),
            Self::Identifier => text.cyan(),
            Self::Muted => text.dimmed(),
            Self::Heading => text.bold(),
        }
    }
}

/// Render `text` in `style`, or verbatim when colors are off.
#[must_use]
pub fn paint(text: &str, style: Style, config: &OutputConfig) -> String {
    if config.use_colors {
        style.apply(text).to_string()
    } else {
        text.to_string()
    }
}

/// Shorthand for [`Style::Success`].
#[must_use]
pub fn success(text: &str, config: &OutputConfig) -> String {
    paint(text, Style::Success, config)
}

/// Shorthand for [`Style::Warning`].
#[must_use]
pub fn warning(text: &str, config: &OutputConfig) -> String {
    paint(text, Style::Warning, config)
}
