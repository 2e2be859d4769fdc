//! Diagnostic formatting.
//!
//! Errors reach users as plain text: a header naming the error class, a
//! `file:line:column` location, the message, and a source snippet with the
//! offending range underlined. Color escapes are only emitted when enabled.

use std::fmt;

use crate::ast::{SourceMap, Span};
use crate::eval::EvalError;
use crate::parser::ParseError;

/// ANSI color codes for terminal output
#[derive(Debug, Clone, Default)]
pub struct Colors {
    pub enabled: bool,
}

impl Colors {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn code(&self, code: &'static str) -> &'static str {
        if self.enabled {
            code
        } else {
            ""
        }
    }

    pub fn red(&self) -> &'static str {
        self.code("\x1b[31m")
    }

    pub fn cyan(&self) -> &'static str {
        self.code("\x1b[36m")
    }

    pub fn yellow(&self) -> &'static str {
        self.code("\x1b[33m")
    }

    pub fn bold(&self) -> &'static str {
        self.code("\x1b[1m")
    }

    pub fn reset(&self) -> &'static str {
        self.code("\x1b[0m")
    }
}

/// Configuration for error display
#[derive(Debug, Clone, Default)]
pub struct ErrorConfig {
    pub colors: Colors,
    pub filename: Option<String>,
}

impl ErrorConfig {
    pub fn new(use_color: bool) -> Self {
        Self {
            colors: Colors::new(use_color),
            filename: None,
        }
    }

    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }
}

/// Non-fatal conditions noticed while configuring or reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    ShadowingBuiltinOperator { op: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ShadowingBuiltinOperator { op } => {
                write!(f, "operator '{}' replaces a built-in operator", op)
            }
        }
    }
}

// ============================================================================
// "Did you mean?" suggestions
// ============================================================================

/// Levenshtein edit distance, computed one row at a time.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ca != *cb);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }

    row[b.len()]
}

/// Up to three candidates within `max_distance` of `name`, closest first.
pub fn find_similar<'a>(
    name: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    max_distance: usize,
) -> Vec<String> {
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|c| (levenshtein_distance(name, c), c))
        .filter(|&(dist, _)| dist > 0 && dist <= max_distance)
        .collect();
    scored.sort();
    scored.dedup();
    scored.into_iter().take(3).map(|(_, c)| c.to_string()).collect()
}

pub fn format_suggestions(suggestions: &[String], colors: &Colors) -> String {
    let quoted: Vec<String> = suggestions
        .iter()
        .map(|s| format!("{}{}{}", colors.bold(), s, colors.reset()))
        .collect();
    match quoted.as_slice() {
        [] => String::new(),
        [one] => format!("\n\nDid you mean {}?", one),
        many => format!("\n\nDid you mean one of: {}?", many.join(", ")),
    }
}

// ============================================================================
// Headers, locations, snippets
// ============================================================================

/// e.g. `-- SYNTAX ERROR --------------------------------------------------`
pub fn format_header(error_kind: &str, colors: &Colors) -> String {
    let dashes = "-".repeat(60usize.saturating_sub(error_kind.len() + 4));
    format!("{}-- {} {}{}", colors.cyan(), error_kind, dashes, colors.reset())
}

/// e.g. `prelude.sch:12:15`
pub fn format_location(
    filename: Option<&str>,
    span: &Span,
    source_map: &SourceMap,
    colors: &Colors,
) -> String {
    let pos = source_map.position(span.start);
    format!(
        "{}{}:{}{}",
        colors.bold(),
        filename.unwrap_or("<input>"),
        pos,
        colors.reset()
    )
}

/// The source line containing `span` with the span underlined:
///
/// ```text
/// 3 | define x = 1 + ;
///                    ^
/// ```
pub fn format_snippet(source_map: &SourceMap, span: &Span, colors: &Colors) -> String {
    let start = source_map.position(span.start);
    let end = source_map.position(span.end);
    let line_text = source_map.line(start.line).unwrap_or("");
    let gutter = start.line.to_string();

    let width = if start.line == end.line {
        end.column.saturating_sub(start.column).max(1)
    } else {
        1
    };
    let padding = " ".repeat(gutter.len() + 3 + start.column - 1);

    format!(
        "{}{} |{} {}\n{}{}{}{}",
        colors.cyan(),
        gutter,
        colors.reset(),
        line_text,
        padding,
        colors.red(),
        "^".repeat(width),
        colors.reset()
    )
}

/// Full text of a lexical or syntax error, as written to a reader's sink.
pub fn render_parse_error(err: &ParseError, source_map: &SourceMap, config: &ErrorConfig) -> String {
    let kind = match err {
        ParseError::Lex(_) => "LEXICAL ERROR",
        _ => "SYNTAX ERROR",
    };
    let colors = &config.colors;
    format!(
        "{}\n{}\n\n{}\n\n{}",
        format_header(kind, colors),
        format_location(config.filename.as_deref(), err.span(), source_map, colors),
        err,
        format_snippet(source_map, err.span(), colors)
    )
}

pub fn render_warning(warning: &Warning, colors: &Colors) -> String {
    format!("{}warning:{} {}", colors.yellow(), colors.reset(), warning)
}

/// Full text of a runtime error with optional suggestions.
pub fn render_eval_error(err: &EvalError, suggestions: &[String], colors: &Colors) -> String {
    format!(
        "{}\n\n{}{}",
        format_header("RUNTIME ERROR", colors),
        err,
        format_suggestions(suggestions, colors)
    )
}
