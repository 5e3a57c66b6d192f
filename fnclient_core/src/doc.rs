//! Line-oriented parser for tool documentation blocks.
//!
//! ```text
//! Gets the weather                         <- summary (first non-blank line)
//! location: where to get the forecast for  <- parameter description
//! Anything else is ignored.
//! ```

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static PARAM_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\w+):\s*(.*)$").expect("parameter line pattern is valid")
});

/// Summary and per-parameter descriptions extracted from a doc block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDoc {
    /// First non-blank line, trimmed. Empty when there is no documentation.
    pub summary: String,
    /// Parameter name to description, in the order they appear.
    pub parameters: IndexMap<String, String>,
}

impl ParsedDoc {
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// Parses a documentation block. `None` and blank input yield an empty
/// [`ParsedDoc`].
pub fn parse_doc(doc: Option<&str>) -> ParsedDoc {
    let mut lines = doc
        .unwrap_or_default()
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty());

    let Some(summary) = lines.next() else {
        return ParsedDoc::default();
    };

    let mut parameters = IndexMap::new();
    for line in lines {
        let Some(caps) = PARAM_LINE.captures(line) else {
            continue;
        };
        let text = caps[2].trim();
        if text.is_empty() {
            continue;
        }
        parameters.insert(caps[1].to_owned(), text.to_owned());
    }

    ParsedDoc {
        summary: summary.trim().to_owned(),
        parameters,
    }
}
