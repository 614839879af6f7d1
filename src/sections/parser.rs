//! Splits one raw model response into named sections.
//!
//! Parsing is total: a section that cannot be located maps to an empty
//! string and the reason is recorded as a [`ParseWarning`]. Callers that only
//! care about bodies can ignore the warnings entirely.

use crate::sections::schema::Extraction;
use regex::Regex;
use serde::Serialize;
use std::fmt;

const FENCE: &str = "```";

/// The literal delimiter preceding a section, e.g. `--- HTML ---`.
pub fn delimiter(name: &str) -> String {
    format!("--- {} ---", name)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// No `--- NAME ---` delimiter anywhere in the text.
    DelimiterMissing { section: String },
    /// The delimiter exists but the following section's delimiter never appears after it.
    BoundaryMissing { section: String, next: String },
    /// The delimiter exists but is not followed by a complete fenced block.
    FenceMissing { section: String },
    /// The delimiter appears more than once; only the first usable one was honored.
    DuplicateDelimiter { section: String, occurrences: usize },
    /// The section was located but contains only whitespace.
    EmptyBody { section: String },
}

impl ParseWarning {
    pub fn section(&self) -> &str {
        match self {
            ParseWarning::DelimiterMissing { section }
            | ParseWarning::BoundaryMissing { section, .. }
            | ParseWarning::FenceMissing { section }
            | ParseWarning::DuplicateDelimiter { section, .. }
            | ParseWarning::EmptyBody { section } => section,
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::DelimiterMissing { section } => {
                write!(f, "{}: delimiter '{}' not found", section, delimiter(section))
            }
            ParseWarning::BoundaryMissing { section, next } => write!(
                f,
                "{}: next delimiter '{}' not found after it, section dropped",
                section,
                delimiter(next)
            ),
            ParseWarning::FenceMissing { section } => {
                write!(f, "{}: delimiter not followed by a closed ``` fence", section)
            }
            ParseWarning::DuplicateDelimiter {
                section,
                occurrences,
            } => write!(
                f,
                "{}: delimiter appears {} times, later copies ignored",
                section, occurrences
            ),
            ParseWarning::EmptyBody { section } => write!(f, "{}: section is empty", section),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedSection {
    pub name: String,
    pub body: String,
}

/// Section bodies in schema order. Every requested name is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedSections {
    sections: Vec<ParsedSection>,
    warnings: Vec<ParseWarning>,
}

impl ParsedSections {
    /// Build a mapping directly, e.g. from bodies produced elsewhere.
    pub fn from_pairs<I, N, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, B)>,
        N: Into<String>,
        B: Into<String>,
    {
        let sections = pairs
            .into_iter()
            .map(|(name, body)| ParsedSection {
                name: name.into(),
                body: body.into(),
            })
            .collect();

        Self {
            sections,
            warnings: Vec::new(),
        }
    }

    /// Body for `name`, or `""` when the name is unknown or the section was absent.
    pub fn get(&self, name: &str) -> &str {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.body.as_str())
            .unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections
            .iter()
            .map(|s| (s.name.as_str(), s.body.as_str()))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// True when no section has any non-whitespace content.
    pub fn all_blank(&self) -> bool {
        self.sections.iter().all(|s| s.body.trim().is_empty())
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }
}

/// Parse `text` for the ordered `names`, every section using the same rule.
pub fn parse_sections(text: &str, names: &[&str], fenced: bool) -> ParsedSections {
    let extraction = Extraction::from_fenced(fenced);
    let layout: Vec<(&str, Extraction)> = names.iter().map(|n| (*n, extraction)).collect();
    parse_layout(text, &layout)
}

/// Parse `text` for an ordered list of `(name, rule)` pairs.
pub fn parse_layout(text: &str, layout: &[(&str, Extraction)]) -> ParsedSections {
    let mut sections = Vec::with_capacity(layout.len());
    let mut warnings = Vec::new();

    for (i, (name, extraction)) in layout.iter().enumerate() {
        let marker = delimiter(name);
        let occurrences = text.matches(marker.as_str()).count();

        let located = match extraction {
            Extraction::Plain => {
                let next = layout.get(i + 1).map(|(n, _)| *n);
                locate_plain(text, &marker, next)
            }
            Extraction::Fenced => locate_fenced(text, name, occurrences),
        };

        let body = match located {
            Located::Found(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    warnings.push(ParseWarning::EmptyBody {
                        section: name.to_string(),
                    });
                }
                trimmed.to_string()
            }
            Located::DelimiterMissing => {
                warnings.push(ParseWarning::DelimiterMissing {
                    section: name.to_string(),
                });
                String::new()
            }
            Located::BoundaryMissing(next) => {
                warnings.push(ParseWarning::BoundaryMissing {
                    section: name.to_string(),
                    next: next.to_string(),
                });
                String::new()
            }
            Located::FenceMissing => {
                warnings.push(ParseWarning::FenceMissing {
                    section: name.to_string(),
                });
                String::new()
            }
        };

        if occurrences > 1 {
            warnings.push(ParseWarning::DuplicateDelimiter {
                section: name.to_string(),
                occurrences,
            });
        }

        log::debug!("section {} -> {} bytes", name, body.len());
        sections.push(ParsedSection {
            name: name.to_string(),
            body,
        });
    }

    ParsedSections { sections, warnings }
}

enum Located<'t, 'n> {
    Found(&'t str),
    DelimiterMissing,
    BoundaryMissing(&'n str),
    FenceMissing,
}

// Body runs from the first delimiter to the first following `next` delimiter,
// or to end of text for the last section. A missing `next` drops the section.
fn locate_plain<'t, 'n>(text: &'t str, marker: &str, next: Option<&'n str>) -> Located<'t, 'n> {
    let Some(found) = text.find(marker) else {
        return Located::DelimiterMissing;
    };
    let rest = &text[found + marker.len()..];

    match next {
        None => Located::Found(rest),
        Some(next_name) => match rest.find(delimiter(next_name).as_str()) {
            Some(end) => Located::Found(&rest[..end]),
            None => Located::BoundaryMissing(next_name),
        },
    }
}

// Leftmost `--- NAME ---` directly followed (across at most one newline) by a
// fence; captures up to the next fence. Language tags are not stripped.
fn locate_fenced<'t, 'n>(text: &'t str, name: &str, occurrences: usize) -> Located<'t, 'n> {
    if occurrences == 0 {
        return Located::DelimiterMissing;
    }

    let pattern = format!(
        r"(?s){}\r?\n?{}(.*?){}",
        regex::escape(&delimiter(name)),
        FENCE,
        FENCE
    );

    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            log::warn!("could not build fence pattern for {}: {}", name, e);
            return Located::FenceMissing;
        }
    };

    match re.captures(text).and_then(|caps| caps.get(1)) {
        Some(m) => Located::Found(m.as_str()),
        None => Located::FenceMissing,
    }
}
