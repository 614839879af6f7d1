//! Section descriptors and the static section-to-filename table.
//!
//! A response format is described by a [`Schema`]: the ordered section names
//! the model is asked to emit, how each section is delimited, and the file
//! each one lands in once materialized.

use crate::sections::parser::{self, ParsedSections};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const HTML: &str = "HTML";
pub const INSTRUCTIONS: &str = "INSTRUCTIONS";
pub const PYTHON_CODE: &str = "PYTHON_CODE";
pub const CSS: &str = "CSS";
pub const JS: &str = "JS";

/// One section name and the file it is materialized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionSpec {
    pub name: &'static str,
    pub filename: &'static str,
}

/// Static table consumed by the serving layer. Filenames must not change.
pub const FILENAME_TABLE: &[SectionSpec] = &[
    SectionSpec { name: HTML, filename: "index.html" },
    SectionSpec { name: INSTRUCTIONS, filename: "instructions.txt" },
    SectionSpec { name: PYTHON_CODE, filename: "app.py" },
    SectionSpec { name: CSS, filename: "style.css" },
    SectionSpec { name: JS, filename: "game.js" },
];

pub fn filename_for(name: &str) -> Option<&'static str> {
    FILENAME_TABLE
        .iter()
        .find(|spec| spec.name == name)
        .map(|spec| spec.filename)
}

fn spec_for(name: &str) -> Option<SectionSpec> {
    FILENAME_TABLE.iter().copied().find(|spec| spec.name == name)
}

/// How a section body is located in the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extraction {
    /// `--- NAME ---` up to the next schema delimiter (or end of text for the last one).
    Plain,
    /// `--- NAME ---` followed by a triple-backtick fence, up to the closing fence.
    Fenced,
}

impl Extraction {
    pub fn from_fenced(fenced: bool) -> Self {
        if fenced {
            Extraction::Fenced
        } else {
            Extraction::Plain
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Single self-contained HTML document plus instructions
    Web,
    /// Pygame source plus optional web assets and instructions
    Pygame,
}

impl SchemaKind {
    pub fn section_names(self) -> &'static [&'static str] {
        match self {
            SchemaKind::Web => &[HTML, INSTRUCTIONS],
            SchemaKind::Pygame => &[PYTHON_CODE, HTML, CSS, JS, INSTRUCTIONS],
        }
    }

    pub fn default_extraction(self) -> Extraction {
        match self {
            SchemaKind::Web => Extraction::Plain,
            SchemaKind::Pygame => Extraction::Fenced,
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Web => write!(f, "web"),
            SchemaKind::Pygame => write!(f, "pygame"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaSection {
    pub spec: SectionSpec,
    pub extraction: Extraction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub kind: SchemaKind,
    pub sections: Vec<SchemaSection>,
}

impl Schema {
    pub fn for_kind(kind: SchemaKind) -> Self {
        let extraction = kind.default_extraction();
        let sections = kind
            .section_names()
            .iter()
            .filter_map(|name| spec_for(name))
            .map(|spec| SchemaSection { spec, extraction })
            .collect();

        Self { kind, sections }
    }

    /// Apply one extraction rule to every section.
    pub fn with_extraction(mut self, extraction: Extraction) -> Self {
        for section in &mut self.sections {
            section.extraction = extraction;
        }
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sections.iter().map(|s| s.spec.name).collect()
    }

    /// `Some` when every section shares one extraction rule.
    pub fn uniform_extraction(&self) -> Option<Extraction> {
        let first = self.sections.first()?.extraction;
        self.sections
            .iter()
            .all(|s| s.extraction == first)
            .then_some(first)
    }

    pub fn parse(&self, text: &str) -> ParsedSections {
        let layout: Vec<(&str, Extraction)> = self
            .sections
            .iter()
            .map(|s| (s.spec.name, s.extraction))
            .collect();
        parser::parse_layout(text, &layout)
    }
}
