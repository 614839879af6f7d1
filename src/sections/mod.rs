pub mod parser;
pub mod schema;

pub use parser::{delimiter, parse_layout, parse_sections, ParseWarning, ParsedSection, ParsedSections};
pub use schema::{
    filename_for, Extraction, Schema, SchemaKind, SchemaSection, SectionSpec, CSS, FILENAME_TABLE,
    HTML, INSTRUCTIONS, JS, PYTHON_CODE,
};
