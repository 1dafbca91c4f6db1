//! Notes: markdown files with a YAML metadata block.
//!
//! The parser produces an immutable `Document` holding the metadata map, the
//! body and a structural index (headings, links, code blocks, checklists).

pub mod file_ops;
pub mod frontmatter;
pub mod parser;
pub mod structure;

pub use parser::{NoteParser, ParseOutcome, parse_content};
