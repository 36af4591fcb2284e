//! Document loading.
//!
//! Reads `.txt` and `.md` files (memory-mapped when large) and normalizes
//! their text for chunking.

pub mod reader;
pub mod unicode;

pub use reader::{FileReader, LoadedDocument, load_document, read_file};
pub use unicode::{normalize_text, preview, truncate_graphemes};
