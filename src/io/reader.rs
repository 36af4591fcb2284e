//! Document file reading with memory mapping support.

// Memory mapping requires unsafe but is sound for read-only access
#![allow(unsafe_code)]

use crate::core::document::is_supported;
use crate::error::{IoError, Result};
use crate::io::unicode::{normalize_text, validate_utf8};
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Threshold for using memory mapping (1MB).
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Maximum document size accepted for indexing (64MB).
pub const MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// File reader that memory-maps large files.
///
/// # Examples
///
/// ```no_run
/// use interview_coach::io::FileReader;
///
/// let reader = FileReader::open("notes/system-design.md").unwrap();
/// let content = reader.read_to_string().unwrap();
/// ```
pub struct FileReader {
    file: File,
    size: u64,
    path: String,
}

impl FileReader {
    /// Opens a file for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist, can't be opened, or is
    /// larger than [`MAX_FILE_SIZE`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy().to_string();

        if !path_ref.exists() {
            return Err(IoError::FileNotFound { path: path_str }.into());
        }

        let file = File::open(path_ref).map_err(|e| IoError::ReadFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;

        let size = file
            .metadata()
            .map_err(|e| IoError::ReadFailed {
                path: path_str.clone(),
                reason: e.to_string(),
            })?
            .len();

        if size > MAX_FILE_SIZE {
            return Err(IoError::ReadFailed {
                path: path_str,
                reason: format!("file too large: {size} bytes (max: {MAX_FILE_SIZE} bytes)"),
            }
            .into());
        }

        Ok(Self {
            file,
            size,
            path: path_str,
        })
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Reads the file content as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the content is not valid UTF-8.
    pub fn read_to_string(&self) -> Result<String> {
        if self.size >= MMAP_THRESHOLD {
            // Safety: the mapping is read-only and dropped before returning
            let mmap = unsafe {
                Mmap::map(&self.file).map_err(|e| IoError::MmapFailed {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?
            };
            self.decode(&mmap).map(str::to_string)
        } else {
            let mut buffer = Vec::with_capacity(usize::try_from(self.size).unwrap_or(0));
            (&self.file)
                .read_to_end(&mut buffer)
                .map_err(|e| IoError::ReadFailed {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?;
            self.decode(&buffer).map(str::to_string)
        }
    }

    fn decode<'a>(&self, bytes: &'a [u8]) -> Result<&'a str> {
        validate_utf8(bytes).map_err(|offset| {
            IoError::ReadFailed {
                path: self.path.clone(),
                reason: format!("invalid UTF-8 at byte offset {offset}"),
            }
            .into()
        })
    }
}

/// Reads a file to string, memory-mapping large files.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid UTF-8.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    FileReader::open(path)?.read_to_string()
}

/// A reference document read from disk, ready for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    /// File name used as the document's display name.
    pub name: String,
    /// Full path as given.
    pub source: String,
    /// Normalized text.
    pub content: String,
}

/// Loads a `.txt` or `.md` document.
///
/// The extension is checked before the file is touched.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] for other extensions, and the
/// errors of [`read_file`] otherwise.
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<LoadedDocument> {
    let path = path.as_ref();
    let source = path.to_string_lossy().to_string();
    let name = path
        .file_name()
        .map_or_else(|| source.clone(), |n| n.to_string_lossy().to_string());

    if !is_supported(&name) {
        return Err(IoError::UnsupportedFormat { name }.into());
    }

    let content = normalize_text(&read_file(path)?);
    Ok(LoadedDocument {
        name,
        source,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[test]
    fn test_read_small_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("small.txt");
        std::fs::write(&file_path, "Hello, world!").unwrap();

        let reader = FileReader::open(&file_path).unwrap();
        assert_eq!(reader.size(), 13);
        assert_eq!(reader.read_to_string().unwrap(), "Hello, world!");
    }

    #[test]
    fn test_read_large_file_uses_mmap() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("large.md");
        let content = "line of notes\n".repeat(100_000);
        std::fs::write(&file_path, &content).unwrap();

        assert_eq!(read_file(&file_path).unwrap(), content);
    }

    #[test]
    fn test_missing_file() {
        let result = FileReader::open("/nonexistent/notes.txt");
        assert!(matches!(
            result,
            Err(Error::Io(IoError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("bad.txt");
        std::fs::write(&file_path, [b'a', 0xff, b'b']).unwrap();

        let err = read_file(&file_path).unwrap_err();
        assert!(err.to_string().contains("byte offset 1"));
    }

    #[test]
    fn test_load_document_normalizes() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("cv.md");
        std::fs::write(&file_path, "# CV\r\nRust\r\n").unwrap();

        let doc = load_document(&file_path).unwrap();
        assert_eq!(doc.name, "cv.md");
        assert_eq!(doc.content, "# CV\nRust\n");
    }

    #[test]
    fn test_load_document_rejects_pdf_before_reading() {
        // The file does not exist; the extension check must fire first
        let result = load_document("/nonexistent/resume.pdf");
        assert!(matches!(
            result,
            Err(Error::Io(IoError::UnsupportedFormat { ref name })) if name == "resume.pdf"
        ));
    }
}
