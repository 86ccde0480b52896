//! G-code file access
//!
//! Opens G-code files for the streaming pipeline and performs a quick
//! structural validation pass without building any toolpath.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use afrbkit_core::ToolpathError;
use serde::Serialize;

use crate::gcode::stream::{decode_dropping_invalid, GcodeLines};
use crate::gcode::tokenizer::{classify, strip_comments, LineKind};

/// Buffer size for reading large files (256 KB)
const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Size above which `read_all` logs a warning
const LARGE_FILE_WARN_BYTES: u64 = 500 * 1024 * 1024;

/// Lines longer than this are flagged by [`GcodeFileReader::validate`]
const LONG_LINE_CHARS: usize = 256;

/// Handle on a G-code file that has been checked to exist
#[derive(Debug, Clone)]
pub struct GcodeFileReader {
    path: PathBuf,
    file_size: u64,
}

impl GcodeFileReader {
    /// Create a new G-code file reader
    ///
    /// # Errors
    /// Returns [`ToolpathError::FileAccess`] if the path cannot be inspected and
    /// [`ToolpathError::NotAFile`] if it names a directory or similar.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ToolpathError> {
        let path = path.as_ref().to_path_buf();

        let metadata = fs::metadata(&path).map_err(|source| ToolpathError::FileAccess {
            path: path.clone(),
            source,
        })?;

        if !metadata.is_file() {
            return Err(ToolpathError::NotAFile { path });
        }

        Ok(Self {
            file_size: metadata.len(),
            path,
        })
    }

    /// Get file size in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size formatted as a human-readable string
    pub fn formatted_size(&self) -> String {
        if self.file_size < 1024 {
            format!("{} B", self.file_size)
        } else if self.file_size < 1024 * 1024 {
            format!("{:.2} KB", self.file_size as f64 / 1024.0)
        } else {
            format!("{:.2} MB", self.file_size as f64 / (1024.0 * 1024.0))
        }
    }

    /// Open a lazy line stream over the file
    ///
    /// The file handle lives inside the returned iterator and is closed when
    /// the iterator is dropped.
    pub fn lines(&self) -> Result<GcodeLines<BufReader<File>>, ToolpathError> {
        let file = File::open(&self.path).map_err(|source| ToolpathError::FileAccess {
            path: self.path.clone(),
            source,
        })?;
        Ok(GcodeLines::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            file,
        )))
    }

    /// Read entire file into memory
    ///
    /// Invalid UTF-8 bytes are dropped, as in [`lines`](Self::lines).
    pub fn read_all(&self) -> Result<String, ToolpathError> {
        if self.file_size > LARGE_FILE_WARN_BYTES {
            tracing::warn!(
                "Reading very large file ({}MB) into memory",
                self.file_size / (1024 * 1024)
            );
        }

        let bytes = fs::read(&self.path).map_err(|source| ToolpathError::FileAccess {
            path: self.path.clone(),
            source,
        })?;
        Ok(decode_dropping_invalid(&bytes))
    }

    /// Scan the file and count motion commands
    ///
    /// Blank and comment-only lines are not counted.
    pub fn validate(&self) -> Result<FileValidation, ToolpathError> {
        let mut validation = FileValidation::new();

        for line in self.lines()? {
            let line = line?;
            let cleaned = strip_comments(&line);
            if cleaned.is_empty() {
                continue;
            }

            validation.total_lines += 1;

            if cleaned.chars().count() > LONG_LINE_CHARS {
                validation.warnings.push(format!(
                    "Line {} is very long ({})",
                    validation.total_lines,
                    cleaned.chars().count()
                ));
            }

            match classify(&cleaned) {
                LineKind::Motion if cleaned.starts_with("G1") || cleaned.starts_with("G01") => {
                    validation.linear_moves += 1
                }
                LineKind::Motion => validation.rapid_moves += 1,
                LineKind::Arc => validation.arc_moves += 1,
                _ => {}
            }
        }

        if validation.total_motion_commands() == 0 {
            validation
                .warnings
                .push("File contains no motion commands (G0-G3)".to_string());
        }

        if validation.total_lines == 0 {
            validation.errors.push("File is empty".to_string());
        }

        validation.is_valid = validation.errors.is_empty();
        tracing::debug!(
            "Validated {}: {} lines, {} motion commands",
            self.path.display(),
            validation.total_lines,
            validation.total_motion_commands()
        );
        Ok(validation)
    }
}

/// File validation result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileValidation {
    /// Whether file is valid
    pub is_valid: bool,
    /// Lines with content after comment removal
    pub total_lines: u64,
    /// Number of rapid moves (G0)
    pub rapid_moves: u64,
    /// Number of linear moves (G1)
    pub linear_moves: u64,
    /// Number of arc moves (G2/G3)
    pub arc_moves: u64,
    /// Validation errors
    pub errors: Vec<String>,
    /// Validation warnings
    pub warnings: Vec<String>,
}

impl FileValidation {
    /// Create new validation result
    pub fn new() -> Self {
        Self {
            is_valid: true,
            total_lines: 0,
            rapid_moves: 0,
            linear_moves: 0,
            arc_moves: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Get total motion commands
    pub fn total_motion_commands(&self) -> u64 {
        self.rapid_moves + self.linear_moves + self.arc_moves
    }
}

impl Default for FileValidation {
    fn default() -> Self {
        Self::new()
    }
}
