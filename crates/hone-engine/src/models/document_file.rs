use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How a document is stored on disk. Editing always happens on HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    Html,
    Markdown,
}

impl DocumentFormat {
    /// Guesses the format from the file extension; anything that is not
    /// Markdown is treated as HTML.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("md" | "markdown" | "mdown" | "mkd") => DocumentFormat::Markdown,
            _ => DocumentFormat::Html,
        }
    }
}

/// A document path with a display-friendly name
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFile {
    path: PathBuf,
    display_name: String,
    format: DocumentFormat,
}

impl DocumentFile {
    pub fn new(path: PathBuf) -> Self {
        let display_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("Untitled")
            .to_string();
        let format = DocumentFormat::from_path(&path);
        Self {
            path,
            display_name,
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name, used for tab titles
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Directory the document lives in; relative image sources resolve
    /// against it.
    pub fn directory(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

impl From<PathBuf> for DocumentFile {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}
