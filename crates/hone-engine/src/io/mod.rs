use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a document and return its content
pub fn read_file(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(IoError::Io)
}

/// Write content to a document, replacing what was there
pub fn write_file(path: &Path, content: &str) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(path, content).map_err(IoError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_dir, create_test_file};

    #[test]
    fn test_read_file_success() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "page.html", "<p>Hello</p>\n");

        let content = read_file(&path).unwrap();
        assert_eq!(content, "<p>Hello</p>\n");
    }

    #[test]
    fn test_read_file_not_found() {
        let dir = create_test_dir();
        let result = read_file(&dir.path().join("missing.html"));
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_file_creates_parent_directories() {
        let dir = create_test_dir();
        let path = dir.path().join("site").join("nested").join("index.html");

        write_file(&path, "<p>x</p>").unwrap();

        assert_eq!(read_file(&path).unwrap(), "<p>x</p>");
        assert!(dir.path().join("site").join("nested").is_dir());
    }

    #[test]
    fn test_write_file_overwrites_existing() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "page.html", "<p>old</p>");

        write_file(&path, "<p>new</p>").unwrap();

        assert_eq!(read_file(&path).unwrap(), "<p>new</p>");
    }

    #[test]
    fn test_write_into_a_file_path_fails() {
        let dir = create_test_dir();
        let blocker = create_test_file(&dir, "blocker", "");
        let result = write_file(&blocker.join("page.html"), "x");
        assert!(matches!(result, Err(IoError::Io(_))));
    }
}
