//! Loading files as framed context blocks.
//!
//! Read failures are collected for the caller to report; the files are
//! skipped and the question still goes out.

use std::path::{Path, PathBuf};

use crate::llm::prompts::frame_file;

#[derive(Debug, Default)]
pub struct LoadedContext {
    pub blocks: Vec<String>,
    pub skipped: Vec<(PathBuf, std::io::Error)>,
}

pub async fn load_context_blocks(paths: &[PathBuf]) -> LoadedContext {
    let mut loaded = LoadedContext::default();

    for path in paths {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => loaded.blocks.push(frame_file(&display(path), &content)),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Skipping unreadable context file: {}", e);
                loaded.skipped.push((path.clone(), e));
            }
        }
    }

    loaded
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_loads_and_frames_files_in_order() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        write!(first, "fn main() {{}}").unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        write!(second, "[package]").unwrap();

        let paths = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let loaded = load_context_blocks(&paths).await;

        assert!(loaded.skipped.is_empty());
        assert_eq!(loaded.blocks.len(), 2);
        assert_eq!(loaded.blocks[0], frame_file(&display(first.path()), "fn main() {}"));
        assert_eq!(loaded.blocks[1], frame_file(&display(second.path()), "[package]"));
    }

    #[tokio::test]
    async fn test_missing_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        std::fs::write(&present, "hello").unwrap();
        let missing = dir.path().join("missing.txt");

        let loaded = load_context_blocks(&[missing.clone(), present]).await;

        assert_eq!(loaded.blocks.len(), 1);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].0, missing);
        assert_eq!(loaded.skipped[0].1.kind(), std::io::ErrorKind::NotFound);
    }
}
