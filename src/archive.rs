//! # Archive Assembly
//!
//! Packages a validated [`ProjectTree`] into an in-memory zip archive.
//! Every entry is rooted under the project name so the archive extracts
//! into a single directory.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{StackforgeError, StackforgeResult};
use crate::llm::ProjectTree;

/// Build a deflate-compressed zip archive from a file tree.
///
/// Callers are expected to have validated the tree first; paths are used
/// as-is apart from the project-name prefix.
pub fn build_zip(project_name: &str, tree: &ProjectTree) -> StackforgeResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for file in &tree.files {
        let entry_name = format!("{project_name}/{}", file.path);
        writer
            .start_file(entry_name, options)
            .map_err(|e| StackforgeError::ArchiveError(format!("failed to add entry: {e}")))?;
        writer
            .write_all(file.content.as_bytes())
            .map_err(|e| StackforgeError::ArchiveError(format!("failed to write entry: {e}")))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| StackforgeError::ArchiveError(format!("failed to finalize archive: {e}")))?;

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProjectFile;
    use std::io::Read;

    #[test]
    fn test_archive_contains_every_entry_under_prefix() {
        let tree = ProjectTree {
            name: None,
            files: vec![
                ProjectFile {
                    path: "README.md".to_string(),
                    content: "# demo\n".to_string(),
                },
                ProjectFile {
                    path: "src/main.rs".to_string(),
                    content: "fn main() {}\n".to_string(),
                },
            ],
        };

        let bytes = build_zip("demo-app", &tree).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut entry = archive.by_name("demo-app/src/main.rs").unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "fn main() {}\n");
    }

    #[test]
    fn test_empty_tree_yields_empty_archive() {
        let tree = ProjectTree {
            name: None,
            files: vec![],
        };
        let bytes = build_zip("empty", &tree).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
