//! Document loading by file extension.

use std::path::Path;

use tracing::debug;

use crate::domain::{Document, DocumentClass, DocumentContent};
use crate::error::AppError;
use crate::io::ingest::read_table;

/// Load a file as a document of the given class.
///
/// `.csv` becomes a table and `.txt` is taken as already-recognised OCR text.
/// Anything else (images, PDFs, Word files) is loaded as `Unsupported` so the
/// run can report it instead of failing.
pub fn load_document(path: &Path, class: DocumentClass) -> Result<Document, AppError> {
    let name = document_name(path);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let content = match extension.as_str() {
        "csv" => DocumentContent::Table(read_table(path)?.records),
        "txt" => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                AppError::input(format!("Failed to read text file '{}': {e}", path.display()))
            })?;
            DocumentContent::Text(text)
        }
        _ => {
            if !path.is_file() {
                return Err(AppError::input(format!("File not found: '{}'", path.display())));
            }
            DocumentContent::Unsupported { extension }
        }
    };

    debug!(document = %name, class = ?class, "loaded document");
    Ok(Document { name, class, content })
}

pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_loads_as_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "inv.CSV", "Item,Amount\npen,10\n");
        let doc = load_document(&path, DocumentClass::Invoice).unwrap();
        assert_eq!(doc.name, "inv.CSV");
        match doc.content {
            DocumentContent::Table(records) => assert_eq!(records.row_count(), 1),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn txt_loads_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "scan.txt", "Total 1200.50");
        let doc = load_document(&path, DocumentClass::Invoice).unwrap();
        assert!(matches!(doc.content, DocumentContent::Text(ref t) if t.contains("1200.50")));
    }

    #[test]
    fn images_are_unsupported_not_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "scan.PNG", "not really a png");
        let doc = load_document(&path, DocumentClass::Payslip).unwrap();
        match doc.content {
            DocumentContent::Unsupported { extension } => assert_eq!(extension, "png"),
            other => panic!("expected unsupported, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_fails() {
        let err = load_document(Path::new("/no/such/file.pdf"), DocumentClass::Generic).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
