use std::path::Path;

use lopdf::Document;

use super::{DocumentError, DocumentResult, ExtractedDocument};

/// Share of readable characters below which page-level extraction is
/// treated as garbled and the fallback extractor is tried
const READABLE_THRESHOLD: f32 = 0.7;

/// Extract the text of a PDF file. `on_page` is called after each page
/// with (page, total) so the UI can show extraction progress.
pub fn extract_file(
    path: &Path,
    on_page: impl FnMut(usize, usize),
) -> DocumentResult<ExtractedDocument> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = std::fs::read(path)?;
    extract_bytes(&bytes, &file_name, on_page)
}

/// Extract text from in-memory PDF bytes.
///
/// Pages are walked in order with `lopdf`; each page's text is whitespace
/// normalized and pages are joined with blank lines. When that yields
/// nothing readable, the whole document is retried through `pdf-extract`,
/// which resolves some font encodings lopdf does not.
pub fn extract_bytes(
    bytes: &[u8],
    file_name: &str,
    mut on_page: impl FnMut(usize, usize),
) -> DocumentResult<ExtractedDocument> {
    if !looks_like_pdf(bytes) {
        return Err(DocumentError::NotAPdf(file_name.to_string()));
    }

    let doc = Document::load_mem(bytes).map_err(|e| DocumentError::Load(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(DocumentError::Encrypted);
    }

    let pages = doc.get_pages();
    let page_count = pages.len();

    let mut page_texts = Vec::with_capacity(page_count);
    for (i, page_number) in pages.keys().enumerate() {
        let raw = doc.extract_text(&[*page_number]).unwrap_or_default();
        page_texts.push(normalize_page_text(&raw));
        on_page(i + 1, page_count);
    }

    let mut text = page_texts
        .iter()
        .filter(|t| !t.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n\n");

    if text.is_empty() || looks_garbled(&text) {
        tracing::warn!(
            "Page-level extraction unusable for {}, trying fallback extractor",
            file_name
        );
        if let Ok(fallback) = pdf_extract::extract_text_from_mem(bytes) {
            let fallback = fallback.trim().to_string();
            if !fallback.is_empty() && !looks_garbled(&fallback) {
                text = fallback;
            }
        }
    }

    if text.is_empty() {
        return Err(DocumentError::NoText);
    }

    Ok(ExtractedDocument {
        file_name: file_name.to_string(),
        page_count,
        text,
    })
}

/// PDF magic may sit after a short preamble, so scan the first kilobyte
fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(1024)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Collapse whitespace runs the way the text items were laid out on the
/// page, one line of prose per page chunk
fn normalize_page_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn looks_garbled(text: &str) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return true;
    }
    let readable = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || c.is_ascii_punctuation())
        .count();
    (readable as f32 / total as f32) < READABLE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::io::Write;

    /// Build a minimal PDF with one page per entry in `pages`
    fn sample_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page_text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![100.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*page_text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn rejects_non_pdf_bytes() {
        let result = extract_bytes(b"just some text", "notes.txt", |_, _| {});
        assert!(matches!(result, Err(DocumentError::NotAPdf(_))));
    }

    #[test]
    fn rejects_empty_input() {
        let result = extract_bytes(b"", "empty.pdf", |_, _| {});
        assert!(matches!(result, Err(DocumentError::NotAPdf(_))));
    }

    #[test]
    fn extracts_single_page_text() {
        let bytes = sample_pdf(&["Hello world from a PDF"]);
        let doc = extract_bytes(&bytes, "sample.pdf", |_, _| {}).unwrap();
        assert_eq!(doc.page_count, 1);
        assert!(doc.text.contains("Hello world"));
        assert_eq!(doc.file_name, "sample.pdf");
    }

    #[test]
    fn joins_pages_with_blank_lines() {
        let bytes = sample_pdf(&["First page", "Second page"]);
        let doc = extract_bytes(&bytes, "two.pdf", |_, _| {}).unwrap();
        assert_eq!(doc.page_count, 2);
        let parts: Vec<&str> = doc.text.split("\n\n").collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].contains("First"));
        assert!(parts[1].contains("Second"));
    }

    #[test]
    fn reports_page_progress() {
        let bytes = sample_pdf(&["one", "two", "three"]);
        let mut seen = Vec::new();
        extract_bytes(&bytes, "three.pdf", |page, total| seen.push((page, total))).unwrap();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn char_count_counts_scalars() {
        let bytes = sample_pdf(&["abc"]);
        let doc = extract_bytes(&bytes, "abc.pdf", |_, _| {}).unwrap();
        assert_eq!(doc.char_count(), doc.text.chars().count());
    }

    #[test]
    fn extract_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("on-disk.pdf");
        std::fs::write(&path, sample_pdf(&["From disk"])).unwrap();

        let doc = extract_file(&path, |_, _| {}).unwrap();
        assert_eq!(doc.file_name, "on-disk.pdf");
        assert!(doc.text.contains("From disk"));
    }

    #[test]
    fn extract_file_rejects_non_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"plain text pretending").unwrap();

        let result = extract_file(&path, |_, _| {});
        assert!(matches!(result, Err(DocumentError::NotAPdf(_))));
    }

    #[test]
    fn extract_file_propagates_missing_file() {
        let result = extract_file(Path::new("/nonexistent/missing.pdf"), |_, _| {});
        assert!(matches!(result, Err(DocumentError::Io(_))));
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(
            normalize_page_text("  spaced\tout \n text  "),
            "spaced out text"
        );
        assert_eq!(normalize_page_text(""), "");
    }

    #[test]
    fn garble_detection() {
        assert!(!looks_garbled("Perfectly ordinary sentence."));
        assert!(looks_garbled("\u{fffd}\u{fffd}\u{fffd}\u{1}\u{2}"));
        assert!(looks_garbled(""));
    }
}
