//! Plain-text extraction from teaching documents (PDF).
//!
//! Returns per-page text joined with `--- TRANG <n> ---` markers so the
//! generation prompt can reference page boundaries. Scanned image-only
//! documents carry no extractable text and fail with a descriptive message.

use lopdf::Document;

pub const NO_TEXT_MESSAGE: &str =
    "Không tìm thấy văn bản nào trong PDF (Có thể là PDF dạng ảnh scan).";

pub fn extract_text_from_pdf(bytes: &[u8]) -> Result<String, String> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| format!("Không thể đọc file PDF. Chi tiết: {}", e))?;

    let mut full_text = String::new();
    let mut found_text = false;

    for (page_num, _) in doc.get_pages() {
        // pages without decodable glyphs (scans) simply yield empty text
        let page_text = doc.extract_text(&[page_num]).unwrap_or_default();
        if !page_text.trim().is_empty() {
            found_text = true;
        }
        full_text.push_str(&format!("--- TRANG {} ---\n{}\n\n", page_num, page_text));
    }

    if !found_text {
        return Err(NO_TEXT_MESSAGE.to_string());
    }
    Ok(full_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn one_page_pdf(text: &str) -> Vec<u8> {
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
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 48.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
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
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
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
    fn extracts_text_with_page_markers() {
        let bytes = one_page_pdf("1 + 1 = ?");
        let text = extract_text_from_pdf(&bytes).unwrap();
        assert!(text.contains("--- TRANG 1 ---"));
        assert!(text.contains("1 + 1 = ?"));
    }

    #[test]
    fn unreadable_bytes_fail_with_descriptive_error() {
        let err = extract_text_from_pdf(b"not a pdf at all").unwrap_err();
        assert!(err.contains("Không thể đọc file PDF"));
    }
}
