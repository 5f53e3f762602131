//! Best-effort extraction of a complete HTML document from raw model output.
//!
//! The model wraps its code in commentary or markdown fences more often than
//! not. Everything here is pure string slicing: ambiguous input passes
//! through unchanged so the caller can treat it as prose instead of code.

/// Opening of the instrumentation comment injected at stream start.
const INSTRUMENTATION_OPEN: &str = "<!-- 🚀";
const COMMENT_CLOSE: &str = "-->";

const FENCE_OPEN: &str = "```html";
const FENCE_CLOSE: &str = "```";

/// Document start marker.
pub const DOC_START: &str = "<!DOCTYPE html>";
/// Document end marker.
pub const DOC_END: &str = "</html>";

/// Isolate a well-formed HTML document from raw model output.
///
/// Priority order:
/// 1. strip instrumentation comments,
/// 2. take the interior of a ```html fenced block when present,
/// 3. slice from the first `<!DOCTYPE html>` to the *last* `</html>`; the
///    last occurrence absorbs spurious earlier ones inside commentary. When
///    only the start marker exists, the end marker is synthesized. When
///    neither exists, the trimmed text is returned unchanged.
///
/// Idempotent on already-clean documents.
pub fn clean_generated_code(raw: &str) -> String {
    let mut text = strip_instrumentation(raw);
    if let Some(inner) = fenced_html_block(&text) {
        text = inner;
    }

    let start = text.find(DOC_START);
    let end = text.rfind(DOC_END);
    let sliced = match (start, end) {
        (Some(s), Some(e)) if e >= s => text[s..e + DOC_END.len()].to_string(),
        (Some(s), _) => format!("{}{}", &text[s..], DOC_END),
        _ => text,
    };

    sliced.trim().to_string()
}

/// Remove every `<!-- 🚀 ... -->` progress comment. An unterminated
/// comment is left alone.
fn strip_instrumentation(raw: &str) -> String {
    let mut text = raw.to_string();
    while let Some(open) = text.find(INSTRUMENTATION_OPEN) {
        match text[open..].find(COMMENT_CLOSE) {
            Some(rel) => text.replace_range(open..open + rel + COMMENT_CLOSE.len(), ""),
            None => break,
        }
    }
    text
}

/// Interior of the first ```html fenced block, if the text has one.
fn fenced_html_block(text: &str) -> Option<String> {
    let open = text.find(FENCE_OPEN)?;
    let body_start = open + FENCE_OPEN.len();
    let close = text[body_start..].find(FENCE_CLOSE)?;
    Some(text[body_start..body_start + close].to_string())
}
