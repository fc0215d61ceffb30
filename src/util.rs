//! Small helpers shared by the notebook reader and the image embedders.

use std::borrow::Cow;
use std::path::Path;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. Falls back to Windows-1252 (notebooks saved by old editors on Windows)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Guess an image media type from a file extension.
pub fn image_media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Escape text for use in HTML element content or a double-quoted attribute.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBF{\"cells\": []}";
        assert_eq!(decode_text(bytes), "{\"cells\": []}");
    }

    #[test]
    fn test_decode_falls_back_to_cp1252() {
        // 0xE9 is 'é' in Windows-1252 and invalid as a lone UTF-8 byte
        let bytes = b"caf\xE9";
        assert_eq!(decode_text(bytes), "café");
    }

    #[test]
    fn test_image_media_type() {
        assert_eq!(image_media_type(Path::new("plot.PNG")), Some("image/png"));
        assert_eq!(image_media_type(Path::new("a/b/photo.jpeg")), Some("image/jpeg"));
        assert_eq!(image_media_type(Path::new("notes.txt")), None);
        assert_eq!(image_media_type(Path::new("noext")), None);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
        assert_eq!(escape_html("A & B"), "A &amp; B");
    }
}
