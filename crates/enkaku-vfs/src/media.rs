//! Media type helpers: extension lookup and content sniffing.
//!
//! These back the last two rungs of the content-type detection ladder. The
//! table is intentionally small; unknown content falls through to
//! `application/octet-stream`.

/// Fallback media type when nothing better is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Look up a media type from a file name's extension.
pub fn from_extension(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    let media = match ext.as_str() {
        "txt" | "text" | "log" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/yaml",
        "toml" => "application/toml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "wasm" => "application/wasm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "woff2" => "font/woff2",
        _ => return None,
    };
    Some(media)
}

/// Guess a media type from the leading bytes of a resource.
///
/// Recognizes a handful of magic numbers, then falls back to `text/plain`
/// for NUL-free UTF-8.
pub fn sniff(head: &[u8]) -> Option<&'static str> {
    if head.is_empty() {
        return None;
    }
    if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if head.starts_with(b"\xff\xd8\xff") {
        return Some("image/jpeg");
    }
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if head.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }
    if head.starts_with(b"PK\x03\x04") {
        return Some("application/zip");
    }
    if head.starts_with(b"\x1f\x8b") {
        return Some("application/gzip");
    }
    if head.starts_with(b"\0asm") {
        return Some("application/wasm");
    }
    let text = std::str::from_utf8(head).ok()?;
    if text.contains('\0') {
        return None;
    }
    let trimmed = text.trim_start();
    if trimmed.starts_with("<?xml") {
        return Some("application/xml");
    }
    if trimmed.len() >= 5 && trimmed[..5].eq_ignore_ascii_case("<html")
        || trimmed.len() >= 9 && trimmed[..9].eq_ignore_ascii_case("<!doctype")
    {
        return Some("text/html");
    }
    Some("text/plain")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(from_extension("report.pdf"), Some("application/pdf"));
        assert_eq!(from_extension("INDEX.HTML"), Some("text/html"));
        assert_eq!(from_extension("archive.tar.gz"), Some("application/gzip"));
        assert_eq!(from_extension("noextension"), None);
        assert_eq!(from_extension("weird.xyz"), None);
    }

    #[test]
    fn test_sniff_magic_numbers() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\nrest"), Some("image/png"));
        assert_eq!(sniff(b"%PDF-1.7 ..."), Some("application/pdf"));
        assert_eq!(sniff(b"PK\x03\x04...."), Some("application/zip"));
    }

    #[test]
    fn test_sniff_text_forms() {
        assert_eq!(sniff(b"<?xml version=\"1.0\"?>"), Some("application/xml"));
        assert_eq!(sniff(b"<!DOCTYPE html><html>"), Some("text/html"));
        assert_eq!(sniff(b"plain old notes\n"), Some("text/plain"));
        assert_eq!(sniff(&[0xde, 0xad, 0xbe, 0xef]), None);
        assert_eq!(sniff(b""), None);
    }
}
