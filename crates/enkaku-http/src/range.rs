//! Range header plumbing.
//!
//! Builders and parsers for the `Range` / `Content-Range` pair the backend
//! lives on. Parsers are lenient about what they accept and return
//! [`SizeHint::Unknown`] for anything they cannot pin down.

use enkaku_vfs::SizeHint;

/// Render a `Range` header value for `len` bytes starting at `offset`.
pub fn range_value(offset: u64, len: usize) -> String {
    let end = offset.saturating_add(len as u64).saturating_sub(1);
    format!("bytes={offset}-{end}")
}

/// Total size out of a `Content-Range` value.
///
/// Accepts the satisfied form (`bytes 0-9/226`), the unsatisfied form
/// (`bytes */226`), and the unknown-total form (`bytes 0-9/*`).
pub fn content_range_total(value: &str) -> SizeHint {
    let Some(rest) = value.trim().strip_prefix("bytes") else {
        return SizeHint::Unknown;
    };
    let Some((_, total)) = rest.trim().rsplit_once('/') else {
        return SizeHint::Unknown;
    };
    match total.trim().parse::<u64>() {
        Ok(n) => SizeHint::Known(n),
        Err(_) => SizeHint::Unknown,
    }
}

/// Parse a `Content-Length` value.
pub fn content_length(value: &str) -> SizeHint {
    match value.trim().parse::<u64>() {
        Ok(n) => SizeHint::Known(n),
        Err(_) => SizeHint::Unknown,
    }
}

/// Strip parameters off a `Content-Type` value (`text/html; charset=utf-8`
/// becomes `text/html`).
pub fn media_type(value: &str) -> Option<String> {
    let media = value.split(';').next()?.trim();
    if media.is_empty() {
        None
    } else {
        Some(media.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_value() {
        assert_eq!(range_value(0, 10), "bytes=0-9");
        assert_eq!(range_value(100, 1), "bytes=100-100");
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(content_range_total("bytes 0-9/226"), SizeHint::Known(226));
        assert_eq!(content_range_total("bytes */226"), SizeHint::Known(226));
        assert_eq!(content_range_total("bytes 0-9/*"), SizeHint::Unknown);
        assert_eq!(content_range_total("garbage"), SizeHint::Unknown);
        assert_eq!(content_range_total("bytes  0-0/0"), SizeHint::Known(0));
    }

    #[test]
    fn test_content_length() {
        assert_eq!(content_length("226"), SizeHint::Known(226));
        assert_eq!(content_length(" 0 "), SizeHint::Known(0));
        assert_eq!(content_length("nope"), SizeHint::Unknown);
    }

    #[test]
    fn test_media_type() {
        assert_eq!(
            media_type("text/html; charset=utf-8").as_deref(),
            Some("text/html")
        );
        assert_eq!(media_type("Application/PDF").as_deref(), Some("application/pdf"));
        assert_eq!(media_type(""), None);
    }
}
