//! 受け付ける画像MIMEタイプ

/// 解析対象として受け付けるMIMEタイプ
pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
];

/// MIMEタイプがホワイトリストに含まれるか
///
/// 大文字小文字とパラメータ（`; charset=...` など）は無視する。
pub fn is_accepted_mime(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ACCEPTED_MIME_TYPES.contains(&essence.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_types() {
        for mime in ACCEPTED_MIME_TYPES {
            assert!(is_accepted_mime(mime), "{} should be accepted", mime);
        }
    }

    #[test]
    fn test_case_and_parameters_ignored() {
        assert!(is_accepted_mime("IMAGE/JPEG"));
        assert!(is_accepted_mime("image/png; q=0.9"));
    }

    #[test]
    fn test_rejected_types() {
        assert!(!is_accepted_mime("image/tiff"));
        assert!(!is_accepted_mime("image/svg+xml"));
        assert!(!is_accepted_mime("application/pdf"));
        assert!(!is_accepted_mime("text/plain"));
        assert!(!is_accepted_mime(""));
    }
}
