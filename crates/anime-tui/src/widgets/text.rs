//! Width-aware string helpers for fixed-width cells.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cut `s` to at most `max` terminal columns, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Last path segment of an image URL, e.g. `138006l.jpg`.
pub fn image_file_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("Frieren", 10), "Frieren");
        assert_eq!(truncate("Frieren", 7), "Frieren");
        assert_eq!(truncate("Frieren", 5), "Frie…");
        assert_eq!(truncate("Frieren", 0), "");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // each kana is two columns wide
        let s = "葬送のフリーレン";
        let cut = truncate(s, 7);
        assert!(cut.ends_with('…'));
        assert!(cut.width() <= 7);
    }

    #[test]
    fn test_image_file_name() {
        assert_eq!(
            image_file_name("https://cdn.myanimelist.net/images/anime/1015/138006l.jpg"),
            "138006l.jpg"
        );
        assert_eq!(image_file_name("plain"), "plain");
    }
}
