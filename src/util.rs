//! Shared utility functions.

/// Join the last two words with a non-breaking space so a heading never
/// ends with a single word on its own line.
///
/// "Hello big world" -> "Hello big&nbsp;world"
pub fn no_widow(text: &str) -> String {
    let trimmed = text.trim_end();
    match trimmed.rfind(' ') {
        Some(idx) if !trimmed[..idx].trim().is_empty() => {
            format!("{}&nbsp;{}", trimmed[..idx].trim_end(), &trimmed[idx + 1..])
        }
        _ => trimmed.to_string(),
    }
}

/// Escape text for inclusion in XML character data or attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Rewrite root-relative `href` and `src` attributes to absolute URLs.
///
/// Feed readers resolve links against the feed, not the page, so article
/// bodies must not carry root-relative links.
pub fn absolute_urls(html: &str, base: &str) -> String {
    let base = base.trim_end_matches('/');
    let mut out = html.to_string();
    for attr in ["href", "src"] {
        for quote in ['"', '\''] {
            let needle = format!("{attr}={quote}/");
            // Leave protocol-relative URLs alone
            let protocol_relative = format!("{attr}={quote}//");
            let marker = format!("{attr}={quote}\u{0}//");
            out = out
                .replace(&protocol_relative, &marker)
                .replace(&needle, &format!("{attr}={quote}{base}/"))
                .replace(&marker, &protocol_relative);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_widow() {
        assert_eq!(no_widow("Hello big world"), "Hello big&nbsp;world");
        assert_eq!(no_widow("Two words"), "Two&nbsp;words");
        assert_eq!(no_widow("Single"), "Single");
        assert_eq!(no_widow("Trailing space "), "Trailing&nbsp;space");
        assert_eq!(no_widow(""), "");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"Fish & "Chips" <b>'s"#),
            "Fish &amp; &quot;Chips&quot; &lt;b&gt;&apos;s"
        );
    }

    #[test]
    fn test_absolute_urls() {
        let html = r#"<a href="/about">About</a> <img src='/attachments/a.png'>"#;
        assert_eq!(
            absolute_urls(html, "http://example.com/"),
            r#"<a href="http://example.com/about">About</a> <img src='http://example.com/attachments/a.png'>"#
        );
    }

    #[test]
    fn test_absolute_urls_leaves_other_links() {
        let html = r#"<a href="https://x.org/">x</a> <a href="//cdn.net/a.js">cdn</a> <a href="rel">r</a>"#;
        assert_eq!(absolute_urls(html, "http://example.com"), html);
    }
}
