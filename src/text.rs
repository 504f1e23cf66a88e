use std::borrow::Cow;

/// Strip HTML tags and the common entities from descriptions that embed markup.
pub(crate) fn strip_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('<') {
        let Some(end) = rest[start..].find('>') else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &rest[start + end + 1..];
    }
    out.push_str(rest);

    let mut out = out
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    while out.contains("\n\n") {
        out = out.replace("\n\n", "\n");
    }
    out.trim().to_string()
}

/// Shorten `s` to at most `limit` characters, ending in `...` when cut.
pub(crate) fn truncate(s: &str, limit: usize) -> Cow<'_, str> {
    if s.chars().count() <= limit {
        return Cow::Borrowed(s);
    }
    let keep: String = s.chars().take(limit.saturating_sub(3)).collect();
    Cow::Owned(format!("{keep}..."))
}

/// Pretty JSON for an example payload; falls back to the compact form.
pub(crate) fn example_text(value: &serde_json::Value) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("example serialization failed: {e}");
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_entities() {
        assert_eq!(
            strip_html("<p>Pets &amp; <b>owners</b></p>\n\n\n<br/>tail "),
            "Pets & owners\ntail"
        );
    }

    #[test]
    fn unterminated_tag_is_kept() {
        assert_eq!(strip_html("a < b"), "a < b");
    }

    #[test]
    fn truncates_on_char_boundaries() {
        let long = "é".repeat(70);
        let t = truncate(&long, 60);
        assert_eq!(t.chars().count(), 60);
        assert!(t.ends_with("..."));
        assert_eq!(truncate("short", 60), "short");
    }
}
