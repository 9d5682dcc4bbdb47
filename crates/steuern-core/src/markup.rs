//! Markup primitives.
//!
//! Two kinds of text reach the chat log and the handoff panel:
//!
//! - **Untrusted text** (user input, server-supplied error strings) is always
//!   passed through [`escape_html`] before it becomes markup.
//! - **Trusted fragments** are pre-rendered HTML returned by the backend. They
//!   are wrapped in [`TrustedFragment`] and inserted verbatim.
//!
//! Keeping the two apart at the type level means user text can never take the
//! unescaped path by accident: there is no conversion from `String` to
//! `TrustedFragment` other than [`TrustedFragment::from_server`].

use std::sync::LazyLock;

use regex::Regex;

/// Escape text so it renders literally when embedded in markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// An HTML fragment produced by the backend, inserted without escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedFragment(String);

impl TrustedFragment {
    /// Wrap a response body received from the project backend.
    pub fn from_server(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// The raw markup.
    pub fn as_html(&self) -> &str {
        &self.0
    }

    /// Whether the fragment has no visible content.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Plain-text rendering for the terminal.
    pub fn to_text(&self) -> String {
        fragment_to_text(&self.0)
    }

    /// First numeric value of `attribute` in the fragment, e.g.
    /// `data-auftrag-id="17"`.
    pub fn numeric_attribute(&self, attribute: &str) -> Option<u64> {
        numeric_attributes(&self.0, attribute).into_iter().next()
    }

    /// Split the fragment at every element carrying `attribute`, returning the
    /// attribute value together with the markup up to the next such element.
    pub fn split_by_attribute(&self, attribute: &str) -> Vec<(u64, String)> {
        let starts: Vec<(usize, u64)> = attribute_matches(&self.0, attribute)
            .map(|(offset, value)| {
                let tag_start = self.0[..offset].rfind('<').unwrap_or(0);
                (tag_start, value)
            })
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(i, (start, value))| {
                let end = starts.get(i + 1).map_or(self.0.len(), |(next, _)| *next);
                (*value, self.0[*start..end].to_string())
            })
            .collect()
    }
}

static ID_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(data-[a-z-]+)\s*=\s*["']?(\d+)"#).unwrap());

/// Byte offset and value of every numeric `attribute` occurrence.
fn attribute_matches<'a>(html: &'a str, attribute: &'a str) -> impl Iterator<Item = (usize, u64)> + 'a {
    ID_ATTRIBUTE.captures_iter(html).filter_map(move |caps| {
        let name = caps.get(1)?;
        if name.as_str() != attribute {
            return None;
        }
        let value = caps.get(2)?.as_str().parse().ok()?;
        Some((name.start(), value))
    })
}

/// All numeric values of a `data-*` `attribute` in document order.
pub fn numeric_attributes(html: &str, attribute: &str) -> Vec<u64> {
    attribute_matches(html, attribute).map(|(_, value)| value).collect()
}

static SCRIPT_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)\b.*?</(script|style)\s*>").unwrap());
static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|li|h[1-6]|tr|pre|ul|ol|table|section|header|footer)\s*>")
        .unwrap()
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n(\s*\n)+").unwrap());

/// Convert an HTML fragment into display text.
///
/// Block-level closings become line breaks, tags are dropped, entities are
/// decoded and runs of blank lines collapse to one.
pub fn fragment_to_text(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE.replace_all(html, "");
    let with_breaks = BLOCK_BREAK.replace_all(&without_scripts, "\n");
    let without_tags = TAG.replace_all(&with_breaks, "");
    let decoded = decode_entities(&without_tags);

    let lines: Vec<&str> = decoded.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    BLANK_LINES.replace_all(&joined, "\n\n").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(body)
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "auml" => 'ä',
        "ouml" => 'ö',
        "uuml" => 'ü',
        "Auml" => 'Ä',
        "Ouml" => 'Ö',
        "Uuml" => 'Ü',
        "szlig" => 'ß',
        "hellip" => '…',
        "ndash" => '–',
        "mdash" => '—',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_script_tag() {
        assert_eq!(
            escape_html("<script>x</script>"),
            "&lt;script&gt;x&lt;/script&gt;"
        );
    }

    #[test]
    fn test_escape_ampersand_and_quotes() {
        assert_eq!(escape_html(r#"a & "b" 'c'"#), "a &amp; &quot;b&quot; &#39;c&#39;");
    }

    #[test]
    fn test_escaped_text_round_trips_through_display() {
        let raw = "if a < b && c > d { \"ok\" }";
        assert_eq!(fragment_to_text(&escape_html(raw)), raw);
    }

    #[test]
    fn test_fragment_to_text_breaks_blocks() {
        let html = r#"<div class="chat-message"><div class="message-header">NEXUS</div><p>Zeile&nbsp;1<br>Zeile 2</p></div>"#;
        assert_eq!(fragment_to_text(html), "NEXUS\nZeile 1\nZeile 2");
    }

    #[test]
    fn test_fragment_to_text_drops_scripts() {
        let html = "<p>sichtbar</p><script>alert(1)</script>";
        assert_eq!(fragment_to_text(html), "sichtbar");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(fragment_to_text("&#10003; Erledigt &#x2714;"), "✓ Erledigt ✔");
    }

    #[test]
    fn test_numeric_attribute() {
        let fragment = TrustedFragment::from_server(
            r#"<div class="chat-message" data-auftrag-id="17"><button class="btn-fertig">x</button></div>"#,
        );
        assert_eq!(fragment.numeric_attribute("data-auftrag-id"), Some(17));
        assert_eq!(fragment.numeric_attribute("data-fehler-id"), None);
    }

    #[test]
    fn test_split_by_attribute() {
        let fragment = TrustedFragment::from_server(
            r#"<ul><li class="item" data-uebergabe-id="4">a.md</li><li class="item" data-uebergabe-id="9">b.pdf</li></ul>"#,
        );
        let items = fragment.split_by_attribute("data-uebergabe-id");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0, 4);
        assert!(items[0].1.starts_with("<li"));
        assert_eq!(fragment_to_text(&items[0].1), "a.md");
        assert_eq!(fragment_to_text(&items[1].1), "b.pdf");
    }
}
