use html_escape::decode_html_entities;

/// Removes tags, decodes entities and collapses whitespace runs to a single space.
///
/// A `<` with no closing `>` is kept as literal text.
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        match rest[start..].find('>') {
            Some(end) => rest = &rest[start + end + 1..],
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    collapse_whitespace(&decode_html_entities(&out))
}

/// Whitespace runs (including non-breaking spaces) become one space; ends trimmed.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(
            strip_html("Fish &amp; Chips &lt;3 &quot;ok&quot; &#39;yes&#39; &apos;no&apos;"),
            "Fish & Chips <3 \"ok\" 'yes' 'no'"
        );
    }

    #[test]
    fn test_nbsp_becomes_space() {
        assert_eq!(strip_html("a&nbsp;&nbsp;b"), "a b");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(strip_html("  line one\n\n\t line   two  "), "line one line two");
    }

    #[test]
    fn test_unclosed_angle_bracket_kept() {
        assert_eq!(strip_html("1 < 2"), "1 < 2");
    }

    #[test]
    fn test_empty_after_strip() {
        assert_eq!(strip_html("<br/> <img src=x>"), "");
    }
}
