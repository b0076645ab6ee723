use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::domain::{Item, Source, DEFAULT_GROUP};

const FALLBACK_DISPLAY_NAME: &str = "Feed digest";

/// One source's new items within a group digest.
#[derive(Debug, Clone, Copy)]
pub struct DigestSection<'a> {
    pub source: &'a Source,
    pub items: &'a [Item],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Group name unless it's the default group, then the lone source's title,
/// then a generic label.
pub fn display_name(group: &str, sections: &[DigestSection<'_>]) -> String {
    if !group.is_empty() && group != DEFAULT_GROUP {
        return group.to_string();
    }
    match sections {
        [only] => only.source.title.clone(),
        _ => FALLBACK_DISPLAY_NAME.to_string(),
    }
}

/// Parse an RFC 2822 or RFC 3339 date and show it as `D.M. at HH:MM` (UTC).
pub fn format_published(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let parsed = DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()?;
    Some(
        parsed
            .with_timezone(&Utc)
            .format("%-d.%-m. at %H:%M")
            .to_string(),
    )
}

pub fn render_digest(group: &str, sections: &[DigestSection<'_>]) -> Digest {
    let name = display_name(group, sections);

    let mut text = vec![format!("{}\n", name)];
    let mut html = vec![format!(
        "<div style=\"font-size: 1.2em; line-height: 1.6;\">\n<h2>{}</h2>",
        encode_text(&name)
    )];

    for section in sections {
        let prefix = section.source.link_prefix();

        let mut lines = vec![String::new(), section.source.title.clone()];
        let mut blocks = vec![format!("<h3>{}</h3>", encode_text(&section.source.title))];

        for item in section.items {
            let link = item.prefixed_link(prefix);
            let date = item.published.as_deref().and_then(format_published);
            let summary = item.summary.as_deref().filter(|s| !s.is_empty());

            match &date {
                Some(date) => lines.push(format!("{} ({}) - {}", item.title, date, link)),
                None => lines.push(format!("{} - {}", item.title, link)),
            }
            if let Some(summary) = &summary {
                lines.push(format!("  {}", summary));
            }

            let mut block = format!(
                "<div style=\"margin-bottom: 1.2rem;\"><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                encode_double_quoted_attribute(&link),
                encode_text(&item.title)
            );
            if let Some(date) = &date {
                block.push_str(&format!(
                    " <span style=\"color: #6b7280;\">{}</span>",
                    encode_text(date)
                ));
            }
            if let Some(summary) = &summary {
                block.push_str(&format!(
                    "<p style=\"margin-top: 0.5rem;\">{}</p>",
                    encode_text(summary)
                ));
            }
            block.push_str("</div>");
            blocks.push(block);
        }

        text.push(lines.join("\n"));
        html.push(blocks.join("\n"));
    }

    html.push("</div>".to_string());

    Digest {
        subject: name,
        text: text.join("\n"),
        html: html.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceMode;

    fn source(title: &str) -> Source {
        let mut source = Source::new("s1", "https://example.com/feed", SourceMode::Syndication);
        source.title = title.to_string();
        source
    }

    #[test]
    fn test_display_name_prefers_group() {
        let a = source("Blog");
        let items = vec![Item::new("1", "T", "https://a/1")];
        let sections = [DigestSection {
            source: &a,
            items: &items,
        }];
        assert_eq!(display_name("tech", &sections), "tech");
        assert_eq!(display_name("default", &sections), "Blog");
    }

    #[test]
    fn test_display_name_fallback_for_many_sources() {
        let a = source("A");
        let b = source("B");
        let items = vec![Item::new("1", "T", "https://a/1")];
        let sections = [
            DigestSection {
                source: &a,
                items: &items,
            },
            DigestSection {
                source: &b,
                items: &items,
            },
        ];
        assert_eq!(display_name("default", &sections), "Feed digest");
    }

    #[test]
    fn test_format_published() {
        assert_eq!(
            format_published("Tue, 05 Mar 2024 09:07:00 +0000").as_deref(),
            Some("5.3. at 09:07")
        );
        assert_eq!(
            format_published("2024-12-24T18:30:00+02:00").as_deref(),
            Some("24.12. at 16:30")
        );
        assert_eq!(format_published("yesterday"), None);
    }

    #[test]
    fn test_render_applies_prefix_and_escapes() {
        let mut feed = source("News & Views");
        feed.link_prefix = Some("https://proxy/?u=".into());
        let mut item = Item::new("1", "A <b>bold</b> claim", "https://a/1");
        item.summary = Some("Some & more, x < y".into());
        item.published = Some("2024-03-05T09:07:00Z".into());
        let items = vec![item];

        let digest = render_digest(
            "default",
            &[DigestSection {
                source: &feed,
                items: &items,
            }],
        );

        assert_eq!(digest.subject, "News & Views");
        assert!(digest
            .text
            .contains("A <b>bold</b> claim (5.3. at 09:07) - https://proxy/?u=https://a/1"));
        assert!(digest.text.contains("  Some & more, x < y"));
        assert!(digest.html.contains("<h3>News &amp; Views</h3>"));
        assert!(digest.html.contains("href=\"https://proxy/?u=https://a/1\""));
        assert!(digest.html.contains("A &lt;b&gt;bold&lt;/b&gt; claim"));
        assert!(digest
            .html
            .contains("<p style=\"margin-top: 0.5rem;\">Some &amp; more, x &lt; y</p>"));
    }

    #[test]
    fn test_render_without_optional_fields() {
        let feed = source("Blog");
        let items = vec![Item::new("1", "Plain", "https://a/1")];
        let digest = render_digest(
            "tech",
            &[DigestSection {
                source: &feed,
                items: &items,
            }],
        );
        assert_eq!(digest.text, "tech\n\n\nBlog\nPlain - https://a/1");
        assert!(!digest.html.contains("<span"));
        assert!(!digest.html.contains("<p"));
    }
}
