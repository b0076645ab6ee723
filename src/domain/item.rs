use serde::{Deserialize, Serialize};

/// One syndication entry or scraped record, normalized.
///
/// Items only live for the duration of a run; the `id` is scoped to the
/// source that produced it and is what seen-tracking keys on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub link: String,
    /// Plain text; renderers escape it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            link: link.into(),
            summary: None,
            published: None,
        }
    }

    /// Link as it should appear in a notification, with the source's prefix applied.
    pub fn prefixed_link(&self, prefix: Option<&str>) -> String {
        match prefix {
            Some(p) if !p.is_empty() => format!("{}{}", p, self.link),
            _ => self.link.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_link_applies_prefix() {
        let item = Item::new("1", "T", "https://example.com/a");
        assert_eq!(
            item.prefixed_link(Some("https://proxy.example/?u=")),
            "https://proxy.example/?u=https://example.com/a"
        );
    }

    #[test]
    fn test_prefixed_link_without_prefix() {
        let item = Item::new("1", "T", "https://example.com/a");
        assert_eq!(item.prefixed_link(None), "https://example.com/a");
        assert_eq!(item.prefixed_link(Some("")), "https://example.com/a");
    }

    #[test]
    fn test_optional_fields_omitted_in_json() {
        let item = Item::new("1", "T", "https://example.com/a");
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("summary"));
        assert!(!json.contains("published"));
    }
}
