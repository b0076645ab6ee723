//! RSS/Atom parsing into normalized [`Item`]s.
//!
//! The document is read once as an event stream. RSS `<item>` elements under
//! `rss/channel` and Atom `<entry>` elements under `feed` are both collected
//! from the same pass; RSS items come first in the output.

use std::fmt::Display;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use url::Url;
use uuid::Uuid;

use crate::app::{FeedwatchError, Result};
use crate::domain::Item;
use crate::scraper::strip_html;

const RSS_ITEM_PATH: [&str; 3] = ["rss", "channel", "item"];
const ATOM_ENTRY_PATH: [&str; 2] = ["feed", "entry"];

const UNTITLED_ITEM: &str = "Untitled item";
const UNTITLED_ENTRY: &str = "Untitled entry";

#[derive(Debug, Default)]
struct RssDraft {
    guid: Option<String>,
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
}

#[derive(Debug, Default)]
struct AtomLink {
    href: Option<String>,
    rel: Option<String>,
}

#[derive(Debug, Default)]
struct AtomDraft {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    content: Option<String>,
    updated: Option<String>,
    published: Option<String>,
    links: Vec<AtomLink>,
}

#[derive(Debug)]
enum Draft {
    Rss(RssDraft),
    Atom(AtomDraft),
}

/// An `<item>` or `<entry>` being read. Children count as fields only when
/// they share the entry's namespace prefix.
struct OpenEntry {
    draft: Draft,
    depth: usize,
    prefix: Option<String>,
}

/// Text of a direct child of the current entry, gathered until its end tag.
/// Children from other namespaces are captured under an empty name.
struct Capture {
    name: String,
    depth: usize,
    text: String,
}

#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse `xml` into items. `fallback_url` stands in for missing links and
    /// is the base for relative ones.
    pub fn normalize(&self, xml: &str, fallback_url: &str) -> Result<Vec<Item>> {
        let (rss, atom) = read_drafts(xml)?;

        let mut items = Vec::with_capacity(rss.len() + atom.len());
        items.extend(rss.into_iter().map(|d| rss_item(d, fallback_url)));
        items.extend(atom.into_iter().map(|d| atom_item(d, fallback_url)));
        Ok(items)
    }
}

fn invalid(err: impl Display) -> FeedwatchError {
    FeedwatchError::Parse(format!("Invalid RSS/Atom feed: {}", err))
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase()
}

fn prefix(e: &BytesStart) -> Option<String> {
    e.name()
        .prefix()
        .map(|p| String::from_utf8_lossy(p.as_ref()).to_lowercase())
}

fn path_is(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

fn read_drafts(xml: &str) -> Result<(Vec<RssDraft>, Vec<AtomDraft>)> {
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<OpenEntry> = None;
    let mut capture: Option<Capture> = None;
    let mut rss = Vec::new();
    let mut atom = Vec::new();

    loop {
        match reader.read_event().map_err(invalid)? {
            Event::Start(e) => {
                let name = local_name(&e);
                path.push(name.clone());
                let depth = path.len();

                match current.as_mut() {
                    None => {
                        let draft = if path_is(&path, &RSS_ITEM_PATH) {
                            Some(Draft::Rss(RssDraft::default()))
                        } else if path_is(&path, &ATOM_ENTRY_PATH) {
                            Some(Draft::Atom(AtomDraft::default()))
                        } else {
                            None
                        };
                        current = draft.map(|draft| OpenEntry {
                            draft,
                            depth,
                            prefix: prefix(&e),
                        });
                    }
                    Some(entry) if depth == entry.depth + 1 && capture.is_none() => {
                        let own = prefix(&e) == entry.prefix;
                        if let (Draft::Atom(atom), "link", true) =
                            (&mut entry.draft, name.as_str(), own)
                        {
                            atom.links.push(atom_link(&e, &reader)?);
                        }
                        capture = Some(Capture {
                            name: if own { name } else { String::new() },
                            depth,
                            text: String::new(),
                        });
                    }
                    Some(_) => {}
                }
            }
            Event::Empty(e) => {
                if let Some(entry) = current.as_mut() {
                    let own = prefix(&e) == entry.prefix;
                    if let (Draft::Atom(atom), true) = (&mut entry.draft, own) {
                        if path.len() == entry.depth && local_name(&e) == "link" {
                            atom.links.push(atom_link(&e, &reader)?);
                        }
                    }
                }
            }
            Event::Text(t) => {
                if let Some(c) = capture.as_mut() {
                    c.text.push_str(&t.decode().map_err(invalid)?);
                }
            }
            Event::CData(t) => {
                if let Some(c) = capture.as_mut() {
                    c.text.push_str(&t.decode().map_err(invalid)?);
                }
            }
            Event::GeneralRef(r) => {
                if let Some(c) = capture.as_mut() {
                    if let Some(ch) = r.resolve_char_ref().map_err(invalid)? {
                        c.text.push(ch);
                    } else {
                        let name = r.decode().map_err(invalid)?;
                        match resolve_predefined_entity(&name) {
                            Some(resolved) => c.text.push_str(resolved),
                            // HTML entities are left for the renderer to decode.
                            None => {
                                c.text.push('&');
                                c.text.push_str(&name);
                                c.text.push(';');
                            }
                        }
                    }
                }
            }
            Event::End(_) => {
                let depth = path.len();
                if capture.as_ref().is_some_and(|c| c.depth == depth) {
                    if let (Some(c), Some(entry)) = (capture.take(), current.as_mut()) {
                        assign(&mut entry.draft, c);
                    }
                }
                if current.as_ref().is_some_and(|entry| entry.depth == depth) {
                    match current.take().map(|entry| entry.draft) {
                        Some(Draft::Rss(d)) => rss.push(d),
                        Some(Draft::Atom(d)) => atom.push(d),
                        None => {}
                    }
                }
                path.pop();
            }
            Event::Eof => {
                if let Some(open) = path.last() {
                    return Err(invalid(format!(
                        "unexpected end of document inside <{}>",
                        open
                    )));
                }
                break;
            }
            _ => {}
        }
    }

    Ok((rss, atom))
}

fn atom_link(e: &BytesStart, reader: &Reader<&[u8]>) -> Result<AtomLink> {
    let mut link = AtomLink::default();
    for attr in e.attributes() {
        let attr = attr.map_err(invalid)?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(invalid)?;
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match attr.key.local_name().as_ref() {
            b"href" => link.href = Some(value.to_string()),
            b"rel" => link.rel = Some(value.to_string()),
            _ => {}
        }
    }
    Ok(link)
}

fn assign(draft: &mut Draft, capture: Capture) {
    let text = capture.text.trim();
    if text.is_empty() {
        return;
    }
    let value = Some(text.to_string());

    match draft {
        Draft::Rss(d) => match capture.name.as_str() {
            "guid" => d.guid = value,
            "title" => d.title = value,
            "link" => d.link = value,
            "description" => d.description = value,
            "pubdate" => d.pub_date = value,
            _ => {}
        },
        Draft::Atom(d) => match capture.name.as_str() {
            "id" => d.id = value,
            "title" => d.title = value,
            "summary" => d.summary = value,
            "content" => d.content = value,
            "updated" => d.updated = value,
            "published" => d.published = value,
            // `<link>https://...</link>` written RSS-style inside an entry.
            "link" => {
                if let Some(last) = d.links.last_mut() {
                    if last.href.is_none() {
                        last.href = value;
                    }
                }
            }
            _ => {}
        },
    }
}

/// Makes a feed link absolute, joining relative ones onto the feed URL.
fn resolve_link(raw: &str, base: &str) -> String {
    match Url::parse(raw) {
        Ok(_) => raw.to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base)
            .and_then(|b| b.join(raw))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}

fn rss_item(draft: RssDraft, fallback_url: &str) -> Item {
    let link = draft.link.map(|l| resolve_link(&l, fallback_url));
    let id = draft
        .guid
        .or_else(|| link.clone())
        .or_else(|| draft.title.clone())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Item {
        id,
        title: draft.title.unwrap_or_else(|| UNTITLED_ITEM.to_string()),
        link: link.unwrap_or_else(|| fallback_url.to_string()),
        summary: plain_summary(draft.description),
        published: draft.pub_date,
    }
}

/// Feed descriptions carry markup; items hold plain text.
fn plain_summary(html: Option<String>) -> Option<String> {
    html.map(|h| strip_html(&h)).filter(|s| !s.is_empty())
}

fn pick_atom_link(links: &[AtomLink]) -> Option<&str> {
    let first = || links.first().and_then(|l| l.href.as_deref());
    if links.len() > 1 {
        links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .and_then(|l| l.href.as_deref())
            .or_else(first)
    } else {
        first()
    }
}

fn atom_item(draft: AtomDraft, fallback_url: &str) -> Item {
    let link = pick_atom_link(&draft.links).map(|l| resolve_link(l, fallback_url));
    let id = draft
        .id
        .or_else(|| link.clone())
        .or_else(|| draft.title.clone())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Item {
        id,
        title: draft.title.unwrap_or_else(|| UNTITLED_ENTRY.to_string()),
        link: link.unwrap_or_else(|| fallback_url.to_string()),
        summary: plain_summary(draft.summary.or(draft.content)),
        published: draft.updated.or(draft.published),
    }
}
