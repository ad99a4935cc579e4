use async_trait::async_trait;
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

use crate::error::FetchError;
use crate::feed::types::FeedSourceAdapter;
use crate::model::FeedEntry;
use crate::registry::FeedSource;

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "media:content", default)]
    media: Vec<MediaRef>,
    enclosure: Option<MediaRef>,
}

/// `<media:content url=".."/>` or `<enclosure url=".." type="image/jpeg"/>`.
#[derive(Debug, Deserialize)]
struct MediaRef {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@type")]
    kind: Option<String>,
}

impl Item {
    /// First media:content, then an image enclosure, then the first `<img>` in the description.
    fn image(&self) -> Option<String> {
        self.media
            .first()
            .and_then(|m| m.url.clone())
            .or_else(|| {
                self.enclosure
                    .as_ref()
                    .filter(|e| e.kind.as_deref().map_or(true, |k| k.starts_with("image/")))
                    .and_then(|e| e.url.clone())
            })
            .or_else(|| self.description.as_deref().and_then(first_img_src))
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
    }
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    published: Option<String>,
    updated: Option<String>,
}
#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "@type")]
    kind: Option<String>,
}

impl AtomEntry {
    /// `rel="alternate"` (or no rel) is the article link.
    fn article_link(&self) -> Option<String> {
        self.link
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.link.first())
            .and_then(|l| l.href.clone())
    }

    /// Image enclosure link, else the first `<img>` in summary/content.
    fn image(&self) -> Option<String> {
        self.link
            .iter()
            .find(|l| {
                l.rel.as_deref() == Some("enclosure")
                    && l.kind.as_deref().map_or(true, |k| k.starts_with("image/"))
            })
            .and_then(|l| l.href.clone())
            .or_else(|| {
                [&self.summary, &self.content]
                    .into_iter()
                    .flatten()
                    .find_map(|t| first_img_src(&t.value))
            })
    }
}

/// `src` of the first `<img>` tag in an HTML fragment.
fn first_img_src(html: &str) -> Option<String> {
    static RE_IMG: OnceCell<Regex> = OnceCell::new();
    let re = RE_IMG.get_or_init(|| {
        Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).unwrap()
    });
    re.captures(html).map(|c| c[1].to_string())
}

/// HTTP adapter for RSS 2.0 and Atom feeds.
pub struct RssFeedAdapter {
    client: reqwest::Client,
}

impl RssFeedAdapter {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("ai-news-pipeline/0.1 (+rss)")
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSourceAdapter for RssFeedAdapter {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<FeedEntry>, FetchError> {
        let resp = self.client.get(&source.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        parse_feed(&body, source)
    }

    fn name(&self) -> &'static str {
        "rss"
    }
}

/// Parse an RSS 2.0 or Atom document into entries tagged with `source` metadata.
/// Items without a link are dropped: they cannot be deduplicated.
pub fn parse_feed(xml: &str, source: &FeedSource) -> Result<Vec<FeedEntry>, FetchError> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let out = match detect_format(&xml_clean) {
        Some(FeedFormat::Rss) => {
            let rss: Rss = from_str(&xml_clean)
                .map_err(|e| FetchError::Parse(format!("rss: {e}")))?;
            rss.channel
                .item
                .into_iter()
                .filter_map(|it| {
                    let image = it.image();
                    let link = it.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;
                    Some(FeedEntry {
                        title: it.title.unwrap_or_default(),
                        summary: it.description.unwrap_or_default(),
                        link,
                        published_at: it.pub_date.unwrap_or_default(),
                        source_name: source.name.clone(),
                        source_region_hint: source.region.clone(),
                        image,
                    })
                })
                .collect::<Vec<_>>()
        }
        Some(FeedFormat::Atom) => {
            let atom: AtomFeed = from_str(&xml_clean)
                .map_err(|e| FetchError::Parse(format!("atom: {e}")))?;
            atom.entry
                .into_iter()
                .filter_map(|e| {
                    let link = e
                        .article_link()
                        .map(|l| l.trim().to_string())
                        .filter(|l| !l.is_empty())?;
                    let image = e.image();
                    let summary = e
                        .summary
                        .or(e.content)
                        .map(|t| t.value)
                        .unwrap_or_default();
                    Some(FeedEntry {
                        title: e.title.map(|t| t.value).unwrap_or_default(),
                        summary,
                        link,
                        published_at: e.published.or(e.updated).unwrap_or_default(),
                        source_name: source.name.clone(),
                        source_region_hint: source.region.clone(),
                        image,
                    })
                })
                .collect()
        }
        None => {
            return Err(FetchError::Parse(
                "unrecognized feed format (expected RSS 2.0 <rss> or Atom <feed>)".to_string(),
            ))
        }
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("pipeline_parse_ms").record(ms);
    counter!("pipeline_entries_fetched_total").increment(out.len() as u64);
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedFormat {
    Rss,
    Atom,
}

/// Sniff the root element; the serde structs alone would accept any well-formed XML.
fn detect_format(xml: &str) -> Option<FeedFormat> {
    let head: String = xml.chars().take(2048).collect::<String>().to_ascii_lowercase();
    // RSS 1.0 has <channel> too, but its items sit beside it
    if head.contains("<rdf:rdf") {
        None
    } else if head.contains("<rss") || head.contains("<channel") {
        Some(FeedFormat::Rss)
    } else if head.contains("<feed") {
        Some(FeedFormat::Atom)
    } else {
        None
    }
}

/// XML only knows five named entities; feeds routinely use HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
