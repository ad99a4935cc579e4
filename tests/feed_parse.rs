// tests/feed_parse.rs
use ai_news_pipeline::feed::rss::parse_feed;
use ai_news_pipeline::fingerprint::clean_text;
use ai_news_pipeline::FeedSource;

fn src(name: &str, region: &str) -> FeedSource {
    FeedSource {
        name: name.to_string(),
        url: "https://feeds.test/x".to_string(),
        region: region.to_string(),
        weight: None,
    }
}

#[test]
fn rss_fixture_parses_and_drops_linkless_items() {
    let xml = include_str!("fixtures/vnexpress_rss.xml");
    let items = parse_feed(xml, &src("VnExpress", "VN")).expect("parse rss");
    assert_eq!(items.len(), 2);

    let first = &items[0];
    assert_eq!(first.title, "OpenAI ra mắt mô hình mới");
    assert_eq!(first.link, "https://vnexpress.net/openai-ra-mat-mo-hinh-moi-1.html");
    assert_eq!(first.published_at, "Mon, 14 Oct 2024 08:00:00 +0700");
    assert_eq!(first.source_name, "VnExpress");
    assert_eq!(first.source_region_hint, "VN");
    // markup survives parsing and is stripped by text cleaning
    assert!(first.summary.contains("<img"));
    assert_eq!(clean_text(&first.summary), "Mô hình mới được công bố.");
}

#[test]
fn rss_image_prefers_media_content_then_inline_img() {
    let xml = include_str!("fixtures/vnexpress_rss.xml");
    let items = parse_feed(xml, &src("VnExpress", "VN")).expect("parse rss");
    assert_eq!(items[0].image.as_deref(), Some("a.jpg"));
    assert_eq!(
        items[1].image.as_deref(),
        Some("https://vnexpress.net/img/gold.jpg")
    );
}

#[test]
fn atom_image_comes_from_enclosure_link() {
    let xml = include_str!("fixtures/huggingface_atom.xml");
    let items = parse_feed(xml, &src("Hugging Face", "GLOBAL")).expect("parse atom");
    assert_eq!(
        items[0].image.as_deref(),
        Some("https://huggingface.co/img/lb.png")
    );
    assert_eq!(items[1].image, None);
}

#[test]
fn atom_fixture_prefers_alternate_link_and_falls_back_to_content() {
    let xml = include_str!("fixtures/huggingface_atom.xml");
    let items = parse_feed(xml, &src("Hugging Face", "GLOBAL")).expect("parse atom");
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].title, "Open LLM Leaderboard v3");
    assert_eq!(items[0].link, "https://huggingface.co/blog/leaderboard-v3");
    assert_eq!(items[0].summary, "New tasks & harder evals.");
    assert_eq!(items[0].published_at, "2024-10-14T09:00:00Z");

    assert_eq!(items[1].link, "https://huggingface.co/blog/fine-tuning");
    assert_eq!(items[1].summary, "Step by step.");
    assert_eq!(items[1].published_at, "2024-10-13T09:00:00Z");
}
