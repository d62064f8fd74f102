//! Article selection and the Atom feed.

use atom_syndication::{Content, Entry, Feed, Link, Person, Text};
use chrono::{DateTime, Utc};

use super::SiteUrl;
use crate::config::SiteConfig;
use crate::content::{Catalog, Page, PageError};
use crate::util::absolute_urls;

/// Articles listed on the home page.
pub const HOME_ARTICLES: usize = 8;

/// Articles included in the Atom feed.
pub const FEED_ARTICLES: usize = 10;

pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml";

/// Every article in the catalog, newest first.
///
/// The sort is stable, so articles sharing a date keep catalog order. Home
/// page and feed both take a prefix of this list.
pub fn select_articles(catalog: &Catalog) -> Vec<Page> {
    let mut articles: Vec<Page> = catalog
        .all()
        .map(|doc| Page::from_document(doc.clone()))
        .filter(Page::is_article)
        .collect();
    articles.sort_by(|a, b| b.date().cmp(&a.date()));
    articles
}

/// Tag URI identifying an article across feed regenerations.
pub fn atom_id(host: &str, date: DateTime<Utc>, abspath: &str) -> String {
    format!("tag:{},{}:{}", host, date.format("%Y-%m-%d"), abspath)
}

/// Feed id for an article: the explicit `feed_id`, else a tag URI.
pub fn entry_id(page: &Page, host: &str) -> Option<String> {
    if let Some(id) = page.feed_id() {
        return Some(id.to_string());
    }
    page.date().map(|date| atom_id(host, date, &page.abspath()))
}

/// Render the Atom feed for the newest articles.
pub fn build_feed(
    catalog: &Catalog,
    config: &SiteConfig,
    url: &SiteUrl,
) -> Result<String, PageError> {
    let articles: Vec<Page> = select_articles(catalog)
        .into_iter()
        .take(FEED_ARTICLES)
        .collect();
    tracing::debug!(articles = articles.len(), "building atom feed");

    let mut feed = Feed::default();
    feed.set_id(format!("tag:{},2009:/", url.host()));
    feed.set_title(config.title.as_str());
    if let Some(subtitle) = &config.subtitle {
        feed.set_subtitle(Some(Text::plain(subtitle.as_str())));
    }
    feed.set_links(vec![
        link(url.join("/articles.xml"), "self", ATOM_CONTENT_TYPE),
        link(url.join("/"), "alternate", "text/html"),
    ]);
    let authors = author(config).into_iter().collect::<Vec<_>>();
    feed.set_authors(authors.clone());

    // Atom requires <updated>; an empty feed is stamped when generated
    let updated = articles
        .first()
        .and_then(Page::date)
        .unwrap_or_else(Utc::now);
    feed.set_updated(updated.fixed_offset());

    let mut entries = Vec::with_capacity(articles.len());
    for page in &articles {
        entries.push(entry(page, config, url, &authors)?);
    }
    feed.set_entries(entries);

    Ok(feed.to_string())
}

fn entry(
    page: &Page,
    config: &SiteConfig,
    url: &SiteUrl,
    authors: &[Person],
) -> Result<Entry, PageError> {
    let mut entry = Entry::default();
    entry.set_title(page.heading()?);
    if let Some(id) = entry_id(page, url.host()) {
        entry.set_id(id);
    }
    entry.set_links(vec![link(url.join(&page.abspath()), "alternate", "text/html")]);

    if let Some(date) = page.date() {
        entry.set_published(Some(date.fixed_offset()));
        entry.set_updated(date.fixed_offset());
    }
    entry.set_authors(authors.to_vec());

    let mut content = Content::default();
    content.set_content_type(Some("html".to_string()));
    content.set_value(Some(absolute_urls(
        &page.body_html(&config.markdown)?,
        url.root(),
    )));
    entry.set_content(Some(content));

    Ok(entry)
}

fn link(href: String, rel: &str, mime_type: &str) -> Link {
    Link {
        href,
        rel: rel.to_string(),
        mime_type: Some(mime_type.to_string()),
        ..Default::default()
    }
}

fn author(config: &SiteConfig) -> Option<Person> {
    let author = config.author.as_ref()?;
    Some(Person {
        name: author.name.clone()?,
        email: author.email.clone(),
        uri: author.uri.clone(),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::config::AuthorConfig;
    use crate::content::page::tests::doc;

    fn catalog() -> Catalog {
        Catalog::from_documents([
            doc("", "# Home"),
            doc("about", "# About"),
            doc("blog/post-1", "---\ndate: 2024-01-01\n---\n# Post 1\n\nSee [about](/about)."),
            doc("blog/post-2", "---\ndate: 2024-02-01\n---\n# Post 2"),
            doc("blog/post-3", "---\ndate: 2024-01-01\nfeed_id: urn:custom:3\n---\n# Post 3"),
        ])
    }

    fn paths(pages: &[Page]) -> Vec<&str> {
        pages.iter().map(Page::path).collect()
    }

    #[test]
    fn test_select_articles_orders_newest_first() {
        let catalog = catalog();
        let articles = select_articles(&catalog);
        // Same-date articles keep catalog order
        assert_eq!(
            paths(&articles),
            vec!["blog/post-2", "blog/post-1", "blog/post-3"]
        );
    }

    #[test]
    fn test_select_articles_excludes_undated() {
        let catalog = catalog();
        assert!(
            select_articles(&catalog)
                .iter()
                .all(|p| p.path() != "about" && !p.path().is_empty())
        );
    }

    #[test]
    fn test_atom_id_is_pure() {
        let date = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let id = atom_id("example.com", date, "/blog/post-2");
        assert_eq!(id, "tag:example.com,2024-02-01:/blog/post-2");
        assert_eq!(id, atom_id("example.com", date, "/blog/post-2"));
        assert_ne!(id, atom_id("example.org", date, "/blog/post-2"));
        assert_ne!(id, atom_id("example.com", date, "/blog/post-1"));
        assert_ne!(
            id,
            atom_id(
                "example.com",
                Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap(),
                "/blog/post-2"
            )
        );
    }

    #[test]
    fn test_entry_id_prefers_front_matter() {
        let catalog = catalog();
        let articles = select_articles(&catalog);
        assert_eq!(
            entry_id(&articles[2], "example.com").as_deref(),
            Some("urn:custom:3")
        );
        assert_eq!(
            entry_id(&articles[1], "example.com").as_deref(),
            Some("tag:example.com,2024-01-01:/blog/post-1")
        );
    }

    #[test]
    fn test_build_feed() {
        let catalog = catalog();
        let config = SiteConfig::new("My Site");
        let url = SiteUrl::resolve(Some("example.com"), None);
        let xml = build_feed(&catalog, &config, &url).unwrap();

        assert!(xml.contains("<id>tag:example.com,2009:/</id>"));
        assert!(xml.contains("My Site"));
        let post_2 = xml.find("tag:example.com,2024-02-01:/blog/post-2").unwrap();
        let post_1 = xml.find("tag:example.com,2024-01-01:/blog/post-1").unwrap();
        assert!(post_2 < post_1);
        // Root-relative links in bodies become absolute
        assert!(xml.contains("http://example.com/about"));
    }

    #[test]
    fn test_build_feed_includes_author() {
        let catalog = catalog();
        let mut config = SiteConfig::new("My Site");
        config.author = Some(AuthorConfig {
            name: Some("Jo Writer".to_string()),
            uri: Some("http://example.com/about".to_string()),
            email: Some("jo@example.com".to_string()),
        });
        let xml = build_feed(&catalog, &config, &SiteUrl::resolve(Some("example.com"), None)).unwrap();

        assert!(xml.contains("<name>Jo Writer</name>"));
        assert!(xml.contains("<email>jo@example.com</email>"));
        // Feed-level author plus one per entry
        assert_eq!(xml.matches("<author>").count(), 4);
    }

    #[test]
    fn test_build_feed_limits_entries() {
        let docs: Vec<_> = (1..=12)
            .map(|day| {
                doc(
                    &format!("post-{day}"),
                    &format!("---\ndate: 2024-03-{day:02}\n---\n# Post {day}"),
                )
            })
            .collect();
        let catalog = Catalog::from_documents(docs);
        let xml = build_feed(
            &catalog,
            &SiteConfig::new("Site"),
            &SiteUrl::resolve(None, None),
        )
        .unwrap();
        assert_eq!(xml.matches("<entry>").count(), FEED_ARTICLES);
        assert!(xml.contains("/post-12"));
        assert!(!xml.contains("/post-2<"));
    }

    #[test]
    fn test_build_feed_missing_heading_is_error() {
        let catalog = Catalog::from_documents([doc("x", "---\ndate: 2024-01-01\n---\nno heading")]);
        let result = build_feed(&catalog, &SiteConfig::new("Site"), &SiteUrl::resolve(None, None));
        assert!(matches!(result, Err(PageError::MissingHeading(_))));
    }
}
