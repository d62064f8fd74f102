//! Sitemap generation.

use chrono::{DateTime, Utc};

use super::SiteUrl;
use crate::content::Catalog;
use crate::content::paths::abspath;
use crate::util::escape_xml;

pub const SITEMAP_CONTENT_TYPE: &str = "application/xml";

/// Latest `last_modified` across the catalog, or `None` when it is empty.
pub fn last_modified(catalog: &Catalog) -> Option<DateTime<Utc>> {
    catalog
        .all()
        .map(|doc| doc.last_modified)
        .reduce(|latest, modified| if modified > latest { modified } else { latest })
}

/// Render the sitemap: the home page first, then every document.
pub fn build_sitemap(catalog: &Catalog, url: &SiteUrl) -> String {
    tracing::debug!(count = catalog.len(), "generating sitemap");

    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    xml.push('\n');

    push_url(
        &mut xml,
        &url.join("/"),
        last_modified(catalog),
        Some(("daily", "1.0")),
    );
    for doc in catalog.all().filter(|doc| !doc.path.is_empty()) {
        push_url(
            &mut xml,
            &url.join(&abspath(&doc.path)),
            Some(doc.last_modified),
            None,
        );
    }

    xml.push_str("</urlset>\n");
    xml
}

fn push_url(
    xml: &mut String,
    loc: &str,
    lastmod: Option<DateTime<Utc>>,
    frequency: Option<(&str, &str)>,
) {
    xml.push_str("  <url>\n");
    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(loc)));
    if let Some((changefreq, priority)) = frequency {
        xml.push_str(&format!("    <changefreq>{changefreq}</changefreq>\n"));
        xml.push_str(&format!("    <priority>{priority}</priority>\n"));
    }
    if let Some(lastmod) = lastmod {
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            lastmod.format("%Y-%m-%dT%H:%M:%SZ")
        ));
    }
    xml.push_str("  </url>\n");
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::content::page::tests::doc_modified;

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 8, 0, 0).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::from_documents([
            doc_modified("", "# Home", at(1, 5)),
            doc_modified("about", "# About", at(3, 9)),
            doc_modified("blog/post-1", "# Post 1", at(2, 1)),
            doc_modified("blog/post-2", "# Post 2", at(1, 20)),
        ])
    }

    #[test]
    fn test_last_modified_is_maximum() {
        assert_eq!(last_modified(&catalog()), Some(at(3, 9)));
    }

    #[test]
    fn test_last_modified_empty_store() {
        assert_eq!(last_modified(&Catalog::from_documents([])), None);
    }

    #[test]
    fn test_build_sitemap() {
        let url = SiteUrl::resolve(Some("example.com"), None);
        let xml = build_sitemap(&catalog(), &url);

        let home = xml.find("<loc>http://example.com/</loc>").unwrap();
        let about = xml.find("<loc>http://example.com/about</loc>").unwrap();
        assert!(home < about);
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<lastmod>2024-03-09T08:00:00Z</lastmod>"));
        assert!(xml.contains("<lastmod>2024-01-20T08:00:00Z</lastmod>"));
        // Home appears once, not again for the root document
        assert_eq!(xml.matches("<loc>http://example.com/</loc>").count(), 1);
        assert_eq!(xml.matches("<url>").count(), 4);
    }

    #[test]
    fn test_build_sitemap_empty_store_omits_lastmod() {
        let xml = build_sitemap(&Catalog::from_documents([]), &SiteUrl::resolve(None, None));
        assert!(xml.contains("<loc>http://localhost/</loc>"));
        assert!(!xml.contains("<lastmod>"));
    }
}
