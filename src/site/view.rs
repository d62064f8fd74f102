//! View models bound to templates, one per route.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SiteUrl;
use super::feed::{HOME_ARTICLES, select_articles};
use super::menu::{self, MenuLink};
use crate::config::{AuthorConfig, SiteConfig};
use crate::content::{Catalog, Page, PageError, render_markdown};

/// Site-wide values, available as `site.*`.
#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<AuthorConfig>,
    pub google_analytics_code: Option<String>,
    pub url: String,
}

impl SiteView {
    pub fn new(config: &SiteConfig, url: &SiteUrl) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            description: config.description.clone(),
            keywords: config.keywords.clone(),
            author: config.author.clone(),
            google_analytics_code: config.google_analytics_code.clone(),
            url: url.root().to_string(),
        }
    }
}

/// Fields every layout may use.
#[derive(Debug, Clone, Serialize)]
pub struct CommonView {
    pub site: SiteView,
    /// Contents of `<title>`
    pub title: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub body_class: Option<String>,
    pub menu: Vec<MenuLink>,
    pub theme: serde_json::Value,
}

impl CommonView {
    /// Site defaults with no menu, for stylesheets and error pages.
    pub fn bare(config: &SiteConfig, url: &SiteUrl) -> Self {
        let theme = match &config.theme {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            theme => theme.clone(),
        };
        Self {
            site: SiteView::new(config, url),
            title: config.title.clone(),
            description: config.description.clone(),
            keywords: config.keywords.clone(),
            body_class: None,
            menu: Vec::new(),
            theme,
        }
    }

    /// Site defaults with the navigation menu rooted at `/`.
    pub fn with_menu(
        catalog: &Catalog,
        config: &SiteConfig,
        url: &SiteUrl,
    ) -> Result<Self, PageError> {
        let mut view = Self::bare(config, url);
        view.menu = menu::build(catalog, "/", config.menu_depth).to_links()?;
        Ok(view)
    }
}

/// A link to another page.
#[derive(Debug, Clone, Serialize)]
pub struct LinkView {
    pub heading: String,
    pub url: String,
}

impl LinkView {
    fn from_page(page: &Page) -> Result<Self, PageError> {
        Ok(Self {
            heading: page.heading()?.to_string(),
            url: page.abspath(),
        })
    }
}

/// An article in a listing.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    pub heading: String,
    pub url: String,
    pub date: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub read_more: String,
    pub body: String,
}

impl ArticleView {
    fn from_page(page: &Page, config: &SiteConfig) -> Result<Self, PageError> {
        let summary = page
            .summary()
            .map(|summary| {
                render_markdown(summary, &config.markdown).map_err(|source| {
                    PageError::Markdown {
                        path: page.abspath(),
                        source,
                    }
                })
            })
            .transpose()?;
        Ok(Self {
            heading: page.heading()?.to_string(),
            url: page.abspath(),
            date: page.date(),
            summary,
            read_more: page.read_more().to_string(),
            body: page.body_html(&config.markdown)?,
        })
    }
}

fn article_views(pages: &[Page], config: &SiteConfig) -> Result<Vec<ArticleView>, PageError> {
    pages
        .iter()
        .map(|page| ArticleView::from_page(page, config))
        .collect()
}

/// The home page.
#[derive(Debug, Serialize)]
pub struct HomeView {
    #[serde(flatten)]
    pub common: CommonView,
    pub heading: String,
    /// Body of the root document, if there is one
    pub body: Option<String>,
    pub articles: Vec<ArticleView>,
}

impl HomeView {
    pub fn build(catalog: &Catalog, config: &SiteConfig, url: &SiteUrl) -> Result<Self, PageError> {
        let mut common = CommonView::with_menu(catalog, config, url)?;
        common.title = match &config.subtitle {
            Some(subtitle) => format!("{} - {}", config.title, subtitle),
            None => config.title.clone(),
        };
        common.body_class = Some("home".to_string());

        let body = catalog
            .find("")
            .ok()
            .map(|doc| Page::from_document(doc).body_html(&config.markdown))
            .transpose()?;

        let articles: Vec<Page> = select_articles(catalog)
            .into_iter()
            .take(HOME_ARTICLES)
            .collect();

        Ok(Self {
            common,
            heading: config.title.clone(),
            body,
            articles: article_views(&articles, config)?,
        })
    }
}

/// The current page, available as `page.*`.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub heading: String,
    pub url: String,
    pub date: Option<DateTime<Utc>>,
    pub last_modified: DateTime<Utc>,
    pub body: String,
    pub parent: Option<LinkView>,
    pub children: Vec<LinkView>,
    /// Custom front matter fields, flattened (e.g. `page.author`)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

/// A content page.
#[derive(Debug, Serialize)]
pub struct PageView {
    #[serde(flatten)]
    pub common: CommonView,
    pub page: PageInfo,
    /// Dated children, newest first
    pub articles: Vec<ArticleView>,
}

impl PageView {
    pub fn build(
        page: &Page,
        catalog: &Catalog,
        config: &SiteConfig,
        url: &SiteUrl,
    ) -> Result<Self, PageError> {
        let mut common = CommonView::with_menu(catalog, config, url)?;
        common.title = page.heading_with_parent(catalog, &config.title)?;
        if let Some(description) = page.description() {
            common.description = Some(description.to_string());
        }
        if let Some(keywords) = page.keywords() {
            common.keywords = Some(keywords.to_string());
        }

        let children = page.children(catalog);
        let mut articles: Vec<Page> = children.iter().filter(|p| p.is_article()).cloned().collect();
        articles.sort_by(|a, b| b.date().cmp(&a.date()));

        let info = PageInfo {
            heading: page.heading()?.to_string(),
            url: page.abspath(),
            date: page.date(),
            last_modified: page.last_modified(),
            body: page.body_html(&config.markdown)?,
            parent: page.parent(catalog).as_ref().map(LinkView::from_page).transpose()?,
            children: children
                .iter()
                .map(LinkView::from_page)
                .collect::<Result<_, _>>()?,
            extra: page.document().front_matter.extra.clone(),
        };

        Ok(Self {
            common,
            page: info,
            articles: article_views(&articles, config)?,
        })
    }
}

/// The not-found and error pages.
#[derive(Debug, Serialize)]
pub struct ErrorView {
    #[serde(flatten)]
    pub common: CommonView,
    pub status: u16,
    pub path: String,
}

impl ErrorView {
    pub fn new(common: CommonView, status: u16, path: impl Into<String>) -> Self {
        Self {
            common,
            status,
            path: path.into(),
        }
    }
}
