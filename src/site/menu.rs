//! Navigation menu building.
//!
//! Menus are built fresh for each request from the parent relations of
//! the current catalog. A page with menu entries under it is followed by a
//! branch holding them:
//!
//! ```text
//! Branch[Leaf(about), Branch[], Leaf(blog), Branch[Leaf(post-1)]]
//! ```

use serde::Serialize;

use crate::content::page::children_of;
use crate::content::{Catalog, Page, PageError};

/// Levels shown when no depth is configured.
pub const DEFAULT_MENU_DEPTH: usize = 2;

/// A node in the navigation tree.
#[derive(Debug, Clone)]
pub enum MenuNode {
    /// A single page
    Leaf(Page),
    /// An ordered group of nodes
    Branch(Vec<MenuNode>),
}

/// Build the menu rooted at `root_path`, descending at most `max_depth` levels.
///
/// The root page itself is not part of the menu, and need not exist.
pub fn build(catalog: &Catalog, root_path: &str, max_depth: usize) -> MenuNode {
    let top_level = children_of(catalog, root_path)
        .into_iter()
        .filter(Page::in_menu)
        .collect();
    build_from(catalog, top_level, max_depth)
}

fn build_from(catalog: &Catalog, pages: Vec<Page>, max_depth: usize) -> MenuNode {
    if max_depth == 0 {
        return MenuNode::Branch(Vec::new());
    }

    let mut items = Vec::new();
    for page in pages {
        let nested = (max_depth > 1)
            .then(|| build_from(catalog, page.menu_children(catalog), max_depth - 1));
        items.push(MenuNode::Leaf(page));
        items.extend(nested);
    }
    MenuNode::Branch(items)
}

impl MenuNode {
    /// Number of page levels in this node (a leaf or empty branch is 0).
    pub fn depth(&self) -> usize {
        match self {
            MenuNode::Leaf(_) => 0,
            MenuNode::Branch(items) => items
                .iter()
                .map(|item| match item {
                    MenuNode::Leaf(_) => 1,
                    MenuNode::Branch(_) => 1 + item.depth(),
                })
                .max()
                .unwrap_or(0),
        }
    }

    /// Convert to links for templates, attaching each branch to the page
    /// before it.
    pub fn to_links(&self) -> Result<Vec<MenuLink>, PageError> {
        match self {
            MenuNode::Leaf(page) => Ok(vec![MenuLink::from_page(page)?]),
            MenuNode::Branch(items) => links_from(items),
        }
    }
}

fn links_from(items: &[MenuNode]) -> Result<Vec<MenuLink>, PageError> {
    let mut links: Vec<MenuLink> = Vec::new();
    for item in items {
        match item {
            MenuNode::Leaf(page) => links.push(MenuLink::from_page(page)?),
            MenuNode::Branch(nested) => {
                let nested = links_from(nested)?;
                match links.last_mut() {
                    Some(last) => last.children.extend(nested),
                    None => links.extend(nested),
                }
            }
        }
    }
    Ok(links)
}

/// A single menu link, as seen by templates.
#[derive(Debug, Clone, Serialize)]
pub struct MenuLink {
    pub heading: String,
    pub url: String,
    pub children: Vec<MenuLink>,
}

impl MenuLink {
    fn from_page(page: &Page) -> Result<Self, PageError> {
        Ok(Self {
            heading: page.heading()?.to_string(),
            url: page.abspath(),
            children: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::page::tests::doc;

    fn catalog() -> Catalog {
        Catalog::from_documents([
            doc("", "# Home"),
            doc("about", "---\nparent: /\n---\n# About"),
            doc("blog", "---\nparent: /\n---\n# Blog"),
            doc("blog/post-1", "---\nparent: blog\n---\n# Post 1"),
            doc("blog/post-1/comments", "---\nparent: blog/post-1\n---\n# Comments"),
            doc("hidden", "---\nparent: /\nmenu: false\n---\n# Hidden"),
        ])
    }

    fn headings(node: &MenuNode) -> Vec<String> {
        match node {
            MenuNode::Leaf(page) => vec![page.heading().unwrap().to_string()],
            MenuNode::Branch(items) => items.iter().flat_map(headings).collect(),
        }
    }

    #[test]
    fn test_depth_zero_is_empty_branch() {
        let menu = build(&catalog(), "/", 0);
        assert!(matches!(&menu, MenuNode::Branch(items) if items.is_empty()));
        assert_eq!(menu.depth(), 0);
    }

    #[test]
    fn test_depth_one_has_only_leaves() {
        let menu = build(&catalog(), "/", 1);
        let MenuNode::Branch(items) = &menu else {
            panic!("Expected Branch");
        };
        assert!(items.iter().all(|i| matches!(i, MenuNode::Leaf(_))));
        assert_eq!(headings(&menu), vec!["About", "Blog"]);
        assert_eq!(menu.depth(), 1);
    }

    #[test]
    fn test_default_depth_stops_at_two_levels() {
        let menu = build(&catalog(), "/", DEFAULT_MENU_DEPTH);
        assert_eq!(menu.depth(), 2);
        // Grandchildren of the root are included, their children are not
        assert_eq!(headings(&menu), vec!["About", "Blog", "Post 1"]);
    }

    #[test]
    fn test_empty_branch_kept_for_childless_page() {
        let menu = build(&catalog(), "/", 2);
        let MenuNode::Branch(items) = &menu else {
            panic!("Expected Branch");
        };
        // About, its empty branch, Blog, its branch
        assert_eq!(items.len(), 4);
        assert!(matches!(&items[1], MenuNode::Branch(b) if b.is_empty()));
    }

    #[test]
    fn test_to_links_nests_branches() {
        let links = build(&catalog(), "/", 3).to_links().unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "/about");
        assert!(links[0].children.is_empty());
        assert_eq!(links[1].heading, "Blog");
        assert_eq!(links[1].children[0].url, "/blog/post-1");
        assert_eq!(links[1].children[0].children[0].heading, "Comments");
    }

    #[test]
    fn test_root_without_document() {
        let catalog = Catalog::from_documents([doc("a", "---\nparent: /\n---\n# A")]);
        assert_eq!(headings(&build(&catalog, "", 2)), vec!["A"]);
    }

    #[test]
    fn test_menu_heading_missing_is_error() {
        let catalog = Catalog::from_documents([doc("a", "---\nparent: /\n---\nno heading")]);
        assert!(build(&catalog, "/", 1).to_links().is_err());
    }
}
