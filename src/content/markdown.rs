//! Markdown rendering and heading extraction.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

fn options_from_config(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "smart_punctuation" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// Render markdown to HTML using pulldown-cmark.
pub fn render_markdown(
    markdown: &str,
    markdown_config: &MarkdownConfig,
) -> Result<String, MarkdownError> {
    let options = options_from_config(markdown_config)?;
    let parser = Parser::new_ext(markdown, options);

    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    Ok(html_output)
}

/// Text of the first level-1 heading, if the document has one.
pub fn first_heading(markdown: &str) -> Option<String> {
    let mut in_heading = false;
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_heading = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                let heading = text.trim();
                return (!heading.is_empty()).then(|| heading.to_string());
            }
            Event::Text(t) | Event::Code(t) if in_heading => text.push_str(&t),
            _ => {}
        }
    }

    None
}
