use std::collections::HashMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tera::{Context, Tera, Value};

use crate::content::PageError;
use crate::util::no_widow;

/// Templates shipped in the binary, used when the site has no theme.
pub const BUILT_IN_TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../theme/templates/layout.html")),
    ("page.html", include_str!("../../theme/templates/page.html")),
    ("index.html", include_str!("../../theme/templates/index.html")),
    ("not_found.html", include_str!("../../theme/templates/not_found.html")),
    ("error.html", include_str!("../../theme/templates/error.html")),
    ("css/master.css", include_str!("../../theme/templates/css/master.css")),
];

pub const NOT_FOUND_TEMPLATE: &str = "not_found";
pub const ERROR_TEMPLATE: &str = "error";
pub const HOME_TEMPLATE: &str = "index";

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("stylesheet not found: {0}")]
    StylesheetNotFound(String),

    #[error(transparent)]
    Page(#[from] PageError),
}

/// Where the templates came from, so they can be reloaded.
#[derive(Debug, Clone)]
enum TemplateSource {
    Theme(PathBuf),
    BuiltIn,
}

/// The template renderer, wrapping Tera.
pub struct Renderer {
    tera: Tera,
    source: TemplateSource,
}

impl Renderer {
    /// Load templates from `<theme>/templates`, or the built-in theme when
    /// the directory is missing.
    pub fn new(theme_path: &Path) -> Result<Self, RenderError> {
        let templates_path = theme_path.join("templates");
        if !templates_path.is_dir() {
            tracing::info!(
                theme = %theme_path.display(),
                "theme has no templates, using built-in theme"
            );
            return Self::built_in();
        }

        let glob = templates_path.join("**/*");
        let mut tera = Tera::new(&glob.to_string_lossy())?;
        register_filters(&mut tera);
        tracing::info!(
            theme = %theme_path.display(),
            templates = tera.get_template_names().count(),
            "loaded templates"
        );

        Ok(Self {
            tera,
            source: TemplateSource::Theme(templates_path),
        })
    }

    pub fn built_in() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILT_IN_TEMPLATES.iter().copied())?;
        register_filters(&mut tera);
        Ok(Self {
            tera,
            source: TemplateSource::BuiltIn,
        })
    }

    /// Re-read templates from disk after a theme change.
    pub fn reload(&mut self) -> Result<(), RenderError> {
        match &self.source {
            TemplateSource::Theme(path) => {
                self.tera.full_reload()?;
                tracing::info!(templates = %path.display(), "reloaded templates");
            }
            TemplateSource::BuiltIn => {}
        }
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render `template` and wrap the result in `layout`.
    ///
    /// The template output is bound as `content` for the layout. A missing
    /// layout template renders the page without one.
    pub fn render_page<V: Serialize>(
        &self,
        template: &str,
        layout: &str,
        view: &V,
    ) -> Result<String, RenderError> {
        let template_name = format!("{template}.html");
        if !self.has_template(&template_name) {
            return Err(RenderError::TemplateNotFound(template_name));
        }

        let mut context = Context::from_serialize(view)?;
        let content = self.tera.render(&template_name, &context)?;

        let layout_name = format!("{layout}.html");
        if !self.has_template(&layout_name) {
            tracing::debug!(layout = %layout_name, "no layout template, rendering bare page");
            return Ok(content);
        }
        context.insert("content", &content);
        Ok(self.tera.render(&layout_name, &context)?)
    }

    /// Render the stylesheet template `css/<sheet>.css`.
    pub fn render_stylesheet<V: Serialize>(
        &self,
        sheet: &str,
        view: &V,
    ) -> Result<String, RenderError> {
        let name = format!("css/{sheet}.css");
        if !self.has_template(&name) {
            return Err(RenderError::StylesheetNotFound(sheet.to_string()));
        }
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render(&name, &context)?)
    }
}

fn register_filters(tera: &mut Tera) {
    tera.register_filter("no_widow", no_widow_filter);
    tera.register_filter("format_date", format_date_filter);
}

fn no_widow_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = tera::from_value::<String>(value.clone())?;
    Ok(Value::String(no_widow(&text)))
}

/// Format an RFC 3339 or `YYYY-MM-DD` date, `%d %B %Y` unless `format` is given.
fn format_date_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = tera::from_value::<String>(value.clone())?;
    let format = match args.get("format") {
        Some(format) => tera::from_value::<String>(format.clone())?,
        None => "%d %B %Y".to_string(),
    };

    let date = DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
        })
        .map_err(|e| tera::Error::msg(format!("format_date: cannot parse '{raw}': {e}")))?;

    let mut out = String::new();
    write!(out, "{}", date.format(&format))
        .map_err(|_| tera::Error::msg(format!("format_date: invalid format '{format}'")))?;
    Ok(Value::String(out))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_built_in_has_required_templates() {
        let renderer = Renderer::built_in().unwrap();
        for name in ["layout.html", "page.html", "index.html", "not_found.html", "error.html"] {
            assert!(renderer.has_template(name), "missing {name}");
        }
    }

    #[test]
    fn test_render_page_wraps_in_layout() {
        let temp = TempDir::new().unwrap();
        let templates = temp.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("page.html"), "<p>{{ heading }}</p>").unwrap();
        fs::write(
            templates.join("layout.html"),
            "<title>{{ title }}</title>{{ content | safe }}",
        )
        .unwrap();

        let renderer = Renderer::new(temp.path()).unwrap();
        let html = renderer
            .render_page("page", "layout", &json!({"title": "T", "heading": "H"}))
            .unwrap();
        assert_eq!(html, "<title>T</title><p>H</p>");
    }

    #[test]
    fn test_render_page_without_layout() {
        let temp = TempDir::new().unwrap();
        let templates = temp.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("page.html"), "bare").unwrap();

        let renderer = Renderer::new(temp.path()).unwrap();
        assert_eq!(renderer.render_page("page", "custom", &json!({})).unwrap(), "bare");
    }

    #[test]
    fn test_missing_template() {
        let renderer = Renderer::built_in().unwrap();
        let err = renderer.render_page("nope", "layout", &json!({})).unwrap_err();
        assert!(matches!(err, RenderError::TemplateNotFound(name) if name == "nope.html"));
    }

    #[test]
    fn test_missing_theme_falls_back_to_built_in() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(&temp.path().join("absent")).unwrap();
        assert!(renderer.has_template("css/master.css"));
    }

    #[test]
    fn test_stylesheets() {
        let temp = TempDir::new().unwrap();
        let css = temp.path().join("templates/css");
        fs::create_dir_all(&css).unwrap();
        fs::write(css.join("site.css"), "body { color: {{ theme.color }}; }").unwrap();

        let renderer = Renderer::new(temp.path()).unwrap();
        let view = json!({"theme": {"color": "red"}});
        assert_eq!(
            renderer.render_stylesheet("site", &view).unwrap(),
            "body { color: red; }"
        );
        assert!(matches!(
            renderer.render_stylesheet("missing", &view),
            Err(RenderError::StylesheetNotFound(s)) if s == "missing"
        ));
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let temp = TempDir::new().unwrap();
        let templates = temp.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("page.html"), "old").unwrap();

        let mut renderer = Renderer::new(temp.path()).unwrap();
        fs::write(templates.join("page.html"), "new").unwrap();
        renderer.reload().unwrap();
        assert_eq!(renderer.render_page("page", "layout", &json!({})).unwrap(), "new");
    }

    #[test]
    fn test_filters() {
        let mut tera = Tera::default();
        register_filters(&mut tera);
        tera.add_raw_template(
            "t",
            "{{ heading | no_widow | safe }}|{{ date | format_date }}|{{ day | format_date(format=\"%Y/%m\") }}",
        )
        .unwrap();
        let context = Context::from_serialize(json!({
            "heading": "A long title",
            "date": "2024-02-01T00:00:00Z",
            "day": "2024-03-15",
        }))
        .unwrap();
        assert_eq!(
            tera.render("t", &context).unwrap(),
            "A long&nbsp;title|01 February 2024|2024/03"
        );
    }

    #[test]
    fn test_format_date_rejects_bad_format() {
        let mut tera = Tera::default();
        register_filters(&mut tera);
        tera.add_raw_template("t", "{{ day | format_date(format=\"%Q\") }}")
            .unwrap();
        let context = Context::from_serialize(json!({ "day": "2024-03-15" })).unwrap();

        let err = tera.render("t", &context).unwrap_err();
        let chain = format!("{:#}", anyhow::Error::new(err));
        assert!(chain.contains("invalid format '%Q'"), "{chain}");
    }
}
