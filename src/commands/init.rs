use std::path::Path;

use crate::InitArgs;
use crate::config::{DEFAULT_CONFIG_FILE, SiteConfig};
use crate::site::render::BUILT_IN_TEMPLATES;

const SAMPLE_HOME: &str = "\
---
description: A new folio site
---
# Welcome

This is the home page. Edit `content/pages/index.md` to change it.
";

const SAMPLE_ARTICLE: &str = "\
---
date: 2024-01-01
summary: The first article on this site.
---
# Hello, world

Pages with a `date` are articles. They appear on the home page and in the
Atom feed at `/articles.xml`.
";

const SAMPLE_ABOUT: &str = "\
---
parent: /
---
# About

Pages with `parent: /` appear in the menu.
";

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            tracing::info!(path = %path.display(), "created directory");
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_file = path.join(DEFAULT_CONFIG_FILE);
    if config_file.exists() {
        return Err(anyhow::anyhow!(
            "Config file already exists: {config_file}",
            config_file = config_file.display()
        ));
    }

    println!("Initializing project in {}", path.display());

    let mut config = SiteConfig::new("My Folio Site");
    config.subtitle = Some("Notes and articles".into());
    config.url = Some("http://localhost:3000".into());
    let config_text = serde_yaml::to_string(&config)?;
    tokio::fs::write(&config_file, config_text).await?;
    println!("Created config file {}", config_file.display());

    let pages = path.join(&config.content_path);
    write_file(&pages.join("index.md"), SAMPLE_HOME).await?;
    write_file(&pages.join("about.md"), SAMPLE_ABOUT).await?;
    write_file(&pages.join("articles/hello-world.md"), SAMPLE_ARTICLE).await?;
    tokio::fs::create_dir_all(path.join(&config.attachment_path)).await?;

    let templates = path.join(&config.theme_path).join("templates");
    for (name, text) in BUILT_IN_TEMPLATES {
        write_file(&templates.join(name), text).await?;
    }
    println!("Created sample content and theme");

    Ok(())
}

async fn write_file(path: &Path, contents: &str) -> Result<(), anyhow::Error> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    tracing::debug!(path = %path.display(), "wrote file");
    Ok(())
}
