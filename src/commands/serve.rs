use std::net::SocketAddr;
use std::sync::Arc;

use crate::ServeArgs;
use crate::config::{DEFAULT_CONFIG_FILE, Environment, SiteConfig};
use crate::content::DocumentStore;
use crate::server::{AppState, create_router};
use crate::site::{FileWatcher, RefreshPlan, Renderer, WatchEvent, WatchPaths};

pub async fn run(args: &ServeArgs) -> Result<(), anyhow::Error> {
    // Determine the config file path
    let config_path = args
        .config_file
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());
    let config_path = if config_path.is_relative() {
        std::env::current_dir()?.join(&config_path)
    } else {
        config_path
    };

    let mut config = SiteConfig::load_from_arg(Some(config_path.as_path()))?;
    if args.dev {
        config.environment = Environment::Development;
    }
    tracing::info!(
        title = %config.title,
        environment = ?config.environment,
        cache = config.cache,
        "loaded configuration"
    );

    let store = DocumentStore::open(config.content_path.clone(), config.attachment_path.clone())?;
    let renderer = Renderer::new(&config.theme_path)?;

    let watch_paths = WatchPaths {
        content_dir: config.content_path.clone(),
        attachments_dir: config.attachment_path.clone(),
        theme_dir: config.theme_path.clone(),
        config_path: config_path.clone(),
    };
    let watch_config = config.dev.watch.clone();
    let state = Arc::new(AppState::new(config, store, renderer));

    // Set up file watcher if enabled
    let _watcher_handle = if args.watch {
        match FileWatcher::new(&watch_config, &watch_paths) {
            Ok(watcher) => {
                tracing::info!("watching for changes");
                let state = Arc::clone(&state);
                Some(tokio::task::spawn_blocking(move || {
                    while let Some(event) = watcher.recv() {
                        match event {
                            WatchEvent::FilesChanged(changes) => {
                                tracing::info!(changes = changes.len(), "detected changes");
                                state.refresh(RefreshPlan::from_changes(&changes));
                            }
                            WatchEvent::Error(e) => {
                                tracing::warn!(error = %e, "watch error");
                            }
                        }
                    }
                }))
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to start file watcher");
                None
            }
        }
    } else {
        None
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;

    let display_host = if args.bind == "0.0.0.0" {
        "localhost"
    } else {
        &args.bind
    };
    let url = format!("http://{}:{}", display_host, args.port);

    println!("\nServing site at {}", url);
    println!("Press Ctrl+C to stop\n");

    if args.open
        && let Err(e) = open::that(&url)
    {
        tracing::warn!(error = %e, "failed to open browser");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
