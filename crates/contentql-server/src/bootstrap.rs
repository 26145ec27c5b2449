//! Startup wiring of the content store and the live GraphQL schema.
//!
//! Order matters: definitions are scanned before the rebuild listener exists
//! so the initial scan produces exactly one build, and the watcher starts
//! after the listener so every later change is picked up.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use contentql_db_memory::InMemoryRepository;
use contentql_graphql::definition::WatchHandle;
use contentql_graphql::{
    ContentSchemaBuilder, DefinitionPathPattern, DefinitionSource, FileSystemOrigin, LiveSchema,
    SchemaRegistry, spawn_rebuild_listener,
};
use contentql_storage::DynRepository;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::AppConfig;

/// Running schema machinery. Dropping it leaves the watcher running; call
/// [`ContentEngine::shutdown`] to stop it.
pub struct ContentEngine {
    pub repository: DynRepository,
    pub live: Arc<LiveSchema>,
    pub registry: Arc<SchemaRegistry>,
    watcher: Option<WatchHandle>,
    listener: JoinHandle<()>,
}

impl ContentEngine {
    /// Stops the watcher and the rebuild listener.
    pub async fn shutdown(self) {
        if let Some(watcher) = self.watcher {
            watcher.stop().await;
        }
        self.listener.abort();
        info!("Content engine stopped");
    }
}

/// Builds the repository, registers definitions and publishes the first
/// schema.
///
/// A failing first build is logged, not returned: the server still starts
/// and answers 503 until a later rebuild succeeds.
pub async fn init_engine(cfg: &AppConfig) -> anyhow::Result<ContentEngine> {
    let repository = init_repository(cfg).await?;

    let mut builder = ContentSchemaBuilder::new(cfg.graphql.to_schema_builder_config())
        .with_delivery(cfg.graphql.delivery.clone());
    if let Some(path) = &cfg.graphql.core_schema {
        let sdl = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading core schema {}", path.display()))?;
        info!(path = %path.display(), "Using core schema from file");
        builder = builder.with_core_sdl(sdl);
    }

    let live = Arc::new(LiveSchema::new(builder));
    let registry = Arc::new(SchemaRegistry::new());

    let source = match &cfg.graphql.definitions.root {
        Some(root) => {
            let definitions = &cfg.graphql.definitions;
            let pattern = DefinitionPathPattern::new(&definitions.folder, &definitions.extension)?;
            let source = DefinitionSource::new(
                Arc::new(FileSystemOrigin::new(root)),
                pattern,
                Arc::clone(&registry),
            );
            let registered = source
                .scan()
                .await
                .with_context(|| format!("scanning definitions in {}", root.display()))?;
            info!(root = %root.display(), registered, "GraphQL definitions loaded");
            Some(source)
        }
        None => {
            info!("No definitions root configured, serving core schema and delivery fields");
            None
        }
    };

    match registry.rebuild(&live).await {
        Ok(snapshot) => info!(
            generation = snapshot.generation,
            sources = snapshot.sources.len(),
            "Initial GraphQL schema published"
        ),
        Err(e) => error!(error = %e, "Initial GraphQL schema build failed"),
    }

    let listener = spawn_rebuild_listener(&registry, Arc::clone(&live));

    let watcher = match source {
        Some(source) if cfg.graphql.definitions.watch => {
            let debounce = Duration::from_millis(cfg.graphql.definitions.debounce_ms);
            Some(source.watch(debounce)?)
        }
        _ => None,
    };

    Ok(ContentEngine {
        repository,
        live,
        registry,
        watcher,
        listener,
    })
}

async fn init_repository(cfg: &AppConfig) -> anyhow::Result<DynRepository> {
    let repository = match &cfg.storage.seed {
        Some(path) => InMemoryRepository::from_seed_file(path)
            .await
            .with_context(|| format!("seeding content store from {}", path.display()))?,
        None => {
            info!("No seed configured, content store starts empty");
            InMemoryRepository::new()
        }
    };
    Ok(Arc::new(repository))
}
