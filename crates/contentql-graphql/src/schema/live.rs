//! Live schema holder.
//!
//! `LiveSchema` owns the currently published [`SchemaSnapshot`]. A rebuild
//! assembles and compiles a complete new snapshot first and then publishes it
//! with a single atomic pointer swap. Queries load the pointer once and run
//! against that snapshot to completion, so none ever observes a partial
//! merge. Rebuilds are serialized; a failed rebuild leaves the previous
//! snapshot published.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use async_graphql::dynamic::Schema;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::builder::ContentSchemaBuilder;
use super::fragment::TypeRegistry;
use crate::error::GraphQLError;

/// State of the live schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// No snapshot has been published yet.
    Uninitialized,
    /// A rebuild is running.
    Building,
    /// The last rebuild was published.
    Ready,
    /// The last rebuild failed. An older snapshot may still be published.
    Failed,
}

/// One fragment handed to a rebuild, tagged with its source.
#[derive(Debug, Clone)]
pub struct SourcedFragment {
    pub reference_id: String,
    pub fragment: Arc<TypeRegistry>,
}

/// One fully built, immutable schema.
#[derive(Clone)]
pub struct SchemaSnapshot {
    /// Publication counter, starting at 1.
    pub generation: u64,
    /// The merged registry the schema was compiled from.
    pub registry: Arc<TypeRegistry>,
    pub schema: Schema,
    /// Reference ids of the definitions merged in, in merge order.
    pub sources: Vec<String>,
    pub built_at: OffsetDateTime,
}

impl std::fmt::Debug for SchemaSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaSnapshot")
            .field("generation", &self.generation)
            .field("sources", &self.sources)
            .field("built_at", &self.built_at)
            .finish_non_exhaustive()
    }
}

/// Thread-safe holder of the published schema snapshot.
///
/// # Example
///
/// ```ignore
/// let live = LiveSchema::new(builder);
/// live.rebuild(fragments).await?;
///
/// if let Some(snapshot) = live.current() {
///     let response = snapshot.schema.execute(request).await;
/// }
/// ```
pub struct LiveSchema {
    /// The published snapshot.
    current: ArcSwapOption<SchemaSnapshot>,

    /// Serializes rebuilds.
    rebuild_lock: Mutex<()>,

    generation: AtomicU64,

    state: RwLock<SchemaState>,

    builder: ContentSchemaBuilder,

    /// Last rebuild error message (for diagnostics).
    last_error: RwLock<Option<String>>,
}

impl LiveSchema {
    #[must_use]
    pub fn new(builder: ContentSchemaBuilder) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            rebuild_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            state: RwLock::new(SchemaState::Uninitialized),
            builder,
            last_error: RwLock::new(None),
        }
    }

    /// The published snapshot, if any.
    pub fn current(&self) -> Option<Arc<SchemaSnapshot>> {
        self.current.load_full()
    }

    pub fn builder(&self) -> &ContentSchemaBuilder {
        &self.builder
    }

    /// Builds a new snapshot from `fragments` and publishes it.
    ///
    /// Waits for a rebuild already in progress to finish first.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::SchemaBuildFailed` if the schema cannot be
    /// built; the previously published snapshot stays in place.
    pub async fn rebuild(
        &self,
        fragments: Vec<SourcedFragment>,
    ) -> Result<Arc<SchemaSnapshot>, GraphQLError> {
        let _guard = self.rebuild_lock.lock().await;

        *self.state.write().await = SchemaState::Building;
        info!(fragments = fragments.len(), "Rebuilding GraphQL schema...");

        match self
            .builder
            .build(fragments.iter().map(|f| f.fragment.as_ref()))
        {
            Ok((registry, schema)) => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let snapshot = Arc::new(SchemaSnapshot {
                    generation,
                    registry: Arc::new(registry),
                    schema,
                    sources: fragments.into_iter().map(|f| f.reference_id).collect(),
                    built_at: OffsetDateTime::now_utc(),
                });
                self.current.store(Some(Arc::clone(&snapshot)));
                *self.state.write().await = SchemaState::Ready;
                *self.last_error.write().await = None;
                info!(generation, "GraphQL schema published");
                Ok(snapshot)
            }
            Err(e) => {
                let error_msg = e.to_string();
                warn!(
                    error = %error_msg,
                    keeps_generation = self.generation.load(Ordering::SeqCst),
                    "Failed to rebuild GraphQL schema"
                );
                *self.state.write().await = SchemaState::Failed;
                *self.last_error.write().await = Some(error_msg.clone());
                Err(match e {
                    GraphQLError::SchemaBuildFailed(_) => e,
                    other => GraphQLError::SchemaBuildFailed(other.to_string()),
                })
            }
        }
    }

    /// Returns the current state.
    pub async fn state(&self) -> SchemaState {
        *self.state.read().await
    }

    /// Returns the last rebuild error, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// Whether a snapshot is published.
    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }

    /// Generation of the published snapshot, 0 before the first one.
    pub fn generation(&self) -> u64 {
        self.current
            .load()
            .as_ref()
            .map(|s| s.generation)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeliveryEndpoint;
    use crate::schema::SchemaBuilderConfig;

    fn live() -> LiveSchema {
        LiveSchema::new(
            ContentSchemaBuilder::new(SchemaBuilderConfig::default())
                .with_delivery(vec![DeliveryEndpoint::new("tours", "tours")]),
        )
    }

    fn fragment(reference_id: &str, sdl: &str) -> SourcedFragment {
        SourcedFragment {
            reference_id: reference_id.to_string(),
            fragment: Arc::new(TypeRegistry::parse(sdl).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_uninitialized() {
        let live = live();
        assert!(live.current().is_none());
        assert!(!live.is_ready());
        assert_eq!(live.state().await, SchemaState::Uninitialized);
        assert_eq!(live.generation(), 0);
    }

    #[tokio::test]
    async fn test_rebuild_publishes_new_generation() {
        let live = live();
        let first = live.rebuild(vec![]).await.unwrap();
        let second = live
            .rebuild(vec![fragment(
                "pages",
                r#"extend type Query { pages: [Node] @definition(workspace: "site") }"#,
            )])
            .await
            .unwrap();

        assert_eq!(first.generation, 1);
        assert_eq!(second.generation, 2);
        assert_eq!(live.generation(), 2);
        assert_eq!(second.sources, vec!["pages"]);
        assert!(second.schema.sdl().contains("pages: [Node]"));
        assert!(!first.schema.sdl().contains("pages: [Node]"));
        assert_eq!(live.state().await, SchemaState::Ready);
    }

    #[tokio::test]
    async fn test_repeated_rebuild_is_structurally_identical() {
        let live = live();
        let fragments = vec![fragment("tour", "type Tour { title: String }")];

        let first = live.rebuild(fragments.clone()).await.unwrap();
        let second = live.rebuild(fragments).await.unwrap();

        assert_ne!(first.generation, second.generation);
        assert_eq!(first.registry, second.registry);
        assert_eq!(first.schema.sdl(), second.schema.sdl());
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_snapshot() {
        let live = LiveSchema::new(
            ContentSchemaBuilder::new(SchemaBuilderConfig::default())
                .with_core_sdl("type Node { name: String }"),
        );
        assert!(live.rebuild(vec![]).await.is_err());
        assert_eq!(live.state().await, SchemaState::Failed);
        assert!(live.last_error().await.is_some());
        assert!(live.current().is_none());
        assert_eq!(live.generation(), 0);
    }

    #[tokio::test]
    async fn test_undefined_types_do_not_fail_rebuild() {
        let live = live();
        live.rebuild(vec![]).await.unwrap();

        let snapshot = live
            .rebuild(vec![fragment(
                "broken",
                "extend type Query { x: Missing } type Empty { y: Nope }",
            )])
            .await
            .unwrap();
        assert_eq!(snapshot.generation, 2);
        assert!(!snapshot.schema.sdl().contains("Missing"));
    }

    #[tokio::test]
    async fn test_readers_keep_their_snapshot() {
        let live = live();
        live.rebuild(vec![]).await.unwrap();

        let held = live.current().unwrap();
        live.rebuild(vec![]).await.unwrap();

        assert_eq!(held.generation, 1);
        assert_eq!(live.current().unwrap().generation, 2);
    }
}
