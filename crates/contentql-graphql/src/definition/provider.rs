//! Definition providers.
//!
//! A provider hands out the current resolved [`GraphQLDefinition`] of one
//! definition source. [`LazyDefinitionProvider`] re-reads its backing file
//! only when the file changed, and checks for changes at most once per
//! threshold.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::origin::ResourceOrigin;
use super::path::DefinitionMetadata;
use super::problem::{Problem, ProblemKind};
use crate::schema::TypeRegistry;

/// Minimum time between two modification checks, in milliseconds.
pub const DEFAULT_THRESHOLD_MS: u64 = 1000;

/// A resolved definition: the raw SDL and its parsed fragment.
#[derive(Debug, Clone)]
pub struct GraphQLDefinition {
    pub metadata: DefinitionMetadata,
    pub sdl: String,
    pub fragment: Arc<TypeRegistry>,
}

/// Source of one schema-producing definition.
#[async_trait]
pub trait DefinitionProvider: Send + Sync {
    fn metadata(&self) -> &DefinitionMetadata;

    /// The current definition, `None` if it could not be resolved.
    async fn get(&self) -> Option<Arc<GraphQLDefinition>>;

    /// Problems from the last resolution.
    async fn problems(&self) -> Vec<Problem>;

    /// Whether a definition is currently resolved.
    async fn is_valid(&self) -> bool {
        self.get().await.is_some()
    }

    /// Makes the next [`get`](Self::get) check the backing resource.
    async fn recheck(&self) {}
}

/// Lifecycle of a [`LazyDefinitionProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    /// Never resolved.
    Fresh,
    /// Holds the outcome of the last resolution.
    Cached,
    /// The threshold elapsed; the backing resource is being checked.
    StaleCheckDue,
    /// The backing resource is newer and is being re-read.
    Resolving,
    /// The backing resource no longer exists. The last value is kept.
    Gone,
}

#[derive(Debug)]
struct ProviderInner {
    state: ProviderState,
    definition: Option<Arc<GraphQLDefinition>>,
    problems: Vec<Problem>,
    /// Clock time of the last modification check.
    last_check: Option<u64>,
    /// Modification time of the resource at the last resolution.
    /// Modification time at the last successful resolution.
    last_resolved: Option<u64>,
}

/// Caching provider over one file of a [`ResourceOrigin`].
///
/// Calls to [`get`](DefinitionProvider::get) within `threshold` of the last
/// check return the cached value without touching the origin. After that the
/// resource's modification time is compared with the one seen at the last
/// successful resolution and the file is re-read only if it is newer. A
/// failed resolution clears the cached definition and records a severe
/// problem; the file is retried on the next check.
///
/// Access is serialized; a caller arriving while a resolution is in flight
/// waits for it and gets its result.
pub struct LazyDefinitionProvider {
    metadata: DefinitionMetadata,
    origin: Arc<dyn ResourceOrigin>,
    clock: Arc<dyn Clock>,
    threshold_ms: u64,
    inner: Mutex<ProviderInner>,
}

impl LazyDefinitionProvider {
    pub fn new(metadata: DefinitionMetadata, origin: Arc<dyn ResourceOrigin>) -> Self {
        Self {
            metadata,
            origin,
            clock: Arc::new(SystemClock),
            threshold_ms: DEFAULT_THRESHOLD_MS,
            inner: Mutex::new(ProviderInner {
                state: ProviderState::Fresh,
                definition: None,
                problems: Vec::new(),
                last_check: None,
                last_resolved: None,
            }),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.threshold_ms = threshold_ms;
        self
    }

    pub async fn state(&self) -> ProviderState {
        self.inner.lock().await.state
    }

    /// Modification time seen at the last resolution.
    pub async fn last_resolved(&self) -> Option<u64> {
        self.inner.lock().await.last_resolved
    }

    async fn resolve(&self) -> Result<GraphQLDefinition, Problem> {
        let path = &self.metadata.path;
        let sdl = self
            .origin
            .read_to_string(path)
            .await
            .map_err(|e| Problem::resolution_failed(path, e))?;
        let fragment = TypeRegistry::parse(&sdl).map_err(|e| Problem::resolution_failed(path, e))?;

        Ok(GraphQLDefinition {
            metadata: self.metadata.clone(),
            sdl,
            fragment: Arc::new(fragment),
        })
    }
}

#[async_trait]
impl DefinitionProvider for LazyDefinitionProvider {
    fn metadata(&self) -> &DefinitionMetadata {
        &self.metadata
    }

    async fn get(&self) -> Option<Arc<GraphQLDefinition>> {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now_millis();

        if inner
            .last_check
            .is_some_and(|last_check| now.saturating_sub(last_check) < self.threshold_ms)
        {
            return inner.definition.clone();
        }

        inner.last_check = Some(now);
        inner.state = ProviderState::StaleCheckDue;
        let path = self.metadata.path.as_str();

        if !self.origin.has_path(path).await {
            debug!(
                reference_id = %self.metadata.reference_id,
                path,
                "Definition file no longer exists, keeping last resolved value"
            );
            inner.state = ProviderState::Gone;
            return inner.definition.clone();
        }

        let modified = match self.origin.last_modified(path).await {
            Ok(modified) => modified,
            Err(e) => {
                warn!(
                    reference_id = %self.metadata.reference_id,
                    error = %e,
                    "Could not read definition modification time"
                );
                inner.state = ProviderState::Cached;
                return inner.definition.clone();
            }
        };

        if inner.last_resolved.is_some_and(|resolved| modified <= resolved) {
            inner.state = ProviderState::Cached;
            return inner.definition.clone();
        }

        inner.state = ProviderState::Resolving;
        match self.resolve().await {
            Ok(definition) => {
                inner.problems = if definition.fragment.is_empty() {
                    vec![
                        Problem::major(ProblemKind::Semantic)
                            .with_title(format!("Definition [{path}] declares no types")),
                    ]
                } else {
                    Vec::new()
                };
                info!(
                    reference_id = %self.metadata.reference_id,
                    modified,
                    "Resolved GraphQL definition"
                );
                inner.definition = Some(Arc::new(definition));
                inner.last_resolved = Some(modified);
            }
            Err(problem) => {
                warn!(
                    reference_id = %self.metadata.reference_id,
                    problem = %problem,
                    "Failed to resolve GraphQL definition"
                );
                inner.definition = None;
                inner.problems = vec![problem];
            }
        }
        inner.state = ProviderState::Cached;

        inner.definition.clone()
    }

    async fn problems(&self) -> Vec<Problem> {
        self.inner.lock().await.problems.clone()
    }

    async fn recheck(&self) {
        self.inner.lock().await.last_check = None;
    }
}

/// Provider over SDL held in memory.
pub struct StaticDefinitionProvider {
    metadata: DefinitionMetadata,
    definition: Option<Arc<GraphQLDefinition>>,
    problems: Vec<Problem>,
}

impl StaticDefinitionProvider {
    /// Parses `sdl` once. A parse failure leaves the provider invalid.
    pub fn new(reference_id: impl Into<String>, sdl: impl Into<String>) -> Self {
        let reference_id = reference_id.into();
        let sdl = sdl.into();
        let metadata = DefinitionMetadata {
            path: format!("memory:{reference_id}"),
            module: String::new(),
            name: reference_id.clone(),
            relative_location: String::new(),
            reference_id,
        };

        match TypeRegistry::parse(&sdl) {
            Ok(fragment) => Self {
                definition: Some(Arc::new(GraphQLDefinition {
                    metadata: metadata.clone(),
                    sdl,
                    fragment: Arc::new(fragment),
                })),
                problems: Vec::new(),
                metadata,
            },
            Err(e) => Self {
                definition: None,
                problems: vec![Problem::resolution_failed(&metadata.path, e)],
                metadata,
            },
        }
    }
}

#[async_trait]
impl DefinitionProvider for StaticDefinitionProvider {
    fn metadata(&self) -> &DefinitionMetadata {
        &self.metadata
    }

    async fn get(&self) -> Option<Arc<GraphQLDefinition>> {
        self.definition.clone()
    }

    async fn problems(&self) -> Vec<Problem> {
        self.problems.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::clock::ManualClock;
    use crate::definition::problem::Severity;

    #[tokio::test]
    async fn test_static_provider() {
        let valid = StaticDefinitionProvider::new("tours", "type Tour { name: String }");
        assert!(valid.is_valid().await);
        assert!(valid.problems().await.is_empty());
        assert_eq!(valid.metadata().reference_id, "tours");

        let invalid = StaticDefinitionProvider::new("broken", "type Tour {");
        assert!(!invalid.is_valid().await);
        let problems = invalid.problems().await;
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].severity, Severity::Severe);
    }

    #[tokio::test]
    async fn test_manual_clock_plugs_in() {
        let origin: Arc<dyn ResourceOrigin> =
            Arc::new(crate::definition::FileSystemOrigin::new("/definitely/not/here"));
        let metadata = crate::definition::DefinitionPathPattern::new("graphqls", "graphql")
            .unwrap()
            .metadata("/tours/graphqls/tours.graphql")
            .unwrap();
        let provider = LazyDefinitionProvider::new(metadata, origin)
            .with_clock(Arc::new(ManualClock::new(10_000)))
            .with_threshold_ms(50);

        assert_eq!(provider.state().await, ProviderState::Fresh);
        assert!(provider.get().await.is_none());
        assert_eq!(provider.state().await, ProviderState::Gone);
        assert_eq!(provider.last_resolved().await, None);
    }
}
