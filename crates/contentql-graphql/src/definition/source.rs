//! Discovery and watching of definition files.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use tracing::{debug, error, info, trace};

use super::DefinitionError;
use super::clock::{Clock, SystemClock};
use super::origin::{ResourceOrigin, resource_path_under};
use super::path::DefinitionPathPattern;
use super::problem::log_problems;
use super::provider::{DefinitionProvider, LazyDefinitionProvider};
use crate::registry::SchemaRegistry;

/// Registers the definition files of one origin.
///
/// # Example
///
/// ```ignore
/// let source = DefinitionSource::new(origin, pattern, registry.clone());
/// source.scan().await?;
/// let handle = source.watch(Duration::from_millis(500))?;
/// ```
#[derive(Clone)]
pub struct DefinitionSource {
    origin: Arc<dyn ResourceOrigin>,
    pattern: DefinitionPathPattern,
    registry: Arc<SchemaRegistry>,
    clock: Arc<dyn Clock>,
}

impl DefinitionSource {
    pub fn new(
        origin: Arc<dyn ResourceOrigin>,
        pattern: DefinitionPathPattern,
        registry: Arc<SchemaRegistry>,
    ) -> Self {
        Self {
            origin,
            pattern,
            registry,
            clock: Arc::new(SystemClock),
        }
    }

    /// Clock handed to every provider this source creates.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Registers every definition file currently in the origin.
    ///
    /// Returns the number of definitions registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin cannot be listed.
    pub async fn scan(&self) -> Result<usize, DefinitionError> {
        let paths = self.origin.list().await?;
        let mut registered = 0;

        for path in paths.iter().filter(|p| self.pattern.matches(p)) {
            if self.load_and_register(path).await.is_some() {
                registered += 1;
            }
        }

        info!(
            origin = self.origin.name(),
            scanned = paths.len(),
            registered,
            "Scanned GraphQL definitions"
        );
        Ok(registered)
    }

    /// Wraps the file at `path` in a provider, resolves and registers it.
    ///
    /// Returns `None` if `path` does not follow the path convention. Files
    /// that fail to resolve are registered anyway with their problems.
    pub async fn load_and_register(&self, path: &str) -> Option<Arc<LazyDefinitionProvider>> {
        let metadata = self.pattern.metadata(path)?;
        let provider = Arc::new(
            LazyDefinitionProvider::new(metadata, Arc::clone(&self.origin))
                .with_clock(Arc::clone(&self.clock)),
        );

        // Resolve now so problems are known at registration.
        provider.get().await;
        self.registry
            .register(Arc::clone(&provider) as Arc<dyn DefinitionProvider>)
            .await;

        let metadata = provider.metadata();
        info!(path, definition = %metadata, "Registered definition from GraphQL file");
        log_problems(&metadata.reference_id, &provider.problems().await);

        Some(provider)
    }

    /// Reacts to a change of the resource at `path`.
    ///
    /// New files are registered. Modified files are re-checked and announced
    /// with a re-registration event. Removed files stay registered with their
    /// last resolved value.
    pub async fn handle_change(&self, path: &str) {
        let Some(metadata) = self.pattern.metadata(path) else {
            trace!(path, "Ignoring change outside the definition convention");
            return;
        };

        if !self.origin.has_path(path).await {
            debug!(
                path,
                reference_id = %metadata.reference_id,
                "Definition file removed, keeping its last resolved value"
            );
            return;
        }

        match self.registry.provider(&metadata.reference_id).await {
            Some(existing) if existing.metadata().path == path => {
                existing.recheck().await;
                self.registry.notify_changed(&metadata.reference_id).await;
                info!(path, reference_id = %metadata.reference_id, "Definition file changed");
            }
            _ => {
                self.load_and_register(path).await;
            }
        }
    }

    /// Starts watching the origin's directory.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::Watch` if the origin is not on the local
    /// file system.
    pub fn watch(&self, debounce: Duration) -> Result<WatchHandle, DefinitionError> {
        let root: PathBuf = self
            .origin
            .local_root()
            .map(PathBuf::from)
            .ok_or_else(|| {
                DefinitionError::Watch(format!(
                    "origin {} has no local directory",
                    self.origin.name()
                ))
            })?;

        let source = self.clone();
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            let (notify_tx, notify_rx) = std::sync::mpsc::channel();

            let mut debouncer = match new_debouncer(debounce, notify_tx) {
                Ok(d) => d,
                Err(e) => {
                    error!("Failed to create definition watcher: {e}");
                    return;
                }
            };

            if let Err(e) = debouncer.watcher().watch(&root, RecursiveMode::Recursive) {
                error!("Failed to watch definitions in {:?}: {e}", root);
                return;
            }

            info!("Started watching GraphQL definitions in {:?}", root);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("Definition watcher shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {
                        let mut changed = IndexSet::new();
                        while let Ok(events) = notify_rx.try_recv() {
                            match events {
                                Ok(events) => {
                                    changed.extend(
                                        events
                                            .into_iter()
                                            .filter_map(|event| resource_path_under(&root, &event.path)),
                                    );
                                }
                                Err(e) => error!("Definition watcher error: {:?}", e),
                            }
                        }

                        for path in changed {
                            source.handle_change(&path).await;
                        }
                    }
                }
            }
        });

        Ok(WatchHandle::new(handle, shutdown_tx))
    }
}

/// Handle for a running watcher.
pub struct WatchHandle {
    handle: tokio::task::JoinHandle<()>,
    shutdown: tokio::sync::oneshot::Sender<()>,
}

impl WatchHandle {
    pub fn new(
        handle: tokio::task::JoinHandle<()>,
        shutdown: tokio::sync::oneshot::Sender<()>,
    ) -> Self {
        Self { handle, shutdown }
    }

    /// Stops the watcher and waits for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{FileSystemOrigin, ProviderState};
    use crate::registry::RegistryEventKind;
    use std::path::Path;
    use tempfile::TempDir;
    use tokio::time::timeout;

    fn write(root: &Path, relative: &str, content: &str) {
        let file = root.join(relative);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, content).unwrap();
    }

    fn source(root: &Path) -> (DefinitionSource, Arc<SchemaRegistry>) {
        let registry = Arc::new(SchemaRegistry::new());
        let source = DefinitionSource::new(
            Arc::new(FileSystemOrigin::new(root)),
            DefinitionPathPattern::new("graphqls", "graphql").unwrap(),
            Arc::clone(&registry),
        );
        (source, registry)
    }

    #[tokio::test]
    async fn test_scan_registers_matching_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "tours/graphqls/tours.graphql", "type Tour { name: String }");
        write(dir.path(), "site/graphqls/v1/pages.graphql", "type Page { title: String }");
        write(dir.path(), "site/graphqls/broken.graphql", "type Page {");
        write(dir.path(), "site/dialogs/page.yaml", "label: Page");

        let (source, registry) = source(dir.path());
        assert_eq!(source.scan().await.unwrap(), 3);
        assert_eq!(registry.reference_ids().await, vec!["broken", "v1/pages", "tours"]);

        let broken = registry.provider("broken").await.unwrap();
        assert!(!broken.is_valid().await);
        assert_eq!(broken.problems().await.len(), 1);

        assert_eq!(registry.collect_fragments().await.len(), 2);
    }

    #[tokio::test]
    async fn test_handle_change_of_known_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "tours/graphqls/tours.graphql", "type Tour { name: String }");

        let (source, registry) = source(dir.path());
        let provider = source
            .load_and_register("/tours/graphqls/tours.graphql")
            .await
            .unwrap();
        assert_eq!(provider.state().await, ProviderState::Cached);

        let mut events = registry.subscribe();
        source.handle_change("/tours/graphqls/tours.graphql").await;
        assert_eq!(events.recv().await.unwrap().kind, RegistryEventKind::Reregistered);

        source.handle_change("/tours/graphqls/new.graphql").await;
        assert!(events.try_recv().is_err());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_removed_file_stays_registered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "tours/graphqls/tours.graphql", "type Tour { name: String }");

        let (source, registry) = source(dir.path());
        source.scan().await.unwrap();
        std::fs::remove_file(dir.path().join("tours/graphqls/tours.graphql")).unwrap();

        source.handle_change("/tours/graphqls/tours.graphql").await;
        assert!(registry.contains("tours").await);
    }

    #[tokio::test]
    async fn test_watch_registers_new_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("tours/graphqls")).unwrap();

        let (source, registry) = source(dir.path());
        let mut events = registry.subscribe();
        let handle = source.watch(Duration::from_millis(100)).unwrap();

        // Give watcher time to start
        tokio::time::sleep(Duration::from_millis(200)).await;

        write(dir.path(), "tours/graphqls/tours.graphql", "type Tour { name: String }");

        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timeout waiting for registry event")
            .unwrap();
        assert_eq!(event.kind, RegistryEventKind::Registered);
        assert_eq!(event.reference_id, "tours");

        handle.stop().await;
    }

    #[test]
    fn test_watch_requires_local_origin() {
        struct RemoteOrigin;

        #[async_trait::async_trait]
        impl ResourceOrigin for RemoteOrigin {
            fn name(&self) -> &str {
                "remote"
            }
            async fn has_path(&self, _path: &str) -> bool {
                false
            }
            async fn last_modified(&self, path: &str) -> Result<u64, DefinitionError> {
                Err(DefinitionError::InvalidPath(path.to_string()))
            }
            async fn read_to_string(&self, path: &str) -> Result<String, DefinitionError> {
                Err(DefinitionError::InvalidPath(path.to_string()))
            }
            async fn list(&self) -> Result<Vec<String>, DefinitionError> {
                Ok(Vec::new())
            }
        }

        let source = DefinitionSource::new(
            Arc::new(RemoteOrigin),
            DefinitionPathPattern::new("graphqls", "graphql").unwrap(),
            Arc::new(SchemaRegistry::new()),
        );
        assert!(matches!(
            source.watch(Duration::from_millis(100)),
            Err(DefinitionError::Watch(_))
        ));
    }
}
