//! Registry of schema-producing definitions.
//!
//! The registry keeps providers in registration order, which is also the
//! order their fragments are merged in. Every change is broadcast as a
//! [`RegistryEvent`]; [`spawn_rebuild_listener`] turns events into full
//! rebuilds of the live schema.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::RwLock;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::definition::DefinitionProvider;
use crate::error::GraphQLError;
use crate::schema::{LiveSchema, SchemaSnapshot, SourcedFragment};

/// Shared provider handle.
pub type DynDefinitionProvider = Arc<dyn DefinitionProvider>;

const EVENT_CAPACITY: usize = 64;

/// What happened to a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEventKind {
    Registered,
    /// Registered again, or its backing resource changed.
    Reregistered,
    Unregistered,
}

/// Change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEvent {
    pub kind: RegistryEventKind,
    pub reference_id: String,
}

impl RegistryEvent {
    fn new(kind: RegistryEventKind, reference_id: impl Into<String>) -> Self {
        Self {
            kind,
            reference_id: reference_id.into(),
        }
    }
}

/// Known definitions, keyed by reference id.
pub struct SchemaRegistry {
    providers: RwLock<IndexMap<String, DynDefinitionProvider>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            providers: RwLock::new(IndexMap::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Adds `provider`, replacing one with the same reference id in place.
    pub async fn register(&self, provider: DynDefinitionProvider) -> RegistryEventKind {
        let reference_id = provider.metadata().reference_id.clone();
        let path = provider.metadata().path.clone();

        let previous = self
            .providers
            .write()
            .await
            .insert(reference_id.clone(), provider);

        let kind = match previous {
            Some(previous) => {
                if previous.metadata().path != path {
                    warn!(
                        reference_id = %reference_id,
                        previous = %previous.metadata().path,
                        path = %path,
                        "Definition replaced by another file with the same reference id"
                    );
                }
                RegistryEventKind::Reregistered
            }
            None => RegistryEventKind::Registered,
        };

        debug!(reference_id = %reference_id, kind = ?kind, "Definition registered");
        self.emit(RegistryEvent::new(kind, reference_id));
        kind
    }

    /// Removes every definition in `to_remove`, then registers `to_add`,
    /// under one write lock.
    pub async fn unregister_and_register(
        &self,
        to_remove: &[String],
        to_add: Vec<DynDefinitionProvider>,
    ) {
        let mut events = Vec::with_capacity(to_remove.len() + to_add.len());
        {
            let mut providers = self.providers.write().await;
            for reference_id in to_remove {
                if providers.shift_remove(reference_id).is_some() {
                    events.push(RegistryEvent::new(
                        RegistryEventKind::Unregistered,
                        reference_id.clone(),
                    ));
                } else {
                    debug!(reference_id = %reference_id, "Definition to remove is not registered");
                }
            }
            for provider in to_add {
                let reference_id = provider.metadata().reference_id.clone();
                let kind = match providers.insert(reference_id.clone(), provider) {
                    Some(_) => RegistryEventKind::Reregistered,
                    None => RegistryEventKind::Registered,
                };
                events.push(RegistryEvent::new(kind, reference_id));
            }
        }

        for event in events {
            self.emit(event);
        }
    }

    /// Announces that the definition behind `reference_id` changed.
    ///
    /// Returns `false` if it is not registered.
    pub async fn notify_changed(&self, reference_id: &str) -> bool {
        if !self.providers.read().await.contains_key(reference_id) {
            return false;
        }
        self.emit(RegistryEvent::new(
            RegistryEventKind::Reregistered,
            reference_id,
        ));
        true
    }

    pub async fn provider(&self, reference_id: &str) -> Option<DynDefinitionProvider> {
        self.providers.read().await.get(reference_id).cloned()
    }

    pub async fn contains(&self, reference_id: &str) -> bool {
        self.providers.read().await.contains_key(reference_id)
    }

    /// Reference ids in registration order.
    pub async fn reference_ids(&self) -> Vec<String> {
        self.providers.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.providers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.providers.read().await.is_empty()
    }

    /// Fragments of all currently valid definitions, in registration order.
    pub async fn collect_fragments(&self) -> Vec<SourcedFragment> {
        let providers: Vec<DynDefinitionProvider> =
            self.providers.read().await.values().cloned().collect();

        let mut fragments = Vec::with_capacity(providers.len());
        for provider in providers {
            let reference_id = provider.metadata().reference_id.clone();
            match provider.get().await {
                Some(definition) => fragments.push(SourcedFragment {
                    reference_id,
                    fragment: Arc::clone(&definition.fragment),
                }),
                None => debug!(reference_id = %reference_id, "Skipping invalid definition"),
            }
        }
        fragments
    }

    /// Rebuilds `live` from the current definitions.
    ///
    /// # Errors
    ///
    /// Returns the build error; the previous snapshot stays published.
    pub async fn rebuild(&self, live: &LiveSchema) -> Result<Arc<SchemaSnapshot>, GraphQLError> {
        let fragments = self.collect_fragments().await;
        live.rebuild(fragments).await
    }

    fn emit(&self, event: RegistryEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

/// Rebuilds `live` whenever `registry` reports a change.
///
/// Events that queue up while a rebuild runs are folded into the next one.
/// The task ends once the registry is dropped.
pub fn spawn_rebuild_listener(
    registry: &Arc<SchemaRegistry>,
    live: Arc<LiveSchema>,
) -> JoinHandle<()> {
    let mut events = registry.subscribe();
    let registry = Arc::downgrade(registry);

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(reference_id = %event.reference_id, kind = ?event.kind, "Registry changed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Registry listener lagged");
                }
                Err(RecvError::Closed) => break,
            }

            let mut coalesced = 1usize;
            loop {
                match events.try_recv() {
                    Ok(_) | Err(TryRecvError::Lagged(_)) => coalesced += 1,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }

            let Some(strong) = registry.upgrade() else {
                break;
            };
            match strong.rebuild(&live).await {
                Ok(snapshot) => info!(
                    generation = snapshot.generation,
                    events = coalesced,
                    "Schema rebuilt after registry change"
                ),
                Err(e) => warn!(error = %e, "Schema rebuild after registry change failed"),
            }
        }
        debug!("Rebuild listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::StaticDefinitionProvider;

    fn provider(reference_id: &str, sdl: &str) -> DynDefinitionProvider {
        Arc::new(StaticDefinitionProvider::new(reference_id, sdl))
    }

    #[tokio::test]
    async fn test_register_emits_events() {
        let registry = SchemaRegistry::new();
        let mut events = registry.subscribe();

        let kind = registry
            .register(provider("tours", "type Tour { name: String }"))
            .await;
        assert_eq!(kind, RegistryEventKind::Registered);
        let kind = registry
            .register(provider("tours", "type Tour { title: String }"))
            .await;
        assert_eq!(kind, RegistryEventKind::Reregistered);

        assert_eq!(
            events.recv().await.unwrap(),
            RegistryEvent::new(RegistryEventKind::Registered, "tours")
        );
        assert_eq!(
            events.recv().await.unwrap(),
            RegistryEvent::new(RegistryEventKind::Reregistered, "tours")
        );
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_registration_order_is_kept() {
        let registry = SchemaRegistry::new();
        registry.register(provider("b", "type B { x: String }")).await;
        registry.register(provider("a", "type A { x: String }")).await;
        registry.register(provider("b", "type B { y: String }")).await;

        assert_eq!(registry.reference_ids().await, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_unregister_and_register() {
        let registry = SchemaRegistry::new();
        registry.register(provider("old", "type Old { x: String }")).await;
        let mut events = registry.subscribe();

        registry
            .unregister_and_register(
                &["old".to_string(), "missing".to_string()],
                vec![provider("new", "type New { x: String }")],
            )
            .await;

        assert_eq!(registry.reference_ids().await, vec!["new"]);
        assert_eq!(events.recv().await.unwrap().kind, RegistryEventKind::Unregistered);
        assert_eq!(events.recv().await.unwrap().kind, RegistryEventKind::Registered);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notify_changed() {
        let registry = SchemaRegistry::new();
        assert!(!registry.notify_changed("tours").await);

        registry.register(provider("tours", "type Tour { x: String }")).await;
        let mut events = registry.subscribe();
        assert!(registry.notify_changed("tours").await);
        assert_eq!(
            events.recv().await.unwrap(),
            RegistryEvent::new(RegistryEventKind::Reregistered, "tours")
        );
    }

    #[tokio::test]
    async fn test_collect_fragments_skips_invalid() {
        let registry = SchemaRegistry::new();
        registry.register(provider("tours", "type Tour { x: String }")).await;
        registry.register(provider("broken", "type {")).await;
        registry.register(provider("pages", "type Page { x: String }")).await;

        let fragments = registry.collect_fragments().await;
        let ids: Vec<&str> = fragments.iter().map(|f| f.reference_id.as_str()).collect();
        assert_eq!(ids, vec!["tours", "pages"]);
    }
}
