//! Modification checks of the lazy definition provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use contentql_graphql::definition::{
    DefinitionError, DefinitionPathPattern, DefinitionProvider, LazyDefinitionProvider,
    ManualClock, ProviderState, ResourceOrigin, Severity,
};
use tokio::sync::Mutex;

const PATH: &str = "/tours/graphqls/tours.graphql";

/// Single-file origin that counts every access.
#[derive(Default)]
struct CountingOrigin {
    sdl: Mutex<String>,
    modified: AtomicU64,
    present: AtomicBool,
    has_path_calls: AtomicUsize,
    modified_calls: AtomicUsize,
    reads: AtomicUsize,
}

impl CountingOrigin {
    fn new(sdl: &str, modified: u64) -> Arc<Self> {
        let origin = Self {
            sdl: Mutex::new(sdl.to_string()),
            modified: AtomicU64::new(modified),
            present: AtomicBool::new(true),
            ..Default::default()
        };
        Arc::new(origin)
    }

    async fn edit(&self, sdl: &str, modified: u64) {
        *self.sdl.lock().await = sdl.to_string();
        self.modified.store(modified, Ordering::SeqCst);
    }

    fn modified_calls(&self) -> usize {
        self.modified_calls.load(Ordering::SeqCst)
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceOrigin for CountingOrigin {
    fn name(&self) -> &str {
        "counting"
    }

    async fn has_path(&self, path: &str) -> bool {
        self.has_path_calls.fetch_add(1, Ordering::SeqCst);
        path == PATH && self.present.load(Ordering::SeqCst)
    }

    async fn last_modified(&self, _path: &str) -> Result<u64, DefinitionError> {
        self.modified_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.modified.load(Ordering::SeqCst))
    }

    async fn read_to_string(&self, _path: &str) -> Result<String, DefinitionError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.sdl.lock().await.clone())
    }

    async fn list(&self) -> Result<Vec<String>, DefinitionError> {
        Ok(vec![PATH.to_string()])
    }
}

fn provider(origin: &Arc<CountingOrigin>, clock: &Arc<ManualClock>) -> LazyDefinitionProvider {
    let metadata = DefinitionPathPattern::new("graphqls", "graphql")
        .unwrap()
        .metadata(PATH)
        .unwrap();
    LazyDefinitionProvider::new(metadata, origin.clone())
        .with_clock(clock.clone())
}

fn field_names(definition: &contentql_graphql::definition::GraphQLDefinition) -> Vec<String> {
    definition
        .fragment
        .object("Tour")
        .unwrap()
        .fields
        .iter()
        .map(|f| f.name.clone())
        .collect()
}

#[tokio::test]
async fn first_get_resolves() {
    let origin = CountingOrigin::new("type Tour { name: String }", 5_000);
    let clock = Arc::new(ManualClock::new(10_000));
    let provider = provider(&origin, &clock);

    assert_eq!(provider.state().await, ProviderState::Fresh);
    let definition = provider.get().await.unwrap();

    assert_eq!(field_names(&definition), vec!["name"]);
    assert_eq!(definition.metadata.reference_id, "tours");
    assert_eq!(provider.state().await, ProviderState::Cached);
    assert_eq!(provider.last_resolved().await, Some(5_000));
    assert!(provider.is_valid().await);
    assert!(provider.problems().await.is_empty());
    assert_eq!(origin.reads(), 1);
}

#[tokio::test]
async fn get_within_threshold_does_not_touch_the_origin() {
    let origin = CountingOrigin::new("type Tour { name: String }", 5_000);
    let clock = Arc::new(ManualClock::new(10_000));
    let provider = provider(&origin, &clock);

    provider.get().await.unwrap();
    assert_eq!(origin.modified_calls(), 1);

    clock.advance(999);
    origin.edit("type Tour { title: String }", 10_500).await;
    let definition = provider.get().await.unwrap();

    assert_eq!(origin.modified_calls(), 1);
    assert_eq!(origin.has_path_calls.load(Ordering::SeqCst), 1);
    assert_eq!(field_names(&definition), vec!["name"]);
}

#[tokio::test]
async fn unchanged_resource_is_not_reparsed() {
    let origin = CountingOrigin::new("type Tour { name: String }", 5_000);
    let clock = Arc::new(ManualClock::new(10_000));
    let provider = provider(&origin, &clock);

    let first = provider.get().await.unwrap();
    clock.advance(1_000);
    let second = provider.get().await.unwrap();

    assert_eq!(origin.modified_calls(), 2);
    assert_eq!(origin.reads(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn newer_resource_is_reparsed() {
    let origin = CountingOrigin::new("type Tour { name: String }", 5_000);
    let clock = Arc::new(ManualClock::new(10_000));
    let provider = provider(&origin, &clock);

    provider.get().await.unwrap();
    origin.edit("type Tour { name: String title: String }", 10_500).await;
    clock.advance(1_500);
    let definition = provider.get().await.unwrap();

    assert_eq!(origin.reads(), 2);
    assert_eq!(field_names(&definition), vec!["name", "title"]);
    assert_eq!(provider.last_resolved().await, Some(10_500));
}

#[tokio::test]
async fn removed_resource_keeps_last_value() {
    let origin = CountingOrigin::new("type Tour { name: String }", 5_000);
    let clock = Arc::new(ManualClock::new(10_000));
    let provider = provider(&origin, &clock);

    provider.get().await.unwrap();
    origin.present.store(false, Ordering::SeqCst);
    clock.advance(2_000);

    let definition = provider.get().await.unwrap();
    assert_eq!(field_names(&definition), vec!["name"]);
    assert_eq!(provider.state().await, ProviderState::Gone);
    assert_eq!(origin.modified_calls(), 1);
}

#[tokio::test]
async fn failed_resolution_clears_value_and_records_problem() {
    let origin = CountingOrigin::new("type Tour { name: String }", 5_000);
    let clock = Arc::new(ManualClock::new(10_000));
    let provider = provider(&origin, &clock);

    provider.get().await.unwrap();
    origin.edit("type Tour { name: ", 11_000).await;
    clock.advance(1_000);

    assert!(provider.get().await.is_none());
    assert!(!provider.is_valid().await);
    let problems = provider.problems().await;
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].severity, Severity::Severe);
    assert_eq!(
        problems[0].title,
        "Parsing configuration data from [/tours/graphqls/tours.graphql] failed"
    );

    // Fixing the file brings the definition back.
    origin.edit("type Tour { name: String }", 12_000).await;
    clock.advance(1_000);
    assert!(provider.get().await.is_some());
    assert!(provider.problems().await.is_empty());
}

#[tokio::test]
async fn failed_resolution_is_retried_without_a_new_modification() {
    let origin = CountingOrigin::new("type Tour { name: String }", 5_000);
    let clock = Arc::new(ManualClock::new(10_000));
    let provider = provider(&origin, &clock);

    provider.get().await.unwrap();
    assert_eq!(provider.last_resolved().await, Some(5_000));

    origin.edit("type Tour { name: ", 6_000).await;
    clock.advance(1_000);
    assert!(provider.get().await.is_none());
    assert_eq!(origin.reads(), 2);
    assert_eq!(provider.last_resolved().await, Some(5_000));

    clock.advance(2_000);
    assert!(provider.get().await.is_none());
    assert_eq!(origin.reads(), 3);
    assert_eq!(provider.problems().await.len(), 1);
}

#[tokio::test]
async fn recheck_skips_the_threshold() {
    let origin = CountingOrigin::new("type Tour { name: String }", 5_000);
    let clock = Arc::new(ManualClock::new(10_000));
    let provider = provider(&origin, &clock);

    provider.get().await.unwrap();
    origin.edit("type Tour { title: String }", 10_100).await;
    provider.recheck().await;

    let definition = provider.get().await.unwrap();
    assert_eq!(field_names(&definition), vec!["title"]);
}

#[tokio::test]
async fn concurrent_gets_share_one_resolution() {
    let origin = CountingOrigin::new("type Tour { name: String }", 5_000);
    let clock = Arc::new(ManualClock::new(10_000));
    let provider = Arc::new(provider(&origin, &clock));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let provider = provider.clone();
            tokio::spawn(async move { provider.get().await.is_some() })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap());
    }

    assert_eq!(origin.reads(), 1);
}
