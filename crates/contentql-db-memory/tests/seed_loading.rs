//! Seed document loading tests.

use contentql_db_memory::{InMemoryRepository, SeedError};
use contentql_storage::ContentRepository;
use serde_json::json;

fn seed() -> serde_json::Value {
    json!({
        "website": [
            {
                "name": "a",
                "nodeType": "mgnl:page",
                "properties": { "title": "A", "order": 2 },
                "children": [
                    { "name": "p1", "nodeType": "mgnl:page", "properties": { "title": "P1" } },
                    { "name": "f1", "nodeType": "mgnl:folder" },
                    { "name": "p2", "nodeType": "mgnl:page" }
                ]
            },
            { "name": "b" }
        ],
        "tours": [
            { "name": "magnolia-travels", "nodeType": "mgnl:folder" }
        ]
    })
}

#[tokio::test]
async fn seeds_workspaces_and_nodes_in_order() {
    let repository = InMemoryRepository::from_seed(seed()).await.unwrap();

    assert_eq!(
        repository.workspaces().await.unwrap(),
        vec!["tours".to_string(), "website".to_string()]
    );

    let session = repository.session("website").await.unwrap();
    let top: Vec<_> = session
        .children("/")
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.name)
        .collect();
    assert_eq!(top, vec!["a", "b"]);

    let children: Vec<_> = session
        .children("/a")
        .await
        .unwrap()
        .into_iter()
        .map(|n| (n.name, n.primary_type))
        .collect();
    assert_eq!(
        children,
        vec![
            ("p1".to_string(), "mgnl:page".to_string()),
            ("f1".to_string(), "mgnl:folder".to_string()),
            ("p2".to_string(), "mgnl:page".to_string()),
        ]
    );
}

#[tokio::test]
async fn keeps_property_order_and_defaults_node_type() {
    let repository = InMemoryRepository::from_seed(seed()).await.unwrap();
    let session = repository.session("website").await.unwrap();

    let a = session.node("/a").await.unwrap().unwrap();
    let names: Vec<_> = a.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["title", "order"]);

    let b = session.node("/b").await.unwrap().unwrap();
    assert_eq!(b.primary_type, "mgnl:content");
}

#[tokio::test]
async fn loads_seed_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("seed.json");
    std::fs::write(&file, seed().to_string()).unwrap();

    let repository = InMemoryRepository::from_seed_file(&file).await.unwrap();
    assert_eq!(repository.node_count("website"), 6);
}

#[tokio::test]
async fn rejects_malformed_seed() {
    let err = InMemoryRepository::from_seed(json!({ "website": { "name": "a" } }))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SeedError::Json(_)));

    let err = InMemoryRepository::from_seed_file("/definitely/not/here.json")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SeedError::Io { .. }));
}
