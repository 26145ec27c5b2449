//! Query execution against an in-memory content repository.

use std::sync::Arc;

use async_graphql::Request;
use async_graphql::dynamic::Schema;
use async_trait::async_trait;
use contentql_db_memory::InMemoryRepository;
use contentql_graphql::schema::{ContentSchemaBuilder, SchemaBuilderConfig, TypeRegistry};
use contentql_graphql::{DeliveryEndpoint, GraphQLContext};
use contentql_storage::{ContentRepository, DynRepository, DynSession, StorageError};
use serde_json::{Value, json};

fn seed() -> Value {
    json!({
        "site": [
            {
                "name": "a",
                "nodeType": "mgnl:page",
                "properties": { "title": "A" },
                "children": [
                    {
                        "name": "p1",
                        "nodeType": "mgnl:page",
                        "properties": { "title": "Page one", "tags": ["x", "y"] },
                        "children": [
                            { "name": "p1a", "nodeType": "mgnl:page" },
                            { "name": "area", "nodeType": "mgnl:area" }
                        ]
                    },
                    { "name": "f1", "nodeType": "mgnl:folder" }
                ]
            }
        ],
        "tours": [
            {
                "name": "kyoto",
                "nodeType": "mgnl:content",
                "properties": { "name": "Kyoto", "duration": 7, "featured": true }
            },
            { "name": "archive", "nodeType": "mgnl:folder" }
        ]
    })
}

async fn repository() -> DynRepository {
    Arc::new(InMemoryRepository::from_seed(seed()).await.unwrap())
}

fn schema(fragments: &[&str], delivery: Vec<DeliveryEndpoint>) -> Schema {
    let fragments: Vec<TypeRegistry> = fragments
        .iter()
        .map(|sdl| TypeRegistry::parse(sdl).unwrap())
        .collect();
    let (_, schema) = ContentSchemaBuilder::new(SchemaBuilderConfig::default())
        .with_delivery(delivery)
        .build(fragments.iter())
        .unwrap();
    schema
}

async fn execute(
    schema: &Schema,
    repository: DynRepository,
    query: &str,
) -> async_graphql::Response {
    let context = GraphQLContext::builder()
        .with_repository(repository)
        .with_request_id("test")
        .build()
        .unwrap();
    schema.execute(Request::new(query).data(context)).await
}

const PAGES: &str = r#"
extend type Query {
  pages: [Node] @definition(workspace: "site", rootPath: "/a", nodeTypes: ["mgnl:page"])
}
"#;

#[tokio::test]
async fn directive_field_filters_by_node_type() {
    let schema = schema(&[PAGES], vec![]);
    let response = execute(&schema, repository().await, "{ pages { name nodeType } }").await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "pages": [{ "name": "p1", "nodeType": "mgnl:page" }] })
    );
}

#[tokio::test]
async fn nested_children_inherit_the_filter() {
    let schema = schema(&[PAGES], vec![]);
    let response = execute(
        &schema,
        repository().await,
        "{ pages { name children { name } } }",
    )
    .await;

    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "pages": [{ "name": "p1", "children": [{ "name": "p1a" }] }] })
    );
}

#[tokio::test]
async fn implicit_nodes_field_is_unfiltered() {
    let schema = schema(&[], vec![]);
    let response = execute(
        &schema,
        repository().await,
        r#"{ nodes(workspace: "site", path: "/a") { name path } }"#,
    )
    .await;

    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "nodes": [
            { "name": "p1", "path": "/a/p1" },
            { "name": "f1", "path": "/a/f1" }
        ] })
    );
}

#[tokio::test]
async fn nodes_field_ignores_directives() {
    let schema = schema(
        &[r#"
        extend type Query {
          nodes(workspace: String!, path: String): [Node] @definition(workspace: "tours")
        }
        "#],
        vec![],
    );
    let response = execute(
        &schema,
        repository().await,
        r#"{ nodes(workspace: "site", path: "/a") { name } }"#,
    )
    .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "nodes": [{ "name": "p1" }, { "name": "f1" }] })
    );
}

#[tokio::test]
async fn properties_are_exposed() {
    let schema = schema(&[], vec![]);
    let response = execute(
        &schema,
        repository().await,
        r#"{ nodes(workspace: "site", path: "/a") { name properties { name string type } } }"#,
    )
    .await;

    let data = response.data.into_json().unwrap();
    assert_eq!(
        data["nodes"][0]["properties"],
        json!([
            { "name": "title", "string": "Page one", "type": "String" },
            { "name": "tags", "string": "x,y", "type": "Multiple" }
        ])
    );
    assert_eq!(data["nodes"][1]["properties"], json!([]));
}

#[tokio::test]
async fn delivery_endpoint_is_queryable() {
    let schema = schema(
        &[],
        vec![DeliveryEndpoint::new("tours/v1", "tours").with_node_types(["mgnl:content"])],
    );
    let response = execute(&schema, repository().await, "{ tours_v1 { name } }").await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "tours_v1": [{ "name": "kyoto" }] })
    );
}

#[tokio::test]
async fn custom_object_type_reads_properties() {
    let schema = schema(
        &[r#"
        type Tour { name: String duration: Int featured: Boolean missing: String }
        extend type Query {
          tours: [Tour] @definition(workspace: "tours", nodeTypes: ["mgnl:content"])
        }
        "#],
        vec![],
    );
    let response = execute(
        &schema,
        repository().await,
        "{ tours { name duration featured missing } }",
    )
    .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "tours": [{
            "name": "kyoto",
            "duration": 7,
            "featured": true,
            "missing": null
        }] })
    );
}

#[tokio::test]
async fn content_errors_are_reported_per_field() {
    let schema = schema(
        &[r#"extend type Query { ghost: [Node] @definition(workspace: "nowhere") }"#, PAGES],
        vec![],
    );
    let response = execute(
        &schema,
        repository().await,
        r#"{
            ghost { name }
            pages { name }
            missing: nodes(workspace: "site", path: "/zzz") { name }
        }"#,
    )
    .await;

    let data = response.data.into_json().unwrap();
    assert_eq!(data["pages"], json!([{ "name": "p1" }]));
    assert_eq!(data["ghost"], Value::Null);
    assert_eq!(data["missing"], Value::Null);

    let codes: Vec<String> = response
        .errors
        .iter()
        .filter_map(|e| e.extensions.as_ref()?.get("code").map(|v| v.to_string()))
        .collect();
    assert_eq!(codes.len(), 2);
    assert!(codes.iter().any(|c| c.contains("WORKSPACE_NOT_FOUND")));
    assert!(codes.iter().any(|c| c.contains("NODE_NOT_FOUND")));
}

#[tokio::test]
async fn field_without_directive_is_not_resolvable() {
    let schema = schema(
        &[
            "extend type Query { orphan: [Node] }",
            r#"extend type Query { broken: [Node] @definition(rootPath: "/a") }"#,
        ],
        vec![],
    );
    let response = execute(&schema, repository().await, "{ orphan { name } }").await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Field Query.orphan is not resolvable");

    let response = execute(&schema, repository().await, "{ broken { name } }").await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Field Query.broken is not resolvable");

    // Not requested, not an error.
    let response = execute(
        &schema,
        repository().await,
        r#"{ pages: nodes(workspace: "site") { name } }"#,
    )
    .await;
    assert!(response.errors.is_empty());
}

struct FailingRepository;

#[async_trait]
impl ContentRepository for FailingRepository {
    async fn session(&self, _workspace: &str) -> Result<DynSession, StorageError> {
        Err(StorageError::connection_error("repository is down"))
    }

    async fn workspaces(&self) -> Result<Vec<String>, StorageError> {
        Err(StorageError::connection_error("repository is down"))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

#[tokio::test]
async fn repository_failure_does_not_fail_the_query() {
    let schema = schema(&[PAGES], vec![]);
    let response = execute(
        &schema,
        Arc::new(FailingRepository),
        r#"{ pages { name } nodes(workspace: "site") { name } __typename }"#,
    )
    .await;

    assert_eq!(response.errors.len(), 2);
    for error in &response.errors {
        assert_eq!(
            error.extensions.as_ref().unwrap().get("code"),
            Some(&async_graphql::Value::from("STORAGE_ERROR"))
        );
    }
    assert_eq!(response.data.into_json().unwrap()["__typename"], json!("Query"));
}
