//! Axum HTTP handlers for GraphQL endpoints.
//!
//! - `POST /graphql` - Execute a query (JSON body)
//! - `GET /graphql` - Execute a query passed as URL parameters
//! - `GET /graphql/sdl` - SDL of the published schema
//!
//! Every request runs against the snapshot published when it arrived.

use std::sync::Arc;

use async_graphql::{Request, Response, Variables};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response as HttpResponse};
use contentql_storage::DynRepository;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::GraphQLContext;
use crate::error::GraphQLError;
use crate::schema::LiveSchema;

/// State shared across GraphQL handlers.
#[derive(Clone)]
pub struct GraphQLState {
    /// Published schema.
    pub live: Arc<LiveSchema>,

    /// Repository handed to every request context.
    pub repository: DynRepository,
}

impl GraphQLState {
    pub fn new(live: Arc<LiveSchema>, repository: DynRepository) -> Self {
        Self { live, repository }
    }
}

/// GraphQL request body.
#[derive(Debug, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL query string. Missing means empty.
    #[serde(default)]
    pub query: String,

    /// Optional operation name for multi-operation documents.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Optional variables for the query.
    pub variables: Option<serde_json::Value>,
}

/// Query parameters for GET requests.
#[derive(Debug, Deserialize)]
pub struct GraphQLQueryParams {
    pub query: Option<String>,

    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Variables as a JSON string.
    pub variables: Option<String>,
}

/// GraphQL response document.
#[derive(Debug, Serialize)]
pub struct GraphQLResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl GraphQLResponse {
    /// Neither data nor errors.
    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.errors.is_empty()
    }
}

impl From<Response> for GraphQLResponse {
    fn from(resp: Response) -> Self {
        let data_json = serde_json::to_value(&resp.data).unwrap_or(serde_json::Value::Null);
        let data = if data_json.is_null() {
            None
        } else {
            Some(data_json)
        };

        let errors = resp
            .errors
            .iter()
            .map(|e| {
                serde_json::to_value(e)
                    .unwrap_or_else(|_| serde_json::json!({ "message": e.message }))
            })
            .collect();

        Self {
            data,
            errors,
            extensions: if resp.extensions.is_empty() {
                None
            } else {
                Some(serde_json::to_value(&resp.extensions).unwrap_or(serde_json::Value::Null))
            },
        }
    }
}

/// Handles `POST /graphql`.
pub async fn graphql_handler(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Json(request): Json<GraphQLRequest>,
) -> HttpResponse {
    debug!("Processing GraphQL request");
    execute_graphql(state, headers, request).await
}

/// Handles `GET /graphql`.
pub async fn graphql_handler_get(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Query(params): Query<GraphQLQueryParams>,
) -> HttpResponse {
    let request = match params_to_request(params) {
        Ok(req) => req,
        Err(e) => return error_response(GraphQLError::InvalidRequest(e.to_string())),
    };

    debug!("Processing GraphQL GET request");
    execute_graphql(state, headers, request).await
}

/// Handles `GET /graphql/sdl`.
pub async fn sdl_handler(State(state): State<GraphQLState>) -> HttpResponse {
    match state.live.current() {
        Some(snapshot) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            snapshot.schema.sdl(),
        )
            .into_response(),
        None => error_response(GraphQLError::SchemaUnavailable),
    }
}

async fn execute_graphql(
    state: GraphQLState,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> HttpResponse {
    // One load per request; later rebuilds do not affect this execution.
    let Some(snapshot) = state.live.current() else {
        warn!("GraphQL request before any schema was published");
        return error_response(GraphQLError::SchemaUnavailable);
    };

    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let context = match GraphQLContext::builder()
        .with_repository(state.repository.clone())
        .with_request_id(request_id)
        .build()
    {
        Ok(ctx) => ctx,
        Err(e) => return error_response(GraphQLError::Internal(e.to_string())),
    };

    let mut gql_request = Request::new(&request.query);

    if let Some(op_name) = request.operation_name {
        gql_request = gql_request.operation_name(op_name);
    }

    if let Some(vars) = request.variables {
        gql_request = gql_request.variables(Variables::from_json(vars));
    }

    gql_request = gql_request.data(context);

    debug!(
        generation = snapshot.generation,
        query = %request.query,
        "Executing GraphQL query"
    );
    let response = GraphQLResponse::from(snapshot.schema.execute(gql_request).await);

    if response.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    // Field errors are part of the document, status stays 200.
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(response),
    )
        .into_response()
}

/// Converts GET query params to a GraphQL request.
fn params_to_request(params: GraphQLQueryParams) -> Result<GraphQLRequest, serde_json::Error> {
    let variables = if let Some(vars_str) = params.variables {
        Some(serde_json::from_str(&vars_str)?)
    } else {
        None
    };

    Ok(GraphQLRequest {
        query: params.query.unwrap_or_default(),
        operation_name: params.operation_name,
        variables,
    })
}

/// Returns an error response.
fn error_response(error: GraphQLError) -> HttpResponse {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = serde_json::json!({
        "errors": [{
            "message": error.to_string(),
            "extensions": {
                "code": error.error_code(),
            }
        }]
    });

    let mut response = (status, Json(body)).into_response();
    if let Some(seconds) = error.retry_after() {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
    }
    response
}
