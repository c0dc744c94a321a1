//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into a single OpenAPI 3.1 document, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "agentgate API",
        version = "0.1.0",
        description = "REST and SSE front end for Llama Stack agents.",
    ),
    tags(
        (name = "Root", description = "Landing page"),
        (name = "Info", description = "Service name and version"),
        (name = "Models", description = "Models registered upstream"),
        (name = "Query", description = "Single-turn and streamed queries"),
        (name = "Config", description = "Redacted service configuration"),
        (name = "Feedback", description = "User feedback collection"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Caller identity"),
        (name = "Conversations", description = "Conversation history and deletion"),
        (name = "Metrics", description = "Prometheus scrape endpoint"),
    ),
    paths(
        crate::api::root::root,
        crate::api::info::info,
        crate::api::models::models,
        crate::api::query::query,
        crate::api::streaming_query::streaming_query_endpoint_handler,
        crate::api::config::config,
        crate::api::feedback::feedback,
        crate::api::feedback::feedback_status,
        crate::api::health::readiness,
        crate::api::health::liveness,
        crate::api::authorized::authorized,
        crate::api::conversations::get_conversation,
        crate::api::conversations::delete_conversation,
        crate::api::metrics::metrics,
    ),
    components(schemas(
        agentgate_core::QueryRequest,
        agentgate_core::Attachment,
        agentgate_core::FeedbackRequest,
        crate::error::ErrorResponse,
        crate::error::ErrorDetail,
    ))
)]
pub struct ApiDoc;
