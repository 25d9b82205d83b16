//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Every successful mutation is followed by a full recompute under the same
//! write lock, so a read that follows a mutation sees fresh routes.

use super::{
    AppState,
    types::{
        AddLinkRequest, AddNodeRequest, AddNodeResponse, ErrorResponse, HealthResponse,
        HysteresisResponse, HysteresisUpdateRequest, LinkJson, LinkStateResponse,
        LinkStatusRequest, LinkWeightRequest, MutationResponse, NodeJson, PathResponse,
        RecomputeResponse, RouteTableResponse, StatusResponse, TopologyLoadResponse,
        TopologyResponse,
    },
};
use crate::ticker::epoch_ms;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use linkstate_core::{
    LinkStateError, NodeId, RouteExport, Session, TopologyMetrics, reachable_pairs,
};
use std::time::Instant;

/// Maximum label length accepted by `POST /nodes`.
const MAX_LABEL_LENGTH: usize = 256;

/// HTTP status for a core error.
fn error_status(error: &LinkStateError) -> StatusCode {
    match error {
        LinkStateError::NodeNotFound(_) | LinkStateError::LinkNotFound(..) => StatusCode::NOT_FOUND,
        LinkStateError::DuplicateLink(..) => StatusCode::CONFLICT,
        LinkStateError::SelfLoop(_)
        | LinkStateError::InvalidWeight(_)
        | LinkStateError::InvalidConfig(_)
        | LinkStateError::TopologyLoad(_) => StatusCode::BAD_REQUEST,
        LinkStateError::NodeIdsExhausted
        | LinkStateError::Export(_)
        | LinkStateError::Config(_)
        | LinkStateError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &LinkStateError) -> Response {
    (error_status(error), Json(ErrorResponse::new(error.to_string()))).into_response()
}

/// Recompute every routing table; returns the elapsed microseconds.
fn timed_recompute(session: &mut Session) -> u64 {
    let started = Instant::now();
    session.recompute();
    let recompute_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    tracing::info!(recompute_us, tables = session.router().len(), "Routes recomputed");
    recompute_us
}

/// Recompute on success, report the error otherwise.
fn finish_mutation(session: &mut Session, result: Result<(), LinkStateError>) -> Response {
    match result {
        Ok(()) => {
            let recompute_us = timed_recompute(session);
            (StatusCode::OK, Json(MutationResponse::success(recompute_us))).into_response()
        }
        Err(e) => {
            tracing::debug!(error = %e, "Mutation rejected");
            (error_status(&e), Json(MutationResponse::error(e.to_string()))).into_response()
        }
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS / TOPOLOGY HANDLERS
// =============================================================================

/// Topology metrics.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;

    let response = StatusResponse {
        metrics: TopologyMetrics::from_graph(session.graph()),
        reachable_pairs: reachable_pairs(session.router()),
        hysteresis_enabled: session.hysteresis_enabled(),
        tracked_links: session.hysteresis().tracked_links(),
    };

    (StatusCode::OK, Json(response))
}

/// All nodes and links.
pub async fn topology_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let graph = session.graph();

    let response = TopologyResponse {
        nodes: graph.nodes().map(NodeJson::from).collect(),
        links: graph
            .links()
            .map(|l| LinkJson {
                u: l.u.0,
                v: l.v.0,
                weight: l.weight,
                orig_weight: l.orig_weight,
                status: l.status,
                manually_jammed: l.manually_jammed,
            })
            .collect(),
    };

    (StatusCode::OK, Json(response))
}

/// Replace the whole topology with the JSON document in the body.
///
/// Filter state is dropped with the old graph. A document that fails to
/// parse leaves the current topology in place.
pub async fn load_topology_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let mut session = state.session.write().await;

    let summary = match session.import(&body) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::debug!(error = %e, "Topology load rejected");
            return error_response(&e);
        }
    };
    let recompute_us = timed_recompute(&mut session);
    tracing::info!(
        nodes = summary.nodes_added,
        links = summary.links_added,
        skipped_links = summary.skipped_links,
        "Topology replaced"
    );

    (
        StatusCode::OK,
        Json(TopologyLoadResponse {
            nodes_added: summary.nodes_added,
            links_added: summary.links_added,
            skipped_links: summary.skipped_links,
            recompute_us,
        }),
    )
        .into_response()
}

// =============================================================================
// NODE HANDLERS
// =============================================================================

/// Add a node.
pub async fn add_node_handler(
    State(state): State<AppState>,
    Json(request): Json<AddNodeRequest>,
) -> Response {
    if request.label.len() > MAX_LABEL_LENGTH {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "Label length {} exceeds maximum {} bytes",
                request.label.len(),
                MAX_LABEL_LENGTH
            ))),
        )
            .into_response();
    }

    let mut session = state.session.write().await;
    let id = match session.add_node(request.label, request.x, request.y) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    tracing::info!(node = %id, "Node added");
    let recompute_us = timed_recompute(&mut session);

    (
        StatusCode::OK,
        Json(AddNodeResponse {
            id: id.0,
            recompute_us,
        }),
    )
        .into_response()
}

/// Remove a node and its links.
pub async fn remove_node_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let mut session = state.session.write().await;
    let result = session.remove_node(NodeId(id));
    if result.is_ok() {
        tracing::info!(node = id, "Node removed");
    }
    finish_mutation(&mut session, result)
}

// =============================================================================
// LINK HANDLERS
// =============================================================================

/// Add a link.
pub async fn add_link_handler(
    State(state): State<AppState>,
    Json(request): Json<AddLinkRequest>,
) -> Response {
    let mut session = state.session.write().await;
    let result = session.add_link(NodeId(request.u), NodeId(request.v), request.weight);
    if result.is_ok() {
        tracing::info!(u = request.u, v = request.v, weight = request.weight, "Link added");
    }
    finish_mutation(&mut session, result)
}

/// Remove a link.
pub async fn remove_link_handler(
    State(state): State<AppState>,
    Path((u, v)): Path<(u64, u64)>,
) -> Response {
    let mut session = state.session.write().await;
    let result = session.remove_link(NodeId(u), NodeId(v));
    if result.is_ok() {
        tracing::info!(u, v, "Link removed");
    }
    finish_mutation(&mut session, result)
}

/// Jam or restore a link.
pub async fn link_status_handler(
    State(state): State<AppState>,
    Json(request): Json<LinkStatusRequest>,
) -> Response {
    let mut session = state.session.write().await;
    let result = session.set_link_status(NodeId(request.u), NodeId(request.v), request.status);
    if result.is_ok() {
        tracing::info!(u = request.u, v = request.v, status = %request.status, "Link status set");
    }
    finish_mutation(&mut session, result)
}

/// Set a link's measured cost.
pub async fn link_weight_handler(
    State(state): State<AppState>,
    Json(request): Json<LinkWeightRequest>,
) -> Response {
    let mut session = state.session.write().await;
    let result = session.set_link_weight(NodeId(request.u), NodeId(request.v), request.weight);
    finish_mutation(&mut session, result)
}

// =============================================================================
// ROUTING HANDLERS
// =============================================================================

/// Recompute every routing table now.
pub async fn recompute_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = state.session.write().await;
    let recompute_us = timed_recompute(&mut session);

    let response = RecomputeResponse {
        tables: session.router().len(),
        reachable_pairs: reachable_pairs(session.router()),
        recompute_us,
    };

    (StatusCode::OK, Json(response))
}

/// Cached routing table of one source.
pub async fn routes_handler(State(state): State<AppState>, Path(source): Path<u64>) -> Response {
    let session = state.session.read().await;

    match session.table(NodeId(source)) {
        Some(table) => (
            StatusCode::OK,
            Json(RouteTableResponse {
                source,
                entries: table.entries.clone(),
            }),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("No routing table for node {}", source))),
        )
            .into_response(),
    }
}

/// Full hop sequence between two nodes. 404 if either node is unknown or
/// the pair is unreachable.
pub async fn path_handler(
    State(state): State<AppState>,
    Path((source, destination)): Path<(u64, u64)>,
) -> Response {
    let session = state.session.read().await;
    let (src, dst) = (NodeId(source), NodeId(destination));

    match session.path(src, dst) {
        Some(path) => {
            let route = session.table(src).and_then(|t| t.entry(dst)).copied();
            (StatusCode::OK, Json(PathResponse::with_path(path, route))).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(PathResponse::not_found())).into_response(),
    }
}

// =============================================================================
// HYSTERESIS HANDLERS
// =============================================================================

fn hysteresis_response(session: &Session) -> HysteresisResponse {
    HysteresisResponse {
        enabled: session.hysteresis_enabled(),
        config: *session.hysteresis().config(),
        tracked_links: session.hysteresis().tracked_links(),
    }
}

/// Current hysteresis settings.
pub async fn get_hysteresis_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    (StatusCode::OK, Json(hysteresis_response(&session)))
}

/// Update hysteresis settings. The merged configuration must validate.
pub async fn put_hysteresis_handler(
    State(state): State<AppState>,
    Json(request): Json<HysteresisUpdateRequest>,
) -> Response {
    let mut session = state.session.write().await;
    let config = request.apply_to(*session.hysteresis().config());

    if let Err(e) = config.validate() {
        return error_response(&e);
    }

    session.set_hysteresis_config(config);
    if let Some(enabled) = request.enabled {
        session.set_hysteresis_enabled(enabled);
    }
    tracing::info!(
        enabled = session.hysteresis_enabled(),
        alpha = config.alpha,
        theta_up = config.theta_up,
        theta_down = config.theta_down,
        hold_ms = config.hold_ms,
        "Hysteresis updated"
    );

    (StatusCode::OK, Json(hysteresis_response(&session))).into_response()
}

/// Filter state of one link.
pub async fn link_hysteresis_handler(
    State(state): State<AppState>,
    Path((u, v)): Path<(u64, u64)>,
) -> Response {
    let session = state.session.read().await;

    match session.hysteresis().state(NodeId(u), NodeId(v)) {
        Some(link_state) => (
            StatusCode::OK,
            Json(LinkStateResponse {
                u,
                v,
                state: *link_state,
            }),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("No filter state for link {}-{}", u, v))),
        )
            .into_response(),
    }
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Route export document, stamped with wall-clock time.
pub async fn export_handler(State(state): State<AppState>) -> Response {
    let session = state.session.read().await;
    let doc = RouteExport::build(session.graph(), session.router(), epoch_ms());
    tracing::debug!(nodes = doc.nodes.len(), links = doc.links.len(), "Route export built");
    (StatusCode::OK, Json(doc)).into_response()
}
