//! Streamable HTTP transport for MCP.
//!
//! - `POST /mcp`: one JSON-RPC message; plain JSON response, or an SSE
//!   stream for `tools/call` when the client accepts `text/event-stream`
//! - `GET /mcp`: the session's standalone notification stream
//! - `DELETE /mcp`: terminate the session

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    extract::State,
    routing::get,
    Json, Router,
};
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use super::state::{GuardedMcpState, ServerState};
use crate::mcp::handler::{parse_message, Rejection};
use crate::mcp::notifier::Notifier;
use crate::mcp::protocol::{methods, McpNotification};
use crate::mcp::session::SessionError;

pub const SESSION_HEADER: &str = "mcp-session-id";
const EVENT_STREAM: &str = "text/event-stream";

// Gate labels for requests that carry no JSON-RPC method
const OPEN_STREAM: &str = "stream/open";
const TERMINATE_SESSION: &str = "session/terminate";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains(EVENT_STREAM))
        .unwrap_or(false)
}

fn rejection_status(rejection: &Rejection) -> StatusCode {
    match rejection {
        Rejection::Unauthorized => StatusCode::UNAUTHORIZED,
        Rejection::MissingSession => StatusCode::BAD_REQUEST,
        Rejection::UnknownSession(_) => StatusCode::NOT_FOUND,
        Rejection::SubjectMismatch(_) => StatusCode::FORBIDDEN,
    }
}

fn reject(rejection: Rejection) -> Response {
    (rejection_status(&rejection), Json(rejection.response())).into_response()
}

fn with_session_header(mut response: Response, session_id: &str) -> Response {
    match HeaderValue::from_str(session_id) {
        Ok(value) => {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
        Err(e) => warn!("Could not encode session id {}: {}", session_id, e),
    }
    response
}

fn sse_event<T: Serialize>(value: &T) -> Event {
    match serde_json::to_string(value) {
        Ok(json) => Event::default().event("message").data(json),
        Err(e) => {
            warn!("Failed to encode SSE event: {}", e);
            Event::default().comment("encoding failure")
        }
    }
}

fn notification_events(
    rx: mpsc::Receiver<McpNotification>,
) -> impl Stream<Item = Event> + Send + 'static {
    ReceiverStream::new(rx).map(|notification| sse_event(&notification))
}

fn event_stream<S>(events: S) -> Response
where
    S: Stream<Item = Event> + Send + 'static,
{
    Sse::new(events.map(Ok::<_, Infallible>))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response()
}

async fn post_mcp(State(mcp): State<GuardedMcpState>, headers: HeaderMap, body: String) -> Response {
    let request = match parse_message(&body) {
        Ok(request) => request,
        Err(response) => return (StatusCode::BAD_REQUEST, Json(response)).into_response(),
    };

    let admitted = match mcp.admit(
        &request.method,
        header(&headers, AUTHORIZATION.as_str()),
        header(&headers, SESSION_HEADER),
    ) {
        Ok(admitted) => admitted,
        Err(rejection) => return reject(rejection),
    };
    let session_id = admitted.session_id;

    if request.method == methods::TOOLS_CALL
        && !request.is_notification()
        && accepts_event_stream(&headers)
    {
        let (notifier, rx) = Notifier::channel();
        let (done_tx, done_rx) = oneshot::channel();

        let call_session = session_id.clone();
        tokio::spawn(async move {
            let response = mcp.dispatch(request, &call_session, notifier).await;
            if done_tx.send(response).is_err() {
                debug!("Client left before tools/call on {} finished", call_session);
            }
        });

        // Progress first, then the final response once the call is done
        let final_response = stream::once(done_rx).filter_map(|result| async move {
            match result {
                Ok(Some(response)) => Some(sse_event(&response)),
                _ => None,
            }
        });
        let events = notification_events(rx).chain(final_response);
        return with_session_header(event_stream(events), &session_id);
    }

    let notifier = mcp.sessions.stream_notifier(&session_id);
    let response = match mcp.dispatch(request, &session_id, notifier).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };
    with_session_header(response, &session_id)
}

async fn get_mcp(State(mcp): State<GuardedMcpState>, headers: HeaderMap) -> Response {
    let admitted = match mcp.admit(
        OPEN_STREAM,
        header(&headers, AUTHORIZATION.as_str()),
        header(&headers, SESSION_HEADER),
    ) {
        Ok(admitted) => admitted,
        Err(rejection) => return reject(rejection),
    };

    match mcp.sessions.attach_stream(&admitted.session_id) {
        Ok(rx) => {
            debug!("Notification stream opened for session {}", admitted.session_id);
            with_session_header(event_stream(notification_events(rx)), &admitted.session_id)
        }
        Err(SessionError::NotFound(id)) | Err(SessionError::SubjectMismatch { session_id: id, .. }) => {
            reject(Rejection::UnknownSession(id))
        }
    }
}

async fn delete_mcp(State(mcp): State<GuardedMcpState>, headers: HeaderMap) -> Response {
    let admitted = match mcp.admit(
        TERMINATE_SESSION,
        header(&headers, AUTHORIZATION.as_str()),
        header(&headers, SESSION_HEADER),
    ) {
        Ok(admitted) => admitted,
        Err(rejection) => return reject(rejection),
    };

    mcp.sessions.terminate(&admitted.session_id);
    StatusCode::OK.into_response()
}

pub fn make_mcp_routes(state: ServerState) -> Router {
    Router::new()
        .route("/mcp", get(get_mcp).post(post_mcp).delete(delete_mcp))
        .with_state(state)
}
