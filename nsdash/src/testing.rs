//! Test doubles for the remote API
//!
//! [`MockTransport`] answers from a route table keyed by `"METHOD path"`
//! (see [`ApiRequest::route`]) and records every request it receives.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{ApiRequest, Transport};
use crate::error::{AppResult, TransportError};

#[derive(Debug, Clone)]
struct Reply {
    result: AppResult<Value>,
    delay: Duration,
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<String, VecDeque<Reply>>,
    requests: Vec<ApiRequest>,
}

/// Canned-response transport. Clones share routes and the request log.
///
/// Replies queued for a route are consumed in order; the last one keeps
/// answering. Unknown routes fail with a 404.
///
/// ```ignore
/// let transport = MockTransport::new();
/// transport.reply("GET stats/species", Ok(json!({ "message": [] })));
/// transport.reply_after(
///     "POST auth/login",
///     Duration::from_millis(50),
///     Ok(json!({ "access_token": "t" })),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an immediate reply for `route`.
    pub fn reply(&self, route: &str, result: AppResult<Value>) -> &Self {
        self.reply_after(route, Duration::ZERO, result)
    }

    /// Queue a reply for `route` delivered after `delay` of (tokio) time.
    pub fn reply_after(&self, route: &str, delay: Duration, result: AppResult<Value>) -> &Self {
        self.lock()
            .routes
            .entry(route.to_string())
            .or_default()
            .push_back(Reply { result, delay });
        self
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    /// How many requests hit `route`
    pub fn request_count(&self, route: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.route() == route)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_reply(&self, request: ApiRequest) -> Reply {
        let route = request.route();
        let mut state = self.lock();
        state.requests.push(request);

        let queued = match state.routes.get_mut(&route) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        queued.unwrap_or_else(|| Reply {
            result: Err(
                TransportError::new(Some(404), format!("no mock route for {route}")).into(),
            ),
            delay: Duration::ZERO,
        })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> AppResult<Value> {
        let reply = self.next_reply(request);
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result
    }
}
