//! Scripted transport for exercising the cache without a network.

use crate::transport::Transport;
use async_trait::async_trait;
use httpcache_core::{Error, Request, Response};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued results in order and records every request it receives.
pub struct StubTransport {
    replies: Mutex<VecDeque<Result<Response, Error>>>,
    seen: Mutex<Vec<Request>>,
}

impl StubTransport {
    pub fn new(replies: impl IntoIterator<Item = Result<Response, Error>>) -> Self {
        Self { replies: Mutex::new(replies.into_iter().collect()), seen: Mutex::new(Vec::new()) }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, request: &Request) -> Result<Response, Error> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Transport(format!("no scripted reply for {}", request.url))))
    }
}
