//! In-memory transport for tests: records every request, replays canned responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

type Reply = Result<HttpResponse, String>;

pub(crate) struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
}

impl RecordingTransport {
    /// Answer every request with `response`.
    pub(crate) fn respond(response: HttpResponse) -> Arc<Self> {
        Self::script(Vec::new(), Ok(response))
    }

    /// Fail every request at the network level.
    pub(crate) fn unreachable() -> Arc<Self> {
        Self::script(Vec::new(), Err("connection refused".into()))
    }

    /// Answer with `replies` in order, then with `fallback` forever.
    pub(crate) fn script(replies: Vec<Reply>, fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into()),
            fallback,
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        reply.map_err(TransportError::Other)
    }

    fn name(&self) -> &str {
        "recording"
    }
}
