//! In-memory [`Fetcher`] for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bistro_core::Error;
use bytes::Bytes;

use crate::fetch::{Fetcher, Request, Response};

type Reply = (u16, String, String);

/// Answers by exact URL; unknown URLs and offline mode are network errors.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    replies: Mutex<HashMap<String, Option<Reply>>>,
    sequences: Mutex<HashMap<String, VecDeque<Option<Reply>>>>,
    calls: Mutex<Vec<(String, Option<Bytes>)>>,
    offline: AtomicBool,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, content_type: &str, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Some((status, content_type.to_string(), body.to_string())));
    }

    /// Replies consumed one per call before falling back to [`respond`](Self::respond).
    /// `None` is a network error.
    pub fn respond_sequence(&self, url: &str, replies: Vec<Option<Reply>>) {
        self.sequences.lock().unwrap().insert(url.to_string(), replies.into());
    }

    pub fn fail(&self, url: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), None);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(u, _)| u == url).count()
    }

    pub fn posted_bodies(&self, url: &str) -> Vec<Bytes> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .filter_map(|(_, body)| body.clone())
            .collect()
    }

    fn next_reply(&self, url: &str) -> Option<Reply> {
        if let Some(queue) = self.sequences.lock().unwrap().get_mut(url)
            && let Some(reply) = queue.pop_front()
        {
            return reply;
        }
        self.replies.lock().unwrap().get(url).cloned().flatten()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push((url.clone(), request.body.clone()));

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{url}: offline")));
        }

        let (status, content_type, body) =
            self.next_reply(&url).ok_or_else(|| Error::Network(format!("{url}: unreachable")))?;

        Response::from_parts(request.url.clone(), status, &content_type, body)
    }
}
