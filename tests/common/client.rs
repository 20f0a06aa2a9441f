//! Scripted pointage client
//!
//! Replies from a queue of canned responses, then repeats the fallback.

use async_trait::async_trait;
use parking_lot::Mutex;
use pointage_sync::core::downstream::{DownstreamError, PointageClient};
use pointage_sync::core::sync::{PointageResult, StandardPointage, TerrainPointage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

type Reply = Result<Vec<PointageResult>, DownstreamError>;

#[derive(Debug)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: AtomicUsize,
    privileges: Mutex<Vec<Vec<String>>>,
}

impl ScriptedClient {
    /// Always answer `reply`
    pub fn always(reply: Reply) -> Self {
        Self::scripted(vec![], reply)
    }

    /// Answer `script` in order, then `fallback`
    pub fn scripted(script: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            privileges: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Privileges received by terrain calls, in order
    pub fn privileges_seen(&self) -> Vec<Vec<String>> {
        self.privileges.lock().clone()
    }

    fn next_reply(&self) -> Reply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl PointageClient for ScriptedClient {
    async fn submit_standard(&self, _email: &str, _records: &[StandardPointage]) -> Reply {
        self.next_reply()
    }

    async fn submit_terrain(
        &self,
        _email: &str,
        _records: &[TerrainPointage],
        privileges: &[String],
    ) -> Reply {
        self.privileges.lock().push(privileges.to_vec());
        self.next_reply()
    }
}
