//! Executors for tool tests.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use rusty_sprite_core::error::BridgeError;
use rusty_sprite_core::executor::ScriptExecutor;
use rusty_sprite_core::protocol::ScriptResult;
use rusty_sprite_core::types::RequestContext;
use rusty_sprite_scripts::host_stub::HostStub;

use crate::ToolContext;

/// Records every script and answers with a fixed outcome.
pub struct RecordingExecutor {
    pub scripts: Mutex<Vec<String>>,
    outcome: Result<String, BridgeError>,
}

impl RecordingExecutor {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(Vec::new()),
            outcome: Ok(text.to_string()),
        })
    }

    pub fn failing(error: BridgeError) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(Vec::new()),
            outcome: Err(error),
        })
    }

    pub fn calls(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }
}

#[async_trait]
impl ScriptExecutor for RecordingExecutor {
    async fn run_script(
        &self,
        script: &str,
        _context: &RequestContext,
    ) -> Result<String, BridgeError> {
        self.scripts.lock().unwrap().push(script.to_string());
        self.outcome.clone()
    }
}

type Job = (String, oneshot::Sender<ScriptResult>);

/// Evaluates scripts on a [`HostStub`] owned by a dedicated thread.
pub struct StubExecutor {
    jobs: Mutex<mpsc::Sender<Job>>,
}

impl StubExecutor {
    pub fn with_sprite(width: u32, height: u32) -> Arc<Self> {
        Self::spawn(Some((width, height)))
    }

    pub fn without_sprite() -> Arc<Self> {
        Self::spawn(None)
    }

    fn spawn(sprite: Option<(u32, u32)>) -> Arc<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        std::thread::spawn(move || {
            let mut host = match sprite {
                Some((w, h)) => HostStub::with_sprite(w, h),
                None => HostStub::new(),
            };
            for (script, reply) in rx {
                let evaluation = host.eval(&script);
                let _ = reply.send(ScriptResult {
                    id: String::new(),
                    output: evaluation.output,
                    error: evaluation.error,
                });
            }
        });
        Arc::new(Self {
            jobs: Mutex::new(tx),
        })
    }
}

#[async_trait]
impl ScriptExecutor for StubExecutor {
    async fn run_script(
        &self,
        script: &str,
        _context: &RequestContext,
    ) -> Result<String, BridgeError> {
        let (reply, rx) = oneshot::channel();
        self.jobs
            .lock()
            .unwrap()
            .send((script.to_string(), reply))
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        rx.await
            .map(ScriptResult::into_text)
            .map_err(|e| BridgeError::Transport(e.to_string()))
    }
}

pub fn context(executor: Arc<dyn ScriptExecutor>) -> ToolContext {
    ToolContext {
        request: RequestContext::new("default"),
        executor,
    }
}
