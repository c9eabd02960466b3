//! Execution proxy: the [`ScriptExecutor`] that routes scripts through the relay.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use rusty_sprite_core::config::Config;
use rusty_sprite_core::error::BridgeError;
use rusty_sprite_core::executor::ScriptExecutor;
use rusty_sprite_core::protocol::{PendingScript, ScriptResult};
use rusty_sprite_core::types::RequestContext;

use crate::session::HostSessions;

/// Timing and size limits applied to every submission.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Total wait per script, counted from submission (queueing included).
    pub timeout: Duration,
    /// A host that has not polled for this long is treated as absent.
    pub stale_after: Duration,
    pub max_script_bytes: usize,
    pub default_session: String,
}

impl ProxySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms()),
            stale_after: Duration::from_millis(config.host_stale_after_ms()),
            max_script_bytes: config.max_script_bytes(),
            default_session: config.default_session(),
        }
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct ExecutionProxy {
    sessions: HostSessions,
    settings: ProxySettings,
}

impl ExecutionProxy {
    pub fn new(settings: ProxySettings) -> Self {
        Self {
            sessions: HostSessions::new(),
            settings,
        }
    }

    pub fn sessions(&self) -> &HostSessions {
        &self.sessions
    }

    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    /// The session a request is routed to; blank names mean the default one.
    pub fn resolve_session<'a>(&'a self, requested: &'a str) -> &'a str {
        if requested.trim().is_empty() {
            &self.settings.default_session
        } else {
            requested
        }
    }

    fn validate(&self, script: &str) -> Result<(), BridgeError> {
        if script.trim().is_empty() {
            return Err(BridgeError::InvalidScript("script is empty".into()));
        }
        if script.len() > self.settings.max_script_bytes {
            return Err(BridgeError::InvalidScript(format!(
                "script is {} bytes, the limit is {}",
                script.len(),
                self.settings.max_script_bytes
            )));
        }
        Ok(())
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.settings.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn timed_out(&self, session: &str) -> BridgeError {
        BridgeError::Timeout {
            session: session.to_string(),
            timeout_ms: self.timeout_ms(),
        }
    }

    fn unavailable(&self, session: &str) -> BridgeError {
        BridgeError::SessionUnavailable {
            session: session.to_string(),
        }
    }
}

#[async_trait]
impl ScriptExecutor for ExecutionProxy {
    async fn run_script(
        &self,
        script: &str,
        context: &RequestContext,
    ) -> Result<String, BridgeError> {
        self.validate(script)?;

        let session = self.resolve_session(&context.session);
        let request_id = context.request_id.as_str();
        let deadline = Instant::now() + self.settings.timeout;
        // Only hosts register sessions; an unknown name never gets a slot
        let Some(slot) = self
            .sessions
            .get(session)
            .filter(|slot| slot.is_live(self.settings.stale_after))
        else {
            warn!(session = %session, request_id = %request_id, "No host is polling this session");
            return Err(self.unavailable(session));
        };

        // One script per session at a time; waiting here spends the same budget
        let Ok(_turn) = tokio::time::timeout_at(deadline, slot.turn.lock()).await else {
            warn!(session = %session, request_id = %request_id, "Timed out waiting for an earlier script");
            return Err(self.timed_out(session));
        };
        if !slot.is_live(self.settings.stale_after) {
            warn!(session = %session, request_id = %request_id, "Host went away while the script was queued");
            return Err(self.unavailable(session));
        }

        let mut reply = slot.enqueue(PendingScript {
            id: request_id.to_string(),
            script: script.to_string(),
        });
        debug!(session = %session, request_id = %request_id, bytes = script.len(), "Script queued for host");

        match tokio::time::timeout_at(deadline, &mut reply).await {
            Ok(Ok(outcome)) => {
                if outcome.is_ok() {
                    info!(session = %session, request_id = %request_id, "Script completed");
                }
                outcome.map(ScriptResult::into_text)
            }
            Ok(Err(_)) => Err(BridgeError::Transport(
                "result channel closed before the host answered".into(),
            )),
            Err(_) => {
                slot.withdraw(request_id);
                // The answer may have landed between the deadline and the withdrawal
                if let Ok(outcome) = reply.try_recv() {
                    return outcome.map(ScriptResult::into_text);
                }
                warn!(
                    session = %session,
                    request_id = %request_id,
                    timeout_ms = self.timeout_ms(),
                    "Script timed out"
                );
                Err(self.timed_out(session))
            }
        }
    }
}
