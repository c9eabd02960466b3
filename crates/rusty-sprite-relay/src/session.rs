//! Per-session host state held by the relay.
//!
//! A slot holds at most one script: `pending` until the host picks it up,
//! `in_flight` until the host posts its result (or the submitter gives up).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::{Notify, oneshot};
use tokio::time::Instant;
use tracing::debug;

use rusty_sprite_core::error::BridgeError;
use rusty_sprite_core::protocol::{HostSessionStatus, PendingScript, ScriptResult};

/// Longest a single poll may hold the connection open.
pub const MAX_POLL_WAIT: Duration = Duration::from_secs(25);

/// How long a session with no host and no work stays in the table.
pub const IDLE_SESSION_RETENTION: Duration = Duration::from_secs(600);

pub(crate) type ReplyReceiver = oneshot::Receiver<Result<ScriptResult, BridgeError>>;
type ReplySender = oneshot::Sender<Result<ScriptResult, BridgeError>>;

/// Outcome of handing a host result to its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    /// Nothing with this id is awaiting a result (late, duplicate or unknown).
    Unexpected { id: String },
}

pub struct SessionSlot {
    /// Held by a submitter for the whole round trip.
    pub(crate) turn: tokio::sync::Mutex<()>,
    state: Mutex<SlotState>,
    queued: Notify,
}

#[derive(Default)]
struct SlotState {
    pending: Option<PendingScript>,
    in_flight: Option<InFlight>,
    last_seen: Option<Instant>,
    waiting_polls: usize,
}

struct InFlight {
    id: String,
    reply: ReplySender,
}

impl SlotState {
    fn touch(&mut self) {
        self.last_seen = Some(Instant::now());
    }
}

impl Default for SessionSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSlot {
    pub fn new() -> Self {
        Self {
            turn: tokio::sync::Mutex::new(()),
            state: Mutex::new(SlotState::default()),
            queued: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a host is attached to this session: one is parked in a long
    /// poll right now, one is evaluating a script it picked up, or the last
    /// poll finished less than `stale_after` ago.
    pub fn is_live(&self, stale_after: Duration) -> bool {
        let state = self.state();
        // A host stops polling while it evaluates
        let evaluating = state.in_flight.is_some() && state.pending.is_none();
        state.waiting_polls > 0
            || evaluating
            || state
                .last_seen
                .is_some_and(|seen| seen.elapsed() < stale_after)
    }

    /// No host attached, no work held, and nothing heard for `idle_for`.
    fn is_idle_for(&self, idle_for: Duration) -> bool {
        let state = self.state();
        state.waiting_polls == 0
            && state.in_flight.is_none()
            && state.pending.is_none()
            && state.last_seen.is_none_or(|seen| seen.elapsed() >= idle_for)
    }

    /// Whether a script is queued or awaiting its result.
    pub fn is_busy(&self) -> bool {
        self.state().in_flight.is_some()
    }

    /// Queue a script and return the receiver its result will arrive on.
    pub(crate) fn enqueue(&self, script: PendingScript) -> ReplyReceiver {
        let (reply, rx) = oneshot::channel();
        {
            let mut state = self.state();
            state.in_flight = Some(InFlight {
                id: script.id.clone(),
                reply,
            });
            state.pending = Some(script);
        }
        self.queued.notify_waiters();
        rx
    }

    /// Drop everything held for `id`. A result posted for it afterwards is
    /// answered as unexpected.
    pub(crate) fn withdraw(&self, id: &str) {
        let mut state = self.state();
        if state.pending.as_ref().is_some_and(|p| p.id == id) {
            state.pending = None;
        }
        if state.in_flight.as_ref().is_some_and(|f| f.id == id) {
            state.in_flight = None;
        }
    }

    fn take_pending(&self) -> Option<PendingScript> {
        let mut state = self.state();
        state.touch();
        state.pending.take()
    }

    /// Host poll. Returns the queued script, waiting up to `wait` (capped at
    /// [`MAX_POLL_WAIT`]) for one to arrive. Every poll is a heartbeat.
    pub async fn poll(&self, wait: Duration) -> Option<PendingScript> {
        if let Some(script) = self.take_pending() {
            return Some(script);
        }
        if wait.is_zero() {
            return None;
        }

        let notified = self.queued.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        // A script queued between the first check and `enable` would be missed otherwise
        if let Some(script) = self.take_pending() {
            return Some(script);
        }

        let _parked = ParkedPoll::new(self);
        let _ = tokio::time::timeout(wait.min(MAX_POLL_WAIT), notified).await;
        self.take_pending()
    }

    /// Hand a host result to the submitter waiting on it.
    pub fn deliver(&self, result: ScriptResult) -> Delivery {
        let mut state = self.state();
        state.touch();
        match state.in_flight.take() {
            Some(flight) if flight.id == result.id => {
                if state.pending.as_ref().is_some_and(|p| p.id == result.id) {
                    state.pending = None;
                }
                // The submitter may have just timed out; nothing left to tell
                let _ = flight.reply.send(Ok(result));
                Delivery::Accepted
            }
            other => {
                state.in_flight = other;
                Delivery::Unexpected { id: result.id }
            }
        }
    }

    /// Fail whatever is in flight with `error`. Returns the failed request id.
    pub fn fail_in_flight(&self, error: BridgeError) -> Option<String> {
        let mut state = self.state();
        state.touch();
        let flight = state.in_flight.take()?;
        state.pending = None;
        let _ = flight.reply.send(Err(error));
        Some(flight.id)
    }

    pub fn status(&self, session: &str, stale_after: Duration) -> HostSessionStatus {
        let last_poll_ms_ago = self
            .state()
            .last_seen
            .map(|seen| u64::try_from(seen.elapsed().as_millis()).unwrap_or(u64::MAX));
        HostSessionStatus {
            session: session.to_string(),
            connected: self.is_live(stale_after),
            last_poll_ms_ago,
            busy: self.is_busy(),
        }
    }
}

/// Counts a long poll as live for as long as it is parked, including when
/// the client hangs up and the handler future is dropped.
struct ParkedPoll<'a> {
    slot: &'a SessionSlot,
}

impl<'a> ParkedPoll<'a> {
    fn new(slot: &'a SessionSlot) -> Self {
        slot.state().waiting_polls += 1;
        Self { slot }
    }
}

impl Drop for ParkedPoll<'_> {
    fn drop(&mut self) {
        let mut state = self.slot.state();
        state.waiting_polls = state.waiting_polls.saturating_sub(1);
        state.touch();
    }
}

/// All host sessions the relay has seen. A slot is created when a host
/// first polls and dropped by [`HostSessions::prune_idle`].
#[derive(Default)]
pub struct HostSessions {
    slots: RwLock<HashMap<String, Arc<SessionSlot>>>,
}

impl HostSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `session` if a host has ever polled it.
    pub fn get(&self, session: &str) -> Option<Arc<SessionSlot>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session)
            .cloned()
    }

    /// The slot for `session`, created if missing. Only host polls call this.
    pub fn slot(&self, session: &str) -> Arc<SessionSlot> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session)
        {
            return slot.clone();
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(session.to_string())
            .or_insert_with(|| {
                debug!(session = %session, "Host session created");
                Arc::new(SessionSlot::new())
            })
            .clone()
    }

    /// Drop sessions nobody has touched for `idle_for`. Slots still held
    /// elsewhere are kept.
    pub fn prune_idle(&self, idle_for: Duration) -> usize {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|session, slot| {
            let idle = Arc::strong_count(slot) == 1 && slot.is_idle_for(idle_for);
            if idle {
                debug!(session = %session, "Idle host session dropped");
            }
            !idle
        });
        before - slots.len()
    }

    /// Status of every known session, sorted by name.
    pub fn statuses(&self, stale_after: Duration) -> Vec<HostSessionStatus> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut statuses: Vec<_> = slots
            .iter()
            .map(|(name, slot)| slot.status(name, stale_after))
            .collect();
        statuses.sort_by(|a, b| a.session.cmp(&b.session));
        statuses
    }
}
