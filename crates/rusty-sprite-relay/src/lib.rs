//! Execution proxy and HTTP relay.
//!
//! The host application (LibreSprite with the script from [`bridge_script`]
//! loaded) cannot accept connections, so it polls this relay for work and
//! posts back what each script printed. Tool calls submit scripts through [`ExecutionProxy`],
//! which waits for the matching result under a per-session lock.

pub mod bridge;
pub mod proxy;
pub mod server;
pub mod session;

pub use bridge::bridge_script;
pub use proxy::{ExecutionProxy, ProxySettings};
pub use server::{relay_router, serve_relay};
pub use session::{Delivery, HostSessions, IDLE_SESSION_RETENTION, MAX_POLL_WAIT, SessionSlot};
