//! Runtime: ties the simulation kernel ([`swarm_sim`]) to an external
//! message bus.
//!
//! Owns the Loop Lifecycle Manager (one background thread running a
//! sequence of Game Loops, one per round), the Platform Adapter (control/
//! update message dispatch against a small [`PlatformApi`] trait), the
//! round-scoped domain types it assembles, and the composition helpers
//! ([`AgentContext`]/[`RoundAgent`]) that give a user's [`swarm_sim::Bot`]
//! access to the scheduler and shared position state without those being
//! trait methods.
//!
//! The crate never touches a socket or makes an HTTP call itself; `PlatformApi`
//! is the seam where an external collaborator plugs in the real transport.

#![deny(unsafe_code)]

pub mod agent;
pub mod config;
pub mod data;
pub mod error;
pub mod manager;
pub mod platform;

pub use agent::{AgentContext, RoundAgent};
pub use config::PlatformConfig;
pub use data::{Participant, Question, Round};
pub use error::RuntimeError;
pub use manager::LifecycleManager;
pub use platform::{PlatformAdapter, PlatformApi};

pub use swarm_replay as replay;
pub use swarm_wire as wire;
