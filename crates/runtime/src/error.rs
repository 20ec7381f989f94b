//! Crate-wide error type unifying the kernel's [`swarm_sim::SimError`] with
//! the platform/session-level failures owned by this crate.

use swarm_sim::SimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// `start` arrived before any `setup` delivered a question.
    #[error("cannot start a round before setup has run")]
    CannotStartRound,

    /// A participant name collides with one already joined to the session.
    #[error("participant {0:?} already joined this session")]
    DuplicateName(String),

    /// The session id referenced by an inbound message is unknown.
    #[error("session {0:?} not found")]
    SessionNotFound(String),

    /// An external HTTP fetch (question/participant list) failed. Carries
    /// the platform implementation's own error message, since this crate
    /// only depends on [`crate::platform::PlatformApi`] as a trait.
    #[error("platform I/O failed: {0}")]
    Io(String),

    /// A bot hook or coroutine resumption panicked. Produced by
    /// [`std::panic::catch_unwind`] around the call site.
    #[error("bot code panicked: {0}")]
    BotPanic(String),

    #[error(transparent)]
    Sim(#[from] SimError),
}
