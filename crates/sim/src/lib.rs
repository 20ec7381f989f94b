//! Simulation kernel for swarm bot clients.
//!
//! This crate holds the core that drives one bot through one round: a
//! fixed-timestep game loop, a cooperative coroutine scheduler, a
//! thread-safe shared-position store, the position encoding used on the
//! wire, and the trait a user's bot implements.
//!
//! The crate never touches the network or the filesystem; everything here
//! is driven by an explicit clock and explicit inputs so it can be exercised
//! without any external collaborator.

#![deny(unsafe_code)]

pub mod bot;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod game_loop;
pub mod scheduler;
pub mod state;

pub use bot::Bot;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{polygon_vertices, PositionCodec, Vec2};
pub use config::GameLoopConfig;
pub use error::SimError;
pub use event::Event;
pub use game_loop::{GameLoop, QuitHandle};
pub use scheduler::{next_update, sleep, Coroutine, Scheduler, Step};
pub use state::{ParticipantId, SharedState, StateSnapshot};
