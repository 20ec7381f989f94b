//! Error types produced by the simulation kernel.

use thiserror::Error;

/// Failures that can originate inside the kernel itself, as opposed to the
/// platform/session-level failures owned by the runtime crate.
#[derive(Debug, Error)]
pub enum SimError {
    /// The two nearest vertices used by [`crate::codec::PositionCodec::encode`]
    /// are collinear with the origin, so the 2x2 system has no solution.
    #[error("cannot encode point: nearest vertices are collinear with the origin")]
    EncodingSingular,
}
