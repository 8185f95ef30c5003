//! Fleet motion simulation.
//!
//! - `movement`: per-unit kinematic state and the frame tick
//! - `speed_policy`: initial speed tiers and starting segment selection
//! - `position`: interpolation of a unit's drawn position along its route

mod movement;
mod position;
mod speed_policy;


pub use movement::{Millis, MovementState, MovementStore, Sighting};
pub use position::resolve_position;
pub use speed_policy::{FixedSpeedPolicy, SpeedPolicy, SplitMix64, TieredSpeedPolicy};
