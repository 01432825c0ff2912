//! Per-tick systems run by the simulation loop.
//!
//! - [`gauge`]: charge and cooldown progress, state transitions, ready queue
//! - [`effects`]: status-effect bookkeeping and damage over time
//! - [`end_condition`]: victory check after each update

pub mod effects;
pub mod end_condition;
pub mod gauge;

pub use effects::{apply_effect, clear_action_scoped, remove_effect, tick_effects, DotHit};
pub use end_condition::{check_end, has_lost, EndCheck};
pub use gauge::{
    advance_gauges, begin_charge, begin_cooldown, duration_ticks, mark_broken, sort_ready_queue,
};
