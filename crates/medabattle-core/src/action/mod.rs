//! The action pipeline.
//!
//! An action goes through three stages:
//!
//! 1. **Charge**: [`start_charge`] validates a player choice or AI decision,
//!    records the intent and target, and starts the charge gauge.
//! 2. **Execute**: once the robot is ready and at the front of the queue,
//!    [`ActionPipeline::dispatch_next`] routes it to the [`ActionHandler`]
//!    registered for the part's trait. The handler produces an
//!    [`ActionResult`].
//! 3. **Apply**: the pipeline updates AI memory, applies status effects
//!    carried by the result, starts the cooldown and clears action-scoped
//!    effects.
//!
//! Handlers never touch the queue or the gauges; scheduling stays in the
//! pipeline.

mod attack;
mod charge;
mod handler;
mod intervention;
mod pipeline;
mod result;

pub use attack::AttackHandler;
pub use charge::{requires_target, start_charge, ChargeRequest};
pub use handler::{ActionContext, ActionHandler, HandlerRegistry};
pub use intervention::{ObstructHandler, SupportHandler};
pub use pipeline::{ActionPipeline, Dispatched};
pub use result::{ActionResult, AppliedEffect};
