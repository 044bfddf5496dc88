//! Planner: turns profile statistics into an ordered specialization plan.

pub mod builder;
pub mod gc_integration;
pub mod planned;
pub mod stats;

pub use builder::{Plan, PlanBuilder};
pub use planned::{Planned, PlannedKind};
