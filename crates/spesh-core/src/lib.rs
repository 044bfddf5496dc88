//! Speculative-specialization core for a bytecode-interpreting virtual machine.
//!
//! This crate owns the two hardest subsystems of the VM's optimizing tier:
//!
//! - [`plan`]: turns noisy runtime profile statistics into a stable,
//!   prioritized list of (static-frame, callsite, argument-type-tuple)
//!   triples worth specializing.
//! - [`deopt`]: unwinds in-flight specialized — and possibly inlined —
//!   execution back to generic bytecode when a speculative guard fails or a
//!   global invariant is invalidated.
//!
//! The bytecode interpreter loop, the JIT code generator, the garbage
//! collector's mark/sweep algorithm, and the profiler's sampling machinery
//! are not implemented here; this crate only defines the narrow contracts
//! ([`jit`], [`gc`], [`profiler`]) it needs from them.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod callsite;
pub mod candidate;
pub mod config;
pub mod deopt;
pub mod deopt_table;
pub mod error;
pub mod frame;
pub mod gc;
pub mod inline_table;
pub mod jit;
pub mod plan;
pub mod profiler;
pub mod static_frame;
pub mod thread_context;

pub use config::PlanThresholds;
pub use deopt::Deoptimizer;
pub use error::{DeoptError, PlanError};
pub use plan::{Plan, PlanBuilder, Planned, PlannedKind};
pub use thread_context::ThreadContext;
