//! `Planned` — one emitted specialization request.

use crate::callsite::Callsite;
use crate::plan::stats::{StatsByType, TypeTuple};
use crate::static_frame::StaticFrameId;

/// Which admission path produced a [`Planned`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedKind {
    /// Emitted because a single argument-type tuple accounted for enough of
    /// a callsite's hits on its own (§4.4, `plan_for_cs`'s per-bucket test).
    ObservedTypes,
    /// Emitted because the callsite's hits, unaccounted for by any single
    /// observed-type bucket, still cleared the frame/callsite threshold on
    /// their own. Carries no type tuple: the candidate this produces must
    /// re-check argument types at entry.
    Certain,
}

/// One (static-frame, callsite, optional type-tuple) specialization request.
///
/// Ownership of the type-tuple and evidence `Vec`s is plain Rust ownership:
/// the admission filter simply drops a rejected `Planned` (and everything it
/// owns) on an early return, with no matching manual free.
#[derive(Debug, Clone)]
pub struct Planned {
    /// Which admission path produced this entry.
    pub kind: PlannedKind,
    /// The static frame this specialization request targets.
    pub sf: StaticFrameId,
    /// The callsite shape, if the calls could be attributed to one.
    pub cs: Option<Callsite>,
    /// The argument type tuple to guard on, for [`PlannedKind::ObservedTypes`].
    /// Always `None` for [`PlannedKind::Certain`].
    pub type_tuple: Option<TypeTuple>,
    /// The type-stat evidence bucket(s) that justified this entry, used by
    /// [`crate::plan::builder::twiddle_stack_depths`] to find invoked callees.
    pub type_stats: Vec<StatsByType>,
    /// Maximum observed call-stack depth, used to order specialization so
    /// that callers are specialized before their callees.
    pub max_depth: u32,
}
