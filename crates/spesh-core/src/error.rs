//! Error types for the speculative-specialization core.
//!
//! Mirrors `raya_engine::vm::VmError`'s shape: a flat `thiserror` enum of
//! unit and tuple variants, one per distinct failure kind, propagated with
//! `?` rather than panicked on. Fatal invariant violations (a logic bug in
//! the caller) are still represented as ordinary `Err` values here — it is
//! the host VM's job to decide whether such an error is fatal, matching the
//! out-of-scope note that "choosing when to invoke the planner" (and, by
//! extension, how to react to its failures) belongs outside this crate.

use crate::frame::ReturnType;
use crate::static_frame::StaticFrameId;

/// Errors raised by [`crate::deopt::Deoptimizer`] and [`crate::deopt::FrameReconstructor`].
#[derive(Debug, thiserror::Error)]
pub enum DeoptError {
    /// `deopt_one` was called on a frame with no active specialization.
    ///
    /// This indicates a logic bug in the caller: the guard-failure path is
    /// only supposed to run while `cur_frame` is executing specialized code.
    #[error("deopt_one requested on frame with no spesh_cand")]
    NotSpecialized,

    /// An inline descriptor, or the frame's own static frame, named a
    /// [`StaticFrameId`] that is not present in the thread's
    /// [`crate::thread_context::StaticFrameRegistry`]. Not part of the
    /// original's error taxonomy — a consequence of this port modeling
    /// static frame lookup as an explicit registry instead of a direct
    /// pointer dereference.
    #[error("unknown static frame {0:?}")]
    UnknownStaticFrame(StaticFrameId),

    /// A frame's `spesh_cand` named a [`crate::candidate::CandidateId`] not
    /// present in the thread's
    /// [`crate::thread_context::CandidateRegistry`]. Same registry-lookup
    /// rationale as [`DeoptError::UnknownStaticFrame`].
    #[error("unknown candidate {0:?}")]
    UnknownCandidate(crate::candidate::CandidateId),

    /// An inline descriptor's code-object register did not hold a code
    /// object at deopt time.
    #[error("deopt: did not find code object when uninlining")]
    MissingInlineCodeObject,

    /// A deopt point carried partial-escape-analysis records, but object
    /// materialization is not implemented in this port (nor was it in the
    /// original it was distilled from).
    #[error("deopt: materialize_object not implemented")]
    PeaMaterializationNotImplemented,

    /// A `return_value` register could not be translated into the callee
    /// frame's own register file (would land out of bounds).
    #[error("deopt: return register {register} out of bounds for return type {return_type:?}")]
    ReturnRegisterOutOfBounds {
        /// The offending register index.
        register: u16,
        /// The return type that was being translated.
        return_type: ReturnType,
    },
}

/// Errors raised by [`crate::plan::PlanBuilder`].
///
/// Admission rejection (§7: bytecode too large, or an arg-guard already
/// exists) is a silent, non-error outcome in the original and remains one
/// here — `add_planned` simply drops the candidate. This enum exists for
/// genuine construction errors, kept separate from `DeoptError` since the
/// two subsystems fail for unrelated reasons, the way the teacher's engine
/// keeps `VmError` and `CodegenError` apart rather than merging them.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The statistics snapshot handed to `plan()` referenced a callsite
    /// whose flag count did not match its observed type tuple length.
    #[error("callsite flag count {expected} does not match type tuple length {actual}")]
    TypeTupleLengthMismatch {
        /// Flag count declared by the callsite.
        expected: usize,
        /// Length of the type tuple actually observed.
        actual: usize,
    },
}
