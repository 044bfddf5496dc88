//! JIT backend contract (§6).
//!
//! This crate only needs one thing from the JIT: given a frame currently
//! executing JIT-compiled code, what deopt index is active at its current
//! point of execution? Code generation itself lives in the JIT backend.

use crate::frame::FrameHandle;

/// Opaque handle to JIT-compiled code for one candidate.
#[derive(Debug, Clone)]
pub struct JitCodeHandle {
    /// Number of deopt entries the JIT backend tracks for this code,
    /// mirrors `jitcode->num_deopts` — used to validate an index returned
    /// by [`JitBackend::get_active_deopt_idx`].
    pub num_deopts: u32,
}

/// Contract this crate needs from the JIT code generation backend.
pub trait JitBackend {
    /// Resolve the deopt index active for `frame`'s current point of
    /// execution inside `jit_code`. Returns `None` if no active deopt
    /// index could be resolved (e.g. the frame is between safepoints).
    fn get_active_deopt_idx(&self, jit_code: &JitCodeHandle, frame: &FrameHandle) -> Option<u32>;
}

/// A backend that never resolves a deopt index — useful for hosts that
/// haven't wired up a real JIT yet, or for testing the interpreter-only
/// deopt paths in isolation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJitBackend;

impl JitBackend for NoJitBackend {
    fn get_active_deopt_idx(&self, _jit_code: &JitCodeHandle, _frame: &FrameHandle) -> Option<u32> {
        None
    }
}
