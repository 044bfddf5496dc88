//! `Deoptimizer` — the public entrypoints used when specialized bytecode's
//! assumptions no longer hold.

use std::sync::Arc;

use crate::candidate::Candidate;
use crate::deopt::reconstructor;
use crate::error::DeoptError;
use crate::frame::{FrameAllocator, FrameHandle};
use crate::jit::JitBackend;
use crate::profiler::DeoptProfiler;
use crate::thread_context::ThreadContext;

/// Deoptimization entrypoints, parameterized over the frame allocator, JIT
/// backend and profiler collaborators a host plugs in.
///
/// Holds no mutable state of its own — every thread-local piece of state
/// this needs is threaded through as `&mut ThreadContext`, so one
/// `Deoptimizer` can serve every thread sharing the same collaborators.
#[derive(Debug)]
pub struct Deoptimizer<A, J, P> {
    allocator: A,
    jit: J,
    profiler: P,
}

impl<A, J, P> Deoptimizer<A, J, P>
where
    A: FrameAllocator,
    J: JitBackend,
    P: DeoptProfiler,
{
    /// Build a deoptimizer around the given collaborators.
    pub fn new(allocator: A, jit: J, profiler: P) -> Self {
        Deoptimizer { allocator, jit, profiler }
    }

    /// De-optimizes the currently executing frame, provided it is
    /// specialized and at a valid deopt point. Used when a guard fails.
    pub fn deopt_one(&self, tc: &mut ThreadContext, deopt_target: u32) -> Result<(), DeoptError> {
        let f = tc.cur_frame.clone().ok_or(DeoptError::NotSpecialized)?;
        tracing::debug!(target: "spesh_core::deopt", deopt_target, "deopt one requested by interpreter");
        self.profiler.log_deopt_one();
        f.write().clear_dynlex_cache();

        if f.read().spesh_cand.is_none() {
            return Err(DeoptError::NotSpecialized);
        }
        let deopt_offset = tc.interp_cur_op;
        self.deopt_frame(tc, f, deopt_offset, deopt_target)
    }

    /// De-optimizes the current frame by directly specifying both offsets,
    /// as used by the JIT when it already knows the exact deopt point
    /// without consulting the interpreter's program counter.
    pub fn deopt_one_direct(
        &self,
        tc: &mut ThreadContext,
        deopt_offset: u32,
        deopt_target: u32,
    ) -> Result<(), DeoptError> {
        let f = tc.cur_frame.clone().ok_or(DeoptError::NotSpecialized)?;
        tracing::debug!(target: "spesh_core::deopt", deopt_offset, deopt_target, "deopt one requested by JIT");
        self.profiler.log_deopt_one();
        f.write().clear_dynlex_cache();
        self.deopt_frame(tc, f, deopt_offset, deopt_target)
    }

    fn deopt_frame(
        &self,
        tc: &mut ThreadContext,
        f: FrameHandle,
        deopt_offset: u32,
        deopt_target: u32,
    ) -> Result<(), DeoptError> {
        let cand_id = f.read().spesh_cand.ok_or(DeoptError::NotSpecialized)?;
        let cand = tc.candidates.get(cand_id).ok_or(DeoptError::UnknownCandidate(cand_id))?;

        deopt_named_args_used(&f, &cand);
        materialize_replaced_objects(&cand, deopt_offset)?;

        if cand.inlines.is_some() {
            // Uninlining creates frames on the heap; force the whole call
            // stack to the heap first to preserve the "no heap object may
            // point at a stack frame" invariant.
            let f = self.allocator.force_to_heap(f);
            reconstructor::uninline(tc, &self.allocator, Arc::clone(&f), &cand, deopt_offset, deopt_target, None)?;
            f.write().clear_specialization();
        } else {
            let sf_id = f.read().static_frame;
            let sf = tc.static_frames.get(sf_id).ok_or(DeoptError::UnknownStaticFrame(sf_id))?;
            tc.retarget(Arc::clone(&f), Arc::clone(&sf.bytecode), deopt_target, Some(sf_id));
            f.write().clear_specialization();
        }

        tracing::debug!(target: "spesh_core::deopt", "completed deopt_one");
        Ok(())
    }

    /// De-optimizes every specialized frame on the call stack. Used when a
    /// change invalidates assumptions everywhere at once (e.g. a mix-in).
    ///
    /// The current (top) frame is not itself rewound here — only its
    /// ancestors, since the current frame is handled by `deopt_one` when
    /// needed. Guarantees that any future *return into* an ancestor lands in
    /// generic bytecode.
    pub fn deopt_all(&self, tc: &mut ThreadContext) -> Result<(), DeoptError> {
        let cur = tc.cur_frame.clone().ok_or(DeoptError::NotSpecialized)?;
        tracing::debug!(target: "spesh_core::deopt", "deopt all requested");
        self.profiler.log_deopt_all();

        let mut l = self.allocator.force_to_heap(cur);
        let mut next = l.read().caller.clone();

        while let Some(f) = next {
            f.write().clear_dynlex_cache();
            let spesh_cand = f.read().spesh_cand;

            if let Some(cand_id) = spesh_cand {
                let cand = tc.candidates.get(cand_id).ok_or(DeoptError::UnknownCandidate(cand_id))?;

                if let Some(point) = find_inactive_frame_deopt_point(&self.jit, &cand, &f) {
                    if cand.inlines.is_some() {
                        reconstructor::uninline(
                            tc,
                            &self.allocator,
                            Arc::clone(&f),
                            &cand,
                            point.specialized_offset,
                            point.generic_offset,
                            Some(Arc::clone(&l)),
                        )?;
                    } else {
                        f.write().return_address = Some(point.generic_offset);
                    }

                    deopt_named_args_used(&f, &cand);
                    let has_jit = cand.jit_code.is_some();
                    f.write().clear_specialization();
                    if has_jit {
                        f.write().jit_entry_label = None;
                        // Known wart, preserved for bug-compatibility: stop
                        // walking ancestors once a JIT-bearing frame has
                        // been cleared. Suspected to hide further deopt
                        // work beyond this point in the call chain.
                        tracing::debug!(target: "spesh_core::deopt", "stopping deopt_all at JIT-bearing ancestor");
                        break;
                    }
                }
            }

            l = Arc::clone(&f);
            next = f.read().caller.clone();
        }

        tracing::debug!(target: "spesh_core::deopt", "deopt all completed");
        Ok(())
    }
}

fn deopt_named_args_used(f: &FrameHandle, cand: &Candidate) {
    if let Some(bits) = cand.deopt_named_used_bit_field {
        f.write().named_used.bit_field = bits;
    }
}

fn materialize_replaced_objects(cand: &Candidate, deopt_offset: u32) -> Result<(), DeoptError> {
    if cand.deopt_pea_points.iter().any(|p| p.deopt_point_offset == deopt_offset) {
        return Err(DeoptError::PeaMaterializationNotImplemented);
    }
    Ok(())
}

/// Finds the currently active deopt point for a frame that is *not* the one
/// currently running on the call stack but sits in specialized code on the
/// caller chain.
fn find_inactive_frame_deopt_point<J: JitBackend>(
    jit: &J,
    cand: &Candidate,
    f: &FrameHandle,
) -> Option<crate::deopt_table::DeoptPoint> {
    if let Some(jit_code) = &cand.jit_code {
        let idx = jit.get_active_deopt_idx(jit_code, f)?;
        if idx < jit_code.num_deopts {
            cand.deopts.get(idx)
        } else {
            None
        }
    } else {
        let ret_offset = f.read().return_address?;
        let idx = cand.deopts.index_of_specialized_offset(ret_offset)?;
        cand.deopts.get(idx)
    }
}
