//! Uninlining: splitting specialized inline frames back into separate
//! generic frames.

use std::sync::Arc;

use crate::candidate::Candidate;
use crate::error::DeoptError;
use crate::frame::{FrameAllocator, FrameHandle, Register, ReturnType};
use crate::thread_context::ThreadContext;

/// Reconstructs deopt'd-out frames for every inline level `outer` was
/// executing through, at specialized-bytecode position `offset`.
///
/// If deopt hits inside a frame containing inlines, and the point of
/// execution is within an inlined region, we have to undo the inlining by
/// switching every level of inlined frame out for a chain of frames running
/// the deopt'd-to code. We may instead be in the non-inlined part of the
/// candidate, in which case there's nothing to reconstruct.
///
/// `callee` distinguishes the two call sites: `None` means `outer` is the
/// currently executing frame (`deopt_one`/`deopt_one_direct`), so the
/// interpreter itself gets retargeted onto the outermost reconstructed
/// frame; `Some` means `outer` is an inactive ancestor being walked by
/// `deopt_all`, so `callee`'s `caller` link is rewired instead.
///
/// The inline table is iterated exactly once, in stored order — it must
/// never be sorted or re-bucketed, since "first match" is what determines
/// which reconstructed frame becomes active.
pub fn uninline<A: FrameAllocator>(
    tc: &mut ThreadContext,
    allocator: &A,
    outer: FrameHandle,
    candidate: &Candidate,
    offset: u32,
    deopt_offset: u32,
    callee: Option<FrameHandle>,
) -> Result<(), DeoptError> {
    let inlines = match candidate.inlines.as_ref() {
        Some(t) if !t.is_empty() => t,
        _ => return finish_unmatched(tc, outer, deopt_offset, callee),
    };

    let mut last_uninlined: Option<FrameHandle> = None;
    let mut last_res_reg: u16 = 0;
    let mut last_res_type: ReturnType = ReturnType::Void;
    let mut last_return_deopt_idx: u32 = 0;

    for desc in inlines.iter() {
        if !desc.contains(offset) {
            continue;
        }

        let code_ref = {
            let outer_guard = outer.read();
            outer_guard.work.get(desc.code_ref_reg as usize).copied().unwrap_or_default()
        };
        if code_ref == Register::default() {
            return Err(DeoptError::MissingInlineCodeObject);
        }

        let usf = tc.static_frames.get(desc.sf).ok_or(DeoptError::UnknownStaticFrame(desc.sf))?;
        let uf = allocator.create_for_deopt(desc.sf, candidate);

        {
            let outer_guard = outer.read();
            let mut uf_guard = uf.write();

            let locals_start = desc.locals_start as usize;
            let num_locals = usf.num_locals as usize;
            if num_locals > 0 {
                uf_guard.work[..num_locals]
                    .copy_from_slice(&outer_guard.work[locals_start..locals_start + num_locals]);
            }

            let lexicals_start = desc.lexicals_start as usize;
            let num_lexicals = usf.num_lexicals as usize;
            if num_lexicals > 0 {
                uf_guard.env[..num_lexicals]
                    .copy_from_slice(&outer_guard.env[lexicals_start..lexicals_start + num_lexicals]);
            }

            if let Some(bits) = desc.deopt_named_used_bit_field {
                uf_guard.named_used.bit_field = bits;
            }
        }

        if let Some(prev) = &last_uninlined {
            // Not the first match: chain onto the previously reconstructed
            // (shallower) frame using what we recorded about it.
            let mut uf_guard = uf.write();
            uf_guard.clear_specialization();
            uf_guard.return_address = candidate.deopts.generic_offset(last_return_deopt_idx);
            uf_guard.return_type = last_res_type;
            uf_guard.return_value = match last_res_type {
                ReturnType::Void => None,
                _ => Some(last_res_reg),
            };
            drop(uf_guard);
            prev.write().caller = Some(Arc::clone(&uf));
        } else if let Some(callee_frame) = &callee {
            // First match, inactive-ancestor path: rewire the callee onto us
            // and carry over the return info `outer` was already holding.
            callee_frame.write().caller = Some(Arc::clone(&uf));

            let outer_guard = outer.read();
            let outer_return_type = outer_guard.return_type;
            let outer_return_value = outer_guard.return_value;
            drop(outer_guard);

            let mut uf_guard = uf.write();
            uf_guard.return_address = Some(deopt_offset);
            uf_guard.return_type = outer_return_type;
            uf_guard.return_value = match outer_return_type {
                ReturnType::Void => None,
                _ => {
                    let orig_reg = outer_return_value.ok_or(DeoptError::ReturnRegisterOutOfBounds {
                        register: 0,
                        return_type: outer_return_type,
                    })?;
                    let translated = orig_reg.checked_sub(desc.locals_start).ok_or(
                        DeoptError::ReturnRegisterOutOfBounds { register: orig_reg, return_type: outer_return_type },
                    )?;
                    Some(translated)
                }
            };
        } else {
            // First match, active-frame path: this is where the
            // interpreter resumes.
            tc.retarget(Arc::clone(&uf), Arc::clone(&usf.bytecode), deopt_offset, Some(usf.id));
            tc.current_frame_nr += 1;
        }

        last_uninlined = Some(Arc::clone(&uf));
        last_res_reg = desc.res_reg;
        last_res_type = desc.res_type;
        last_return_deopt_idx = desc.return_deopt_idx;
    }

    if let Some(last) = last_uninlined {
        let mut outer_guard = outer.write();
        outer_guard.return_address = candidate.deopts.generic_offset(last_return_deopt_idx);
        outer_guard.return_type = last_res_type;
        outer_guard.return_value = match last_res_type {
            ReturnType::Void => None,
            _ => Some(last_res_reg),
        };
        drop(outer_guard);
        last.write().caller = Some(Arc::clone(&outer));
        Ok(())
    } else {
        finish_unmatched(tc, outer, deopt_offset, callee)
    }
}

/// No inline descriptor matched `offset` (or the candidate has no inlines
/// at all): nothing to reconstruct, just move the resume point to generic
/// code.
fn finish_unmatched(
    tc: &mut ThreadContext,
    outer: FrameHandle,
    deopt_offset: u32,
    callee: Option<FrameHandle>,
) -> Result<(), DeoptError> {
    if callee.is_some() {
        outer.write().return_address = Some(deopt_offset);
    } else {
        let sf_id = outer.read().static_frame;
        let sf = tc.static_frames.get(sf_id).ok_or(DeoptError::UnknownStaticFrame(sf_id))?;
        tc.retarget(Arc::clone(&outer), Arc::clone(&sf.bytecode), deopt_offset, Some(sf_id));
    }
    Ok(())
}
