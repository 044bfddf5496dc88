//! `InlineTable` — read-only per-candidate inline-region descriptors.

use crate::frame::ReturnType;
use crate::static_frame::StaticFrameId;

/// One region of specialized bytecode that corresponds to an inlined
/// callee.
///
/// Ranges are half-open on the low side and closed on the high side: a
/// specialized offset `o` is inside a descriptor `d` iff
/// `d.start < o && o <= d.end`. Multiple descriptors may cover the same
/// offset at different nesting levels — that's how multi-level inlining is
/// represented. [`InlineTable`] preserves the stored order (outer scopes
/// before scopes nested inside them); reconstruction depends on that order
/// and must never re-sort it.
#[derive(Debug, Clone)]
pub struct InlineDescriptor {
    /// Low end of the specialized-offset range (exclusive).
    pub start: u32,
    /// High end of the specialized-offset range (inclusive).
    pub end: u32,
    /// The callee's static frame.
    pub sf: StaticFrameId,
    /// Register in the *outer* frame's `work` array holding the invoked
    /// code object, used to validate the callee at uninline time.
    pub code_ref_reg: u16,
    /// Offset of `sf`'s local register window inside the outer frame's
    /// `work` array.
    pub locals_start: u16,
    /// Offset of `sf`'s lexical register window inside the outer frame's
    /// `env` array.
    pub lexicals_start: u16,
    /// Register (relative to the new uninlined frame's own `work`) that
    /// holds this inline's result.
    pub res_reg: u16,
    /// Type of this inline's result.
    pub res_type: ReturnType,
    /// Deopt index, in the *outer candidate's* deopt table, naming where in
    /// the caller's generic bytecode this inlined call must return to.
    pub return_deopt_idx: u32,
    /// Named-argument-used bits to install on the uninlined frame, if this
    /// inline's argument handling had progressed past some named args when
    /// deopt happened.
    pub deopt_named_used_bit_field: Option<u64>,
}

impl InlineDescriptor {
    /// Whether specialized-bytecode offset `offset` falls inside this
    /// inline region (`start < offset <= end`).
    pub fn contains(&self, offset: u32) -> bool {
        self.start < offset && offset <= self.end
    }
}

/// Read-only, ordered list of inline descriptors for one candidate.
#[derive(Debug, Clone, Default)]
pub struct InlineTable {
    descriptors: Vec<InlineDescriptor>,
}

impl InlineTable {
    /// Build a table from descriptors in outer-to-inner stored order.
    pub fn new(descriptors: Vec<InlineDescriptor>) -> Self {
        InlineTable { descriptors }
    }

    /// Iterate descriptors in stored order (outer scopes first).
    pub fn iter(&self) -> impl Iterator<Item = &InlineDescriptor> {
        self.descriptors.iter()
    }

    /// Whether this candidate has no inlines at all.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(start: u32, end: u32) -> InlineDescriptor {
        InlineDescriptor {
            start,
            end,
            sf: StaticFrameId(1),
            code_ref_reg: 0,
            locals_start: 0,
            lexicals_start: 0,
            res_reg: 0,
            res_type: ReturnType::Void,
            return_deopt_idx: 0,
            deopt_named_used_bit_field: None,
        }
    }

    #[test]
    fn range_is_half_open_low_closed_high() {
        let d = descriptor(100, 200);
        assert!(!d.contains(100));
        assert!(d.contains(101));
        assert!(d.contains(200));
        assert!(!d.contains(201));
    }

    #[test]
    fn table_preserves_stored_order() {
        let outer = descriptor(100, 200);
        let inner = descriptor(110, 150);
        let table = InlineTable::new(vec![outer.clone(), inner.clone()]);
        let collected: Vec<_> = table.iter().map(|d| (d.start, d.end)).collect();
        assert_eq!(collected, vec![(outer.start, outer.end), (inner.start, inner.end)]);
    }
}
