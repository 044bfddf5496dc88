//! Callsite shape — opaque collaborator.
//!
//! A `Callsite` describes the arity and argument-flag layout of one call
//! expression; it is produced and owned by the compiler, not this crate.
//! Only the handful of fields the planner and its GC integration read are
//! modeled here.

/// Per-argument flag bits, one entry per callsite position.
pub type ArgFlags = u8;

/// Set when an argument position carries an object reference (as opposed to
/// an unboxed int/num/str). The planner's GC integration only needs to walk
/// `OBJ`-flagged positions of a type tuple.
pub const ARG_FLAG_OBJ: ArgFlags = 0b0000_0001;

/// Shape of one callsite: how many arguments, and which ones are objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Callsite {
    /// Per-argument flag bytes, one per argument position.
    pub arg_flags: Vec<ArgFlags>,
}

impl Callsite {
    /// Create a callsite with the given per-argument flags.
    pub fn new(arg_flags: Vec<ArgFlags>) -> Self {
        Callsite { arg_flags }
    }

    /// Number of argument positions.
    pub fn flag_count(&self) -> usize {
        self.arg_flags.len()
    }

    /// Whether argument position `i` carries an object reference.
    pub fn is_obj_arg(&self, i: usize) -> bool {
        self.arg_flags
            .get(i)
            .is_some_and(|f| f & ARG_FLAG_OBJ != 0)
    }
}
