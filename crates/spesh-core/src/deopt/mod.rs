//! Deoptimization: backing specialized bytecode out to generic bytecode
//! when one of its assumptions is invalidated.

mod deoptimizer;
mod reconstructor;

pub use deoptimizer::Deoptimizer;
pub use reconstructor::uninline;
