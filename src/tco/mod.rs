//! Tail-call optimization for decorated Serval functions.
//!
//! Functions decorated with `@tco` are rewritten at definition time: every
//! `return name(args)` statement becomes a control-transfer node instead of
//! a call, and the function's name is added to a registry. The interpreter's
//! trampoline loop consumes those transfers iteratively, so chains of tail
//! calls between registered functions use constant call depth. Calls whose
//! target is not registered fall back to ordinary (depth-counted) calls.

pub mod registry;
pub mod transform;

pub use registry::Registry;
pub use transform::{transform, TrampolinedFunction, TransformError, TransformWarning};
