mod dead_call;
mod silent_func;
mod unused;

use log::debug;

use crate::Program;

pub use crate::transform::dead_call::remove_dead_calls;
pub use crate::transform::silent_func::{find_silent_functions, remove_all, remove_except};
pub use crate::transform::unused::remove_unused;

/// Name of the function a program starts from.
pub const ENTRY_FUNCTION: &str = "main.main";

/// Shrinks `prog` to a smaller program with the same observable behaviour:
/// τ functions go first (the entry function is kept), then functions that
/// are no longer called, then calls to functions that no longer exist.
pub fn simplify_program(prog: &mut Program) {
    let has_entry = prog.function(ENTRY_FUNCTION).is_some();

    let silent = if has_entry {
        find_silent_functions(prog, remove_except(ENTRY_FUNCTION))
    } else {
        find_silent_functions(prog, remove_all)
    };
    debug!("removed {} τ functions", silent.len());

    if has_entry {
        remove_unused(prog, ENTRY_FUNCTION);
    }
    remove_dead_calls(prog);
}
