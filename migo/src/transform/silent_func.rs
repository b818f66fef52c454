//! Removal of τ functions, functions that are not observable.
//!
//! A function is locally τ when its body holds nothing but `tau`, calls and
//! spawns, looking through the branches of conditionals. Being observable
//! then flows backwards along the call graph: a caller of an observable
//! function is observable too. What is left marked τ once this settles is
//! offered to a caller-supplied policy that decides what is removed.

use log::{debug, trace};
use utils::BitVector;

use crate::analysis::ControlFlowGraph;
use crate::{Function, Program, Statement};

/// Finds the τ functions of `prog` and removes those for which `remove`
/// returns true. Returns the names of the removed functions in declaration
/// order.
pub fn find_silent_functions<F>(prog: &mut Program, mut remove: F) -> Vec<String>
where
    F: FnMut(&Function) -> bool,
{
    let cfg = ControlFlowGraph::new(prog);
    let silent = classify(prog, &cfg);

    let mut removed = BitVector::new(prog.len());
    for (i, func) in prog.functions().iter().enumerate() {
        let Some(node) = cfg.node_of(i) else {
            continue;
        };
        if silent.test(node.0) && remove(func) {
            debug!("removing τ function {}", func.name());
            removed.set(i);
        }
    }

    let names = removed
        .iter()
        .map(|i| prog.functions()[i].name().to_owned())
        .collect();
    prog.remove_functions(&removed);
    names
}

/// Removal policy that removes every τ function.
pub fn remove_all(_func: &Function) -> bool {
    true
}

/// Removal policy that removes every τ function except the one named `keep`.
pub fn remove_except(keep: &str) -> impl Fn(&Function) -> bool + '_ {
    move |func: &Function| func.name() != keep
}

/// Silent bit per CFG node.
fn classify(prog: &Program, cfg: &ControlFlowGraph) -> BitVector {
    let mut silent = BitVector::new(cfg.len());
    for node in cfg.nodes() {
        if is_silent(cfg.function(node, prog).stmts()) {
            silent.set(node.0);
        }
    }

    let mut round = 0;
    loop {
        let mut changed = false;
        for node in cfg.nodes() {
            if silent.test(node.0) {
                continue;
            }
            for pred in &cfg.predecessors[node.0] {
                if silent.test(pred.0) {
                    silent.reset(pred.0);
                    changed = true;
                }
            }
        }

        round += 1;
        trace!("τ propagation round {}: {} silent", round, silent.count());
        if !changed {
            break;
        }
    }

    silent
}

fn is_silent(stmts: &[Statement]) -> bool {
    use Statement::*;
    stmts.iter().all(|stmt| match stmt {
        Silent | Call { .. } | Spawn { .. } => true,
        If { then, else_ } | IfFor { then, else_, .. } => is_silent(then) && is_silent(else_),
        Select { .. } => false,
        NewChannel { .. } | Close { .. } | Send { .. } | Receive { .. } => false,
        NewMemory { .. } | MemoryRead { .. } | MemoryWrite { .. } => false,
        NewMutex { .. } | MutexLock { .. } | MutexUnlock { .. } => false,
        NewRWMutex { .. } | RWMutexReadLock { .. } | RWMutexReadUnlock { .. } => false,
    })
}
