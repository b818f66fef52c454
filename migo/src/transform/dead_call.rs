use std::collections::HashSet;

use log::debug;

use crate::{Program, Statement};

/// Removes `call` and `spawn` statements whose target is not defined in
/// `prog`, at any depth. A body or branch left empty becomes a single `tau`,
/// and an `if` with only `tau` in both branches becomes `tau`. Returns
/// whether anything changed.
pub fn remove_dead_calls(prog: &mut Program) -> bool {
    let defined: HashSet<String> = prog
        .functions()
        .iter()
        .map(|func| func.name().to_owned())
        .collect();
    let mut modified = false;

    for func in prog.functions_mut() {
        let stmts = func.take_stmts();
        let pruned = prune(stmts, &defined, &mut modified);
        func.set_stmts(pruned);
    }

    modified
}

fn prune(stmts: Vec<Statement>, defined: &HashSet<String>, modified: &mut bool) -> Vec<Statement> {
    let mut pruned: Vec<Statement> = stmts
        .into_iter()
        .filter_map(|stmt| prune_stmt(stmt, defined, modified))
        .collect();

    if pruned.is_empty() {
        *modified = true;
        pruned.push(Statement::Silent);
    }
    pruned
}

fn prune_stmt(stmt: Statement, defined: &HashSet<String>, modified: &mut bool) -> Option<Statement> {
    use Statement::*;
    match stmt {
        Call { ref name, .. } | Spawn { ref name, .. } if !defined.contains(name) => {
            debug!("removing dead call to {}", name);
            *modified = true;
            None
        }
        If { then, else_ } => {
            let then = prune(then, defined, modified);
            let else_ = prune(else_, defined, modified);
            if is_tau(&then) && is_tau(&else_) {
                *modified = true;
                Some(Silent)
            } else {
                Some(If { then, else_ })
            }
        }
        IfFor { cond, then, else_ } => {
            let then = prune(then, defined, modified);
            let else_ = prune(else_, defined, modified);
            if is_tau(&then) && is_tau(&else_) {
                *modified = true;
                Some(Silent)
            } else {
                Some(IfFor { cond, then, else_ })
            }
        }
        Select { cases } => Some(Select {
            cases: cases
                .into_iter()
                .map(|case| prune(case, defined, modified))
                .collect(),
        }),
        stmt @ (Call { .. } | Spawn { .. }) => Some(stmt),
        stmt @ (NewChannel { .. } | Close { .. } | Send { .. } | Receive { .. } | Silent) => {
            Some(stmt)
        }
        stmt @ (NewMemory { .. } | MemoryRead { .. } | MemoryWrite { .. }) => Some(stmt),
        stmt @ (NewMutex { .. } | MutexLock { .. } | MutexUnlock { .. }) => Some(stmt),
        stmt @ (NewRWMutex { .. } | RWMutexReadLock { .. } | RWMutexReadUnlock { .. }) => {
            Some(stmt)
        }
    }
}

fn is_tau(stmts: &[Statement]) -> bool {
    matches!(stmts, [Statement::Silent])
}
