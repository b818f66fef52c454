use log::debug;
use utils::{BitVector, Worklist};

use crate::Program;
use crate::analysis::{ControlFlowGraph, NodeId};

/// Removes functions nobody calls, starting from the functions without a
/// caller and cascading to callees left without one. `entry` is never
/// removed. Functions on a cycle with no caller from outside the cycle are
/// kept. Returns whether anything was removed.
pub fn remove_unused(prog: &mut Program, entry: &str) -> bool {
    let mut cfg = ControlFlowGraph::new(prog);
    let mut removed = BitVector::new(prog.len());

    let mut worklist: Worklist<NodeId> = Worklist::new();
    worklist.extend(
        cfg.nodes()
            .filter(|node| cfg.predecessors[node.0].is_empty()),
    );

    while let Some(node) = worklist.pop() {
        let func = cfg.func_index(node);
        if prog.functions()[func].name() == entry {
            continue;
        }

        for succ in cfg.successors[node.0].clone() {
            let preds = &mut cfg.predecessors[succ.0];
            preds.retain(|&pred| pred != node);
            if preds.is_empty() {
                worklist.push(succ);
            }
        }

        debug!("removing unused function {}", prog.functions()[func].name());
        removed.set(func);
    }

    let modified = removed.any();
    prog.remove_functions(&removed);
    modified
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Function, parse};

    fn names(prog: &Program) -> Vec<&str> {
        prog.functions().iter().map(Function::name).collect()
    }

    #[test]
    fn cascades_from_uncalled_functions() {
        let mut prog = parse(
            "
def main.main(): call a();
def a(): send x;
def orphan(): call b(); spawn c();
def b(): call c();
def c(): recv x;
",
        )
        .unwrap();

        assert!(remove_unused(&mut prog, "main.main"));
        assert_eq!(names(&prog), vec!["main.main", "a"]);
    }

    #[test]
    fn shared_callee_is_kept() {
        let mut prog = parse(
            "
def main.main(): call c();
def orphan(): call c();
def c(): send x;
",
        )
        .unwrap();

        remove_unused(&mut prog, "main.main");
        assert_eq!(names(&prog), vec!["main.main", "c"]);
    }

    #[test]
    fn unreachable_cycle_is_retained() {
        let mut prog = parse(
            "
def main.main(): send x;
def f(): call g();
def g(): call f();
",
        )
        .unwrap();

        assert!(!remove_unused(&mut prog, "main.main"));
        assert_eq!(names(&prog), vec!["main.main", "f", "g"]);
    }

    #[test]
    fn cycle_outlives_its_removed_caller() {
        let mut prog = parse(
            "
def main.main(): send x;
def start(): call f();
def f(): call g();
def g(): call f();
",
        )
        .unwrap();

        remove_unused(&mut prog, "main.main");
        // g still calls f.
        assert_eq!(names(&prog), vec!["main.main", "f", "g"]);
    }

    #[test]
    fn entry_is_never_removed() {
        let mut prog = parse("def main.main(): tau; def helper(): tau;").unwrap();

        remove_unused(&mut prog, "main.main");
        assert_eq!(names(&prog), vec!["main.main"]);
    }
}
