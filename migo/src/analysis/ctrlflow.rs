use std::collections::HashMap;
use std::fmt;

use log::trace;
use utils::DisplayResolved;

use crate::{Function, Program, Statement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Call graph of a program. Nodes are functions, an edge `a → b` means `a`
/// calls or spawns `b`. Nodes are numbered in discovery order, and each
/// ordered pair of nodes has at most one edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFlowGraph {
    pub predecessors: Vec<Vec<NodeId>>,
    pub successors: Vec<Vec<NodeId>>,
    funcs: Vec<usize>,
    node_of: Vec<Option<NodeId>>,
}

impl ControlFlowGraph {
    pub fn new(prog: &Program) -> Self {
        let mut builder = Builder::new(prog);
        for func in 0..prog.len() {
            builder.visit(func);
        }
        trace!("call graph has {} nodes", builder.cfg.len());
        builder.cfg
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.funcs.len()).map(NodeId)
    }

    /// Position in the program of the function behind `node`.
    pub fn func_index(&self, node: NodeId) -> usize {
        self.funcs[node.0]
    }

    /// Node of the function at position `func` in the program.
    pub fn node_of(&self, func: usize) -> Option<NodeId> {
        self.node_of.get(func).copied().flatten()
    }

    pub fn function<'p>(&self, node: NodeId, prog: &'p Program) -> &'p Function {
        &prog.functions()[self.func_index(node)]
    }

    fn add_node(&mut self, func: usize) -> NodeId {
        let node = NodeId(self.funcs.len());
        self.funcs.push(func);
        self.node_of[func] = Some(node);
        self.predecessors.push(Vec::new());
        self.successors.push(Vec::new());
        node
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        if !self.successors[from.0].contains(&to) {
            self.successors[from.0].push(to);
        }
        if !self.predecessors[to.0].contains(&from) {
            self.predecessors[to.0].push(from);
        }
    }
}

impl DisplayResolved<Program> for ControlFlowGraph {
    fn fmt_with(&self, f: &mut fmt::Formatter, prog: &Program) -> fmt::Result {
        let names = |nodes: &[NodeId]| {
            nodes
                .iter()
                .map(|&node| self.function(node, prog).simple_name())
                .collect::<Vec<_>>()
                .join(", ")
        };

        for node in self.nodes() {
            writeln!(f, "{}:", self.function(node, prog).simple_name())?;
            let preds = &self.predecessors[node.0];
            if !preds.is_empty() {
                writeln!(f, "\tFROM → {}", names(preds))?;
            }
            let succs = &self.successors[node.0];
            if !succs.is_empty() {
                writeln!(f, "\tTO   ⇒ {}", names(succs))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    NotStarted,
    InProgress,
    Done,
}

struct Builder<'p> {
    prog: &'p Program,
    index: HashMap<&'p str, usize>,
    state: Vec<VisitState>,
    cfg: ControlFlowGraph,
}

impl<'p> Builder<'p> {
    fn new(prog: &'p Program) -> Self {
        let num_funcs = prog.len();
        Self {
            prog,
            index: prog
                .functions()
                .iter()
                .enumerate()
                .map(|(i, func)| (func.name(), i))
                .collect(),
            state: vec![VisitState::NotStarted; num_funcs],
            cfg: ControlFlowGraph {
                predecessors: Vec::with_capacity(num_funcs),
                successors: Vec::with_capacity(num_funcs),
                funcs: Vec::with_capacity(num_funcs),
                node_of: vec![None; num_funcs],
            },
        }
    }

    fn visit(&mut self, func: usize) {
        if self.state[func] != VisitState::NotStarted {
            return;
        }
        self.state[func] = VisitState::InProgress;

        let node = self.cfg.add_node(func);
        let prog = self.prog;
        self.visit_stmts(node, prog.functions()[func].stmts());

        self.state[func] = VisitState::Done;
    }

    fn visit_stmts(&mut self, parent: NodeId, stmts: &'p [Statement]) {
        use Statement::*;
        for stmt in stmts {
            match stmt {
                Call { name, .. } | Spawn { name, .. } => self.visit_callee(parent, name),
                If { then, else_ } | IfFor { then, else_, .. } => {
                    self.visit_stmts(parent, then);
                    self.visit_stmts(parent, else_);
                }
                Select { cases } => {
                    for case in cases {
                        self.visit_stmts(parent, case);
                    }
                }
                NewChannel { .. } | Close { .. } | Send { .. } | Receive { .. } | Silent => {}
                NewMemory { .. } | MemoryRead { .. } | MemoryWrite { .. } => {}
                NewMutex { .. } | MutexLock { .. } | MutexUnlock { .. } => {}
                NewRWMutex { .. } | RWMutexReadLock { .. } | RWMutexReadUnlock { .. } => {}
            }
        }
    }

    fn visit_callee(&mut self, parent: NodeId, name: &str) {
        let Some(&callee) = self.index.get(name) else {
            return;
        };
        self.visit(callee);
        if let Some(target) = self.cfg.node_of(callee) {
            self.cfg.add_edge(parent, target);
        }
    }
}
