//! MiGo: a small process notation describing the concurrency behaviour of a
//! program (channels, goroutine spawns, select, shared memory and locks).
//!
//! The crate parses the textual notation into a [`Program`], builds a call
//! graph over its functions and shrinks it with a handful of passes, see
//! [`transform::simplify_program`].

pub mod analysis;
pub mod error;
pub mod parser;
pub mod transform;

use std::borrow::Cow;
use std::fmt;
use std::mem;

use utils::BitVector;

pub use crate::error::{LookupError, ParseError, Position};
pub use crate::parser::{ParseOptions, parse, parse_with};

/// Strips characters the notation cannot carry from a qualified name.
pub fn simple_name(name: &str) -> Cow<'_, str> {
    if !name.contains(['(', ')', '*', '"', '-', '/']) {
        return Cow::Borrowed(name);
    }
    Cow::Owned(
        name.chars()
            .filter_map(|c| match c {
                '(' | ')' | '*' | '"' | '-' => None,
                '/' => Some('_'),
                c => Some(c),
            })
            .collect(),
    )
}

/// Maps an argument at a call site (`caller`) to the formal parameter of the
/// called function (`callee`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub caller: String,
    pub callee: String,
}

impl Parameter {
    pub fn new(caller: impl Into<String>, callee: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
            callee: callee.into(),
        }
    }

    /// A parameter whose name is the same on both sides of the call.
    pub fn plain(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            caller: name.clone(),
            callee: name,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} → {}]", self.caller, self.callee)
    }
}

fn caller_params(params: &[Parameter]) -> String {
    params
        .iter()
        .map(|param| param.caller.as_str())
        .collect::<Vec<&str>>()
        .join(", ")
}

fn callee_params(params: &[Parameter]) -> String {
    params
        .iter()
        .map(|param| param.callee.as_str())
        .collect::<Vec<&str>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    NewChannel {
        name: String,
        label: String,
        capacity: i64,
    },
    Close {
        chan: String,
    },
    Send {
        chan: String,
    },
    Receive {
        chan: String,
    },
    /// τ, the inaction.
    Silent,
    Call {
        name: String,
        params: Vec<Parameter>,
    },
    Spawn {
        name: String,
        params: Vec<Parameter>,
    },
    If {
        then: Vec<Statement>,
        else_: Vec<Statement>,
    },
    /// Conditional introduced by a loop, `cond` is the loop condition.
    IfFor {
        cond: String,
        then: Vec<Statement>,
        else_: Vec<Statement>,
    },
    /// Each case starts with its guarding action.
    Select {
        cases: Vec<Vec<Statement>>,
    },
    NewMemory {
        name: String,
    },
    MemoryRead {
        name: String,
    },
    MemoryWrite {
        name: String,
    },
    NewMutex {
        name: String,
    },
    MutexLock {
        name: String,
    },
    MutexUnlock {
        name: String,
    },
    NewRWMutex {
        name: String,
    },
    RWMutexReadLock {
        name: String,
    },
    RWMutexReadUnlock {
        name: String,
    },
}

impl Statement {
    /// Whether this statement is visible to an observer when appended to a
    /// function body. A call or spawn counts when it passes parameters, since
    /// the arguments are then shared with the callee.
    pub fn has_comm(&self) -> bool {
        use Statement::*;
        match self {
            Silent => false,
            Call { params, .. } | Spawn { params, .. } => !params.is_empty(),
            If { then, else_ } | IfFor { then, else_, .. } => {
                has_comm(then) || has_comm(else_)
            }
            NewChannel { .. } | Close { .. } | Send { .. } | Receive { .. } | Select { .. } => true,
            NewMemory { .. } | MemoryRead { .. } | MemoryWrite { .. } => true,
            NewMutex { .. } | MutexLock { .. } | MutexUnlock { .. } => true,
            NewRWMutex { .. } | RWMutexReadLock { .. } | RWMutexReadUnlock { .. } => true,
        }
    }
}

fn has_comm(stmts: &[Statement]) -> bool {
    stmts.iter().any(Statement::has_comm)
}

fn write_branches(f: &mut fmt::Formatter<'_>, then: &[Statement], else_: &[Statement]) -> fmt::Result {
    for stmt in then {
        write!(f, "{}; ", stmt)?;
    }
    write!(f, "else ")?;
    for stmt in else_ {
        write!(f, "{}; ", stmt)?;
    }
    write!(f, "endif")
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Statement::*;
        match self {
            NewChannel {
                name,
                label,
                capacity,
            } => write!(f, "let {} = newchan {}, {}", name, simple_name(label), capacity),
            Close { chan } => write!(f, "close {}", chan),
            Send { chan } => write!(f, "send {}", chan),
            Receive { chan } => write!(f, "recv {}", chan),
            Silent => write!(f, "tau"),
            Call { name, params } => {
                write!(f, "call {}({})", simple_name(name), caller_params(params))
            }
            Spawn { name, params } => {
                write!(f, "spawn {}({})", simple_name(name), caller_params(params))
            }
            If { then, else_ } => {
                write!(f, "if ")?;
                write_branches(f, then, else_)
            }
            IfFor { cond, then, else_ } => {
                write!(f, "ifFor (int {}) then ", cond)?;
                write_branches(f, then, else_)
            }
            Select { cases } => {
                write!(f, "select")?;
                for case in cases {
                    write!(f, "\n      case")?;
                    for stmt in case {
                        write!(f, " {};", stmt)?;
                    }
                }
                write!(f, "\n    endselect")
            }
            NewMemory { name } => write!(f, "letmem {}", name),
            MemoryRead { name } => write!(f, "read {}", simple_name(name)),
            MemoryWrite { name } => write!(f, "write {}", simple_name(name)),
            NewMutex { name } => write!(f, "letsync {} mutex", name),
            MutexLock { name } => write!(f, "lock {}", simple_name(name)),
            MutexUnlock { name } => write!(f, "unlock {}", simple_name(name)),
            NewRWMutex { name } => write!(f, "letsync {} rwmutex", name),
            RWMutexReadLock { name } => write!(f, "rlock {}", simple_name(name)),
            RWMutexReadUnlock { name } => write!(f, "runlock {}", simple_name(name)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    name: String,
    params: Vec<Parameter>,
    stmts: Vec<Statement>,
    has_comm: bool,
    stack: Vec<Vec<Statement>>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            stmts: Vec::new(),
            has_comm: false,
            stack: Vec::new(),
        }
    }

    /// Builds a function from an already complete body, statements are kept
    /// exactly as given.
    pub fn with_body(
        name: impl Into<String>,
        params: Vec<Parameter>,
        stmts: Vec<Statement>,
    ) -> Self {
        let mut func = Self::new(name);
        func.add_params(params);
        func.set_stmts(stmts);
        func
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn simple_name(&self) -> Cow<'_, str> {
        simple_name(&self.name)
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn stmts(&self) -> &[Statement] {
        &self.stmts
    }

    /// Whether the function's own body communicates. Calls are not followed.
    pub fn has_comm(&self) -> bool {
        self.has_comm
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Adds parameters, skipping any whose callee name is already taken.
    pub fn add_params(&mut self, params: impl IntoIterator<Item = Parameter>) {
        for param in params {
            if !self.params.iter().any(|p| p.callee == param.callee) {
                self.params.push(param);
            }
        }
    }

    pub fn param_by_callee(&self, callee: &str) -> Result<&Parameter, LookupError> {
        self.params
            .iter()
            .find(|param| param.callee == callee)
            .ok_or_else(|| LookupError::ParameterNotFound {
                function: self.name.clone(),
                callee: callee.to_owned(),
            })
    }

    /// Appends statements to the body. A τ directly following a trailing τ is
    /// absorbed.
    pub fn add_stmts(&mut self, stmts: impl IntoIterator<Item = Statement>) {
        for stmt in stmts {
            if stmt == Statement::Silent && self.stmts.last() == Some(&Statement::Silent) {
                continue;
            }
            self.has_comm |= stmt.has_comm();
            self.stmts.push(stmt);
        }
    }

    /// Saves the current body and starts an empty one, for building the
    /// branches of a nested conditional.
    pub fn put_away(&mut self) {
        self.stack.push(mem::take(&mut self.stmts));
        self.has_comm = false;
    }

    /// Reinstates the body saved by the matching [`Function::put_away`] and
    /// returns the statements added since.
    pub fn restore(&mut self) -> Result<Vec<Statement>, LookupError> {
        let saved = self
            .stack
            .pop()
            .ok_or_else(|| LookupError::EmptyStatementStack {
                function: self.name.clone(),
            })?;
        let branch = mem::replace(&mut self.stmts, saved);
        self.has_comm = has_comm(&self.stmts);
        Ok(branch)
    }

    pub(crate) fn take_stmts(&mut self) -> Vec<Statement> {
        mem::take(&mut self.stmts)
    }

    pub(crate) fn set_stmts(&mut self, stmts: Vec<Statement>) {
        self.has_comm = has_comm(&stmts);
        self.stmts = stmts;
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "def {}({}):", self.simple_name(), callee_params(&self.params))?;
        if self.stmts.is_empty() {
            return writeln!(f, "    {};", Statement::Silent);
        }
        for stmt in &self.stmts {
            writeln!(f, "    {};", stmt)?;
        }
        Ok(())
    }
}

/// Function definitions, unique by name, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    functions: Vec<Function>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `func` unless a function with the same name exists. Returns
    /// whether it was added.
    pub fn add_function(&mut self, func: Function) -> bool {
        if self.position(&func.name).is_some() {
            return false;
        }
        self.functions.push(func);
        true
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|func| func.name == name)
    }

    pub fn function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|func| func.name == name)
    }

    /// Index of the function called `name` in declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.functions.iter().position(|func| func.name == name)
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub(crate) fn functions_mut(&mut self) -> impl Iterator<Item = &mut Function> {
        self.functions.iter_mut()
    }

    /// Drops every function whose index is set in `removed`.
    pub(crate) fn remove_functions(&mut self, removed: &BitVector) {
        let mut index = 0;
        self.functions.retain(|_| {
            let keep = !removed.test(index);
            index += 1;
            keep
        });
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for func in &self.functions {
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn call(name: &str, params: Vec<Parameter>) -> Statement {
        Statement::Call {
            name: name.to_owned(),
            params,
        }
    }

    fn send(chan: &str) -> Statement {
        Statement::Send {
            chan: chan.to_owned(),
        }
    }

    #[test]
    fn renders_authored_program() {
        let mut prog = Program::new();
        let mut f = Function::new("F");
        f.add_stmts([send("x"), call("G", vec![])]);
        let mut g = Function::new("G");
        g.add_params([]);
        g.add_stmts([Statement::Silent]);
        prog.add_function(f);
        prog.add_function(g);

        assert_eq!(
            prog.to_string(),
            "def F():\n    send x;\n    call G();\ndef G():\n    tau;\n"
        );
    }

    #[test]
    fn empty_function_renders_as_tau() {
        let func = Function::new("work");
        assert!(func.is_empty());
        assert_eq!(func.to_string(), "def work():\n    tau;\n");
        assert!(func.is_empty());
    }

    #[test]
    fn renders_every_statement_kind() {
        let cases = [
            (
                Statement::NewChannel {
                    name: "ch".to_owned(),
                    label: "main.t0/x".to_owned(),
                    capacity: 3,
                },
                "let ch = newchan main.t0_x, 3",
            ),
            (Statement::Close { chan: "ch".to_owned() }, "close ch"),
            (Statement::Receive { chan: "ch".to_owned() }, "recv ch"),
            (
                Statement::Spawn {
                    name: "(pkg/x).f".to_owned(),
                    params: vec![Parameter::new("a", "b")],
                },
                "spawn pkg_x.f(a)",
            ),
            (
                Statement::If {
                    then: vec![send("a"), Statement::Silent],
                    else_: vec![Statement::Silent],
                },
                "if send a; tau; else tau; endif",
            ),
            (
                Statement::IfFor {
                    cond: "t1".to_owned(),
                    then: vec![send("a")],
                    else_: vec![Statement::Silent],
                },
                "ifFor (int t1) then send a; else tau; endif",
            ),
            (
                Statement::Select {
                    cases: vec![
                        vec![Statement::Receive { chan: "a".to_owned() }, send("b")],
                        vec![Statement::Silent],
                    ],
                },
                "select\n      case recv a; send b;\n      case tau;\n    endselect",
            ),
            (Statement::NewMemory { name: "x".to_owned() }, "letmem x"),
            (Statement::MemoryRead { name: "x".to_owned() }, "read x"),
            (Statement::MemoryWrite { name: "x".to_owned() }, "write x"),
            (Statement::NewMutex { name: "m".to_owned() }, "letsync m mutex"),
            (Statement::MutexLock { name: "m".to_owned() }, "lock m"),
            (Statement::MutexUnlock { name: "m".to_owned() }, "unlock m"),
            (Statement::NewRWMutex { name: "m".to_owned() }, "letsync m rwmutex"),
            (Statement::RWMutexReadLock { name: "m".to_owned() }, "rlock m"),
            (Statement::RWMutexReadUnlock { name: "m".to_owned() }, "runlock m"),
        ];
        for (stmt, want) in cases {
            assert_eq!(stmt.to_string(), want);
        }
    }

    #[test]
    fn simplifies_qualified_names() {
        assert_eq!(
            simple_name("(github.com/nickng/migo).String#1"),
            "github.com_nickng_migo.String#1"
        );
        assert!(matches!(simple_name("main.main"), Cow::Borrowed(_)));
    }

    #[test]
    fn parameters_render_from_both_sides() {
        let param = Parameter::new("x", "y");
        let mut callee = Function::new("g");
        callee.add_params([param.clone()]);
        callee.add_stmts([send("y")]);

        assert_eq!(call("g", vec![param.clone()]).to_string(), "call g(x)");
        assert_eq!(callee.to_string(), "def g(y):\n    send y;\n");
        assert_eq!(param.to_string(), "[x → y]");
    }

    #[test]
    fn parameters_are_unique_by_callee() {
        let mut func = Function::new("f");
        func.add_params([Parameter::new("a", "x"), Parameter::new("b", "x")]);
        func.add_params([Parameter::new("a", "y")]);

        assert_eq!(func.params().len(), 2);
        assert_eq!(func.param_by_callee("x").map(|p| p.caller.as_str()), Ok("a"));
        assert_eq!(
            func.param_by_callee("z"),
            Err(LookupError::ParameterNotFound {
                function: "f".to_owned(),
                callee: "z".to_owned(),
            })
        );
    }

    #[test]
    fn trailing_tau_absorbs_repeated_tau() {
        let mut func = Function::new("f");
        func.add_stmts([Statement::Silent]);
        func.add_stmts([Statement::Silent, send("x")]);

        assert_eq!(func.stmts(), &[Statement::Silent, send("x")]);
    }

    #[test]
    fn has_comm_tracks_appended_statements() {
        let mut func = Function::new("f");
        func.add_stmts([Statement::Silent, call("g", vec![])]);
        assert!(!func.has_comm());

        func.add_stmts([Statement::Silent]);
        func.add_stmts([Statement::If {
            then: vec![Statement::Silent],
            else_: vec![Statement::MemoryRead { name: "x".to_owned() }],
        }]);
        assert!(func.has_comm());
    }

    #[test]
    fn call_with_parameters_counts_as_communication() {
        let mut func = Function::new("f");
        func.add_stmts([call("g", vec![Parameter::plain("ch")])]);
        assert!(func.has_comm());
    }

    #[test]
    fn put_away_and_restore_build_branches() {
        let mut func = Function::new("f");
        func.add_stmts([send("a")]);

        func.put_away();
        func.add_stmts([Statement::Silent]);
        let then = func.restore().unwrap();
        func.add_stmts([Statement::If {
            then,
            else_: vec![Statement::Silent],
        }]);

        assert_eq!(func.stmts().len(), 2);
        assert!(func.has_comm());
        assert_eq!(
            func.restore(),
            Err(LookupError::EmptyStatementStack {
                function: "f".to_owned()
            })
        );
    }

    #[test]
    fn first_registration_wins() {
        let mut prog = Program::new();
        assert!(prog.add_function(Function::with_body("f", vec![], vec![send("a")])));
        assert!(!prog.add_function(Function::new("f")));

        assert_eq!(prog.len(), 1);
        assert_eq!(prog.function("f").map(Function::stmts), Some(&[send("a")][..]));
        assert!(prog.function("g").is_none());
    }
}
