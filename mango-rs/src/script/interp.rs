//! Mango statement interpreter.
//!
//! The [`Interpreter`] owns the variable store, the conditional stack and the
//! output buffer, and runs function bodies one line at a time.  It implements
//! [`EvalContext`] so the expression evaluator can call back into it for
//! variable substitution and native calls.
//!
//! Execution is synchronous and single-threaded.  Runaway scripts are
//! bounded by [`Limits`] and can be stopped from another thread with a
//! [`CancelToken`]; both are checked at every statement boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::var::VarStore;

use super::{
    error::{ErrorKind, ExecError},
    expr::{apply_operator, eval, eval_call, eval_condition, split_call, EvalContext},
    loader::Script,
    registry::Registry,
    stmt::{classify, info_query, Stmt, COMMENT},
    value::Value,
};

// ── Limits ────────────────────────────────────────────────────────────────────

/// Resource limits for one interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum expression nesting, and maximum script-function call depth.
    pub max_depth: usize,
    /// Statements allowed per top-level [`Interpreter::execute`]; `None` is
    /// unlimited.
    pub step_budget: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Limits { max_depth: 64, step_budget: None }
    }
}

// ── CancelToken ───────────────────────────────────────────────────────────────

/// Cooperative cancellation flag shared between the host and an interpreter.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the running script stop at its next statement.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation so the interpreter can run again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ── Conditional state ─────────────────────────────────────────────────────────

/// One open `if` … `endif`.
#[derive(Debug, Clone, Copy)]
struct CondFrame {
    /// The current branch is executing.
    live: bool,
    /// Some branch of this conditional already ran (or none may run).
    taken: bool,
    /// The position was live when the `if` opened.
    enclosing: bool,
}

#[derive(Debug, Clone)]
struct ControlState {
    frames: Vec<CondFrame>,
    live: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        ControlState { frames: Vec::new(), live: true }
    }
}

impl ControlState {
    fn recompute(&mut self) {
        self.live = self.frames.last().map_or(true, |f| f.live);
    }
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// The Mango interpreter.
pub struct Interpreter {
    vars: VarStore,
    registry: Arc<Registry>,
    /// Lines produced by `print`, `info:` queries and reported errors.
    pub output: Vec<String>,
    control: ControlState,
    limits: Limits,
    cancel: CancelToken,
    steps: u64,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::with_std()
    }
}

impl Interpreter {
    pub fn new(registry: Arc<Registry>) -> Self {
        Interpreter {
            vars: VarStore::new(),
            registry,
            output: Vec::new(),
            control: ControlState::default(),
            limits: Limits::default(),
            cancel: CancelToken::new(),
            steps: 0,
            call_depth: 0,
        }
    }

    /// An interpreter over a fresh standard-library registry.
    pub fn with_std() -> Self {
        Self::new(Arc::new(Registry::with_std()))
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Share an existing cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn vars(&self) -> &VarStore {
        &self.vars
    }

    /// Set a script variable from the host.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.set(name, value);
    }

    /// Read a script variable from the host.
    pub fn get_variable(&self, name: &str) -> Option<&str> {
        self.vars.get(name)
    }

    /// Drain the output buffer.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// `true` when statements at the current position would execute.
    pub fn is_live(&self) -> bool {
        self.control.live
    }

    /// Number of open `if` blocks.
    pub fn open_conditionals(&self) -> usize {
        self.control.frames.len()
    }

    /// Evaluate an expression against the current variables.
    pub fn eval(&mut self, expr: &str) -> String {
        eval(expr, self).into_text()
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Run function `name` from `script`.  An unknown name is a no-op.
    ///
    /// Statement errors are reported to [`output`](Self::output) and
    /// execution continues; only budget, cancellation and call-depth errors
    /// are returned.
    pub fn execute(&mut self, script: &Script, name: &str) -> Result<(), ExecError> {
        if self.call_depth == 0 {
            self.steps = 0;
        }
        if script.function(name).is_none() {
            tracing::debug!(function = name, "no such function, nothing to execute");
            return Ok(());
        }
        self.run_function(script, name)
    }

    /// Execute a single statement outside any function.
    ///
    /// Unlike body execution, a failing statement is returned rather than
    /// reported.  Conditional state persists between calls.
    pub fn exec_line(&mut self, line: &str) -> Result<(), ExecError> {
        if self.call_depth == 0 {
            self.steps = 0;
        }
        self.exec_stmt(&Script::default(), line)
    }

    fn run_function(&mut self, script: &Script, name: &str) -> Result<(), ExecError> {
        let Some(func) = script.function(name) else {
            return Ok(());
        };
        if self.call_depth >= self.limits.max_depth {
            return Err(ExecError::CallDepth(self.limits.max_depth));
        }
        tracing::debug!(function = name, depth = self.call_depth, "enter");

        let saved = std::mem::take(&mut self.control);
        self.call_depth += 1;
        let mut result = Ok(());
        for line in func.body() {
            if let Err(e) = self.run_stmt(script, line) {
                result = Err(e);
                break;
            }
        }
        self.call_depth -= 1;
        let inner = std::mem::replace(&mut self.control, saved);
        if !inner.frames.is_empty() {
            tracing::debug!(function = name, open = inner.frames.len(), "unclosed if at end of function");
        }
        result
    }

    /// Execute one statement, reporting and absorbing statement errors.
    fn run_stmt(&mut self, script: &Script, line: &str) -> Result<(), ExecError> {
        match self.exec_stmt(script, line) {
            Err(ExecError::Script(kind)) => {
                self.report(kind, line);
                Ok(())
            }
            other => other,
        }
    }

    fn report(&mut self, kind: ErrorKind, line: &str) {
        tracing::warn!(statement = line.trim(), error = %kind, "statement failed");
        self.output.push(kind.to_string());
    }

    fn tick(&mut self) -> Result<(), ExecError> {
        if self.cancel.is_cancelled() {
            return Err(ExecError::Cancelled);
        }
        self.steps += 1;
        match self.limits.step_budget {
            Some(budget) if self.steps > budget => Err(ExecError::StepBudget(budget)),
            _ => Ok(()),
        }
    }

    fn exec_stmt(&mut self, script: &Script, line: &str) -> Result<(), ExecError> {
        self.tick()?;
        let line = line.trim();
        if line.contains(COMMENT) {
            return Ok(());
        }
        if let Some(name) = info_query(line) {
            self.print_info(name);
        }

        let stmt = match classify(line) {
            Ok(stmt) => stmt,
            Err(_) if !self.control.live => return Ok(()),
            Err(kind) => return Err(kind.into()),
        };

        match stmt {
            Stmt::Nop => Ok(()),
            Stmt::If { cond } => self.exec_if(cond),
            Stmt::Elif { cond } => self.exec_elif(cond),
            Stmt::Else => self.exec_else(),
            Stmt::Endif => self.exec_endif(),
            _ if !self.control.live => Ok(()),
            Stmt::For { var, start, end, body } => self.exec_for(script, var, start, end, &body),
            Stmt::While { cond, body } => self.exec_while(script, cond, &body),
            Stmt::Assign { name, op, value } => self.exec_assign(name, op, value),
            Stmt::Call(text) => self.exec_call(script, text),
        }
    }

    fn print_info(&mut self, name: &str) {
        match self.registry.lookup(name) {
            Some(f) => self.output.push(format!("{}: {}", f.name, f.info)),
            None => tracing::debug!(native = name, "info query for unknown native"),
        }
    }

    // ── Conditionals ──────────────────────────────────────────────────────────

    fn exec_if(&mut self, cond: &str) -> Result<(), ExecError> {
        if !self.control.live {
            self.control.frames.push(CondFrame { live: false, taken: true, enclosing: false });
            self.control.live = false;
            return Ok(());
        }
        let result = eval_condition(cond, self);
        let live = matches!(result, Ok(true));
        self.control.frames.push(CondFrame { live, taken: live, enclosing: true });
        self.control.live = live;
        result.map(|_| ()).map_err(ExecError::from)
    }

    fn exec_elif(&mut self, cond: &str) -> Result<(), ExecError> {
        let Some(top) = self.control.frames.last().copied() else {
            return Err(ErrorKind::InvalidFunction.into());
        };
        let (live, outcome) = if !top.enclosing || top.taken {
            (false, Ok(()))
        } else {
            match eval_condition(cond, self) {
                Ok(b) => (b, Ok(())),
                Err(kind) => (false, Err(kind.into())),
            }
        };
        if let Some(frame) = self.control.frames.last_mut() {
            frame.live = live;
            frame.taken |= live;
        }
        self.control.live = live;
        outcome
    }

    fn exec_else(&mut self) -> Result<(), ExecError> {
        let Some(frame) = self.control.frames.last_mut() else {
            return Err(ErrorKind::InvalidFunction.into());
        };
        frame.live = frame.enclosing && !frame.taken;
        frame.taken = true;
        self.control.live = frame.live;
        Ok(())
    }

    fn exec_endif(&mut self) -> Result<(), ExecError> {
        if self.control.frames.pop().is_none() {
            return Err(ErrorKind::InvalidFunction.into());
        }
        self.control.recompute();
        Ok(())
    }

    // ── Loops ─────────────────────────────────────────────────────────────────

    fn exec_for(
        &mut self,
        script: &Script,
        var: &str,
        start: &str,
        end: &str,
        body: &[&str],
    ) -> Result<(), ExecError> {
        let start = eval(start, self).as_integer().ok_or(ErrorKind::InvalidVariable)?;
        let end = eval(end, self).as_integer().ok_or(ErrorKind::InvalidVariable)?;
        for i in start..=end {
            self.tick()?;
            self.vars.set(var, i.to_string());
            for stmt in body {
                self.run_stmt(script, stmt)?;
            }
        }
        Ok(())
    }

    fn exec_while(&mut self, script: &Script, cond: &str, body: &[&str]) -> Result<(), ExecError> {
        loop {
            self.tick()?;
            if !eval_condition(cond, self)? {
                return Ok(());
            }
            for stmt in body {
                self.run_stmt(script, stmt)?;
            }
        }
    }

    // ── Assignment and calls ──────────────────────────────────────────────────

    fn exec_assign(&mut self, name: &str, op: Option<char>, value: &str) -> Result<(), ExecError> {
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(ErrorKind::InvalidVariable.into());
        }
        let rhs = eval(value, self);
        let result = match op {
            None => rhs,
            Some(op) => {
                let current = self.vars.get(name).ok_or(ErrorKind::InvalidVariable)?;
                apply_operator(op, Value::from(current), rhs)
            }
        };
        self.vars.set(name, result.into_text());
        Ok(())
    }

    fn exec_call(&mut self, script: &Script, text: &str) -> Result<(), ExecError> {
        let value = match split_call(text) {
            Some((name, inner)) => {
                if !name.is_empty() && !self.registry.contains(name) && script.function(name).is_some() {
                    if !inner.trim().is_empty() {
                        return Err(ErrorKind::InvalidArgs.into());
                    }
                    return self.run_function(script, name);
                }
                eval_call(text, name, inner, self)
            }
            None => eval(text, self),
        };
        match value {
            Value::Error(kind) => Err(kind.into()),
            _ => Ok(()),
        }
    }
}

// ── EvalContext impl ──────────────────────────────────────────────────────────

impl EvalContext for Interpreter {
    fn substitute_vars(&mut self, text: &str) -> Option<String> {
        self.vars.substitute(text)
    }

    fn call_native(&mut self, name: &str, args: &[String]) -> Option<Value> {
        let f = self.registry.lookup(name)?;
        Some(f.call(args, &mut self.output))
    }

    fn max_depth(&self) -> usize {
        self.limits.max_depth
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
