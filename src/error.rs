use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::object::Object;
use crate::token::{Token, Type};

static HAD_COMPILE_ERROR: AtomicBool = AtomicBool::new(false);
static HAD_RUNTIME_ERROR: AtomicBool = AtomicBool::new(false);

/// Whether a scan, parse or resolve error has been reported since the last reset.
pub fn had_compile_error() -> bool {
    HAD_COMPILE_ERROR.load(Ordering::SeqCst)
}

/// Whether a runtime error has been reported since the last reset.
pub fn had_runtime_error() -> bool {
    HAD_RUNTIME_ERROR.load(Ordering::SeqCst)
}

/// Clears both error flags. The REPL calls this between inputs so that one
/// bad line does not poison the rest of the session.
pub fn reset() {
    HAD_COMPILE_ERROR.store(false, Ordering::SeqCst);
    HAD_RUNTIME_ERROR.store(false, Ordering::SeqCst);
}

fn mark_compile_error() {
    HAD_COMPILE_ERROR.store(true, Ordering::SeqCst);
}

fn mark_runtime_error() {
    HAD_RUNTIME_ERROR.store(true, Ordering::SeqCst);
}

/// Every diagnostic type knows how to print itself and flip the matching
/// process-wide error flag.
pub trait Diagnostic {
    fn throw(&self);
}

/// A lexical error: an unterminated string or an unrecognized character.
/// Scanner errors only ever have a line, never a token.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl Diagnostic for ScanError {
    fn throw(&self) {
        eprintln!("[line {}] Error: {}", self.line, self.message);
        mark_compile_error();
    }
}

/// A syntax error raised by the recursive-descent parser.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for ParseError {
    fn throw(&self) {
        eprintln!("[line {}] Error {}: {}", self.token.line, where_clause(&self.token), self.message);
        mark_compile_error();
    }
}

/// A static-analysis error raised by the resolver (illegal `this`/`super`/
/// `return`, duplicate local declarations, self-inheriting classes, ...).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for ResolveError {
    fn throw(&self) {
        eprintln!("[line {}] Error {}: {}", self.token.line, where_clause(&self.token), self.message);
        mark_compile_error();
    }
}

/// An error raised while evaluating the AST. Carries the token closest to
/// the failure so the diagnostic can report a line number.
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for RuntimeError {
    fn throw(&self) {
        eprintln!("{}\n[line {}]", self.message, self.token.line);
        mark_runtime_error();
    }
}

fn where_clause(token: &Token) -> String {
    if token.r#type == Type::EOF {
        "at end".to_string()
    } else {
        format!("at '{}'", token.lexeme)
    }
}

/// Non-local control flow inside a running program. `return`, `break` and
/// `continue` unwind the evaluator the same way a [`RuntimeError`] does, but
/// they are caught by their intended consumer (a loop or a function call)
/// instead of bubbling all the way to `interpret`.
#[derive(Debug, Clone)]
pub enum Signal {
    Error(RuntimeError),
    Return(Object),
    Break,
    Continue,
}

impl From<RuntimeError> for Signal {
    fn from(error: RuntimeError) -> Self {
        Signal::Error(error)
    }
}

/// The result type for statement execution: `Ok(())` on normal completion,
/// `Err` for an unwinding error or control-flow signal.
pub type RuntimeResult<T> = Result<T, Signal>;
