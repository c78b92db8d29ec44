//! A tree-walking interpreter for Lox: a small dynamically-typed scripting
//! language with C-like syntax, first-class functions and closures, and
//! single-inheritance classes with `this`/`super`.
//!
//! The pipeline is the classic one: [`scanner`] turns source text into
//! tokens, [`parser`] turns tokens into an [`Expr`](expr::Expr)/[`Stmt`](stmt::Stmt)
//! tree, [`resolver`] walks that tree once to compute lexical scope depths,
//! and [`interpreter`] walks it again to actually run the program.
//!
//! Two process-wide flags in [`error`] track whether a compile-time or
//! runtime error has been reported; [`Lox::run`] checks them between
//! pipeline stages so a source file with scan errors is never handed to the
//! parser, and so on down the chain.

pub mod ast;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod literal;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;

use std::fs;
use std::io;

use interpreter::{Interpreter, Sink};
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// The interpreter engine: a single persistent [`Interpreter`] plus the
/// pipeline that feeds it. A fresh `Lox` is one REPL session or one script
/// run; its globals and resolver side-table live as long as it does.
pub struct Lox {
    interpreter: Interpreter,
}

impl Lox {
    pub fn new() -> Lox {
        error::reset();
        Lox { interpreter: Interpreter::new() }
    }

    /// Builds an engine that writes `print` output to `output` instead of
    /// stdout. Used by the REPL (so prompts and program output interleave
    /// correctly through one handle) and by tests that want to assert on
    /// what a program printed without spawning a subprocess.
    pub fn with_output(output: Sink) -> Lox {
        error::reset();
        Lox { interpreter: Interpreter::with_output(output) }
    }

    /// Reads and runs a script file, then maps the process-wide error flags
    /// onto the conventional exit codes: 65 for a compile-time error, 70 for
    /// a runtime error, 0 otherwise. Does not return on a nonzero code.
    pub fn run_file(&mut self, path: &str) -> io::Result<()> {
        let source = fs::read_to_string(path)?;
        self.run(&source);

        if error::had_compile_error() {
            std::process::exit(65);
        }
        if error::had_runtime_error() {
            std::process::exit(70);
        }

        Ok(())
    }

    /// Runs one chunk of source through the full pipeline: scan, parse,
    /// resolve, interpret. Each stage bails out early if an earlier stage
    /// reported a compile-time error, per [`error::had_compile_error`].
    ///
    /// The resolver side-table is cleared first so a REPL reusing this
    /// engine across inputs never consults a depth computed against an AST
    /// node from a previous input.
    pub fn run(&mut self, source: &str) {
        let tokens = Scanner::new(source).scan_tokens();
        if error::had_compile_error() {
            return;
        }

        let statements = Parser::new(tokens).parse();
        if error::had_compile_error() {
            return;
        }

        self.interpreter.clear_locals();
        Resolver::new(&mut self.interpreter).resolve(&statements);
        if error::had_compile_error() {
            return;
        }

        self.interpreter.interpret(&statements);
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn run(source: &str) -> String {
        error::reset();
        let output = Rc::new(RefCell::new(Vec::new()));
        let mut lox = Lox::with_output(output.clone());
        lox.run(source);
        String::from_utf8(output.borrow().clone()).unwrap()
    }

    #[test]
    fn prints_two_statements() {
        assert_eq!(run(r#"print "hi"; print 1+2;"#), "hi\n3\n");
    }

    #[test]
    fn blocks_shadow_without_mutating_the_outer_binding() {
        assert_eq!(run("var a=1; { var a=2; print a; } print a;"), "2\n1\n");
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        let source = r#"
            fun make() {
                var i = 0;
                fun get() { return i; }
                fun inc() { i = i + 1; }
                inc();
                return get;
            }
            var g = make();
            print g();
        "#;
        assert_eq!(run(source), "1\n");
    }

    #[test]
    fn assignment_is_an_expression() {
        assert_eq!(run("var a=1; print (a=2)+a;"), "4\n");
    }

    #[test]
    fn class_with_super_calls_through_the_chain() {
        let source = r#"
            class A { greet() { print "A"; } }
            class B < A { greet() { super.greet(); print "B"; } }
            B().greet();
        "#;
        assert_eq!(run(source), "A\nB\n");
    }

    #[test]
    fn initializer_returns_the_instance() {
        let source = r#"
            class C { init(x) { this.x = x; } }
            print C(7).x;
        "#;
        assert_eq!(run(source), "7\n");
    }

    #[test]
    fn continue_still_runs_the_loop_body_around_it() {
        let source = "var i=0; while(i<5){ i=i+1; if(i==2 or i==4) continue; print i; }";
        assert_eq!(run(source), "1\n3\n5\n");
    }

    #[test]
    fn for_loop_increment_still_runs_on_continue() {
        let source = "for (var i=0; i<3; i=i+1) { if (i==1) continue; print i; }";
        assert_eq!(run(source), "0\n2\n");
    }

    #[test]
    fn division_by_zero_sets_the_runtime_error_flag() {
        assert_eq!(run("print 1/0;"), "");
        assert!(error::had_runtime_error());
        error::reset();
    }

    #[test]
    fn illegal_this_sets_the_compile_error_flag_and_runs_nothing() {
        assert_eq!(run("print this;"), "");
        assert!(error::had_compile_error());
        error::reset();
    }
}
