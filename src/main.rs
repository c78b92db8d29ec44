use std::env;
use std::process;

use lox::error;
use lox::Lox;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const USAGE_ERROR: i32 = 64;
const IO_ERROR: i32 = 74;

struct Args {
    file: Option<String>,
    verbose: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Args {
    args.next();

    let mut file = None;
    let mut verbose = false;

    for arg in args {
        match arg.as_str() {
            "--verbose" => verbose = true,
            _ if file.is_none() => file = Some(arg),
            _ => {
                eprintln!("Usage: lox [--verbose] [script]");
                process::exit(USAGE_ERROR);
            }
        }
    }

    Args { file, verbose }
}

fn main() {
    let args = parse_args(env::args());

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.file {
        Some(path) => run_file(&path),
        None => run_prompt(),
    }
}

fn run_file(path: &str) {
    log::debug!("running file: {path}");
    let mut lox = Lox::new();
    if let Err(e) = lox.run_file(path) {
        eprintln!("lox: {e}");
        process::exit(IO_ERROR);
    }
}

/// History lives at `~/.lox_history` so it survives across REPL sessions;
/// falls back to an in-memory-only history if the home directory can't be
/// located.
fn history_path() -> Option<std::path::PathBuf> {
    home::home_dir().map(|home| home.join(".lox_history"))
}

fn run_prompt() {
    println!("Lox REPL. Ctrl-D or 'exit' to quit.");

    let mut editor = DefaultEditor::new().expect("failed to initialize the line editor");
    let history = history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }

    let mut lox = Lox::new();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "lox> " } else { "...  " };

        match editor.readline(prompt) {
            Ok(line) => {
                if buffer.is_empty() && line.trim() == "exit" {
                    break;
                }
                if buffer.is_empty() && line.trim().is_empty() {
                    continue;
                }

                let _ = editor.add_history_entry(line.as_str());
                buffer.push_str(&line);
                buffer.push('\n');

                if is_complete_source(&buffer) {
                    lox.run(&buffer);
                    error::reset();
                    buffer.clear();
                }
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                log::error!("readline error: {e}");
                break;
            }
        }
    }

    if let Some(path) = &history {
        let _ = editor.save_history(path);
    }
}

/// A buffer is ready to run once its brackets balance (ignoring `//`
/// comments) and it ends in a statement terminator. This is a heuristic,
/// not a parse: it lets the REPL accept multi-line `if`/`while`/`fun`
/// bodies without running a partial statement after every newline.
fn is_complete_source(source: &str) -> bool {
    let mut depth: i32 = 0;

    for line in source.lines() {
        let code = match line.find("//") {
            Some(index) => &line[..index],
            None => line,
        };

        for ch in code.chars() {
            match ch {
                '(' | '{' => depth += 1,
                ')' | '}' => depth -= 1,
                _ => {}
            }
        }
    }

    if depth > 0 {
        return false;
    }

    matches!(source.trim_end().chars().last(), Some(';') | Some('}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_statement_is_complete() {
        assert!(is_complete_source("print 1;\n"));
    }

    #[test]
    fn unbalanced_brace_is_incomplete() {
        assert!(!is_complete_source("if (true) {\n"));
    }

    #[test]
    fn balanced_multiline_block_is_complete() {
        assert!(is_complete_source("if (true) {\n  var x = 1;\n  print x;\n}\n"));
    }

    #[test]
    fn balanced_multiline_call_is_complete() {
        assert!(is_complete_source("print (1 +\n2);\n"));
    }

    #[test]
    fn trailing_comment_is_ignored_when_balancing() {
        assert!(is_complete_source("print 1; // trailing note with a ) in it\n"));
    }
}
