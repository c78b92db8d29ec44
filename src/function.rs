use std::cell::RefCell;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use crate::class::Instance;
use crate::environment::{EnvRef, Environment};
use crate::error::{RuntimeError, Signal};
use crate::interpreter::Interpreter;
use crate::object::{Callable, Object};
use crate::stmt::FunctionData;
use crate::token::synthetic;

/// A user-defined function or method, paired with the environment it
/// closed over at the point it was declared. `is_initializer` marks a
/// class's `init` method, whose call sites always receive the instance back
/// regardless of what the body returns.
#[derive(Debug, Clone)]
pub struct Function {
    pub declaration: Rc<FunctionData>,
    pub closure: EnvRef,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionData>, closure: EnvRef, is_initializer: bool) -> Function {
        Function { declaration, closure, is_initializer }
    }

    /// Produces a copy of this function whose closure is a fresh scope,
    /// nested in the original closure, that defines `this` as `instance`.
    /// Used both for plain method lookup and for binding `init`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let env = Environment::new(Some(Rc::clone(&self.closure)));
        env.borrow_mut().define("this", Object::Instance(instance));
        Function::new(Rc::clone(&self.declaration), env, self.is_initializer)
    }
}

impl Callable for Function {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let env = Environment::new(Some(Rc::clone(&self.closure)));
        for (param, arg) in self.declaration.params.iter().zip(arguments.into_iter()) {
            env.borrow_mut().define(&param.lexeme, arg);
        }

        match interpreter.execute_block(&self.declaration.body, env) {
            Ok(()) => {
                if self.is_initializer {
                    self.closure.borrow().get(&synthetic("this"))
                } else {
                    Ok(Object::nil())
                }
            }
            Err(Signal::Return(value)) => {
                if self.is_initializer {
                    self.closure.borrow().get(&synthetic("this"))
                } else {
                    Ok(value)
                }
            }
            Err(Signal::Error(error)) => Err(error),
            Err(Signal::Break) | Err(Signal::Continue) => {
                unreachable!("parser rejects break/continue outside a loop")
            }
        }
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

/// A built-in function implemented in Rust rather than Lox. The language
/// only ships one of these, `clock`, but the type is not special-cased so
/// adding another is a one-line change in [`NativeFunction::globals`].
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub function: fn(&mut Interpreter, Vec<Object>) -> Result<Object, RuntimeError>,
}

impl NativeFunction {
    /// The natives seeded into every interpreter's global scope.
    pub fn globals() -> Vec<NativeFunction> {
        vec![NativeFunction {
            name: "clock",
            arity: 0,
            function: |_, _| {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default();
                Ok(Object::from(now.as_secs_f64()))
            },
        }]
    }
}

impl Callable for NativeFunction {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        (self.function)(interpreter, arguments)
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
