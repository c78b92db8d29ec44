use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use crate::class::{Class, Instance};
use crate::environment::{EnvRef, Environment};
use crate::error::{Diagnostic, RuntimeError, RuntimeResult, Signal};
use crate::expr::{
    AssignData, BinaryData, CallData, Expr, GetData, LogicalData, NodeId, SetData, SuperData,
    UnaryData,
};
use crate::function::{Function, NativeFunction};
use crate::literal::Literal;
use crate::object::Object;
use crate::stmt::{ClassData, Stmt};
use crate::token::{synthetic, Token, Type};

/// Where `print` writes. Shared rather than borrowed so a test harness can
/// hold on to the same buffer the interpreter is writing into and inspect
/// it after the run, the same way environments and instances here are
/// shared via `Rc<RefCell<_>>` rather than passed around by reference.
pub type Sink = Rc<RefCell<dyn Write>>;

/// Drives a parsed and resolved program to completion. Owns the globals
/// frame (seeded with the native builtins), the current environment, and
/// the resolver's side-table mapping each variable-use node to a lexical
/// depth.
pub struct Interpreter {
    pub globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<NodeId, usize>,
    output: Sink,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    pub fn with_output(output: Sink) -> Interpreter {
        let globals = Environment::new(None);
        for native in NativeFunction::globals() {
            globals.borrow_mut().define(native.name, Object::NativeFunction(Rc::new(native)));
        }

        Interpreter { environment: Rc::clone(&globals), globals, locals: HashMap::new(), output }
    }

    /// Records that the expression node `id` resolves `distance` scopes up
    /// from wherever it is evaluated. Called by the resolver, never by the
    /// evaluator itself.
    pub fn resolve(&mut self, id: NodeId, distance: usize) {
        self.locals.insert(id, distance);
    }

    #[cfg(test)]
    pub fn locals_for_test(&self) -> &HashMap<NodeId, usize> {
        &self.locals
    }

    /// Drops every recorded resolution. The REPL calls this before resolving
    /// each new input so a side-table entry from a previous input can never
    /// be consulted for an AST node that no longer exists.
    pub fn clear_locals(&mut self) {
        self.locals.clear();
    }

    /// Executes a program. Stops at the first runtime error, after printing
    /// its diagnostic and marking the process-wide runtime-error flag; the
    /// statements that would have followed are not executed.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for statement in statements {
            if let Err(signal) = self.execute(statement) {
                match signal {
                    Signal::Error(error) => error.throw(),
                    Signal::Return(_) | Signal::Break | Signal::Continue => {
                        unreachable!("resolver rejects return/break/continue outside their contexts")
                    }
                }
                return;
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<()> {
        match stmt {
            Stmt::Expression(data) => {
                self.evaluate(&data.expr)?;
                Ok(())
            }
            Stmt::Print(data) => {
                let value = self.evaluate(&data.expr)?;
                writeln!(self.output.borrow_mut(), "{value}").expect("write to the configured output sink");
                Ok(())
            }
            Stmt::Var(data) => {
                let value = match &data.initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::nil(),
                };
                self.environment.borrow_mut().define(&data.name.lexeme, value);
                Ok(())
            }
            Stmt::Block(data) => {
                let scope = Environment::new(Some(Rc::clone(&self.environment)));
                self.execute_block(&data.statements, scope)
            }
            Stmt::If(data) => {
                if self.evaluate(&data.condition)?.is_truthy() {
                    self.execute(&data.then_branch)
                } else if let Some(else_branch) = &data.else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(data) => {
                while self.evaluate(&data.condition)?.is_truthy() {
                    match self.execute(&data.body) {
                        Ok(()) => {}
                        Err(Signal::Break) => break,
                        Err(Signal::Continue) => {}
                        Err(other) => return Err(other),
                    }
                    if let Some(increment) = &data.increment {
                        self.evaluate(increment)?;
                    }
                }
                Ok(())
            }
            Stmt::Function(data) => {
                let function = Function::new(Rc::new(data.clone()), Rc::clone(&self.environment), false);
                self.environment.borrow_mut().define(&data.name.lexeme, Object::Function(Rc::new(function)));
                Ok(())
            }
            Stmt::Return(data) => {
                let value = match &data.value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::nil(),
                };
                Err(Signal::Return(value))
            }
            Stmt::Class(data) => self.execute_class(data),
            Stmt::Break => Err(Signal::Break),
            Stmt::Continue => Err(Signal::Continue),
        }
    }

    /// Runs `statements` in `scope`, restoring the caller's environment on
    /// every exit path: normal completion, a break/continue/return signal,
    /// or a runtime error.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: EnvRef) -> RuntimeResult<()> {
        let previous = std::mem::replace(&mut self.environment, scope);

        let mut result = Ok(());
        for statement in statements {
            if let Err(signal) = self.execute(statement) {
                result = Err(signal);
                break;
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(&mut self, data: &ClassData) -> RuntimeResult<()> {
        let superclass = match &data.superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Object::Class(class) => Some(class),
                    _ => {
                        let Expr::Variable(variable) = expr else {
                            unreachable!("parser only produces a Variable expression for a superclass")
                        };
                        return Err(RuntimeError {
                            token: variable.name.clone(),
                            message: "Superclass must be a class.".to_string(),
                        }
                        .into());
                    }
                }
            }
            None => None,
        };

        self.environment.borrow_mut().define(&data.name.lexeme, Object::nil());

        let method_scope = if let Some(superclass) = &superclass {
            let scope = Environment::new(Some(Rc::clone(&self.environment)));
            scope.borrow_mut().define("super", Object::Class(Rc::clone(superclass)));
            scope
        } else {
            Rc::clone(&self.environment)
        };

        let mut methods = HashMap::new();
        for method in &data.methods {
            let is_initializer = method.name.lexeme == "init";
            let function = Function::new(Rc::new(method.clone()), Rc::clone(&method_scope), is_initializer);
            methods.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        let class = Class::new(data.name.lexeme.clone(), superclass, methods);
        self.environment
            .borrow_mut()
            .assign(&data.name, Object::Class(Rc::new(RefCell::new(class))))
            .map_err(Signal::from)?;

        Ok(())
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Object, RuntimeError> {
        match expr {
            Expr::Literal(data) => Ok(Object::Literal(data.value.clone())),
            Expr::Grouping(data) => self.evaluate(&data.expr),
            Expr::Unary(data) => self.evaluate_unary(data),
            Expr::Binary(data) => self.evaluate_binary(data),
            Expr::Logical(data) => self.evaluate_logical(data),
            Expr::Variable(data) => self.lookup_variable(&data.name, data.id),
            Expr::This(data) => self.lookup_variable(&data.keyword, data.id),
            Expr::Assign(data) => self.evaluate_assign(data),
            Expr::Call(data) => self.evaluate_call(data),
            Expr::Get(data) => self.evaluate_get(data),
            Expr::Set(data) => self.evaluate_set(data),
            Expr::Super(data) => self.evaluate_super(data),
        }
    }

    fn lookup_variable(&self, name: &Token, id: NodeId) -> Result<Object, RuntimeError> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_unary(&mut self, data: &UnaryData) -> Result<Object, RuntimeError> {
        let right = self.evaluate(&data.right)?;

        match data.operator.r#type {
            Type::Minus => right
                .as_literal()
                .and_then(Literal::negate)
                .map(Object::Literal)
                .ok_or_else(|| RuntimeError {
                    token: data.operator.clone(),
                    message: "Operand must be a number.".to_string(),
                }),
            Type::Bang => Ok(Object::from(!right.is_truthy())),
            _ => unreachable!("parser only produces '!' and '-' as unary operators"),
        }
    }

    fn evaluate_binary(&mut self, data: &BinaryData) -> Result<Object, RuntimeError> {
        let left = self.evaluate(&data.left)?;
        let right = self.evaluate(&data.right)?;
        let operator = &data.operator;

        match operator.r#type {
            Type::Minus => numeric_op(operator, &left, &right, Literal::sub),
            Type::Star => numeric_op(operator, &left, &right, Literal::mul),
            Type::Slash => division(operator, &left, &right),
            Type::Plus => addition(operator, &left, &right),
            Type::Greater => comparison(operator, &left, &right, Literal::greater),
            Type::GreaterEqual => comparison(operator, &left, &right, Literal::greater_equal),
            Type::Less => comparison(operator, &left, &right, Literal::less),
            Type::LessEqual => comparison(operator, &left, &right, Literal::less_equal),
            Type::EqualEqual => Ok(Object::from(left == right)),
            Type::BangEqual => Ok(Object::from(left != right)),
            _ => unreachable!("parser only produces these operators for a binary expression"),
        }
    }

    fn evaluate_logical(&mut self, data: &LogicalData) -> Result<Object, RuntimeError> {
        let left = self.evaluate(&data.left)?;

        match data.operator.r#type {
            Type::Or if left.is_truthy() => Ok(left),
            Type::Or => self.evaluate(&data.right),
            Type::And if !left.is_truthy() => Ok(left),
            Type::And => self.evaluate(&data.right),
            _ => unreachable!("parser only produces 'and'/'or' for a logical expression"),
        }
    }

    fn evaluate_assign(&mut self, data: &AssignData) -> Result<Object, RuntimeError> {
        let value = self.evaluate(&data.value)?;

        match self.locals.get(&data.id) {
            Some(&distance) => Environment::assign_at(&self.environment, distance, &data.name, value.clone())?,
            None => self.globals.borrow_mut().assign(&data.name, value.clone())?,
        }

        Ok(value)
    }

    fn evaluate_call(&mut self, data: &CallData) -> Result<Object, RuntimeError> {
        let callee = self.evaluate(&data.callee)?;

        let mut arguments = Vec::with_capacity(data.arguments.len());
        for argument in &data.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        let arity = callee.arity().ok_or_else(|| RuntimeError {
            token: data.paren.clone(),
            message: "Can only call functions and classes.".to_string(),
        })?;

        if arguments.len() != arity {
            return Err(RuntimeError {
                token: data.paren.clone(),
                message: format!("Expected {} arguments but got {}.", arity, arguments.len()),
            });
        }

        callee.call(self, arguments).expect("arity check above confirmed this value is callable")
    }

    fn evaluate_get(&mut self, data: &GetData) -> Result<Object, RuntimeError> {
        let object = self.evaluate(&data.object)?;

        match object {
            Object::Instance(instance) => Instance::get(&instance, &data.name),
            _ => Err(RuntimeError {
                token: data.name.clone(),
                message: "Only instances have properties.".to_string(),
            }),
        }
    }

    fn evaluate_set(&mut self, data: &SetData) -> Result<Object, RuntimeError> {
        let object = self.evaluate(&data.object)?;

        match object {
            Object::Instance(instance) => {
                let value = self.evaluate(&data.value)?;
                instance.borrow_mut().set(&data.name, value.clone());
                Ok(value)
            }
            _ => Err(RuntimeError {
                token: data.name.clone(),
                message: "Only instances have fields.".to_string(),
            }),
        }
    }

    fn evaluate_super(&mut self, data: &SuperData) -> Result<Object, RuntimeError> {
        let distance = *self.locals.get(&data.id).expect("resolver always resolves 'super'");

        let superclass = Environment::get_at(&self.environment, distance, &data.keyword)?;
        let instance = Environment::get_at(&self.environment, distance - 1, &synthetic("this"))?;

        let Object::Class(superclass) = superclass else {
            unreachable!("resolver only ever binds 'super' to a class value")
        };
        let Object::Instance(instance) = instance else {
            unreachable!("'this' always resolves to an instance inside a method body")
        };

        let method = superclass.borrow().find_method(&data.method.lexeme).ok_or_else(|| RuntimeError {
            token: data.method.clone(),
            message: format!("Undefined property '{}'.", data.method.lexeme),
        })?;

        Ok(Object::Function(Rc::new(method.bind(instance))))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn numeric_operands<'a>(left: &'a Object, right: &'a Object) -> Option<(&'a Literal, &'a Literal)> {
    match (left.as_literal(), right.as_literal()) {
        (Some(l), Some(r)) => Some((l, r)),
        _ => None,
    }
}

fn numeric_op(
    operator: &Token,
    left: &Object,
    right: &Object,
    op: fn(&Literal, &Literal) -> Option<Literal>,
) -> Result<Object, RuntimeError> {
    numeric_operands(left, right)
        .and_then(|(l, r)| op(l, r))
        .map(Object::Literal)
        .ok_or_else(|| RuntimeError { token: operator.clone(), message: "Operands must be numbers.".to_string() })
}

fn comparison(
    operator: &Token,
    left: &Object,
    right: &Object,
    op: fn(&Literal, &Literal) -> Option<bool>,
) -> Result<Object, RuntimeError> {
    numeric_operands(left, right)
        .and_then(|(l, r)| op(l, r))
        .map(Object::from)
        .ok_or_else(|| RuntimeError { token: operator.clone(), message: "Operands must be numbers.".to_string() })
}

fn division(operator: &Token, left: &Object, right: &Object) -> Result<Object, RuntimeError> {
    let (l, r) = numeric_operands(left, right)
        .ok_or_else(|| RuntimeError { token: operator.clone(), message: "Operands must be numbers.".to_string() })?;

    match l.div(r) {
        Some(Some(value)) => Ok(Object::Literal(value)),
        Some(None) => Err(RuntimeError { token: operator.clone(), message: "Division by zero.".to_string() }),
        None => unreachable!("numeric_operands already confirmed both operands are numbers"),
    }
}

fn addition(operator: &Token, left: &Object, right: &Object) -> Result<Object, RuntimeError> {
    let error = || RuntimeError {
        token: operator.clone(),
        message: "Operands must be two numbers or two strings.".to_string(),
    };

    match (left.as_literal(), right.as_literal()) {
        (Some(l), Some(r)) => l.add(r).map(Object::Literal).ok_or_else(error),
        _ => Err(error()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryData, LiteralData};

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(LiteralData { id: NodeId(0), value: Literal::Number(n) }))
    }

    fn op(r#type: Type, lexeme: &str) -> Token {
        Token::new(r#type, lexeme.to_string(), None, 1)
    }

    #[test]
    fn adds_two_numbers() {
        let mut interpreter = Interpreter::new();
        let expr = Expr::Binary(BinaryData {
            id: NodeId(1),
            left: num(1.0),
            operator: op(Type::Plus, "+"),
            right: num(2.0),
        });
        assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from(3.0));
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let mut interpreter = Interpreter::new();
        let expr = Expr::Binary(BinaryData {
            id: NodeId(1),
            left: num(1.0),
            operator: op(Type::Slash, "/"),
            right: num(0.0),
        });
        let error = interpreter.evaluate(&expr).unwrap_err();
        assert_eq!(error.message, "Division by zero.");
    }

    #[test]
    fn adding_number_and_string_is_a_runtime_error() {
        let mut interpreter = Interpreter::new();
        let expr = Expr::Binary(BinaryData {
            id: NodeId(1),
            left: num(1.0),
            operator: op(Type::Plus, "+"),
            right: Box::new(Expr::Literal(LiteralData {
                id: NodeId(2),
                value: Literal::String("a".to_string()),
            })),
        });
        let error = interpreter.evaluate(&expr).unwrap_err();
        assert_eq!(error.message, "Operands must be two numbers or two strings.");
    }

    #[test]
    fn block_restores_environment_after_a_runtime_error() {
        let mut interpreter = Interpreter::new();
        let bad = Stmt::Expression(crate::stmt::ExpressionData {
            expr: Expr::Binary(BinaryData {
                id: NodeId(1),
                left: num(1.0),
                operator: op(Type::Slash, "/"),
                right: num(0.0),
            }),
        });

        let outer = Rc::clone(&interpreter.environment);
        let scope = Environment::new(Some(Rc::clone(&outer)));
        let result = interpreter.execute_block(&[bad], scope);

        assert!(result.is_err());
        assert!(Rc::ptr_eq(&interpreter.environment, &outer));
    }
}
