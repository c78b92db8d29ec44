use std::collections::HashMap;
use std::mem;

use crate::error::{Diagnostic, ResolveError};
use crate::expr::Expr;
use crate::interpreter::Interpreter;
use crate::stmt::{ClassData, FunctionData, Stmt};
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// A single static pass over the AST that computes, for every variable-use
/// expression, how many enclosing scopes separate it from the scope that
/// declares the name — and records that depth in the interpreter's
/// side-table, keyed by the expression's [`NodeId`](crate::expr::NodeId)
/// rather than by the token it carries, since two unrelated uses of the
/// same name are still distinct nodes.
///
/// Also rejects, statically, every use of `this`/`super`/`return` that the
/// evaluator would otherwise have to fail on at runtime.
pub struct Resolver<'a> {
    interpreter: &'a mut Interpreter,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a> Resolver<'a> {
    pub fn new(interpreter: &'a mut Interpreter) -> Resolver<'a> {
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(data) => self.resolve_expr(&data.expr),
            Stmt::Print(data) => self.resolve_expr(&data.expr),
            Stmt::Var(data) => {
                self.declare(&data.name);
                if let Some(initializer) = &data.initializer {
                    self.resolve_expr(initializer);
                }
                self.define(&data.name);
            }
            Stmt::Block(data) => {
                self.begin_scope();
                self.resolve(&data.statements);
                self.end_scope();
            }
            Stmt::If(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.then_branch);
                if let Some(else_branch) = &data.else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.body);
                if let Some(increment) = &data.increment {
                    self.resolve_expr(increment);
                }
            }
            Stmt::Function(data) => {
                self.declare(&data.name);
                self.define(&data.name);
                self.resolve_function(data, FunctionType::Function);
            }
            Stmt::Return(data) => {
                if self.current_function == FunctionType::None {
                    ResolveError {
                        token: data.keyword.clone(),
                        message: "Cannot return from top-level code.".to_string(),
                    }
                    .throw();
                }

                if let Some(value) = &data.value {
                    if self.current_function == FunctionType::Initializer {
                        ResolveError {
                            token: data.keyword.clone(),
                            message: "Cannot return a value from an initializer.".to_string(),
                        }
                        .throw();
                    } else {
                        self.resolve_expr(value);
                    }
                }
            }
            Stmt::Class(data) => self.resolve_class(data),
            Stmt::Break | Stmt::Continue => {}
        }
    }

    fn resolve_function(&mut self, function: &FunctionData, kind: FunctionType) {
        let enclosing_function = mem::replace(&mut self.current_function, kind);

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_class(&mut self, class: &ClassData) {
        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(&class.name);
        self.define(&class.name);

        if let Some(superclass) = &class.superclass {
            let Expr::Variable(variable) = superclass else {
                unreachable!("parser only produces a Variable expression for a superclass")
            };

            if class.name.lexeme == variable.name.lexeme {
                ResolveError {
                    token: variable.name.clone(),
                    message: "A class cannot inherit from itself.".to_string(),
                }
                .throw();
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.scopes.last_mut().expect("scope just pushed").insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes.last_mut().expect("scope just pushed").insert("this".to_string(), true);

        for method in &class.methods {
            let kind = if method.name.lexeme == "init" { FunctionType::Initializer } else { FunctionType::Method };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if class.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Grouping(data) => self.resolve_expr(&data.expr),
            Expr::Unary(data) => self.resolve_expr(&data.right),
            Expr::Binary(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            Expr::Logical(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            Expr::Variable(data) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&data.name.lexeme) == Some(&false) {
                        ResolveError {
                            token: data.name.clone(),
                            message: "Cannot read local variable in its own initializer.".to_string(),
                        }
                        .throw();
                    }
                }
                self.resolve_local(data.id, &data.name);
            }
            Expr::Assign(data) => {
                self.resolve_expr(&data.value);
                self.resolve_local(data.id, &data.name);
            }
            Expr::Call(data) => {
                self.resolve_expr(&data.callee);
                for argument in &data.arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Get(data) => self.resolve_expr(&data.object),
            Expr::Set(data) => {
                self.resolve_expr(&data.value);
                self.resolve_expr(&data.object);
            }
            Expr::This(data) => {
                if self.current_class == ClassType::None {
                    ResolveError {
                        token: data.keyword.clone(),
                        message: "Cannot use 'this' outside of a class.".to_string(),
                    }
                    .throw();
                    return;
                }
                self.resolve_local(data.id, &data.keyword);
            }
            Expr::Super(data) => {
                match self.current_class {
                    ClassType::Subclass => {}
                    ClassType::None => ResolveError {
                        token: data.keyword.clone(),
                        message: "Cannot use 'super' outside of a class.".to_string(),
                    }
                    .throw(),
                    ClassType::Class => ResolveError {
                        token: data.keyword.clone(),
                        message: "Cannot use 'super' in a class with no superclass.".to_string(),
                    }
                    .throw(),
                }
                self.resolve_local(data.id, &data.keyword);
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };

        if scope.contains_key(&name.lexeme) {
            ResolveError {
                token: name.clone(),
                message: format!("Already a variable with name '{}' in this scope.", name.lexeme),
            }
            .throw();
        }
        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };
        scope.insert(name.lexeme.clone(), true);
    }

    fn resolve_local(&mut self, id: crate::expr::NodeId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, depth);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{NodeId, VariableData};
    use crate::stmt::VarData;
    use crate::token::Type;

    fn ident(name: &str) -> Token {
        Token::new(Type::Identifier, name.to_string(), None, 1)
    }

    #[test]
    fn resolves_a_local_read_to_depth_zero() {
        let mut interpreter = Interpreter::new();
        let mut resolver = Resolver::new(&mut interpreter);

        let var = Stmt::Var(VarData { name: ident("a"), initializer: None });
        let read = Stmt::Expression(crate::stmt::ExpressionData {
            expr: Expr::Variable(VariableData { id: NodeId(1), name: ident("a") }),
        });
        let block = Stmt::Block(crate::stmt::BlockData { statements: vec![var, read] });

        resolver.resolve(std::slice::from_ref(&block));

        assert_eq!(interpreter.locals_for_test().get(&NodeId(1)), Some(&0));
    }

    #[test]
    fn top_level_return_is_a_compile_error() {
        crate::error::reset();
        let mut interpreter = Interpreter::new();
        let mut resolver = Resolver::new(&mut interpreter);

        let ret = Stmt::Return(crate::stmt::ReturnData { keyword: ident("return"), value: None });
        resolver.resolve(&[ret]);

        assert!(crate::error::had_compile_error());
        crate::error::reset();
    }
}
