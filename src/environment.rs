use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::object::Object;
use crate::token::Token;

/// A single lexical scope: a name-to-value map plus a link to the scope it
/// is nested in. A function value captures the environment active at its
/// *definition* site, not its call site, which is what gives closures their
/// lexical (rather than dynamic) scoping.
///
/// Environments are reference-counted because a closure and the scope that
/// encloses it are the same frame, shared between every value that captured
/// it; an environment must outlive the last closure or instance that can
/// still reach it.
#[derive(Debug)]
pub struct Environment {
    pub enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Object>,
}

pub type EnvRef = Rc<RefCell<Environment>>;

impl Environment {
    pub fn new(enclosing: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(Environment { enclosing, values: HashMap::new() }))
    }

    /// Defines or redefines `name` in this scope. Shadowing a name already
    /// in an outer scope is fine; the resolver is what rejects redeclaring a
    /// name within the *same* local scope, not the environment.
    pub fn define(&mut self, name: &str, value: Object) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(undefined(name))
    }

    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(undefined(name))
    }

    fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut current = Rc::clone(env);
        for _ in 0..distance {
            let parent = current
                .borrow()
                .enclosing
                .clone()
                .expect("resolver-reported depth to match an existing enclosing scope");
            current = parent;
        }
        current
    }

    /// Looks up `name` exactly `distance` scopes up, as computed by the
    /// resolver. No fallback search: a wrong distance is a bug in the
    /// resolver, not a runtime condition to recover from.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Object, RuntimeError> {
        let target = Self::ancestor(env, distance);
        let value = target.borrow().values.get(&name.lexeme).cloned();
        value.ok_or_else(|| undefined(name))
    }

    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: &Token,
        value: Object,
    ) -> Result<(), RuntimeError> {
        let target = Self::ancestor(env, distance);
        target.borrow_mut().values.insert(name.lexeme.clone(), value);
        Ok(())
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError {
        token: name.clone(),
        message: format!("Undefined variable '{}'.", name.lexeme),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use crate::token::Type;

    fn tok(name: &str) -> Token {
        Token::new(Type::Identifier, name.to_string(), None, 1)
    }

    #[test]
    fn reads_from_enclosing_scope() {
        let globals = Environment::new(None);
        globals.borrow_mut().define("a", Object::Literal(Literal::Number(1.0)));

        let local = Environment::new(Some(Rc::clone(&globals)));
        assert_eq!(local.borrow().get(&tok("a")).unwrap(), Object::Literal(Literal::Number(1.0)));
    }

    #[test]
    fn assign_requires_prior_definition() {
        let env = Environment::new(None);
        let err = env.borrow_mut().assign(&tok("missing"), Object::Literal(Literal::Nil));
        assert!(err.is_err());
    }

    #[test]
    fn get_at_walks_exact_depth() {
        let globals = Environment::new(None);
        globals.borrow_mut().define("a", Object::Literal(Literal::Number(1.0)));
        let middle = Environment::new(Some(Rc::clone(&globals)));
        let inner = Environment::new(Some(Rc::clone(&middle)));
        inner.borrow_mut().define("a", Object::Literal(Literal::Number(2.0)));

        assert_eq!(Environment::get_at(&inner, 0, &tok("a")).unwrap(), Object::Literal(Literal::Number(2.0)));
        assert_eq!(Environment::get_at(&inner, 2, &tok("a")).unwrap(), Object::Literal(Literal::Number(1.0)));
    }
}
