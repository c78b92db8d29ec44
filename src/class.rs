use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::function::Function;
use crate::interpreter::Interpreter;
use crate::object::Object;
use crate::token::Token;

/// A class declaration: its name, the methods it defines, and (optionally)
/// the class it inherits from. Shared behind `Rc<RefCell<_>>` because every
/// instance it constructs holds a reference back to it, and a subclass holds
/// a reference to its superclass.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<RefCell<Class>>>,
    pub methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<RefCell<Class>>>,
        methods: HashMap<String, Rc<Function>>,
    ) -> Class {
        Class { name, superclass, methods }
    }

    /// Looks up a method by name on this class, falling back through the
    /// superclass chain. Does not bind `this`; callers that hand the result
    /// back to Lox code must bind it to an instance first.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass.as_ref().and_then(|superclass| superclass.borrow().find_method(name))
    }

    /// A class's arity is its initializer's, or zero if it declares none.
    pub fn arity(&self) -> usize {
        self.find_method("init").map(|init| init.arity()).unwrap_or(0)
    }

    /// Constructs a new instance and runs `init` on it, if the class (or one
    /// of its ancestors) declares one. Takes the class by `Rc` rather than
    /// `&self` because the new instance needs to hold a clone of it.
    pub fn instantiate(
        class: &Rc<RefCell<Class>>,
        interpreter: &mut Interpreter,
        arguments: Vec<Object>,
    ) -> Result<Object, RuntimeError> {
        let instance = Instance::new(Rc::clone(class));

        let initializer = class.borrow().find_method("init");
        if let Some(initializer) = initializer {
            let bound = initializer.bind(Rc::clone(&instance));
            bound.call(interpreter, arguments)?;
        }

        Ok(Object::Instance(instance))
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

/// A runtime instance of a [`Class`]: its own field map plus a reference to
/// the class that supplies its methods.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<RefCell<Class>>,
    fields: HashMap<String, Object>,
}

impl Instance {
    pub fn new(class: Rc<RefCell<Class>>) -> Rc<RefCell<Instance>> {
        Rc::new(RefCell::new(Instance { class, fields: HashMap::new() }))
    }

    /// Fields shadow methods. A found method is bound to `instance` before
    /// being handed back, so a later call to it sees the right `this`.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let method = instance.borrow().class.borrow().find_method(&name.lexeme);
        if let Some(method) = method {
            let bound = method.bind(Rc::clone(instance));
            return Ok(Object::Function(Rc::new(bound)));
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined property '{}'.", name.lexeme),
        })
    }

    pub fn set(&mut self, name: &Token, value: Object) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<instance of {}>", self.class.borrow().name)
    }
}
