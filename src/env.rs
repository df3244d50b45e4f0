use std::collections::HashMap;
use std::rc::Rc;

use crate::eval::EvalError;
use crate::foreign::{ForeignResolver, RejectAll};
use crate::value::Value;

type Bindings = HashMap<String, Value>;

/// One execution context: a flat identifier table plus the resolver used
/// for foreign-namespace atoms. Contexts are independent; nothing is
/// shared between two of them unless the host registers a shared value
/// into both.
pub struct ExecutionContext {
    env: Bindings,
    resolver: Rc<dyn ForeignResolver>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::from(HashMap::new())
    }

    pub fn from(env: Bindings) -> Self {
        ExecutionContext {
            env,
            resolver: Rc::new(RejectAll),
        }
    }

    pub fn with_resolver(mut self, resolver: Rc<dyn ForeignResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Bind `name` to a host-provided value, overwriting any previous
    /// binding. Only host bootstrap code calls this; ordinary evaluation
    /// never mutates the table.
    pub fn register(&mut self, name: impl Into<String>, value: Value) {
        self.env.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        self.env
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownIdentifier(name.to_owned()))
    }

    pub fn resolver(&self) -> Rc<dyn ForeignResolver> {
        Rc::clone(&self.resolver)
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
