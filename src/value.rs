use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;

use colored::Colorize;

use crate::ast::SExpr;
use crate::env::ExecutionContext;
use crate::eval::{eval, EvalError};

pub type EvalResult = Result<Value, EvalError>;

/// The signature every registered callable satisfies: it receives the
/// execution context and its arguments as raw, unevaluated nodes, and
/// decides for itself whether and when to evaluate each of them.
pub type CallableFn = dyn Fn(&mut ExecutionContext, &[SExpr]) -> EvalResult;

#[derive(Clone)]
pub struct Callable {
    name: String,
    func: Rc<CallableFn>,
}

impl Callable {
    /// A callable that gets its arguments as raw nodes.
    pub fn operative(
        name: impl Into<String>,
        f: impl Fn(&mut ExecutionContext, &[SExpr]) -> EvalResult + 'static,
    ) -> Self {
        Callable {
            name: name.into(),
            func: Rc::new(f),
        }
    }

    /// The eager adapter: evaluates every argument left to right, then
    /// delegates. Most bindings want these conventional call semantics.
    pub fn eager(
        name: impl Into<String>,
        f: impl Fn(Vec<Value>) -> EvalResult + 'static,
    ) -> Self {
        Self::operative(name, move |ctx, args| {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(eval(ctx, arg)?);
            }
            f(evaluated)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, ctx: &mut ExecutionContext, args: &[SExpr]) -> EvalResult {
        (self.func)(ctx, args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<callable {}>", self.name)
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

/// A runtime value produced by evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Str(String),
    /// A syntax node handed around as a value, e.g. by `quote`.
    Expr(SExpr),
    List(Vec<Value>),
    /// Order-preserving; duplicate keys were already resolved last-wins.
    Map(Vec<(Value, Value)>),
    Callable(Callable),
}

impl Value {
    pub fn string<A: AsRef<str>>(s: A) -> Value {
        Value::Str(s.as_ref().to_owned())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Str(_) => "string",
            Value::Expr(_) => "expr",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Callable(_) => "function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Str(s) => s != "false",
            Value::List(elements) => !elements.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str(format!("{}", "null".cyan()).as_str()),
            Value::Str(s) => write!(f, "{}", s),
            Value::Expr(e) => write!(f, "{}", e),
            Value::List(elements) => {
                write!(f, "[")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Callable(c) => write!(f, "{}() {{ [native code] }}", c.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn eager_adapter_evaluates_arguments_in_order() {
        let mut ctx = ExecutionContext::new();
        ctx.register("a", Value::string("1"));
        ctx.register("b", Value::string("2"));

        let join = Callable::eager("join", |args| {
            let parts: Vec<String> = args.iter().map(|v| v.to_string()).collect();
            Ok(Value::Str(parts.join("+")))
        });

        let result = join
            .invoke(&mut ctx, &[SExpr::atom("a"), SExpr::atom("b")])
            .unwrap();
        assert_eq!(result, Value::string("1+2"));
    }

    #[test]
    fn eager_adapter_stops_at_the_first_argument_error() {
        let mut ctx = ExecutionContext::new();
        let join = Callable::eager("join", |_| Ok(Value::Null));

        let err = join.invoke(&mut ctx, &[SExpr::atom("missing")]).unwrap_err();
        assert_eq!(err, EvalError::UnknownIdentifier("missing".to_owned()));
    }

    #[test]
    fn callables_compare_by_identity() {
        let a = Callable::operative("f", |_, _| Ok(Value::Null));
        let b = Callable::operative("f", |_, _| Ok(Value::Null));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::string("false").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::string("").is_truthy());
        assert!(Value::string("true").is_truthy());
        assert!(Value::List(vec![Value::Null]).is_truthy());
    }
}
