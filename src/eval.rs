use thiserror::Error;
use tracing::trace;

use crate::ast::SExpr;
use crate::env::ExecutionContext;
use crate::foreign::{Foreign, FOREIGN_PREFIX};
use crate::value::{Callable, EvalResult, Value};

/// An evaluation failure. The current `evaluate` call chain aborts at
/// the first error; errors raised inside an invoked callable propagate
/// unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("identifier not found: {0}")]
    UnknownIdentifier(String),

    #[error("invalid call: {0}")]
    InvalidCall(String),

    #[error("failed to resolve foreign member '{namespace}/{member}': {reason}")]
    ForeignResolution {
        namespace: String,
        member: String,
        reason: String,
    },

    /// An error raised by a host callable itself.
    #[error("{0}")]
    Host(String),
}

/// Reduce one node to a value against the given context.
pub fn eval(ctx: &mut ExecutionContext, expr: &SExpr) -> EvalResult {
    trace!(node = %expr, "eval");

    match expr {
        SExpr::Atom(name) => eval_atom(ctx, name),
        SExpr::Str(s) => Ok(Value::Str(s.clone())),
        SExpr::Seq(elements) => {
            let mut values = Vec::with_capacity(elements.len());
            for e in elements {
                values.push(eval(ctx, e)?);
            }
            Ok(Value::List(values))
        }
        SExpr::Map(entries) => eval_map(ctx, entries),
        SExpr::Group(elements) => eval_group(ctx, elements),
    }
}

/// Evaluate top-level forms in order, collecting results positionally.
pub fn eval_program(ctx: &mut ExecutionContext, forms: &[SExpr]) -> Result<Vec<Value>, EvalError> {
    forms.iter().map(|form| eval(ctx, form)).collect()
}

fn eval_atom(ctx: &mut ExecutionContext, name: &str) -> EvalResult {
    if let Some(path) = name.strip_prefix(FOREIGN_PREFIX) {
        return eval_foreign(ctx, path);
    }
    ctx.lookup(name)
}

fn eval_foreign(ctx: &mut ExecutionContext, path: &str) -> EvalResult {
    let (namespace, member) = path.rsplit_once('/').ok_or_else(|| EvalError::ForeignResolution {
        namespace: path.to_owned(),
        member: String::new(),
        reason: "missing '/' between namespace and member".to_owned(),
    })?;

    match ctx.resolver().resolve(namespace, member)? {
        Foreign::Constant(value) => Ok(value),
        Foreign::Function(name, func) => {
            Ok(Value::Callable(Callable::eager(name, move |args| func(args))))
        }
    }
}

/// Keys and values evaluate in source order; a later equal key overwrites
/// the earlier entry in place, so surviving entries keep their order.
fn eval_map(ctx: &mut ExecutionContext, entries: &[(SExpr, SExpr)]) -> EvalResult {
    let mut result: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let key = eval(ctx, k)?;
        let value = eval(ctx, v)?;
        match result.iter_mut().find(|entry| entry.0 == key) {
            Some(entry) => entry.1 = value,
            None => result.push((key, value)),
        }
    }
    Ok(Value::Map(result))
}

/// The call protocol: only the head is evaluated here. The tail is handed
/// to the callable as raw nodes; the callable alone decides whether, when,
/// and in what order to evaluate them.
fn eval_group(ctx: &mut ExecutionContext, elements: &[SExpr]) -> EvalResult {
    let Some((head, args)) = elements.split_first() else {
        return Err(EvalError::InvalidCall("empty group".to_owned()));
    };

    match eval(ctx, head)? {
        Value::Callable(callable) => callable.invoke(ctx, args),
        other => Err(EvalError::InvalidCall(format!(
            "{} is not a function",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foreign::{Foreign, ForeignFn, ForeignResolver};
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn eval_one(ctx: &mut ExecutionContext, src: &str) -> EvalResult {
        let forms = parse(src).unwrap();
        assert_eq!(forms.len(), 1, "expected a single form in {:?}", src);
        eval(ctx, &forms[0])
    }

    #[test]
    fn strings_evaluate_to_themselves() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(eval_one(&mut ctx, "\"a\\tb\"").unwrap(), Value::string("a\tb"));
    }

    #[test]
    fn unbound_atom_fails() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(
            eval_one(&mut ctx, "nope").unwrap_err(),
            EvalError::UnknownIdentifier("nope".to_owned())
        );
    }

    #[test]
    fn seqs_evaluate_eagerly_in_order() {
        let mut ctx = ExecutionContext::new();
        ctx.register("a", Value::string("1"));
        ctx.register("b", Value::string("2"));
        assert_eq!(
            eval_one(&mut ctx, "[a, b, \"c\"]").unwrap(),
            Value::List(vec![
                Value::string("1"),
                Value::string("2"),
                Value::string("c"),
            ])
        );
    }

    #[test]
    fn map_duplicate_keys_are_last_write_wins_in_place() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(
            eval_one(&mut ctx, "{\"a\": \"1\", \"b\": \"2\", \"a\": \"3\"}").unwrap(),
            Value::Map(vec![
                (Value::string("a"), Value::string("3")),
                (Value::string("b"), Value::string("2")),
            ])
        );
    }

    #[test]
    fn map_keys_may_be_any_value() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(
            eval_one(&mut ctx, "{[\"k\"]: \"v\"}").unwrap(),
            Value::Map(vec![(
                Value::List(vec![Value::string("k")]),
                Value::string("v"),
            )])
        );
    }

    #[test]
    fn empty_group_is_an_invalid_call() {
        let mut ctx = ExecutionContext::new();
        assert!(matches!(
            eval_one(&mut ctx, "()").unwrap_err(),
            EvalError::InvalidCall(_)
        ));
    }

    #[test]
    fn calling_a_non_function_is_an_invalid_call() {
        let mut ctx = ExecutionContext::new();
        ctx.register("x", Value::string("1"));
        assert!(matches!(
            eval_one(&mut ctx, "(x)").unwrap_err(),
            EvalError::InvalidCall(_)
        ));
    }

    #[test]
    fn callables_receive_raw_unevaluated_arguments() {
        let mut ctx = ExecutionContext::new();
        // Returns its first raw argument as syntax, touching nothing else.
        ctx.register(
            "first-node",
            Value::Callable(Callable::operative("first-node", |_, args| {
                Ok(Value::Expr(args[0].clone()))
            })),
        );

        // `x` is unbound; evaluating it would fail. It never is.
        let result = eval_one(&mut ctx, "(first-node (quote x))").unwrap();
        assert_eq!(
            result,
            Value::Expr(SExpr::Group(vec![SExpr::atom("quote"), SExpr::atom("x")]))
        );
    }

    #[test]
    fn deferred_arguments_are_never_evaluated_unless_asked() {
        let mut ctx = ExecutionContext::new();
        ctx.register("a", Value::string("fine"));
        // A probe that fails the test if it is ever invoked.
        ctx.register(
            "probe",
            Value::Callable(Callable::operative("probe", |_, _| {
                Err(EvalError::Host("probe argument was evaluated".to_owned()))
            })),
        );
        // Evaluates only its first argument.
        ctx.register(
            "first",
            Value::Callable(Callable::operative("first", |ctx, args| eval(ctx, &args[0]))),
        );

        assert_eq!(
            eval_one(&mut ctx, "(first a (probe) (also unbound))").unwrap(),
            Value::string("fine")
        );
    }

    #[test]
    fn host_errors_propagate_unchanged() {
        let mut ctx = ExecutionContext::new();
        ctx.register(
            "fail",
            Value::Callable(Callable::operative("fail", |_, _| {
                Err(EvalError::Host("boom".to_owned()))
            })),
        );
        assert_eq!(
            eval_one(&mut ctx, "(fail \"x\")").unwrap_err(),
            EvalError::Host("boom".to_owned())
        );
    }

    #[test]
    fn top_level_forms_collect_positionally() {
        let mut ctx = ExecutionContext::new();
        ctx.register("a", Value::string("1"));
        let forms = parse("a \"b\" [a]").unwrap();
        assert_eq!(
            eval_program(&mut ctx, &forms).unwrap(),
            vec![
                Value::string("1"),
                Value::string("b"),
                Value::List(vec![Value::string("1")]),
            ]
        );
    }

    struct FakeResolver;

    impl ForeignResolver for FakeResolver {
        fn resolve(&self, namespace: &str, member: &str) -> Result<Foreign, EvalError> {
            match (namespace, member) {
                ("math", "pi") => Ok(Foreign::Constant(Value::string("3.14159"))),
                ("strings", "upper") => {
                    let func: Rc<ForeignFn> = Rc::new(|args: Vec<Value>| match args.as_slice() {
                        [Value::Str(s)] => Ok(Value::Str(s.to_uppercase())),
                        _ => Err(EvalError::Host("upper expects one string".to_owned())),
                    });
                    Ok(Foreign::Function("strings/upper".to_owned(), func))
                }
                _ => Err(EvalError::ForeignResolution {
                    namespace: namespace.to_owned(),
                    member: member.to_owned(),
                    reason: "unknown member".to_owned(),
                }),
            }
        }
    }

    fn foreign_ctx() -> ExecutionContext {
        ExecutionContext::new().with_resolver(Rc::new(FakeResolver))
    }

    #[test]
    fn foreign_constants_resolve_to_their_value() {
        let mut ctx = foreign_ctx();
        assert_eq!(
            eval_one(&mut ctx, "host.math/pi").unwrap(),
            Value::string("3.14159")
        );
    }

    #[test]
    fn foreign_functions_evaluate_their_arguments_eagerly() {
        let mut ctx = foreign_ctx();
        ctx.register("word", Value::string("hey"));
        assert_eq!(
            eval_one(&mut ctx, "(host.strings/upper word)").unwrap(),
            Value::string("HEY")
        );
    }

    #[test]
    fn foreign_path_splits_at_the_last_slash() {
        struct PathResolver;
        impl ForeignResolver for PathResolver {
            fn resolve(&self, namespace: &str, member: &str) -> Result<Foreign, EvalError> {
                Ok(Foreign::Constant(Value::List(vec![
                    Value::string(namespace),
                    Value::string(member),
                ])))
            }
        }

        let mut ctx = ExecutionContext::new().with_resolver(Rc::new(PathResolver));
        assert_eq!(
            eval_one(&mut ctx, "host.a/b/c").unwrap(),
            Value::List(vec![Value::string("a/b"), Value::string("c")])
        );
    }

    #[test]
    fn unresolvable_foreign_references_fail() {
        let mut ctx = foreign_ctx();
        assert!(matches!(
            eval_one(&mut ctx, "host.math/tau").unwrap_err(),
            EvalError::ForeignResolution { .. }
        ));
        // No '/' at all: there is no member to resolve.
        assert!(matches!(
            eval_one(&mut ctx, "host.math").unwrap_err(),
            EvalError::ForeignResolution { .. }
        ));
    }
}
