use std::collections::HashMap;

use chrono::Local;

use crate::ast::SExpr;
use crate::env::ExecutionContext;
use crate::eval::{eval, EvalError};
use crate::value::{Callable, EvalResult, Value};

/// The standard bindings a host registers before evaluation. `quote`,
/// `if` and `do` keep raw access to their arguments; the rest go through
/// the eager adapter.
pub fn builtin() -> HashMap<String, Value> {
    let mut builtin = HashMap::new();
    builtin.insert(
        String::from("quote"),
        Value::Callable(Callable::operative("quote", builtin_quote)),
    );
    builtin.insert(
        String::from("if"),
        Value::Callable(Callable::operative("if", builtin_if)),
    );
    builtin.insert(
        String::from("do"),
        Value::Callable(Callable::operative("do", builtin_do)),
    );
    builtin.insert(
        String::from("println"),
        Value::Callable(Callable::eager("println", builtin_println)),
    );
    builtin.insert(
        String::from("time"),
        Value::Callable(Callable::eager("time", builtin_time)),
    );
    builtin.insert(
        String::from("typeof"),
        Value::Callable(Callable::eager("typeof", builtin_typeof)),
    );
    builtin.insert(
        String::from("str"),
        Value::Callable(Callable::eager("str", builtin_str)),
    );
    builtin
}

fn arity(name: &str, want: usize, got: usize) -> Result<(), EvalError> {
    if got == want {
        Ok(())
    } else {
        Err(EvalError::Host(format!(
            "{}: wrong number of arguments. got={}, want={}",
            name, got, want
        )))
    }
}

/// Returns its single argument as a syntax node, never evaluating it.
fn builtin_quote(_ctx: &mut ExecutionContext, args: &[SExpr]) -> EvalResult {
    arity("quote", 1, args.len())?;
    Ok(Value::Expr(args[0].clone()))
}

/// Evaluates the condition, then exactly one branch. The untaken branch
/// is never evaluated.
fn builtin_if(ctx: &mut ExecutionContext, args: &[SExpr]) -> EvalResult {
    if args.len() != 2 && args.len() != 3 {
        return Err(EvalError::Host(format!(
            "if: wrong number of arguments. got={}, want=2 or 3",
            args.len()
        )));
    }

    if eval(ctx, &args[0])?.is_truthy() {
        eval(ctx, &args[1])
    } else {
        match args.get(2) {
            Some(alternative) => eval(ctx, alternative),
            None => Ok(Value::Null),
        }
    }
}

/// Evaluates each argument in order and returns the last result.
fn builtin_do(ctx: &mut ExecutionContext, args: &[SExpr]) -> EvalResult {
    let mut last = Value::Null;
    for arg in args {
        last = eval(ctx, arg)?;
    }
    Ok(last)
}

fn builtin_println(args: Vec<Value>) -> EvalResult {
    println!(
        "{}",
        args.iter()
            .map(|arg| arg.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    );
    Ok(Value::Null)
}

fn builtin_time(args: Vec<Value>) -> EvalResult {
    arity("time", 0, args.len())?;
    Ok(Value::Str(Local::now().timestamp_millis().to_string()))
}

fn builtin_typeof(args: Vec<Value>) -> EvalResult {
    arity("typeof", 1, args.len())?;
    Ok(Value::string(args[0].type_name()))
}

fn builtin_str(args: Vec<Value>) -> EvalResult {
    let mut out = String::new();
    for arg in &args {
        out.push_str(&arg.to_string());
    }
    Ok(Value::Str(out))
}
