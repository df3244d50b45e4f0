use std::io;
use std::io::{BufRead, Write};
use std::rc::Rc;

use clap::{Arg, Command};
use colored::Colorize;

use slip::builtin::builtin;
use slip::env::ExecutionContext;
use slip::eval::{eval, EvalError};
use slip::foreign::{Foreign, ForeignFn, ForeignResolver};
use slip::parser::parse;
use slip::value::Value;

/// Exposes `host.env/var` so scripts can read process environment
/// variables through the foreign path.
struct EnvResolver;

impl ForeignResolver for EnvResolver {
    fn resolve(&self, namespace: &str, member: &str) -> Result<Foreign, EvalError> {
        match (namespace, member) {
            ("env", "var") => {
                let func: Rc<ForeignFn> = Rc::new(|args: Vec<Value>| match args.as_slice() {
                    [Value::Str(name)] => std::env::var(name)
                        .map(Value::Str)
                        .map_err(|e| EvalError::Host(format!("env/var {}: {}", name, e))),
                    _ => Err(EvalError::Host("env/var expects one string argument".to_owned())),
                });
                Ok(Foreign::Function("env/var".to_owned(), func))
            }
            _ => Err(EvalError::ForeignResolution {
                namespace: namespace.to_owned(),
                member: member.to_owned(),
                reason: "unknown host member".to_owned(),
            }),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let matches = Command::new("slip")
        .about("A small s-expression language where the callee decides when arguments are evaluated")
        .arg(Arg::new("file").help("Script to run").index(1))
        .arg(
            Arg::new("eval")
                .short('e')
                .long("eval")
                .takes_value(true)
                .help("Evaluate a single expression and print its result"),
        )
        .get_matches();

    let mut ctx = ExecutionContext::from(builtin()).with_resolver(Rc::new(EnvResolver));

    if let Some(src) = matches.value_of("eval") {
        run(&mut ctx, src, true);
    } else if let Some(path) = matches.value_of("file") {
        match std::fs::read_to_string(path) {
            Ok(src) => run(&mut ctx, &src, false),
            Err(e) => {
                eprintln!("{}", format!("{}: {}", path, e).red());
                std::process::exit(1);
            }
        }
    } else {
        repl(&mut ctx);
    }
}

fn run(ctx: &mut ExecutionContext, src: &str, print_results: bool) {
    let forms = match parse(src) {
        Ok(forms) => forms,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            std::process::exit(1);
        }
    };

    for form in &forms {
        match eval(ctx, form) {
            Ok(value) => {
                if print_results && value != Value::Null {
                    println!("{}", value);
                }
            }
            Err(e) => {
                eprintln!("{}", e.to_string().red());
                std::process::exit(1);
            }
        }
    }
}

fn repl(ctx: &mut ExecutionContext) {
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}", e.to_string().red());
                break;
            }
        }

        let forms = match parse(&line) {
            Ok(forms) => forms,
            Err(e) => {
                eprintln!("{}", e.to_string().red());
                continue;
            }
        };

        for form in &forms {
            match eval(ctx, form) {
                Ok(value) => println!("{}", value),
                Err(e) => {
                    eprintln!("{}", e.to_string().red());
                    break;
                }
            }
        }
    }
}
