use std::rc::Rc;

use crate::eval::EvalError;
use crate::value::{EvalResult, Value};

/// Atoms starting with this prefix are resolved against the host instead
/// of the environment. The remainder splits at its last `/` into a
/// namespace path and a member name, e.g. `host.env/var`.
pub const FOREIGN_PREFIX: &str = "host.";

pub type ForeignFn = dyn Fn(Vec<Value>) -> EvalResult;

/// What a resolver hands back for one namespace member.
pub enum Foreign {
    /// A plain value, returned as-is.
    Constant(Value),
    /// An invocable member. The evaluator wraps it so its arguments are
    /// evaluated eagerly before the host function runs.
    Function(String, Rc<ForeignFn>),
}

/// The boundary through which the evaluator reaches host namespaces.
/// The evaluator is agnostic to what a namespace or member means.
pub trait ForeignResolver {
    fn resolve(&self, namespace: &str, member: &str) -> Result<Foreign, EvalError>;
}

/// The default resolver: every foreign reference fails.
pub struct RejectAll;

impl ForeignResolver for RejectAll {
    fn resolve(&self, namespace: &str, member: &str) -> Result<Foreign, EvalError> {
        Err(EvalError::ForeignResolution {
            namespace: namespace.to_owned(),
            member: member.to_owned(),
            reason: "no foreign resolver installed".to_owned(),
        })
    }
}
