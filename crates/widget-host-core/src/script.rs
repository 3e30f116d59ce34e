//! Minimal reference sandbox engine.
//!
//! Evaluates widgets of the shape `return <integer expression>` (literals,
//! `+`, `-`, `*`) and `throw "message"`. This is NOT a widget language: it
//! exists so demos and integration tests can drive the full lifecycle
//! without a real execution engine.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

use widget_types::ExecutionInput;

use crate::sandbox::{SandboxEngine, SandboxInstance, SandboxSpec};

/// Engine producing [`ScriptInstance`]s.
#[derive(Debug, Default)]
pub struct ScriptEngine;

impl SandboxEngine for ScriptEngine {
    fn create_instance(&self, spec: SandboxSpec) -> Result<Box<dyn SandboxInstance>> {
        Ok(Box::new(ScriptInstance {
            code: spec.code,
            disposed: false,
        }))
    }
}

struct ScriptInstance {
    code: String,
    disposed: bool,
}

impl SandboxInstance for ScriptInstance {
    fn execute(&mut self, _input: &ExecutionInput) -> Result<Value> {
        if self.disposed {
            bail!("instance disposed");
        }
        evaluate(&self.code)
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

fn evaluate(code: &str) -> Result<Value> {
    let code = code.trim();
    if let Some(message) = code.strip_prefix("throw") {
        let message = message.trim().trim_matches(|c| c == '"' || c == ';');
        return Err(anyhow!("{message}"));
    }
    let body = code
        .strip_prefix("return")
        .with_context(|| format!("unsupported script: {code:?}"))?;
    let value = eval_sum(body.trim().trim_end_matches(';'))?;
    Ok(Value::from(value))
}

/// `+`/`-` over products, left to right.
fn eval_sum(expr: &str) -> Result<i64> {
    let mut total = 0i64;
    let mut pending_op = '+';
    let mut term = String::new();
    for c in expr.chars().chain(std::iter::once('+')) {
        match c {
            '+' | '-' => {
                if term.trim().is_empty() {
                    bail!("malformed expression {expr:?}");
                }
                let value = eval_product(term.trim())?;
                total = match pending_op {
                    '+' => total.checked_add(value),
                    _ => total.checked_sub(value),
                }
                .with_context(|| format!("arithmetic overflow in {expr:?}"))?;
                pending_op = c;
                term.clear();
            }
            _ => term.push(c),
        }
    }
    Ok(total)
}

fn eval_product(term: &str) -> Result<i64> {
    term.split('*').try_fold(1i64, |product, factor| {
        let factor: i64 = factor
            .trim()
            .parse()
            .with_context(|| format!("invalid factor {factor:?}"))?;
        product
            .checked_mul(factor)
            .with_context(|| format!("arithmetic overflow in {term:?}"))
    })
}
