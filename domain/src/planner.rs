use serde_json::{json, Value};
use std::fmt::Display;
use std::future::Future;

/// Boundary to the language model: turns a free-text instruction into a raw,
/// untrusted `{"actions": [...], "reasoning": "..."}` document.
///
/// Implementations never fail. A transport or decoding problem comes back as
/// an empty action list with the reason in `reasoning` (see [`failed_plan`]).
pub trait ActionPlanner {
    fn get_actions(&self, prompt: &str) -> impl Future<Output = Value> + Send;
}

pub fn failed_plan(reason: impl Display) -> Value {
    json!({
        "actions": [],
        "reasoning": format!("Error: {reason}"),
    })
}

pub fn reasoning(raw: &Value) -> &str {
    raw.get("reasoning").and_then(Value::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_plan_has_no_actions() {
        let plan = failed_plan("connection refused");
        assert_eq!(plan["actions"], json!([]));
        assert_eq!(reasoning(&plan), "Error: connection refused");
    }

    #[test]
    fn reasoning_defaults_to_empty() {
        assert_eq!(reasoning(&json!({"actions": []})), "");
        assert_eq!(reasoning(&json!({"reasoning": 3})), "");
    }
}
