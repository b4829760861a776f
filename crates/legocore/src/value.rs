use serde_json::{Number, Value};

/// Outcome of resolving a variable reference or template string.
///
/// A template that is exactly one `{{step.field}}` reference keeps the type of
/// the referenced value; any other template collapses to `String`.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// The referenced step or field does not exist (yet).
    Undefined,
    String(String),
    Number(Number),
    Json(Value),
}

impl Resolved {
    /// String form used when the value is spliced into a larger string.
    /// Undefined renders as the empty string.
    pub fn render(&self) -> String {
        match self {
            Resolved::Undefined => String::new(),
            Resolved::String(s) => s.clone(),
            Resolved::Number(n) => render_number(n),
            Resolved::Json(Value::String(s)) => s.clone(),
            Resolved::Json(Value::Null) => "null".to_string(),
            Resolved::Json(v) => v.to_string(),
        }
    }

    /// Convert into a JSON value; undefined becomes `null`.
    pub fn into_json(self) -> Value {
        match self {
            Resolved::Undefined => Value::Null,
            Resolved::String(s) => Value::String(s),
            Resolved::Number(n) => Value::Number(n),
            Resolved::Json(v) => v,
        }
    }
}

/// Integral floats render without a fractional part: `500.0` -> `"500"`.
fn render_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Resolved::String(s),
            Value::Number(n) => Resolved::Number(n),
            other => Resolved::Json(other),
        }
    }
}

impl From<Option<&Value>> for Resolved {
    fn from(value: Option<&Value>) -> Self {
        value.cloned().map(Resolved::from).unwrap_or(Resolved::Undefined)
    }
}
