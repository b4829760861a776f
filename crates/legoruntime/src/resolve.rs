//! `{{stepId.field.subfield}}` interpolation against completed step results.
//!
//! Resolution never fails. A reference to a step that has not produced a
//! result, or to a field that does not exist, resolves to
//! [`Resolved::Undefined`]; it is logged and recorded so the caller can
//! report it, and the rest of the template still resolves.

use crate::mapping::step_into;
use legocore::Resolved;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::warn;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").expect("valid reference pattern"))
}

fn whole_reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\{\{([^}]+)\}\}$").expect("valid reference pattern"))
}

/// Resolves variable references against a snapshot of step results.
pub struct VariableResolver<'a> {
    results: &'a Map<String, Value>,
    unresolved: Vec<String>,
}

impl<'a> VariableResolver<'a> {
    pub fn new(results: &'a Map<String, Value>) -> Self {
        Self {
            results,
            unresolved: Vec::new(),
        }
    }

    /// Resolve every string inside `value`, recursing through objects and arrays.
    pub fn resolve(&mut self, value: &Value) -> Value {
        match value {
            Value::String(template) => self.resolve_str(template).into_json(),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.resolve(v)).collect()),
            Value::Object(map) => Value::Object(self.resolve_map(map)),
            other => other.clone(),
        }
    }

    pub fn resolve_map(&mut self, map: &Map<String, Value>) -> Map<String, Value> {
        map.iter()
            .map(|(key, value)| (key.clone(), self.resolve(value)))
            .collect()
    }

    /// Resolve one template string. A string that is exactly one reference
    /// keeps the referenced value's type; anything else becomes a string.
    pub fn resolve_str(&mut self, template: &str) -> Resolved {
        if let Some(caps) = whole_reference_pattern().captures(template) {
            return self.lookup(caps[1].trim());
        }
        if !template.contains("{{") {
            return Resolved::String(template.to_string());
        }

        let rendered = reference_pattern()
            .replace_all(template, |caps: &Captures| self.lookup(caps[1].trim()).render());
        Resolved::String(rendered.into_owned())
    }

    /// Look up `stepId.field.subfield` in the step results.
    pub fn lookup(&mut self, reference: &str) -> Resolved {
        let mut segments = reference.split('.');
        let step_id = segments.next().unwrap_or_default();

        let Some(mut current) = self.results.get(step_id) else {
            warn!("Step result not found: {}", step_id);
            self.unresolved.push(reference.to_string());
            return Resolved::Undefined;
        };

        for segment in segments {
            match step_into(current, segment) {
                Some(next) => current = next,
                None => {
                    warn!("Field '{}' not found in reference {{{{{}}}}}", segment, reference);
                    self.unresolved.push(reference.to_string());
                    return Resolved::Undefined;
                }
            }
        }

        Resolved::from(current.clone())
    }

    /// References that resolved to nothing, in encounter order.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }
}
