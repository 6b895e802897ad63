//! Section schema definitions.
//!
//! A [`SectionSchema`] is the declarative contract for one request section
//! (body, path params or query). It is built once at startup with the
//! [`FieldRule`] builders and then shared read-only between requests.
//!
//! Validation walks the input once, collecting every violation instead of
//! stopping at the first one. Undeclared keys are dropped from the output,
//! absent optional fields receive their defaults, and string input is
//! coerced to numbers and booleans where the rule asks for them.

use std::fmt;

use regex::Regex;
use serde_json::{Map, Value, json};

/// The value type a field accepts.
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    /// A nested object with its own declared fields.
    Object(SectionSchema),
    /// An array whose items all follow the same rule.
    Array(Box<FieldRule>),
    /// Anything, including `null`.
    Any,
}

impl FieldKind {
    /// JSON Schema type name, `None` for [`FieldKind::Any`].
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Number => Some("number"),
            Self::Integer => Some("integer"),
            Self::Boolean => Some("boolean"),
            Self::Object(_) => Some("object"),
            Self::Array(_) => Some("array"),
            Self::Any => None,
        }
    }
}

/// Whether a field must, may, or must not be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    #[default]
    Optional,
    Required,
    Forbidden,
}

/// A regex constraint. The source is kept so definition checks can report
/// patterns that failed to compile.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Result<Regex, String>,
}

impl Pattern {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            compiled: Regex::new(source).map_err(|e| e.to_string()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compile error, if the pattern is not a valid regex.
    pub fn error(&self) -> Option<&str> {
        self.compiled.as_ref().err().map(String::as_str)
    }
}

/// A cross-field rule: the field's effective rule depends on the value of a
/// sibling in the same object.
///
/// `then` and `otherwise` replace the base rule entirely when selected.
#[derive(Debug, Clone)]
pub struct Condition {
    pub(crate) sibling: String,
    pub(crate) is: Value,
    pub(crate) then: Box<FieldRule>,
    pub(crate) otherwise: Option<Box<FieldRule>>,
}

impl Condition {
    pub fn new(sibling: impl Into<String>, is: impl Into<Value>, then: FieldRule) -> Self {
        Self {
            sibling: sibling.into(),
            is: is.into(),
            then: Box::new(then),
            otherwise: None,
        }
    }

    pub fn otherwise(mut self, rule: FieldRule) -> Self {
        self.otherwise = Some(Box::new(rule));
        self
    }

    pub fn sibling(&self) -> &str {
        &self.sibling
    }
}

/// Validation rule for a single field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub(crate) kind: FieldKind,
    pub(crate) presence: Presence,
    pub(crate) default: Option<Value>,
    pub(crate) valid: Option<Vec<Value>>,
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) pattern: Option<Pattern>,
    pub(crate) allow_empty: bool,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) description: Option<String>,
}

impl FieldRule {
    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            presence: Presence::Optional,
            default: None,
            valid: None,
            min: None,
            max: None,
            pattern: None,
            allow_empty: false,
            conditions: Vec::new(),
            description: None,
        }
    }

    pub fn string() -> Self {
        Self::of(FieldKind::String)
    }

    pub fn number() -> Self {
        Self::of(FieldKind::Number)
    }

    pub fn integer() -> Self {
        Self::of(FieldKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(FieldKind::Boolean)
    }

    pub fn object(schema: SectionSchema) -> Self {
        Self::of(FieldKind::Object(schema))
    }

    pub fn array(items: FieldRule) -> Self {
        Self::of(FieldKind::Array(Box::new(items)))
    }

    pub fn any() -> Self {
        Self::of(FieldKind::Any)
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    pub fn forbidden(mut self) -> Self {
        self.presence = Presence::Forbidden;
        self
    }

    /// Value inserted when the field is absent.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restrict the field to an allowed set of values.
    pub fn valid<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.valid = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Lower bound: numeric value, string length, or item count.
    pub fn min(mut self, min: impl Into<f64>) -> Self {
        self.min = Some(min.into());
        self
    }

    /// Upper bound: numeric value, string length, or item count.
    pub fn max(mut self, max: impl Into<f64>) -> Self {
        self.max = Some(max.into());
        self
    }

    pub fn pattern(mut self, regex: &str) -> Self {
        self.pattern = Some(Pattern::new(regex));
        self
    }

    /// Accept `""` for string fields (rejected by default).
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Pick the rule that applies given the sibling values of `object`.
    ///
    /// Conditions chain in declaration order: the first one whose sibling
    /// matches yields its `then`; a non-matching condition with an
    /// `otherwise` yields that; otherwise evaluation moves on. When nothing
    /// is selected the base rule applies.
    pub(crate) fn resolve<'a>(&'a self, object: &Map<String, Value>, schema: &SectionSchema) -> &'a FieldRule {
        for condition in &self.conditions {
            let sibling = object
                .get(&condition.sibling)
                .or_else(|| schema.get(&condition.sibling).and_then(|r| r.default.as_ref()));
            if sibling.is_some_and(|v| loosely_equal(v, &condition.is)) {
                return &condition.then;
            }
            if let Some(otherwise) = &condition.otherwise {
                return otherwise;
            }
        }
        self
    }

    /// Check a standalone value against this rule, ignoring presence and
    /// conditions. `label` names the value in messages.
    pub(crate) fn check_value(&self, label: &str, value: &Value) -> Result<Value, Vec<SchemaViolation>> {
        let mut walker = Walker::new(&[PathSegment::Key(label.to_string())]);
        match walker.value(self, value) {
            Some(clean) if walker.violations.is_empty() => Ok(clean),
            _ => Err(walker.violations),
        }
    }

    fn to_json_schema(&self) -> Value {
        let mut out = Map::new();
        if let Some(name) = self.kind.type_name() {
            out.insert("type".into(), json!(name));
        }
        if let Some(description) = &self.description {
            out.insert("description".into(), json!(description));
        }
        if let Some(values) = &self.valid {
            out.insert("enum".into(), Value::Array(values.clone()));
        }
        if let Some(default) = &self.default {
            out.insert("default".into(), default.clone());
        }
        let (min_key, max_key) = match &self.kind {
            FieldKind::String => ("minLength", "maxLength"),
            FieldKind::Array(_) => ("minItems", "maxItems"),
            _ => ("minimum", "maximum"),
        };
        if let Some(min) = self.min {
            out.insert(min_key.into(), number_value(min));
        }
        if let Some(max) = self.max {
            out.insert(max_key.into(), number_value(max));
        }
        if let FieldKind::String = self.kind {
            if !self.allow_empty && self.min.is_none() {
                out.insert("minLength".into(), json!(1));
            }
        }
        if let Some(pattern) = &self.pattern {
            out.insert("pattern".into(), json!(pattern.source));
        }
        match &self.kind {
            FieldKind::Object(schema) => {
                if let Value::Object(nested) = schema.to_json_schema() {
                    out.extend(nested);
                }
            }
            FieldKind::Array(items) => {
                out.insert("items".into(), items.to_json_schema());
            }
            _ => {}
        }
        Value::Object(out)
    }
}

/// One segment of the path to a violating value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A single rule violation reported by a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Location of the offending value, outermost segment first.
    pub path: Vec<PathSegment>,
    /// Machine-readable rule identifier, e.g. `any.required`.
    pub code: &'static str,
    /// Message using the quoted-label convention: `"age" must be a number`.
    pub message: String,
}

impl SchemaViolation {
    /// Leaf key of the path, ignoring array indices.
    pub fn leaf_key(&self) -> Option<&str> {
        self.path.iter().rev().find_map(|segment| match segment {
            PathSegment::Key(key) => Some(key.as_str()),
            PathSegment::Index(_) => None,
        })
    }
}

/// Declarative schema for one object-shaped request section.
///
/// Field order is preserved so violations are reported in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SectionSchema {
    fields: Vec<(String, FieldRule)>,
}

impl SectionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field, replacing any earlier declaration with the same name.
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = rule,
            None => self.fields.push((name, rule)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate `input` on its own. Violation paths are relative to the
    /// section and the root is labelled `value`.
    pub fn validate(&self, input: &Value) -> Result<Map<String, Value>, Vec<SchemaViolation>> {
        self.validate_at(&[], input)
    }

    /// Validate `input` located at `prefix`. Labels in messages are built
    /// from the part of the path below the prefix.
    pub(crate) fn validate_at(
        &self,
        prefix: &[PathSegment],
        input: &Value,
    ) -> Result<Map<String, Value>, Vec<SchemaViolation>> {
        let mut walker = Walker::new(prefix);
        let sanitized = walker.object(self, input);
        match sanitized {
            Some(map) if walker.violations.is_empty() => Ok(map),
            _ => Err(walker.violations),
        }
    }

    /// Render the schema as a JSON Schema object document.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        let mut all_of = Vec::new();

        for (name, rule) in &self.fields {
            properties.insert(name.clone(), rule.to_json_schema());
            if rule.presence == Presence::Required {
                required.push(json!(name));
            }
            for condition in &rule.conditions {
                let mut clause = Map::new();
                clause.insert(
                    "if".into(),
                    json!({
                        "properties": { condition.sibling.clone(): { "const": condition.is.clone() } },
                        "required": [condition.sibling.clone()],
                    }),
                );
                clause.insert("then".into(), presence_clause(name, &condition.then));
                if let Some(otherwise) = &condition.otherwise {
                    clause.insert("else".into(), presence_clause(name, otherwise));
                }
                all_of.push(Value::Object(clause));
            }
        }

        let mut out = Map::new();
        out.insert("type".into(), json!("object"));
        out.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            out.insert("required".into(), Value::Array(required));
        }
        if !all_of.is_empty() {
            out.insert("allOf".into(), Value::Array(all_of));
        }
        out.insert("additionalProperties".into(), json!(false));
        Value::Object(out)
    }
}

fn presence_clause(name: &str, rule: &FieldRule) -> Value {
    let mut clause = Map::new();
    clause.insert(
        "properties".into(),
        json!({ name: rule.to_json_schema() }),
    );
    match rule.presence {
        Presence::Required => {
            clause.insert("required".into(), json!([name]));
        }
        Presence::Forbidden => {
            clause.insert("not".into(), json!({ "required": [name] }));
        }
        Presence::Optional => {}
    }
    Value::Object(clause)
}

/// Single-pass walker that sanitizes values and collects violations.
struct Walker {
    path: Vec<PathSegment>,
    label_from: usize,
    violations: Vec<SchemaViolation>,
}

impl Walker {
    fn new(prefix: &[PathSegment]) -> Self {
        Self {
            path: prefix.to_vec(),
            label_from: prefix.len(),
            violations: Vec::new(),
        }
    }

    fn label(&self) -> String {
        let own = &self.path[self.label_from..];
        if own.is_empty() {
            return match self.path.last() {
                Some(PathSegment::Key(key)) => key.clone(),
                _ => "value".to_string(),
            };
        }
        let mut label = String::new();
        for segment in own {
            match segment {
                PathSegment::Key(key) => {
                    if !label.is_empty() {
                        label.push('.');
                    }
                    label.push_str(key);
                }
                PathSegment::Index(index) => label.push_str(&format!("[{index}]")),
            }
        }
        label
    }

    fn report(&mut self, code: &'static str, detail: impl fmt::Display) {
        let message = format!("\"{}\" {}", self.label(), detail);
        self.violations.push(SchemaViolation {
            path: self.path.clone(),
            code,
            message,
        });
    }

    fn object(&mut self, schema: &SectionSchema, input: &Value) -> Option<Map<String, Value>> {
        let Value::Object(object) = input else {
            self.report("object.base", "must be of type object");
            return None;
        };

        let before = self.violations.len();
        let mut sanitized = Map::new();
        for (name, base_rule) in &schema.fields {
            let rule = base_rule.resolve(object, schema);
            self.path.push(PathSegment::Key(name.clone()));
            match (object.get(name), rule.presence) {
                (None, Presence::Required) => self.report("any.required", "is required"),
                (None, _) => {
                    if rule.presence != Presence::Forbidden {
                        if let Some(default) = &rule.default {
                            sanitized.insert(name.clone(), default.clone());
                        }
                    }
                }
                (Some(_), Presence::Forbidden) => self.report("any.unknown", "is not allowed"),
                (Some(value), _) => {
                    if let Some(clean) = self.value(rule, value) {
                        sanitized.insert(name.clone(), clean);
                    }
                }
            }
            self.path.pop();
        }

        (self.violations.len() == before).then_some(sanitized)
    }

    /// Check one present value. Reports at most one violation for scalars;
    /// containers report per nested value.
    fn value(&mut self, rule: &FieldRule, input: &Value) -> Option<Value> {
        let value = match &rule.kind {
            FieldKind::String => match input {
                Value::String(s) => {
                    if s.is_empty() && !rule.allow_empty {
                        self.report("string.empty", "is not allowed to be empty");
                        return None;
                    }
                    Value::String(s.clone())
                }
                _ => {
                    self.report("string.base", "must be a string");
                    return None;
                }
            },
            FieldKind::Number => match coerce_number(input) {
                Some(n) if !is_safe_number(&n) => {
                    self.report("number.unsafe", "must be a safe number");
                    return None;
                }
                Some(n) => n,
                None => {
                    self.report("number.base", "must be a number");
                    return None;
                }
            },
            FieldKind::Integer => match coerce_number(input) {
                Some(n) if !is_safe_number(&n) => {
                    self.report("number.unsafe", "must be a safe number");
                    return None;
                }
                Some(n) if n.as_f64().is_some_and(|f| f.fract() == 0.0) => integral(n),
                Some(_) => {
                    self.report("number.integer", "must be an integer");
                    return None;
                }
                None => {
                    self.report("number.base", "must be a number");
                    return None;
                }
            },
            FieldKind::Boolean => match coerce_bool(input) {
                Some(b) => Value::Bool(b),
                None => {
                    self.report("boolean.base", "must be a boolean");
                    return None;
                }
            },
            FieldKind::Object(schema) => return self.object(schema, input).map(Value::Object),
            FieldKind::Array(items) => return self.array(rule, items, input),
            FieldKind::Any => input.clone(),
        };

        if let Some(allowed) = &rule.valid {
            if !allowed.iter().any(|candidate| loosely_equal(&value, candidate)) {
                let listed: Vec<String> = allowed.iter().map(display_value).collect();
                self.report("any.only", format!("must be one of [{}]", listed.join(", ")));
                return None;
            }
        }

        self.bounds(rule, &value)?;

        if let (Some(pattern), Value::String(s)) = (&rule.pattern, &value) {
            if let Ok(regex) = &pattern.compiled {
                if !regex.is_match(s) {
                    self.report(
                        "string.pattern.base",
                        format!(
                            "with value \"{s}\" fails to match the required pattern: /{}/",
                            pattern.source
                        ),
                    );
                    return None;
                }
            }
        }

        Some(value)
    }

    fn array(&mut self, rule: &FieldRule, items: &FieldRule, input: &Value) -> Option<Value> {
        let Value::Array(elements) = input else {
            self.report("array.base", "must be an array");
            return None;
        };

        let count = elements.len() as f64;
        if let Some(min) = rule.min.filter(|min| count < *min) {
            self.report("array.min", format!("must contain at least {} items", format_bound(min)));
            return None;
        }
        if let Some(max) = rule.max.filter(|max| count > *max) {
            self.report(
                "array.max",
                format!("must contain less than or equal to {} items", format_bound(max)),
            );
            return None;
        }

        let before = self.violations.len();
        let mut sanitized = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            self.path.push(PathSegment::Index(index));
            if element.is_null() && !matches!(items.kind, FieldKind::Any) {
                self.report("array.sparse", "must not be a sparse array item");
            } else if let Some(clean) = self.value(items, element) {
                sanitized.push(clean);
            }
            self.path.pop();
        }
        (self.violations.len() == before).then_some(Value::Array(sanitized))
    }

    fn bounds(&mut self, rule: &FieldRule, value: &Value) -> Option<()> {
        let (measure, unit) = match value {
            Value::Number(n) => (n.as_f64()?, None),
            Value::String(s) => (s.chars().count() as f64, Some("characters long")),
            _ => return Some(()),
        };

        if let Some(min) = rule.min.filter(|min| measure < *min) {
            match unit {
                Some(unit) => self.report(
                    "string.min",
                    format!("length must be at least {} {unit}", format_bound(min)),
                ),
                None => self.report(
                    "number.min",
                    format!("must be greater than or equal to {}", format_bound(min)),
                ),
            }
            return None;
        }
        if let Some(max) = rule.max.filter(|max| measure > *max) {
            match unit {
                Some(unit) => self.report(
                    "string.max",
                    format!("length must be less than or equal to {} {unit}", format_bound(max)),
                ),
                None => self.report(
                    "number.max",
                    format!("must be less than or equal to {}", format_bound(max)),
                ),
            }
            return None;
        }
        Some(())
    }
}

/// Accept JSON numbers as-is and numeric strings as parsed numbers.
fn coerce_number(input: &Value) -> Option<Value> {
    match input {
        Value::Number(_) => Some(input.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(i) = trimmed.parse::<i64>() {
                return Some(Value::from(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
        }
        _ => None,
    }
}

/// Largest magnitude a JSON number can carry without losing integer precision.
const MAX_SAFE_NUMBER: f64 = 9_007_199_254_740_991.0;

fn is_safe_number(value: &Value) -> bool {
    value.as_f64().is_some_and(|f| f.abs() <= MAX_SAFE_NUMBER)
}

/// Normalise an integral number so `3.0` is emitted as `3`.
fn integral(value: Value) -> Value {
    match value.as_i64() {
        Some(_) => value,
        None => match value.as_f64() {
            Some(f) if f >= i64::MIN as f64 && f <= i64::MAX as f64 => Value::from(f as i64),
            _ => value,
        },
    }
}

fn coerce_bool(input: &Value) -> Option<bool> {
    match input {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Equality that treats `1` and `1.0` as equal and compares string input
/// against its typed counterpart (`"true"` matches `true`).
pub(crate) fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(_), Value::Number(_)) => {
            coerce_number(actual).is_some_and(|n| n.as_f64() == expected.as_f64())
        }
        (Value::String(_), Value::Bool(b)) => coerce_bool(actual) == Some(*b),
        _ => actual == expected,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

fn number_value(bound: f64) -> Value {
    if bound.fract() == 0.0 {
        json!(bound as i64)
    } else {
        json!(bound)
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
