//! The restricted binding environment for compiled expressions
//!
//! Every compiled expression receives one [`Sandbox`]. Identifier
//! resolution goes through an enumerable binding table: `value`,
//! `parent`, `key`, `schema`, `context`. Any other identifier resolves
//! to `null` — there is no reachable ambient capability, so the sandbox
//! boundary is structural rather than a blacklist.
//!
//! The pointer-dereference operator is bound to the sandbox position:
//! absolute pointers resolve from the document root, relative pointers
//! are rewritten against the current pointer first.

use serde_json::Value;

use crate::pointer;

/// Evaluation environment for one expression call.
#[derive(Debug, Clone, Default)]
pub struct Sandbox<'a> {
    data_root: Option<&'a Value>,
    at: String,
    value: Option<&'a Value>,
    parent: Option<&'a Value>,
    key: Option<String>,
    schema: Option<Value>,
    context: Option<&'a Value>,
}

impl<'a> Sandbox<'a> {
    /// A sandbox with no data bound. Every binding resolves to `null`
    /// and every dereference is "not found".
    pub fn empty() -> Sandbox<'static> {
        Sandbox::default()
    }

    /// Bind the sandbox at an absolute pointer inside a document.
    ///
    /// `value`, `parent`, and `key` are derived from the position; a
    /// pointer that does not resolve leaves `value` unbound.
    pub fn at_pointer(root: &'a Value, at: &str) -> Sandbox<'a> {
        let value = pointer::resolve(root, at);
        let (parent, key) = match pointer::split(at) {
            Some((parent_ptr, key)) => (
                pointer::resolve(root, &parent_ptr),
                Some(key.as_segment()),
            ),
            None => (None, None),
        };
        Sandbox {
            data_root: Some(root),
            at: at.to_string(),
            value,
            parent,
            key,
            schema: None,
            context: None,
        }
    }

    /// Attach a plain-object view of the owning schema node.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Attach the caller-supplied application-data object.
    pub fn with_context(mut self, context: &'a Value) -> Self {
        self.context = Some(context);
        self
    }

    /// The absolute pointer this sandbox is bound at.
    pub fn position(&self) -> &str {
        &self.at
    }

    /// Resolve an identifier through the binding table.
    ///
    /// Unknown names resolve to `null`, deliberately.
    pub fn lookup(&self, name: &str) -> Value {
        match name {
            "value" => self.value.cloned().unwrap_or(Value::Null),
            "parent" => self.parent.cloned().unwrap_or(Value::Null),
            "key" => match &self.key {
                Some(key) if key.bytes().all(|b| b.is_ascii_digit()) && !key.is_empty() => {
                    key.parse::<u64>().map(Value::from).unwrap_or(Value::Null)
                }
                Some(key) => Value::String(key.clone()),
                None => Value::Null,
            },
            "schema" => self.schema.clone().unwrap_or(Value::Null),
            "context" => self.context.cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Dereference a pointer token at the sandbox position.
    ///
    /// Absolute pointers resolve from the document root; relative
    /// pointers are rewritten against the current position. "Not found"
    /// yields `null`.
    pub fn deref(&self, token: &str) -> Value {
        let absolute = if pointer::is_relative(token) {
            match pointer::relative_to_absolute(&self.at, token) {
                Some(abs) => abs,
                None => return Value::Null,
            }
        } else {
            token.to_string()
        };
        match self.data_root {
            Some(root) => pointer::resolve(root, &absolute)
                .cloned()
                .unwrap_or(Value::Null),
            None => Value::Null,
        }
    }
}
