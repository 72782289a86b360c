//! Instance-validation collaborator
//!
//! This core never implements draft validation itself. [`SchemaChecker`]
//! wraps the `jsonschema` crate behind the narrow contract
//! `validate(data) -> Vec<Violation>`: the fully upgraded schema goes
//! in, a per-pointer violation list comes out. Custom keywords pass
//! through untouched — the validator ignores vocabulary it does not
//! know, so the whitelist never needs stripping.

use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use crate::compile::Compiled;
use crate::schema::Dialect;

/// One instance-validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Pointer of the offending value inside the instance
    pub pointer: String,
    /// Human-readable message
    pub message: String,
}

/// Validator construction errors.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The schema could not be compiled by the validator
    #[error("validator rejected the schema: {reason}")]
    Build {
        /// Underlying reason
        reason: String,
    },
}

/// A compiled instance validator for one schema document.
pub struct SchemaChecker {
    validator: Validator,
}

impl SchemaChecker {
    /// Build a checker for a schema document under the given dialect.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Build`] when the validator cannot compile
    /// the schema.
    pub fn new(schema: &Value, dialect: Dialect) -> Result<Self, CheckError> {
        let mut options = jsonschema::options();
        options.with_draft(match dialect {
            Dialect::Draft7 => jsonschema::Draft::Draft7,
            Dialect::Draft201909 => jsonschema::Draft::Draft201909,
            Dialect::Draft202012 => jsonschema::Draft::Draft202012,
        });
        let validator = options.build(schema).map_err(|e| CheckError::Build {
            reason: e.to_string(),
        })?;
        Ok(Self { validator })
    }

    /// Build a checker from a compilation result, using the upgraded
    /// schema and the detected dialect.
    pub fn for_compiled(compiled: &Compiled) -> Result<Self, CheckError> {
        Self::new(&compiled.tree.to_document(), compiled.dialect)
    }

    /// Validate an instance, returning every violation with its
    /// pointer.
    pub fn validate(&self, data: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(data)
            .map(|error| Violation {
                pointer: error.instance_path.to_string(),
                message: error.to_string(),
            })
            .collect()
    }

    /// Convenience predicate.
    pub fn is_valid(&self, data: &Value) -> bool {
        self.validator.is_valid(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::Compiler;
    use serde_json::json;

    fn checker(schema: Value) -> SchemaChecker {
        let compiled = Compiler::new().unwrap().compile(&schema).unwrap();
        SchemaChecker::for_compiled(&compiled).unwrap()
    }

    #[test]
    fn test_valid_instance() {
        let checker = checker(json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"]
        }));
        assert!(checker.validate(&json!({"name": "Ada"})).is_empty());
    }

    #[test]
    fn test_violations_carry_pointers() {
        let checker = checker(json!({
            "type": "object",
            "properties": {
                "person": {
                    "type": "object",
                    "properties": {"age": {"type": "integer"}}
                }
            }
        }));
        let violations = checker.validate(&json!({"person": {"age": "old"}}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].pointer, "/person/age");
    }

    #[test]
    fn test_custom_keywords_not_rejected() {
        let checker = checker(json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "visible": "`/kind` == 'person'",
                    "abstract": "`0/name`",
                    "rank": 2
                },
                "kind": {"type": "string"}
            }
        }));
        assert!(checker.is_valid(&json!({"name": "x", "kind": "person"})));
    }

    #[test]
    fn test_upgraded_schema_validates() {
        // additionalProperties:false became unevaluatedProperties:false
        let checker = checker(json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "additionalProperties": false
        }));
        assert!(checker.is_valid(&json!({"a": "x"})));
        assert!(!checker.is_valid(&json!({"a": "x", "b": 1})));
    }
}
