//! CLI command implementations
//!
//! Each command loads a schema document, compiles it, and reports to
//! stdout. Diagnostics never panic the process; a non-empty error list
//! surfaces as a non-zero exit through [`CliError`].

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::compile::{Compiled, Compiler};
use crate::data::DataTree;
use crate::schema;
use crate::validate::SchemaChecker;

use super::errors::{CliError, CliResult};

/// Load and compile a schema document.
fn compile_document(path: &Path) -> CliResult<Compiled> {
    let document = schema::load_file(path)?;
    let compiler = Compiler::new()?;
    let compiled = compiler.compile(&document)?;
    Ok(compiled)
}

fn print_diagnostics(compiled: &Compiled) {
    for error in &compiled.errors {
        println!("error: {}", error);
    }
    for warning in &compiled.warnings {
        println!("warning: {}", warning);
    }
}

/// `formtree compile <schema>`
pub fn compile(path: &Path) -> CliResult<()> {
    let compiled = compile_document(path)?;
    print_diagnostics(&compiled);
    println!(
        "compiled {} node(s), {} error(s), {} warning(s)",
        compiled.tree.len(),
        compiled.errors.len(),
        compiled.warnings.len()
    );
    if compiled.is_clean() {
        Ok(())
    } else {
        Err(CliError::SchemaErrors {
            count: compiled.errors.len(),
        })
    }
}

/// `formtree inspect <schema>`
pub fn inspect(path: &Path) -> CliResult<()> {
    let compiled = compile_document(path)?;
    print_diagnostics(&compiled);

    for node in compiled.tree.iter() {
        let mut flags = Vec::new();
        if node.null_allowed() {
            flags.push("null");
        }
        if node.isenum() {
            flags.push("enum");
        }
        if node.isenumarray() {
            flags.push("enumarray");
        }
        if node.homogeneous() {
            flags.push("homogeneous");
        }
        let pointer = if node.pointer().is_empty() {
            "<root>"
        } else {
            node.pointer()
        };
        println!(
            "{:<40} {:<10} [{}] trackers: {}",
            pointer,
            node.basetype().as_str(),
            flags.join(","),
            node.trackers().join(" ")
        );
    }
    Ok(())
}

/// `formtree check <schema> <data>`
pub fn check(schema_path: &Path, data_path: &Path) -> CliResult<()> {
    let compiled = compile_document(schema_path)?;
    print_diagnostics(&compiled);

    let data = load_data(data_path)?;
    let checker = SchemaChecker::for_compiled(&compiled)?;
    let violations = checker.validate(&data);

    // Bind so heterogeneous elements without a matching case get logged
    let _bound = DataTree::bind(&compiled.tree, data);

    for violation in &violations {
        println!("invalid: {} {}", violation.pointer, violation.message);
    }
    if violations.is_empty() {
        println!("data document is valid");
        Ok(())
    } else {
        Err(CliError::DataInvalid {
            count: violations.len(),
        })
    }
}

fn load_data(path: &Path) -> CliResult<Value> {
    let content = fs::read_to_string(path).map_err(|e| CliError::Data {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| CliError::Data {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
