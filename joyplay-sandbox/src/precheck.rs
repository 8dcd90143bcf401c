//! Entry-package precheck
//!
//! Reads only the leading package clause of a Go source file, skipping
//! whitespace and comments, so obviously unrunnable input is rejected
//! before any process is spawned.

use crate::error::{Result, SandboxError};

const ENTRY_PACKAGE: &str = "main";

/// Fail with `SandboxError::Validation` unless `source` declares `package main`
pub fn check_entry_package(source: &str) -> Result<()> {
    let rest = skip_trivia(source.trim_start_matches('\u{feff}'))?;

    let rest = rest
        .strip_prefix("package")
        .filter(|r| r.starts_with(|c: char| c.is_whitespace() || c == '/'))
        .ok_or_else(|| SandboxError::Validation("expected 'package' clause".to_string()))?;

    let rest = skip_trivia(rest)?;
    let name: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();

    if name.is_empty() {
        return Err(SandboxError::Validation(
            "expected package name".to_string(),
        ));
    }
    if name != ENTRY_PACKAGE {
        return Err(SandboxError::Validation(
            "package name must be main".to_string(),
        ));
    }
    Ok(())
}

/// Skip whitespace, line comments and block comments
fn skip_trivia(mut input: &str) -> Result<&str> {
    loop {
        input = input.trim_start();
        if let Some(rest) = input.strip_prefix("//") {
            input = rest.find('\n').map_or("", |i| &rest[i + 1..]);
        } else if let Some(rest) = input.strip_prefix("/*") {
            let end = rest.find("*/").ok_or_else(|| {
                SandboxError::Validation("comment not terminated".to_string())
            })?;
            input = &rest[end + 2..];
        } else {
            return Ok(input);
        }
    }
}
