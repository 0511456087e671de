//! Variable interpolation for run lines
//!
//! Replaces `${var}` references with option values, falling back to the
//! process environment.

use crate::error::{InterpolationError, InterpolationResult};
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::env;
use std::sync::OnceLock;

/// Upper bound on substitution passes before giving up
const MAX_PASSES: usize = 100;

fn var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid variable pattern"))
}

fn lookup(name: &str, vars: &HashMap<String, String>) -> Option<String> {
    vars.get(name).cloned().or_else(|| env::var(name).ok())
}

/// Interpolate variables in a string
///
/// Values may themselves contain references; unknown names are left as-is.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    let mut result = s.to_string();
    let mut expanded = HashSet::new();

    for _ in 0..MAX_PASSES {
        let mut changed = false;

        result = var_pattern()
            .replace_all(&result, |caps: &Captures| {
                let name = &caps[1];
                match lookup(name, vars) {
                    Some(value) if expanded.insert(name.to_string()) || !value.contains("${") => {
                        changed = true;
                        value
                    }
                    _ => caps[0].to_string(),
                }
            })
            .into_owned();

        if !changed {
            return Ok(result);
        }
    }

    Err(InterpolationError::RecursiveInterpolation)
}

/// Interpolate with strict mode - errors on undefined variables
pub fn interpolate_strict(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    let result = interpolate(s, vars)?;

    if let Some(caps) = var_pattern().captures(&result) {
        return Err(InterpolationError::UndefinedVariable(caps[1].to_string()));
    }

    Ok(result)
}
