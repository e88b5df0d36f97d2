//! Build variable expansion.
//!
//! CI servers hand build steps their parameters as environment variables;
//! configured values may reference them as `${NAME}`.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("placeholder pattern is valid")
    })
}

/// Replaces `${NAME}` with the value of `NAME`; unknown names are left as written.
pub fn expand(template: &str, variables: &HashMap<String, String>) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Snapshot of the process environment, the usual source of build variables.
pub fn environment() -> HashMap<String, String> {
    std::env::vars().collect()
}
