use buddy_core::{BuddyError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::env;

// ${VAR} and ${VAR:-default}
static ENV_VAR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex pattern")
});

/// Recursively substitute environment variables in every string of a JSON value
pub fn substitute_env_vars(value: &mut Value) -> Result<()> {
    let mut missing = Vec::new();
    substitute_recursive(value, &mut missing);

    if !missing.is_empty() {
        missing.sort();
        missing.dedup();
        return Err(BuddyError::ConfigError(format!(
            "Missing required environment variables: {}. Set them or provide a default with ${{VAR:-default}}.",
            missing.join(", ")
        )));
    }
    Ok(())
}

fn substitute_recursive(value: &mut Value, missing: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            *s = substitute_in_string(s, missing);
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                substitute_recursive(v, missing);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                substitute_recursive(v, missing);
            }
        }
        _ => {}
    }
}

fn substitute_in_string(input: &str, missing: &mut Vec<String>) -> String {
    ENV_VAR_REGEX
        .replace_all(input, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match env::var(var_name) {
                Ok(value) => value,
                Err(_) => match cap.get(2) {
                    Some(default) => default.as_str().to_string(),
                    None => {
                        missing.push(var_name.to_string());
                        String::new()
                    }
                },
            }
        })
        .into_owned()
}
