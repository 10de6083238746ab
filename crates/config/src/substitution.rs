use anyhow::Result;
use regex::Regex;
use std::env;
use tracing::{debug, warn};

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("static regex");
    let mut result = content.to_string();

    for caps in re.captures_iter(content) {
        let var_name = match caps.get(1).or_else(|| caps.get(2)) {
            Some(m) => m.as_str(),
            None => continue,
        };
        let placeholder = match caps.get(0) {
            Some(m) => m.as_str(),
            None => continue,
        };

        match env::var(var_name) {
            Ok(value) => {
                debug!("Substituting environment variable: {}", var_name);
                result = result.replace(placeholder, &value);
            }
            Err(_) => {
                // Keep the placeholder; parsing will surface the problem
                warn!("Environment variable '{}' not set", var_name);
            }
        }
    }

    Ok(result)
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    let re = Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("static regex");
    re.is_match(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_braced_vars() {
        env::set_var("OPENINDEX_TEST_SINK", "bars.csv");
        let out = substitute_env_vars("path: ${OPENINDEX_TEST_SINK}").unwrap();
        assert_eq!(out, "path: bars.csv");
        env::remove_var("OPENINDEX_TEST_SINK");
    }

    #[test]
    fn test_missing_var_keeps_placeholder() {
        let out = substitute_env_vars("path: ${OPENINDEX_TEST_UNSET_VAR}").unwrap();
        assert!(has_unresolved_env_vars(&out));
    }
}
