//! Placeholder interpolation for task and agent templates.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::utilities::errors::MissingInputError;

static VARIABLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_\-]*)\}").unwrap());

/// Collect the placeholder names referenced in `template`, in order of first
/// appearance and without duplicates.
///
/// Only `{identifier}` patterns count, so JSON braces inside a description
/// are left alone.
pub fn template_variables(template: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for cap in VARIABLE_PATTERN.captures_iter(template) {
        let name = cap[1].to_string();
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

/// Substitute every `{identifier}` placeholder in `template` from `inputs`.
///
/// # Errors
///
/// Returns [`MissingInputError`] naming every placeholder without a value;
/// nothing is substituted in that case.
pub fn interpolate_only(
    template: &str,
    inputs: &HashMap<String, String>,
) -> Result<String, MissingInputError> {
    let variables = template_variables(template);
    if variables.is_empty() {
        return Ok(template.to_string());
    }

    let missing: Vec<String> = variables
        .iter()
        .filter(|v| !inputs.contains_key(*v))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(MissingInputError::new(missing));
    }

    // Single pass so substituted values are never re-scanned for placeholders.
    let result = VARIABLE_PATTERN.replace_all(template, |caps: &regex::Captures<'_>| {
        inputs
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });
    Ok(result.into_owned())
}

/// Collect the placeholders of several templates that `inputs` does not
/// cover, preserving first-appearance order across all of them.
pub fn missing_variables<'a, I>(templates: I, inputs: &HashMap<String, String>) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut missing: Vec<String> = Vec::new();
    for template in templates {
        for var in template_variables(template) {
            if !inputs.contains_key(&var) && !missing.contains(&var) {
                missing.push(var);
            }
        }
    }
    missing
}

/// Fill the named slots of a fixed prompt template in one pass.
///
/// Placeholders without a slot stay as written, and filled values are never
/// re-scanned, so user text carrying `{context}` or `{input}` survives intact.
pub fn fill_slots(template: &str, slots: &[(&str, &str)]) -> String {
    VARIABLE_PATTERN
        .replace_all(template, |caps: &regex::Captures<'_>| {
            slots
                .iter()
                .find(|(key, _)| *key == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_interpolate_only_basic() {
        let result = interpolate_only("Hello {name}!", &inputs(&[("name", "Alice")])).unwrap();
        assert_eq!(result, "Hello Alice!");
    }

    #[test]
    fn test_interpolate_only_reports_every_missing_var() {
        let err = interpolate_only(
            "Find venues in {city} for {conference_name} in {city}",
            &inputs(&[("topic", "unused")]),
        )
        .unwrap_err();
        assert_eq!(err.missing, vec!["city", "conference_name"]);
    }

    #[test]
    fn test_interpolate_only_leaves_json_untouched() {
        let template = r#"Return {"venue": "name"} for {city}"#;
        let result = interpolate_only(template, &inputs(&[("city", "Bangalore")])).unwrap();
        assert_eq!(result, r#"Return {"venue": "name"} for Bangalore"#);
    }

    #[test]
    fn test_interpolate_only_does_not_rescan_values() {
        let result =
            interpolate_only("{a} {b}", &inputs(&[("a", "{b}"), ("b", "two")])).unwrap();
        assert_eq!(result, "{b} two");
    }

    #[test]
    fn test_no_placeholders_with_empty_inputs() {
        let result = interpolate_only("Plain text", &HashMap::new()).unwrap();
        assert_eq!(result, "Plain text");
    }

    #[test]
    fn test_missing_variables_across_templates() {
        let missing = missing_variables(
            ["About {topic}", "For {audience} on {topic}", "{year}"],
            &inputs(&[("audience", "clinicians")]),
        );
        assert_eq!(missing, vec!["topic", "year"]);
    }

    #[test]
    fn test_fill_slots_single_pass() {
        let filled = fill_slots(
            "{task}\n{context} {other}",
            &[("task", "Explain the {context} keyword"), ("context", "prior")],
        );
        assert_eq!(filled, "Explain the {context} keyword\nprior {other}");
    }
}
