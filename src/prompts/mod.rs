//! Prompt templates for question/answer generation.
//!
//! Each template is registered under a symbolic key together with the
//! placeholder names it requires. Callers resolve a template once at chain
//! construction time; an unknown key fails there, before any model call.

mod question;

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::TemplateError;

pub use question::{QA_CSV, QA_CSV_STATEFUL, QA_HTML, QA_NER};

/// A registered prompt template and the placeholders it requires.
///
/// Placeholders use Tera syntax (`{{ products }}`). Every placeholder listed
/// here must be supplied when the template is rendered; the generator chain
/// rejects incomplete input sets up front rather than shipping a half-filled
/// prompt to the model.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The registry key (e.g., "qa_csv").
    pub key: &'static str,
    /// The template body.
    pub template: &'static str,
    /// Placeholder names the template requires.
    pub placeholders: &'static [&'static str],
}

/// Static array of all registered templates.
static PROMPT_TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        key: "qa_csv",
        template: QA_CSV,
        placeholders: &["products", "number_of_questions", "schema"],
    },
    PromptTemplate {
        key: "qa_csv_stateful",
        template: QA_CSV_STATEFUL,
        placeholders: &["products", "number_of_questions", "schema"],
    },
    PromptTemplate {
        key: "qa_html",
        template: QA_HTML,
        placeholders: &["products", "number_of_questions"],
    },
    PromptTemplate {
        key: "qa_ner",
        template: QA_NER,
        placeholders: &["sample_size", "entity_name"],
    },
];

/// Lookup map from key to template, built once.
static REGISTRY: LazyLock<HashMap<&'static str, &'static PromptTemplate>> =
    LazyLock::new(|| PROMPT_TEMPLATES.iter().map(|t| (t.key, t)).collect());

/// Resolves a prompt template by key.
///
/// # Errors
///
/// Returns [`TemplateError::UnknownKey`] if no template is registered under
/// the given key.
pub fn get(key: &str) -> Result<&'static PromptTemplate, TemplateError> {
    REGISTRY
        .get(key)
        .copied()
        .ok_or_else(|| TemplateError::UnknownKey(key.to_string()))
}

/// Returns all registered template keys, sorted.
pub fn keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = REGISTRY.keys().copied().collect();
    keys.sort_unstable();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_known_key() {
        let template = get("qa_csv").expect("qa_csv should be registered");
        assert_eq!(template.key, "qa_csv");
        assert!(template.placeholders.contains(&"products"));
        assert!(template.placeholders.contains(&"schema"));
    }

    #[test]
    fn test_get_unknown_key() {
        let result = get("no_such_key");
        assert!(matches!(result, Err(TemplateError::UnknownKey(_))));
        assert!(result.unwrap_err().to_string().contains("no_such_key"));
    }

    #[test]
    fn test_ner_template_placeholders() {
        let template = get("qa_ner").expect("qa_ner should be registered");
        assert_eq!(template.placeholders, &["sample_size", "entity_name"]);
    }

    #[test]
    fn test_all_templates_reference_their_placeholders() {
        for template in PROMPT_TEMPLATES {
            for placeholder in template.placeholders {
                assert!(
                    template.template.contains(placeholder),
                    "template '{}' does not reference placeholder '{}'",
                    template.key,
                    placeholder
                );
            }
        }
    }

    #[test]
    fn test_keys_returns_all() {
        let keys = keys();
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&"qa_csv"));
        assert!(keys.contains(&"qa_ner"));
    }
}
