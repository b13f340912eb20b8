//! Generator chains: a prompt template bound to a model call.
//!
//! A chain resolves its template from the prompt registry once, at
//! construction, and afterwards exposes a single operation: render the
//! template against a set of named inputs and submit the result to the
//! model with a bounded timeout. Separating "which template" from "how to
//! call the model" lets each input modality (CSV, HTML, entity-tagged)
//! reuse the same machinery with a different input mapping.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tera::{Context, Tera};

use crate::error::{GeneratorError, TemplateError};
use crate::llm::{CompletionRequest, LlmProvider, Message, REQUEST_TIMEOUT_SECS};
use crate::prompts::{self, PromptTemplate};

/// Which generator chain variant to construct, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    /// General question generator over serialized record groups.
    Question,
    /// Named-entity-focused generator.
    Entity,
}

impl GeneratorKind {
    /// Parses the CLI tag ("text" or "ner") into a variant.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "text" | "csv" | "html" => Some(Self::Question),
            "ner" => Some(Self::Entity),
            _ => None,
        }
    }
}

/// Capability shared by all generator chains.
#[async_trait]
pub trait GeneratorChain: Send + Sync {
    /// Renders the chain's template against `inputs` and submits it to the
    /// model, returning the generated text.
    async fn generate(&self, inputs: &BTreeMap<String, Value>) -> Result<String, GeneratorError>;

    /// The prompt key this chain was constructed with.
    fn prompt_key(&self) -> &'static str;
}

/// Constructs the generator chain matching `kind`.
///
/// Fails with [`TemplateError::UnknownKey`] (wrapped in
/// [`GeneratorError::Template`]) when `prompt_key` is not registered; no
/// model call is ever attempted for an unknown key.
pub fn create_generator(
    kind: GeneratorKind,
    provider: Arc<dyn LlmProvider>,
    model: impl Into<String>,
    prompt_key: &str,
) -> Result<Box<dyn GeneratorChain>, GeneratorError> {
    let model = model.into();
    Ok(match kind {
        GeneratorKind::Question => {
            Box::new(QuestionGenerator::from_provider(provider, model, prompt_key)?)
        }
        GeneratorKind::Entity => {
            Box::new(EntityGenerator::from_provider(provider, model, prompt_key)?)
        }
    })
}

/// Chain that generates question/answer pairs from grouped records.
pub struct QuestionGenerator {
    inner: ChainInner,
}

impl QuestionGenerator {
    /// Builds the chain, resolving `prompt_key` against the registry.
    pub fn from_provider(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        prompt_key: &str,
    ) -> Result<Self, TemplateError> {
        Ok(Self {
            inner: ChainInner::new(provider, model.into(), prompts::get(prompt_key)?),
        })
    }
}

#[async_trait]
impl GeneratorChain for QuestionGenerator {
    async fn generate(&self, inputs: &BTreeMap<String, Value>) -> Result<String, GeneratorError> {
        self.inner.generate(inputs).await
    }

    fn prompt_key(&self) -> &'static str {
        self.inner.template.key
    }
}

/// Chain that generates questions about a named entity.
pub struct EntityGenerator {
    inner: ChainInner,
}

impl EntityGenerator {
    /// Builds the chain, resolving `prompt_key` against the registry.
    pub fn from_provider(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        prompt_key: &str,
    ) -> Result<Self, TemplateError> {
        Ok(Self {
            inner: ChainInner::new(provider, model.into(), prompts::get(prompt_key)?),
        })
    }
}

#[async_trait]
impl GeneratorChain for EntityGenerator {
    async fn generate(&self, inputs: &BTreeMap<String, Value>) -> Result<String, GeneratorError> {
        self.inner.generate(inputs).await
    }

    fn prompt_key(&self) -> &'static str {
        self.inner.template.key
    }
}

/// Shared render-and-call implementation behind both chain variants.
struct ChainInner {
    provider: Arc<dyn LlmProvider>,
    model: String,
    template: &'static PromptTemplate,
}

impl ChainInner {
    fn new(provider: Arc<dyn LlmProvider>, model: String, template: &'static PromptTemplate) -> Self {
        Self {
            provider,
            model,
            template,
        }
    }

    /// Validates that every placeholder the template declares is present.
    fn check_placeholders(&self, inputs: &BTreeMap<String, Value>) -> Result<(), TemplateError> {
        for placeholder in self.template.placeholders {
            if !inputs.contains_key(*placeholder) {
                return Err(TemplateError::MissingPlaceholder {
                    key: self.template.key.to_string(),
                    placeholder: placeholder.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Renders the template against the supplied inputs.
    fn render(&self, inputs: &BTreeMap<String, Value>) -> Result<String, TemplateError> {
        let mut context = Context::new();
        for (name, value) in inputs {
            context.insert(name, value);
        }
        Ok(Tera::one_off(self.template.template, &context, false)?)
    }

    async fn generate(&self, inputs: &BTreeMap<String, Value>) -> Result<String, GeneratorError> {
        self.check_placeholders(inputs)?;
        let prompt = self.render(inputs)?;

        let request = CompletionRequest::new(self.model.clone(), vec![Message::user(prompt)])
            .with_temperature(0.0);

        let response = tokio::time::timeout(
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
            self.provider.complete(request),
        )
        .await
        .map_err(|_| GeneratorError::Timeout {
            seconds: REQUEST_TIMEOUT_SECS,
        })??;

        let content = response
            .first_content()
            .map(str::to_string)
            .ok_or(GeneratorError::EmptyResponse)?;

        tracing::debug!(
            prompt_key = self.template.key,
            model = %self.model,
            chars = content.len(),
            "Generated text for group"
        );

        Ok(content)
    }
}
