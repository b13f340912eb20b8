//! Question-generation prompt bodies.
//!
//! These templates instruct the model to produce numbered question/answer
//! pairs grounded strictly in the supplied records. The CSV variants carry a
//! schema description so the model can reason about column semantics; the
//! HTML variant works from extracted page text; the NER variant targets a
//! single entity name.

/// Prompt for question generation over grouped tabular (CSV) records.
pub const QA_CSV: &str = r#"You are a data curator building a question-answering dataset from a product catalog.

The catalog rows below follow this schema:
{{ schema }}

Products:
{{ products }}

Generate exactly {{ number_of_questions }} question/answer pairs about these products.

Rules:
- Every answer must be directly supported by the product rows above. Do not invent attributes.
- Prefer questions that compare products or combine fields (price vs. rating, category membership).
- Keep questions self-contained: name the product, never refer to "the table" or "row 2".
- Format each pair as:
  Q: <question>
  A: <answer>
"#;

/// Conversational variant of [`QA_CSV`]: later questions may build on
/// earlier ones, simulating a multi-turn session over the same products.
pub const QA_CSV_STATEFUL: &str = r#"You are simulating a shopper asking a knowledgeable assistant about a product catalog.

The catalog rows below follow this schema:
{{ schema }}

Products:
{{ products }}

Generate a coherent conversation of exactly {{ number_of_questions }} question/answer turns about these products. Later questions should follow up on earlier answers (e.g. "and which of those is cheapest?"), but every answer must still be fully supported by the product rows above.

Format each turn as:
Q: <question>
A: <answer>
"#;

/// Prompt for question generation over crawled HTML page content.
pub const QA_HTML: &str = r#"You are a data curator building a question-answering dataset from web page content.

Page content:
{{ products }}

Generate exactly {{ number_of_questions }} question/answer pairs covering the key facts in the content above.

Rules:
- Every answer must be directly supported by the content. Do not use outside knowledge.
- Preserve numbers, dates, and proper nouns exactly as they appear.
- Keep questions self-contained and answerable without seeing the page.
- Format each pair as:
  Q: <question>
  A: <answer>
"#;

/// Prompt for question generation focused on named entities.
pub const QA_NER: &str = r#"You are building a training dataset of questions about named entities.

Generate exactly {{ sample_size }} diverse question/answer pairs about: {{ entity_name }}

Rules:
- Questions must mention the entity by name.
- Vary the question forms (what/where/when/how) across the set.
- Answers should be short factual statements.
- Format each pair as:
  Q: <question>
  A: <answer>
"#;
