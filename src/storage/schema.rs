//! Database schema constants.
//!
//! Schema evolution is strictly additive: each step either creates an
//! object with IF NOT EXISTS or adds nullable columns, so every step has a
//! trivial reverse (drop the added columns) and re-running is safe.

/// SQL schema for creating the assessments table.
pub const CREATE_ASSESSMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS assessments (
    id UUID PRIMARY KEY,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// SQL for the retrieval-diagnostic columns recorded per QA interaction.
pub const ADD_RETRIEVAL_DIAGNOSTICS: &str = r#"
ALTER TABLE assessments
    ADD COLUMN IF NOT EXISTS verified_reference_context TEXT,
    ADD COLUMN IF NOT EXISTS chunks_retrieved JSONB,
    ADD COLUMN IF NOT EXISTS min_retrieval_score DOUBLE PRECISION,
    ADD COLUMN IF NOT EXISTS max_retrieval_score DOUBLE PRECISION,
    ADD COLUMN IF NOT EXISTS avg_retrieval_score DOUBLE PRECISION
"#;

/// SQL for creating all required indexes.
pub const CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_assessments_created_at ON assessments(created_at)
"#;

/// Returns all schema statements in application order.
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_ASSESSMENTS_TABLE,
        ADD_RETRIEVAL_DIAGNOSTICS,
        CREATE_INDEXES,
    ]
}
