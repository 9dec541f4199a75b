// crates/context-trust-core/src/runtime/adjudicator.rs
// ============================================================================
// Module: Schema Adjudicator
// Description: Deterministic JSON Schema verdicts for schema disputes.
// Purpose: Render innocent/guilty/manual-review verdicts against recorded output.
// Dependencies: crate::core, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! Only `schema_mismatch` disputes are auto-adjudicable: the declared output
//! schema is the one dispute reason with an objective, checkable ground
//! truth. The adjudicator compiles the declared schema (Draft 2020-12) and
//! validates the recorded output against it, collecting every validation
//! error rather than stopping at the first. A tool with no declared schema
//! cannot be judged mechanically and routes to manual review; a tool whose
//! declared schema fails to compile is guilty of publishing a contract it
//! cannot honor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use jsonschema::Draft;
use serde_json::Value;

use crate::core::dispute::DisputeReason;
use crate::core::dispute::SchemaViolation;
use crate::core::dispute::Verdict;
use crate::core::tool::ToolSchema;

// ============================================================================
// SECTION: Adjudication Result
// ============================================================================

/// Result of adjudicating one dispute.
///
/// # Invariants
/// - `schema_errors` is non-empty only for guilty schema verdicts.
/// - Deterministic: identical inputs always yield identical output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjudication {
    /// Rendered verdict.
    pub verdict: Verdict,
    /// Short note explaining how the verdict was reached.
    pub note: String,
    /// Structured validation errors for guilty schema verdicts.
    pub schema_errors: Vec<SchemaViolation>,
}

impl Adjudication {
    /// Builds a manual-review adjudication with the given note.
    fn manual_review(note: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::ManualReview,
            note: note.into(),
            schema_errors: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Adjudication
// ============================================================================

/// Adjudicates a dispute of any reason.
///
/// Reasons without a mechanical ground truth (`execution_error`,
/// `malicious_content`, `data_fabrication`) route directly to manual review;
/// `schema_mismatch` runs the schema check.
#[must_use]
pub fn adjudicate(
    reason: DisputeReason,
    schema: &ToolSchema,
    output: &Value,
    sub_tool: Option<&str>,
) -> Adjudication {
    if !reason.is_auto_adjudicable() {
        return Adjudication::manual_review(format!(
            "reason {} has no mechanical ground truth",
            reason.as_str()
        ));
    }
    adjudicate_schema_mismatch(schema, output, sub_tool)
}

/// Adjudicates a `schema_mismatch` dispute against the declared schema.
///
/// Verdicts: no declared schema -> manual review; compile failure -> guilty
/// (the published contract cannot be honored); validation errors -> guilty
/// with the full error list; clean validation -> innocent.
#[must_use]
pub fn adjudicate_schema_mismatch(
    schema: &ToolSchema,
    output: &Value,
    sub_tool: Option<&str>,
) -> Adjudication {
    let Some(declared) = schema.output_schema_for(sub_tool) else {
        return Adjudication::manual_review("no output schema declared for the invoked tool");
    };

    let validator = match jsonschema::options().with_draft(Draft::Draft202012).build(declared) {
        Ok(validator) => validator,
        Err(err) => {
            return Adjudication {
                verdict: Verdict::Guilty,
                note: "declared output schema failed to compile".to_string(),
                schema_errors: vec![SchemaViolation {
                    path: String::new(),
                    message: err.to_string(),
                }],
            };
        }
    };

    let violations: Vec<SchemaViolation> = validator
        .iter_errors(output)
        .map(|err| SchemaViolation {
            path: err.instance_path().to_string(),
            message: err.to_string(),
        })
        .collect();

    if violations.is_empty() {
        Adjudication {
            verdict: Verdict::Innocent,
            note: "output validates against the declared schema".to_string(),
            schema_errors: Vec::new(),
        }
    } else {
        Adjudication {
            verdict: Verdict::Guilty,
            note: format!("output violates the declared schema ({} errors)", violations.len()),
            schema_errors: violations,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
