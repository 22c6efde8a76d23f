//! Declarative constraints and the evaluator that checks them against a
//! [`crate::store::TypedStore`].
//!
//! Rules live on [`crate::types::Field`]s. [`validate`] runs them and returns a
//! [`ValidationReport`] listing every violation, split into errors and warnings.

pub mod constraint;
pub mod evaluator;
pub mod report;

pub use constraint::{Constraint, Rule, RuleSeverity};
pub use evaluator::{validate, ConstraintEvaluator, ValidationState};
pub use report::{ValidationIssue, ValidationReport};
