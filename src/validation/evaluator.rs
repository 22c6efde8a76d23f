//! Two-phase rule evaluation over a [`TypedStore`].
//!
//! 1. Column phase: `primary_key` and `unique` rules walk their whole column once with a
//!    seen-value set, flagging every later row whose value collides with an earlier one.
//! 2. Row phase: every other rule is checked cell by cell, row by row.
//!
//! Violations are recorded, never raised. The only failure is a malformed schema, detected
//! before any row is looked at.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::store::TypedStore;
use crate::types::{Field, FieldRef, Schema, Value};

use super::constraint::{CellCheck, Constraint, RuleSeverity};
use super::report::{ValidationIssue, ValidationReport};

/// Lifecycle of a [`ConstraintEvaluator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    NotStarted,
    Running,
    Complete,
    /// The schema could not be compiled.
    Failed,
}

/// Evaluates a schema's rules against a store.
#[derive(Debug)]
pub struct ConstraintEvaluator<'a> {
    store: &'a TypedStore,
    schema: &'a Schema,
    state: ValidationState,
}

/// Compiled rules of one field.
struct FieldPlan<'s> {
    label: String,
    /// Position in the store's schema; `None` when the store has no such field.
    position: Option<usize>,
    column_rules: Vec<(&'s Constraint, RuleSeverity)>,
    cell_rules: Vec<(&'static str, CellCheck<'s>, RuleSeverity)>,
}

impl<'a> ConstraintEvaluator<'a> {
    /// Evaluator for `schema`'s rules; fields are looked up in `store` by identifier.
    pub fn new(store: &'a TypedStore, schema: &'a Schema) -> Self {
        Self {
            store,
            schema,
            state: ValidationState::NotStarted,
        }
    }

    pub fn state(&self) -> ValidationState {
        self.state
    }

    /// Run both phases and return a fresh report.
    ///
    /// Running again re-evaluates from scratch.
    pub fn run(&mut self) -> Result<ValidationReport, SchemaError> {
        self.state = ValidationState::Running;
        tracing::debug!(
            rows = self.store.row_count(),
            fields = self.schema.len(),
            "validation started"
        );

        let plans = match self.compile() {
            Ok(plans) => plans,
            Err(e) => {
                self.state = ValidationState::Failed;
                tracing::warn!(error = %e, "validation aborted: malformed schema");
                return Err(e);
            }
        };

        let mut report = ValidationReport::default();
        for plan in &plans {
            if plan.position.is_none() {
                let rules: Vec<&str> = plan
                    .column_rules
                    .iter()
                    .map(|(c, _)| c.name())
                    .chain(plan.cell_rules.iter().map(|(name, _, _)| *name))
                    .collect();
                report.warnings.push(ValidationIssue {
                    row: None,
                    field: plan.label.clone(),
                    rule: "field",
                    message: format!(
                        "field is not present in the store; skipped rules: {}",
                        rules.join(", ")
                    ),
                });
            }
        }

        self.column_phase(&plans, &mut report);
        self.row_phase(&plans, &mut report);

        self.state = ValidationState::Complete;
        tracing::debug!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            "validation finished"
        );
        Ok(report)
    }

    fn compile(&self) -> Result<Vec<FieldPlan<'a>>, SchemaError> {
        let schema: &'a Schema = self.schema;
        let mut plans = Vec::new();
        for field in schema.fields.iter().filter(|f| !f.rules.is_empty()) {
            plans.push(self.compile_field(field)?);
        }
        Ok(plans)
    }

    fn compile_field(&self, field: &'a Field) -> Result<FieldPlan<'a>, SchemaError> {
        let label = field.label();
        let mut column_rules = Vec::new();
        let mut cell_rules = Vec::new();
        for rule in &field.rules {
            match rule.constraint.compile(&label)? {
                Some(check) => cell_rules.push((rule.constraint.name(), check, rule.severity)),
                None => column_rules.push((&rule.constraint, rule.severity)),
            }
        }
        Ok(FieldPlan {
            position: self.store.schema().resolve(FieldRef::Id(&field.id)),
            label,
            column_rules,
            cell_rules,
        })
    }

    fn column_phase(&self, plans: &[FieldPlan<'a>], report: &mut ValidationReport) {
        for plan in plans {
            let Some(position) = plan.position else {
                continue;
            };
            let Ok(column) = self.store.column(position) else {
                continue;
            };
            for &(constraint, severity) in &plan.column_rules {
                let issues = column_issues(column, &plan.label, constraint);
                push(report, severity, issues);
            }
        }
    }

    fn row_phase(&self, plans: &[FieldPlan<'a>], report: &mut ValidationReport) {
        let active: Vec<(&FieldPlan<'a>, usize)> = plans
            .iter()
            .filter(|p| !p.cell_rules.is_empty())
            .filter_map(|p| p.position.map(|pos| (p, pos)))
            .collect();
        if active.is_empty() {
            return;
        }

        for row in self.store.rows() {
            for &(plan, position) in &active {
                let value = &row.fields()[position];
                for (name, check, severity) in &plan.cell_rules {
                    if let Some(message) = check.violation(value) {
                        let issue = ValidationIssue {
                            row: Some(row.index()),
                            field: plan.label.clone(),
                            rule: *name,
                            message,
                        };
                        push(report, *severity, std::iter::once(issue));
                    }
                }
            }
        }
    }
}

/// Duplicate (and, for primary keys, missing) values of one column.
fn column_issues(column: &[Value], field: &str, constraint: &Constraint) -> Vec<ValidationIssue> {
    let primary = matches!(constraint, Constraint::PrimaryKey);
    let rule = constraint.name();
    let mut first_seen: HashMap<&Value, usize> = HashMap::with_capacity(column.len());
    let mut issues = Vec::new();

    for (row, value) in column.iter().enumerate() {
        if value.is_empty() {
            if primary {
                issues.push(ValidationIssue {
                    row: Some(row),
                    field: field.to_string(),
                    rule,
                    message: "primary key value is missing".to_string(),
                });
            }
            continue;
        }
        match first_seen.get(value) {
            Some(&first) => issues.push(ValidationIssue {
                row: Some(row),
                field: field.to_string(),
                rule,
                message: format!("duplicate value '{value}' (first seen at row {first})"),
            }),
            None => {
                first_seen.insert(value, row);
            }
        }
    }
    issues
}

fn push(report: &mut ValidationReport, severity: RuleSeverity, issues: impl IntoIterator<Item = ValidationIssue>) {
    match severity {
        RuleSeverity::Error => report.errors.extend(issues),
        RuleSeverity::Warning => report.warnings.extend(issues),
    }
}

/// Validate `store` against the rules declared in `schema`.
///
/// Always yields a complete report unless the schema itself is malformed (bad regex, inverted
/// bounds, empty allowed set). Rules on fields the store does not have produce one warning per
/// field and are skipped.
///
/// ```rust
/// use typed_csv_store::ingestion::{parse, LoaderOptions};
/// use typed_csv_store::types::{Field, Schema};
/// use typed_csv_store::validation::validate;
///
/// let schema = Schema::new(vec![Field::new("ID").primary_key(), Field::new("Name").required()]);
/// let store = parse("ID,Name\n1,Alice\n1,\n", &schema, &LoaderOptions::default()).unwrap();
/// let report = validate(&store, &schema).unwrap();
///
/// assert_eq!(report.error_count(), 2);
/// assert_eq!(report.errors[0].row, Some(1));
/// ```
pub fn validate(store: &TypedStore, schema: &Schema) -> Result<ValidationReport, SchemaError> {
    ConstraintEvaluator::new(store, schema).run()
}

#[cfg(test)]
mod tests {
    use super::{validate, ConstraintEvaluator, ValidationState};
    use crate::store::TypedStore;
    use crate::types::{Field, Schema, Value};
    use crate::validation::Constraint;

    fn store_of(schema: &Schema, rows: Vec<Vec<Value>>) -> TypedStore {
        TypedStore::from_rows(schema.clone(), rows).unwrap()
    }

    #[test]
    fn primary_key_flags_only_the_later_duplicate() {
        let schema = Schema::new(vec![Field::new("ID").primary_key()]);
        let rows = [1, 2, 2, 3].into_iter().map(|i| vec![Value::Int64(i)]).collect();
        let store = store_of(&schema, rows);

        let report = validate(&store, &schema).unwrap();
        assert_eq!(report.error_count(), 1);
        let err = &report.errors[0];
        assert_eq!(err.row, Some(2));
        assert_eq!(err.field, "ID");
        assert_eq!(err.rule, "primary_key");
        assert_eq!(err.message, "duplicate value '2' (first seen at row 1)");
    }

    #[test]
    fn primary_key_reports_missing_values() {
        let schema = Schema::new(vec![Field::new("ID").primary_key()]);
        let rows = vec![vec![Value::Null], vec![Value::Int64(1)], vec![Value::Null]];
        let store = store_of(&schema, rows);

        let report = validate(&store, &schema).unwrap();
        let rows: Vec<_> = report.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![Some(0), Some(2)]);
        assert!(report.errors.iter().all(|e| e.message == "primary key value is missing"));
    }

    #[test]
    fn unique_exempts_nulls_and_compares_numbers_by_value() {
        let schema = Schema::new(vec![Field::new("Code").unique()]);
        let rows = vec![
            vec![Value::Null],
            vec![Value::Null],
            vec![Value::Int64(7)],
            vec![Value::Float64(7.0)],
            vec![Value::from("7")],
        ];
        let store = store_of(&schema, rows);

        let report = validate(&store, &schema).unwrap();
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].row, Some(3));
    }

    #[test]
    fn every_violation_is_reported() {
        let schema = Schema::new(vec![
            Field::new("Name").required().length(None, Some(4)),
            Field::new("Level").range(1.0, 10.0),
        ]);
        let rows = vec![
            vec![Value::Null, Value::Int64(0)],
            vec![Value::from("Alexander"), Value::Int64(11)],
            vec![Value::from("Bo"), Value::Int64(5)],
        ];
        let store = store_of(&schema, rows);

        let report = validate(&store, &schema).unwrap();
        let got: Vec<_> = report.errors.iter().map(|e| (e.row, e.rule)).collect();
        assert_eq!(
            got,
            vec![
                (Some(0), "required"),
                (Some(0), "range"),
                (Some(1), "length"),
                (Some(1), "range"),
            ]
        );
    }

    #[test]
    fn warning_rules_do_not_fail_validation() {
        let schema = Schema::new(vec![Field::new("Level").with_warning(Constraint::Range {
            min: Some(1.0),
            max: None,
        })]);
        let store = store_of(&schema, vec![vec![Value::Int64(0)]]);

        let report = validate(&store, &schema).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn rules_on_unknown_fields_warn_once() {
        let store_schema = Schema::from_names(["ID"]);
        let store = store_of(&store_schema, vec![vec![Value::Int64(1)], vec![Value::Int64(1)]]);
        let rules = Schema::new(vec![
            Field::new("Ghost").required().unique(),
            Field::new("id").unique(),
        ]);

        let report = validate(&store, &rules).unwrap();
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.warnings[0].row, None);
        assert_eq!(report.warnings[0].field, "Ghost");
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].field, "id");
    }

    #[test]
    fn malformed_schema_fails_the_run() {
        let schema = Schema::new(vec![Field::new("Name").pattern("([a-z")]);
        let store = store_of(&schema, vec![vec![Value::from("x")]]);

        let mut evaluator = ConstraintEvaluator::new(&store, &schema);
        assert_eq!(evaluator.state(), ValidationState::NotStarted);
        assert!(evaluator.run().is_err());
        assert_eq!(evaluator.state(), ValidationState::Failed);
    }

    #[test]
    fn evaluator_completes_and_can_rerun() {
        let schema = Schema::new(vec![Field::new("Name").required()]);
        let store = store_of(&schema, vec![vec![Value::Null]]);

        let mut evaluator = ConstraintEvaluator::new(&store, &schema);
        let first = evaluator.run().unwrap();
        assert_eq!(evaluator.state(), ValidationState::Complete);
        assert_eq!(evaluator.run().unwrap(), first);
    }

    #[test]
    fn empty_store_is_valid() {
        let schema = Schema::new(vec![Field::new("ID").primary_key()]);
        let store = TypedStore::new(schema.clone());
        assert!(validate(&store, &schema).unwrap().is_valid());
    }
}
