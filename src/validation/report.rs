use std::fmt;

use serde::Serialize;

/// One recorded rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// 0-based data row, or `None` for issues about a whole field.
    pub row: Option<usize>,
    /// Field label (header name, or `#n` for ordinals).
    pub field: String,
    /// Name of the violated rule (`"primary_key"`, `"range"`, ...).
    pub rule: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "row {row}, field '{}' [{}]: {}", self.field, self.rule, self.message),
            None => write!(f, "field '{}' [{}]: {}", self.field, self.rule, self.message),
        }
    }
}

/// Result of one validation run.
///
/// Errors and warnings are kept apart. Within each list, column-wide findings (duplicates,
/// missing keys) come first in schema field order, followed by per-row findings in row order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// `true` when no error-level issue was recorded; warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Errors and warnings recorded against `field` (exact label match).
    pub fn issues_for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationIssue> + 'a {
        self.errors
            .iter()
            .chain(&self.warnings)
            .filter(move |issue| issue.field == field)
    }

    /// Render a deterministic markdown summary.
    pub fn to_markdown(&self) -> String {
        let mut lines = Vec::new();

        lines.push("# Validation Report".to_string());
        lines.push(String::new());
        lines.push(format!("- valid: {}", self.is_valid()));
        lines.push(format!("- errors: {}", self.error_count()));
        lines.push(format!("- warnings: {}", self.warning_count()));
        lines.push(String::new());

        for (title, issues) in [("Errors", &self.errors), ("Warnings", &self.warnings)] {
            if issues.is_empty() {
                continue;
            }
            lines.push(format!("## {title}"));
            lines.push("| row | field | rule | message |".to_string());
            lines.push("| --- | --- | --- | --- |".to_string());
            for issue in issues {
                let row = issue
                    .row
                    .map(|row| row.to_string())
                    .unwrap_or_else(|| "-".to_string());
                lines.push(format!(
                    "| {} | {} | {} | {} |",
                    row,
                    issue.field,
                    issue.rule,
                    issue.message.replace('|', "\\|")
                ));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}
