//! Construction-time checks of schema definitions.
//!
//! Schemas are authored in code, so mistakes in them are programming errors.
//! They are caught once when a validator is built instead of surfacing as
//! confusing request failures.

use crate::composite::Section;
use crate::error::SchemaDefinitionError;
use crate::schema::{FieldKind, FieldRule, SectionSchema};

pub(crate) fn check_section(section: Section, schema: &SectionSchema) -> Result<(), SchemaDefinitionError> {
    check_fields(section.as_str(), schema)
}

fn check_fields(prefix: &str, schema: &SectionSchema) -> Result<(), SchemaDefinitionError> {
    for (name, rule) in schema.fields() {
        let field = format!("{prefix}.{name}");
        check_rule(&field, rule)?;

        for condition in rule.conditions() {
            if schema.get(condition.sibling()).is_none() {
                return Err(SchemaDefinitionError::UnknownSibling {
                    field,
                    sibling: condition.sibling().to_string(),
                });
            }
            check_rule(&field, &condition.then)?;
            if let Some(otherwise) = &condition.otherwise {
                check_rule(&field, otherwise)?;
            }
        }
    }
    Ok(())
}

fn check_rule(field: &str, rule: &FieldRule) -> Result<(), SchemaDefinitionError> {
    if let Some(pattern) = &rule.pattern {
        if let Some(reason) = pattern.error() {
            return Err(SchemaDefinitionError::InvalidPattern {
                field: field.to_string(),
                pattern: pattern.source().to_string(),
                reason: reason.to_string(),
            });
        }
    }

    if let (Some(min), Some(max)) = (rule.min, rule.max) {
        if min > max {
            return Err(SchemaDefinitionError::InvertedBounds {
                field: field.to_string(),
                min,
                max,
            });
        }
    }

    if rule.valid.as_ref().is_some_and(Vec::is_empty) {
        return Err(SchemaDefinitionError::EmptyValidSet {
            field: field.to_string(),
        });
    }

    match rule.kind() {
        FieldKind::Object(nested) => check_fields(field, nested)?,
        FieldKind::Array(items) => check_rule(&format!("{field}[]"), items)?,
        _ => {}
    }

    if let Some(default) = rule.default_value() {
        let label = field.rsplit('.').next().unwrap_or(field);
        if let Err(violations) = rule.check_value(label, default) {
            let reason = violations
                .iter()
                .map(|v| v.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SchemaDefinitionError::InvalidDefault {
                field: field.to_string(),
                reason,
            });
        }
    }

    Ok(())
}
