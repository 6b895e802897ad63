//! Schema listing command.

use browserflow_api::build_registry;
use browserflow_validation::{Presence, SchemaRegistry, ValidationConfig};
use serde_json::{Map, Value};

use crate::cli::SchemaFormat;

pub(crate) fn print_schemas(format: SchemaFormat) -> anyhow::Result<()> {
    let registry = build_registry()?;
    println!("{}", render_schemas(&registry, format)?);
    Ok(())
}

pub(crate) fn render_schemas(
    registry: &dyn SchemaRegistry,
    format: SchemaFormat,
) -> anyhow::Result<String> {
    let mut operations = registry.operations();
    operations.sort_unstable();

    match format {
        SchemaFormat::Json => {
            let mut document = Map::new();
            for operation in operations {
                let config = registry.lookup(operation)?;
                document.insert(operation.to_string(), sections_json(config));
            }
            Ok(serde_json::to_string_pretty(&Value::Object(document))?)
        }
        SchemaFormat::Table => {
            let mut lines = vec![
                format!("{:<24} {:<8} {}", "OPERATION", "SECTION", "FIELDS"),
                "-".repeat(80),
            ];
            for operation in operations {
                let config = registry.lookup(operation)?;
                if config.is_empty() {
                    lines.push(format!("{:<24} {:<8} {}", operation, "-", "-"));
                    continue;
                }
                for (section, schema) in config.sections() {
                    let fields: Vec<String> = schema
                        .fields()
                        .map(|(name, rule)| match rule.presence() {
                            Presence::Required => format!("{name}*"),
                            _ => name.to_string(),
                        })
                        .collect();
                    lines.push(format!(
                        "{:<24} {:<8} {}",
                        operation,
                        section,
                        fields.join(", ")
                    ));
                }
            }
            lines.push(String::new());
            lines.push("* required".to_string());
            Ok(lines.join("\n"))
        }
    }
}

fn sections_json(config: &ValidationConfig) -> Value {
    let sections: Map<String, Value> = config
        .sections()
        .map(|(section, schema)| (section.to_string(), schema.to_json_schema()))
        .collect();
    Value::Object(sections)
}
