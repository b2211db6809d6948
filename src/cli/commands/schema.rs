use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{output_data, output_success, output_table};
use crate::cli::OutputFormat;
use crate::schema::{self, registry};

#[derive(Subcommand)]
pub enum SchemaCommands {
    #[command(about = "List every section with its table and field count")]
    List,

    #[command(about = "Show the fields of one section")]
    Show {
        #[arg(help = "Section key, e.g. travelHistory")]
        key: String,
    },

    #[command(about = "Show the tabs and the sections on each")]
    Tabs,

    #[command(about = "Verify tabs, sections and field groups are consistent")]
    Check,
}

pub fn handle(cmd: SchemaCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SchemaCommands::List => {
            let rows: Vec<Value> = schema::sections()
                .iter()
                .map(|s| {
                    json!({
                        "key": s.key,
                        "table": s.table,
                        "title": s.title,
                        "repeatable": s.repeatable,
                        "fields": s.fields.len(),
                    })
                })
                .collect();
            output_table(output_format, &rows, &["key", "table", "title", "repeatable", "fields"], "No sections")
        }
        SchemaCommands::Show { key } => {
            let section = schema::find_section(&key).ok_or_else(|| anyhow::anyhow!("Unknown section: {}", key))?;
            if output_format != OutputFormat::Text {
                return output_data(output_format, section);
            }
            println!("{} ({}){}", section.title, section.table, if section.repeatable { " - repeatable" } else { "" });
            let rows: Vec<Value> = section
                .fields
                .iter()
                .map(|f| json!({ "key": f.key, "label": f.label, "type": f.field_type, "required": f.required }))
                .collect();
            output_table(output_format, &rows, &["key", "label", "type", "required"], "No fields")
        }
        SchemaCommands::Tabs => {
            if output_format != OutputFormat::Text {
                return output_data(output_format, schema::tabs());
            }
            for tab in schema::tabs() {
                let keys: Vec<&str> = tab.sections.iter().map(|s| s.key).collect();
                println!("{:<28} {}", tab.title, keys.join(", "));
            }
            Ok(())
        }
        SchemaCommands::Check => {
            registry::check_consistency()?;
            output_success(
                output_format,
                &format!("Schema is consistent ({} sections, {} tabs)", schema::sections().len(), schema::tabs().len()),
                None,
            )
        }
    }
}
