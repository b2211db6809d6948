use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Text => {
            println!("✓ {}", message);
            Ok(())
        }
        _ => {
            let mut response = json!({ "success": true, "message": message });
            if let Some(data) = data {
                response["data"] = data;
            }
            output_data(output_format, &response)
        }
    }
}

/// Serialize any value in JSON or YAML; text callers print their own view.
pub fn output_data<T: Serialize + ?Sized>(output_format: OutputFormat, data: &T) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
        OutputFormat::Json | OutputFormat::Text => println!("{}", serde_json::to_string_pretty(data)?),
    }
    Ok(())
}

/// Output a list of rows: aligned columns for text, the raw list otherwise.
pub fn output_table(output_format: OutputFormat, rows: &[Value], columns: &[&str], empty_message: &str) -> anyhow::Result<()> {
    if output_format != OutputFormat::Text {
        return output_data(output_format, &rows);
    }
    if rows.is_empty() {
        println!("{}", empty_message);
        return Ok(());
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell(&row[*c])).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| cells.iter().map(|r| r[i].chars().count()).chain([c.len()]).max().unwrap_or(0))
        .collect();

    let line = |values: Vec<String>| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = w))
            .collect::<Vec<_>>()
            .join("  ")
    };
    println!("{}", line(columns.iter().map(|c| c.to_uppercase()).collect()));
    for row in cells {
        println!("{}", line(row));
    }
    Ok(())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_render_plainly() {
        assert_eq!(cell(&Value::Null), "-");
        assert_eq!(cell(&json!("Ana")), "Ana");
        assert_eq!(cell(&json!(true)), "true");
    }
}
