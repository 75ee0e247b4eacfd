//! Output formatting for command results

use anyhow::{Context, Result};
use comfy_table::Table;
use jpx_core::Runtime;
use serde_json::Value;
use std::sync::OnceLock;

static JMESPATH_RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn jmespath_runtime() -> &'static Runtime {
    JMESPATH_RUNTIME.get_or_init(|| Runtime::builder().with_all_extensions().build())
}

/// How to render a command's JSON result.
#[derive(Debug, Clone, Copy, clap::ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

/// Render `data`, optionally filtered through a JMESPath query first.
pub fn print_output(data: &Value, format: OutputFormat, query: Option<&str>) -> Result<()> {
    let value = match query {
        Some(query_str) => {
            let expr = jmespath_runtime()
                .compile(query_str)
                .with_context(|| format!("invalid JMESPath expression: {}", query_str))?;
            expr.search(data).context("JMESPath query failed")?
        }
        None => data.clone(),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&value)?);
        }
        OutputFormat::Table => {
            print_as_table(&value);
        }
    }

    Ok(())
}

fn print_as_table(value: &Value) {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();
            if let Value::Object(first) = &arr[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);
                for item in arr {
                    if let Value::Object(obj) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| format_value(obj.get(h).unwrap_or(&Value::Null)))
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![format_value(item)]);
                }
            }
            println!("{}", table);
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Key", "Value"]);
            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_value(val)]);
            }
            println!("{}", table);
        }
        _ => {
            println!("{}", format_value(value));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn jmespath_filters_results() {
        let data = json!([
            {"name": "acct1", "status": "active"},
            {"name": "acct2", "status": "creating"}
        ]);
        let expr = jmespath_runtime().compile("[?status=='active'].name").unwrap();
        let out = expr.search(&data).unwrap();
        assert_eq!(out, json!(["acct1"]));
    }

    #[test]
    fn format_value_flattens_nested_shapes() {
        assert_eq!(format_value(&json!(null)), "null");
        assert_eq!(format_value(&json!([1, 2, 3])), "[3 items]");
        assert_eq!(format_value(&json!({"a": 1})), "{1 fields}");
    }
}
