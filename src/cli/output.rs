//! Output formatting for CLI commands.
//!
//! Reports go to the given writer (standard output in the binary); progress
//! and warnings go through `log` to standard error.

use std::io::Write;

use serde::Serialize;

use crate::cli::args::{LivenessArgs, OutputFormat};
use crate::error::Result;
use crate::lookup::DocId;

/// Write killed docids one per line.
pub fn write_docid_report<W: Write>(docids: &[DocId], out: &mut W) -> Result<()> {
    for docid in docids {
        writeln!(out, "{docid}")?;
    }
    out.flush()?;
    Ok(())
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize, W: Write>(
    title: &str,
    result: &T,
    args: &LivenessArgs,
    out: &mut W,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(title, result, out),
        OutputFormat::Json => output_json(result, args, out),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize, W: Write>(title: &str, result: &T, out: &mut W) -> Result<()> {
    let value = serde_json::to_value(result)?;

    writeln!(out, "{title}")?;
    writeln!(out, "{}", "═".repeat(title.chars().count()))?;
    write_value(&value, 0, out)?;
    out.flush()?;
    Ok(())
}

fn write_value<W: Write>(value: &serde_json::Value, indent: usize, out: &mut W) -> Result<()> {
    let pad = "  ".repeat(indent);
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let label = key.replace('_', " ");
                if val.is_object() {
                    writeln!(out, "{pad}{label}:")?;
                    write_value(val, indent + 1, out)?;
                } else {
                    writeln!(out, "{pad}{label}: {}", format_value(val))?;
                }
            }
        }
        _ => writeln!(out, "{pad}{}", format_value(value))?,
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize, W: Write>(result: &T, args: &LivenessArgs, out: &mut W) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    writeln!(out, "{json}")?;
    out.flush()?;
    Ok(())
}

/// Format a JSON value for human output.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}
