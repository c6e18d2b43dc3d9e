//! Output formatting helpers for human-readable and JSON output.

use userstore::{Document, Value};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned tables and sentences
    Human,
    /// One JSON value per command
    Json,
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    // Calculate column widths (max of header and all row values)
    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_line.join("  "));

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .take(col_count)
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        println!("{}", line.join("  "));
    }
}

/// Renders a field value for a table cell. Strings print without quotes.
fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Print a user, or a notice when there is none.
pub fn print_user(
    user: Option<&Document>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&user)?),
        OutputFormat::Human => match user {
            Some(user) => {
                let rows: Vec<Vec<String>> = user
                    .iter()
                    .map(|(field, value)| vec![field.clone(), cell(value)])
                    .collect();
                print_table(&["FIELD", "VALUE"], &rows);
            }
            None => println!("No matching user."),
        },
    }
    Ok(())
}

/// Print the number of users an operation affected.
pub fn print_count(
    verb: &str,
    count: u64,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ verb: count })),
        OutputFormat::Human => {
            let noun = if count == 1 { "user" } else { "users" };
            println!("{} {count} {noun}", capitalize(verb));
        }
    }
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
