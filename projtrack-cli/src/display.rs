use colored::Colorize;

use projtrack_core::{Field, Record, RecordKind};

/// Widest a table cell gets before it is cut
pub const MAX_CELL_WIDTH: usize = 30;

/// Columns shown when listing every record of a kind
pub fn overview_columns(kind: RecordKind) -> Vec<Field> {
    kind.columns()
        .iter()
        .copied()
        .filter(|field| *field != Field::DetailedDescription)
        .collect()
}

fn cell(text: &str) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() <= MAX_CELL_WIDTH {
        return flat;
    }
    let mut cut: String = flat.chars().take(MAX_CELL_WIDTH - 3).collect();
    cut.push_str("...");
    cut
}

/// Renders `records` as a pipe-separated table of `columns`
pub fn table(records: &[&Record], columns: &[Field]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|field| cell(&record.field_text(*field)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, field)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(field.column().len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header = columns
        .iter()
        .zip(&widths)
        .map(|(field, width)| format!("{:<width$}", field.column(), width = *width))
        .collect::<Vec<_>>()
        .join(" | ");
    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut lines = vec![header.bold().to_string(), rule];
    for row in rows {
        lines.push(
            row.iter()
                .zip(&widths)
                .map(|(text, width)| {
                    let pad = width - text.chars().count();
                    format!("{}{}", text, " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string(),
        );
    }
    lines.join("\n")
}

/// Every record of a store, without detailed descriptions
pub fn overview(kind: RecordKind, records: &[Record]) -> String {
    let refs: Vec<&Record> = records.iter().collect();
    table(&refs, &overview_columns(kind))
}

/// One record with all of its fields, followed by its tasks for a project
pub fn detail(record: &Record, linked_tasks: &[&Record]) -> String {
    let mut out = table(&[record], record.kind().columns());
    if !linked_tasks.is_empty() {
        out.push_str(&format!("\n\n{}\n", "Project Tasks:".blue().bold()));
        out.push_str(&table(linked_tasks, RecordKind::Task.columns()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn project(id: &str, name: &str) -> Record {
        let mut record = Record::new(
            RecordKind::Project,
            id,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        record.name = name.to_string();
        record.detailed_description = "hidden in overview".to_string();
        record
    }

    #[test]
    fn test_cell_truncation() {
        assert_eq!(cell("short"), "short");
        let long = "x".repeat(40);
        let cut = cell(&long);
        assert_eq!(cut.chars().count(), MAX_CELL_WIDTH);
        assert!(cut.ends_with("..."));
        assert_eq!(cell("two\nlines"), "two lines");
    }

    #[test]
    fn test_overview_hides_detailed_description() {
        colored::control::set_override(false);
        let out = overview(RecordKind::Project, &[project("1", "Website")]);
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id | name    | description | creation_date | deadline | state | task_list"
        );
        assert!(lines.next().unwrap().starts_with("---+-"));
        assert!(lines.next().unwrap().starts_with("1  | Website |"));
        assert!(!out.contains("hidden in overview"));
    }

    #[test]
    fn test_detail_lists_tasks() {
        colored::control::set_override(false);
        let mut task = Record::new(
            RecordKind::Task,
            "4",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        task.name = "Write copy".to_string();

        let alone = detail(&project("1", "Website"), &[]);
        assert!(alone.contains("hidden in overview"));
        assert!(!alone.contains("Project Tasks:"));

        let with_tasks = detail(&project("1", "Website"), &[&task]);
        assert!(with_tasks.contains("Project Tasks:"));
        assert!(with_tasks.contains("Write copy"));
        assert!(with_tasks.contains("linked_project"));
    }
}
