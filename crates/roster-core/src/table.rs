use std::fmt::Write;

use crate::record::Record;

const RULE_WIDTH: usize = 45;

/// Format a grade the way it is typed: whole numbers keep one decimal.
pub fn format_grade(grade: f64) -> String {
    if grade.is_finite() && grade.fract() == 0.0 {
        format!("{grade:.1}")
    } else {
        grade.to_string()
    }
}

/// Render records as a fixed-width table.
pub fn render_table(records: &[Record]) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    if records.is_empty() {
        return "(no students)\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{:<10} {:<20} {:<10}", "ID", "Name", "Grade");
    let _ = writeln!(out, "{rule}");
    for r in records {
        let _ = writeln!(
            out,
            "{:<10} {:<20} {:<10}",
            r.id,
            r.name,
            format_grade(r.grade)
        );
    }
    let _ = writeln!(out, "{rule}");
    out
}

/// Print records as an aligned table to stdout.
pub fn print_table(records: &[Record]) {
    print!("{}", render_table(records));
}
