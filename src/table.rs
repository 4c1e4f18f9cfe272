use std::borrow::Cow;
use std::fmt::Write as _;

use crate::data::PopulationData;
use crate::stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Renders an aligned plain-text table. Columns beyond `aligns` are
/// left-aligned.
pub fn render_table(headers: &[String], rows: &[Vec<String>], aligns: &[Align]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| display_width(h).max(1))
        .collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    let align_of = |idx: usize| aligns.get(idx).copied().unwrap_or(Align::Left);

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &align_of));
    let rule = widths
        .iter()
        .map(|w| "-".repeat((*w).max(3)))
        .collect::<Vec<_>>();
    let rule_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &rule_widths, &|_| Align::Left));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &align_of));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>], aligns: &[Align]) {
    print!("{}", render_table(headers, rows, aligns));
}

/// Header and rows for an age-group listing. With `percent` every count is
/// shown as a share of the grand total instead of absolutely.
pub fn age_group_table(data: &PopulationData, percent: bool) -> (Vec<String>, Vec<Vec<String>>) {
    let names: &[&str] = if percent {
        &["age", "male %", "female %", "total %"]
    } else {
        &["age", "male", "female", "total", "male %", "female %"]
    };
    let headers = names.iter().map(|h| h.to_string()).collect();
    let grand_total = stats::totals(&data.age_groups).total;
    let share = |value: f64| format!("{:.2}", stats::to_percent(value, grand_total));
    let rows = data
        .age_groups
        .iter()
        .map(|group| {
            let mut row = vec![group.age.clone()];
            if percent {
                row.extend([group.male, group.female, group.total()].map(&share));
            } else {
                row.extend([group.male, group.female, group.total()].map(format_count));
                row.extend([group.male, group.female].map(&share));
            }
            row
        })
        .collect();
    (headers, rows)
}

pub const AGE_GROUP_ALIGNS: [Align; 6] = [
    Align::Left,
    Align::Right,
    Align::Right,
    Align::Right,
    Align::Right,
    Align::Right,
];

/// Integral counts print without a fractional part.
pub fn format_count(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn format_row(values: &[String], widths: &[usize], align_of: &dyn Fn(usize) -> Align) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let sanitized = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
            match align_of(idx) {
                Align::Left => format!("{sanitized}{padding}"),
                Align::Right => format!("{padding}{sanitized}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
