use std::fmt::Write;

use crate::model::UIData;
use crate::view::SortDirection;

pub const COLUMN_WIDTH_MARGIN: usize = 1;
const MIN_COLUMN_WIDTH: usize = 3;

/// Plain text rendering of a snapshot: one header line, one line per row on
/// the current page, then drafts, errors and the status line.
pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new(max_column_width: usize) -> Self {
        Self {
            max_column_width: max_column_width.max(MIN_COLUMN_WIDTH),
        }
    }

    pub fn render(&self, data: &UIData) -> String {
        let columns: Vec<(String, Vec<String>)> = data
            .visible_columns
            .iter()
            .map(|name| {
                let cells = data
                    .rows
                    .iter()
                    .map(|row| {
                        row.column(name)
                            .map(|c| c.to_string().replace("\r\n", " ↵ ").replace('\n', " ↵ "))
                            .unwrap_or_default()
                    })
                    .collect();
                (name.clone(), cells)
            })
            .collect();
        let widths: Vec<usize> = columns
            .iter()
            .map(|(name, cells)| self.calculate_column_width(name, cells))
            .collect();

        let mut out = String::new();
        let header: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|((name, _), &w)| {
                let marker = match (&data.sort_by, data.sort_direction) {
                    (Some(s), SortDirection::Ascending) if s == name => "^",
                    (Some(s), SortDirection::Descending) if s == name => "v",
                    _ => "",
                };
                Self::pad(&Self::get_visible_name(format!("{name}{marker}"), w), w)
            })
            .collect();
        let _ = writeln!(out, "{:<14} {}", "id", header.join(" ").trim_end());

        for (ridx, row) in data.rows.iter().enumerate() {
            let cells: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|((_, cells), &w)| Self::pad(&Self::get_visible_name(cells[ridx].clone(), w), w))
                .collect();
            let edited = if data.drafts.iter().any(|d| d.id == row.id) { "*" } else { "" };
            let id = format!("{}{}", row.id, edited);
            let _ = writeln!(out, "{:<14} {}", id, cells.join(" ").trim_end());
        }

        let last_page = data.page_count.max(1);
        let _ = writeln!(
            out,
            "page {}/{} ({} of {} rows{})",
            data.current_page + 1,
            last_page,
            data.total_matches,
            data.total_rows,
            if data.search_query.is_empty() {
                String::new()
            } else {
                format!(", search \"{}\"", data.search_query)
            }
        );

        for draft in &data.drafts {
            let fields: Vec<String> = draft
                .fields
                .iter()
                .map(|(f, v)| format!("{f}={v}"))
                .collect();
            let _ = writeln!(out, "editing {}: {}", draft.id, fields.join(", "));
        }
        for error in &data.validation_errors {
            for (field, msg) in &error.errors {
                let _ = writeln!(out, "error {} {}: {}", error.id, field, msg);
            }
        }
        if !data.status_message.is_empty() {
            let _ = writeln!(out, "{}", data.status_message);
        }
        out
    }

    fn calculate_column_width(&self, name: &str, cells: &[String]) -> usize {
        let max_width = cells.iter().map(|c| c.chars().count()).max().unwrap_or(0);
        let width = std::cmp::max(name.chars().count() + 1, max_width) + COLUMN_WIDTH_MARGIN;
        std::cmp::min(width, self.max_column_width)
    }

    fn get_visible_name(name: String, width: usize) -> String {
        if width < 3 {
            return "".to_string();
        }
        if name.chars().count() > width {
            let mut reduced: String = name.chars().take(width - 3).collect();
            reduced.push_str("...");
            return reduced;
        }
        name
    }

    fn pad(s: &str, width: usize) -> String {
        let len = s.chars().count();
        format!("{s}{}", " ".repeat(width.saturating_sub(len)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Message, TEConfig};
    use crate::field::Field;
    use crate::model::Model;
    use crate::table::Row;

    #[test]
    fn truncates_long_cells() {
        assert_eq!(TableUI::get_visible_name("abcdefghij".into(), 6), "abc...");
        assert_eq!(TableUI::get_visible_name("abc".into(), 6), "abc");
        assert_eq!(TableUI::get_visible_name("abc".into(), 2), "");
    }

    #[test]
    fn renders_page_with_markers() {
        let mut model = Model::new(TEConfig::default());
        model
            .update(Message::AddRow(Row::new("1").with(Field::Name, "Ann").with(Field::Age, 31.0)))
            .unwrap();
        model
            .update(Message::AddRow(Row::new("2").with(Field::Name, "Bob").with(Field::Age, 22.0)))
            .unwrap();
        model
            .update(Message::SetVisibleColumns(vec!["name".into(), "age".into()]))
            .unwrap();
        model.update(Message::SortRows("age".into())).unwrap();
        model.update(Message::StartEditing("1".into())).unwrap();

        let text = TableUI::new(24).render(&model.uidata());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!("{:<14} {}", "id", "name   age^"));
        assert_eq!(lines[1], format!("{:<14} {}", "2", "Bob    22"));
        assert_eq!(lines[2], format!("{:<14} {}", "1*", "Ann    31"));
        assert_eq!(lines[3], "page 1/1 (2 of 2 rows)");
        assert_eq!(lines[4], "editing 1: name=Ann, age=31");
    }
}
