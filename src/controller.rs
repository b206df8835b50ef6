use tracing::trace;

use crate::domain::{Message, TEError};
use crate::field::{Field, Value};
use crate::table::Row;

/// Turns textual commands into messages, the way a front end maps its input events.
pub struct Controller;

impl Controller {
    pub fn handle_command(line: &str) -> Result<Message, TEError> {
        let line = line.trim();
        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let message = match cmd {
            "add" => Message::AddRow(Self::parse_row(rest)?),
            "new" => Message::AddBlankRow,
            "delete" => Message::DeleteRow(Self::required(rest, "delete <id>")?),
            "sort" => Message::SortRows(Self::required(rest, "sort <column>")?),
            "search" => Message::SetSearchQuery(rest.to_string()),
            "page" => Message::SetCurrentPage(Self::index(rest, "page <n>")?),
            "edit" => Message::StartEditing(Self::required(rest, "edit <id>")?),
            "set" => Self::parse_set(rest)?,
            "save" => Message::SaveAllEdits,
            "cancel" => Message::CancelAllEdits,
            "toggle" => Message::ToggleColumn(Self::required(rest, "toggle <column>")?),
            "columns" => Message::SetVisibleColumns(
                rest.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            "add-column" => Message::AddColumn(rest.to_string()),
            "move-column" => {
                let (from, to) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| TEError::InvalidCommand("move-column <from> <to>".into()))?;
                Message::MoveColumn {
                    from: Self::index(from, "move-column <from> <to>")?,
                    to: Self::index(to.trim(), "move-column <from> <to>")?,
                }
            }
            other => return Err(TEError::InvalidCommand(format!("unknown command \"{other}\""))),
        };
        trace!("Mapped: {line:?} => {message:?}");
        Ok(message)
    }

    fn required(arg: &str, usage: &str) -> Result<String, TEError> {
        if arg.is_empty() {
            Err(TEError::InvalidCommand(format!("usage: {usage}")))
        } else {
            Ok(arg.to_string())
        }
    }

    fn index(arg: &str, usage: &str) -> Result<usize, TEError> {
        arg.trim()
            .parse()
            .map_err(|_| TEError::InvalidCommand(format!("usage: {usage}")))
    }

    fn field(name: &str) -> Result<Field, TEError> {
        name.parse::<Field>().map_err(TEError::InvalidCommand)
    }

    // set <id> <field> <value...>; the value may contain spaces or be empty.
    fn parse_set(rest: &str) -> Result<Message, TEError> {
        let usage = || TEError::InvalidCommand("usage: set <id> <field> <value>".into());
        let (id, rest) = rest.split_once(char::is_whitespace).ok_or_else(usage)?;
        let rest = rest.trim_start();
        let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if field.is_empty() {
            return Err(usage());
        }
        Ok(Message::UpdateEditingRow {
            id: id.to_string(),
            field: Self::field(field)?,
            value: Value::text(value.trim_start()),
        })
    }

    // add <id> [field=value ...]; age values become numbers like an import would.
    fn parse_row(rest: &str) -> Result<Row, TEError> {
        let mut parts = rest.split_whitespace();
        let id = parts
            .next()
            .ok_or_else(|| TEError::InvalidCommand("usage: add <id> [field=value ...]".into()))?;
        let mut row = Row::new(id);
        for part in parts {
            let (name, value) = part
                .split_once('=')
                .ok_or_else(|| TEError::InvalidCommand(format!("expected field=value, got \"{part}\"")))?;
            let field = Self::field(name)?;
            let value = if field.is_numeric() {
                Value::coerce_number(value)
            } else {
                Value::text(value)
            };
            row.set(field, value);
        }
        Ok(row)
    }
}
