//! Line commands understood by the `repl` subcommand, plus the small argument
//! parsers shared with the one-shot `search` subcommand.

use anyhow::{anyhow, bail, Context, Result};
use shared::{FilterType, FilterValue, SortDirection};

pub const HELP: &str = "\
commands:
  q <term>                          search for <term> (resets page and filters)
  suggest <term>                    autocomplete results and suggestions
  filter <all|any|none> <field> <value>
                                    add a value to a field's filter
  only <all|any|none> <field> <value>
                                    replace a field's filter with one value
  unfilter <field> [value]          remove one value, or the whole field
  clear                             remove every filter
  page <n> | size <n>               change page or page size
  sort <field> [asc|desc]           sort results; an empty field clears sorting
  click <document-id>               report a click on a result
  reset                             back to the starting state
  back | forward                    walk the location history
  state                             print the full state as JSON
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    Suggest(String),
    AddFilter {
        field: String,
        value: FilterValue,
        filter_type: FilterType,
    },
    SetFilter {
        field: String,
        value: FilterValue,
        filter_type: FilterType,
    },
    RemoveFilter {
        field: String,
        value: Option<FilterValue>,
    },
    ClearFilters,
    Page(u64),
    Size(u64),
    Sort {
        field: String,
        direction: SortDirection,
    },
    Click(String),
    Reset,
    Back,
    Forward,
    State,
    Help,
    Quit,
}

/// Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "q" | "search" => Command::Search(rest.to_string()),
        "suggest" => Command::Suggest(rest.to_string()),
        "filter" | "only" => {
            let (filter_type, field, value) = parse_filter_line(rest)?;
            if verb == "filter" {
                Command::AddFilter {
                    field,
                    value,
                    filter_type,
                }
            } else {
                Command::SetFilter {
                    field,
                    value,
                    filter_type,
                }
            }
        }
        "unfilter" => {
            let (field, value) = match rest.split_once(char::is_whitespace) {
                Some((field, value)) => (field, Some(parse_filter_value(value.trim()))),
                None => (rest, None),
            };
            if field.is_empty() {
                bail!("usage: unfilter <field> [value]");
            }
            Command::RemoveFilter {
                field: field.to_string(),
                value,
            }
        }
        "clear" => Command::ClearFilters,
        "page" => Command::Page(parse_count("page", rest)?),
        "size" => Command::Size(parse_count("size", rest)?),
        "sort" => {
            let mut parts = rest.split_whitespace();
            let field = parts.next().unwrap_or_default().to_string();
            let direction = match parts.next() {
                Some(raw) => raw.parse::<SortDirection>()?,
                None if field.is_empty() => SortDirection::Unset,
                None => SortDirection::Asc,
            };
            Command::Sort { field, direction }
        }
        "click" => {
            if rest.is_empty() {
                bail!("usage: click <document-id>");
            }
            Command::Click(rest.to_string())
        }
        "reset" => Command::Reset,
        "back" => Command::Back,
        "forward" => Command::Forward,
        "state" => Command::State,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{other}', try 'help'"),
    };
    Ok(Some(command))
}

fn parse_filter_line(rest: &str) -> Result<(FilterType, String, FilterValue)> {
    let mut parts = rest.splitn(3, char::is_whitespace);
    let (Some(filter_type), Some(field), Some(value)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("usage: filter <all|any|none> <field> <value>");
    };
    let filter_type = filter_type.parse::<FilterType>()?;
    Ok((filter_type, field.to_string(), parse_filter_value(value.trim())))
}

/// JSON literals (numbers, booleans, range objects) are taken as JSON; any
/// other text is a plain string value.
pub fn parse_filter_value(raw: &str) -> FilterValue {
    serde_json::from_str::<FilterValue>(raw)
        .unwrap_or_else(|_| FilterValue::String(raw.to_string()))
}

/// `field=value`, as accepted by `search --filter`.
pub fn parse_filter_arg(raw: &str) -> Result<(String, FilterValue)> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("filter '{raw}' must look like field=value"))?;
    if field.trim().is_empty() {
        bail!("filter '{raw}' has an empty field name");
    }
    Ok((field.trim().to_string(), parse_filter_value(value.trim())))
}

/// `field` or `field:asc|desc`, as accepted by `search --sort`.
pub fn parse_sort_arg(raw: &str) -> Result<(String, SortDirection)> {
    match raw.split_once(':') {
        Some((field, direction)) => Ok((field.to_string(), direction.parse::<SortDirection>()?)),
        None => Ok((raw.to_string(), SortDirection::Asc)),
    }
}

fn parse_count(name: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .with_context(|| format!("{name} needs a whole number, got '{raw}'"))
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
