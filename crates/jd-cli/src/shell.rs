//! Line-based query builder session.
//!
//! One command per line; the session keeps the filter, the matched set
//! and any running bulk action between lines.

use crate::clauses::{AgeClause, CountClause};
use crate::render;
use chrono::Utc;
use jd_core::{BulkAction, SortColumn};
use jd_hub::{QueryController, WorkflowState};
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Filter:   name <glob> | age <op><n>[m|h] | consumers <op><n> | messages <op><n> | clear
Preview:  preview | sort <name|age|msgs|consumers>
Actions:  delete | purge | yes | no | wait
Filters:  save <name> | load <name> | presets
Other:    status | help | quit
Operators are >, < and =; use `any` to drop a clause.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Name(String),
    Age(AgeClause),
    Consumers(CountClause),
    Messages(CountClause),
    Clear,
    Preview,
    Sort(SortColumn),
    Bulk(BulkAction),
    Yes,
    No,
    Wait,
    Save(String),
    Load(String),
    Presets,
    Status,
    Help,
    Quit,
}

fn parse_column(raw: &str) -> Result<SortColumn, String> {
    match raw.to_ascii_lowercase().as_str() {
        "name" => Ok(SortColumn::Name),
        "age" => Ok(SortColumn::Age),
        "msgs" | "messages" => Ok(SortColumn::Messages),
        "consumers" => Ok(SortColumn::Consumers),
        other => other
            .parse::<usize>()
            .ok()
            .and_then(SortColumn::from_index)
            .ok_or_else(|| format!("Unknown column: '{}'", raw)),
    }
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let required = |what: &str| -> Result<String, String> {
            if rest.is_empty() {
                Err(format!("usage: {} <{}>", word, what))
            } else {
                Ok(rest.to_string())
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name(required("glob")?)),
            "age" => Ok(Self::Age(required("clause")?.parse()?)),
            "consumers" => Ok(Self::Consumers(required("clause")?.parse()?)),
            "messages" | "msgs" => Ok(Self::Messages(required("clause")?.parse()?)),
            "clear" => Ok(Self::Clear),
            "preview" | "p" => Ok(Self::Preview),
            "sort" => Ok(Self::Sort(parse_column(&required("column")?)?)),
            "delete" => Ok(Self::Bulk(BulkAction::Delete)),
            "purge" => Ok(Self::Bulk(BulkAction::Purge)),
            "yes" | "y" => Ok(Self::Yes),
            "no" | "n" => Ok(Self::No),
            "wait" => Ok(Self::Wait),
            "save" => Ok(Self::Save(required("name")?)),
            "load" => Ok(Self::Load(required("name")?)),
            "presets" => Ok(Self::Presets),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("Unknown command: '{}' (try `help`)", other)),
        }
    }
}

fn show_matches(controller: &QueryController) {
    println!(
        "{}",
        render::streams_table(controller.matched(), controller.sort_state(), Utc::now())
    );
}

/// Apply one command. `Ok(false)` ends the session.
async fn dispatch(controller: &mut QueryController, command: ShellCommand) -> jd_hub::Result<bool> {
    match command {
        ShellCommand::Name(glob) => controller.set_name_pattern(glob)?,
        ShellCommand::Age(a) => controller.set_age(a.op, a.value, a.unit)?,
        ShellCommand::Consumers(c) => controller.set_consumers(c.op, c.value)?,
        ShellCommand::Messages(m) => controller.set_messages(m.op, m.value)?,
        ShellCommand::Clear => {
            controller.clear()?;
            println!("Filter cleared.");
        }
        ShellCommand::Preview => {
            controller.preview().await?;
            show_matches(controller);
        }
        ShellCommand::Sort(column) => {
            controller.toggle_sort(column)?;
            show_matches(controller);
        }
        ShellCommand::Bulk(action) => {
            let prompt = controller.request(action)?;
            println!("{}\n\nType `yes` to continue or `no` to cancel.", prompt.message());
        }
        ShellCommand::Yes => {
            controller.confirm()?;
            println!("Running...");
        }
        ShellCommand::No => {
            controller.cancel()?;
            println!("Cancelled.");
        }
        ShellCommand::Wait => {
            let report = controller.wait_bulk().await?;
            println!("{}", report.summary());
        }
        ShellCommand::Save(name) => {
            controller.save_preset(&name).await?;
            println!("Filter '{}' saved.", name.trim());
        }
        ShellCommand::Load(name) => {
            controller.load_preset(&name).await?;
            show_matches(controller);
        }
        ShellCommand::Presets => {
            println!("{}", render::presets_table(&controller.list_presets().await?));
        }
        ShellCommand::Status => {
            println!("state:  {}", controller.state());
            println!("filter: {}", controller.predicate().describe());
            println!("matched: {}", controller.matched().len());
            if controller.is_read_only() {
                println!("mode:   read-only");
            }
            if let Some(report) = controller.last_report() {
                println!("last:   {} ({})", report.summary().replace("\n\n", ", ").replace('\n', ", "), report.id);
            }
        }
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Quit => {
            // A started run is never abandoned halfway.
            if matches!(controller.state(), WorkflowState::Executing(_)) {
                println!("Waiting for the running action to finish...");
                let report = controller.wait_bulk().await?;
                println!("{}", report.summary());
            }
            return Ok(false);
        }
    }
    Ok(true)
}

pub async fn run(controller: &mut QueryController) -> anyhow::Result<()> {
    println!("jetdeck shell. Type `help` for commands.");
    if controller.is_read_only() {
        println!("Read-only mode: delete and purge are disabled.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match controller.poll_bulk().await {
            Ok(Some(report)) => println!("{}", report.summary()),
            Ok(None) => {}
            Err(e) => eprintln!("error: {}", e),
        }
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<ShellCommand>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        match dispatch(controller, command).await {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(e) => eprintln!("error: {}", e),
        }
    }

    // stdin closed
    if matches!(controller.state(), WorkflowState::Executing(_)) {
        let report = controller.wait_bulk().await?;
        println!("{}", report.summary());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jd_core::{AgeOp, AgeUnit, CountOp};

    #[test]
    fn test_parse_filter_commands() {
        assert_eq!(
            "name order-*".parse::<ShellCommand>().unwrap(),
            ShellCommand::Name("order-*".into())
        );
        assert_eq!(
            "age >24h".parse::<ShellCommand>().unwrap(),
            ShellCommand::Age(AgeClause {
                op: AgeOp::GreaterThan,
                value: "24".into(),
                unit: AgeUnit::Hours
            })
        );
        assert_eq!(
            "  MESSAGES  =0 ".parse::<ShellCommand>().unwrap(),
            ShellCommand::Messages(CountClause {
                op: CountOp::Equal,
                value: "0".into()
            })
        );
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            "purge".parse::<ShellCommand>().unwrap(),
            ShellCommand::Bulk(BulkAction::Purge)
        );
        assert_eq!("y".parse::<ShellCommand>().unwrap(), ShellCommand::Yes);
        assert_eq!(
            "sort msgs".parse::<ShellCommand>().unwrap(),
            ShellCommand::Sort(SortColumn::Messages)
        );
        assert_eq!(
            "sort 3".parse::<ShellCommand>().unwrap(),
            ShellCommand::Sort(SortColumn::Consumers)
        );
        assert_eq!(
            "save old orders".parse::<ShellCommand>().unwrap(),
            ShellCommand::Save("old orders".into())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!("frobnicate".parse::<ShellCommand>().is_err());
        assert!("name".parse::<ShellCommand>().is_err());
        assert!("sort size".parse::<ShellCommand>().is_err());
        assert!("consumers 5".parse::<ShellCommand>().is_err());
    }
}
