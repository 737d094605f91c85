//! Filter clauses as typed on the command line: `>100`, `=0`, `<30m`, `any`.

use clap::Args;
use jd_core::{AgeOp, AgeUnit, CountOp};
use jd_hub::{QueryController, Result};
use std::str::FromStr;

/// Splits a leading run of `<`, `>` and `=` off `raw`.
fn split_op(raw: &str) -> (&str, &str) {
    let end = raw
        .find(|c: char| !matches!(c, '<' | '>' | '='))
        .unwrap_or(raw.len());
    raw.split_at(end)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountClause {
    pub op: CountOp,
    pub value: String,
}

impl FromStr for CountClause {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("any") {
            return Ok(Self {
                op: CountOp::Any,
                value: String::new(),
            });
        }
        let (op, value) = split_op(raw);
        if op.is_empty() {
            return Err(format!("missing operator in '{}' (use >, < or =)", raw));
        }
        Ok(Self {
            op: op.parse()?,
            // Kept verbatim: an unparseable value is the evaluator's call.
            value: value.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeClause {
    pub op: AgeOp,
    pub value: String,
    pub unit: AgeUnit,
}

impl FromStr for AgeClause {
    type Err = String;

    /// `>24h`, `<30m`; a bare number means hours.
    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("any") {
            return Ok(Self {
                op: AgeOp::Any,
                value: String::new(),
                unit: AgeUnit::Hours,
            });
        }
        let (op, rest) = split_op(raw);
        if op.is_empty() {
            return Err(format!("missing operator in '{}' (use >, < or =)", raw));
        }
        let rest = rest.trim();
        let split = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '-'))
            .unwrap_or(rest.len());
        let (value, unit) = rest.split_at(split);
        let unit = if unit.trim().is_empty() {
            AgeUnit::Hours
        } else {
            unit.parse()?
        };
        Ok(Self {
            op: op.parse()?,
            value: value.to_string(),
            unit,
        })
    }
}

/// Filter flags shared by `preview`, `delete`, `purge` and `presets save`.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Start from a saved filter; other flags override its clauses.
    #[arg(long, short = 'p')]
    pub preset: Option<String>,

    /// Stream name glob. `*` is the only wildcard.
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Age since the first stored message, e.g. `>24h`, `<30m`, `=2h`.
    #[arg(long, allow_hyphen_values = true)]
    pub age: Option<AgeClause>,

    /// Consumer count, e.g. `=0`.
    #[arg(long, allow_hyphen_values = true)]
    pub consumers: Option<CountClause>,

    /// Message count, e.g. `>100`.
    #[arg(long, allow_hyphen_values = true)]
    pub messages: Option<CountClause>,
}

impl FilterArgs {
    pub fn has_clauses(&self) -> bool {
        self.name.is_some() || self.age.is_some() || self.consumers.is_some() || self.messages.is_some()
    }

    /// Load the preset (which previews it) and overlay the explicit clauses.
    pub async fn apply(&self, controller: &mut QueryController) -> Result<()> {
        if let Some(preset) = &self.preset {
            controller.load_preset(preset).await?;
        }
        if let Some(name) = &self.name {
            controller.set_name_pattern(name.clone())?;
        }
        if let Some(age) = &self.age {
            controller.set_age(age.op, age.value.clone(), age.unit)?;
        }
        if let Some(c) = &self.consumers {
            controller.set_consumers(c.op, c.value.clone())?;
        }
        if let Some(m) = &self.messages {
            controller.set_messages(m.op, m.value.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_clause() {
        let c: CountClause = ">100".parse().unwrap();
        assert_eq!(c.op, CountOp::GreaterThan);
        assert_eq!(c.value, "100");

        let c: CountClause = "= 0".parse().unwrap();
        assert_eq!((c.op, c.value.as_str()), (CountOp::Equal, "0"));

        let c: CountClause = "ANY".parse().unwrap();
        assert_eq!(c.op, CountOp::Any);

        assert!("100".parse::<CountClause>().is_err());
        assert!(">>1".parse::<CountClause>().is_err());
    }

    #[test]
    fn test_count_clause_keeps_unparseable_value() {
        let c: CountClause = "<lots".parse().unwrap();
        assert_eq!(c.op, CountOp::LessThan);
        assert_eq!(c.value, "lots");
    }

    #[test]
    fn test_age_clause() {
        let a: AgeClause = ">24h".parse().unwrap();
        assert_eq!((a.op, a.value.as_str(), a.unit), (AgeOp::GreaterThan, "24", AgeUnit::Hours));

        let a: AgeClause = "<30m".parse().unwrap();
        assert_eq!((a.op, a.value.as_str(), a.unit), (AgeOp::LessThan, "30", AgeUnit::Minutes));

        let a: AgeClause = "=2".parse().unwrap();
        assert_eq!((a.op, a.unit), (AgeOp::Equal, AgeUnit::Hours));

        assert!(">3d".parse::<AgeClause>().is_err());
        assert!("24h".parse::<AgeClause>().is_err());
    }
}
