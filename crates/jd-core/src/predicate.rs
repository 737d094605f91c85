//! # Filter Predicate
//!
//! The operator-editable filter form of the query builder. Numeric values
//! are kept as the raw text that was typed: whether a value parses is a
//! property of evaluation, not of editing.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparator for the age clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeOp {
    #[default]
    #[serde(rename = "any")]
    Any,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    /// Within ±10% of the target.
    #[serde(rename = "=")]
    Equal,
}

/// Comparator for the consumer-count and message-count clauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountOp {
    #[default]
    #[serde(rename = "any")]
    Any,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeUnit {
    #[serde(rename = "m")]
    Minutes,
    #[default]
    #[serde(rename = "h")]
    Hours,
}

/// The numeric clauses of a [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    Age,
    Consumers,
    Messages,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Age => write!(f, "age"),
            Self::Consumers => write!(f, "consumers"),
            Self::Messages => write!(f, "messages"),
        }
    }
}

impl fmt::Display for AgeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::GreaterThan => write!(f, ">"),
            Self::LessThan => write!(f, "<"),
            Self::Equal => write!(f, "="),
        }
    }
}

impl fmt::Display for CountOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Equal => write!(f, "="),
            Self::GreaterThan => write!(f, ">"),
            Self::LessThan => write!(f, "<"),
        }
    }
}

impl fmt::Display for AgeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minutes => write!(f, "m"),
            Self::Hours => write!(f, "h"),
        }
    }
}

impl FromStr for AgeOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" | "" => Ok(Self::Any),
            ">" | "gt" => Ok(Self::GreaterThan),
            "<" | "lt" => Ok(Self::LessThan),
            "=" | "==" | "eq" => Ok(Self::Equal),
            other => Err(format!("Unknown age operator: '{}'", other)),
        }
    }
}

impl FromStr for CountOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" | "" => Ok(Self::Any),
            "=" | "==" | "eq" => Ok(Self::Equal),
            ">" | "gt" => Ok(Self::GreaterThan),
            "<" | "lt" => Ok(Self::LessThan),
            other => Err(format!("Unknown count operator: '{}'", other)),
        }
    }
}

impl FromStr for AgeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "min" | "minutes" => Ok(Self::Minutes),
            "h" | "hours" => Ok(Self::Hours),
            other => Err(format!("Unknown age unit: '{}'", other)),
        }
    }
}

impl AgeUnit {
    /// Converts `value` units into a duration, `None` on overflow.
    pub fn duration(&self, value: i64) -> Option<Duration> {
        match self {
            Self::Minutes => Duration::try_minutes(value),
            Self::Hours => Duration::try_hours(value),
        }
    }
}

/// Parses a clause value the way the filter form accepts it.
///
/// Reads an optional sign and the leading run of digits, so `100x` is 100
/// and `1.5` is 1. Text with no leading digits, or a number that does not
/// fit in an `i64`, yields `None`.
pub fn parse_value(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let unsigned = trimmed
        .strip_prefix(|c| c == '+' || c == '-')
        .unwrap_or(trimmed);
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let end = trimmed.len() - unsigned.len() + digits;
    trimmed[..end].parse::<i64>().ok()
}

/// The full set of filter clauses configured by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Glob where `*` matches any sequence. `*` or empty matches all.
    pub name_pattern: String,
    pub age_op: AgeOp,
    pub age_value: String,
    pub age_unit: AgeUnit,
    pub consumer_op: CountOp,
    pub consumer_value: String,
    pub messages_op: CountOp,
    pub messages_value: String,
}

impl Default for Predicate {
    fn default() -> Self {
        Self {
            name_pattern: "*".to_string(),
            age_op: AgeOp::Any,
            age_value: String::new(),
            age_unit: AgeUnit::Hours,
            consumer_op: CountOp::Any,
            consumer_value: String::new(),
            messages_op: CountOp::Any,
            messages_value: String::new(),
        }
    }
}

impl Predicate {
    pub fn with_name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.name_pattern = pattern.into();
        self
    }

    pub fn with_age(mut self, op: AgeOp, value: impl Into<String>, unit: AgeUnit) -> Self {
        self.age_op = op;
        self.age_value = value.into();
        self.age_unit = unit;
        self
    }

    pub fn with_consumers(mut self, op: CountOp, value: impl Into<String>) -> Self {
        self.consumer_op = op;
        self.consumer_value = value.into();
        self
    }

    pub fn with_messages(mut self, op: CountOp, value: impl Into<String>) -> Self {
        self.messages_op = op;
        self.messages_value = value.into();
        self
    }

    /// True when every clause is unrestricted.
    pub fn is_match_all(&self) -> bool {
        (self.name_pattern.is_empty() || self.name_pattern == "*")
            && self.age_op == AgeOp::Any
            && self.consumer_op == CountOp::Any
            && self.messages_op == CountOp::Any
    }

    /// Non-`any` clauses whose value is blank or cannot be used.
    ///
    /// These clauses are skipped by the evaluator; a strict caller can
    /// refuse to evaluate instead.
    pub fn invalid_clauses(&self) -> Vec<Clause> {
        let mut invalid = Vec::new();
        if self.age_op != AgeOp::Any {
            let usable = parse_value(&self.age_value)
                .and_then(|v| self.age_unit.duration(v))
                .is_some();
            if !usable {
                invalid.push(Clause::Age);
            }
        }
        if self.consumer_op != CountOp::Any && parse_value(&self.consumer_value).is_none() {
            invalid.push(Clause::Consumers);
        }
        if self.messages_op != CountOp::Any && parse_value(&self.messages_value).is_none() {
            invalid.push(Clause::Messages);
        }
        invalid
    }

    /// One-line rendering, e.g. `name ~ order-* AND messages > 100`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.name_pattern.is_empty() && self.name_pattern != "*" {
            parts.push(format!("name ~ {}", self.name_pattern));
        }
        if self.age_op != AgeOp::Any {
            parts.push(format!(
                "age {} {}{}",
                self.age_op,
                self.age_value.trim(),
                self.age_unit
            ));
        }
        if self.consumer_op != CountOp::Any {
            parts.push(format!(
                "consumers {} {}",
                self.consumer_op,
                self.consumer_value.trim()
            ));
        }
        if self.messages_op != CountOp::Any {
            parts.push(format!(
                "messages {} {}",
                self.messages_op,
                self.messages_value.trim()
            ));
        }
        if parts.is_empty() {
            "all streams".to_string()
        } else {
            parts.join(" AND ")
        }
    }
}
