//! # Filter Evaluator
//!
//! Applies a [`Predicate`] to a snapshot. All clauses are ANDed. A non-`any`
//! clause whose value is blank or unparseable is skipped (fail-open) and the
//! remaining clauses are still evaluated.

use crate::glob::NameMatcher;
use crate::predicate::{parse_value, AgeOp, CountOp, Predicate};
use crate::stream::StreamSummary;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy)]
enum AgeCheck {
    Pass,
    Greater(Duration),
    Less(Duration),
    Around(Duration),
}

#[derive(Debug, Clone, Copy)]
enum CountCheck {
    Pass,
    Equal(i64),
    Greater(i64),
    Less(i64),
}

impl CountCheck {
    fn new(op: CountOp, raw: &str) -> Self {
        let Some(target) = parse_value(raw) else {
            return Self::Pass;
        };
        match op {
            CountOp::Any => Self::Pass,
            CountOp::Equal => Self::Equal(target),
            CountOp::GreaterThan => Self::Greater(target),
            CountOp::LessThan => Self::Less(target),
        }
    }

    fn matches(&self, actual: u64) -> bool {
        let actual = actual as i128;
        match *self {
            Self::Pass => true,
            Self::Equal(t) => actual == t as i128,
            Self::Greater(t) => actual > t as i128,
            Self::Less(t) => actual < t as i128,
        }
    }
}

impl AgeCheck {
    fn new(predicate: &Predicate) -> Self {
        if predicate.age_op == AgeOp::Any {
            return Self::Pass;
        }
        let target = parse_value(&predicate.age_value).and_then(|v| predicate.age_unit.duration(v));
        let Some(target) = target else {
            return Self::Pass;
        };
        match predicate.age_op {
            AgeOp::Any => Self::Pass,
            AgeOp::GreaterThan => Self::Greater(target),
            AgeOp::LessThan => Self::Less(target),
            AgeOp::Equal => Self::Around(target),
        }
    }

    fn matches(&self, age: Duration) -> bool {
        match *self {
            Self::Pass => true,
            Self::Greater(t) => age > t,
            Self::Less(t) => age < t,
            Self::Around(t) => {
                let age = age.num_milliseconds() as i128;
                let target = t.num_milliseconds() as i128;
                age * 10 >= target * 9 && age * 10 <= target * 11
            }
        }
    }
}

/// A [`Predicate`] with its pattern compiled and values parsed, ready to be
/// applied to many streams.
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    name: NameMatcher,
    age: AgeCheck,
    consumers: CountCheck,
    messages: CountCheck,
}

impl CompiledPredicate {
    pub fn compile(predicate: &Predicate) -> Self {
        Self {
            name: NameMatcher::new(&predicate.name_pattern),
            age: AgeCheck::new(predicate),
            consumers: CountCheck::new(predicate.consumer_op, &predicate.consumer_value),
            messages: CountCheck::new(predicate.messages_op, &predicate.messages_value),
        }
    }

    pub fn matches(&self, stream: &StreamSummary, now: DateTime<Utc>) -> bool {
        self.name.matches(&stream.name)
            && self.age.matches(stream.age(now))
            && self.consumers.matches(stream.consumers as u64)
            && self.messages.matches(stream.messages)
    }
}

/// Evaluate `predicate` against `snapshot`, keeping snapshot order.
pub fn evaluate(
    predicate: &Predicate,
    snapshot: &[StreamSummary],
    now: DateTime<Utc>,
) -> Vec<StreamSummary> {
    let compiled = CompiledPredicate::compile(predicate);
    snapshot
        .iter()
        .filter(|s| compiled.matches(s, now))
        .cloned()
        .collect()
}
