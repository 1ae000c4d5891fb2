//! Named column reductions.
//!
//! Reductions are a closed set looked up by name, so a dictionary's
//! `Default Aggregation` hint selects one of these variants and is never
//! evaluated as code.

use std::{fmt, str::FromStr};

use crate::value::{Cell, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Aggregation {
    Sum,
    Mean,
    Count,
    Min,
    Max,
    Median,
    Std,
}

const LOOKUP: &[(&str, Aggregation)] = &[
    ("sum", Aggregation::Sum),
    ("mean", Aggregation::Mean),
    ("count", Aggregation::Count),
    ("min", Aggregation::Min),
    ("max", Aggregation::Max),
    ("median", Aggregation::Median),
    ("std", Aggregation::Std),
];

impl Aggregation {
    /// The pair `add_stats` prepends, in row order.
    pub const STATS: [Aggregation; 2] = [Aggregation::Sum, Aggregation::Mean];

    pub fn key(&self) -> &'static str {
        LOOKUP
            .iter()
            .find(|(_, agg)| agg == self)
            .map(|(key, _)| *key)
            .unwrap_or_default()
    }

    /// Row label used when the reduction is shown as a synthetic row.
    pub fn label(&self) -> &'static str {
        match self {
            Aggregation::Sum => "Total",
            Aggregation::Mean => "Average",
            Aggregation::Count => "Count",
            Aggregation::Min => "Minimum",
            Aggregation::Max => "Maximum",
            Aggregation::Median => "Median",
            Aggregation::Std => "Std Dev",
        }
    }

    /// Reduces the numeric cells of a column. Missing and non-numeric cells
    /// are skipped, except by `Count` which counts every present cell.
    pub fn apply(&self, cells: &[Cell]) -> Option<Value> {
        if let Aggregation::Count = self {
            let present = cells.iter().filter(|cell| cell.is_some()).count();
            return Some(Value::Integer(present as i64));
        }
        let stats = ColumnStats::collect(cells);
        match self {
            Aggregation::Sum => Some(stats.sum()),
            Aggregation::Mean => stats.mean().map(Value::Float),
            Aggregation::Min => stats.min(),
            Aggregation::Max => stats.max(),
            Aggregation::Median => stats.median().map(Value::Float),
            Aggregation::Std => stats.std_dev().map(Value::Float),
            Aggregation::Count => None,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let token = normalized.strip_suffix("()").unwrap_or(&normalized).trim();
        LOOKUP
            .iter()
            .find(|(key, _)| *key == token)
            .map(|(_, agg)| *agg)
            .ok_or_else(|| {
                let known = LOOKUP.iter().map(|(key, _)| *key).collect::<Vec<_>>();
                format!(
                    "Unknown aggregation '{}'. Supported aggregations: {}",
                    value.trim(),
                    known.join(", ")
                )
            })
    }
}

struct ColumnStats {
    values: Vec<f64>,
    sum: f64,
    sum_squares: f64,
    integer_sum: Option<i64>,
    integer_min: Option<i64>,
    integer_max: Option<i64>,
    all_integer: bool,
}

impl ColumnStats {
    fn collect(cells: &[Cell]) -> Self {
        let mut stats = Self {
            values: Vec::new(),
            sum: 0.0,
            sum_squares: 0.0,
            integer_sum: Some(0),
            integer_min: None,
            integer_max: None,
            all_integer: true,
        };
        for value in cells.iter().flatten() {
            stats.add_value(value);
        }
        stats
    }

    fn add_value(&mut self, value: &Value) {
        let numeric = match value {
            Value::Integer(i) => {
                self.integer_sum = self.integer_sum.and_then(|sum| sum.checked_add(*i));
                self.integer_min = Some(self.integer_min.map_or(*i, |current| current.min(*i)));
                self.integer_max = Some(self.integer_max.map_or(*i, |current| current.max(*i)));
                *i as f64
            }
            Value::Float(f) if !f.is_nan() => {
                self.all_integer = false;
                *f
            }
            _ => return,
        };
        self.sum += numeric;
        self.sum_squares += numeric * numeric;
        self.values.push(numeric);
    }

    fn count(&self) -> usize {
        self.values.len()
    }

    fn sum(&self) -> Value {
        match (self.all_integer, self.integer_sum) {
            (true, Some(sum)) => Value::Integer(sum),
            _ => Value::Float(self.sum),
        }
    }

    fn mean(&self) -> Option<f64> {
        if self.count() > 0 {
            Some(self.sum / self.count() as f64)
        } else {
            None
        }
    }

    fn min(&self) -> Option<Value> {
        if self.all_integer {
            return self.integer_min.map(Value::Integer);
        }
        self.values.iter().copied().reduce(f64::min).map(Value::Float)
    }

    fn max(&self) -> Option<Value> {
        if self.all_integer {
            return self.integer_max.map(Value::Integer);
        }
        self.values.iter().copied().reduce(f64::max).map(Value::Float)
    }

    fn median(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len().is_multiple_of(2) {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    fn std_dev(&self) -> Option<f64> {
        let count = self.count();
        if count < 2 {
            return None;
        }
        let mean = self.mean()?;
        let variance = (self.sum_squares - count as f64 * mean * mean) / (count as f64 - 1.0);
        Some(variance.max(0.0).sqrt())
    }
}
