//! Supported dictionary `Type` values and their coercion strategies.
//!
//! Every dictionary row resolves its `Type` token to a [`FieldType`] once,
//! while the dictionary is validated. The remapper then dispatches on the
//! variant instead of re-reading the token for every cell.

use std::{fmt, str::FromStr};

use crate::value::{Cell, Value, parse_duration, parse_naive_datetime, seconds_to_duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Float,
    Float32,
    Float64,
    Int,
    Int32,
    Int64,
    Object,
    Str,
    Bool,
    DateTime,
    TimeDelta,
    Category,
}

impl FieldType {
    pub const ALL: [FieldType; 12] = [
        FieldType::Float,
        FieldType::Float32,
        FieldType::Float64,
        FieldType::Int,
        FieldType::Int32,
        FieldType::Int64,
        FieldType::Object,
        FieldType::Str,
        FieldType::Bool,
        FieldType::DateTime,
        FieldType::TimeDelta,
        FieldType::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Float => "float",
            FieldType::Float32 => "float32",
            FieldType::Float64 => "float64",
            FieldType::Int => "int",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Object => "object",
            FieldType::Str => "str",
            FieldType::Bool => "bool",
            FieldType::DateTime => "datetime64",
            FieldType::TimeDelta => "timedelta",
            FieldType::Category => "category",
        }
    }

    pub fn variants() -> Vec<&'static str> {
        Self::ALL.iter().map(FieldType::as_str).collect()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Float
                | FieldType::Float32
                | FieldType::Float64
                | FieldType::Int
                | FieldType::Int32
                | FieldType::Int64
        )
    }

    /// Converts one non-missing value to this type.
    ///
    /// `Str` and `Bool` are normalised by the remapper's dedicated passes and
    /// are returned unchanged here, as is `Object`.
    pub fn coerce(&self, value: &Value) -> Result<Value, String> {
        match self {
            FieldType::Int | FieldType::Int64 => to_integer(value).map(Value::Integer),
            FieldType::Int32 => {
                let parsed = to_integer(value)?;
                i32::try_from(parsed)
                    .map(|v| Value::Integer(i64::from(v)))
                    .map_err(|_| format!("{parsed} is out of range for int32"))
            }
            FieldType::Float | FieldType::Float64 => to_float(value).map(Value::Float),
            FieldType::Float32 => to_float(value).map(|v| Value::Float(f64::from(v as f32))),
            FieldType::DateTime => match value {
                Value::DateTime(_) => Ok(value.clone()),
                Value::String(s) => parse_naive_datetime(s)
                    .map(Value::DateTime)
                    .ok_or_else(|| format!("cannot parse '{s}' as datetime")),
                other => Err(incompatible(other, self)),
            },
            FieldType::TimeDelta => match value {
                Value::Duration(_) => Ok(value.clone()),
                Value::String(s) => parse_duration(s)
                    .map(Value::Duration)
                    .ok_or_else(|| format!("cannot parse '{s}' as timedelta")),
                Value::Integer(i) => seconds_to_duration(*i as f64)
                    .map(Value::Duration)
                    .ok_or_else(|| format!("{i} seconds is out of range for timedelta")),
                Value::Float(f) => seconds_to_duration(*f)
                    .map(Value::Duration)
                    .ok_or_else(|| format!("{f} seconds is out of range for timedelta")),
                other => Err(incompatible(other, self)),
            },
            FieldType::Category => Ok(match value {
                Value::String(_) => value.clone(),
                other => Value::String(other.as_display()),
            }),
            FieldType::Object | FieldType::Str | FieldType::Bool => Ok(value.clone()),
        }
    }

    /// Converts a whole column, or nothing: the first failing cell aborts the
    /// conversion and the column is returned untouched alongside the reason.
    pub fn coerce_column(&self, cells: &[Cell]) -> Result<Vec<Cell>, String> {
        cells
            .iter()
            .map(|cell| match cell {
                Some(value) => self.coerce(value).map(Some),
                None => Ok(None),
            })
            .collect()
    }
}

fn incompatible(value: &Value, ty: &FieldType) -> String {
    format!(
        "cannot convert {} value '{}' to {}",
        value.type_name(),
        value.as_display(),
        ty
    )
}

fn to_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Boolean(b) => Ok(i64::from(*b)),
        Value::Float(f)
            if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f) =>
        {
            Ok(*f as i64)
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("cannot parse '{s}' as integer")),
        other => Err(format!(
            "cannot convert {} value '{}' to integer",
            other.type_name(),
            other.as_display()
        )),
    }
}

fn to_float(value: &Value) -> Result<f64, String> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("cannot parse '{s}' as float")),
        other => Err(format!(
            "cannot convert {} value '{}' to float",
            other.type_name(),
            other.as_display()
        )),
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let token = value.trim();
        FieldType::ALL
            .iter()
            .find(|ty| ty.as_str() == token)
            .copied()
            .ok_or_else(|| {
                format!(
                    "Unknown type '{token}'. Supported types: {}",
                    FieldType::variants().join(", ")
                )
            })
    }
}
