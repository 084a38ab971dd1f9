//! Coercion of raw source values into typed fields, and rendering back to text.

use crate::error::ParseError;
use crate::field::{Field, Node};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    path::PathBuf,
    time::Duration,
};

/// The declared shape of a leaf field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Shape {
    Bool,
    Integer,
    Float,
    Text,
    Duration,
    Sequence,
    Mapping,
    Custom,
}

impl Shape {
    /// Whether an empty raw value means something for this shape
    pub fn accepts_empty(self) -> bool {
        matches!(
            self,
            Shape::Text | Shape::Sequence | Shape::Mapping | Shape::Custom
        )
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Bool => "boolean",
            Shape::Integer => "integer",
            Shape::Float => "float",
            Shape::Text => "text",
            Shape::Duration => "duration",
            Shape::Sequence => "sequence",
            Shape::Mapping => "mapping",
            Shape::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// A value as a source hands it over, before coercion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Plain text, as found in environment variables and flags
    Text(String),
    /// An ordered list, as found in file arrays
    List(Vec<String>),
    /// Key/value pairs, as found in file tables
    Entries(Vec<(String, String)>),
}

impl RawValue {
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::Text(_) => "text",
            RawValue::List(_) => "list",
            RawValue::Entries(_) => "entries",
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(text) => f.write_str(text),
            RawValue::List(items) => f.write_str(&items.join(",")),
            RawValue::Entries(entries) => {
                let pairs: Vec<String> = entries.iter().map(|(k, v)| format!("{k}={v}")).collect();
                f.write_str(&pairs.join(","))
            }
        }
    }
}

/// A leaf field that can be set from a raw source value
pub trait Value {
    fn shape(&self) -> Shape;

    /// Replace the current value with one parsed from `raw`
    fn set(&mut self, raw: &RawValue) -> Result<(), ParseError>;

    /// Text that [`Value::set`] parses back into the current value
    fn render(&self) -> String;

    fn is_zero(&self) -> bool;
}

/// Element types usable as leaves and inside sequences and maps
pub trait Scalar: Sized {
    const SHAPE: Shape;

    fn parse_scalar(raw: &str) -> Result<Self, ParseError>;

    fn render_scalar(&self) -> String;

    fn is_zero_scalar(&self) -> bool;
}

macro_rules! integer_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Scalar for $ty {
            const SHAPE: Shape = Shape::Integer;

            fn parse_scalar(raw: &str) -> Result<Self, ParseError> {
                raw.parse::<$ty>().map_err(|e| ParseError::InvalidInteger {
                    raw: raw.to_string(),
                    reason: e.to_string(),
                })
            }

            fn render_scalar(&self) -> String {
                self.to_string()
            }

            fn is_zero_scalar(&self) -> bool {
                *self == 0
            }
        }
    )*};
}

integer_scalar!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Scalar for $ty {
            const SHAPE: Shape = Shape::Float;

            fn parse_scalar(raw: &str) -> Result<Self, ParseError> {
                raw.parse::<$ty>().map_err(|_| ParseError::InvalidFloat {
                    raw: raw.to_string(),
                })
            }

            fn render_scalar(&self) -> String {
                self.to_string()
            }

            fn is_zero_scalar(&self) -> bool {
                *self == 0.0
            }
        }
    )*};
}

float_scalar!(f32, f64);

impl Scalar for bool {
    const SHAPE: Shape = Shape::Bool;

    fn parse_scalar(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err(ParseError::InvalidBool {
                raw: raw.to_string(),
            }),
        }
    }

    fn render_scalar(&self) -> String {
        self.to_string()
    }

    fn is_zero_scalar(&self) -> bool {
        !*self
    }
}

impl Scalar for String {
    const SHAPE: Shape = Shape::Text;

    fn parse_scalar(raw: &str) -> Result<Self, ParseError> {
        Ok(raw.to_string())
    }

    fn render_scalar(&self) -> String {
        self.clone()
    }

    fn is_zero_scalar(&self) -> bool {
        self.is_empty()
    }
}

impl Scalar for char {
    const SHAPE: Shape = Shape::Text;

    fn parse_scalar(raw: &str) -> Result<Self, ParseError> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ParseError::InvalidChar {
                raw: raw.to_string(),
            }),
        }
    }

    fn render_scalar(&self) -> String {
        self.to_string()
    }

    fn is_zero_scalar(&self) -> bool {
        *self == '\0'
    }
}

impl Scalar for PathBuf {
    const SHAPE: Shape = Shape::Text;

    fn parse_scalar(raw: &str) -> Result<Self, ParseError> {
        Ok(PathBuf::from(raw))
    }

    fn render_scalar(&self) -> String {
        self.display().to_string()
    }

    fn is_zero_scalar(&self) -> bool {
        self.as_os_str().is_empty()
    }
}

// Selected by type: a Duration never goes through the plain integer path.
impl Scalar for Duration {
    const SHAPE: Shape = Shape::Duration;

    fn parse_scalar(raw: &str) -> Result<Self, ParseError> {
        if raw == "0" {
            return Ok(Duration::ZERO);
        }
        humantime::parse_duration(raw).map_err(|e| ParseError::InvalidDuration {
            raw: raw.to_string(),
            reason: e.to_string(),
        })
    }

    fn render_scalar(&self) -> String {
        humantime::format_duration(*self).to_string()
    }

    fn is_zero_scalar(&self) -> bool {
        self.is_zero()
    }
}

fn unsupported(shape: Shape, raw: &RawValue) -> ParseError {
    ParseError::Unsupported {
        shape,
        found: raw.kind(),
    }
}

macro_rules! scalar_field {
    ($($ty:ty),* $(,)?) => {$(
        impl Value for $ty {
            fn shape(&self) -> Shape {
                <$ty as Scalar>::SHAPE
            }

            fn set(&mut self, raw: &RawValue) -> Result<(), ParseError> {
                match raw {
                    RawValue::Text(text) => {
                        *self = <$ty as Scalar>::parse_scalar(text)?;
                        Ok(())
                    }
                    other => Err(unsupported(<$ty as Scalar>::SHAPE, other)),
                }
            }

            fn render(&self) -> String {
                self.render_scalar()
            }

            fn is_zero(&self) -> bool {
                self.is_zero_scalar()
            }
        }

        impl Field for $ty {
            fn node(&mut self) -> Node<'_> {
                Node::Leaf(self)
            }
        }
    )*};
}

scalar_field!(
    bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
    char, PathBuf, Duration,
);

fn parse_items<T: Scalar>(raw: &RawValue) -> Result<Vec<T>, ParseError> {
    match raw {
        RawValue::Text(text) if text.is_empty() => Ok(Vec::new()),
        RawValue::Text(text) => text.split(',').map(T::parse_scalar).collect(),
        RawValue::List(items) => items.iter().map(|item| T::parse_scalar(item)).collect(),
        other => Err(unsupported(Shape::Sequence, other)),
    }
}

impl<T: Scalar> Value for Vec<T> {
    fn shape(&self) -> Shape {
        Shape::Sequence
    }

    fn set(&mut self, raw: &RawValue) -> Result<(), ParseError> {
        *self = parse_items(raw)?;
        Ok(())
    }

    fn render(&self) -> String {
        self.iter()
            .map(Scalar::render_scalar)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Scalar> Field for Vec<T> {
    fn node(&mut self) -> Node<'_> {
        Node::Leaf(self)
    }
}

fn split_entry(entry: &str) -> Result<(&str, &str), ParseError> {
    entry.split_once('=').ok_or_else(|| ParseError::MalformedEntry {
        entry: entry.to_string(),
    })
}

/// Parses `k=v,k2=v2` text (or pre-split entries) in source order
fn parse_entries<T: Scalar>(raw: &RawValue) -> Result<Vec<(String, T)>, ParseError> {
    let pairs: Vec<(String, String)> = match raw {
        RawValue::Text(text) if text.is_empty() => Vec::new(),
        RawValue::Text(text) => text
            .split(',')
            .map(|entry| split_entry(entry).map(|(k, v)| (k.to_string(), v.to_string())))
            .collect::<Result<_, _>>()?,
        RawValue::List(items) => items
            .iter()
            .map(|entry| split_entry(entry).map(|(k, v)| (k.to_string(), v.to_string())))
            .collect::<Result<_, _>>()?,
        RawValue::Entries(entries) => entries.clone(),
    };

    pairs
        .into_iter()
        .map(|(key, value)| T::parse_scalar(&value).map(|parsed| (key, parsed)))
        .collect()
}

fn render_entries<'a, T: Scalar + 'a>(
    entries: impl Iterator<Item = (&'a String, &'a T)>,
) -> String {
    let mut pairs: Vec<(&String, &T)> = entries.collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v.render_scalar()))
        .collect::<Vec<_>>()
        .join(",")
}

impl<T: Scalar> Value for HashMap<String, T> {
    fn shape(&self) -> Shape {
        Shape::Mapping
    }

    fn set(&mut self, raw: &RawValue) -> Result<(), ParseError> {
        // Later duplicates overwrite earlier ones on collect.
        *self = parse_entries(raw)?.into_iter().collect();
        Ok(())
    }

    fn render(&self) -> String {
        render_entries(self.iter())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Scalar> Field for HashMap<String, T> {
    fn node(&mut self) -> Node<'_> {
        Node::Leaf(self)
    }
}

impl<T: Scalar> Value for BTreeMap<String, T> {
    fn shape(&self) -> Shape {
        Shape::Mapping
    }

    fn set(&mut self, raw: &RawValue) -> Result<(), ParseError> {
        *self = parse_entries(raw)?.into_iter().collect();
        Ok(())
    }

    fn render(&self) -> String {
        render_entries(self.iter())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Scalar> Field for BTreeMap<String, T> {
    fn node(&mut self) -> Node<'_> {
        Node::Leaf(self)
    }
}
