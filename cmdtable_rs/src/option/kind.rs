//! Option kinds and the values they produce.
//!
//! An [`OptionKind`] is chosen when the option is declared and carries the
//! default. It decides whether the flag takes a value and how every
//! occurrence folds into the current [`OptionValue`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::OptionError;

/// Lazy default: called with `None` when the flag never appears, otherwise
/// with the raw text of the occurrence.
pub type Factory = Arc<dyn Fn(Option<&str>) -> Result<OptionValue, String> + Send + Sync>;

/// Parsing behavior of one option, together with its default.
#[derive(Clone)]
pub enum OptionKind {
    /// Presence-only; every occurrence flips the current value.
    Flag(bool),
    /// Presence-only; every occurrence adds one.
    Counter(u32),
    /// Takes a value parsed as an integer.
    Int(i64),
    /// Takes a value parsed as a float.
    Float(f64),
    /// Takes a value; the last occurrence wins.
    Text(String),
    /// Takes a value; occurrences are appended to a copy of the default.
    List(Vec<String>),
    /// Takes `KEY=VALUE`; inserted into a copy of the default mapping.
    Mapping(BTreeMap<String, String>),
    /// Takes a value; final value produced by the factory.
    Lazy(Factory),
}

impl OptionKind {
    pub fn text(value: impl Into<String>) -> Self {
        OptionKind::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OptionKind::List(items.into_iter().map(Into::into).collect())
    }

    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        OptionKind::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn lazy<F>(factory: F) -> Self
    where
        F: Fn(Option<&str>) -> Result<OptionValue, String> + Send + Sync + 'static,
    {
        OptionKind::Lazy(Arc::new(factory))
    }

    /// Whether an occurrence of the flag consumes a value.
    pub fn takes_value(&self) -> bool {
        !matches!(self, OptionKind::Flag(_) | OptionKind::Counter(_))
    }

    /// Value the option state is seeded with before any flag is seen.
    ///
    /// Containers are cloned, so parsing never touches the declared default.
    pub fn initial(&self) -> OptionValue {
        match self {
            OptionKind::Flag(b) => OptionValue::Bool(*b),
            OptionKind::Counter(n) => OptionValue::Count(*n),
            OptionKind::Int(i) => OptionValue::Int(*i),
            OptionKind::Float(f) => OptionValue::Float(*f),
            OptionKind::Text(s) => OptionValue::Text(s.clone()),
            OptionKind::List(items) => OptionValue::List(items.clone()),
            OptionKind::Mapping(map) => OptionValue::Map(map.clone()),
            OptionKind::Lazy(_) => OptionValue::Null,
        }
    }

    /// Default as shown in help output. Lazy defaults are evaluated with `None`.
    pub fn display_default(&self) -> OptionValue {
        match self {
            OptionKind::Lazy(factory) => factory(None).unwrap_or(OptionValue::Null),
            other => other.initial(),
        }
    }

    /// Fold one occurrence of the flag into `current`.
    pub(crate) fn apply(
        &self,
        option: &str,
        current: &mut OptionValue,
        raw: Option<&str>,
    ) -> Result<(), OptionError> {
        let raw_text = raw.unwrap_or_default();
        match self {
            OptionKind::Flag(_) => {
                *current = OptionValue::Bool(!current.is_truthy());
            }
            OptionKind::Counter(_) => {
                let seen = match current {
                    OptionValue::Count(n) => *n,
                    _ => 0,
                };
                *current = OptionValue::Count(seen.saturating_add(1));
            }
            OptionKind::Int(_) => {
                let parsed = raw_text
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| invalid_value(raw_text, option))?;
                *current = OptionValue::Int(parsed);
            }
            OptionKind::Float(_) => {
                let parsed = raw_text
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| invalid_value(raw_text, option))?;
                *current = OptionValue::Float(parsed);
            }
            OptionKind::Text(_) => {
                *current = OptionValue::Text(raw_text.to_string());
            }
            OptionKind::List(_) => match current {
                OptionValue::List(items) => items.push(raw_text.to_string()),
                other => *other = OptionValue::List(vec![raw_text.to_string()]),
            },
            OptionKind::Mapping(_) => {
                let (key, value) =
                    raw_text
                        .split_once('=')
                        .ok_or_else(|| OptionError::MalformedMapping {
                            value: raw_text.to_string(),
                        })?;
                match current {
                    OptionValue::Map(map) => {
                        map.insert(key.to_string(), value.to_string());
                    }
                    other => {
                        let mut map = BTreeMap::new();
                        map.insert(key.to_string(), value.to_string());
                        *other = OptionValue::Map(map);
                    }
                }
            }
            OptionKind::Lazy(factory) => {
                *current = run_factory(factory, option, raw)?;
            }
        }
        Ok(())
    }

    /// Produce the final value of a lazy option that never appeared.
    pub(crate) fn finish_unseen(&self, option: &str) -> Result<Option<OptionValue>, OptionError> {
        match self {
            OptionKind::Lazy(factory) => run_factory(factory, option, None).map(Some),
            _ => Ok(None),
        }
    }
}

fn invalid_value(value: &str, option: &str) -> OptionError {
    OptionError::InvalidValue {
        value: value.to_string(),
        option: option.to_string(),
    }
}

fn run_factory(factory: &Factory, option: &str, raw: Option<&str>) -> Result<OptionValue, OptionError> {
    factory(raw).map_err(|message| OptionError::Factory {
        option: option.to_string(),
        message,
    })
}

impl fmt::Debug for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Flag(b) => f.debug_tuple("Flag").field(b).finish(),
            OptionKind::Counter(n) => f.debug_tuple("Counter").field(n).finish(),
            OptionKind::Int(i) => f.debug_tuple("Int").field(i).finish(),
            OptionKind::Float(x) => f.debug_tuple("Float").field(x).finish(),
            OptionKind::Text(s) => f.debug_tuple("Text").field(s).finish(),
            OptionKind::List(items) => f.debug_tuple("List").field(items).finish(),
            OptionKind::Mapping(map) => f.debug_tuple("Mapping").field(map).finish(),
            OptionKind::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Parsed value of an option or a bound positional argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Null,
    Bool(bool),
    Count(u32),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl OptionValue {
    /// Falsy values: null, `false`, zero, empty text and empty containers.
    pub fn is_truthy(&self) -> bool {
        match self {
            OptionValue::Null => false,
            OptionValue::Bool(b) => *b,
            OptionValue::Count(n) => *n != 0,
            OptionValue::Int(i) => *i != 0,
            OptionValue::Float(x) => *x != 0.0,
            OptionValue::Text(s) => !s.is_empty(),
            OptionValue::List(items) => !items.is_empty(),
            OptionValue::Map(map) => !map.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            OptionValue::Count(n) => Some(i64::from(*n)),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            OptionValue::Float(x) => Some(*x),
            OptionValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            OptionValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            OptionValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Null => f.write_str("none"),
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Count(n) => write!(f, "{n}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            // Debug keeps the decimal point on whole numbers: `2.0`, not `2`.
            OptionValue::Float(x) => write!(f, "{x:?}"),
            OptionValue::Text(s) => f.write_str(s),
            OptionValue::List(items) => write!(f, "[{}]", items.join(", ")),
            OptionValue::Map(map) => {
                let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}
