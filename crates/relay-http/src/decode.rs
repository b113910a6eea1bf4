//! Decoding of response bodies into typed models.
//!
//! Decoding happens in three steps:
//!
//! 1. [`JsonMapper::map`] turns the raw bytes into the JSON value to decode
//!    (the default parses the bytes as they are; models can unwrap envelopes).
//! 2. The endpoint's [`KeyDecodingStrategy`] rewrites object keys.
//! 3. The value is deserialized into the model while the endpoint's
//!    [`DateDecodingStrategy`] is in effect for every [`Date`] field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::de::{self, DeserializeOwned, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fmt;

/// Decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("response is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("response does not match the expected model: {0}")]
    Schema(#[source] serde_json::Error),

    #[error("failed to map response: {0}")]
    Mapping(String),
}

/// How object keys in the response are mapped to model field names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyDecodingStrategy {
    /// Keys are used as they are.
    #[default]
    UseDefaultKeys,
    /// `snake_case` keys become `camelCase`; leading and trailing
    /// underscores are preserved.
    ConvertFromSnakeCase,
}

impl KeyDecodingStrategy {
    /// Rewrite every object key in `value`, recursively.
    pub fn apply(&self, value: Value) -> Value {
        match self {
            Self::UseDefaultKeys => value,
            Self::ConvertFromSnakeCase => rewrite_keys(value, &snake_to_camel),
        }
    }
}

fn rewrite_keys(value: Value, convert: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .into_iter()
                .map(|(key, value)| (convert(&key), rewrite_keys(value, convert)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| rewrite_keys(v, convert)).collect())
        }
        other => other,
    }
}

/// `first_name` -> `firstName`, `_private_id_` -> `_privateId_`.
pub fn snake_to_camel(key: &str) -> String {
    let core = key.trim_matches('_');
    if core.is_empty() || !core.contains('_') {
        return key.to_string();
    }

    let leading = key.len() - key.trim_start_matches('_').len();
    let trailing = key.len() - key.trim_end_matches('_').len();

    let mut words = core.split('_').filter(|word| !word.is_empty());
    let mut converted = String::with_capacity(key.len());
    converted.push_str(&key[..leading]);
    if let Some(first) = words.next() {
        converted.push_str(first);
    }
    for word in words {
        let mut chars = word.chars();
        if let Some(head) = chars.next() {
            converted.extend(head.to_uppercase());
            converted.push_str(&chars.as_str().to_lowercase());
        }
    }
    converted.push_str(&key[key.len() - trailing..]);
    converted
}

/// How [`Date`] fields are parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DateDecodingStrategy {
    /// RFC 3339 / ISO 8601 strings, e.g. `2024-01-02T03:04:05Z`.
    #[default]
    Iso8601,
    /// Numeric seconds since the Unix epoch (fractions allowed).
    SecondsSince1970,
    /// Numeric milliseconds since the Unix epoch.
    MillisecondsSince1970,
    /// Strings in a `chrono` format, e.g. `%Y-%m-%d`. Values without an
    /// offset are taken as UTC; date-only values as midnight UTC.
    Formatted(String),
}

thread_local! {
    static DATE_STRATEGY: RefCell<Option<DateDecodingStrategy>> = const { RefCell::new(None) };
}

/// Installs a date strategy for the current thread until dropped.
struct DateStrategyScope {
    previous: Option<DateDecodingStrategy>,
}

impl DateStrategyScope {
    fn enter(strategy: &DateDecodingStrategy) -> Self {
        let previous = DATE_STRATEGY.with(|slot| slot.replace(Some(strategy.clone())));
        Self { previous }
    }
}

impl Drop for DateStrategyScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        DATE_STRATEGY.with(|slot| *slot.borrow_mut() = previous);
    }
}

fn current_date_strategy() -> DateDecodingStrategy {
    DATE_STRATEGY.with(|slot| slot.borrow().clone().unwrap_or_default())
}

/// A point in time decoded according to the active [`DateDecodingStrategy`].
///
/// Outside of [`decode`] the ISO 8601 strategy applies. Serializes as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(pub DateTime<Utc>);

impl Date {
    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Date {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DateVisitor {
            strategy: current_date_strategy(),
        })
    }
}

struct DateVisitor {
    strategy: DateDecodingStrategy,
}

impl DateVisitor {
    fn from_seconds<E: de::Error>(&self, seconds: f64) -> Result<Date, E> {
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1e9).round() as u32;
        DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
            .map(Date)
            .ok_or_else(|| E::custom(format!("timestamp {} is out of range", seconds)))
    }

    fn from_millis<E: de::Error>(&self, millis: i64) -> Result<Date, E> {
        DateTime::from_timestamp_millis(millis)
            .map(Date)
            .ok_or_else(|| E::custom(format!("timestamp {}ms is out of range", millis)))
    }

    fn from_number<E: de::Error>(&self, value: f64) -> Result<Date, E> {
        match &self.strategy {
            DateDecodingStrategy::SecondsSince1970 => self.from_seconds(value),
            DateDecodingStrategy::MillisecondsSince1970 => self.from_millis(value.round() as i64),
            other => Err(E::custom(format!(
                "expected a date string for {:?} strategy, found number {}",
                other, value
            ))),
        }
    }
}

impl<'de> Visitor<'de> for DateVisitor {
    type Value = Date;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.strategy {
            DateDecodingStrategy::Iso8601 => f.write_str("an ISO 8601 date string"),
            DateDecodingStrategy::SecondsSince1970 => f.write_str("seconds since 1970"),
            DateDecodingStrategy::MillisecondsSince1970 => f.write_str("milliseconds since 1970"),
            DateDecodingStrategy::Formatted(format) => write!(f, "a date formatted as '{}'", format),
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Date, E> {
        match &self.strategy {
            DateDecodingStrategy::Iso8601 => DateTime::parse_from_rfc3339(value)
                .map(|date| Date(date.with_timezone(&Utc)))
                .map_err(|e| E::custom(format!("invalid ISO 8601 date '{}': {}", value, e))),
            DateDecodingStrategy::Formatted(format) => parse_formatted(value, format)
                .map(Date)
                .ok_or_else(|| {
                    E::custom(format!("date '{}' does not match format '{}'", value, format))
                }),
            _ => Err(E::invalid_type(de::Unexpected::Str(value), &self)),
        }
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Date, E> {
        match &self.strategy {
            DateDecodingStrategy::MillisecondsSince1970 => self.from_millis(value),
            _ => self.from_number(value as f64),
        }
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Date, E> {
        match &self.strategy {
            DateDecodingStrategy::MillisecondsSince1970 => {
                let millis = i64::try_from(value)
                    .map_err(|_| E::custom(format!("timestamp {}ms is out of range", value)))?;
                self.from_millis(millis)
            }
            _ => self.from_number(value as f64),
        }
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Date, E> {
        self.from_number(value)
    }
}

fn parse_formatted(value: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_str(value, format) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Maps raw response bytes to the JSON value a model is decoded from.
///
/// The default implementation parses the bytes unchanged. Override it to
/// unwrap response envelopes:
///
/// ```rust
/// use relay_http::{DecodeError, JsonMapper};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Genres(Vec<String>);
///
/// impl JsonMapper for Genres {
///     fn map(data: &[u8]) -> Result<serde_json::Value, DecodeError> {
///         let mut value: serde_json::Value =
///             serde_json::from_slice(data).map_err(DecodeError::Syntax)?;
///         Ok(value["genres"].take())
///     }
/// }
/// ```
pub trait JsonMapper {
    fn map(data: &[u8]) -> Result<Value, DecodeError> {
        serde_json::from_slice(data).map_err(DecodeError::Syntax)
    }
}

/// Models the pipeline can produce.
pub trait DecodableJson: DeserializeOwned + JsonMapper + Send + 'static {}

impl<T> DecodableJson for T where T: DeserializeOwned + JsonMapper + Send + 'static {}

impl JsonMapper for Value {}
impl JsonMapper for String {}
impl JsonMapper for Date {}
impl<T: JsonMapper> JsonMapper for Vec<T> {}
impl<T: JsonMapper> JsonMapper for Option<T> {}

/// Empty bodies decode as `()`, for endpoints that answer with no content.
impl JsonMapper for () {
    fn map(data: &[u8]) -> Result<Value, DecodeError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(data).map_err(DecodeError::Syntax)
    }
}

/// Decode `data` into `T` with the given strategies.
pub fn decode<T: DecodableJson>(
    data: &[u8],
    dates: &DateDecodingStrategy,
    keys: &KeyDecodingStrategy,
) -> Result<T, DecodeError> {
    let value = keys.apply(T::map(data)?);
    let _scope = DateStrategyScope::enter(dates);
    T::deserialize(value).map_err(DecodeError::Schema)
}
