//! Coercion of textual parameters into semantic types.
//!
//! Every parameter is coerced independently so that all failures surface in
//! a single response. Sequences are split on `,` and each element is coerced
//! on its own; a failing element never stops the remaining ones.

use crate::descriptor::{FloatWidth, IntWidth, ParamKind};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Message for a value that is not `true`, `false` or empty.
pub const BOOL_ERROR: &str = "cannot parse boolean";
/// Message for a value that is not a base-10 integer in range.
pub const INT_ERROR: &str = "cannot parse integer";
/// Message for a value that is not a decimal number.
pub const FLOAT_ERROR: &str = "cannot parse float";
/// Message for a value that does not match the time format.
pub const TIME_ERROR: &str = "cannot parse time";

/// A parameter as found in the request, before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawParam {
    /// The key does not appear at all.
    Absent,
    /// The key appears; the value may be empty.
    Present(String),
}

impl RawParam {
    /// Returns the raw text, if the key was present.
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Present(value) => Some(value),
        }
    }
}

/// A successfully coerced parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Boolean.
    Bool(bool),
    /// Signed integer, already range-checked for the declared width.
    Int(i64),
    /// Unsigned integer, already range-checked for the declared width.
    Uint(u64),
    /// Floating point number.
    Float(f64),
    /// Timestamp, normalized to UTC.
    Time(DateTime<Utc>),
    /// Text.
    String(String),
    /// Sequence of scalars.
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Renders the value as JSON for constraint checking.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => (*b).into(),
            Self::Int(i) => (*i).into(),
            Self::Uint(u) => (*u).into(),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Time(t) => t.to_rfc3339().into(),
            Self::String(s) => s.clone().into(),
            Self::List(items) => items.iter().map(Self::to_json).collect(),
        }
    }
}

/// One coercion failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    /// Type-specific message, e.g. [`INT_ERROR`].
    pub message: &'static str,
    /// Position of the failing element within a sequence.
    pub index: Option<usize>,
    /// The raw text that failed.
    pub raw: String,
}

/// Coerces a present parameter into `kind`.
///
/// Returns every failure found; for sequences that is one entry per bad
/// element.
///
/// # Example
///
/// ```rust
/// use plinth_bind::coerce::{coerce, ParamValue, INT_ERROR};
/// use plinth_bind::{IntWidth, ParamKind};
///
/// let kind = ParamKind::List(Box::new(ParamKind::Int(IntWidth::I64)));
/// let errors = coerce("1,2,bad", &kind, None).unwrap_err();
///
/// assert_eq!(errors.len(), 1);
/// assert_eq!(errors[0].message, INT_ERROR);
/// assert_eq!(errors[0].index, Some(2));
///
/// assert_eq!(
///     coerce("", &ParamKind::Bool, None).unwrap(),
///     ParamValue::Bool(true)
/// );
/// ```
pub fn coerce(
    raw: &str,
    kind: &ParamKind,
    time_format: Option<&str>,
) -> Result<ParamValue, Vec<CoercionError>> {
    match kind {
        ParamKind::List(elem) => coerce_list(raw, elem, time_format),
        scalar => coerce_scalar(raw, scalar, time_format).map_err(|message| {
            vec![CoercionError {
                message,
                index: None,
                raw: raw.to_string(),
            }]
        }),
    }
}

fn coerce_list(
    raw: &str,
    elem: &ParamKind,
    time_format: Option<&str>,
) -> Result<ParamValue, Vec<CoercionError>> {
    let mut values = Vec::new();
    let mut errors = Vec::new();

    for (index, part) in split_list(raw).enumerate() {
        match coerce_scalar(part, elem, time_format) {
            Ok(value) => values.push(value),
            Err(message) => errors.push(CoercionError {
                message,
                index: Some(index),
                raw: part.to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(ParamValue::List(values))
    } else {
        Err(errors)
    }
}

/// Splits a sequence parameter; an empty value is an empty sequence.
fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    let skip_all = raw.is_empty();
    raw.split(',').filter(move |_| !skip_all)
}

fn coerce_scalar(
    raw: &str,
    kind: &ParamKind,
    time_format: Option<&str>,
) -> Result<ParamValue, &'static str> {
    match kind {
        ParamKind::Bool => match raw {
            "" | "true" => Ok(ParamValue::Bool(true)),
            "false" => Ok(ParamValue::Bool(false)),
            _ => Err(BOOL_ERROR),
        },
        ParamKind::Int(width) => parse_int(raw, *width).ok_or(INT_ERROR),
        ParamKind::Float(width) => parse_float(raw, *width).ok_or(FLOAT_ERROR),
        ParamKind::Time => parse_time(raw, time_format)
            .map(ParamValue::Time)
            .ok_or(TIME_ERROR),
        ParamKind::String => Ok(ParamValue::String(raw.to_string())),
        // Nested sequences have no textual encoding; keep the element as text.
        ParamKind::List(_) => Ok(ParamValue::String(raw.to_string())),
    }
}

fn parse_int(raw: &str, width: IntWidth) -> Option<ParamValue> {
    let signed = |v: Option<i64>| v.map(ParamValue::Int);
    let unsigned = |v: Option<u64>| v.map(ParamValue::Uint);
    match width {
        IntWidth::I8 => signed(raw.parse::<i8>().ok().map(i64::from)),
        IntWidth::I16 => signed(raw.parse::<i16>().ok().map(i64::from)),
        IntWidth::I32 => signed(raw.parse::<i32>().ok().map(i64::from)),
        IntWidth::I64 => signed(raw.parse::<i64>().ok()),
        IntWidth::Isize => signed(raw.parse::<isize>().ok().and_then(|v| i64::try_from(v).ok())),
        IntWidth::U8 => unsigned(raw.parse::<u8>().ok().map(u64::from)),
        IntWidth::U16 => unsigned(raw.parse::<u16>().ok().map(u64::from)),
        IntWidth::U32 => unsigned(raw.parse::<u32>().ok().map(u64::from)),
        IntWidth::U64 => unsigned(raw.parse::<u64>().ok()),
        IntWidth::Usize => unsigned(raw.parse::<usize>().ok().and_then(|v| u64::try_from(v).ok())),
    }
}

fn parse_float(raw: &str, width: FloatWidth) -> Option<ParamValue> {
    let value = match width {
        FloatWidth::F32 => f64::from(raw.parse::<f32>().ok()?),
        FloatWidth::F64 => raw.parse::<f64>().ok()?,
    };
    // Out-of-range text rounds to infinity; only a spelled-out infinity may.
    if value.is_infinite() && !is_infinity_literal(raw) {
        return None;
    }
    Some(ParamValue::Float(value))
}

fn is_infinity_literal(raw: &str) -> bool {
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

fn parse_time(raw: &str, format: Option<&str>) -> Option<DateTime<Utc>> {
    let Some(format) = format else {
        return DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc));
    };
    if let Ok(t) = DateTime::parse_from_str(raw, format) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
        return Some(t.and_utc());
    }
    NaiveDate::parse_from_str(raw, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

/// Re-serializes a raw sequence parameter as JSON array text.
///
/// Text-like elements are quoted; everything else is inserted verbatim, so
/// an element that is not valid JSON makes the whole text unparseable.
#[must_use]
pub fn list_json_text(raw: &str, elem: &ParamKind) -> String {
    let quote = matches!(elem, ParamKind::String | ParamKind::Time);
    let parts: Vec<String> = split_list(raw)
        .map(|part| {
            if quote {
                serde_json::Value::from(part).to_string()
            } else {
                part.to_string()
            }
        })
        .collect();
    format!("[{}]", parts.join(","))
}

/// Types a coerced parameter can be stored into.
///
/// Absent parameters take `Default::default()`, which is why `bool` fields
/// read `false` when their key is missing.
pub trait FromParam: Sized + Default {
    /// The semantic type to coerce into.
    fn kind() -> ParamKind;

    /// Converts a value coerced with [`FromParam::kind`].
    fn from_value(value: ParamValue) -> Option<Self>;
}

/// Marker for parameter types that may appear inside a sequence.
pub trait ScalarParam: FromParam {}

impl FromParam for bool {
    fn kind() -> ParamKind {
        ParamKind::Bool
    }

    fn from_value(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

macro_rules! impl_from_param_int {
    ($($ty:ty => $width:ident),* $(,)?) => {
        $(
            impl FromParam for $ty {
                fn kind() -> ParamKind {
                    ParamKind::Int(IntWidth::$width)
                }

                fn from_value(value: ParamValue) -> Option<Self> {
                    match value {
                        ParamValue::Int(i) => <$ty>::try_from(i).ok(),
                        ParamValue::Uint(u) => <$ty>::try_from(u).ok(),
                        _ => None,
                    }
                }
            }

            impl ScalarParam for $ty {}
        )*
    };
}

impl_from_param_int!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
);

impl FromParam for f32 {
    fn kind() -> ParamKind {
        ParamKind::Float(FloatWidth::F32)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: ParamValue) -> Option<Self> {
        match value {
            // Parsed as f32 during coercion, so the narrowing is exact.
            ParamValue::Float(f) => Some(f as f32),
            _ => None,
        }
    }
}

impl FromParam for f64 {
    fn kind() -> ParamKind {
        ParamKind::Float(FloatWidth::F64)
    }

    fn from_value(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::Float(f) => Some(f),
            _ => None,
        }
    }
}

impl FromParam for String {
    fn kind() -> ParamKind {
        ParamKind::String
    }

    fn from_value(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromParam for DateTime<Utc> {
    fn kind() -> ParamKind {
        ParamKind::Time
    }

    fn from_value(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::Time(t) => Some(t),
            _ => None,
        }
    }
}

impl ScalarParam for bool {}
impl ScalarParam for f32 {}
impl ScalarParam for f64 {}
impl ScalarParam for String {}
impl ScalarParam for DateTime<Utc> {}

impl<T: ScalarParam> FromParam for Vec<T> {
    fn kind() -> ParamKind {
        ParamKind::List(Box::new(T::kind()))
    }

    fn from_value(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromParam> FromParam for Option<T> {
    fn kind() -> ParamKind {
        T::kind()
    }

    fn from_value(value: ParamValue) -> Option<Self> {
        T::from_value(value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn int64() -> ParamKind {
        ParamKind::Int(IntWidth::I64)
    }

    #[test]
    fn test_bool_forms() {
        assert_eq!(coerce("", &ParamKind::Bool, None), Ok(ParamValue::Bool(true)));
        assert_eq!(coerce("true", &ParamKind::Bool, None), Ok(ParamValue::Bool(true)));
        assert_eq!(coerce("false", &ParamKind::Bool, None), Ok(ParamValue::Bool(false)));
    }

    #[test]
    fn test_bool_is_case_sensitive() {
        let errors = coerce("TRUE", &ParamKind::Bool, None).unwrap_err();
        assert_eq!(errors[0].message, BOOL_ERROR);
        assert_eq!(errors[0].index, None);
        assert_eq!(errors[0].raw, "TRUE");
    }

    #[test]
    fn test_int_widths() {
        assert_eq!(coerce("-5", &int64(), None), Ok(ParamValue::Int(-5)));
        assert_eq!(
            coerce("300", &ParamKind::Int(IntWidth::U8), None).unwrap_err()[0].message,
            INT_ERROR
        );
        assert_eq!(
            coerce("-1", &ParamKind::Int(IntWidth::U32), None).unwrap_err()[0].message,
            INT_ERROR
        );
        assert_eq!(
            coerce("255", &ParamKind::Int(IntWidth::U8), None),
            Ok(ParamValue::Uint(255))
        );
    }

    #[test]
    fn test_float_message_is_width_independent() {
        let f32_err = coerce("bad", &ParamKind::Float(FloatWidth::F32), None).unwrap_err();
        let f64_err = coerce("bad", &ParamKind::Float(FloatWidth::F64), None).unwrap_err();
        assert_eq!(f32_err[0].message, FLOAT_ERROR);
        assert_eq!(f64_err[0].message, FLOAT_ERROR);
        assert_eq!(
            coerce("1.5", &ParamKind::Float(FloatWidth::F32), None),
            Ok(ParamValue::Float(1.5))
        );
    }

    #[test]
    fn test_float_overflow_is_rejected() {
        let f32_kind = ParamKind::Float(FloatWidth::F32);
        let f64_kind = ParamKind::Float(FloatWidth::F64);

        assert_eq!(coerce("1e40", &f32_kind, None).unwrap_err()[0].message, FLOAT_ERROR);
        assert_eq!(coerce("-1e400", &f64_kind, None).unwrap_err()[0].message, FLOAT_ERROR);
        assert_eq!(coerce("1e40", &f64_kind, None), Ok(ParamValue::Float(1e40)));
        assert_eq!(
            coerce("-Inf", &f64_kind, None),
            Ok(ParamValue::Float(f64::NEG_INFINITY))
        );
        assert_eq!(
            coerce("infinity", &f32_kind, None),
            Ok(ParamValue::Float(f64::INFINITY))
        );
    }

    #[test]
    fn test_time_default_rfc3339() {
        let value = coerce("2024-03-01T12:00:00+02:00", &ParamKind::Time, None).unwrap();
        assert_eq!(
            value,
            ParamValue::Time(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            coerce("bad", &ParamKind::Time, None).unwrap_err()[0].message,
            TIME_ERROR
        );
    }

    #[test]
    fn test_time_declared_format() {
        let value = coerce("2024-03-01", &ParamKind::Time, Some("%Y-%m-%d")).unwrap();
        assert_eq!(
            value,
            ParamValue::Time(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert!(coerce("2024-03-01T00:00:00Z", &ParamKind::Time, Some("%Y-%m-%d")).is_err());
    }

    #[test]
    fn test_string_empty_is_value() {
        assert_eq!(
            coerce("", &ParamKind::String, None),
            Ok(ParamValue::String(String::new()))
        );
    }

    #[test]
    fn test_list_collects_every_bad_element() {
        let kind = ParamKind::List(Box::new(int64()));
        let errors = coerce("x,2,y", &kind, None).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!((errors[0].index, errors[0].raw.as_str()), (Some(0), "x"));
        assert_eq!((errors[1].index, errors[1].raw.as_str()), (Some(2), "y"));
    }

    #[test]
    fn test_list_empty_value() {
        let kind = ParamKind::List(Box::new(int64()));
        assert_eq!(coerce("", &kind, None), Ok(ParamValue::List(Vec::new())));
    }

    #[test]
    fn test_list_json_text() {
        assert_eq!(list_json_text("1,2,bad", &int64()), "[1,2,bad]");
        assert_eq!(list_json_text("a,\"b", &ParamKind::String), r#"["a","\"b"]"#);
        assert_eq!(list_json_text("", &int64()), "[]");
    }

    #[test]
    fn test_from_value_conversions() {
        assert_eq!(i32::from_value(ParamValue::Int(7)), Some(7));
        assert_eq!(u8::from_value(ParamValue::Int(-1)), None);
        assert_eq!(
            Vec::<i64>::from_value(ParamValue::List(vec![ParamValue::Int(1), ParamValue::Int(2)])),
            Some(vec![1, 2])
        );
        assert_eq!(Option::<bool>::from_value(ParamValue::Bool(true)), Some(Some(true)));
        assert_eq!(Option::<bool>::default(), None);
        assert_eq!(Vec::<String>::kind(), ParamKind::List(Box::new(ParamKind::String)));
    }

    #[test]
    fn test_to_json() {
        let list = ParamValue::List(vec![ParamValue::Int(1), ParamValue::Uint(2)]);
        assert_eq!(list.to_json(), serde_json::json!([1, 2]));
        assert_eq!(ParamValue::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    proptest! {
        #[test]
        fn prop_i64_roundtrips(n in any::<i64>()) {
            prop_assert_eq!(coerce(&n.to_string(), &int64(), None), Ok(ParamValue::Int(n)));
        }

        #[test]
        fn prop_list_errors_point_at_bad_elements(
            items in proptest::collection::vec(prop_oneof!["[0-9]{1,5}", "[a-z]{1,5}"], 1..8)
        ) {
            let raw = items.join(",");
            let kind = ParamKind::List(Box::new(int64()));
            let expected: Vec<usize> = items
                .iter()
                .enumerate()
                .filter(|(_, s)| s.parse::<i64>().is_err())
                .map(|(i, _)| i)
                .collect();

            match coerce(&raw, &kind, None) {
                Ok(ParamValue::List(values)) => {
                    prop_assert!(expected.is_empty());
                    prop_assert_eq!(values.len(), items.len());
                }
                Ok(other) => prop_assert!(false, "unexpected value {:?}", other),
                Err(errors) => {
                    let indices: Vec<usize> = errors.iter().filter_map(|e| e.index).collect();
                    prop_assert_eq!(indices, expected);
                }
            }
        }
    }
}
