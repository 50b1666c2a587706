//! Default value resolution for new columns and cells.

use chrono::{Local, NaiveDate, NaiveTime, TimeDelta, TimeZone};
use serde_json::{Map, Value};
use tracing::trace;

use crate::types::{ColumnDef, ColumnType};

/// Separator between choices in a `multiple` column's authored default.
pub const MULTIPLE_SEPARATOR: &str = ", ";

/// Milliseconds since the epoch of local midnight starting `date`.
pub fn start_of_day(date: NaiveDate) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        // midnight skipped by a DST jump
        .or_else(|| {
            Local
                .from_local_datetime(&(midnight + TimeDelta::hours(1)))
                .earliest()
        })
        .map(|local| local.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}

/// Milliseconds since the epoch of local midnight today.
pub fn start_of_today() -> i64 {
    start_of_day(Local::now().date_naive())
}

/// The value a new column or cell of `column` starts with.
///
/// Never fails: a missing column gives `""`, a date default that is not a
/// finite number gives `""`, and unknown types pass their `defaultValue`
/// through. The result never shares state with `column`.
pub fn resolve_default(column: Option<&ColumnDef>) -> Value {
    resolve_default_at(column, start_of_today())
}

/// Like [`resolve_default`], with "today" pinned to `today_start_ms`.
pub fn resolve_default_at(column: Option<&ColumnDef>, today_start_ms: i64) -> Value {
    let Some(column) = column else {
        return Value::String(String::new());
    };

    match column.column_type() {
        Some(ColumnType::Multiple) => split_choices(column.default_value.as_ref()),
        Some(ColumnType::Date) => {
            let candidate = if column.defaults_to_current_date() {
                Some(today_start_ms as f64)
            } else {
                column.default_value.as_ref().and_then(coerce_number)
            };
            match candidate.filter(|n| n.is_finite()) {
                Some(timestamp) => number_value(timestamp),
                None => {
                    trace!(name = %column.name, value = ?column.default_value, "date default is not a number");
                    Value::String(String::new())
                }
            }
        }
        Some(
            ColumnType::Int
            | ColumnType::Float
            | ColumnType::Bool
            | ColumnType::Text
            | ColumnType::LongText
            | ColumnType::Image
            | ColumnType::File
            | ColumnType::Enum
            | ColumnType::SheetReference
            | ColumnType::LineReference
            | ColumnType::List
            | ColumnType::Props
            | ColumnType::Grid,
        )
        | None => column.default_value.as_ref().map_or(Value::Null, detach),
    }
}

/// A `multiple` default: authored text split into choices, anything else none.
fn split_choices(value: Option<&Value>) -> Value {
    match value {
        Some(Value::String(text)) => Value::Array(
            text.split(MULTIPLE_SEPARATOR)
                .map(|choice| Value::String(choice.to_string()))
                .collect(),
        ),
        _ => Value::Array(Vec::new()),
    }
}

/// Structural copy: sequences and mappings are rebuilt element by element.
fn detach(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(detach).collect()),
        Value::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, item)| (key.clone(), detach(item)))
                .collect::<Map<String, Value>>(),
        ),
        primitive => primitive.clone(),
    }
}

/// Numeric reading of a stored date default.
///
/// Numbers are taken as-is, booleans as 1 or 0 and null as 0. Strings are
/// read by [`parse_numeric_text`]. A sequence reads as 0 when empty and as its
/// only element when it has one. Mappings and longer sequences are not numbers.
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::String(s) => parse_numeric_text(s),
        Value::Array(items) => match items.as_slice() {
            [] => Some(0.0),
            [only] if !only.is_array() && !only.is_object() => coerce_number(only),
            _ => None,
        },
        Value::Object(_) => None,
    }
}

/// Text as a number: trimmed, empty reads as 0, unsigned `0x`/`0o`/`0b`
/// literals in their radix, `Infinity` with an optional sign, otherwise decimal.
fn parse_numeric_text(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u128::from_str_radix(&text[2..], radix)
            .ok()
            .map(|n| n as f64);
    }

    match text {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    // `str::parse` also accepts "inf" and "nan"
    if text.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Integral timestamps stay integers so they serialize without a fraction.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeTag;
    use serde_json::json;

    const TODAY: i64 = 1_700_000_000_000;

    fn column(type_str: impl Into<TypeTag>, default_value: Value) -> ColumnDef {
        ColumnDef {
            default_value: Some(default_value),
            ..ColumnDef::new(type_str)
        }
    }

    #[test]
    fn missing_column_is_blank() {
        assert_eq!(resolve_default(None), json!(""));
    }

    #[test]
    fn multiple_splits_authored_text() {
        let col = column(ColumnType::Multiple, json!("a, b, c"));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(["a", "b", "c"]));
    }

    #[test]
    fn multiple_only_splits_on_comma_space() {
        let col = column(ColumnType::Multiple, json!("a,b, c"));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(["a,b", "c"]));
    }

    #[test]
    fn multiple_empty_text_gives_one_empty_choice() {
        let col = column(ColumnType::Multiple, json!(""));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!([""]));
    }

    #[test]
    fn multiple_discards_structured_default() {
        let col = column(ColumnType::Multiple, json!(["a", "b"]));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!([]));

        let col = column(ColumnType::Multiple, Value::Null);
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!([]));

        let col = ColumnDef::new(ColumnType::Multiple);
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!([]));
    }

    #[test]
    fn date_uses_today_when_flagged() {
        let col = ColumnDef {
            default_to_current_date: Some(true),
            ..column(ColumnType::Date, json!("not-a-number"))
        };
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(TODAY));
    }

    #[test]
    fn date_coerces_stored_default() {
        let col = column(ColumnType::Date, json!(86_400_000));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(86_400_000));

        let col = column(ColumnType::Date, json!(" 1234 "));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(1234));

        let col = column(ColumnType::Date, json!(""));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(0));
    }

    #[test]
    fn date_non_numeric_degrades_to_blank() {
        let col = ColumnDef {
            default_to_current_date: Some(false),
            ..column(ColumnType::Date, json!("not-a-number"))
        };
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(""));

        let col = ColumnDef::new(ColumnType::Date);
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(""));

        let col = column(ColumnType::Date, json!("Infinity"));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(""));
    }

    #[test]
    fn date_explicit_null_reads_as_epoch() {
        let col = column(ColumnType::Date, Value::Null);
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(0));
    }

    #[test]
    fn date_radix_literals_are_numbers() {
        let col = column(ColumnType::Date, json!("0x10"));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(16));

        let col = column(ColumnType::Date, json!(" 0b101 "));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(5));

        let col = column(ColumnType::Date, json!("-0x10"));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(""));
    }

    #[test]
    fn date_fractional_timestamp_stays_float() {
        let col = column(ColumnType::Date, json!(1.5));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(1.5));
    }

    #[test]
    fn array_default_is_detached() {
        let col = column(ColumnType::List, json!([{ "a": 1 }, 2, "x"]));
        let mut resolved = resolve_default_at(Some(&col), TODAY);
        assert_eq!(resolved, json!([{ "a": 1 }, 2, "x"]));

        resolved[0]["a"] = json!(99);
        assert_eq!(col.default_value, Some(json!([{ "a": 1 }, 2, "x"])));
    }

    #[test]
    fn object_default_is_detached() {
        let col = column(ColumnType::Props, json!({ "x": 1, "nested": { "y": [1, 2] } }));
        let mut resolved = resolve_default_at(Some(&col), TODAY);
        assert_eq!(Some(&resolved), col.default_value.as_ref());

        resolved["nested"]["y"][0] = json!(7);
        assert_eq!(col.default_value.unwrap()["nested"]["y"][0], json!(1));
    }

    #[test]
    fn primitives_pass_through() {
        let col = column(ColumnType::Int, json!(5));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(5));

        let col = column(ColumnType::Bool, json!(false));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(false));
    }

    #[test]
    fn unknown_and_missing_types_fall_through() {
        let col = column("currency", json!(3.25));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!(3.25));

        let col = column(TypeTag::default(), json!([{ "a": 1 }]));
        assert_eq!(resolve_default_at(Some(&col), TODAY), json!([{ "a": 1 }]));

        let col = column(TypeTag::default(), Value::Null);
        assert_eq!(resolve_default_at(Some(&col), TODAY), Value::Null);

        let col = ColumnDef::new("currency");
        assert_eq!(resolve_default_at(Some(&col), TODAY), Value::Null);
    }

    #[test]
    fn coerce_number_follows_loose_numeric_rules() {
        assert_eq!(coerce_number(&json!(true)), Some(1.0));
        assert_eq!(coerce_number(&json!(false)), Some(0.0));
        assert_eq!(coerce_number(&json!([])), Some(0.0));
        assert_eq!(coerce_number(&json!(["42"])), Some(42.0));
        assert_eq!(coerce_number(&json!([1, 2])), None);
        assert_eq!(coerce_number(&json!({})), None);
        assert_eq!(coerce_number(&json!(null)), Some(0.0));
        assert_eq!(coerce_number(&json!("12abc")), None);
        assert_eq!(coerce_number(&json!("1e3")), Some(1000.0));
        assert_eq!(coerce_number(&json!(".5")), Some(0.5));
        assert_eq!(coerce_number(&json!("0o17")), Some(15.0));
        assert_eq!(coerce_number(&json!("0x")), None);
        assert_eq!(coerce_number(&json!("inf")), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
    }

    #[test]
    fn start_of_day_is_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let ms = start_of_day(date);
        let local = Local.timestamp_millis_opt(ms).unwrap();
        assert_eq!(local.date_naive(), date);
        assert_eq!(local.time(), NaiveTime::MIN);
    }

    #[test]
    fn start_of_today_is_not_after_now() {
        let today = start_of_today();
        let now = Local::now().timestamp_millis();
        assert!(today <= now);
        assert!(now - today < 25 * 60 * 60 * 1000);
    }
}
