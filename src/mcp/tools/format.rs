//! Text rendering helpers shared by the tools.

use chrono::NaiveDate;
use serde_json::Value;

/// Number of half-hour booking slots in a day.
pub const SLOTS_PER_DAY: i64 = 48;

/// Render a scalar for display. Missing and null values read as "unknown".
pub fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "unknown".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Shorthand for `display(value.get(key))`.
pub fn field(value: &Value, key: &str) -> String {
    display(value.get(key))
}

/// Names of the `can*` flags that are `true`, without the prefix, sorted.
pub fn permissions(role: &Value) -> Vec<String> {
    let mut granted: Vec<String> = role
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .filter(|(_, v)| v.as_bool() == Some(true))
                .filter_map(|(k, _)| k.strip_prefix("can"))
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    granted.sort();
    granted
}

/// Comma separated permissions, or "None".
pub fn permissions_line(role: &Value) -> String {
    let granted = permissions(role);
    if granted.is_empty() {
        "None".to_string()
    } else {
        granted.join(", ")
    }
}

/// Elements of an array value; anything else counts as empty.
pub fn items(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn table_details(table: &Value) -> String {
    format!(
        "- Name: {}\n- ID: {}\n- Capacity: {} people\n- Restaurant ID: {}",
        field(table, "name"),
        field(table, "id"),
        field(table, "capacity"),
        field(table, "restaurantId")
    )
}

/// 12-hour start time of a half-hour slot, e.g. `36` is `6:00pm`.
pub fn slot_time(slot_index: i64) -> String {
    let hours = slot_index.rem_euclid(SLOTS_PER_DAY) / 2;
    let minutes = (slot_index % 2) * 30;
    let display_hour = match hours % 12 {
        0 => 12,
        h => h,
    };
    let am_pm = if hours < 12 { "am" } else { "pm" };
    format!("{}:{:02}{}", display_hour, minutes, am_pm)
}

/// Sorted, comma separated slot start times, or "No slots".
pub fn slots_list(value: Option<&Value>) -> String {
    let mut indices: Vec<i64> = items(value).iter().filter_map(Value::as_i64).collect();
    if indices.is_empty() {
        return "No slots".to_string();
    }
    indices.sort_unstable();
    indices
        .into_iter()
        .map(slot_time)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Long form of a `YYYY-MM-DD` date (timestamps are cut to their date),
/// e.g. "Monday, June 2, 2025". Unparseable input is returned as-is.
pub fn long_date(date: &str) -> String {
    if date.is_empty() {
        return "Unknown date".to_string();
    }
    date.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .map(|day| day.format("%A, %B %-d, %Y").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// [`long_date`] of a JSON field.
pub fn date_field(value: &Value, key: &str) -> String {
    long_date(value.get(key).and_then(Value::as_str).unwrap_or_default())
}

/// Dollar amount with two decimals. Backends send decimals as numbers or
/// strings.
pub fn money(value: Option<&Value>) -> String {
    let amount = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.parse::<f64>().ok(),
        _ => None,
    };
    match amount {
        Some(amount) => format!("${:.2}", amount),
        None => "$0.00".to_string(),
    }
}

/// "Yes" or "No" for a boolean field; missing counts as no.
pub fn yes_no(value: &Value, key: &str) -> &'static str {
    if value.get(key).and_then(Value::as_bool).unwrap_or(false) {
        "Yes"
    } else {
        "No"
    }
}
