//! Utility functions for general-purpose use across the application.

use serde::{Deserialize, Deserializer};

/// Split free-text list input into clean items.
///
/// A field supplied more than once is already a list and is used as given;
/// a single value is split on newlines. Items are trimmed and blanks dropped.
///
/// # Examples
///
/// ```
/// use recipeshare::util::split_lines;
///
/// let items = split_lines(&["2 eggs\n 1 cup flour \n\n".to_string()]);
/// assert_eq!(items, vec!["2 eggs", "1 cup flour"]);
/// ```
pub fn split_lines(values: &[String]) -> Vec<String> {
    match values {
        [single] => clean(single.split('\n')),
        many => clean(many.iter().map(String::as_str)),
    }
}

/// Split comma-separated category input, across every supplied value.
///
/// # Examples
///
/// ```
/// use recipeshare::util::split_commas;
///
/// assert_eq!(split_commas(&["Dessert, Vegan,,".to_string()]), vec!["Dessert", "Vegan"]);
/// ```
pub fn split_commas(values: &[String]) -> Vec<String> {
    clean(values.iter().flat_map(|v| v.split(',')))
}

fn clean<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a JSON `null` as the type's default, so `{"name": null}` behaves like
/// a missing field. Pair with `#[serde(default)]`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
