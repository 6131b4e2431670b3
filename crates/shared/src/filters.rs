//! Pure operations over an ordered filter list. Every function keeps the
//! one-entry-per-field invariant and preserves the position of existing entries.

use serde_json::Value;

use crate::domain::{Filter, FilterType, FilterValue};

/// Range objects carrying a `name` match on that name alone; everything else
/// matches on structural equality.
pub fn filter_values_match(left: &FilterValue, right: &FilterValue) -> bool {
    match (left, right) {
        (Value::Object(left), Value::Object(right)) => {
            match (left.get("name"), right.get("name")) {
                (Some(left_name), Some(right_name)) => left_name == right_name,
                _ => left == right,
            }
        }
        _ => left == right,
    }
}

/// Collapses duplicate fields into their first position. Later duplicates
/// contribute their values (deduplicated) and their type.
pub fn normalize_filters(filters: Vec<Filter>) -> Vec<Filter> {
    let mut normalized: Vec<Filter> = Vec::with_capacity(filters.len());
    for filter in filters {
        match normalized
            .iter_mut()
            .find(|existing| existing.field == filter.field)
        {
            Some(existing) => {
                existing.filter_type = filter.filter_type;
                for value in filter.values {
                    push_unique(&mut existing.values, value);
                }
            }
            None => {
                let mut values = Vec::with_capacity(filter.values.len());
                for value in filter.values {
                    push_unique(&mut values, value);
                }
                normalized.push(Filter { values, ..filter });
            }
        }
    }
    normalized
}

pub fn add_filter_value(
    filters: &[Filter],
    field: &str,
    value: FilterValue,
    filter_type: FilterType,
) -> Vec<Filter> {
    let mut next = filters.to_vec();
    match next.iter_mut().find(|filter| filter.field == field) {
        Some(existing) => {
            existing.filter_type = filter_type;
            push_unique(&mut existing.values, value);
        }
        None => next.push(Filter::new(field, vec![value], filter_type)),
    }
    next
}

pub fn set_filter_value(
    filters: &[Filter],
    field: &str,
    value: FilterValue,
    filter_type: FilterType,
) -> Vec<Filter> {
    let mut next = filters.to_vec();
    match next.iter_mut().find(|filter| filter.field == field) {
        Some(existing) => {
            existing.filter_type = filter_type;
            existing.values = vec![value];
        }
        None => next.push(Filter::new(field, vec![value], filter_type)),
    }
    next
}

/// Removes one value, or the whole field when `value` is `None`. A filter left
/// without values is dropped. When `filter_type` is given it must match.
pub fn remove_filter_value(
    filters: &[Filter],
    field: &str,
    value: Option<&FilterValue>,
    filter_type: Option<FilterType>,
) -> Vec<Filter> {
    filters
        .iter()
        .filter_map(|filter| {
            let targeted = filter.field == field
                && filter_type.map_or(true, |expected| expected == filter.filter_type);
            if !targeted {
                return Some(filter.clone());
            }
            let value = value?;
            let values: Vec<FilterValue> = filter
                .values
                .iter()
                .filter(|existing| !filter_values_match(existing, value))
                .cloned()
                .collect();
            (!values.is_empty()).then(|| Filter {
                values,
                ..filter.clone()
            })
        })
        .collect()
}

pub fn retain_filters(filters: &[Filter], keep_fields: &[String]) -> Vec<Filter> {
    filters
        .iter()
        .filter(|filter| keep_fields.iter().any(|field| *field == filter.field))
        .cloned()
        .collect()
}

fn push_unique(values: &mut Vec<FilterValue>, value: FilterValue) {
    if !values
        .iter()
        .any(|existing| filter_values_match(existing, &value))
    {
        values.push(value);
    }
}

#[cfg(test)]
#[path = "tests/filters_tests.rs"]
mod tests;
