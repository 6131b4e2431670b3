use super::*;
use serde_json::json;

fn states(values: &[&str]) -> Filter {
    Filter::new(
        "states",
        values.iter().map(|value| json!(value)).collect(),
        FilterType::All,
    )
}

#[test]
fn add_appends_new_field_at_the_end() {
    let filters = vec![states(&["CA"])];
    let next = add_filter_value(&filters, "acres", json!("large"), FilterType::Any);

    assert_eq!(next.len(), 2);
    assert_eq!(next[1].field, "acres");
    assert_eq!(next[1].filter_type, FilterType::Any);
}

#[test]
fn add_to_existing_field_keeps_position_and_skips_duplicates() {
    let filters = vec![states(&["CA"]), Filter::new("acres", vec![json!(1)], FilterType::All)];
    let next = add_filter_value(&filters, "states", json!("NV"), FilterType::All);
    let next = add_filter_value(&next, "states", json!("NV"), FilterType::All);

    assert_eq!(next[0].field, "states");
    assert_eq!(next[0].values, vec![json!("CA"), json!("NV")]);
}

#[test]
fn set_replaces_values() {
    let filters = vec![states(&["CA", "NV"])];
    let next = set_filter_value(&filters, "states", json!("AZ"), FilterType::None);

    assert_eq!(next.len(), 1);
    assert_eq!(next[0].values, vec![json!("AZ")]);
    assert_eq!(next[0].filter_type, FilterType::None);
}

#[test]
fn remove_single_value_then_drop_empty_filter() {
    let filters = vec![states(&["CA", "NV"])];
    let next = remove_filter_value(&filters, "states", Some(&json!("CA")), None);
    assert_eq!(next[0].values, vec![json!("NV")]);

    let next = remove_filter_value(&next, "states", Some(&json!("NV")), None);
    assert!(next.is_empty());
}

#[test]
fn remove_whole_field_requires_matching_type_when_given() {
    let filters = vec![states(&["CA"])];
    let untouched = remove_filter_value(&filters, "states", None, Some(FilterType::Any));
    assert_eq!(untouched, filters);

    let removed = remove_filter_value(&filters, "states", None, Some(FilterType::All));
    assert!(removed.is_empty());
}

#[test]
fn range_values_match_by_name() {
    let stored = json!({"from": 0, "to": 100, "name": "Small"});
    let probe = json!({"name": "Small"});
    assert!(filter_values_match(&stored, &probe));
    assert!(!filter_values_match(&stored, &json!({"name": "Large"})));
}

#[test]
fn retain_keeps_only_listed_fields_in_order() {
    let filters = vec![
        states(&["CA"]),
        Filter::new("acres", vec![json!(1)], FilterType::All),
        Filter::new("visitors", vec![json!(2)], FilterType::All),
    ];
    let kept = retain_filters(&filters, &["visitors".to_string(), "states".to_string()]);

    let fields: Vec<&str> = kept.iter().map(|filter| filter.field.as_str()).collect();
    assert_eq!(fields, vec!["states", "visitors"]);
}
