mod common;

use common::{dictionary_table, sample_dictionary};
use datadict::{
    Aggregation, DataDict, Dictionary, FieldDefinition, FieldType, Table, dictionary, validate,
    value::text,
};

#[test]
fn absent_dictionary_is_valid() {
    assert!(validate(None).is_ok());
}

#[test]
fn sample_dictionary_is_valid() {
    validate(Some(&sample_dictionary())).expect("valid dictionary");
}

#[test]
fn missing_required_columns_are_listed() {
    let table = Table::from_rows(&["Data Set"], vec![vec![text("data_set_1")]]);
    let err = validate(Some(&table)).unwrap_err();
    assert!(err.is_validation());
    let message = err.to_string();
    assert!(message.contains("[Data Set, Field, Name, Description, Type, Format]"));
    assert!(message.contains("'Field'"));
    assert!(!message.contains("Missing: ['Data Set'"));
}

#[test]
fn unsupported_type_is_rejected_with_supported_list() {
    let table = dictionary_table(&[["data_set_1", "field_1", "Name 1", "Description 1", "str1", ""]]);
    let err = validate(Some(&table)).unwrap_err();
    assert!(err.is_validation());
    let message = err.to_string();
    assert!(message.contains("'str1'"));
    assert!(message.contains(
        "float, float32, float64, int, int32, int64, object, str, bool, datetime64, timedelta, category"
    ));
}

#[test]
fn duplicate_names_are_rejected() {
    let table = dictionary_table(&[
        ["data_set_1", "field_1", "Name 1", "Description 1", "str", ""],
        ["data_set_1", "field_2", "Name 1", "Description 2", "int", "{:d}"],
        ["data_set_1", "field_3", "Name 3", "Description 3", "bool", "{:}"],
    ]);
    let err = validate(Some(&table)).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "The Name column contains the following duplicates: ['Name 1']. The names must be unique."
    );
}

#[test]
fn duplicate_field_ids_are_rejected() {
    let table = dictionary_table(&[
        ["data_set_1", "field_1", "Name 1", "Description 1", "str", ""],
        ["data_set_1", "field_1", "Name 2", "Description 2", "int", "{:d}"],
        ["data_set_1", "field_3", "Name 3", "Description 3", "bool", "{:}"],
    ]);
    let err = validate(Some(&table)).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("['data_set_1.field_1']"));
    assert!(err.to_string().contains("must be unique"));
}

#[test]
fn entries_without_data_set_or_field_do_not_collide() {
    let table = dictionary_table(&[
        ["data_set_1", "field_1", "Name 1", "Description 1", "str", ""],
        ["", "", "Name 2", "Description 2", "int", "{:d}"],
        ["", "", "Name 3", "Description 3", "int", "{:d}"],
        ["", "field_1", "Name 4", "Description 4", "int", ""],
        ["data_set_2", "", "Name 5", "Description 5", "int", ""],
    ]);
    validate(Some(&table)).expect("partial field ids are never duplicates");
}

#[test]
fn blank_name_is_rejected() {
    let table = dictionary_table(&[["data_set_1", "field_1", "  ", "Description 1", "str", ""]]);
    assert!(validate(Some(&table)).unwrap_err().is_validation());
}

#[test]
fn extra_columns_are_allowed_and_default_aggregation_is_parsed() {
    let table = Table::from_rows(
        &["Data Set", "Field", "Name", "Description", "Type", "Format", "Default Aggregation", "Owner"],
        vec![
            ["ds", "a", "A", "", "int", "", "sum()", "x"].map(text).to_vec(),
            ["ds", "b", "B", "", "float", "", "MEAN", "y"].map(text).to_vec(),
            ["ds", "c", "C", "", "str", "", "eval('boom')", "z"].map(text).to_vec(),
        ],
    );
    let dict = Dictionary::from_table(&table).expect("valid dictionary");
    let aggregations = dict
        .definitions()
        .iter()
        .map(|d| d.default_aggregation)
        .collect::<Vec<_>>();
    assert_eq!(
        aggregations,
        vec![Some(Aggregation::Sum), Some(Aggregation::Mean), None]
    );
}

#[test]
fn derived_indexes_follow_dictionary_rows() {
    let dict = Dictionary::from_table(&sample_dictionary()).unwrap();
    assert_eq!(dict.names(), ["Name 1", "Name 2", "Name 3", "Name 4", "Name 5"]);
    assert_eq!(dict.formats().len(), 3);
    assert_eq!(dict.format_of("Name 4"), Some("£{:.1f}m"));
    assert_eq!(dict.format_of("Name 1"), None);
    assert_eq!(dict.position("Name 3"), Some(2));
}

#[test]
fn typed_definitions_are_validated_too() {
    let err = Dictionary::new(vec![
        FieldDefinition::new("Revenue", FieldType::Float).mapped_from("sales", "rev"),
        FieldDefinition::new("Revenue", FieldType::Int),
    ])
    .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn table_round_trip_preserves_content() {
    let dict = Dictionary::from_table(&sample_dictionary()).unwrap();
    let again = Dictionary::from_table(&dict.to_table()).unwrap();
    assert_eq!(dict, again);
    assert_eq!(dict.fingerprint(), again.fingerprint());
}

#[test]
fn fingerprint_changes_with_content() {
    let dict = Dictionary::from_table(&sample_dictionary()).unwrap();
    let other = Dictionary::from_table(&dictionary_table(&[[
        "data_set_1", "field_1", "Name 1", "Other", "str", "",
    ]]))
    .unwrap();
    assert_ne!(dict.fingerprint(), other.fingerprint());
    assert_eq!(dict.fingerprint().len(), 64);
}

#[test]
fn meta_dictionary_describes_the_dictionary_columns() {
    let meta = dictionary::meta();
    assert_eq!(meta.len(), 7);
    assert!(meta.definitions().iter().all(|d| d.field_type == FieldType::Str));
    assert!(
        meta.definitions()
            .iter()
            .all(|d| d.format.as_deref() == Some("{:s}"))
    );
    let view = meta.filtered_view(Some(dictionary::META_DATA_SET), false).unwrap();
    assert_eq!(view.by_field("data_set").map(|d| d.name.as_str()), Some("Data Set"));
    assert!(std::ptr::eq(meta, dictionary::meta()));
}

#[test]
fn datadict_validate_matches_free_function() {
    assert!(DataDict::validate(Some(&sample_dictionary())).is_ok());
    assert!(DataDict::validate(None).is_ok());
}
