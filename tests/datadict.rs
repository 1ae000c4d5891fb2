mod common;

use std::{
    fs::File,
    time::{Duration, SystemTime},
};

use common::{SAMPLE_DATA_CSV, SAMPLE_DICTIONARY_CSV, TestWorkspace, raw_table, sample_dictionary};
use datadict::{DataDict, DataDictOptions, FieldType, Value, io_utils};

fn touch(path: &std::path::Path, offset_secs: u64) {
    let file = File::options().write(true).open(path).expect("open for mtime");
    file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
        .expect("set mtime");
}

#[test]
fn file_and_table_together_is_a_config_error() {
    let err = DataDict::new(DataDictOptions {
        file: Some("data_dict.csv".into()),
        table: Some(sample_dictionary()),
        ..DataDictOptions::default()
    })
    .unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("file and table"));
}

#[test]
fn missing_file_is_a_config_error() {
    let err = DataDict::from_file("data_dict_imaginary.csv").unwrap_err();
    assert!(err.is_config());
    assert_eq!(
        err.to_string(),
        "The data dictionary file data_dict_imaginary.csv does not exist."
    );
}

#[test]
fn neither_file_nor_table_gives_an_empty_dictionary() {
    let mut data_dict = DataDict::new(DataDictOptions::default()).unwrap();
    assert!(data_dict.names().unwrap().is_empty());
    assert!(data_dict.file().is_none());
    let table = raw_table(&["a"], &[&[""]]);
    assert_eq!(data_dict.remap(&table, None).unwrap().cell(0, "a"), Some(&None));
}

#[test]
fn file_loads_like_the_equivalent_table() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("data_dict.csv", SAMPLE_DICTIONARY_CSV);
    let mut data_dict = DataDict::from_file(&path).unwrap();

    let dict = data_dict.dictionary().unwrap();
    assert_eq!(dict.len(), 6);
    assert_eq!(
        dict.names(),
        ["Name 1", "Name 2", "Name 3", "Name 4", "Name 21", "Name 22"]
    );
    let unmapped = dict.definition("Name 22").unwrap();
    assert_eq!(unmapped.data_set, None);
    assert_eq!(unmapped.field, None);
    assert_eq!(unmapped.field_type, FieldType::Int);
    assert_eq!(dict.definition("Name 1").unwrap().format, None);
    assert_eq!(data_dict.formats().unwrap().get("Name 4").map(String::as_str), Some("£{:.1f}m"));
    assert_eq!(data_dict.file(), Some(path.as_path()));
}

#[test]
fn snake_case_headers_are_accepted() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "snake.csv",
        "data_set,field,name,description,type,format,default_aggregation\n\
         sales,rev,Revenue,Money in,float,{:.2f},sum\n",
    );
    let mut data_dict = DataDict::from_file(&path).unwrap();
    let dict = data_dict.dictionary().unwrap();
    let revenue = dict.definition("Revenue").unwrap();
    assert_eq!(revenue.field.as_deref(), Some("rev"));
    assert_eq!(revenue.default_aggregation, Some(datadict::Aggregation::Sum));
}

#[test]
fn tsv_dictionary_uses_tab_delimiter() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "dict.tsv",
        "Data Set\tField\tName\tDescription\tType\tFormat\nds\ta,b\tAB\tcomma field\tint\t{:,d}\n",
    );
    let mut data_dict = DataDict::from_file(&path).unwrap();
    let view_names = data_dict.filtered_view(Some("ds"), false).unwrap().names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    assert_eq!(view_names, ["AB"]);
}

#[test]
fn unknown_encoding_is_rejected() {
    let err = DataDict::new(DataDictOptions {
        encoding: Some("no-such-encoding".to_string()),
        ..DataDictOptions::default()
    })
    .unwrap_err();
    assert!(err.is_config());
}

#[test]
fn modified_file_is_reloaded_before_the_next_operation() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("data_dict.csv", SAMPLE_DICTIONARY_CSV);
    let mut data_dict = DataDict::from_file(&path).unwrap();
    let before = data_dict.fingerprint();

    workspace.write(
        "data_dict.csv",
        "Data Set,Field,Name,Description,Type,Format\nds,f,Renamed,,str,\n",
    );
    touch(&path, 60);

    assert_eq!(data_dict.names().unwrap(), ["Renamed"]);
    assert_ne!(data_dict.fingerprint(), before);
}

#[test]
fn disabled_auto_reload_keeps_the_first_snapshot() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("data_dict.csv", SAMPLE_DICTIONARY_CSV);
    let mut data_dict = DataDict::new(DataDictOptions {
        file: Some(path.clone()),
        auto_reload: false,
        ..DataDictOptions::default()
    })
    .unwrap();
    assert!(!data_dict.auto_reload());

    workspace.write(
        "data_dict.csv",
        "Data Set,Field,Name,Description,Type,Format\nds,f,Renamed,,str,\n",
    );
    touch(&path, 60);
    assert_eq!(data_dict.names().unwrap().len(), 6);

    data_dict.reload().unwrap();
    assert_eq!(data_dict.names().unwrap(), ["Renamed"]);
}

#[test]
fn failed_reload_fails_the_operation_and_keeps_the_snapshot() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("data_dict.csv", SAMPLE_DICTIONARY_CSV);
    let mut data_dict = DataDict::from_file(&path).unwrap();
    let snapshot = data_dict.snapshot();

    workspace.write(
        "data_dict.csv",
        "Data Set,Field,Name,Description,Type,Format\nds,f,Dup,,str,\nds,g,Dup,,str,\n",
    );
    touch(&path, 60);

    let table = raw_table(&["field_1"], &[&["x"]]);
    let err = data_dict.remap(&table, Some("data_set_1")).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(*data_dict.snapshot(), *snapshot);

    // still stale, so the next operation fails as well
    assert!(data_dict.reorder(&table).is_err());
}

#[test]
fn deleted_file_fails_the_next_operation() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("data_dict.csv", SAMPLE_DICTIONARY_CSV);
    let mut data_dict = DataDict::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(data_dict.names().unwrap_err().is_config());
}

#[test]
fn end_to_end_remap_stats_and_format() {
    let workspace = TestWorkspace::new();
    let dict_path = workspace.write("data_dict.csv", SAMPLE_DICTIONARY_CSV);
    let data_path = workspace.write("data.csv", SAMPLE_DATA_CSV);
    let mut data_dict = DataDict::from_file(&dict_path).unwrap();

    let raw = io_utils::read_table(&data_path, b',', encoding_rs::UTF_8).unwrap();
    let remapped = data_dict.remap(&raw, Some("data_set_1")).unwrap();
    assert_eq!(remapped.cell(0, "Name 2"), Some(&Some(Value::Integer(1))));

    let formatted = data_dict.format(&remapped).unwrap();
    assert_eq!(formatted.cell(0, "Name 2"), Some(&Some(Value::String("1".into()))));
    assert_eq!(formatted.cell(2, "Name 4"), Some(&Some(Value::String("-".into()))));

    let with_stats = data_dict.add_stats(&remapped).unwrap();
    let formatted = data_dict.format(&with_stats).unwrap();
    assert_eq!(formatted.cell(0, "Name 2"), Some(&Some(Value::String("6.0".into()))));
    assert_eq!(formatted.cell(1, "Name 2"), Some(&Some(Value::String("2.0".into()))));
}

#[test]
fn describe_lists_displayed_columns_in_dictionary_order() {
    let mut data_dict = DataDict::from_table(sample_dictionary()).unwrap();
    let table = raw_table(&["Name 4", "other", "Name 2"], &[&["1", "2", "3"]]);
    let described = data_dict.describe(&table).unwrap();
    assert_eq!(described.column_names(), vec!["Name", "Description"]);
    let names = described
        .column("Name")
        .unwrap()
        .values
        .iter()
        .map(|cell| cell.as_ref().map(Value::as_display).unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(names, ["Name 2", "Name 4"]);
}
