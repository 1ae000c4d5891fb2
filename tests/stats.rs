mod common;

use common::{dictionary_table, raw_table, sample_data, sample_dictionary};
use datadict::{
    Aggregation, DataDict, Dictionary, Table, Value, add_stats, has_stats, value::text,
};

fn remapped_sample() -> Table {
    Dictionary::from_table(&sample_dictionary())
        .unwrap()
        .remap(&sample_data(), Some("data_set_1"))
        .unwrap()
}

fn float_at(table: &Table, row: usize, column: &str) -> f64 {
    match table.cell(row, column) {
        Some(Some(value)) => value.as_f64().expect("numeric cell"),
        other => panic!("expected a number in {column} row {row}, found {other:?}"),
    }
}

#[test]
fn total_and_average_rows_are_prepended() {
    let table = add_stats(&remapped_sample());

    assert_eq!(table.row_count(), 5);
    assert_eq!(table.key(0), Some(&[text("Total")][..]));
    assert_eq!(table.key(1), Some(&[text("Average")][..]));
    assert_eq!(table.key(2), Some(&[Some(Value::Integer(0))][..]));

    assert_eq!(table.cell(0, "Name 2"), Some(&Some(Value::Integer(6))));
    assert_eq!(float_at(&table, 1, "Name 2"), 2.0);
    assert!((float_at(&table, 0, "Name 4") - 2.3).abs() < 1e-9);
    assert!((float_at(&table, 1, "Name 4") - 1.15).abs() < 1e-9);

    for column in ["Name 1", "Name 3", "Name 5", "field_6"] {
        assert_eq!(table.cell(0, column), Some(&None), "{column} total");
        assert_eq!(table.cell(1, column), Some(&None), "{column} average");
    }
}

#[test]
fn stats_annotation_records_sum_and_mean() {
    let plain = remapped_sample();
    assert!(!has_stats(&plain));

    let mut data_dict = DataDict::from_table(sample_dictionary()).unwrap();
    let table = data_dict.add_stats(&plain).unwrap();
    assert!(DataDict::has_stats(&table));
    let applied = table.stats().unwrap().iter().collect::<Vec<_>>();
    assert_eq!(applied, vec![Aggregation::Sum, Aggregation::Mean]);
}

#[test]
fn input_table_is_not_modified() {
    let plain = remapped_sample();
    let before = plain.clone();
    let _ = add_stats(&plain);
    assert_eq!(plain, before);
}

#[test]
fn multi_level_key_labels_only_the_first_level() {
    let table = raw_table(&["region", "city", "sales"], &[&["north", "york", "3"], &["south", "bath", "5"]])
        .set_key(&["region", "city"])
        .unwrap();
    let dict = Dictionary::from_table(&dictionary_table(&[["", "sales", "Sales", "", "int", "{:,d}"]])).unwrap();
    let table = add_stats(&dict.remap(&table, None).unwrap());

    assert_eq!(table.key(0), Some(&[text("Total"), None][..]));
    assert_eq!(table.key(1), Some(&[text("Average"), None][..]));
    assert_eq!(table.key(2), Some(&[text("north"), text("york")][..]));
    assert_eq!(table.cell(0, "Sales"), Some(&Some(Value::Integer(8))));
    assert_eq!(float_at(&table, 1, "Sales"), 4.0);
}

#[test]
fn all_missing_and_text_columns_get_no_stats() {
    let table = Table::from_rows(
        &["empty", "label"],
        vec![vec![None, text("a")], vec![None, text("b")]],
    );
    let table = add_stats(&table);
    assert_eq!(table.cell(0, "empty"), Some(&None));
    assert_eq!(table.cell(0, "label"), Some(&None));
}

#[test]
fn declared_numeric_columns_without_values_still_get_a_total() {
    let mut data_dict = DataDict::from_table(dictionary_table(&[
        ["ds", "qty", "Quantity", "", "int", "{:d}"],
        ["ds", "note", "Note", "", "str", ""],
    ]))
    .unwrap();
    let data = raw_table(&["qty", "note"], &[&["", "a"], &["", ""]]);
    let remapped = data_dict.remap(&data, Some("ds")).unwrap();
    let table = data_dict.add_stats(&remapped).unwrap();

    assert_eq!(table.cell(0, "Quantity"), Some(&Some(Value::Integer(0))));
    assert_eq!(table.cell(1, "Quantity"), Some(&None));
    assert_eq!(table.cell(0, "Note"), Some(&None));
    assert_eq!(add_stats(&remapped).cell(0, "Quantity"), Some(&None));
}

#[test]
fn adding_stats_twice_prepends_another_pair() {
    let once = add_stats(&remapped_sample());
    let twice = add_stats(&once);
    assert_eq!(twice.row_count(), 7);
    assert_eq!(twice.key(0), Some(&[text("Total")][..]));
    assert_eq!(twice.key(2), Some(&[text("Total")][..]));
    // the second total also sums the first pair of summary rows
    assert_eq!(twice.cell(0, "Name 2"), Some(&Some(Value::Float(14.0))));
    assert_eq!(
        twice.stats().unwrap().iter().collect::<Vec<_>>(),
        vec![Aggregation::Sum, Aggregation::Mean]
    );
}

#[test]
fn default_aggregations_summarise_declared_columns() {
    let table = Table::from_rows(
        &["Data Set", "Field", "Name", "Description", "Type", "Format", "Default Aggregation"],
        vec![
            ["ds", "units", "Units", "", "int", "", "sum"].map(text).to_vec(),
            ["ds", "price", "Price", "", "float", "", "max()"].map(text).to_vec(),
            ["ds", "label", "Label", "", "str", "", ""].map(text).to_vec(),
        ],
    );
    let mut data_dict = DataDict::from_table(table).unwrap();
    let data = raw_table(
        &["units", "price", "label"],
        &[&["2", "1.5", "a"], &["3", "4.25", "b"], &["", "2", "c"]],
    );
    let remapped = data_dict.remap(&data, Some("ds")).unwrap();
    let summary = data_dict.aggregate(&remapped).unwrap();
    assert_eq!(
        summary,
        vec![
            ("Units".to_string(), Some(Value::Integer(5))),
            ("Price".to_string(), Some(Value::Float(4.25))),
        ]
    );
}
