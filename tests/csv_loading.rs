use typed_csv_store::ingestion::{load_from_path, parse, parse_source, LoaderOptions, MissingFieldPolicy};
use typed_csv_store::types::{Field, FieldId, Schema, Value};
use typed_csv_store::IngestionError;

fn people_schema() -> Schema {
    Schema::from_names(["id", "name", "score", "active"])
}

#[test]
fn load_from_path_happy_path() {
    let store = load_from_path("tests/fixtures/people.csv", &people_schema(), &LoaderOptions::default()).unwrap();

    assert_eq!(store.row_count(), 2);
    assert_eq!(
        store.row(0).unwrap().fields(),
        &[
            Value::Int64(1),
            Value::Utf8("Ada".to_string()),
            Value::Float64(98.5),
            Value::Bool(true),
        ]
    );
    // "87.0" has a decimal point, so it stays a float.
    assert_eq!(store.value(1, "score").unwrap(), &Value::Float64(87.0));
}

#[test]
fn load_from_path_missing_file_is_io_error() {
    let err = load_from_path(
        "tests/fixtures/does_not_exist.csv",
        &people_schema(),
        &LoaderOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IngestionError::Io(_)));
}

#[test]
fn parse_allows_reordered_columns() {
    let input = "name,id,active,score\nAda,1,true,98.5\n";
    let store = parse(input, &people_schema(), &LoaderOptions::default()).unwrap();
    assert_eq!(store.row_count(), 1);
    assert_eq!(store.value(0, "id").unwrap(), &Value::Int64(1));
    assert_eq!(store.value(0, "name").unwrap(), &Value::Utf8("Ada".to_string()));
}

#[test]
fn parse_errors_on_missing_required_column() {
    let input = "id,name,score\n1,Ada,98.5\n";
    let err = parse(input, &people_schema(), &LoaderOptions::default()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("schema mismatch"));
    assert!(msg.contains("missing required column 'active'"));
}

#[test]
fn header_names_match_case_insensitively_after_trim() {
    let input = " ID , NAME ,Score,ACTIVE\n1,Ada,1.5,false\n";
    let store = parse(input, &people_schema(), &LoaderOptions::default()).unwrap();
    assert_eq!(store.value(0, "active").unwrap(), &Value::Bool(false));
}

#[test]
fn end_to_end_sample_loads_three_rows() {
    let text = "ID,Name,Level\n1,Alice,10\n2,Bob,\n2,Carol,5\n";
    let schema = Schema::from_names(["ID", "Name", "Level"]);
    let store = parse(text, &schema, &LoaderOptions::default()).unwrap();

    assert_eq!(store.row_count(), 3);
    assert_eq!(
        store.column("Level").unwrap(),
        &[Value::Int64(10), Value::Null, Value::Int64(5)]
    );
}

#[test]
fn comments_and_blank_lines_contribute_no_rows() {
    let schema = Schema::from_names(["ID", "Name", "Level"]);
    let store = load_from_path("tests/fixtures/roster.csv", &schema, &LoaderOptions::default()).unwrap();

    assert_eq!(store.row_count(), 3);
    let names: Vec<_> = store.rows().map(|r| r.get("Name").unwrap().to_string()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    assert_eq!(store.source_line(0), Some(4));
    assert_eq!(store.source_line(2), Some(7));
}

#[test]
fn bom_crlf_semicolons_and_escaped_quotes() {
    let schema = Schema::from_names(["id", "name", "note"]);
    let opts = LoaderOptions {
        delimiter: ';',
        ..Default::default()
    };
    let store = load_from_path("tests/fixtures/semicolon_bom.csv", &schema, &opts).unwrap();

    assert_eq!(store.row_count(), 2);
    assert_eq!(store.value(0, "name").unwrap(), &Value::from("Smith; J"));
    assert_eq!(store.value(0, "note").unwrap(), &Value::from(r#"said "hi""#));
    assert_eq!(store.value(1, "note").unwrap(), &Value::Null);
}

#[test]
fn headerless_input_binds_by_position_and_ordinal() {
    let schema = Schema::new(vec![Field::new("a"), Field::new(FieldId::Ordinal(2))]);
    let opts = LoaderOptions {
        has_header: false,
        ..Default::default()
    };
    let store = parse("x,skipped,3\ny,skipped,4\n", &schema, &opts).unwrap();

    assert_eq!(store.column("a").unwrap(), &[Value::from("x"), Value::from("y")]);
    assert_eq!(store.column(1usize).unwrap(), &[Value::Int64(3), Value::Int64(4)]);
    assert_eq!(store.row(0).unwrap().extra(0), Some(&Value::from("skipped")));
}

#[test]
fn unterminated_quote_aborts_without_partial_store() {
    let text = "id,name\n1,ok\n2,\"broken\n3,fine\n";
    let schema = Schema::from_names(["id", "name"]);
    let err = parse(text, &schema, &LoaderOptions::default()).unwrap_err();
    match err {
        IngestionError::UnterminatedQuote { line, column } => {
            assert_eq!(line, 3);
            assert_eq!(column, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_field_policies() {
    let schema = Schema::new(vec![Field::new("id"), Field::new("qty").with_default(0)]);
    let text = "id,qty\n1,5\n2\n";

    let err = parse(text, &schema, &LoaderOptions::default()).unwrap_err();
    assert!(matches!(err, IngestionError::ColumnCountMismatch { line: 3, .. }));

    let opts = LoaderOptions {
        missing_field_policy: MissingFieldPolicy::SetDefault,
        ..Default::default()
    };
    let store = parse(text, &schema, &opts).unwrap();
    assert_eq!(store.column("qty").unwrap(), &[Value::Int64(5), Value::Int64(0)]);
    let warning = &store.load_warnings()[0];
    assert_eq!((warning.line, warning.row), (3, 1));
    assert!(warning.message.contains("qty"));
}

#[test]
fn parse_source_matches_parse() {
    let schema = Schema::from_names(["id"]);
    // The source name only reaches observers; the result is unchanged.
    let a = parse_source("inventory.csv", "id\n1\n", &schema, &LoaderOptions::default()).unwrap();
    let b = parse("id\n1\n", &schema, &LoaderOptions::default()).unwrap();
    assert_eq!(a.column("id").unwrap(), b.column("id").unwrap());
}

#[test]
fn loader_options_read_from_json() {
    let opts = LoaderOptions::from_json_str(r#"{"delimiter":"|","missing_field_policy":"ignore"}"#).unwrap();
    assert_eq!(opts.delimiter, '|');
    assert_eq!(opts.missing_field_policy, MissingFieldPolicy::Ignore);
    assert!(opts.has_header);

    let store = parse("a|b\n1\n", &Schema::from_names(["a", "b"]), &opts).unwrap();
    assert_eq!(store.value(0, "b").unwrap(), &Value::Null);
}

#[test]
fn out_of_range_ordinal_is_a_missing_field() {
    let schema = Schema::from_json_str(r#"{"fields":[{"id":"a"},{"id":18446744073709551615}]}"#).unwrap();
    assert_eq!(schema.fields[1].id, FieldId::Ordinal(usize::MAX));
    let opts = LoaderOptions {
        missing_field_policy: MissingFieldPolicy::Ignore,
        ..Default::default()
    };

    let store = parse("a\n1\n", &schema, &opts).unwrap();
    assert_eq!(store.row_count(), 1);
    assert_eq!(store.row(0).unwrap().fields(), &[Value::Int64(1), Value::Null]);
    assert_eq!(store.load_warnings().len(), 1);

    let err = parse("a\n1\n", &schema, &LoaderOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        IngestionError::ColumnCountMismatch {
            expected: usize::MAX,
            found: 1,
            ..
        }
    ));
}

#[test]
fn non_ascii_headers_bind_case_insensitively() {
    let schema = Schema::from_names(["état", "id"]);
    let store = parse("ID,ÉTAT\n1,ouvert\n", &schema, &LoaderOptions::default()).unwrap();
    assert_eq!(store.column("état").unwrap(), &[Value::from("ouvert")]);
    assert_eq!(store.column("ÉTAT").unwrap(), &[Value::from("ouvert")]);
}
