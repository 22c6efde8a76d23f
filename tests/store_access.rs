use typed_csv_store::ingestion::{parse, LoaderOptions};
use typed_csv_store::store::TypedStore;
use typed_csv_store::types::{Schema, Value};
use typed_csv_store::StoreError;

fn loaded() -> TypedStore {
    let schema = Schema::from_names(["id", "team", "score", "active"]);
    let text = "id,team,score,active\n\
                1,red,10,true\n\
                2,blue,7.5,false\n\
                3,red,,true\n\
                4,green,10.0,TRUE\n\
                5,blue,3,false\n";
    parse(text, &schema, &LoaderOptions::default()).unwrap()
}

#[test]
fn row_and_column_views_agree() {
    let store = loaded();
    for field in ["id", "team", "score", "active"] {
        let column = store.column(field).unwrap();
        assert_eq!(column.len(), store.row_count());
        for (i, row) in store.rows().enumerate() {
            assert_eq!(row.get(field).unwrap(), &column[i]);
        }
    }
}

#[test]
fn index_matches_a_column_scan() {
    let store = loaded();
    for field in ["team", "score", "active"] {
        let column = store.column(field).unwrap();
        let index = store.build_index(field).unwrap();
        for (value, rows) in index.iter() {
            let scanned: Vec<usize> = column
                .iter()
                .enumerate()
                .filter(|(_, v)| *v == value)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(rows, scanned.as_slice());
        }
    }
}

#[test]
fn numbers_index_by_value_and_strings_exactly() {
    let store = loaded();
    let index = store.build_index("score").unwrap();
    // "10" and "10.0" parse to Int64(10) and Float64(10.0), which are equal.
    assert_eq!(index.get(&Value::Int64(10)), &[0, 3]);

    let hits = store.find_all("team", &Value::from("red")).unwrap();
    assert_eq!(hits.iter().map(|r| r.index()).collect::<Vec<_>>(), vec![0, 2]);
    assert!(store.find("team", &Value::from("RED")).unwrap().is_none());
}

#[test]
fn find_returns_first_match() {
    let store = loaded();
    let row = store.find("team", &Value::from("blue")).unwrap().unwrap();
    assert_eq!(row.index(), 1);
    assert_eq!(row.get_as::<f64>("score").unwrap(), Some(7.5));
}

#[test]
fn group_by_keeps_first_seen_order() {
    let store = loaded();
    let groups: Vec<(String, Vec<usize>)> = store
        .group_by("team")
        .unwrap()
        .into_iter()
        .map(|(v, rows)| (v.to_string(), rows.to_vec()))
        .collect();
    assert_eq!(
        groups,
        vec![
            ("red".to_string(), vec![0, 2]),
            ("blue".to_string(), vec![1, 4]),
            ("green".to_string(), vec![3]),
        ]
    );
}

#[test]
fn typed_column_access() {
    let store = loaded();
    assert_eq!(
        store.column_as::<i64>("id").unwrap(),
        vec![Some(1), Some(2), Some(3), Some(4), Some(5)]
    );
    assert_eq!(
        store.column_as::<bool>("active").unwrap(),
        vec![Some(true), Some(false), Some(true), Some(true), Some(false)]
    );
    assert_eq!(store.column_as::<f64>("score").unwrap()[2], None);
}

#[test]
fn lookup_failures_are_distinct_from_null() {
    let store = loaded();
    assert_eq!(store.value(2, "score").unwrap(), &Value::Null);
    assert!(matches!(store.column("nope"), Err(StoreError::UnknownField(_))));
    assert!(matches!(store.row(99), Err(StoreError::RowOutOfBounds { index: 99, len: 5 })));
    assert!(matches!(store.column(7usize), Err(StoreError::FieldOutOfBounds { .. })));
}

#[test]
fn set_value_keeps_views_and_index_in_sync() {
    let mut store = loaded();
    assert_eq!(store.build_index("team").unwrap().get(&Value::from("green")), &[3]);

    store.set_value(0, "team", Value::from("green")).unwrap();

    assert_eq!(store.row(0).unwrap().get("team").unwrap(), &Value::from("green"));
    assert_eq!(store.column("team").unwrap()[0], Value::from("green"));
    assert_eq!(store.build_index("team").unwrap().get(&Value::from("green")), &[0, 3]);
}

#[test]
fn concurrent_readers_share_one_index() {
    let store = loaded();
    let results: Vec<Vec<usize>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| store.build_index("team").unwrap().get(&Value::from("blue")).to_vec()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.iter().all(|r| r == &vec![1, 4]));
}
