use super::*;
use crate::Entity;
use std::sync::Arc;

#[derive(Entity, Debug, Default)]
struct TestModel {
    id: i64,
    first_name: String,
    age: i8,
    last_name: Option<String>,
}

#[derive(Entity, Debug, Default)]
#[orm(table = "custom_table_name_t")]
struct CustomTableName {
    #[orm(column = "first_name_t")]
    first_name: String,
    #[orm(tag = "column=")]
    last_name: String,
    #[orm(tag = "abc=abc")]
    age: i8,
}

#[derive(Entity, Debug, Default)]
#[orm(table = "")]
#[allow(non_snake_case)]
struct Table1Name {
    ID: i64,
}

#[derive(Entity, Debug, Default)]
struct InvalidTag {
    #[orm(tag = "column")]
    first_name: String,
}

#[test]
fn test_underscore_name() {
    assert_eq!(underscore_name("TestModel"), "test_model");
    assert_eq!(underscore_name("ID"), "i_d");
    assert_eq!(underscore_name("Table1Name"), "table1_name");
    assert_eq!(underscore_name("first_name"), "first_name");
    assert_eq!(underscore_name(""), "");
}

#[test]
fn test_parse_tag() {
    assert!(parse_tag("").unwrap().is_empty());

    let tags = parse_tag("column=name,abc=def").unwrap();
    assert_eq!(tags.get("column"), Some(&"name"));
    assert_eq!(tags.get("abc"), Some(&"def"));

    assert!(matches!(
        parse_tag("column"),
        Err(OrmError::InvalidTagContent(ref p)) if p == "column"
    ));
    assert!(matches!(
        parse_tag("column=a=b"),
        Err(OrmError::InvalidTagContent(_))
    ));
}

#[test]
fn test_parse_model() {
    let m = Model::parse::<TestModel>().unwrap();
    assert_eq!(m.table_name, "test_model");
    let columns: Vec<&str> = m.fields.iter().map(|f| f.column.as_str()).collect();
    assert_eq!(columns, ["id", "first_name", "age", "last_name"]);

    let fd = m.field("first_name").unwrap();
    assert_eq!(fd.index, 1);
    assert_eq!(fd.type_name, "String");
    assert_eq!(fd.sample(), Value::Text(String::new()));
    assert_eq!(m.field_by_column("last_name").unwrap().name, "last_name");
    assert_eq!(m.column_count(), 4);
    assert!(m.describes::<TestModel>());
    assert!(!m.describes::<CustomTableName>());
}

#[test]
fn test_parse_tags_and_custom_table() {
    let m = Model::parse::<CustomTableName>().unwrap();
    assert_eq!(m.table_name, "custom_table_name_t");
    assert_eq!(m.field("first_name").unwrap().column, "first_name_t");
    // An empty column tag falls back to the derived name.
    assert_eq!(m.field("last_name").unwrap().column, "last_name");
    // Unknown keys are ignored.
    assert_eq!(m.field("age").unwrap().column, "age");
}

#[test]
fn test_parse_empty_custom_table_falls_back() {
    let m = Model::parse::<Table1Name>().unwrap();
    assert_eq!(m.table_name, "table1_name");
    assert_eq!(m.field("ID").unwrap().column, "i_d");
}

#[test]
fn test_parse_invalid_tag() {
    let err = Model::parse::<InvalidTag>().unwrap_err();
    assert!(matches!(err, OrmError::InvalidTagContent(_)));
}

#[test]
fn test_parse_non_struct() {
    assert!(matches!(
        Model::parse::<i64>(),
        Err(OrmError::StructOnly(_))
    ));
    assert!(matches!(
        Model::parse::<Box<TestModel>>(),
        Err(OrmError::StructOnly(_))
    ));
    assert!(matches!(
        Model::parse::<Option<String>>(),
        Err(OrmError::StructOnly(_))
    ));
}

#[test]
fn test_registry_get_is_cached() {
    let r = Registry::new();
    assert!(r.is_empty());
    let m1 = r.get::<TestModel>().unwrap();
    let m2 = r.get::<TestModel>().unwrap();
    assert!(Arc::ptr_eq(&m1, &m2));
    assert_eq!(r.len(), 1);

    assert!(r.get::<Box<TestModel>>().is_err());
    assert_eq!(r.len(), 1);
}

#[test]
fn test_registry_register_options() {
    let r = Registry::new();
    let m = r
        .register::<TestModel, _>([
            ModelOption::table_name("people"),
            ModelOption::column_name("first_name", "given_name"),
        ])
        .unwrap();
    assert_eq!(m.table_name, "people");
    assert_eq!(m.field("first_name").unwrap().column, "given_name");
    assert!(m.field_by_column("given_name").is_some());
    assert!(m.field_by_column("first_name").is_none());

    // Already cached: options no longer apply.
    let again = r
        .register::<TestModel, _>([ModelOption::table_name("ignored")])
        .unwrap();
    assert!(Arc::ptr_eq(&m, &again));
    assert_eq!(r.get::<TestModel>().unwrap().table_name, "people");
}

#[test]
fn test_registry_register_unknown_field() {
    let r = Registry::new();
    let err = r
        .register::<TestModel, _>([ModelOption::column_name("nope", "x")])
        .unwrap_err();
    assert!(err.is_unknown_field());
    assert!(r.is_empty());
}

#[test]
fn test_registry_concurrent_get() {
    let r = Arc::new(Registry::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let r = Arc::clone(&r);
            std::thread::spawn(move || r.get::<TestModel>().unwrap())
        })
        .collect();
    let models: Vec<Arc<Model>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for m in &models {
        assert!(Arc::ptr_eq(m, &models[0]));
    }
    assert_eq!(r.len(), 1);
}
