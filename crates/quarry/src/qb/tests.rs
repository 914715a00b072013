use super::*;
use crate::db::{DB, DbOptions};
use crate::dialect::{Dialect, MYSQL, SQLITE};
use crate::driver::mock::MockDriver;
use crate::error::OrmError;
use crate::expr::{
    Selectable, all, any, asc, assign, avg, c, count, desc, exists, max, not, raw, some, sum,
};
use crate::session::Session;
use crate::value::Value;
use crate::valuer::ValuerKind;
use crate::Entity;
use std::sync::Arc;

#[derive(Entity, Debug, Default, Clone, PartialEq)]
struct TestModel {
    id: i64,
    first_name: String,
    age: i8,
    last_name: Option<String>,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
struct OrderDetail {
    order_id: i64,
    item_id: i64,
    usr_id: i64,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
struct Item {
    id: i64,
    name: String,
}

fn db_with(dialect: &'static dyn Dialect) -> (DB, MockDriver) {
    let mock = MockDriver::new();
    let db = DB::open_with(
        "mock",
        Arc::new(mock.clone()),
        DbOptions::new().with_dialect(dialect),
    )
    .unwrap();
    (db, mock)
}

fn mysql() -> DB {
    db_with(&MYSQL).0
}

fn sqlite() -> DB {
    db_with(&SQLITE).0
}

fn tom() -> TestModel {
    TestModel {
        id: 1,
        first_name: "Tom".to_string(),
        age: 18,
        last_name: Some("Jerry".to_string()),
    }
}

fn query(sql: &str, args: Vec<Value>) -> Query {
    Query::new(sql, args)
}

// ==================== Select ====================

#[test]
fn test_select_no_clauses() {
    let db = mysql();
    let q = db.select::<TestModel>().build().unwrap();
    assert_eq!(q, query("SELECT * FROM `test_model`;", vec![]));
}

#[test]
fn test_select_where_eq() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .where_([c("id").eq(1)])
        .build()
        .unwrap();
    assert_eq!(
        q,
        query("SELECT * FROM `test_model` WHERE `id` = ?;", vec![Value::I32(1)])
    );
}

#[test]
fn test_select_where_and() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .where_([c("age").gt(18).and(c("age").lt(35))])
        .build()
        .unwrap();
    assert_eq!(
        q,
        query(
            "SELECT * FROM `test_model` WHERE (`age` > ?) AND (`age` < ?);",
            vec![Value::I32(18), Value::I32(35)]
        )
    );
}

#[test]
fn test_select_multiple_predicates_are_anded() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .where_([c("id").eq(1), c("age").gt(18), c("first_name").like("T%")])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM `test_model` WHERE ((`id` = ?) AND (`age` > ?)) AND (`first_name` LIKE ?);"
    );
    assert_eq!(
        q.args,
        vec![Value::I32(1), Value::I32(18), Value::Text("T%".to_string())]
    );
}

#[test]
fn test_select_or_and_not() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .where_([not(c("id").eq(1).and(c("age").gt(18)).or(c("age").lt(5)))])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM `test_model` WHERE NOT (((`id` = ?) AND (`age` > ?)) OR (`age` < ?));"
    );
    assert_eq!(q.args, vec![Value::I32(1), Value::I32(18), Value::I32(5)]);
}

#[test]
fn test_select_unknown_field() {
    let db = mysql();
    let err = db
        .select::<TestModel>()
        .where_([c("invalid").eq(1)])
        .build()
        .unwrap_err();
    assert!(matches!(err, OrmError::UnknownField(ref f) if f == "invalid"));
}

#[test]
fn test_select_is_deterministic() {
    let db = mysql();
    let s = db
        .select::<TestModel>()
        .where_([c("age").gt(18).or(c("id").eq(3))]);
    assert_eq!(s.build().unwrap(), s.build().unwrap());
}

#[test]
fn test_select_columns_and_alias() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .select([c("id"), c("first_name").as_("name")])
        .build()
        .unwrap();
    assert_eq!(q.sql, "SELECT `id`,`first_name` AS `name` FROM `test_model`;");
}

#[test]
fn test_select_aggregates() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .select([
            avg("age").as_("avg_age"),
            count("id"),
            sum("age"),
            max("age"),
        ])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT AVG(`age`) AS `avg_age`,COUNT(`id`),SUM(`age`),MAX(`age`) FROM `test_model`;"
    );
}

#[test]
fn test_select_raw_column() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .select([raw("COUNT(DISTINCT `first_name`)", vec![])])
        .build()
        .unwrap();
    assert_eq!(q.sql, "SELECT COUNT(DISTINCT `first_name`) FROM `test_model`;");
}

#[test]
fn test_select_group_by_having_alias() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .select([c("first_name").into(), Selectable::from(avg("age").as_("avg_age"))])
        .group_by([c("first_name")])
        .having([c("avg_age").gt(18)])
        .build()
        .unwrap();
    assert_eq!(
        q,
        query(
            "SELECT `first_name`,AVG(`age`) AS `avg_age` FROM `test_model` GROUP BY `first_name` HAVING `avg_age` > ?;",
            vec![Value::I32(18)]
        )
    );
}

#[test]
fn test_select_having_aggregate() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .group_by([c("first_name"), c("last_name")])
        .having([avg("age").gt(18)])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM `test_model` GROUP BY `first_name`,`last_name` HAVING AVG(`age`) > ?;"
    );
}

#[test]
fn test_select_alias_not_visible_in_where() {
    let db = mysql();
    let err = db
        .select::<TestModel>()
        .select([c("age").as_("years")])
        .where_([c("years").gt(18)])
        .build()
        .unwrap_err();
    assert!(err.is_unknown_field());
}

#[test]
fn test_select_duplicate_alias() {
    let db = mysql();
    let err = db
        .select::<TestModel>()
        .select([c("id").as_("x"), c("age").as_("x")])
        .build()
        .unwrap_err();
    assert!(matches!(err, OrmError::DuplicateAlias(ref a) if a == "x"));

    let err = db
        .select::<TestModel>()
        .select([Selectable::from(c("id").as_("x")), avg("age").as_("x").into()])
        .build()
        .unwrap_err();
    assert!(matches!(err, OrmError::DuplicateAlias(_)));
}

#[test]
fn test_select_order_limit_offset() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .order_by([asc("age"), desc("id")])
        .limit(10)
        .offset(20)
        .build()
        .unwrap();
    assert_eq!(
        q,
        query(
            "SELECT * FROM `test_model` ORDER BY `age` ASC,`id` DESC LIMIT ? OFFSET ?;",
            vec![Value::I64(10), Value::I64(20)]
        )
    );
}

#[test]
fn test_select_zero_limit_is_omitted() {
    let db = mysql();
    let q = db.select::<TestModel>().limit(0).offset(0).build().unwrap();
    assert_eq!(q.sql, "SELECT * FROM `test_model`;");

    let err = db
        .select::<TestModel>()
        .order_by([asc("nope")])
        .build()
        .unwrap_err();
    assert!(err.is_unknown_field());
}

#[test]
fn test_select_raw_predicate() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .where_([raw("`age` < ?", vec![Value::from(18)]).as_predicate()])
        .build()
        .unwrap();
    assert_eq!(
        q,
        query("SELECT * FROM `test_model` WHERE `age` < ?;", vec![Value::I32(18)])
    );
}

#[test]
fn test_select_in_values() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .where_([c("id").in_values([1i64, 2, 3])])
        .build()
        .unwrap();
    assert_eq!(q.sql, "SELECT * FROM `test_model` WHERE `id` IN (?,?,?);");
    assert_eq!(q.args, vec![Value::I64(1), Value::I64(2), Value::I64(3)]);

    let q = db
        .select::<TestModel>()
        .where_([c("id").in_values(Vec::<i64>::new())])
        .build()
        .unwrap();
    assert_eq!(q.sql, "SELECT * FROM `test_model` WHERE `id` IN (NULL);");
    assert!(q.args.is_empty());
}

#[test]
fn test_select_math_operand() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .where_([c("age").eq(c("id").add(1).multi(2))])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM `test_model` WHERE `age` = ((`id` + ?) * ?);"
    );
    assert_eq!(q.args, vec![Value::I32(1), Value::I32(2)]);
}

// ==================== Join ====================

#[test]
fn test_join_on() {
    let db = mysql();
    let t1 = table_of::<TestModel>().as_("t1");
    let t2 = table_of::<OrderDetail>().as_("t2");
    let q = db
        .select::<TestModel>()
        .select([t1.c("id"), t2.c("item_id")])
        .from(t1.clone().join(t2.clone()).on([t1.c("id").eq(t2.c("order_id"))]))
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT `t1`.`id`,`t2`.`item_id` FROM (`test_model` AS `t1` JOIN `order_detail` AS `t2` ON `t1`.`id` = `t2`.`order_id`);"
    );
}

#[test]
fn test_join_using() {
    let db = mysql();
    let t1 = table_of::<TestModel>().as_("t1");
    let t2 = table_of::<Item>().as_("t2");
    let q = db
        .select::<TestModel>()
        .from(t1.left_join(t2).using(["id"]))
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM (`test_model` AS `t1` LEFT JOIN `item` AS `t2` USING (`id`));"
    );
}

#[test]
fn test_join_nested() {
    let db = mysql();
    let t1 = table_of::<TestModel>().as_("t1");
    let t2 = table_of::<OrderDetail>().as_("t2");
    let t3 = table_of::<Item>().as_("t3");
    let j = t1
        .clone()
        .join(t2.clone())
        .on([t1.c("id").eq(t2.c("usr_id"))])
        .right_join(t3.clone())
        .on([t2.c("item_id").eq(t3.c("id"))]);
    let q = db.select::<TestModel>().from(j).build().unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM ((`test_model` AS `t1` JOIN `order_detail` AS `t2` ON `t1`.`id` = `t2`.`usr_id`) RIGHT JOIN `item` AS `t3` ON `t2`.`item_id` = `t3`.`id`);"
    );
}

#[test]
fn test_join_qualified_unknown_field() {
    let db = mysql();
    let t1 = table_of::<TestModel>().as_("t1");
    let t2 = table_of::<OrderDetail>().as_("t2");
    // `first_name` belongs to TestModel, not to the table it is qualified with.
    let err = db
        .select::<TestModel>()
        .from(t1.clone().join(t2.clone()).on([t1.c("id").eq(t2.c("first_name"))]))
        .build()
        .unwrap_err();
    assert!(err.is_unknown_field());
}

#[test]
fn test_join_duplicate_table_alias() {
    let db = mysql();
    let t1 = table_of::<TestModel>().as_("t");
    let t2 = table_of::<OrderDetail>().as_("t");
    let err = db
        .select::<TestModel>()
        .from(t1.join(t2).using(["id"]))
        .build()
        .unwrap_err();
    assert!(matches!(err, OrmError::DuplicateAlias(_)));
}

// ==================== Subquery ====================

#[test]
fn test_subquery_from() {
    let db = mysql();
    let sub = db.select::<OrderDetail>().as_subquery("sub");
    let q = db
        .select::<TestModel>()
        .select([sub.c("order_id")])
        .from(sub.clone())
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT `sub`.`order_id` FROM (SELECT * FROM `order_detail`) AS `sub`;"
    );
}

#[test]
fn test_subquery_selected_columns() {
    let db = mysql();
    let sub = db
        .select::<OrderDetail>()
        .select([c("order_id"), c("item_id").as_("item")])
        .where_([c("usr_id").eq(7)])
        .as_subquery("sub");
    let q = db
        .select::<TestModel>()
        .select([sub.c("order_id"), sub.c("item")])
        .from(sub.clone())
        .where_([sub.c("order_id").gt(3)])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT `sub`.`order_id`,`sub`.`item` FROM (SELECT `order_id`,`item_id` AS `item` FROM `order_detail` WHERE `usr_id` = ?) AS `sub` WHERE `sub`.`order_id` > ?;"
    );
    assert_eq!(q.args, vec![Value::I32(7), Value::I32(3)]);

    // Only the selected list is exposed.
    let err = db
        .select::<TestModel>()
        .select([sub.c("usr_id")])
        .from(sub.clone())
        .build()
        .unwrap_err();
    assert!(err.is_unknown_field());
}

#[test]
fn test_subquery_qualified_selected_column() {
    let db = mysql();
    let t = table_of::<OrderDetail>().as_("o");
    let sub = db
        .select::<OrderDetail>()
        .select([t.c("item_id")])
        .from(t.clone())
        .as_subquery("sub");
    let q = db
        .select::<TestModel>()
        .select([sub.c("item_id")])
        .from(sub.clone())
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT `sub`.`item_id` FROM (SELECT `o`.`item_id` FROM `order_detail` AS `o`) AS `sub`;"
    );
}

#[test]
fn test_subquery_join() {
    let db = mysql();
    let t1 = table_of::<TestModel>().as_("t1");
    let sub = db.select::<OrderDetail>().as_subquery("sub");
    let q = db
        .select::<TestModel>()
        .select([t1.c("first_name"), sub.c("item_id")])
        .from(t1.clone().join(sub.clone()).on([t1.c("id").eq(sub.c("usr_id"))]))
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT `t1`.`first_name`,`sub`.`item_id` FROM (`test_model` AS `t1` JOIN (SELECT * FROM `order_detail`) AS `sub` ON `t1`.`id` = `sub`.`usr_id`);"
    );
}

#[test]
fn test_subquery_in_predicate_splices_args() {
    let db = mysql();
    let sub = db
        .select::<OrderDetail>()
        .select([c("usr_id")])
        .where_([c("item_id").eq(5)])
        .as_subquery("sub");
    let q = db
        .select::<TestModel>()
        .where_([c("age").gt(18), c("id").in_(sub)])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM `test_model` WHERE (`age` > ?) AND (`id` IN (SELECT `usr_id` FROM `order_detail` WHERE `item_id` = ?));"
    );
    assert_eq!(q.args, vec![Value::I32(18), Value::I32(5)]);
}

#[test]
fn test_subquery_exists_and_quantifiers() {
    let db = mysql();
    let sub = db
        .select::<OrderDetail>()
        .select([c("usr_id")])
        .as_subquery("sub");

    let q = db
        .select::<TestModel>()
        .where_([exists(sub.clone())])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM `test_model` WHERE EXISTS (SELECT `usr_id` FROM `order_detail`);"
    );

    let q = db
        .select::<TestModel>()
        .where_([
            c("id").gt(all(sub.clone())),
            c("id").eq(any(sub.clone())),
            c("id").lt(some(sub)),
        ])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM `test_model` WHERE ((`id` > ALL (SELECT `usr_id` FROM `order_detail`)) AND (`id` = ANY (SELECT `usr_id` FROM `order_detail`))) AND (`id` < SOME (SELECT `usr_id` FROM `order_detail`));"
    );
}

// ==================== Union ====================

#[test]
fn test_union() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .where_([c("id").eq(1)])
        .union(db.select::<TestModel>().where_([c("id").eq(2)]))
        .build()
        .unwrap();
    assert_eq!(
        q,
        query(
            "(SELECT * FROM `test_model` WHERE `id` = ?) UNION (SELECT * FROM `test_model` WHERE `id` = ?);",
            vec![Value::I32(1), Value::I32(2)]
        )
    );
}

#[test]
fn test_union_chained() {
    let db = mysql();
    let q = db
        .select::<TestModel>()
        .union(db.select::<TestModel>())
        .union_all(db.select::<TestModel>().limit(1))
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "((SELECT * FROM `test_model`) UNION (SELECT * FROM `test_model`)) UNION ALL (SELECT * FROM `test_model` LIMIT ?);"
    );
    assert_eq!(q.args, vec![Value::I64(1)]);
}

#[test]
fn test_union_as_table() {
    let db = mysql();
    let u = db
        .select::<TestModel>()
        .where_([c("age").lt(10)])
        .union_all(db.select::<TestModel>().where_([c("age").gt(60)]));

    let q = db.select::<TestModel>().from(u.clone()).build().unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM ((SELECT * FROM `test_model` WHERE `age` < ?) UNION ALL (SELECT * FROM `test_model` WHERE `age` > ?));"
    );

    let sub = u.as_subquery("u");
    let q = db
        .select::<TestModel>()
        .select([sub.c("first_name")])
        .from(sub.clone())
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT `u`.`first_name` FROM ((SELECT * FROM `test_model` WHERE `age` < ?) UNION ALL (SELECT * FROM `test_model` WHERE `age` > ?)) AS `u`;"
    );
    assert_eq!(q.args, vec![Value::I32(10), Value::I32(60)]);
}

// ==================== Insert ====================

#[test]
fn test_insert_single_row() {
    let db = mysql();
    let q = db.insert::<TestModel>().values([tom()]).build().unwrap();
    assert_eq!(
        q,
        query(
            "INSERT INTO `test_model`(`id`,`first_name`,`age`,`last_name`) VALUES(?,?,?,?);",
            vec![
                Value::I64(1),
                Value::Text("Tom".to_string()),
                Value::I8(18),
                Value::Text("Jerry".to_string()),
            ]
        )
    );
}

#[test]
fn test_insert_multiple_rows_and_columns() {
    let db = mysql();
    let jerry = TestModel {
        id: 2,
        first_name: "Jerry".to_string(),
        ..Default::default()
    };
    let q = db
        .insert::<TestModel>()
        .values([tom(), jerry])
        .columns(["id", "last_name"])
        .build()
        .unwrap();
    assert_eq!(
        q,
        query(
            "INSERT INTO `test_model`(`id`,`last_name`) VALUES(?,?),(?,?);",
            vec![
                Value::I64(1),
                Value::Text("Jerry".to_string()),
                Value::I64(2),
                Value::Null,
            ]
        )
    );
}

#[test]
fn test_insert_errors() {
    let db = mysql();
    let err = db.insert::<TestModel>().build().unwrap_err();
    assert!(matches!(err, OrmError::InsertZeroRow));

    let err = db
        .insert::<TestModel>()
        .values([tom()])
        .columns(["nope"])
        .build()
        .unwrap_err();
    assert!(err.is_unknown_field());
}

#[test]
fn test_insert_upsert_mysql() {
    let db = mysql();
    let q = db
        .insert::<TestModel>()
        .values([tom(), TestModel::default()])
        .on_conflict_key()
        .update([c("first_name"), c("last_name")])
        .build()
        .unwrap();
    assert!(q.sql.ends_with(
        " ON DUPLICATE KEY UPDATE `first_name` = VALUES(`first_name`),`last_name` = VALUES(`last_name`);"
    ));
    assert_eq!(q.args.len(), 8);

    let q = db
        .insert::<TestModel>()
        .values([tom()])
        .on_conflict_key()
        .update([assign("age", c("age").add(1))])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "INSERT INTO `test_model`(`id`,`first_name`,`age`,`last_name`) VALUES(?,?,?,?) ON DUPLICATE KEY UPDATE `age` = `age` + ?;"
    );
    assert_eq!(q.args.last(), Some(&Value::I32(1)));
}

#[test]
fn test_insert_upsert_sqlite() {
    let db = sqlite();
    let q = db
        .insert::<TestModel>()
        .values([tom()])
        .on_conflict_key()
        .conflict_columns(["id"])
        .update([
            crate::expr::Assignable::from(c("first_name")),
            assign("age", 30).into(),
        ])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "INSERT INTO `test_model`(`id`,`first_name`,`age`,`last_name`) VALUES(?,?,?,?) ON CONFLICT (`id`) DO UPDATE SET `first_name` = excluded.`first_name`,`age` = ?;"
    );
    assert_eq!(q.args.len(), 5);

    let err = db
        .insert::<TestModel>()
        .values([tom()])
        .on_conflict_key()
        .conflict_columns(["nope"])
        .update([c("first_name")])
        .build()
        .unwrap_err();
    assert!(err.is_unknown_field());
}

#[test]
fn test_insert_upsert_requires_assignment() {
    for db in [mysql(), sqlite()] {
        let err = db
            .insert::<TestModel>()
            .values([tom()])
            .on_conflict_key()
            .conflict_columns(["id"])
            .update(Vec::<crate::expr::Assignable>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::NoUpdatedColumns));
    }
}

// ==================== Update ====================

#[test]
fn test_update_no_columns() {
    let db = mysql();
    let err = db.update::<TestModel>().update(tom()).build().unwrap_err();
    assert!(matches!(err, OrmError::NoUpdatedColumns));
}

#[test]
fn test_update_from_template() {
    let db = mysql();
    let q = db
        .update::<TestModel>()
        .update(tom())
        .set([c("first_name"), c("age")])
        .where_([c("id").eq(1)])
        .build()
        .unwrap();
    assert_eq!(
        q,
        query(
            "UPDATE `test_model` SET `first_name` = ?,`age` = ? WHERE `id` = ?;",
            vec![Value::Text("Tom".to_string()), Value::I8(18), Value::I32(1)]
        )
    );
}

#[test]
fn test_update_without_template_uses_default() {
    let db = mysql();
    let q = db.update::<TestModel>().set([c("age")]).build().unwrap();
    assert_eq!(q, query("UPDATE `test_model` SET `age` = ?;", vec![Value::I8(0)]));
}

#[test]
fn test_update_self_reference() {
    let db = mysql();
    let q = db
        .update::<TestModel>()
        .set([assign("age", c("age").add(1))])
        .where_([c("id").eq(1)])
        .build()
        .unwrap();
    assert_eq!(
        q,
        query(
            "UPDATE `test_model` SET `age` = `age` + ? WHERE `id` = ?;",
            vec![Value::I32(1), Value::I32(1)]
        )
    );
}

#[test]
fn test_update_unknown_column() {
    let db = mysql();
    let err = db.update::<TestModel>().set([c("nope")]).build().unwrap_err();
    assert!(err.is_unknown_field());
    let err = db
        .update::<TestModel>()
        .set([assign("nope", 1)])
        .build()
        .unwrap_err();
    assert!(err.is_unknown_field());
}

#[test]
fn test_assign_not_nil_columns() {
    let db = mysql();
    let v = TestModel {
        id: 13,
        ..Default::default()
    };
    let q = db
        .update::<TestModel>()
        .set(assign_not_nil_columns(&v))
        .build()
        .unwrap();
    assert_eq!(
        q,
        query(
            "UPDATE `test_model` SET `id` = ?,`first_name` = ?,`age` = ?;",
            vec![Value::I64(13), Value::Text(String::new()), Value::I8(0)]
        )
    );
}

#[test]
fn test_assign_not_zero_columns() {
    let db = mysql();
    let v = TestModel {
        id: 13,
        ..Default::default()
    };
    let q = db
        .update::<TestModel>()
        .set(assign_not_zero_columns(&v))
        .build()
        .unwrap();
    assert_eq!(q, query("UPDATE `test_model` SET `id` = ?;", vec![Value::I64(13)]));
}

#[test]
fn test_assign_columns_filter() {
    let db = mysql();
    let q = db
        .update::<TestModel>()
        .set(assign_columns(&tom(), |name, _| name != "id"))
        .where_([c("id").eq(1)])
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "UPDATE `test_model` SET `first_name` = ?,`age` = ?,`last_name` = ? WHERE `id` = ?;"
    );
}

// ==================== Delete ====================

#[test]
fn test_delete() {
    let db = mysql();
    let q = db.delete::<TestModel>().build().unwrap();
    assert_eq!(q, query("DELETE FROM `test_model`;", vec![]));

    let q = db
        .delete::<TestModel>()
        .where_([c("id").eq(1)])
        .build()
        .unwrap();
    assert_eq!(
        q,
        query("DELETE FROM `test_model` WHERE `id` = ?;", vec![Value::I32(1)])
    );
}

#[test]
fn test_delete_from_other_table() {
    let db = mysql();
    let q = db
        .delete::<TestModel>()
        .from(table_of::<OrderDetail>())
        .where_([c("order_id").eq(9)])
        .build()
        .unwrap();
    assert_eq!(
        q,
        query(
            "DELETE FROM `order_detail` WHERE `order_id` = ?;",
            vec![Value::I32(9)]
        )
    );
}

// ==================== Raw / Create ====================

#[test]
fn test_raw_query_build() {
    let db = mysql();
    let q = raw_query::<TestModel, _>(&db, "SELECT * FROM `test_model` WHERE `id` = ?;", vec![Value::I64(1)])
        .build()
        .unwrap();
    assert_eq!(
        q,
        query("SELECT * FROM `test_model` WHERE `id` = ?;", vec![Value::I64(1)])
    );
}

#[test]
fn test_create_table() {
    let q = mysql().create_table::<TestModel>().build().unwrap();
    assert_eq!(
        q.sql,
        "CREATE TABLE IF NOT EXISTS `test_model` (`id` bigint(11),`first_name` longtext,`age` int(11),`last_name` longtext);"
    );

    let q = sqlite().create_table::<TestModel>().build().unwrap();
    assert_eq!(
        q.sql,
        "CREATE TABLE IF NOT EXISTS `test_model` (`id` bigint,`first_name` text,`age` integer,`last_name` text);"
    );
}

// ==================== Execution ====================

fn tom_row(mock: &MockDriver) {
    mock.push_rows(
        &["id", "first_name", "age", "last_name"],
        vec![vec![
            Value::I64(1),
            Value::Text("Tom".to_string()),
            Value::I8(18),
            Value::Text("Jerry".to_string()),
        ]],
    );
}

#[tokio::test]
async fn test_get() {
    let (db, mock) = db_with(&MYSQL);
    tom_row(&mock);
    let got = db
        .select::<TestModel>()
        .where_([c("id").eq(1)])
        .get()
        .await
        .unwrap();
    assert_eq!(got, tom());
    assert_eq!(
        mock.log(),
        vec![(
            "SELECT * FROM `test_model` WHERE `id` = ?;".to_string(),
            vec![Value::I32(1)]
        )]
    );
}

#[tokio::test]
async fn test_get_unsafe_valuer() {
    let mock = MockDriver::new();
    let db = DB::open_with(
        "mysql",
        Arc::new(mock.clone()),
        DbOptions::new().with_valuer(ValuerKind::Unsafe),
    )
    .unwrap();
    tom_row(&mock);
    let got = db.select::<TestModel>().get().await.unwrap();
    assert_eq!(got, tom());
}

#[tokio::test]
async fn test_get_not_found() {
    let (db, _mock) = db_with(&MYSQL);
    let err = db.select::<TestModel>().get().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_get_multi() {
    let (db, mock) = db_with(&MYSQL);
    mock.push_rows(
        &["id", "first_name"],
        vec![
            vec![Value::I64(1), Value::Text("Tom".to_string())],
            vec![Value::I64(2), Value::Text("Jerry".to_string())],
        ],
    );
    let got = db.select::<TestModel>().get_multi().await.unwrap();
    assert_eq!(got.len(), 2);
    assert_eq!(got[1].first_name, "Jerry");
    assert_eq!(got[1].last_name, None);

    let got = db.select::<TestModel>().get_multi().await.unwrap();
    assert!(got.is_empty());
}

#[tokio::test]
async fn test_get_bad_columns() {
    let (db, mock) = db_with(&MYSQL);
    mock.push_rows(&["nope"], vec![vec![Value::I64(1)]]);
    let err = db.select::<TestModel>().get().await.unwrap_err();
    assert!(matches!(err, OrmError::UnknownColumn(ref c) if c == "nope"));

    mock.push_rows(
        &["id", "first_name", "age", "last_name", "extra"],
        vec![vec![Value::Null; 5]],
    );
    let err = db.select::<TestModel>().get().await.unwrap_err();
    assert!(matches!(err, OrmError::TooManyReturnedColumns));
}

#[tokio::test]
async fn test_exec_statements() {
    let (db, mock) = db_with(&MYSQL);
    let res = db.insert::<TestModel>().values([tom()]).exec().await.unwrap();
    assert_eq!(res.rows_affected, 1);
    db.update::<TestModel>()
        .set([assign("age", 19)])
        .where_([c("id").eq(1)])
        .exec()
        .await
        .unwrap();
    db.delete::<TestModel>()
        .where_([c("id").eq(1)])
        .exec()
        .await
        .unwrap();

    let sqls: Vec<String> = mock.log().into_iter().map(|(sql, _)| sql).collect();
    assert_eq!(
        sqls,
        vec![
            "INSERT INTO `test_model`(`id`,`first_name`,`age`,`last_name`) VALUES(?,?,?,?);",
            "UPDATE `test_model` SET `age` = ? WHERE `id` = ?;",
            "DELETE FROM `test_model` WHERE `id` = ?;",
        ]
    );
}

#[tokio::test]
async fn test_exec_build_error_skips_driver() {
    let (db, mock) = db_with(&MYSQL);
    let err = db.insert::<TestModel>().exec().await.unwrap_err();
    assert!(matches!(err, OrmError::InsertZeroRow));
    assert!(mock.log().is_empty());
}

#[tokio::test]
async fn test_raw_query_scalar() {
    let (db, mock) = db_with(&MYSQL);
    mock.push_rows(&["COUNT(*)"], vec![vec![Value::I64(3)]]);
    let n: i64 = db
        .raw_query::<i64>("SELECT COUNT(*) FROM `test_model`;", vec![])
        .get()
        .await
        .unwrap();
    assert_eq!(n, 3);

    mock.push_rows(&["a", "b"], vec![vec![Value::I64(1), Value::I64(2)]]);
    let err = db
        .raw_query::<i64>("SELECT 1, 2;", vec![])
        .get()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::TooManyReturnedColumns));
}

#[tokio::test]
async fn test_driver_error_passes_through() {
    let (db, mock) = db_with(&MYSQL);
    mock.push_error(OrmError::driver("connection reset"));
    let err = db.select::<TestModel>().get_multi().await.unwrap_err();
    assert!(matches!(err, OrmError::Driver(ref m) if m == "connection reset"));
}
