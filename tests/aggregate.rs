use indoc::indoc;
use keg::{Aggregate, Db, Reply, Value, record};
use support::{MockTransport, init_logs, rows};
use time::macros::date;

mod support;

#[tokio::test]
async fn count_defaults_to_star() {
    init_logs();
    let transport = MockTransport::new();
    transport.reply(Reply::rows(rows(&["count"], [vec![Value::from(6i64)]])));
    let db = Db::new(transport);
    let count = db.count("person", None, &[]).await.unwrap();
    assert_eq!(count, Aggregate::Scalar(Value::from(6i64)));
    assert_eq!(
        db.transport().executed()[0],
        indoc! {"
            SELECT COUNT(*) AS `count`
            FROM `person`;"}
    );
}

#[tokio::test]
async fn other_functions_default_to_the_key_field() {
    init_logs();
    let db = Db::new(MockTransport::new());
    db.sum("person", None, &[]).await.unwrap();
    assert_eq!(
        db.transport().executed()[0],
        indoc! {"
            SELECT SUM(`id`) AS `sum`
            FROM `person`;"}
    );
}

#[tokio::test]
async fn scalar_results_coerce_to_numbers() {
    // MySQL reports SUM over an integer column as DECIMAL and many
    // transports hand it back as text.
    init_logs();
    let transport = MockTransport::new();
    transport
        .reply(Reply::rows(rows(&["sum"], [vec![Value::from("17")]])))
        .reply(Reply::rows(rows(&["avg"], [vec![Value::from("3.5")]])));
    let db = Db::new(transport);
    let sum = db
        .sum("person", Some(record!["gender" => "male"].into()), &["id"])
        .await
        .unwrap();
    assert_eq!(sum.scalar().unwrap(), Value::Int64(Some(17)));
    let avg = db.avg("person", None, &["id"]).await.unwrap();
    assert_eq!(avg.scalar().unwrap(), Value::Float64(Some(3.5)));
    assert_eq!(
        db.transport().executed()[0],
        indoc! {"
            SELECT SUM(`id`) AS `sum`
            FROM `person`
            WHERE `gender` = 'male';"}
    );
}

#[tokio::test]
async fn min_and_max_keep_the_native_type() {
    init_logs();
    let transport = MockTransport::new();
    transport
        .reply(Reply::rows(rows(&["min"], [vec![Value::from("Abel")]])))
        .reply(Reply::rows(rows(
            &["max"],
            [vec![Value::from(date!(1970 - 01 - 01))]],
        )));
    let db = Db::new(transport);
    let min = db.min("person", None, &["name"]).await.unwrap();
    assert_eq!(min.scalar().unwrap(), Value::from("Abel"));
    let max = db.max("person", None, &["born"]).await.unwrap();
    assert_eq!(max.scalar().unwrap(), Value::from(date!(1970 - 01 - 01)));
}

#[tokio::test]
async fn grouping_fields_switch_to_row_results() {
    init_logs();
    let transport = MockTransport::new();
    transport.reply(Reply::rows(rows(
        &["gender", "count"],
        [
            vec![Value::from("god"), Value::from(1i64)],
            vec![Value::from("male"), Value::from(4i64)],
            vec![Value::from("female"), Value::from(1i64)],
        ],
    )));
    let db = Db::new(transport);
    let groups = db
        .count("person", None, &["gender", "id"])
        .await
        .unwrap()
        .groups()
        .unwrap();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[1].get_column("count"), Some(&Value::from(4i64)));
    assert_eq!(
        db.transport().executed()[0],
        indoc! {"
            SELECT `gender`, COUNT(`id`) AS `count`
            FROM `person`
            GROUP BY `gender`;"}
    );
}

#[tokio::test]
async fn summing_the_key_per_gender() {
    init_logs();
    let transport = MockTransport::new();
    transport.reply(Reply::rows(rows(
        &["gender", "sum"],
        [
            vec![Value::from("god"), Value::from("1")],
            vec![Value::from("male"), Value::from("17")],
            vec![Value::from("female"), Value::from("3")],
        ],
    )));
    let db = Db::new(transport);
    let groups = db
        .sum("person", None, &["gender", "id"])
        .await
        .unwrap()
        .groups()
        .unwrap();
    assert_eq!(groups.len(), 3);
    // Grouped rows travel untouched, no scalar coercion.
    assert_eq!(groups[1].get_column("gender"), Some(&Value::from("male")));
    assert_eq!(groups[1].get_column("sum"), Some(&Value::from("17")));
    assert_eq!(
        db.transport().executed()[0],
        indoc! {"
            SELECT `gender`, SUM(`id`) AS `sum`
            FROM `person`
            GROUP BY `gender`;"}
    );
}

#[tokio::test]
async fn empty_result_reads_as_null_scalar() {
    init_logs();
    let db = Db::new(MockTransport::new());
    let sum = db.sum("person", None, &["id"]).await.unwrap();
    assert_eq!(sum.scalar().unwrap(), Value::Null);
}

#[tokio::test]
async fn shape_accessors_reject_the_other_shape() {
    init_logs();
    let db = Db::new(MockTransport::new());
    let scalar = db.count("person", None, &[]).await.unwrap();
    assert!(scalar.groups().is_err());
}
