mod support;

use predicates::str::contains;
use serde_json::{json, Value};

use support::TestData;

const DAILY_KEY: &str = "life_ops_v02_daily_instances";
const LEGACY_KEY: &str = "life_ops_v01_daily_tasks";
const TEMPLATES_KEY: &str = "life_ops_v01_templates";

fn data_of(envelope: &Value) -> &Value {
    assert_eq!(envelope["status"], "success", "envelope: {envelope}");
    &envelope["data"]
}

#[test]
fn empty_day_scores_one_and_writes_nothing() {
    let data = TestData::new();

    let envelope = data.json(&["today", "--date", "2024-03-01"]);
    let day = data_of(&envelope);
    assert_eq!(envelope["command"], "today");
    assert_eq!(day["date"], "2024-03-01");
    assert_eq!(day["summary"]["score"], 1.0);
    assert_eq!(day["tasks"], json!([]));
    assert_eq!(day["migration"]["status"], "no_legacy_data");

    assert!(data.read_key(DAILY_KEY).is_none());
}

#[test]
fn templates_derive_once_per_day() {
    let data = TestData::new();

    data.cmd()
        .args(["template", "add", "number", "--title", "Read", "--target", "4", "--unit", "pages"])
        .assert()
        .success();
    data.cmd()
        .args(["template", "add", "check", "--title", "Paused", "--inactive"])
        .assert()
        .success();

    let first = data.json(&["today", "--date", "2024-03-01"]);
    let day = data_of(&first);
    assert_eq!(day["derived"], 1);
    let tasks = day["tasks"].as_array().expect("tasks");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Read");
    assert_eq!(tasks[0]["type"], "number");
    assert_eq!(tasks[0]["target"], 4.0);
    assert_eq!(tasks[0]["date"], "2024-03-01");
    assert_eq!(day["summary"]["score"], 0.0);

    let second = data.json(&["today", "--date", "2024-03-01"]);
    assert_eq!(data_of(&second)["derived"], 0);
    assert_eq!(data_of(&second)["tasks"].as_array().map(Vec::len), Some(1));

    let other_day = data.json(&["today", "--date", "2024-03-02"]);
    assert_eq!(data_of(&other_day)["derived"], 1);

    let stored = data.read_json(DAILY_KEY);
    assert_eq!(stored.as_array().map(Vec::len), Some(2));
    // Newest date first.
    assert_eq!(stored[0]["date"], "2024-03-02");
}

#[test]
fn removed_derived_task_is_not_recreated() {
    let data = TestData::new();
    data.cmd()
        .args(["template", "add", "check", "--title", "Stretch"])
        .assert()
        .success();

    let day = data.json(&["today", "--date", "2024-03-01"]);
    let id = data_of(&day)["tasks"][0]["id"]
        .as_str()
        .expect("id")
        .to_string();

    data.cmd().args(["task", "rm", &id]).assert().success();

    let again = data.json(&["today", "--date", "2024-03-01"]);
    let again = data_of(&again);
    assert_eq!(again["derived"], 0);
    assert_eq!(again["tasks"], json!([]));
    assert_eq!(again["summary"]["score"], 1.0);

    let stored = data.read_json(DAILY_KEY);
    assert_eq!(stored[0]["is_deleted"], true);
}

#[test]
fn task_updates_drive_the_score() {
    let data = TestData::new();

    let added = data.json(&[
        "task", "add", "number", "--title", "Pushups", "--target", "4", "--date", "2024-03-01",
    ]);
    let number_id = data_of(&added)["id"].as_str().expect("id").to_string();
    assert!(number_id.starts_with("day_"));

    let added = data.json(&["task", "add", "check", "--date", "2024-03-01"]);
    let check = data_of(&added);
    assert_eq!(check["title"], "New check task");
    let check_id = check["id"].as_str().expect("id").to_string();

    data.cmd()
        .args(["task", "set", &number_id, "--actual", "2"])
        .assert()
        .success();
    data.cmd()
        .args(["task", "set", &check_id, "--done"])
        .assert()
        .success();

    let day = data.json(&["today", "--date", "2024-03-01"]);
    let day = data_of(&day);
    assert_eq!(day["summary"]["counted"], 2);
    assert_eq!(day["summary"]["completed"], 1);
    assert_eq!(day["summary"]["score"], 0.75);

    data.cmd()
        .args(["today", "--date", "2024-03-01"])
        .assert()
        .success()
        .stdout(contains("score: 0.750"))
        .stdout(contains("Pushups: 2/4"));
}

#[test]
fn task_set_requires_a_change_and_a_known_id() {
    let data = TestData::new();

    data.cmd()
        .args(["task", "set", "day_missing", "--done"])
        .assert()
        .code(2)
        .stderr(contains("task not found"));

    data.cmd()
        .args(["task", "set", "day_missing"])
        .assert()
        .code(2)
        .stderr(contains("nothing to change"));
}

#[test]
fn legacy_tasks_migrate_once() {
    let data = TestData::new();
    data.write_key(
        LEGACY_KEY,
        r#"[{"id":"old1","title":"Water","type":"number","target":"3","actual":2,"completed":false},
            {"id":"old2","type":"check","completed":1}]"#,
    );

    let envelope = data.json(&["today"]);
    let day = data_of(&envelope);
    assert_eq!(day["migration"]["status"], "migrated");
    assert_eq!(day["migration"]["count"], 2);

    let tasks = day["tasks"].as_array().expect("tasks");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["id"], "old1");
    assert_eq!(tasks[0]["target"], 3.0);
    assert_eq!(tasks[1]["title"], "Task");
    assert_eq!(tasks[1]["completed"], true);

    assert_eq!(data.read_key(LEGACY_KEY).as_deref(), Some("[]"));

    let again = data.json(&["today"]);
    assert_eq!(data_of(&again)["migration"]["status"], "no_legacy_data");
    assert_eq!(data_of(&again)["tasks"].as_array().map(Vec::len), Some(2));
}

#[test]
fn corrupt_collections_read_as_empty() {
    let data = TestData::new();
    data.write_key(TEMPLATES_KEY, "{not json");
    data.write_key(DAILY_KEY, r#"{"id":"x"}"#);

    let envelope = data.json(&["today", "--date", "2024-03-01"]);
    let day = data_of(&envelope);
    assert_eq!(day["tasks"], json!([]));
    assert_eq!(day["summary"]["score"], 1.0);
}

#[test]
fn template_set_does_not_touch_derived_tasks() {
    let data = TestData::new();
    let added = data.json(&["template", "add", "number", "--title", "Run", "--target", "5"]);
    let tpl_id = data_of(&added)["id"].as_str().expect("id").to_string();
    assert!(tpl_id.starts_with("tpl_"));

    data.json(&["today", "--date", "2024-03-01"]);

    let updated = data.json(&["template", "set", &tpl_id, "--target", "10", "--title", "Long run"]);
    assert_eq!(data_of(&updated)["target"], 10.0);
    assert_eq!(data_of(&updated)["title"], "Long run");

    let day = data.json(&["today", "--date", "2024-03-01"]);
    let task = &data_of(&day)["tasks"][0];
    assert_eq!(task["title"], "Run");
    assert_eq!(task["target"], 5.0);
    assert_eq!(task["source_template_id"], tpl_id.as_str());

    let listed = data.json(&["template", "ls"]);
    assert_eq!(data_of(&listed).as_array().map(Vec::len), Some(1));
}

#[test]
fn odd_records_are_kept_when_the_list_is_rewritten() {
    let data = TestData::new();
    data.write_key(
        DAILY_KEY,
        r#"[{"id":"good","title":"Walk","type":"check","completed":true,"date":"2024-03-01"},
            {"id":"odd","title":"Weigh in","type":"number","target":null,"actual":null,"date":"2024-03-01"}]"#,
    );

    data.cmd()
        .args(["task", "add", "check", "--date", "2024-03-01"])
        .assert()
        .success();

    let stored = data.read_json(DAILY_KEY);
    let ids: Vec<&str> = stored
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|task| task["id"].as_str())
        .collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[1..].to_vec(), vec!["good", "odd"]);
    assert_eq!(stored[2]["actual"], 0.0);

    let day = data.json(&["today", "--date", "2024-03-01"]);
    let day = data_of(&day);
    assert_eq!(day["summary"]["counted"], 3);
    assert_eq!(day["summary"]["completed"], 1);
}
