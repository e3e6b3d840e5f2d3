use civic_core::oracle::{Check, Expectations, load_and_validate, validate};
use civic_core::output::{load_output, read_fragments, write_output};
use civic_core::pipeline::{self, ErrorPolicy};
use civic_core::{Assembler, AssemblyError, RawFragment, SpiderConfig, Status};
use serde_json::{Value, json};
use std::fs;
use tempfile::tempdir;
use time::macros::datetime;

fn fragment(value: Value) -> RawFragment {
    serde_json::from_value(value).expect("fragment")
}

fn board_meeting() -> Value {
    json!({
        "meeting_id": "1234",
        "title": "Regular Board Meeting",
        "start": "2025-12-08T17:30:00",
        "location": {
            "name": "Education Service Center",
            "address": "3027 S New Haven Ave, Tulsa, OK 74114"
        },
        "links": [
            { "href": "/document/2f1c", "title": "Agenda" },
            { "href": "/document/9ab0", "title": "" }
        ],
        "source": "/Portal/MeetingInformation.aspx?Org=Cal&Id=1234"
    })
}

#[test]
fn future_meeting_is_confirmed_with_canonical_start() {
    let config = SpiderConfig::tulok_boed().expect("config");
    let meeting = Assembler::new(&config, datetime!(2025-01-01 00:00:00))
        .assemble(&fragment(board_meeting()))
        .expect("assembled");
    assert_eq!(meeting.status, Status::Confirmed);
    assert_eq!(meeting.start.to_string(), "2025-12-08 17:30:00");
}

#[test]
fn same_meeting_after_now_is_passed() {
    let config = SpiderConfig::tulok_boed().expect("config");
    let meeting = Assembler::new(&config, datetime!(2026-01-01 00:00:00))
        .assemble(&fragment(board_meeting()))
        .expect("assembled");
    assert_eq!(meeting.status, Status::Passed);
}

#[test]
fn empty_address_emits_nothing() {
    let config = SpiderConfig::tulok_boed().expect("config");
    let mut raw = board_meeting();
    raw["location"]["address"] = json!("");
    let assembler = Assembler::new(&config, datetime!(2025-01-01 00:00:00));

    let err = assembler.assemble(&fragment(raw.clone())).expect_err("must fail");
    assert!(matches!(err, AssemblyError::InvalidLocation { .. }));

    let outcome = pipeline::run(&assembler, &[raw], ErrorPolicy::Skip).expect("skip policy");
    assert!(outcome.meetings.is_empty());
    assert_eq!(outcome.skipped.len(), 1);
}

#[test]
fn link_without_href_is_rejected() {
    let config = SpiderConfig::tulok_boed().expect("config");
    let mut raw = board_meeting();
    raw["links"] = json!([{ "title": "Minutes" }]);
    let err = Assembler::new(&config, datetime!(2025-01-01 00:00:00))
        .assemble(&fragment(raw))
        .expect_err("must fail");
    assert!(matches!(err, AssemblyError::InvalidLink { index: 0, .. }));
}

#[test]
fn shared_local_key_shares_id() {
    let config = SpiderConfig::tulok_boed().expect("config");
    let assembler = Assembler::new(&config, datetime!(2025-01-01 00:00:00));
    let first = assembler.assemble(&fragment(board_meeting())).expect("first");
    let mut second_raw = board_meeting();
    second_raw["meeting_id"] = json!(1234);
    second_raw["title"] = json!("Regular Board Meeting (Amended)");
    let second = assembler.assemble(&fragment(second_raw)).expect("second");
    assert_eq!(first.id, "tulok_boed/1234");
    assert_eq!(second.id, "tulok_boed/1234");
}

#[test]
fn empty_collection_fails_oracle() {
    let config = SpiderConfig::tulok_boed().expect("config");
    let report = validate(&[], &Expectations::from(&config));
    assert!(!report.passed());
    assert_eq!(
        report.first(Check::ItemsScraped).map(|v| v.message.as_str()),
        Some("No items scraped")
    );
}

#[test]
fn end_to_end_output_passes_oracle_and_is_reproducible() {
    let dir = tempdir().expect("tmp");
    let input = dir.path().join("fragments.json");
    fs::write(
        &input,
        serde_json::to_string_pretty(&json!([
            board_meeting(),
            {
                "id": 1301,
                "title": "Special Meeting - CANCELLED",
                "date": "Monday, January 12, 2026",
                "time": "5:30 p.m.",
                "end_time": "7:00 PM",
                "location": "3027 S New Haven Ave, Tulsa, OK 74114",
                "source": "https://tulsaschools.diligent.community/Portal/MeetingInformation.aspx?Org=Cal&Id=1301"
            },
            {
                "title": "Budget Workshop",
                "description": "Proposed FY27 budget.\n\nAgenda may change.",
                "start": "2/9/2026 4 PM",
                "all_day": false,
                "source": "/Portal/MeetingInformation.aspx?Org=Cal&Id=1322"
            },
            {
                "meeting_id": "1400",
                "title": "Board Retreat",
                "start": "March 3, 2026",
                "all_day": "true"
            }
        ]))
        .expect("json"),
    )
    .expect("write input");

    let config = SpiderConfig::tulok_boed().expect("config");
    let assembler = Assembler::new(&config, datetime!(2025-12-20 12:00:00));
    let fragments = read_fragments(&input).expect("read fragments");

    let first_path = dir.path().join("run1").join("output.json");
    let second_path = dir.path().join("run2").join("output.json");
    for path in [&first_path, &second_path] {
        let outcome = pipeline::run(&assembler, &fragments, ErrorPolicy::Abort).expect("run");
        assert_eq!(outcome.meetings.len(), 4);
        write_output(path, &outcome.meetings).expect("write output");
    }
    assert_eq!(
        fs::read(&first_path).expect("run1"),
        fs::read(&second_path).expect("run2")
    );

    let report = load_and_validate(&first_path, &Expectations::from(&config)).expect("report");
    assert!(report.passed(), "{}", report.summary());

    let records = load_output(&first_path).expect("load");
    let keys: Vec<&str> = records[0]
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    let mut expected = civic_core::oracle::REQUIRED_FIELDS.to_vec();
    expected.sort_unstable();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, expected);

    let statuses: Vec<&str> = records
        .iter()
        .map(|r| r["status"].as_str().expect("status"))
        .collect();
    assert_eq!(statuses, vec!["passed", "cancelled", "tentative", "confirmed"]);
    assert_eq!(records[1]["start"], json!("2026-01-12 17:30:00"));
    assert_eq!(records[1]["end"], json!("2026-01-12 19:00:00"));
    assert_eq!(records[2]["id"], json!("tulok_boed/1322"));
    assert_eq!(records[2]["start"], json!("2026-02-09 16:00:00"));
    assert_eq!(records[3]["start"], json!("2026-03-03 00:00:00"));
    assert_eq!(records[3]["all_day"], json!(true));
    assert_eq!(records[3]["location"]["name"], json!("Education Service Center"));
    assert_eq!(records[0]["end"], Value::Null);
}

#[test]
fn abort_policy_stops_on_bad_fragment() {
    let config = SpiderConfig::tulok_boed().expect("config");
    let assembler = Assembler::new(&config, datetime!(2025-01-01 00:00:00));
    let mut bad = board_meeting();
    bad["meeting_id"] = json!("77");
    bad["source"] = json!("https://example.com/Portal/MeetingInformation.aspx?Id=77");
    let err = pipeline::run(
        &assembler,
        &[board_meeting(), bad],
        ErrorPolicy::Abort,
    )
    .expect_err("abort");
    assert_eq!(err.position, 1);
    assert_eq!(
        err.to_string(),
        "source [id tulok_boed/77]: invalid source \"https://example.com/Portal/MeetingInformation.aspx?Id=77\": must start with \"https://tulsaschools.diligent.community/\""
    );
}

#[test]
fn badly_shaped_fragment_in_file_is_skipped_by_position() {
    let dir = tempdir().expect("tmp");
    let input = dir.path().join("fragments.json");
    let mut bad_links = board_meeting();
    bad_links["meeting_id"] = json!("2001");
    bad_links["links"] = json!("x");
    let mut both_ids = board_meeting();
    both_ids["meeting_id"] = json!("2002");
    both_ids["id"] = json!(999);
    let mut object_title = board_meeting();
    object_title["title"] = json!({ "text": "Regular Board Meeting" });
    fs::write(
        &input,
        serde_json::to_string(&json!([board_meeting(), bad_links, both_ids, object_title])).expect("json"),
    )
    .expect("write input");

    let config = SpiderConfig::tulok_boed().expect("config");
    let assembler = Assembler::new(&config, datetime!(2025-01-01 00:00:00));
    let fragments = read_fragments(&input).expect("read fragments");
    assert_eq!(fragments.len(), 4);

    let outcome = pipeline::run(&assembler, &fragments, ErrorPolicy::Skip).expect("skip policy");
    let ids: Vec<&str> = outcome.meetings.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["tulok_boed/1234", "tulok_boed/2002"]);
    assert_eq!(outcome.skipped.len(), 2);
    assert_eq!(outcome.skipped[0].position, 1);
    assert!(matches!(outcome.skipped[0].kind, AssemblyError::InvalidLink { index: 0, .. }));
    assert_eq!(outcome.skipped[1].position, 3);
    assert_eq!(outcome.skipped[1].kind.field(), "title");
    assert_eq!(
        outcome.skipped[0].to_string(),
        "links [fragment #1]: invalid link at links[0]: links must be an array of objects, found a string"
    );

    let err = pipeline::run(&assembler, &fragments, ErrorPolicy::Abort).expect_err("abort");
    assert_eq!(err.position, 1);
}
