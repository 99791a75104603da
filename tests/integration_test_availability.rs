mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use common::{next_monday, parse_body, slot_times, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_default_rules_yield_sixteen_monday_slots() {
    let app = TestApp::new().await;
    let token = app.signup("slots@example.com").await;
    app.create_event_type(&token, "30min", 30).await;

    let slots = app.slots("30min", next_monday()).await;
    let times = slot_times(&slots);

    assert_eq!(times.len(), 16);
    assert_eq!(times.first().unwrap(), "09:00");
    assert_eq!(times.last().unwrap(), "16:30");
    assert!(slots.iter().all(|s| s["available"] == true));
    assert_eq!(slots[0]["startTime"], format!("{}T09:00:00Z", next_monday()));
    assert_eq!(slots[0]["endTime"], format!("{}T09:30:00Z", next_monday()));
}

#[tokio::test]
async fn test_weekend_has_no_slots() {
    let app = TestApp::new().await;
    let token = app.signup("weekend@example.com").await;
    app.create_event_type(&token, "weekday-only", 30).await;

    let saturday = next_monday() + Duration::days(5);
    let sunday = next_monday() + Duration::days(6);
    assert!(app.slots("weekday-only", saturday).await.is_empty());
    assert!(app.slots("weekday-only", sunday).await.is_empty());
}

#[tokio::test]
async fn test_long_duration_never_overruns_window() {
    let app = TestApp::new().await;
    let token = app.signup("long@example.com").await;
    app.create_event_type(&token, "three-quarters", 45).await;

    let times = slot_times(&app.slots("three-quarters", next_monday()).await);
    assert_eq!(times.len(), 10);
    assert_eq!(times.last().unwrap(), "15:45");
}

#[tokio::test]
async fn test_slot_query_validation() {
    let app = TestApp::new().await;
    let token = app.signup("query@example.com").await;
    app.create_event_type(&token, "validated", 30).await;

    let no_date = app.request(Method::GET, "/api/public/validated/availability", None, None).await;
    assert_eq!(no_date.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(no_date).await["error"], "Date required");

    let bad_date = app.request(Method::GET, "/api/public/validated/availability?date=07-01-2030", None, None).await;
    assert_eq!(bad_date.status(), StatusCode::BAD_REQUEST);

    let bad_tz = app.request(
        Method::GET,
        &format!("/api/public/validated/availability?date={}&timezone=Mars/Base", next_monday()),
        None,
        None,
    ).await;
    assert_eq!(bad_tz.status(), StatusCode::BAD_REQUEST);

    let unknown = app.request(
        Method::GET,
        &format!("/api/public/nope/availability?date={}", next_monday()),
        None,
        None,
    ).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_requester_timezone_relabels_slots() {
    let app = TestApp::new().await;
    let token = app.signup("tz@example.com").await;
    app.create_event_type(&token, "tz-call", 60).await;

    // Asia/Kolkata has no DST: UTC+05:30 all year.
    let response = app.request(
        Method::GET,
        &format!("/api/public/tz-call/availability?date={}&timezone=Asia/Kolkata", next_monday()),
        None,
        None,
    ).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_body(response).await;
    let slots = body["slots"].as_array().unwrap();

    assert_eq!(slots.len(), 8);
    assert_eq!(slots[0]["time"], "14:30");
    assert_eq!(slots[0]["startTime"], format!("{}T09:00:00Z", next_monday()));
}

#[tokio::test]
async fn test_rule_timezone_shifts_window() {
    let app = TestApp::new().await;
    let token = app.signup("tokyo@example.com").await;
    let event_type = app.create_event_type(&token, "tokyo", 60).await;

    // Tokyo is UTC+9 without DST.
    let response = app.request(Method::POST, "/api/availability/slots", Some(&token), Some(json!({
        "eventTypeId": event_type["id"],
        "slots": [{ "dayOfWeek": 1, "startTime": "10:00", "endTime": "12:00", "timezone": "Asia/Tokyo" }]
    }))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let slots = app.slots("tokyo", next_monday()).await;
    assert_eq!(slot_times(&slots), vec!["10:00", "11:00"]);
    assert_eq!(slots[0]["startTime"], format!("{}T01:00:00Z", next_monday()));
}

#[tokio::test]
async fn test_create_rule_upserts_by_day() {
    let app = TestApp::new().await;
    let token = app.signup("upsert@example.com").await;
    let event_type = app.create_event_type(&token, "upsert", 30).await;
    let event_type_id = event_type["id"].as_str().unwrap();

    let response = app.request(Method::POST, "/api/availability", Some(&token), Some(json!({
        "eventTypeId": event_type_id, "dayOfWeek": 1, "startTime": "10:00", "endTime": "12:00"
    }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let listed = app.request(
        Method::GET,
        &format!("/api/availability?eventTypeId={}", event_type_id),
        Some(&token),
        None,
    ).await;
    let rules = parse_body(listed).await["data"].as_array().cloned().unwrap();
    assert_eq!(rules.len(), 5, "monday rule replaced, not duplicated");
    let monday = rules.iter().find(|r| r["dayOfWeek"] == 1).unwrap();
    assert_eq!(monday["startTime"], "10:00");

    assert_eq!(slot_times(&app.slots("upsert", next_monday()).await), vec!["10:00", "10:30", "11:00", "11:30"]);

    // Saturday is new.
    let saturday = app.request(Method::POST, "/api/availability", Some(&token), Some(json!({
        "eventTypeId": event_type_id, "dayOfWeek": 6, "startTime": "10:00", "endTime": "11:00"
    }))).await;
    assert_eq!(saturday.status(), StatusCode::CREATED);
    assert_eq!(app.slots("upsert", next_monday() + Duration::days(5)).await.len(), 2);
}

#[tokio::test]
async fn test_update_and_delete_rule() {
    let app = TestApp::new().await;
    let token = app.signup("edit-rule@example.com").await;
    let event_type = app.create_event_type(&token, "edit-rule", 30).await;
    let monday = event_type["availability"].as_array().unwrap()
        .iter()
        .find(|r| r["dayOfWeek"] == 1)
        .cloned()
        .unwrap();
    let uri = format!("/api/availability/{}", monday["id"].as_str().unwrap());

    let updated = app.request(Method::PUT, &uri, Some(&token), Some(json!({ "endTime": "10:00" }))).await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(slot_times(&app.slots("edit-rule", next_monday()).await), vec!["09:00", "09:30"]);

    let inverted = app.request(Method::PUT, &uri, Some(&token), Some(json!({ "startTime": "11:00" }))).await;
    assert_eq!(inverted.status(), StatusCode::BAD_REQUEST);

    let deleted = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert!(app.slots("edit-rule", next_monday()).await.is_empty());

    let again = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rule_validation_errors() {
    let app = TestApp::new().await;
    let token = app.signup("rules@example.com").await;
    let event_type = app.create_event_type(&token, "rules", 30).await;
    let id = event_type["id"].as_str().unwrap();

    for bad in [
        json!({ "eventTypeId": id, "dayOfWeek": 7, "startTime": "09:00", "endTime": "10:00" }),
        json!({ "eventTypeId": id, "dayOfWeek": 1, "startTime": "9am", "endTime": "10:00" }),
        json!({ "eventTypeId": id, "dayOfWeek": 1, "startTime": "12:00", "endTime": "10:00" }),
        json!({ "eventTypeId": id, "dayOfWeek": 1, "startTime": "09:00", "endTime": "10:00", "timezone": "Nowhere/City" }),
        json!({ "dayOfWeek": 1, "startTime": "09:00", "endTime": "10:00" }),
    ] {
        let response = app.request(Method::POST, "/api/availability", Some(&token), Some(bad.clone())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "payload {} should be rejected", bad);
    }
}

#[tokio::test]
async fn test_replace_swaps_whole_set() {
    let app = TestApp::new().await;
    let token = app.signup("replace@example.com").await;
    let event_type = app.create_event_type(&token, "replace", 30).await;

    let response = app.request(Method::POST, "/api/availability/slots", Some(&token), Some(json!({
        "eventTypeId": event_type["id"],
        "slots": [
            { "dayOfWeek": 2, "startTime": "13:00", "endTime": "14:00" },
            { "dayOfWeek": 4, "startTime": "08:00", "endTime": "09:00" }
        ]
    }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let saved = parse_body(response).await["data"].as_array().cloned().unwrap();
    assert_eq!(saved.len(), 2);

    assert!(app.slots("replace", next_monday()).await.is_empty(), "monday rule removed");
    assert_eq!(slot_times(&app.slots("replace", next_monday() + Duration::days(1)).await), vec!["13:00", "13:30"]);

    let duplicate_day = app.request(Method::POST, "/api/availability/slots", Some(&token), Some(json!({
        "eventTypeId": event_type["id"],
        "slots": [
            { "dayOfWeek": 2, "startTime": "09:00", "endTime": "10:00" },
            { "dayOfWeek": 2, "startTime": "11:00", "endTime": "12:00" }
        ]
    }))).await;
    assert_eq!(duplicate_day.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.slots("replace", next_monday() + Duration::days(1)).await.len(), 2, "failed replace leaves set intact");
}

#[tokio::test]
async fn test_foreign_rules_are_hidden() {
    let app = TestApp::new().await;
    let owner = app.signup("rule-owner@example.com").await;
    let other = app.signup("rule-other@example.com").await;
    let event_type = app.create_event_type(&owner, "guarded", 30).await;
    let id = event_type["id"].as_str().unwrap();

    let listed = app.request(Method::GET, &format!("/api/availability?eventTypeId={}", id), Some(&other), None).await;
    assert_eq!(listed.status(), StatusCode::NOT_FOUND);

    let replaced = app.request(Method::POST, "/api/availability/slots", Some(&other), Some(json!({
        "eventTypeId": id, "slots": []
    }))).await;
    assert_eq!(replaced.status(), StatusCode::NOT_FOUND);

    let rule_id = event_type["availability"][0]["id"].as_str().unwrap();
    let deleted = app.request(Method::DELETE, &format!("/api/availability/{}", rule_id), Some(&other), None).await;
    assert_eq!(deleted.status(), StatusCode::NOT_FOUND);

    let mine = app.request(Method::GET, "/api/availability", Some(&other), None).await;
    assert_eq!(parse_body(mine).await["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_schedule_drives_attached_event_type() {
    let app = TestApp::new().await;
    let token = app.signup("schedules@example.com").await;

    let created = app.request(Method::POST, "/api/schedules", Some(&token), Some(json!({ "name": "Mornings" }))).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let schedule = parse_body(created).await["data"].clone();
    assert_eq!(schedule["isDefault"], true, "first schedule is the default");
    assert_eq!(schedule["availability"].as_array().unwrap().len(), 5);
    let schedule_id = schedule["id"].as_str().unwrap();

    let replaced = app.request(Method::POST, "/api/availability/slots", Some(&token), Some(json!({
        "scheduleId": schedule_id,
        "slots": [
            { "dayOfWeek": 1, "startTime": "08:00", "endTime": "09:00" },
            { "dayOfWeek": 1, "startTime": "12:00", "endTime": "13:00" }
        ]
    }))).await;
    assert_eq!(replaced.status(), StatusCode::OK);

    let event_type = app.create_event_type(&token, "scheduled", 30).await;
    let uri = format!("/api/event-types/{}", event_type["id"].as_str().unwrap());
    let attached = app.request(Method::PUT, &uri, Some(&token), Some(json!({ "scheduleId": schedule_id }))).await;
    assert_eq!(attached.status(), StatusCode::OK);

    assert_eq!(
        slot_times(&app.slots("scheduled", next_monday()).await),
        vec!["08:00", "08:30", "12:00", "12:30"]
    );

    let deleted = app.request(Method::DELETE, &format!("/api/schedules/{}", schedule_id), Some(&token), None).await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let detail = parse_body(app.request(Method::GET, &uri, Some(&token), None).await).await;
    assert!(detail["data"]["scheduleId"].is_null(), "event type detached from deleted schedule");
    assert_eq!(app.slots("scheduled", next_monday()).await.len(), 16, "own rules apply again");
}

#[tokio::test]
async fn test_schedule_default_flag_moves() {
    let app = TestApp::new().await;
    let token = app.signup("defaults@example.com").await;

    let first = parse_body(app.request(Method::POST, "/api/schedules", Some(&token), Some(json!({ "name": "A" }))).await).await;
    let second = parse_body(app.request(Method::POST, "/api/schedules", Some(&token), Some(json!({ "name": "B" }))).await).await;
    assert_eq!(first["data"]["isDefault"], true);
    assert_eq!(second["data"]["isDefault"], false);

    let second_id = second["data"]["id"].as_str().unwrap();
    let promoted = app.request(
        Method::PUT,
        &format!("/api/schedules/{}", second_id),
        Some(&token),
        Some(json!({ "isDefault": true })),
    ).await;
    assert_eq!(promoted.status(), StatusCode::OK);

    let listed = parse_body(app.request(Method::GET, "/api/schedules", Some(&token), None).await).await;
    let schedules = listed["data"].as_array().unwrap();
    assert_eq!(schedules.len(), 2);
    assert_eq!(schedules[0]["id"], second_id, "default listed first");
    assert_eq!(schedules[0]["isDefault"], true);
    assert_eq!(schedules[1]["isDefault"], false);

    let other = app.signup("stranger@example.com").await;
    let hidden = app.request(Method::GET, &format!("/api/schedules/{}", second_id), Some(&other), None).await;
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_default_schedule_always_exists() {
    let app = TestApp::new().await;
    let token = app.signup("keep-default@example.com").await;

    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        let created = parse_body(app.request(Method::POST, "/api/schedules", Some(&token), Some(json!({ "name": name }))).await).await;
        ids.push(created["data"]["id"].as_str().unwrap().to_string());
    }

    let unset = app.request(
        Method::PUT,
        &format!("/api/schedules/{}", ids[0]),
        Some(&token),
        Some(json!({ "isDefault": false })),
    ).await;
    assert_eq!(unset.status(), StatusCode::BAD_REQUEST);

    let kept = parse_body(app.request(Method::GET, &format!("/api/schedules/{}", ids[0]), Some(&token), None).await).await;
    assert_eq!(kept["data"]["isDefault"], true);

    let deleted = app.request(Method::DELETE, &format!("/api/schedules/{}", ids[0]), Some(&token), None).await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let listed = parse_body(app.request(Method::GET, "/api/schedules", Some(&token), None).await).await;
    let schedules = listed["data"].as_array().unwrap();
    assert_eq!(schedules.len(), 2);
    assert_eq!(schedules[0]["id"], ids[1].as_str(), "oldest remaining schedule is promoted");
    assert_eq!(schedules[0]["isDefault"], true);
    assert_eq!(schedules[1]["isDefault"], false);

    // Deleting a non-default schedule leaves the default alone.
    app.request(Method::DELETE, &format!("/api/schedules/{}", ids[2]), Some(&token), None).await;
    let remaining = parse_body(app.request(Method::GET, "/api/schedules", Some(&token), None).await).await;
    assert_eq!(remaining["data"][0]["id"], ids[1].as_str());
    assert_eq!(remaining["data"][0]["isDefault"], true);
}
