#![cfg(test)]

mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{MockGeocode, MockLlm, MockMail, inbox_message, setup_runtime};
use dispatch_desk::{
    pricing::geo::Coordinates,
    prelude::*,
    server,
    service::{db::EmailRecord, geocode::GeocodeHit, mail::MailError},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Send one request through the router and decode the JSON reply.
async fn call(runtime: Runtime, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri).header("content-type", "application/json");

    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = server::router(runtime).oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };

    (status, json)
}

async fn idle_runtime() -> Runtime {
    setup_runtime(MockLlm::new(), MockMail::new(), MockGeocode::new()).await
}

/// Store a record with the given flags directly, bypassing the mailbox.
async fn store(runtime: &Runtime, uid: u32, category: Option<EmailCategory>, read: bool, replied: bool) {
    let mut record = EmailRecord::new(uid);
    record.title = format!("Message {uid}");
    record.sender = format!("customer{uid}@example.com");
    record.body = "Hello".to_string();
    record.read = read;
    record.replied = replied;
    record.categorized = category.is_some();
    record.category = category;

    runtime.db.upsert_email(&record).await.unwrap();
}

fn assert_close(actual: &Value, expected: f64) {
    let actual = actual.as_f64().unwrap();
    assert!((actual - expected).abs() < 1e-3, "expected {expected}, got {actual}");
}

// Health.

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = call(idle_runtime().await, "GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

// Fees.

#[tokio::test]
async fn estimate_for_a_named_destination() {
    let (status, body) = call(idle_runtime().await, "POST", "/api/fees/estimate", Some(json!({ "destination": "Port St. Lucie" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destination"]["name"], "Port St. Lucie");
    assert_close(&body["breakdown"]["round_trip_miles"], 100.0);
    assert_close(&body["breakdown"]["labor_cost"], 45.0);
    assert_close(&body["breakdown"]["gas_cost"], 23.3333);
    assert_close(&body["breakdown"]["suggested_fee"], 78.5833);
}

#[tokio::test]
async fn estimate_for_a_dropped_pin() {
    let request = json!({ "location": { "lat": 26.9342, "lng": -80.0942, "label": "Jupiter Inlet, Jupiter, Florida" }, "tolls": 3.0 });

    let (status, body) = call(idle_runtime().await, "POST", "/api/fees/estimate", Some(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["destination"]["name"].as_str().unwrap().starts_with("Jupiter Inlet (~"));
    assert_close(&body["breakdown"]["tolls_and_extras"], 3.0);
}

#[tokio::test]
async fn unknown_destinations_are_rejected() {
    let (status, body) = call(idle_runtime().await, "POST", "/api/fees/estimate", Some(json!({ "destination": "Atlantis" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid destination selected.");
}

#[tokio::test]
async fn custom_destination_uses_the_entered_miles() {
    let (status, body) = call(idle_runtime().await, "POST", "/api/fees/estimate", Some(json!({ "destination": "Custom", "one_way_miles": 42 }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destination"]["name"], "Custom");
    assert_close(&body["breakdown"]["round_trip_miles"], 84.0);
}

#[tokio::test]
async fn destinations_can_be_searched() {
    let (status, body) = call(idle_runtime().await, "GET", "/api/destinations?q=port", None).await;

    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body.as_array().unwrap().iter().map(|d| d["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"Port St. Lucie"));
    assert!(names.iter().all(|name| name.to_lowercase().contains("port")));
}

#[tokio::test]
async fn custom_locations_out_of_range_are_rejected() {
    let (status, _) = call(idle_runtime().await, "POST", "/api/locations/custom", Some(json!({ "lat": 95.0, "lng": 0.0 }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn location_search_prices_each_hit() {
    let mut geocode = MockGeocode::new();
    geocode.expect_search().withf(|query, limit| query == "jupiter" && *limit == 5).returning(|_, _| {
        Ok(vec![GeocodeHit {
            label: "Jupiter, Palm Beach County, Florida".to_string(),
            coordinates: Coordinates::new(26.9342, -80.0942),
        }])
    });

    let runtime = setup_runtime(MockLlm::new(), MockMail::new(), geocode).await;
    let (status, body) = call(runtime, "GET", "/api/locations/search?q=jupiter", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["label"], "Jupiter, Palm Beach County, Florida");
    assert!(body[0]["destination"]["name"].as_str().unwrap().starts_with("Jupiter (~"));
}

// Inbox.

#[tokio::test]
async fn blank_reply_drafts_are_rejected() {
    let (status, body) = call(idle_runtime().await, "POST", "/api/reply", Some(json!({ "body": "  " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email body content is required");
}

#[tokio::test]
async fn reply_drafts_come_from_the_model() {
    let mut llm = MockLlm::new();
    llm.expect_generate_reply().returning(|_| Ok("Thanks for reaching out!".to_string()));

    let runtime = setup_runtime(llm, MockMail::new(), MockGeocode::new()).await;
    let (status, body) = call(runtime, "POST", "/api/reply", Some(json!({ "body": "Can you deliver Friday?" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Thanks for reaching out!");
}

#[tokio::test]
async fn reply_draft_failures_carry_details() {
    let mut llm = MockLlm::new();
    llm.expect_generate_reply().returning(|_| Err(anyhow!("quota exceeded")));

    let runtime = setup_runtime(llm, MockMail::new(), MockGeocode::new()).await;
    let (status, body) = call(runtime, "POST", "/api/reply", Some(json!({ "body": "Hello" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate reply");
    assert_eq!(body["details"], "quota exceeded");
}

#[tokio::test]
async fn send_reports_sent() {
    let mut mail = MockMail::new();
    mail.expect_send().withf(|mail| mail.subject == "Re: Your email").returning(|_| Ok(()));

    let runtime = setup_runtime(MockLlm::new(), mail, MockGeocode::new()).await;
    let (status, body) = call(runtime, "POST", "/api/send", Some(json!({ "to": "ana@example.com", "reply": "See you soon" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "sent" }));
}

#[tokio::test]
async fn send_without_recipient_is_rejected() {
    let (status, body) = call(idle_runtime().await, "POST", "/api/send", Some(json!({ "reply": "See you soon" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Recipient and reply are required");
}

#[tokio::test]
async fn smtp_auth_failures_are_unauthorized() {
    let mut mail = MockMail::new();
    mail.expect_send().returning(|_| Err(MailError::Authentication));

    let runtime = setup_runtime(MockLlm::new(), mail, MockGeocode::new()).await;
    let (status, body) = call(runtime, "POST", "/api/send", Some(json!({ "to": "ana@example.com", "reply": "Hi" }))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "SMTP authentication failed");
}

#[tokio::test]
async fn summarize_returns_the_summary_as_reply() {
    let mut llm = MockLlm::new();
    llm.expect_summarize_email().returning(|_, _, _| Ok("Asks for a Friday delivery.".to_string()));

    let runtime = setup_runtime(llm, MockMail::new(), MockGeocode::new()).await;
    let request = json!({ "id": 4, "body": "Could you come Friday?", "title": "Friday", "from": "bob@example.com" });
    let (status, body) = call(runtime, "POST", "/api/summarize", Some(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Asks for a Friday delivery.");
}

#[tokio::test]
async fn emails_endpoint_syncs_the_inbox() {
    let mut mail = MockMail::new();
    mail.expect_fetch_recent().returning(|_| Ok(vec![inbox_message(21, "Complaint", "Box was crushed", true)]));

    let mut llm = MockLlm::new();
    llm.expect_classify_email().returning(|_| Ok("complaint".to_string()));

    let runtime = setup_runtime(llm, mail, MockGeocode::new()).await;
    let (status, body) = call(runtime.clone(), "GET", "/api/emails", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], 21);
    assert_eq!(body[0]["classification"], "complaint");
    assert_eq!(body[0]["read"], "read");

    let (status, summary) = call(runtime, "GET", "/api/dashboard/summary", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["awaiting_reply"], 1);
    assert_eq!(summary["by_category"]["complaint"], 1);
}

#[tokio::test]
async fn stored_emails_are_filtered_by_query() {
    let runtime = idle_runtime().await;
    store(&runtime, 1, Some(EmailCategory::Complaint), true, false).await;
    store(&runtime, 2, Some(EmailCategory::Complaint), true, true).await;
    store(&runtime, 3, Some(EmailCategory::Sales), false, false).await;

    let (status, body) = call(runtime.clone(), "GET", "/api/emails/stored?classification=complaint&replied=not%20replied", None).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = body.as_array().unwrap().iter().map(|email| email["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1]);
    assert_eq!(body[0]["replied"], "not replied");

    let (status, body) = call(runtime.clone(), "GET", "/api/emails/stored?read=unread", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], 3);

    let (status, _) = call(runtime, "GET", "/api/emails/stored?classification=spam", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn seen_flags_the_message_and_the_record() {
    let mut mail = MockMail::new();
    mail.expect_mark_seen().withf(|uid| *uid == 9).times(1).returning(|_| Ok(()));

    let runtime = setup_runtime(MockLlm::new(), mail, MockGeocode::new()).await;
    store(&runtime, 9, None, false, false).await;

    let (status, body) = call(runtime.clone(), "POST", "/api/emails/9/seen", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
    assert!(runtime.db.get_email(9).await.unwrap().unwrap().read);
}

#[tokio::test]
async fn seen_failures_are_server_errors() {
    let mut mail = MockMail::new();
    mail.expect_mark_seen().returning(|_| Err(anyhow!("mailbox is read-only")));

    let runtime = setup_runtime(MockLlm::new(), mail, MockGeocode::new()).await;
    let (status, body) = call(runtime, "POST", "/api/emails/9/seen", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to mark email as seen");
}

#[tokio::test]
async fn dashboard_summary_counts_stored_records() {
    let runtime = idle_runtime().await;
    store(&runtime, 1, Some(EmailCategory::Urgent), false, false).await;
    store(&runtime, 2, Some(EmailCategory::Sales), true, true).await;
    store(&runtime, 3, None, true, false).await;

    let (status, summary) = call(runtime, "GET", "/api/dashboard/summary", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total"], 3);
    assert_eq!(summary["unread"], 1);
    assert_eq!(summary["replied"], 1);
    assert_eq!(summary["awaiting_reply"], 2);
    assert_eq!(summary["uncategorized"], 1);
    assert_eq!(summary["by_category"]["urgent"], 1);
    assert_eq!(summary["by_category"]["sales"], 1);
    assert_eq!(summary["by_category"]["newsletter"], 0);
}

#[tokio::test]
async fn email_changes_stream_as_named_events() {
    let runtime = idle_runtime().await;

    let request = Request::builder().uri("/api/emails/events").body(Body::empty()).unwrap();
    let response = server::router(runtime.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    store(&runtime, 77, Some(EmailCategory::Support), false, false).await;

    let mut body = response.into_body();
    let mut text = String::new();

    // Keep-alive comments may arrive first; read until a data line shows up.
    while !text.contains("data:") {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame()).await.unwrap().unwrap().unwrap();

        if let Ok(data) = frame.into_data() {
            text.push_str(&String::from_utf8_lossy(&data));
        }
    }

    assert!(text.contains("event: create"), "unexpected event frame: {text}");
    assert!(text.contains("\"uid\":77"), "unexpected event frame: {text}");
    assert!(text.contains("\"category\":\"support\""), "unexpected event frame: {text}");
}

#[tokio::test]
async fn inbox_fetch_failures_are_server_errors() {
    let mut mail = MockMail::new();
    mail.expect_fetch_recent().returning(|_| Err(anyhow!("connection refused")));

    let runtime = setup_runtime(MockLlm::new(), mail, MockGeocode::new()).await;
    let (status, body) = call(runtime, "GET", "/api/emails", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unable to fetch emails");
}

// Sales assistant.

#[tokio::test]
async fn chat_greeting_and_reply() {
    let mut llm = MockLlm::new();
    llm.expect_sales_assistant_reply().returning(|_| Ok("Our vans run daily.".to_string()));

    let runtime = setup_runtime(llm, MockMail::new(), MockGeocode::new()).await;

    let (status, greeting) = call(runtime.clone(), "GET", "/api/chat/greeting", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(greeting["id"], 1);
    assert_eq!(greeting["sender"], "bot");

    let (status, reply) = call(runtime.clone(), "POST", "/api/chat", Some(json!({ "history": [greeting], "message": "When do you deliver?" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["sender"], "bot");
    assert_eq!(reply["text"], "Our vans run daily.");

    let (status, _) = call(runtime, "POST", "/api/chat", Some(json!({ "message": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
