// Harvest client against a mock API server.
use chrono::NaiveDate;
use hat_clients::{ClientError, HarvestClient};
use hat_core::{NewEntrySpec, Task, Timesheet};
use mockito::{Matcher, Server};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
}

fn client(server: &Server) -> HarvestClient {
    HarvestClient::new("987", "token-abc")
        .unwrap()
        .with_base_url(server.url())
}

#[tokio::test]
async fn lists_entries_across_pages() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("GET", "/time_entries")
        .match_header("authorization", "Bearer token-abc")
        .match_header("harvest-account-id", "987")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("from".into(), "2025-01-06".into()),
            Matcher::UrlEncoded("to".into(), "2025-01-10".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"time_entries": [
                {"id": 1, "spent_date": "2025-01-06", "hours": 2.5, "notes": "Standup",
                 "project": {"id": 43607455}, "task": {"id": 22157751}}
            ], "next_page": 2, "page": 1}"#,
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/time_entries")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_body(
            r#"{"time_entries": [
                {"id": 2, "spent_date": "2025-01-07", "hours": 8.0, "notes": null,
                 "project": {"id": 43607407}, "task": {"id": 22157391}}
            ], "next_page": null, "page": 2}"#,
        )
        .create_async()
        .await;

    let entries = client(&server)
        .list_time_entries(date(6), date(10))
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].spent_date, date(6));
    assert_eq!(entries[0].notes.as_deref(), Some("Standup"));
    assert_eq!(entries[1].task_id, Task::Engineering.id());
}

#[tokio::test]
async fn creates_entry_with_catalogue_ids() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/time_entries")
        .match_body(Matcher::Json(serde_json::json!({
            "project_id": 43_607_407,
            "task_id": 22_157_391,
            "spent_date": "2025-01-08",
            "hours": 3.25,
            "notes": "A joke",
        })))
        .with_status(201)
        .with_body(
            r#"{"id": 77, "spent_date": "2025-01-08", "hours": 3.25, "notes": "A joke",
                "project": {"id": 43607407}, "task": {"id": 22157391}}"#,
        )
        .create_async()
        .await;

    let entry = NewEntrySpec::new(date(8), Task::Engineering, 3.25, "A joke");
    let created = client(&server).create_time_entry(&entry).await.unwrap();

    mock.assert_async().await;
    assert_eq!(created.id, 77);
    assert!((created.hours - 3.25).abs() < f64::EPSILON);
}

#[tokio::test]
async fn deletes_entry_by_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/time_entries/77")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    client(&server).delete_time_entry(77).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn rejected_request_reports_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/users/me")
        .with_status(401)
        .with_body(r#"{"error": "invalid_token"}"#)
        .create_async()
        .await;

    let err = client(&server).current_user().await.unwrap_err();
    match err {
        ClientError::Api { service, status, message } => {
            assert_eq!(service, "Harvest");
            assert_eq!(status, 401);
            assert!(message.contains("invalid_token"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn current_user_parses_profile() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/users/me")
        .with_status(200)
        .with_body(
            r#"{"id": 5, "first_name": "Sam", "last_name": "Lee", "email": "sam@example.com",
                "is_active": true}"#,
        )
        .create_async()
        .await;

    let user = client(&server).current_user().await.unwrap();
    assert_eq!(user.id, 5);
    assert_eq!(user.email, "sam@example.com");
}
