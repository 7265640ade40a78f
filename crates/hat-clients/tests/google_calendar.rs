// Google Calendar client against a mock token endpoint and events API.
use chrono::NaiveDate;
use chrono_tz::Pacific::Auckland;
use hat_clients::{ClientError, GoogleCalendarClient, ServiceAccountKey};
use hat_core::{CalendarSource, EventSpan, WeekWindow};
use mockito::{Matcher, Server, ServerGuard};

const TEST_KEY: &str = include_str!("data/service_account_key.pem");
const CALENDAR: &str = "team@group.calendar.google.com";

fn client(server: &ServerGuard) -> GoogleCalendarClient {
    let key = ServiceAccountKey::from_json(
        &serde_json::json!({
            "client_email": "autofill@example.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
            "token_uri": format!("{}/token", server.url()),
        })
        .to_string(),
    )
    .unwrap();
    GoogleCalendarClient::new(key)
        .unwrap()
        .with_base_url(format!("{}/calendar/v3", server.url()))
}

async fn mock_token(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded(
                "grant_type".into(),
                "urn:ietf:params:oauth:grant-type:jwt-bearer".into(),
            ),
            Matcher::Regex("assertion=".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token": "ya29.test", "expires_in": 3599, "token_type": "Bearer"}"#)
        .expect(1)
        .create_async()
        .await
}

fn bounds() -> (chrono::DateTime<chrono_tz::Tz>, chrono::DateTime<chrono_tz::Tz>) {
    WeekWindow::containing(NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()).event_bounds(Auckland)
}

#[tokio::test]
async fn lists_events_across_pages_with_one_token() {
    let mut server = Server::new_async().await;
    let token = mock_token(&mut server).await;
    let path = "/calendar/v3/calendars/team@group.calendar.google.com/events";

    let first = server
        .mock("GET", path)
        .match_header("authorization", "Bearer ya29.test")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("singleEvents".into(), "true".into()),
            Matcher::UrlEncoded("orderBy".into(), "startTime".into()),
            Matcher::UrlEncoded("eventTypes".into(), "default".into()),
            Matcher::UrlEncoded("timeZone".into(), "Pacific/Auckland".into()),
            Matcher::UrlEncoded("timeMin".into(), "2025-01-06T00:00:00+13:00".into()),
            Matcher::UrlEncoded("timeMax".into(), "2025-01-10T23:59:00+13:00".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"kind": "calendar#events", "nextPageToken": "p2", "items": [
                {"status": "confirmed", "summary": "Standup",
                 "start": {"dateTime": "2025-01-06T09:00:00+13:00"},
                 "end": {"dateTime": "2025-01-06T09:15:00+13:00"}}
            ]}"#,
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", path)
        .match_query(Matcher::UrlEncoded("pageToken".into(), "p2".into()))
        .with_status(200)
        .with_body(
            r#"{"items": [
                {"status": "confirmed", "summary": "Offsite",
                 "start": {"date": "2025-01-09"}, "end": {"date": "2025-01-10"}}
            ]}"#,
        )
        .create_async()
        .await;

    let (time_min, time_max) = bounds();
    let events = client(&server)
        .list_events(CALENDAR, time_min, time_max, Auckland)
        .await
        .unwrap();

    token.assert_async().await;
    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].hours(), Some(0.25));
    assert!(matches!(events[1].span, EventSpan::AllDay { .. }));
}

#[tokio::test]
async fn malformed_event_fails_the_listing() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server).await;
    let _events = server
        .mock("GET", Matcher::Regex(r"/events$".to_string()))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"items": [
                {"status": "confirmed", "summary": "Broken",
                 "start": {"dateTime": "2025-01-06T09:00:00+13:00"}, "end": {}}
            ]}"#,
        )
        .create_async()
        .await;

    let (time_min, time_max) = bounds();
    let err = client(&server)
        .events(CALENDAR, time_min, time_max, Auckland)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Payload(_)));
}

#[tokio::test]
async fn token_rejection_is_reported() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(r#"{"error": "invalid_grant"}"#)
        .create_async()
        .await;

    let (time_min, time_max) = bounds();
    let err = client(&server)
        .events(CALENDAR, time_min, time_max, Auckland)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));
}
