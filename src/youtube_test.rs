use crate::error::{YtplError, YtplExpectedError};
use crate::youtube::*;
use serde_json::json;
use std::time::Duration;

#[test]
fn test_parse_iso8601_duration() {
    assert_eq!(parse_iso8601_duration("PT2M5S").unwrap(), Duration::from_secs(125));
    assert_eq!(parse_iso8601_duration("PT1H").unwrap(), Duration::from_secs(3600));
    assert_eq!(parse_iso8601_duration("P1DT4M").unwrap(), Duration::from_secs(86400 + 240));
    assert_eq!(parse_iso8601_duration("P1W").unwrap(), Duration::from_secs(7 * 86400));
    assert_eq!(parse_iso8601_duration("PT0S").unwrap(), Duration::ZERO);
    assert_eq!(parse_iso8601_duration("PT1.5S").unwrap(), Duration::from_millis(1500));
}

#[test]
fn test_parse_iso8601_duration_invalid() {
    let huge_seconds = format!("PT{}S", "9".repeat(30));
    for value in ["", "P", "PT", "1H", "PT1X", "PT-1S", "P1DT", "P9999999999999999999W", "PT9999999999999999999H", huge_seconds.as_str()] {
        let err = parse_iso8601_duration(value).unwrap_err();
        assert!(matches!(err, YtplError::Expected(YtplExpectedError::InvalidDuration { .. })), "{value}");
    }
}

#[test]
fn test_parse_videos_response() {
    let data = json!({
        "items": [{
            "id": "dQw4w9WgXcQ",
            "contentDetails": {"duration": "PT3M32S"},
            "snippet": {"title": "Never Gonna Give You Up"},
            "localizations": {
                "fr-FR": {"title": "Jamais"},
                "de": {"title": "Niemals"},
                "es": {"description": "no title"}
            }
        }]
    });
    let info = parse_videos_response("dQw4w9WgXcQ", &data).unwrap();
    assert_eq!(info.id, "dQw4w9WgXcQ");
    assert!(!info.missing);
    assert_eq!(info.duration.as_secs(), 212);
    assert_eq!(info.title(None), "Never Gonna Give You Up");
    assert_eq!(info.title(Some("fr")), "Jamais");
    assert_eq!(info.title(Some("de")), "Niemals");
    assert_eq!(info.title(Some("es")), "Never Gonna Give You Up");
}

#[test]
fn test_parse_videos_response_errors() {
    let err = parse_videos_response("dQw4w9WgXcQ", &json!({"items": []})).unwrap_err();
    assert!(matches!(err, YtplError::Expected(YtplExpectedError::VideoNotFound { .. })));
    assert!(err.is_item_recoverable());

    let err = parse_videos_response("dQw4w9WgXcQ", &json!({"items": [{"snippet": {"title": "x"}}]})).unwrap_err();
    assert!(matches!(err, YtplError::Expected(YtplExpectedError::MalformedResponse { .. })));
}

#[test]
fn test_parse_playlist_page() {
    let data = json!({
        "nextPageToken": "CAUQAA",
        "items": [
            {"contentDetails": {"videoId": "aaaaaaaaaaa"}},
            {"contentDetails": {}},
            {"contentDetails": {"videoId": "bbbbbbbbbbb"}}
        ]
    });
    let page = parse_playlist_page("PL1", &data).unwrap();
    assert_eq!(page.ids, vec!["aaaaaaaaaaa".to_string(), "bbbbbbbbbbb".to_string()]);
    assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));

    let last = parse_playlist_page("PL1", &json!({"items": []})).unwrap();
    assert!(last.ids.is_empty());
    assert_eq!(last.next_page_token, None);

    assert!(parse_playlist_page("PL1", &json!({"error": {}})).is_err());
}
