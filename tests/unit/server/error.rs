use super::*;

#[test]
fn domain_errors_map_to_status_codes() {
    let cases = [
        (WheelError::validation("x"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        (WheelError::not_found("x"), StatusCode::NOT_FOUND, "NOT_FOUND"),
        (WheelError::encoding("x"), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        (WheelError::Cancelled, StatusCode::SERVICE_UNAVAILABLE, "SHUTTING_DOWN"),
    ];
    for (err, status, code) in cases {
        assert_eq!(AppError::from(err).classify(), (status, code));
    }
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    use http_body_util::BodyExt;

    let resp = AppError::from(WheelError::render("secret path /srv/x")).into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert!(!body["error"].as_str().unwrap().contains("/srv/x"));
}

#[tokio::test]
async fn client_errors_keep_their_message() {
    use http_body_util::BodyExt;

    let resp = AppError::from(WheelError::validation("selectedNumber is required")).into_response();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "selectedNumber is required");
}
