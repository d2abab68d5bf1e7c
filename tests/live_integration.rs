use santa_http::{ClientOptions, ErrorMessages, SantaClient, SantaError};

fn load_live_client() -> Result<SantaClient, String> {
    let client = SantaClient::from_env()?;
    if std::env::var("SANTA_ACCESS_TOKEN").is_err() {
        return Err("SANTA_ACCESS_TOKEN is required for live tests".to_owned());
    }
    Ok(client.with_options(ClientOptions {
        timeout_ms: 10_000,
        max_retries: 1,
        retry_backoff_ms: 250,
    }))
}

#[tokio::test]
async fn live_unknown_group_surfaces_structured_error() {
    let client = match load_live_client() {
        Ok(client) => client,
        Err(_) => {
            eprintln!("skipping live test: SANTA_BASE_URL / SANTA_ACCESS_TOKEN not set");
            return;
        }
    };

    let err = client
        .validate_draw(i64::from(i32::MAX))
        .await
        .expect_err("validation of a missing group must fail");

    let status = match &err {
        SantaError::Api { status, .. } | SantaError::Http { status, .. } => *status,
        other => panic!("expected a response error, got {other:?}"),
    };
    assert!((400..500).contains(&status), "unexpected status {status}");

    let normalized = err.normalize(&ErrorMessages::new());
    assert!(!normalized.code.is_empty());
    assert!(!normalized.message.is_empty());
}
