use dated_object_store::{config::Config, ObjectStoreClient};

// Runs against a live endpoint, e.g.
// E2E=1 S3_ENDPOINT=http://127.0.0.1:9000 S3_BUCKET=e2e S3_CREATE_BUCKET=true \
// S3_ACCESS_KEY_ID=minioadmin S3_SECRET_ACCESS_KEY=minioadmin cargo test --test e2e
#[tokio::test]
async fn e2e_upload_download_latest() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("E2E").is_err() {
        eprintln!("E2E not set, skipping");
        return Ok(());
    }

    let cfg = Config::from_env()?;
    let bucket = cfg.bucket()?.to_string();
    let client = ObjectStoreClient::from_config(&cfg, Some(&bucket)).await?;

    let prefix = format!("e2e/{}/", uuid::Uuid::new_v4());

    assert_eq!(client.find_most_recent_by_prefix(&bucket, &prefix).await?, None);

    let keys = [
        format!("{prefix}report.pdf"),
        format!("{prefix}report_2024-01-01.pdf"),
        format!("{prefix}report_2024-06-15.pdf"),
    ];
    for key in &keys {
        client
            .upload(&bucket, key, format!("# {key}\n"), "text/markdown")
            .await?;
    }

    let text = client.download_text(&bucket, &keys[1]).await?;
    assert_eq!(text, format!("# {}\n", keys[1]));

    let raw = vec![0u8, 1, 2, 0xff];
    client
        .upload(&bucket, &format!("{prefix}raw.bin"), raw.clone(), "application/octet-stream")
        .await?;
    let fetched = client.download_binary(&bucket, &format!("{prefix}raw.bin")).await?;
    assert_eq!(fetched.as_ref(), raw.as_slice());

    let latest = client.find_most_recent_by_prefix(&bucket, &prefix).await?;
    assert_eq!(latest.as_deref(), Some(keys[2].as_str()));

    let missing = client.download_binary(&bucket, &format!("{prefix}absent")).await;
    assert!(missing.is_err_and(|e| e.is_download()));

    Ok(())
}
