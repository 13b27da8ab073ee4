use crate::common::{TestApp, png_bytes, routes};

#[tokio::test]
async fn streams_stored_bytes() {
    let app = TestApp::spawn().await;
    let data = png_bytes("streamed");
    let uploaded = app.upload_ok(&app.token_for("1"), data.clone()).await;
    let file_id = uploaded["file_id"].as_str().unwrap();

    let res = app.get_without_token(&routes::proxy(file_id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, data);
    assert_eq!(res.header("content-type"), Some("image/png"));
    assert_eq!(res.header("content-disposition"), Some("inline"));
    assert_eq!(
        res.header("cache-control"),
        Some("public, max-age=31536000, immutable")
    );
    let expected_etag = format!("\"{}\"", uploaded["content_hash"].as_str().unwrap());
    assert_eq!(res.header("etag"), Some(expected_etag.as_str()));
}

#[tokio::test]
async fn served_after_owner_deletes_image() {
    let app = TestApp::spawn().await;
    let token = app.token_for("1");
    let uploaded = app.upload_ok(&token, png_bytes("kept")).await;
    let id = uploaded["id"].as_i64().unwrap();
    app.delete_with_token(&routes::image(id), &token).await;

    let res = app
        .get_without_token(&routes::proxy(uploaded["file_id"].as_str().unwrap()))
        .await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn non_image_content_downloads_as_attachment() {
    let app = TestApp::spawn().await;
    let uploaded = app
        .upload_ok(&app.token_for("1"), b"plain text, not an image".to_vec())
        .await;
    let file_id = uploaded["file_id"].as_str().unwrap();

    let res = app.get_without_token(&routes::proxy(file_id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.header("content-type"), Some("application/octet-stream"));
    assert_eq!(
        res.header("content-disposition"),
        Some(format!("attachment; filename=\"image_{file_id}\"").as_str())
    );
}

#[tokio::test]
async fn matching_etag_not_modified() {
    let app = TestApp::spawn().await;
    let uploaded = app.upload_ok(&app.token_for("1"), png_bytes("cached")).await;
    let file_id = uploaded["file_id"].as_str().unwrap();
    let etag = format!("\"{}\"", uploaded["content_hash"].as_str().unwrap());

    let res = app
        .get_with_headers(&routes::proxy(file_id), &[("If-None-Match", etag.as_str())])
        .await;
    assert_eq!(res.status, 304);
    assert!(res.bytes.is_empty());

    let listed = format!("\"other\", W/{etag}");
    let res = app
        .get_with_headers(&routes::proxy(file_id), &[("If-None-Match", listed.as_str())])
        .await;
    assert_eq!(res.status, 304);

    let stale = app
        .get_with_headers(&routes::proxy(file_id), &[("If-None-Match", "\"other\"")])
        .await;
    assert_eq!(stale.status, 200);
}

#[tokio::test]
async fn unknown_handle_not_found() {
    let app = TestApp::spawn().await;
    let res = app.get_without_token(&routes::proxy("does-not-exist")).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn blob_store_outage_is_upstream_error() {
    let app = TestApp::spawn().await;
    let uploaded = app.upload_ok(&app.token_for("1"), png_bytes("gone")).await;
    app.blobs.set_unavailable(true);

    let res = app
        .get_without_token(&routes::proxy(uploaded["file_id"].as_str().unwrap()))
        .await;
    assert_eq!(res.status, 502);
    assert_eq!(res.body["code"], "UPSTREAM_UNAVAILABLE");
}
