use crate::common::{MAX_UPLOAD, TestApp, png_bytes, routes};

mod dedup {
    use super::*;

    #[tokio::test]
    async fn first_upload_creates_file_and_image() {
        let app = TestApp::spawn().await;
        let token = app.token_for("42");
        let res = app.upload(&token, "cat.png", png_bytes("cat")).await;

        assert_eq!(res.status, 200, "upload failed: {}", res.text);
        assert_eq!(res.body["message"], "Upload successful");
        assert_eq!(res.body["existing"], false);
        assert_eq!(res.body["content_hash"].as_str().unwrap().len(), 64);
        let file_id = res.body["file_id"].as_str().unwrap();
        assert!(
            res.body["proxy_url"]
                .as_str()
                .unwrap()
                .ends_with(&format!("/proxy/image/{file_id}"))
        );

        assert_eq!(app.file_count().await, 1);
        assert_eq!(app.image_count().await, 1);
        assert_eq!(app.blobs.upload_count(), 1);
    }

    #[tokio::test]
    async fn same_user_same_content_returns_existing() {
        let app = TestApp::spawn().await;
        let token = app.token_for("42");
        let first = app.upload_ok(&token, png_bytes("cat")).await;

        let res = app.upload(&token, "renamed.png", png_bytes("cat")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["message"], "Image already exists");
        assert_eq!(res.body["existing"], true);
        assert_eq!(res.body["id"], first["id"]);
        assert_eq!(res.body["file_id"], first["file_id"]);

        assert_eq!(app.file_count().await, 1);
        assert_eq!(app.image_count().await, 1);
        assert_eq!(app.blobs.upload_count(), 1);
    }

    #[tokio::test]
    async fn second_user_shares_stored_file() {
        let app = TestApp::spawn().await;
        let alice = app.upload_ok(&app.token_for("1"), png_bytes("cat")).await;
        let bob = app.upload_ok(&app.token_for("2"), png_bytes("cat")).await;

        assert_eq!(bob["existing"], false);
        assert_ne!(bob["id"], alice["id"]);
        assert_eq!(bob["file_id"], alice["file_id"]);
        assert_eq!(bob["content_hash"], alice["content_hash"]);

        assert_eq!(app.file_count().await, 1);
        assert_eq!(app.image_count().await, 2);
        assert_eq!(app.blobs.upload_count(), 1);
    }

    #[tokio::test]
    async fn different_content_stored_separately() {
        let app = TestApp::spawn().await;
        let token = app.token_for("42");
        let a = app.upload_ok(&token, png_bytes("a")).await;
        let b = app.upload_ok(&token, png_bytes("b")).await;

        assert_ne!(a["file_id"], b["file_id"]);
        assert_ne!(a["content_hash"], b["content_hash"]);
        assert_eq!(app.file_count().await, 2);
        assert_eq!(app.blobs.upload_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_identical_uploads_converge() {
        let app = TestApp::spawn().await;
        let token = app.token_for("42");

        let (a, b) = tokio::join!(
            app.upload(&token, "a.png", png_bytes("race")),
            app.upload(&token, "b.png", png_bytes("race")),
        );

        assert_eq!(a.status, 200, "first upload failed: {}", a.text);
        assert_eq!(b.status, 200, "second upload failed: {}", b.text);
        assert_eq!(a.body["id"], b.body["id"]);
        assert_eq!(app.file_count().await, 1);
        assert_eq!(app.image_count().await, 1);
    }
}

mod races {
    use super::*;

    #[tokio::test]
    async fn lost_file_insert_reuses_winning_file() {
        let app = TestApp::spawn_with_preempted_uploads().await;

        let alice = app.upload_ok(&app.token_for("1"), png_bytes("contested")).await;
        assert_eq!(alice["existing"], false);

        let bob = app.upload_ok(&app.token_for("2"), png_bytes("contested")).await;
        assert_eq!(bob["existing"], false);
        assert_eq!(bob["file_id"], alice["file_id"]);
        assert_ne!(bob["id"], alice["id"]);

        assert_eq!(app.file_count().await, 1);
        assert_eq!(app.image_count().await, 2);
        // Winner's blob plus the orphaned one from the losing request.
        assert_eq!(app.blobs.upload_count(), 2);

        let res = app
            .get_without_token(&routes::proxy(alice["file_id"].as_str().unwrap()))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.bytes, png_bytes("contested"));
    }

    #[tokio::test]
    async fn ledger_failure_after_blob_upload_is_persistence_error() {
        let app = TestApp::spawn().await;
        app.execute_sql(
            "ALTER TABLE \"file\" ADD CONSTRAINT reject_new_files CHECK (false) NOT VALID",
        )
        .await;

        let res = app
            .upload(&app.token_for("1"), "cat.png", png_bytes("cat"))
            .await;
        assert_eq!(res.status, 500, "unexpected response: {}", res.text);
        assert_eq!(res.body["code"], "PERSISTENCE_ERROR");
        assert_eq!(app.blobs.upload_count(), 1);
        assert_eq!(app.file_count().await, 0);
        assert_eq!(app.image_count().await, 0);
    }
}

mod limits {
    use super::*;

    #[tokio::test]
    async fn five_mebibyte_image_accepted() {
        let app = TestApp::spawn().await;
        let mut data = png_bytes("large");
        data.resize(5 * 1024 * 1024, 0xAB);

        let res = app.upload(&app.token_for("42"), "large.png", data).await;
        assert_eq!(res.status, 200, "upload failed: {}", res.text);
        assert_eq!(app.file_count().await, 1);
    }

    #[tokio::test]
    async fn oversize_image_rejected() {
        let app = TestApp::spawn().await;
        let mut data = png_bytes("huge");
        data.resize(MAX_UPLOAD + 1, 0);

        let res = app.upload(&app.token_for("42"), "huge.png", data).await;
        assert_eq!(res.status, 413);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(app.file_count().await, 0);
        assert_eq!(app.blobs.upload_count(), 0);
    }

    #[tokio::test]
    async fn empty_image_rejected() {
        let app = TestApp::spawn().await;
        let res = app.upload(&app.token_for("42"), "empty.png", vec![]).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod rejection {
    use super::*;

    #[tokio::test]
    async fn missing_image_field_rejected() {
        let app = TestApp::spawn().await;
        let part = reqwest::multipart::Part::bytes(png_bytes("x")).file_name("x.png");
        let form = reqwest::multipart::Form::new().part("file", part);
        let res = app
            .client
            .post(app.url(routes::UPLOAD))
            .header("Authorization", format!("Bearer {}", app.token_for("42")))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unauthenticated_upload_rejected() {
        let app = TestApp::spawn().await;
        let part = reqwest::multipart::Part::bytes(png_bytes("x")).file_name("x.png");
        let form = reqwest::multipart::Form::new().part("image", part);
        let res = app
            .client
            .post(app.url(routes::UPLOAD))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 401);
        assert_eq!(app.blobs.upload_count(), 0);
    }

    #[tokio::test]
    async fn blob_store_outage_is_upstream_error() {
        let app = TestApp::spawn().await;
        app.blobs.set_unavailable(true);

        let res = app
            .upload(&app.token_for("42"), "cat.png", png_bytes("cat"))
            .await;
        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "UPSTREAM_UNAVAILABLE");
        assert_eq!(app.file_count().await, 0);
        assert_eq!(app.image_count().await, 0);
    }
}

mod origin {
    use super::*;

    #[tokio::test]
    async fn forwarded_address_recorded() {
        let app = TestApp::spawn().await;
        let token = app.token_for("42");
        let res = app
            .upload_with_headers(
                &token,
                "cat.png",
                png_bytes("cat"),
                &[("X-Forwarded-For", "203.0.113.7, 10.0.0.1")],
            )
            .await;
        assert_eq!(res.status, 200);

        let image = app.get_with_token(&routes::image(res.id()), &token).await;
        assert_eq!(image.body["upload_ip"], "203.0.113.7");
    }

    #[tokio::test]
    async fn socket_address_used_without_forwarding_headers() {
        let app = TestApp::spawn().await;
        let token = app.token_for("42");
        let res = app.upload(&token, "cat.png", png_bytes("cat")).await;
        assert_eq!(res.status, 200);

        let image = app.get_with_token(&routes::image(res.id()), &token).await;
        assert_eq!(image.body["upload_ip"], "127.0.0.1");
    }

    #[tokio::test]
    async fn configured_public_url_used_for_proxy_links() {
        let app = TestApp::spawn_with_public_url(Some("https://img.example.com/")).await;
        let body = app.upload_ok(&app.token_for("42"), png_bytes("cat")).await;

        let file_id = body["file_id"].as_str().unwrap();
        assert_eq!(
            body["proxy_url"],
            format!("https://img.example.com/proxy/image/{file_id}")
        );
    }
}
