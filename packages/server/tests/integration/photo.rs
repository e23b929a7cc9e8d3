use uuid::Uuid;

use crate::common::{TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn requires_identity_header() {
        let app = TestApp::spawn().await;
        let body = serde_json::json!({
            "image_url": "http://example.test/img",
            "storage_id": "0123456789abcdef0123456789abcdef",
            "username": "alice",
        });

        let res = app.post_anon_json(routes::PHOTOS, &body).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"].as_str().unwrap(), "IDENTITY_MISSING");
    }

    #[tokio::test]
    async fn rejects_empty_image_url() {
        let app = TestApp::spawn().await;
        let body = serde_json::json!({
            "image_url": "  ",
            "storage_id": "0123456789abcdef0123456789abcdef",
            "username": "alice",
        });

        let res = app.post_as(routes::PHOTOS, &body, "u1").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_malformed_storage_id() {
        let app = TestApp::spawn().await;
        let body = serde_json::json!({
            "image_url": "http://example.test/img",
            "storage_id": "not-a-handle",
            "username": "alice",
        });

        let res = app.post_as(routes::PHOTOS, &body, "u1").await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn returns_fresh_record() {
        let app = TestApp::spawn().await;
        let storage_id = app.upload_blob(b"png".to_vec()).await;
        let body = serde_json::json!({
            "image_url": "http://example.test/img.png",
            "storage_id": storage_id,
            "username": "alice",
            "user_avatar": "http://example.test/alice.png",
        });

        let res = app.post_as(routes::PHOTOS, &body, "u1").await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].as_str().is_some());
        assert_eq!(res.body["user_id"].as_str().unwrap(), "u1");
        assert_eq!(res.body["username"].as_str().unwrap(), "alice");
        assert_eq!(res.body["likes"].as_i64().unwrap(), 0);
        assert!(res.body["liked_by"].as_array().unwrap().is_empty());
        assert!(res.body["created_at"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn create_then_list_by_user_returns_exactly_one() {
        let app = TestApp::spawn().await;
        app.create_photo("u1", "alice").await;

        let res = app.get(&routes::user_photos("u1")).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"].as_u64().unwrap(), 1);
        let items = res.body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["likes"].as_i64().unwrap(), 0);
        assert!(items[0]["liked_by"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_by_user_excludes_other_uploaders() {
        let app = TestApp::spawn().await;
        app.create_photo("u1", "alice").await;
        app.create_photo("u2", "bob").await;

        let res = app.get(&routes::user_photos("u1")).await;

        assert_eq!(res.body["total"].as_u64().unwrap(), 1);
        assert_eq!(
            res.body["items"][0]["username"].as_str().unwrap(),
            "alice"
        );
    }
}

mod toggle_like {
    use super::*;

    #[tokio::test]
    async fn double_toggle_restores_count() {
        let app = TestApp::spawn().await;
        let photo_id = app.create_photo("owner", "alice").await;
        let path = routes::photo_like(&photo_id);
        let empty = serde_json::json!({});

        let first = app.post_as(&path, &empty, "liker").await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert!(first.body["liked"].as_bool().unwrap());
        assert_eq!(first.body["likes"].as_i64().unwrap(), 1);

        let second = app.post_as(&path, &empty, "liker").await;
        assert_eq!(second.status, 200);
        assert!(!second.body["liked"].as_bool().unwrap());
        assert_eq!(second.body["likes"].as_i64().unwrap(), 0);
    }

    #[tokio::test]
    async fn distinct_users_accumulate() {
        let app = TestApp::spawn().await;
        let photo_id = app.create_photo("owner", "alice").await;
        let path = routes::photo_like(&photo_id);
        let empty = serde_json::json!({});

        for i in 0..5 {
            let res = app.post_as(&path, &empty, &format!("liker_{i}")).await;
            assert_eq!(res.status, 200);
            assert!(res.body["liked"].as_bool().unwrap());
        }

        let feed = app.get(routes::PHOTOS).await;
        let item = &feed.body["items"][0];
        assert_eq!(item["likes"].as_i64().unwrap(), 5);

        let mut liked_by: Vec<String> = item["liked_by"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        liked_by.sort();
        let expected: Vec<String> = (0..5).map(|i| format!("liker_{i}")).collect();
        assert_eq!(liked_by, expected);
    }

    #[tokio::test]
    async fn unknown_photo_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .post_as(
                &routes::photo_like(&Uuid::now_v7().to_string()),
                &serde_json::json!({}),
                "u1",
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"].as_str().unwrap(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn concurrent_toggles_keep_counter_equal_to_membership() {
        let app = TestApp::spawn().await;
        let photo_id = app.create_photo("owner", "alice").await;
        let path = routes::photo_like(&photo_id);
        let empty = serde_json::json!({});

        // 8 users like concurrently; every mutation commits membership and
        // counter together.
        let toggles = (0..8).map(|i| {
            let path = path.clone();
            let empty = empty.clone();
            let app = &app;
            async move { app.post_as(&path, &empty, &format!("liker_{i}")).await }
        });
        for res in futures::future::join_all(toggles).await {
            assert_eq!(res.status, 200, "{}", res.text);
            assert!(res.body["liked"].as_bool().unwrap());
        }

        // Two of them concurrently un-like.
        let untoggles = (0..2).map(|i| {
            let path = path.clone();
            let empty = empty.clone();
            let app = &app;
            async move { app.post_as(&path, &empty, &format!("liker_{i}")).await }
        });
        for res in futures::future::join_all(untoggles).await {
            assert_eq!(res.status, 200);
            assert!(!res.body["liked"].as_bool().unwrap());
        }

        let feed = app.get(routes::PHOTOS).await;
        let item = &feed.body["items"][0];
        let liked_by = item["liked_by"].as_array().unwrap();
        assert_eq!(item["likes"].as_i64().unwrap(), 6);
        assert_eq!(liked_by.len(), 6);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn owner_can_delete_then_photo_is_gone() {
        let app = TestApp::spawn().await;
        let photo_id = app.create_photo("owner", "alice").await;

        let res = app.delete_as(&routes::photo(&photo_id), "owner").await;
        assert_eq!(res.status, 204);

        // Any later interaction with the id is NotFound.
        let toggle = app
            .post_as(&routes::photo_like(&photo_id), &serde_json::json!({}), "u2")
            .await;
        assert_eq!(toggle.status, 404);
    }

    #[tokio::test]
    async fn non_owner_is_forbidden_and_photo_unchanged() {
        let app = TestApp::spawn().await;
        let photo_id = app.create_photo("owner", "alice").await;

        let res = app.delete_as(&routes::photo(&photo_id), "intruder").await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"].as_str().unwrap(), "PERMISSION_DENIED");

        let list = app.get(&routes::user_photos("owner")).await;
        assert_eq!(list.body["total"].as_u64().unwrap(), 1);
        assert_eq!(list.body["items"][0]["id"].as_str().unwrap(), photo_id);
    }

    #[tokio::test]
    async fn unknown_photo_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .delete_as(&routes::photo(&Uuid::now_v7().to_string()), "u1")
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn delete_releases_the_blob() {
        let app = TestApp::spawn().await;
        let storage_id = app.upload_blob(b"jpeg bytes".to_vec()).await;
        let body = serde_json::json!({
            "image_url": "http://example.test/img.jpg",
            "storage_id": storage_id,
            "username": "alice",
        });
        let created = app.post_as(routes::PHOTOS, &body, "owner").await;
        let photo_id = created.body["id"].as_str().unwrap().to_string();

        let (status, _) = app.get_bytes(&routes::upload(&storage_id)).await;
        assert_eq!(status, 200);

        let res = app.delete_as(&routes::photo(&photo_id), "owner").await;
        assert_eq!(res.status, 204);

        let (status, _) = app.get_bytes(&routes::upload(&storage_id)).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn delete_removes_like_rows() {
        let app = TestApp::spawn().await;
        let photo_id = app.create_photo("owner", "alice").await;
        app.post_as(&routes::photo_like(&photo_id), &serde_json::json!({}), "fan")
            .await;

        let res = app.delete_as(&routes::photo(&photo_id), "owner").await;
        assert_eq!(res.status, 204);

        use sea_orm::EntityTrait;
        let remaining = server::entity::photo_like::Entity::find()
            .all(&app.db)
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }
}
