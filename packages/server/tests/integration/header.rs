use serde_json::json;
use server::utils::jwt::{HEADER_EDIT, PAGE_EDIT};

use crate::common::{TestApp, routes};

fn courses_header() -> serde_json::Value {
    json!({
        "image_url": "https://cdn.example.com/courses.jpg",
        "title": "Our courses",
        "subtitle": "Learn with us",
    })
}

mod header_reads {
    use super::*;

    #[tokio::test]
    async fn absent_header_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::page_header("courses")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn unknown_page_key_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::page_header("blog")).await;

        assert_eq!(res.status, 400);
        assert!(res.body["message"].as_str().unwrap().contains("courses"));
    }

    #[tokio::test]
    async fn empty_collection_lists_nothing() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::PAGE_HEADERS).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!([]));
    }
}

mod header_writes {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let app = TestApp::spawn().await;
        let token = app.token(&[HEADER_EDIT]);

        let res = app
            .put_with_token(&routes::page_header("courses"), &courses_header(), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_without_token(&routes::page_header("courses")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["page"], "courses");
        assert_eq!(res.body["title"], "Our courses");
        assert_eq!(res.body["subtitle"], "Learn with us");
        assert!(res.body.get("padding_top").is_none());
    }

    #[tokio::test]
    async fn put_replaces_existing_header() {
        let app = TestApp::spawn().await;
        let token = app.token(&[HEADER_EDIT]);
        app.put_with_token(&routes::page_header("home"), &courses_header(), &token)
            .await;

        let res = app
            .put_with_token(
                &routes::page_header("home"),
                &json!({
                    "imageUrl": "/hero.png",
                    "title": "Welcome",
                    "subtitle": "",
                    "min_height": "60vh",
                }),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_without_token(&routes::page_header("home")).await;
        assert_eq!(res.body["title"], "Welcome");
        assert_eq!(res.body["image_url"], "/hero.png");
        assert_eq!(res.body["min_height"], "60vh");
    }

    #[tokio::test]
    async fn collection_cache_is_invalidated_on_write() {
        let app = TestApp::spawn().await;
        let token = app.token(&[HEADER_EDIT]);

        let res = app.get_without_token(routes::PAGE_HEADERS).await;
        assert_eq!(res.body, json!([]));

        app.put_with_token(&routes::page_header("about"), &courses_header(), &token)
            .await;
        app.put_with_token(&routes::page_header("contact"), &courses_header(), &token)
            .await;

        let res = app.get_without_token(routes::PAGE_HEADERS).await;
        let pages: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["page"].as_str().unwrap())
            .collect();
        assert_eq!(pages, vec!["about", "contact"]);

        let res = app
            .delete_with_token(&routes::page_header("about"), &token)
            .await;
        assert_eq!(res.status, 204);

        let res = app.get_without_token(routes::PAGE_HEADERS).await;
        assert_eq!(res.body.as_array().unwrap().len(), 1);
        let res = app.get_without_token(&routes::page_header("about")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn missing_title_or_image_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token(&[HEADER_EDIT]);

        for body in [
            json!({ "image_url": "/a.png", "title": "  " }),
            json!({ "image_url": "", "title": "Title" }),
        ] {
            let res = app
                .put_with_token(&routes::page_header("clinics"), &body, &token)
                .await;
            assert_eq!(res.status, 400, "accepted {body}");
        }

        let res = app.get_without_token(&routes::page_header("clinics")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn requires_header_edit_permission() {
        let app = TestApp::spawn().await;

        let res = app
            .put_with_token(
                &routes::page_header("home"),
                &courses_header(),
                &app.token(&[PAGE_EDIT]),
            )
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .put_without_token(&routes::page_header("home"), &courses_header())
            .await;
        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn deleting_absent_header_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.token(&[HEADER_EDIT]);

        let res = app
            .delete_with_token(&routes::page_header("community"), &token)
            .await;
        assert_eq!(res.status, 404);
    }
}
