use serde_json::json;
use server::utils::jwt::{HEADER_EDIT, PAGE_EDIT};

use crate::common::{TestApp, routes};

mod replace_blocks {
    use super::*;

    #[tokio::test]
    async fn blocks_are_stored_in_submitted_order() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);
        let id = app.create_page(&token, "home", true).await;

        let stored = app
            .replace_blocks(
                &token,
                id,
                json!([
                    { "type": "text", "content_json": { "html": "<p>first</p>" } },
                    { "type": "image", "contentJson": { "imageUrl": "/a.png", "alt": "A" } },
                    { "type": "video", "content_json": { "videoUrl": "https://youtu.be/abc" } },
                ]),
            )
            .await;

        assert_eq!(stored.len(), 3);
        let positions: Vec<i64> = stored.iter().map(|b| b["position"].as_i64().unwrap()).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(stored[1]["type"], "image");
        assert_eq!(stored[1]["content_json"]["imageUrl"], "/a.png");

        let res = app.get_without_token(&routes::page_blocks(id)).await;
        assert_eq!(res.status, 200);
        let types: Vec<&str> = res.body.as_array().unwrap().iter().map(|b| b["type"].as_str().unwrap()).collect();
        assert_eq!(types, vec!["text", "image", "video"]);
        assert!(res.body[0]["id"].is_string());
    }

    #[tokio::test]
    async fn replacing_discards_previous_blocks() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);
        let id = app.create_page(&token, "home", true).await;
        app.replace_blocks(&token, id, json!([{ "type": "text", "content_json": { "html": "old" } }]))
            .await;

        let res = app.get_without_token(&routes::page_blocks(id)).await;
        assert_eq!(res.body.as_array().unwrap().len(), 1);

        app.replace_blocks(
            &token,
            id,
            json!([
                { "type": "text", "content_json": { "html": "new 1" } },
                { "type": "text", "content_json": { "html": "new 2" } },
            ]),
        )
        .await;

        let res = app.get_without_token(&routes::page_blocks(id)).await;
        let blocks = res.body.as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["content_json"]["html"], "new 1");
    }

    #[tokio::test]
    async fn empty_list_clears_the_page() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);
        let id = app.create_page(&token, "home", true).await;
        app.replace_blocks(&token, id, json!([{ "type": "text", "content_json": { "html": "x" } }]))
            .await;

        let stored = app.replace_blocks(&token, id, json!([])).await;
        assert!(stored.is_empty());

        let res = app.get_without_token(&routes::page_blocks(id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!([]));
    }

    #[tokio::test]
    async fn invalid_blocks_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);
        let id = app.create_page(&token, "home", true).await;

        for blocks in [
            json!([{ "type": "marquee", "content_json": {} }]),
            json!([{ "type": "image", "content_json": { "alt": "no url" } }]),
            json!([{ "type": "cta", "content_json": { "title": "Hi" } }]),
            json!([{ "type": "container", "content_json": { "columns": 9 } }]),
            json!([{ "type": "container", "content_json": { "children": [
                { "id": "x", "type": "text", "content_json": { "html": "a" } },
                { "id": "x", "type": "text", "content_json": { "html": "b" } },
            ] } }]),
        ] {
            let res = app
                .put_with_token(&routes::page_blocks(id), &json!({ "blocks": blocks }), &token)
                .await;
            assert_eq!(res.status, 400, "accepted {blocks}");
            assert_eq!(res.code(), "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn requires_page_edit_permission() {
        let app = TestApp::spawn().await;
        let id = app.create_page(&app.admin_token(), "home", true).await;

        let res = app
            .put_with_token(
                &routes::page_blocks(id),
                &json!({ "blocks": [] }),
                &app.token(&[HEADER_EDIT]),
            )
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .put_without_token(&routes::page_blocks(id), &json!({ "blocks": [] }))
            .await;
        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn unknown_page_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);

        let res = app
            .put_with_token(&routes::page_blocks(404), &json!({ "blocks": [] }), &token)
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn nested_children_get_ids() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);
        let id = app.create_page(&token, "home", true).await;

        let stored = app
            .replace_blocks(
                &token,
                id,
                json!([{
                    "type": "container",
                    "content_json": {
                        "layout": "columns",
                        "columns": 2,
                        "children": [
                            { "type": "text", "content_json": { "html": "<p>left</p>" } },
                            { "id": "right", "type": "text", "content_json": { "html": "<p>right</p>" } },
                        ],
                    },
                }]),
            )
            .await;

        let children = stored[0]["content_json"]["children"].as_array().unwrap();
        assert!(!children[0]["id"].as_str().unwrap().is_empty());
        assert_eq!(children[1]["id"], "right");
    }
}

mod public_blocks {
    use super::*;

    #[tokio::test]
    async fn unpublished_page_blocks_are_hidden() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);
        let id = app.create_page(&token, "draft", false).await;
        app.replace_blocks(&token, id, json!([{ "type": "text", "content_json": { "html": "x" } }]))
            .await;

        let res = app.get_without_token(&routes::page_blocks(id)).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn cached_blocks_refresh_after_replace() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);
        let id = app.create_page(&token, "home", true).await;
        app.replace_blocks(&token, id, json!([{ "type": "text", "content_json": { "html": "v1" } }]))
            .await;

        let res = app.get_without_token(&routes::page_blocks(id)).await;
        assert_eq!(res.body[0]["content_json"]["html"], "v1");

        app.replace_blocks(&token, id, json!([{ "type": "text", "content_json": { "html": "v2" } }]))
            .await;

        let res = app.get_without_token(&routes::page_blocks(id)).await;
        assert_eq!(res.body[0]["content_json"]["html"], "v2");
    }
}

mod container_edit {
    use super::*;

    async fn page_with_container(app: &TestApp, token: &str) -> (i32, i32, i32) {
        let id = app.create_page(token, "home", true).await;
        let stored = app
            .replace_blocks(
                token,
                id,
                json!([
                    { "type": "text", "content_json": { "html": "<p>intro</p>" } },
                    {
                        "type": "container",
                        "content_json": {
                            "layout": "rows",
                            "gap": "1rem",
                            "spacing": { "marginBottom": "2rem" },
                            "children": [
                                { "id": "c1", "type": "text", "content_json": { "html": "<p>child</p>" } },
                            ],
                        },
                    },
                ]),
            )
            .await;
        let text_id = stored[0]["id"].as_i64().unwrap() as i32;
        let container_id = stored[1]["id"].as_i64().unwrap() as i32;
        (id, text_id, container_id)
    }

    #[tokio::test]
    async fn edits_merge_into_existing_content() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);
        let (id, _, container_id) = page_with_container(&app, &token).await;

        let res = app
            .patch_with_token(
                &routes::container(id, container_id),
                &json!({
                    "layout": "columns",
                    "columns": 3,
                    "spacing": { "paddingTop": "4rem" },
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let content = &res.body["content_json"];
        assert_eq!(content["layout"], "columns");
        assert_eq!(content["columns"], 3);
        assert_eq!(content["gap"], "1rem");
        assert_eq!(
            content["spacing"],
            json!({ "marginBottom": "2rem", "paddingTop": "4rem" })
        );
        assert_eq!(content["children"][0]["id"], "c1");
    }

    #[tokio::test]
    async fn edit_is_visible_in_rendered_page() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);
        let (id, _, container_id) = page_with_container(&app, &token).await;

        let res = app.get_without_token(&routes::rendered("home")).await;
        assert!(res.text.contains("flex-direction:column"));

        app.patch_with_token(
            &routes::container(id, container_id),
            &json!({ "layout": "columns", "columns": 4 }),
            &token,
        )
        .await;

        let res = app.get_without_token(&routes::rendered("home")).await;
        assert!(res.text.contains("grid-template-columns:repeat(4, minmax(0, 1fr))"));
    }

    #[tokio::test]
    async fn non_container_and_bad_values_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);
        let (id, text_id, container_id) = page_with_container(&app, &token).await;

        let res = app
            .patch_with_token(&routes::container(id, text_id), &json!({ "gap": "2rem" }), &token)
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .patch_with_token(&routes::container(id, container_id), &json!({ "columns": 0 }), &token)
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .patch_with_token(
                &routes::container(id, container_id),
                &json!({ "spacing": { "padding": "1rem" } }),
                &token,
            )
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn block_of_another_page_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);
        let (_, _, container_id) = page_with_container(&app, &token).await;
        let other = app.create_page(&token, "other", true).await;

        let res = app
            .patch_with_token(&routes::container(other, container_id), &json!({ "gap": "0" }), &token)
            .await;
        assert_eq!(res.status, 404);
    }
}

mod preview {
    use super::*;

    #[tokio::test]
    async fn renders_known_block_types() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::BLOCK_PREVIEW,
                &json!({
                    "type": "cta",
                    "content_json": {
                        "title": "Join",
                        "buttonText": "Sign up",
                        "buttonUrl": "https://example.com/join",
                        "variant": "outline",
                    },
                }),
            )
            .await;

        assert_eq!(res.status, 200);
        let html = res.body["html"].as_str().unwrap();
        assert!(html.contains("button-outline"));
        assert!(html.contains("target=\"_blank\""));
    }

    #[tokio::test]
    async fn unknown_type_renders_null() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::BLOCK_PREVIEW, &json!({ "type": "marquee", "content_json": {} }))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!({ "html": null }));
    }
}
