use serde_json::json;
use server::utils::jwt::{HEADER_EDIT, PAGE_DELETE, PAGE_EDIT};

use crate::common::{TestApp, routes};

mod page_creation {
    use super::*;

    #[tokio::test]
    async fn editor_can_create_a_page() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT]);

        let res = app
            .post_with_token(
                routes::PAGES,
                &json!({
                    "slug": "about-us",
                    "title": "  About us  ",
                    "seo_title": "About | Studio",
                    "published": true,
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["slug"], "about-us");
        assert_eq!(res.body["title"], "About us");
        assert_eq!(res.body["seo_title"], "About | Studio");
        assert_eq!(res.body["seo_description"], serde_json::Value::Null);
        assert_eq!(res.body["published"], true);
        assert!(res.body["created_at"].is_string());
    }

    #[tokio::test]
    async fn pages_default_to_unpublished() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();

        let res = app
            .post_with_token(routes::PAGES, &json!({ "slug": "draft", "title": "Draft" }), &token)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["published"], false);
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        app.create_page(&token, "home", true).await;

        let res = app
            .post_with_token(routes::PAGES, &json!({ "slug": "home", "title": "Again" }), &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn invalid_slug_and_title_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();

        for body in [
            json!({ "slug": "Not Valid", "title": "T" }),
            json!({ "slug": "", "title": "T" }),
            json!({ "slug": "ok", "title": "   " }),
            json!({ "slug": "ok", "title": "x".repeat(257) }),
        ] {
            let res = app.post_with_token(routes::PAGES, &body, &token).await;
            assert_eq!(res.status, 400, "accepted {body}");
            assert_eq!(res.code(), "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();

        let res = app
            .post_with_token(routes::PAGES, &json!({ "title": "No slug" }), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}

mod page_auth {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::PAGES, &json!({ "slug": "a", "title": "A" }))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_invalid() {
        let app = TestApp::spawn().await;
        let forged = server::utils::jwt::sign("mallory", &[PAGE_EDIT.to_string()], "nope", 1)
            .unwrap();

        let res = app.get_with_token(routes::PAGES, &forged).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn header_editor_cannot_touch_pages() {
        let app = TestApp::spawn().await;
        let token = app.token(&[HEADER_EDIT]);

        let res = app
            .post_with_token(routes::PAGES, &json!({ "slug": "a", "title": "A" }), &token)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "PERMISSION_DENIED");

        let res = app.get_with_token(routes::PAGES, &token).await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn deleting_needs_delete_permission() {
        let app = TestApp::spawn().await;
        let editor = app.token(&[PAGE_EDIT]);
        let id = app.create_page(&editor, "keep", true).await;

        let res = app.delete_with_token(&routes::page(id), &editor).await;
        assert_eq!(res.status, 403);

        let res = app.get_with_token(&routes::page(id), &editor).await;
        assert_eq!(res.status, 200);
    }
}

mod page_listing {
    use super::*;

    #[tokio::test]
    async fn list_paginates_and_searches() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        for slug in ["courses", "clinics", "community", "contact"] {
            app.create_page(&token, slug, true).await;
        }

        let res = app
            .get_with_token(&format!("{}?per_page=3&sort_by=slug&sort_order=asc", routes::PAGES), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 4);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
        let slugs: Vec<&str> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["slug"].as_str().unwrap())
            .collect();
        assert_eq!(slugs, vec!["clinics", "community", "contact"]);

        let res = app
            .get_with_token(&format!("{}?search=COMM", routes::PAGES), &token)
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["slug"], "community");
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        app.create_page(&token, "plain", true).await;

        let res = app
            .get_with_token(&format!("{}?search=%25", routes::PAGES), &token)
            .await;
        assert_eq!(res.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn unknown_sort_field_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();

        let res = app
            .get_with_token(&format!("{}?sort_by=position", routes::PAGES), &token)
            .await;
        assert_eq!(res.status, 400);
    }
}

mod page_update {
    use super::*;

    #[tokio::test]
    async fn patch_updates_only_given_fields() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let created = app
            .post_with_token(
                routes::PAGES,
                &json!({
                    "slug": "about",
                    "title": "About",
                    "seo_title": "Old SEO",
                    "seo_description": "Keep me",
                }),
                &token,
            )
            .await;
        let id = created.id();

        let res = app
            .patch_with_token(
                &routes::page(id),
                &json!({ "seo_title": null, "published": true }),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["seo_title"], serde_json::Value::Null);
        assert_eq!(res.body["seo_description"], "Keep me");
        assert_eq!(res.body["title"], "About");
        assert_eq!(res.body["published"], true);
    }

    #[tokio::test]
    async fn renaming_to_a_taken_slug_conflicts() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        app.create_page(&token, "home", true).await;
        let id = app.create_page(&token, "about", true).await;

        let res = app
            .patch_with_token(&routes::page(id), &json!({ "slug": "home" }), &token)
            .await;
        assert_eq!(res.status, 409);

        let res = app
            .patch_with_token(&routes::page(id), &json!({ "slug": "about" }), &token)
            .await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn slug_change_is_visible_to_public_reads() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let id = app.create_page(&token, "old-name", true).await;

        let res = app.get_without_token(&routes::page_by_slug("old-name")).await;
        assert_eq!(res.status, 200);

        app.patch_with_token(&routes::page(id), &json!({ "slug": "new-name" }), &token)
            .await;

        let res = app.get_without_token(&routes::page_by_slug("old-name")).await;
        assert_eq!(res.status, 404);
        let res = app.get_without_token(&routes::page_by_slug("new-name")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id);
    }

    #[tokio::test]
    async fn missing_page_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();

        let res = app
            .patch_with_token(&routes::page(9999), &json!({ "title": "X" }), &token)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }
}

mod page_deletion {
    use super::*;

    #[tokio::test]
    async fn delete_removes_page_and_blocks() {
        let app = TestApp::spawn().await;
        let token = app.token(&[PAGE_EDIT, PAGE_DELETE]);
        let id = app.create_page(&token, "gone", true).await;
        app.replace_blocks(&token, id, json!([{ "type": "text", "content_json": { "html": "<p>x</p>" } }]))
            .await;

        let res = app.delete_with_token(&routes::page(id), &token).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::page(id), &token).await;
        assert_eq!(res.status, 404);
        let res = app.get_without_token(&routes::page_blocks(id)).await;
        assert_eq!(res.status, 404);

        use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
        use server::entity::page_block;
        let remaining = page_block::Entity::find()
            .filter(page_block::Column::PageId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}

mod public_page {
    use super::*;

    #[tokio::test]
    async fn published_page_is_readable_by_slug() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let id = app.create_page(&token, "courses", true).await;

        let res = app.get_without_token(&routes::page_by_slug("courses")).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["title"], "Page courses");
        assert!(res.body.get("published").is_none());
    }

    #[tokio::test]
    async fn unpublished_and_unknown_slugs_are_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        app.create_page(&token, "draft", false).await;

        let res = app.get_without_token(&routes::page_by_slug("draft")).await;
        assert_eq!(res.status, 404);
        let res = app.get_without_token(&routes::page_by_slug("missing")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn publishing_invalidates_cached_page() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let id = app.create_page(&token, "soon", false).await;

        let res = app.get_without_token(&routes::page_by_slug("soon")).await;
        assert_eq!(res.status, 404);

        app.patch_with_token(&routes::page(id), &json!({ "published": true }), &token)
            .await;

        let res = app.get_without_token(&routes::page_by_slug("soon")).await;
        assert_eq!(res.status, 200);
    }
}
