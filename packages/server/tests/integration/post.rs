use std::time::Duration;

use serde_json::json;

use crate::common::{TestApp, routes};

/// Minimal bytes posing as a PNG; the store never sniffs content.
fn fake_png() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\nfake image bytes".to_vec()
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn created_post_round_trips_through_get() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("author@example.com", "hunter2")
            .await;

        let res = app
            .create_post_form("My first post", "Hello, feed!", None, Some(&token))
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["title"], "My first post");
        assert_eq!(res.body["content"], "Hello, feed!");
        assert_eq!(res.body["creator"]["name"], "author");
        assert!(res.body["created_at"].is_string());
        assert!(res.body["updated_at"].is_string());
        assert!(res.body["file_ref"].is_null());

        let id = res.id();
        let fetched = app.get(&routes::post(id)).await;
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.body["title"], "My first post");
        assert_eq!(fetched.body["content"], "Hello, feed!");
        assert_eq!(fetched.body["creator"]["id"], res.body["creator"]["id"]);
    }

    #[tokio::test]
    async fn a_three_character_title_is_accepted() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("short@example.com", "hunter2")
            .await;

        let res = app
            .create_post_form("abc", "Content that is long enough.", None, Some(&token))
            .await;
        assert_eq!(res.status, 201);
    }

    #[tokio::test]
    async fn short_title_fails_mentioning_the_title_field() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("short2@example.com", "hunter2")
            .await;

        let res = app
            .create_post_form("ab", "Content that is long enough.", None, Some(&token))
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.violation_fields().contains(&"title".to_string()));
    }

    #[tokio::test]
    async fn title_and_content_violations_are_reported_together() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("both@example.com", "hunter2")
            .await;

        let res = app.create_post_form("x", "y", None, Some(&token)).await;

        assert_eq!(res.status, 422);
        let fields = res.violation_fields();
        assert!(fields.contains(&"title".to_string()));
        assert!(fields.contains(&"content".to_string()));
    }

    #[tokio::test]
    async fn requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .create_post_form("A title", "Some content here.", None, None)
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn an_uploaded_image_is_stored_and_downloadable() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("pic@example.com", "hunter2")
            .await;

        let res = app
            .create_post_form(
                "With image",
                "This one has a picture.",
                Some(("photo.png", fake_png(), "image/png")),
                Some(&token),
            )
            .await;

        assert_eq!(res.status, 201);
        let file_ref = res.body["file_ref"]
            .as_str()
            .expect("post should carry a file_ref")
            .to_string();

        let download = app.get(&routes::file(&file_ref)).await;
        assert_eq!(download.status, 200);
        assert!(download.text.contains("fake image bytes"));
    }

    #[tokio::test]
    async fn disallowed_content_type_is_dropped_silently() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("mime@example.com", "hunter2")
            .await;

        let res = app
            .create_post_form(
                "Sneaky upload",
                "Attached a text file as an image.",
                Some(("note.txt", b"plain text".to_vec(), "text/plain")),
                Some(&token),
            )
            .await;

        // The post goes through; the upload quietly does not.
        assert_eq!(res.status, 201);
        assert!(res.body["file_ref"].is_null());
    }
}

mod listing {
    use super::*;

    /// Create five posts with strictly increasing creation times.
    async fn seed_five_posts(app: &TestApp, token: &str) -> Vec<i32> {
        let mut ids = Vec::new();
        for i in 1..=5 {
            ids.push(app.create_post(token, &format!("Post number {i}")).await);
            // Keep created_at strictly ordered even on a fast machine.
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        ids
    }

    #[tokio::test]
    async fn first_page_returns_newest_two_of_five() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("lister@example.com", "hunter2")
            .await;
        seed_five_posts(&app, &token).await;

        let res = app.get(&format!("{}?page=1", routes::POSTS)).await;
        assert_eq!(res.status, 200);

        let posts = res.body["posts"].as_array().unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0]["title"], "Post number 5");
        assert_eq!(posts[1]["title"], "Post number 4");

        let pagination = &res.body["pagination"];
        assert_eq!(pagination["total"], 5);
        assert_eq!(pagination["total_pages"], 3);
        assert_eq!(pagination["has_next_page"], true);
        assert_eq!(pagination["has_prev_page"], false);
    }

    #[tokio::test]
    async fn last_page_holds_the_oldest_post() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("lister2@example.com", "hunter2")
            .await;
        seed_five_posts(&app, &token).await;

        let res = app.get(&format!("{}?page=3", routes::POSTS)).await;
        assert_eq!(res.status, 200);

        let posts = res.body["posts"].as_array().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["title"], "Post number 1");
        assert_eq!(res.body["pagination"]["has_next_page"], false);
        assert_eq!(res.body["pagination"]["has_prev_page"], true);
    }

    #[tokio::test]
    async fn page_beyond_the_end_is_empty_not_an_error() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("lister3@example.com", "hunter2")
            .await;
        seed_five_posts(&app, &token).await;

        let res = app.get(&format!("{}?page=9", routes::POSTS)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["posts"].as_array().unwrap().len(), 0);
        assert_eq!(res.body["pagination"]["total"], 5);
        assert_eq!(res.body["pagination"]["has_next_page"], false);
    }

    #[tokio::test]
    async fn creator_filter_restricts_to_one_author() {
        let app = TestApp::spawn().await;
        let token_a = app
            .create_authenticated_user("author-a@example.com", "hunter2")
            .await;
        let token_b = app
            .create_authenticated_user("author-b@example.com", "hunter2")
            .await;

        app.create_post(&token_a, "Post by A").await;
        let b_post = app.create_post(&token_b, "Post by B").await;

        let fetched = app.get(&routes::post(b_post)).await;
        let b_id = fetched.body["creator"]["id"].as_i64().unwrap();

        let res = app
            .get(&format!("{}?creator={b_id}&per_page=10", routes::POSTS))
            .await;
        assert_eq!(res.status, 200);

        let posts = res.body["posts"].as_array().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["title"], "Post by B");
        assert_eq!(res.body["pagination"]["total"], 1);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn owner_can_update_title_and_content() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("editor@example.com", "hunter2")
            .await;
        let id = app.create_post(&token, "Original title").await;

        let res = app
            .update_post_form(id, "Updated title", "Updated content body.", None, &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Updated title");
        assert_eq!(res.body["content"], "Updated content body.");

        let fetched = app.get(&routes::post(id)).await;
        assert_eq!(fetched.body["title"], "Updated title");
    }

    #[tokio::test]
    async fn non_owner_is_forbidden_and_post_is_untouched() {
        let app = TestApp::spawn().await;
        let owner = app
            .create_authenticated_user("owner@example.com", "hunter2")
            .await;
        let intruder = app
            .create_authenticated_user("intruder@example.com", "hunter2")
            .await;
        let id = app.create_post(&owner, "Owned post").await;

        let res = app
            .update_post_form(id, "Hijacked title", "Hijacked content.", None, &intruder)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "FORBIDDEN");

        let fetched = app.get(&routes::post(id)).await;
        assert_eq!(fetched.body["title"], "Owned post");
    }

    #[tokio::test]
    async fn updating_a_missing_post_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("editor2@example.com", "hunter2")
            .await;

        let res = app
            .update_post_form(999_999, "A title", "Some content.", None, &token)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn validation_applies_to_updates_too() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("editor3@example.com", "hunter2")
            .await;
        let id = app.create_post(&token, "Valid title").await;

        let res = app.update_post_form(id, "ab", "ok content", None, &token).await;
        assert_eq!(res.status, 422);
        assert!(res.violation_fields().contains(&"title".to_string()));
    }

    #[tokio::test]
    async fn replacing_the_image_swaps_the_reference_and_reaps_the_old_blob() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("swapper@example.com", "hunter2")
            .await;

        let created = app
            .create_post_form(
                "Image post",
                "Will get a new image.",
                Some(("old.png", fake_png(), "image/png")),
                Some(&token),
            )
            .await;
        assert_eq!(created.status, 201);
        let id = created.id();
        let old_ref = created.body["file_ref"].as_str().unwrap().to_string();

        let updated = app
            .update_post_form(
                id,
                "Image post",
                "Will get a new image.",
                Some(("new.jpg", b"new jpeg bytes".to_vec(), "image/jpeg")),
                &token,
            )
            .await;
        assert_eq!(updated.status, 200);

        let new_ref = updated.body["file_ref"].as_str().unwrap().to_string();
        assert_ne!(new_ref, old_ref);

        let fetched = app.get(&routes::post(id)).await;
        assert_eq!(fetched.body["file_ref"], new_ref.as_str());

        // Old blob cleanup is best-effort; poll instead of asserting at once.
        let mut old_gone = false;
        for _ in 0..20 {
            if app.get(&routes::file(&old_ref)).await.status == 404 {
                old_gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(old_gone, "old blob was never deleted");

        let download = app.get(&routes::file(&new_ref)).await;
        assert_eq!(download.status, 200);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_returns_the_final_state_and_get_becomes_not_found() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("deleter@example.com", "hunter2")
            .await;
        let id = app.create_post(&token, "Doomed post").await;

        let res = app.delete_with_token(&routes::post(id), &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Doomed post");
        assert_eq!(res.body["id"], id);

        let fetched = app.get(&routes::post(id)).await;
        assert_eq!(fetched.status, 404);
        assert_eq!(fetched.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn owner_listing_no_longer_contains_the_deleted_post() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("deleter2@example.com", "hunter2")
            .await;
        let keep = app.create_post(&token, "Keeper post").await;
        let doomed = app.create_post(&token, "Doomed post").await;

        let creator_id = app.get(&routes::post(keep)).await.body["creator"]["id"]
            .as_i64()
            .unwrap();

        let res = app.delete_with_token(&routes::post(doomed), &token).await;
        assert_eq!(res.status, 200);

        let listing = app
            .get(&format!("{}?creator={creator_id}&per_page=10", routes::POSTS))
            .await;
        let ids: Vec<i64> = listing.body["posts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_i64().unwrap())
            .collect();
        assert!(ids.contains(&(keep as i64)));
        assert!(!ids.contains(&(doomed as i64)));
    }

    #[tokio::test]
    async fn second_delete_fails_closed_with_not_found() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("deleter3@example.com", "hunter2")
            .await;
        let id = app.create_post(&token, "Delete me twice").await;

        let first = app.delete_with_token(&routes::post(id), &token).await;
        assert_eq!(first.status, 200);

        let second = app.delete_with_token(&routes::post(id), &token).await;
        assert_eq!(second.status, 404);
        assert_eq!(second.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let app = TestApp::spawn().await;
        let owner = app
            .create_authenticated_user("owner2@example.com", "hunter2")
            .await;
        let intruder = app
            .create_authenticated_user("intruder2@example.com", "hunter2")
            .await;
        let id = app.create_post(&owner, "Protected post").await;

        let res = app.delete_with_token(&routes::post(id), &intruder).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "FORBIDDEN");

        let fetched = app.get(&routes::post(id)).await;
        assert_eq!(fetched.status, 200);
    }

    #[tokio::test]
    async fn deleting_a_post_reaps_its_blob() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("deleter4@example.com", "hunter2")
            .await;

        let created = app
            .create_post_form(
                "Post with image",
                "Image dies with the post.",
                Some(("pic.png", fake_png(), "image/png")),
                Some(&token),
            )
            .await;
        let id = created.id();
        let file_ref = created.body["file_ref"].as_str().unwrap().to_string();

        let res = app.delete_with_token(&routes::post(id), &token).await;
        assert_eq!(res.status, 200);

        let mut gone = false;
        for _ in 0..20 {
            if app.get(&routes::file(&file_ref)).await.status == 404 {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(gone, "blob was never deleted");
    }
}
