use serde_json::json;

use crate::common::{TestApp, routes};

mod signup {
    use super::*;

    #[tokio::test]
    async fn creates_an_account() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::SIGNUP,
                &json!({
                    "email": "alice@example.com",
                    "name": "Alice",
                    "password": "hunter2",
                }),
            )
            .await;

        assert_eq!(res.status, 201);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn rejects_an_invalid_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::SIGNUP,
                &json!({
                    "email": "not-an-email",
                    "name": "Alice",
                    "password": "hunter2",
                }),
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.violation_fields().contains(&"email".to_string()));
    }

    #[tokio::test]
    async fn reports_every_violation() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::SIGNUP,
                &json!({
                    "email": "nope",
                    "name": "",
                    "password": "ab",
                }),
            )
            .await;

        assert_eq!(res.status, 422);
        let fields = res.violation_fields();
        assert!(fields.contains(&"email".to_string()));
        assert!(fields.contains(&"name".to_string()));
        assert!(fields.contains(&"password".to_string()));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let app = TestApp::spawn().await;
        let body = json!({
            "email": "taken@example.com",
            "name": "First",
            "password": "hunter2",
        });

        let first = app.post_json(routes::SIGNUP, &body).await;
        assert_eq!(first.status, 201);

        let second = app.post_json(routes::SIGNUP, &body).await;
        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "EMAIL_TAKEN");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn returns_a_usable_token() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("bob@example.com", "hunter2")
            .await;

        let res = app.get_with_token(routes::STATUS, &token).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn wrong_password_is_a_uniform_denial() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("carol@example.com", "hunter2")
            .await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({
                    "email": "carol@example.com",
                    "password": "wrong-password",
                }),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_gets_the_same_denial() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({
                    "email": "ghost@example.com",
                    "password": "whatever5",
                }),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn new_accounts_start_with_the_default_status() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("dave@example.com", "hunter2")
            .await;

        let res = app.get_with_token(routes::STATUS, &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "I am new!");
    }

    #[tokio::test]
    async fn status_can_be_updated() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("erin@example.com", "hunter2")
            .await;

        let res = app
            .put_json_with_token(routes::STATUS, &json!({ "status": "Writing posts" }), &token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "Writing posts");

        let read_back = app.get_with_token(routes::STATUS, &token).await;
        assert_eq!(read_back.body["status"], "Writing posts");
    }

    #[tokio::test]
    async fn empty_status_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("frank@example.com", "hunter2")
            .await;

        let res = app
            .put_json_with_token(routes::STATUS, &json!({ "status": "   " }), &token)
            .await;
        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::STATUS).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::STATUS, "garbage-token").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
