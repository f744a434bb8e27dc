use ::common::{DuplicatePolicy, PackKind};
use serde_json::json;

use crate::common::{TestApp, routes};

mod versions {
    use super::*;

    #[tokio::test]
    async fn editor_can_create_and_fetch_a_direct_version() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        let res = app
            .post_with_token(
                &routes::versions("direct"),
                &json!({"pack": {"directSystemPrompt": "Be helpful."}, "note": "first"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let version = &res.body["version"];
        assert_eq!(
            version["sha256"],
            "6811cef912471355efe019e66ec89819d868883f42c412adbdab1a2c18a5b13c"
        );
        assert_eq!(version["createdBy"], json!({"id": "u1", "username": "alice"}));
        assert_eq!(version["note"], "first");
        assert_eq!(version["sequence"], 1);
        assert!(version["createdAt"].is_i64());
        assert!(res.body["active"].is_null());

        let id = version["versionId"].as_str().unwrap();
        let fetched = app
            .get_with_token(&routes::version("direct", id), &token)
            .await;
        assert_eq!(fetched.status, 200);
        assert_eq!(&fetched.body, version);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_omits_pack_content() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        for i in 1..=3 {
            app.create_version(
                "workflow",
                json!({"plannerSystemPrompt": format!("plan {i}"), "painterSystemPrompt": "paint"}),
                &token,
            )
            .await;
        }

        let res = app
            .get_with_token(&routes::versions("workflow"), &token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["kind"], "workflow");

        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 3);
        let sequences: Vec<i64> = data.iter().map(|m| m["sequence"].as_i64().unwrap()).collect();
        assert_eq!(sequences, vec![3, 2, 1]);
        assert!(data.iter().all(|m| m.get("pack").is_none()));
    }

    #[tokio::test]
    async fn kinds_keep_separate_histories() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        let id = app
            .create_version("direct", json!({"directSystemPrompt": "d"}), &token)
            .await;

        let res = app
            .get_with_token(&routes::versions("workflow"), &token)
            .await;
        assert_eq!(res.body["data"], json!([]));

        let res = app
            .get_with_token(&routes::version("workflow", &id), &token)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn pack_fields_must_match_path_kind() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        let res = app
            .post_with_token(
                &routes::versions("workflow"),
                &json!({"pack": {"directSystemPrompt": "d"}}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_and_nothing_is_stored() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        let res = app
            .post_with_token(
                &routes::versions("direct"),
                &json!({"pack": {"directSystemPrompt": "   "}}),
                &token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        assert!(
            app.registry
                .list_versions(PackKind::Direct)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        let res = app
            .post_with_token(
                &routes::versions("direct"),
                &json!({"pack": {"directSystemPrompt": 42}}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_kind_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        let res = app.get_with_token(&routes::versions("video"), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn reuse_policy_returns_the_existing_version() {
        let app = TestApp::spawn_with_policy(DuplicatePolicy::Reuse).await;
        let token = app.editor_token("u1", "alice");
        let pack = json!({"directSystemPrompt": "same"});

        let first = app.create_version("direct", pack.clone(), &token).await;
        let second = app.create_version("direct", pack, &token).await;

        assert_eq!(first, second);
        let res = app.get_with_token(&routes::versions("direct"), &token).await;
        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
    }
}

mod activation {
    use super::*;

    #[tokio::test]
    async fn pointer_is_unset_before_first_activation() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        let res = app.get_with_token(&routes::active("direct"), &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!({"state": "unset"}));

        let res = app
            .get_with_token(&routes::active_pack("direct"), &token)
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn activating_a_version_records_the_actor() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");
        let id = app
            .create_version("direct", json!({"directSystemPrompt": "Be helpful."}), &token)
            .await;

        let res = app
            .put_with_token(&routes::active("direct"), &json!({"versionId": id}), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["versionId"], id.as_str());

        let res = app.get_with_token(&routes::active("direct"), &token).await;
        assert_eq!(res.body["state"], "active");
        assert_eq!(res.body["versionId"], id.as_str());
        assert_eq!(res.body["updatedBy"], json!({"id": "u1", "username": "alice"}));

        let res = app
            .get_with_token(&routes::active_pack("direct"), &token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pack"]["directSystemPrompt"], "Be helpful.");
    }

    #[tokio::test]
    async fn unknown_version_is_rejected_and_pointer_unchanged() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        let res = app
            .put_with_token(
                &routes::active("direct"),
                &json!({"versionId": "nonexistent-id"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "UNKNOWN_VERSION");

        let res = app.get_with_token(&routes::active("direct"), &token).await;
        assert_eq!(res.body, json!({"state": "unset"}));

        let id = app
            .create_version("direct", json!({"directSystemPrompt": "v1"}), &token)
            .await;
        app.put_with_token(&routes::active("direct"), &json!({"versionId": id}), &token)
            .await;
        let before = app.get_with_token(&routes::active("direct"), &token).await;

        let res = app
            .put_with_token(
                &routes::active("direct"),
                &json!({"versionId": "nonexistent-id"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 422);

        let after = app.get_with_token(&routes::active("direct"), &token).await;
        assert_eq!(after.body, before.body);
    }

    #[tokio::test]
    async fn blank_version_id_is_an_unknown_version() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        for blank in ["", "   "] {
            let res = app
                .put_with_token(&routes::active("direct"), &json!({"versionId": blank}), &token)
                .await;
            assert_eq!(res.status, 422, "{}", res.text);
            assert_eq!(res.body["code"], "UNKNOWN_VERSION");
        }

        let res = app.get_with_token(&routes::active("direct"), &token).await;
        assert_eq!(res.body, json!({"state": "unset"}));
    }

    #[tokio::test]
    async fn create_with_activate_flag_moves_pointer() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        let res = app
            .post_with_token(
                &routes::versions("workflow"),
                &json!({
                    "pack": {"plannerSystemPrompt": "plan", "painterSystemPrompt": "paint"},
                    "activate": true
                }),
                &token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["active"]["versionId"], res.body["version"]["versionId"]);

        let active = app.get_with_token(&routes::active("workflow"), &token).await;
        assert_eq!(active.body["versionId"], res.body["version"]["versionId"]);
    }

    #[tokio::test]
    async fn concurrent_activations_settle_on_one_version() {
        let app = TestApp::spawn().await;
        let token = app.editor_token("u1", "alice");

        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(
                app.create_version("direct", json!({"directSystemPrompt": format!("p{i}")}), &token)
                    .await,
            );
        }

        let path = routes::active("direct");
        let bodies: Vec<_> = ids.iter().map(|id| json!({"versionId": id})).collect();
        let requests = bodies
            .iter()
            .map(|body| app.put_with_token(&path, body, &token));
        for res in futures::future::join_all(requests).await {
            assert_eq!(res.status, 200);
        }

        let res = app.get_with_token(&path, &token).await;
        let winner = res.body["versionId"].as_str().unwrap().to_string();
        assert!(ids.contains(&winner));
    }
}

mod authorization {
    use super::*;

    #[tokio::test]
    async fn requests_without_token_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::versions("direct")).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn tokens_signed_with_another_secret_are_rejected() {
        let app = TestApp::spawn().await;
        let forged = server::utils::jwt::sign(
            "u1",
            "alice",
            vec!["prompt:read".into()],
            chrono::Duration::hours(1),
            "not-the-server-secret",
        )
        .unwrap();

        let res = app.get_with_token(&routes::versions("direct"), &forged).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn reader_cannot_create_or_activate() {
        let app = TestApp::spawn().await;
        let editor = app.editor_token("u1", "alice");
        let reader = app.token_with("u2", "bob", &["prompt:read"]);
        let id = app
            .create_version("direct", json!({"directSystemPrompt": "x"}), &editor)
            .await;

        let res = app
            .post_with_token(
                &routes::versions("direct"),
                &json!({"pack": {"directSystemPrompt": "y"}}),
                &reader,
            )
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app
            .put_with_token(&routes::active("direct"), &json!({"versionId": id}), &reader)
            .await;
        assert_eq!(res.status, 403);

        let res = app.get_with_token(&routes::versions("direct"), &reader).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn writer_without_activate_permission_cannot_create_and_activate() {
        let app = TestApp::spawn().await;
        let writer = app.token_with("u3", "carol", &["prompt:read", "prompt:write"]);

        let res = app
            .post_with_token(
                &routes::versions("direct"),
                &json!({"pack": {"directSystemPrompt": "x"}, "activate": true}),
                &writer,
            )
            .await;
        assert_eq!(res.status, 403);

        let res = app.get_with_token(&routes::versions("direct"), &writer).await;
        assert_eq!(res.body["data"], json!([]));
    }
}

#[tokio::test]
async fn openapi_document_lists_prompt_routes() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::OPENAPI).await;

    assert_eq!(res.status, 200);
    let paths = res.body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/v1/prompts/{kind}/versions"));
    assert!(paths.contains_key("/api/v1/prompts/{kind}/active"));
}
