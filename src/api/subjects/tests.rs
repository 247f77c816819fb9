use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

async fn add(
    ctx: &test_support::TestContext,
    token: &str,
    payload: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/subjects/catalog",
            Some(token),
            Some(payload),
        ))
        .await
        .expect("add subject");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

async fn get(
    ctx: &test_support::TestContext,
    token: &str,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, uri, Some(token), None))
        .await
        .expect("get");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

#[tokio::test]
#[ignore = "requires postgres"]
async fn catalog_lists_active_subjects_by_programme_and_semester() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.edu").await;
    let teacher = test_support::insert_teacher(ctx.state.db(), "alice@example.edu").await;
    let admin_token = test_support::bearer_token(admin.id, ctx.state.settings());
    let teacher_token = test_support::bearer_token(teacher.id, ctx.state.settings());

    for (programme, semester, code, name) in [
        ("BTech", 3, "cs202", "Operating Systems"),
        ("BTech", 3, "CS201", "Data Structures"),
        ("BTech", 5, "CS301", "Compilers"),
        ("MSc IT", 1, "IT101", "Networks"),
    ] {
        let (status, body) = add(
            &ctx,
            &admin_token,
            json!({
                "programme": programme,
                "semester": semester,
                "subject_code": code,
                "subject_name": name
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "response: {body}");
    }

    let (status, body) =
        get(&ctx, &teacher_token, "/api/v1/subjects/catalog?programme=BTech&semester=3").await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    let codes: Vec<&str> = body
        .as_array()
        .expect("subjects")
        .iter()
        .map(|subject| subject["subject_code"].as_str().expect("code"))
        .collect();
    assert_eq!(codes, vec!["CS201", "CS202"]);

    let (_, programmes) = get(&ctx, &teacher_token, "/api/v1/subjects/programmes").await;
    assert_eq!(programmes, json!(["BTech", "MSc IT"]));

    let (_, semesters) =
        get(&ctx, &teacher_token, "/api/v1/subjects/valid-semesters?programme=BTech").await;
    assert_eq!(semesters, json!([3, 5]));
}

#[tokio::test]
#[ignore = "requires postgres"]
async fn duplicate_active_subject_is_rejected_until_deactivated() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.edu").await;
    let token = test_support::bearer_token(admin.id, ctx.state.settings());
    let payload = json!({
        "programme": "BTech",
        "semester": 3,
        "subject_code": "CS201",
        "subject_name": "Data Structures"
    });

    let (status, created) = add(&ctx, &token, payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");

    let mut lower_case = payload.clone();
    lower_case["subject_code"] = json!("cs201");
    let (status, body) = add(&ctx, &token, lower_case).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Subject already exists for this programme and semester");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/subjects/catalog/{}", created["id"]),
            Some(&token),
            None,
        ))
        .await
        .expect("deactivate");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/subjects/catalog/{}", created["id"]),
            Some(&token),
            None,
        ))
        .await
        .expect("deactivate again");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_, listed) =
        get(&ctx, &token, "/api/v1/subjects/catalog?programme=BTech&semester=3").await;
    assert_eq!(listed, json!([]));

    let (status, body) = add(&ctx, &token, payload).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_ne!(body["id"], created["id"]);
}

#[tokio::test]
#[ignore = "requires postgres"]
async fn catalog_changes_and_search_are_admin_only() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.edu").await;
    let teacher = test_support::insert_teacher(ctx.state.db(), "alice@example.edu").await;
    let admin_token = test_support::bearer_token(admin.id, ctx.state.settings());
    let teacher_token = test_support::bearer_token(teacher.id, ctx.state.settings());

    let (status, _) = add(
        &ctx,
        &teacher_token,
        json!({
            "programme": "BTech",
            "semester": 3,
            "subject_code": "CS201",
            "subject_name": "Data Structures"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = get(&ctx, &teacher_token, "/api/v1/subjects/catalog/search?q=data").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for (semester, code, name) in [
        (3, "CS201", "Data Structures"),
        (4, "CS204", "Database Systems"),
        (4, "CS205", "Networks"),
    ] {
        let (status, body) = add(
            &ctx,
            &admin_token,
            json!({
                "programme": "BTech",
                "semester": semester,
                "subject_code": code,
                "subject_name": name
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "response: {body}");
    }

    let (status, body) =
        get(&ctx, &admin_token, "/api/v1/subjects/catalog/search?q=%20DATA%20").await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    let names: Vec<&str> = body
        .as_array()
        .expect("subjects")
        .iter()
        .map(|subject| subject["subject_name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Data Structures", "Database Systems"]);
}

#[tokio::test]
#[ignore = "requires postgres"]
async fn deactivating_unknown_subject_is_not_found() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.edu").await;
    let token = test_support::bearer_token(admin.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::DELETE,
            "/api/v1/subjects/catalog/999",
            Some(&token),
            None,
        ))
        .await
        .expect("deactivate");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
