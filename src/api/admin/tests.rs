use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

const KEY_QUERY: &str = "programme=BTech&subject_code=CS201&subject_name=Data%20Structures\
    &exam_type=Midterm&semester=3&academic_year=2025-26";

async fn save(
    ctx: &test_support::TestContext,
    token: &str,
    exam_id: i64,
    payload: serde_json::Value,
) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/marks"),
            Some(token),
            Some(payload),
        ))
        .await
        .expect("save marks");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
}

#[tokio::test]
#[ignore = "requires postgres"]
async fn combined_view_merges_member_exams_by_roll_and_label() {
    let ctx = test_support::setup_test_context().await;
    let teacher_a = test_support::insert_teacher(ctx.state.db(), "alice@example.edu").await;
    let teacher_b = test_support::insert_teacher(ctx.state.db(), "bob@example.edu").await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.edu").await;
    let first = test_support::insert_exam(ctx.state.db(), teacher_a.id, "CS201").await;
    let second = test_support::insert_exam(ctx.state.db(), teacher_b.id, "CS201").await;

    let token_a = test_support::bearer_token(teacher_a.id, ctx.state.settings());
    let token_b = test_support::bearer_token(teacher_b.id, ctx.state.settings());
    save(
        &ctx,
        &token_a,
        first.id,
        json!({
            "questions": [{"label": "Q1", "max_marks": 10}],
            "students": [{"roll_no": 1, "marks": {"Q1": 6}}, {"roll_no": 2, "marks": {"Q1": 9}}]
        }),
    )
    .await;
    save(
        &ctx,
        &token_b,
        second.id,
        json!({
            "questions": [{"label": "Q1", "max_marks": 10}, {"label": "Q2", "max_marks": 5}],
            "students": [
                {"roll_no": 2, "absent": true, "marks": {"Q1": null}},
                {"roll_no": 3, "marks": {"Q1": 4, "Q2": 5}}
            ]
        }),
    )
    .await;

    let admin_token = test_support::bearer_token(admin.id, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/admin/exams/combined/marks?{KEY_QUERY}"),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("combined marks");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    assert_eq!(body["member_exam_ids"], json!([first.id, second.id]));
    assert_eq!(body["exam"]["id"], first.id);

    let labels: Vec<&str> = body["questions"]
        .as_array()
        .expect("questions")
        .iter()
        .map(|question| question["label"].as_str().expect("label"))
        .collect();
    assert_eq!(labels, vec!["Q1", "Q2"]);

    let students = body["students"].as_array().expect("students");
    assert_eq!(students.len(), 3);
    let roll_two = students.iter().find(|student| student["roll_no"] == 2).expect("roll 2");
    assert_eq!(roll_two["absent"], true);

    let roll_two_q1 = body["marks"]
        .as_array()
        .expect("marks")
        .iter()
        .find(|mark| mark["roll_no"] == 2 && mark["question_label"] == "Q1")
        .expect("roll 2 Q1");
    assert_eq!(roll_two_q1["marks"], 9.0);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/admin/exams/combined/export?{KEY_QUERY}"),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("combined export");
    assert_eq!(response.status(), StatusCode::OK);
    let csv = test_support::read_text(response).await;
    assert!(csv.contains("Roll No,Absent,Q1,Total_Q1,Q2,Total_Q2,Grand_Total\n"));
    assert!(csv.contains("\n2,AB,9,9,,0,9\n"));
    assert!(csv.contains("\n3,,4,4,5,5,9\n"));
}

#[tokio::test]
#[ignore = "requires postgres"]
async fn combined_surfaces_are_admin_only() {
    let ctx = test_support::setup_test_context().await;
    let teacher = test_support::insert_teacher(ctx.state.db(), "alice@example.edu").await;
    test_support::insert_exam(ctx.state.db(), teacher.id, "CS201").await;
    let token = test_support::bearer_token(teacher.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/admin/exams/combined/marks?{KEY_QUERY}"),
            Some(&token),
            None,
        ))
        .await
        .expect("combined marks");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires postgres"]
async fn unknown_logical_key_is_not_found() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.edu").await;
    let token = test_support::bearer_token(admin.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/admin/exams/combined/marks?{KEY_QUERY}"),
            Some(&token),
            None,
        ))
        .await
        .expect("combined marks");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
