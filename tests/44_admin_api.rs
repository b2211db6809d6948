mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestServer;

#[tokio::test]
async fn admin_creates_and_lists_applicants() -> Result<()> {
    let server = TestServer::start().await?;
    let (admin_id, token) = server.admin("agent@example.com").await?;

    let (status, body) = server
        .post(
            "/api/admin/users",
            &token,
            json!({ "email": "Bo@Example.com", "password": "secret1", "full_name": "Bo Chen" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["admin_id"], json!(admin_id));
    server.applicant(admin_id, "ana@example.com", "Ana Diaz").await?;

    let (status, body) = server.get("/api/admin/users", &token).await?;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["data"]
        .as_array()
        .map(|users| users.iter().filter_map(|u| u["full_name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["Ana Diaz", "Bo Chen"]);

    let (_, body) = server.get("/api/admin/users?search=CHEN", &token).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["full_name"], json!("Bo Chen"));
    Ok(())
}

#[tokio::test]
async fn create_requires_email_and_password() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, token) = server.admin("agent@example.com").await?;

    let (status, body) = server
        .post("/api/admin/users", &token, json!({ "email": "  ", "password": "secret1" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Email and password are required"));
    Ok(())
}

#[tokio::test]
async fn applicants_of_another_admin_are_not_found() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, token) = server.admin("agent@example.com").await?;
    let (other_admin, _) = server.admin("rival@example.com").await?;
    let (foreign_id, _) = server.applicant(other_admin, "ana@example.com", "Ana").await?;

    let (status, body) = server.get(&format!("/api/admin/users/{}", foreign_id), &token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("User not found or not in your scope."));

    let (status, _) = server.delete(&format!("/api/admin/users/{}", foreign_id), &token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(server.ctx.store.rows("users").len(), 1);

    let (_, body) = server.get("/api/admin/users", &token).await?;
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn admin_edits_applicant_sections() -> Result<()> {
    let server = TestServer::start().await?;
    let (admin_id, token) = server.admin("agent@example.com").await?;
    let (user_id, applicant_token) = server.applicant(admin_id, "ana@example.com", "Ana").await?;

    let (status, body) = server
        .put(
            &format!("/api/admin/users/{}/sections/educationQualifications", user_id),
            &token,
            json!([{
                "qualification": "Bachelor Degree in Science, Business or Technology",
                "university_college_name": "UTS",
                "course_name": "Bachelor of IT",
                "from_date": "2019-02-01"
            }]),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = server
        .get(&format!("/api/admin/users/{}/sections/educationQualifications", user_id), &token)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["university_college_name"], json!("UTS"));
    assert_eq!(body["data"][0]["to_date"], json!(null));

    // The applicant sees what the admin saved.
    let (_, body) = server.get("/api/app/sections/educationQualifications", &applicant_token).await?;
    assert_eq!(body["data"][0]["course_name"], json!("Bachelor of IT"));

    let (status, body) = server
        .put(&format!("/api/admin/users/{}", user_id), &token, json!({ "studentDetails": { "course_name": "MIT" } }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["saved"], json!(["studentDetails"]));
    Ok(())
}

#[tokio::test]
async fn detail_can_be_printed() -> Result<()> {
    let server = TestServer::start().await?;
    let (admin_id, token) = server.admin("agent@example.com").await?;
    let (user_id, _) = server.applicant(admin_id, "ana@example.com", "Ana Diaz").await?;
    server
        .put(&format!("/api/admin/users/{}", user_id), &token, json!({ "visaApplications": { "passport_no": "P123" } }))
        .await?;

    let (status, body) = server.get(&format!("/api/admin/users/{}", user_id), &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], json!("ana@example.com"));
    assert_eq!(body["data"]["application"]["sections"]["visa_applications"]["passport_no"], json!("P123"));

    let (status, body) = server.get(&format!("/api/admin/users/{}?print=true", user_id), &token).await?;
    assert_eq!(status, StatusCode::OK);
    let print = &body["data"]["print"];
    assert_eq!(print["applicant"], json!("Ana Diaz"));
    assert_eq!(print["tabs"].as_array().map(Vec::len), Some(12));
    assert!(body["data"].get("application").is_none());
    Ok(())
}

#[tokio::test]
async fn delete_removes_applicant_and_their_rows() -> Result<()> {
    let server = TestServer::start().await?;
    let (admin_id, token) = server.admin("agent@example.com").await?;
    let (user_id, _) = server.applicant(admin_id, "ana@example.com", "Ana").await?;
    let (keep_id, _) = server.applicant(admin_id, "bo@example.com", "Bo").await?;
    for id in [user_id, keep_id] {
        server
            .put(&format!("/api/admin/users/{}", id), &token, json!({ "studentDetails": { "course_name": "BIT" } }))
            .await?;
    }

    let (status, body) = server.delete(&format!("/api/admin/users/{}", user_id), &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], json!(true));

    let owners: Vec<_> = server
        .ctx
        .store
        .rows("student_details")
        .iter()
        .filter_map(|row| row.get("user_id").and_then(|v| v.as_str()).map(str::to_string))
        .collect();
    assert_eq!(owners, vec![keep_id.to_string()]);
    assert_eq!(server.ctx.store.rows("users").len(), 1);

    let (status, _) = server.get(&format!("/api/admin/users/{}", user_id), &token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
