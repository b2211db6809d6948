mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestServer;

#[tokio::test]
async fn fresh_application_has_blank_single_sections() -> Result<()> {
    let server = TestServer::start().await?;
    let (admin_id, _) = server.admin("agent@example.com").await?;
    let (_, token) = server.applicant(admin_id, "ana@example.com", "Ana").await?;

    let (status, body) = server.get("/api/app", &token).await?;
    assert_eq!(status, StatusCode::OK);
    let sections = &body["data"]["sections"];
    assert_eq!(sections["visa_applications"]["given_name"], json!(""));
    assert_eq!(sections["visa_applications"]["date_of_birth"], json!(null));
    assert_eq!(sections["travel_history"], json!([]));
    Ok(())
}

#[tokio::test]
async fn section_round_trip_normalizes_blank_dates() -> Result<()> {
    let server = TestServer::start().await?;
    let (admin_id, _) = server.admin("agent@example.com").await?;
    let (user_id, token) = server.applicant(admin_id, "ana@example.com", "Ana").await?;

    let (status, body) = server
        .put(
            "/api/app/sections/visaApplications",
            &token,
            json!({ "given_name": "Ana", "family_name": "Lee", "date_of_birth": "" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["given_name"], json!("Ana"));

    let stored = server.ctx.store.rows("visa_applications");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["date_of_birth"], json!(null));
    assert_eq!(stored[0]["user_id"], json!(user_id.to_string()));
    Ok(())
}

#[tokio::test]
async fn repeatable_section_is_replaced_wholesale() -> Result<()> {
    let server = TestServer::start().await?;
    let (admin_id, _) = server.admin("agent@example.com").await?;
    let (_, token) = server.applicant(admin_id, "ana@example.com", "Ana").await?;

    let trip = |country: &str| {
        json!({ "country": country, "from_date": "2022-01-01", "to_date": "2022-01-20", "reason_for_visit": "Holiday or Leisure" })
    };
    server.put("/api/app/sections/travelHistory", &token, json!([trip("NZ"), trip("FJ")])).await?;
    let (status, body) = server.put("/api/app/sections/travelHistory", &token, json!([trip("JP")])).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["country"], json!("JP"));

    let (_, body) = server.put("/api/app/sections/travelHistory", &token, json!([])).await?;
    assert_eq!(body["data"], json!([]));
    assert!(server.ctx.store.rows("travel_history").is_empty());
    Ok(())
}

#[tokio::test]
async fn invalid_fields_come_back_as_field_errors() -> Result<()> {
    let server = TestServer::start().await?;
    let (admin_id, _) = server.admin("agent@example.com").await?;
    let (_, token) = server.applicant(admin_id, "ana@example.com", "Ana").await?;

    let (status, body) = server
        .put(
            "/api/app",
            &token,
            json!({ "familyMembers": [{ "full_name": "", "relationship": "Sister" }] }),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], json!("Please fix the highlighted errors before saving."));
    assert_eq!(body["field_errors"]["familyMembers.0.full_name"], json!("This field is required"));
    assert!(server.ctx.store.rows("family_members").is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_sections_and_fields_are_rejected() -> Result<()> {
    let server = TestServer::start().await?;
    let (admin_id, _) = server.admin("agent@example.com").await?;
    let (_, token) = server.applicant(admin_id, "ana@example.com", "Ana").await?;

    let (status, _) = server.get("/api/app/sections/pets", &token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server
        .put("/api/app/sections/studentDetails", &token, json!({ "favourite_colour": "blue" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("favourite_colour"));
    Ok(())
}

#[tokio::test]
async fn save_failure_names_the_section() -> Result<()> {
    let server = TestServer::start().await?;
    let (admin_id, _) = server.admin("agent@example.com").await?;
    let (_, token) = server.applicant(admin_id, "ana@example.com", "Ana").await?;
    server.ctx.store.fail_on(
        visa_portal_api::store::StoreOp::Upsert,
        "student_details",
        "new row violates row-level security policy",
    );

    let (status, body) = server
        .put("/api/app", &token, json!({ "visaApplications": { "given_name": "Ana" }, "studentDetails": { "course_name": "BIT" } }))
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], json!("Error saving Student Details: new row violates row-level security policy"));
    assert_eq!(server.ctx.store.rows("visa_applications").len(), 1);
    Ok(())
}
