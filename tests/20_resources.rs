mod common;

use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{TestServer, SCHOOL_ADMIN, STUDENT, SUPER_ADMIN, TEACHER};
use school_nexus_api::database::{Collection, Record};

#[tokio::test]
async fn create_returns_201_with_id_and_timestamps() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.login(SCHOOL_ADMIN).await?;

    let (status, body) = server
        .post(
            "/api/students",
            &admin,
            json!({ "firstName": "Liam", "lastName": "Chen", "grade": "9", "id": "forged", "createdAt": "1999-01-01" }),
        )
        .await?;

    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    let student = &body["student"];
    let id = student["id"].as_str().unwrap_or_default();
    assert!(id.starts_with("student-"), "unexpected id {}", id);
    assert_ne!(id, "forged");
    assert!(student["createdAt"].is_string());
    assert_eq!(student["createdAt"], student["updatedAt"]);
    assert_ne!(student["createdAt"], "1999-01-01");
    assert_eq!(student["schoolId"], "school-1");
    assert_eq!(body["message"], "Student created successfully");
    Ok(())
}

#[tokio::test]
async fn create_requires_names() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.login(SCHOOL_ADMIN).await?;

    let (status, body) = server.post("/api/teachers", &admin, json!({ "firstName": "Only" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Required fields missing");
    Ok(())
}

#[tokio::test]
async fn missing_records_are_404() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.login(SCHOOL_ADMIN).await?;

    for path in ["/api/students/student-missing", "/api/teachers/nope", "/api/classes/nope", "/api/users/nope"] {
        let (status, _) = server.get(path, &admin).await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} should be missing", path);
    }

    let (status, body) = server.put("/api/students/student-missing", &admin, json!({ "grade": "11" })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Student not found");
    Ok(())
}

#[tokio::test]
async fn update_merges_fields_and_bumps_updated_at() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.login(SCHOOL_ADMIN).await?;

    let (_, before) = server.get("/api/students/student-1", &admin).await?;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let (status, body) = server.put("/api/students/student-1", &admin, json!({ "section": "B" })).await?;
    assert_eq!(status, StatusCode::OK, "update failed: {}", body);

    let after = &body["student"];
    assert_eq!(after["section"], "B");
    assert_eq!(after["firstName"], before["student"]["firstName"]);
    assert_eq!(after["createdAt"], before["student"]["createdAt"]);
    assert_ne!(after["updatedAt"], before["student"]["updatedAt"]);
    Ok(())
}

#[tokio::test]
async fn delete_returns_the_removed_record() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.login(SCHOOL_ADMIN).await?;

    let (status, body) = server.delete("/api/classes/class-1", &admin).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["class"]["id"], "class-1");

    let (status, _) = server.get("/api/classes/class-1", &admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn writes_need_the_right_role() -> Result<()> {
    let server = TestServer::start().await?;
    let teacher = server.login(TEACHER).await?;
    let student = server.login(STUDENT).await?;

    let (status, body) = server
        .post("/api/students", &teacher, json!({ "firstName": "A", "lastName": "B" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Insufficient permissions");

    let (status, _) = server.delete("/api/teachers/teacher-1", &student).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.get("/api/schools", &teacher).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn non_super_admins_stay_in_their_school() -> Result<()> {
    let server = TestServer::start().await?;
    server
        .state
        .store
        .put(
            Collection::Students,
            "student-other",
            Record::new().with("schoolId", "school-2").with("firstName", "Other"),
        )
        .await;

    let admin = server.login(SCHOOL_ADMIN).await?;

    let (status, _) = server.get("/api/students/student-other", &admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = server.get("/api/students?schoolId=school-2", &admin).await?;
    let students = body["students"].as_array().cloned().unwrap_or_default();
    assert!(!students.is_empty());
    assert!(students.iter().all(|s| s["schoolId"] == "school-1"), "leaked: {:?}", students);

    let (status, body) = server
        .post(
            "/api/classes",
            &admin,
            json!({ "name": "Physics", "schoolId": "school-2" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["class"]["schoolId"], "school-1");

    let (status, _) = server.get("/api/schools/school-2", &admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn super_admin_picks_a_school_by_query() -> Result<()> {
    let server = TestServer::start().await?;
    server
        .state
        .store
        .put(
            Collection::Students,
            "student-other",
            Record::new().with("schoolId", "school-2").with("firstName", "Other"),
        )
        .await;
    let root = server.login(SUPER_ADMIN).await?;

    let (_, body) = server.get("/api/students?schoolId=school-2", &root).await?;
    let students = body["students"].as_array().cloned().unwrap_or_default();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["id"], "student-other");

    let (_, body) = server.get("/api/students", &root).await?;
    assert_eq!(body["students"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn schools_are_managed_by_super_admins() -> Result<()> {
    let server = TestServer::start().await?;
    let root = server.login(SUPER_ADMIN).await?;

    let (status, body) = server
        .post(
            "/api/schools",
            &root,
            json!({
                "name": "Hillside Academy",
                "address": "1 Hill Rd",
                "phone": "555-0100",
                "email": "office@hillside.edu",
                "subscriptionPlan": "premium"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "create school failed: {}", body);
    assert_eq!(body["school"]["maxStudents"], 2000);
    assert_eq!(body["school"]["subscriptionStatus"], "active");

    let (_, body) = server.get("/api/schools", &root).await?;
    assert_eq!(body["schools"].as_array().map(Vec::len), Some(3));

    let admin = server.login(SCHOOL_ADMIN).await?;
    let (status, body) = server.get("/api/schools/school-1/stats", &admin).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["totalStudents"], 1);
    assert_eq!(body["stats"]["totalTeachers"], 1);
    Ok(())
}

#[tokio::test]
async fn users_never_expose_password_hashes() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.login(SCHOOL_ADMIN).await?;

    let (status, body) = server.get("/api/users", &admin).await?;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().cloned().unwrap_or_default();
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| u.get("password").is_none()));

    let (status, _) = server.put("/api/users/user-2", &admin, json!({ "role": "super-admin" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.put("/api/users/user-2", &admin, json!({ "email": STUDENT })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}
