mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{TestServer, SCHOOL_ADMIN, STUDENT, SUPER_ADMIN, TEACHER};
use school_nexus_api::database::{Collection, Record};

/// A class of another school with one absent entry on record
async fn foreign_class(server: &TestServer) {
    let class = Record::new().with("schoolId", "school-2").with("name", "Secret Class");
    server.state.store.put(Collection::Classes, "class-9", class).await;
    let sheet = Record::new()
        .with("schoolId", "school-2")
        .with("classId", "class-9")
        .with("date", "2024-12-02")
        .with("records", json!([{ "studentId": "student-9", "status": "absent" }]));
    server
        .state
        .store
        .put(Collection::Attendance, "attendance-class-9-2024-12-02", sheet)
        .await;
}

fn sheet(statuses: &[&str]) -> Value {
    let records: Vec<Value> = statuses
        .iter()
        .map(|status| json!({ "studentId": "student-1", "status": status }))
        .collect();
    json!({ "records": records })
}

#[tokio::test]
async fn attendance_is_marked_per_class_and_day() -> Result<()> {
    let server = TestServer::start().await?;
    let teacher = server.login(TEACHER).await?;

    let (status, body) = server.get("/api/attendance/class/class-1/2024-12-02", &teacher).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["attendance"].is_null());

    let (status, body) = server
        .post("/api/attendance/class/class-1/2024-12-02", &teacher, sheet(&["present"]))
        .await?;
    assert_eq!(status, StatusCode::OK, "mark failed: {}", body);
    assert_eq!(body["attendance"]["markedBy"], "user-2");

    // marking again replaces the day's sheet
    server
        .post("/api/attendance/class/class-1/2024-12-02", &teacher, sheet(&["late"]))
        .await?;
    let (_, body) = server.get("/api/attendance/class/class-1/2024-12-02", &teacher).await?;
    assert_eq!(body["attendance"]["records"][0]["status"], "late");

    let (_, body) = server.get("/api/attendance/student/student-1", &teacher).await?;
    assert_eq!(body["attendance"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn attendance_needs_records_and_a_teacher() -> Result<()> {
    let server = TestServer::start().await?;
    let teacher = server.login(TEACHER).await?;
    let student = server.login(STUDENT).await?;

    let (status, _) = server
        .post("/api/attendance/class/class-1/2024-12-02", &student, sheet(&["present"]))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .post("/api/attendance/class/class-1/2024-12-02", &teacher, json!({ "records": "all here" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Attendance records are required");
    Ok(())
}

#[tokio::test]
async fn attendance_report_summarises_the_range() -> Result<()> {
    let server = TestServer::start().await?;
    let teacher = server.login(TEACHER).await?;

    for (date, status) in [("2024-12-02", "present"), ("2024-12-03", "absent"), ("2024-12-04", "late"), ("2024-12-20", "absent")] {
        server
            .post(&format!("/api/attendance/class/class-1/{}", date), &teacher, sheet(&[status]))
            .await?;
    }

    let (status, body) = server
        .post(
            "/api/reports/attendance",
            &teacher,
            json!({ "classId": "class-1", "startDate": "2024-12-01", "endDate": "2024-12-10" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "report failed: {}", body);

    let data = &body["report"]["data"];
    assert_eq!(data["totalDays"], 3);
    assert_eq!(data["presentCount"], 1);
    assert_eq!(data["absentCount"], 1);
    assert_eq!(data["lateCount"], 1);
    assert!(body["report"]["id"].as_str().is_some_and(|id| id.starts_with("report-")));
    Ok(())
}

#[tokio::test]
async fn performance_report_is_restricted() -> Result<()> {
    let server = TestServer::start().await?;
    let student = server.login(STUDENT).await?;
    let admin = server.login(SCHOOL_ADMIN).await?;

    let (status, _) = server.post("/api/reports/performance", &student, json!({})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .post("/api/reports/performance", &admin, json!({ "studentId": "student-1", "term": "Fall" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["type"], "performance");
    assert_eq!(body["report"]["term"], "Fall");
    Ok(())
}

#[tokio::test]
async fn assignments_follow_the_students_class() -> Result<()> {
    let server = TestServer::start().await?;
    let teacher = server.login(TEACHER).await?;

    let (_, body) = server.get("/api/assignments/student/student-1", &teacher).await?;
    let assignments = body["assignments"].as_array().cloned().unwrap_or_default();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0]["id"], "assignment-1");

    let (status, body) = server.post("/api/assignments", &teacher, json!({ "title": "No class" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "expected missing classId: {}", body);

    let (status, body) = server
        .put("/api/assignments/assignment-1", &teacher, json!({ "maxScore": 50 }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignment"]["maxScore"], 50);
    assert_eq!(body["assignment"]["title"], "Algebra Chapter 1 Quiz");

    let (_, body) = server.get("/api/assignments/class/class-1", &teacher).await?;
    assert_eq!(body["assignments"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn other_schools_classes_are_not_reported() -> Result<()> {
    let server = TestServer::start().await?;
    foreign_class(&server).await;
    let teacher = server.login(TEACHER).await?;

    let (status, body) = server
        .post("/api/reports/attendance", &teacher, json!({ "classId": "class-9" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND, "foreign class was reported: {}", body);
    assert_eq!(body["error"], "Class not found");

    let (status, _) = server.post("/api/reports/attendance", &teacher, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn assignments_cannot_target_other_schools_classes() -> Result<()> {
    let server = TestServer::start().await?;
    foreign_class(&server).await;
    let teacher = server.login(TEACHER).await?;

    let (status, body) = server
        .post("/api/assignments", &teacher, json!({ "title": "x", "classId": "class-9" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND, "assignment attached to foreign class: {}", body);

    let (status, _) = server
        .put("/api/assignments/assignment-1", &teacher, json!({ "classId": "class-9" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let student = server.login(STUDENT).await?;
    let (_, body) = server.get("/api/notifications", &student).await?;
    let leaked = body["notifications"]
        .as_array()
        .into_iter()
        .flatten()
        .any(|n| n["message"].as_str().is_some_and(|m| m.contains("Secret Class")));
    assert!(!leaked, "foreign class name reached a student: {}", body);

    let (status, body) = server
        .post("/api/assignments", &teacher, json!({ "title": "Fractions", "classId": "class-1" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "own class rejected: {}", body);
    Ok(())
}

#[tokio::test]
async fn sheets_belong_to_the_class_school() -> Result<()> {
    let server = TestServer::start().await?;
    let root = server.login(SUPER_ADMIN).await?;

    let (status, body) = server
        .post("/api/attendance/class/class-1/2024-12-05?schoolId=school-2", &root, sheet(&["present"]))
        .await?;
    assert_eq!(status, StatusCode::OK, "super-admin marking failed: {}", body);
    assert_eq!(body["attendance"]["schoolId"], "school-1");

    let teacher = server.login(TEACHER).await?;
    let (_, body) = server.get("/api/attendance/class/class-1/2024-12-05", &teacher).await?;
    assert_eq!(body["attendance"]["records"][0]["status"], "present");
    Ok(())
}

#[tokio::test]
async fn repeated_absence_alerts_the_student() -> Result<()> {
    let server = TestServer::start().await?;
    let teacher = server.login(TEACHER).await?;
    let student = server.login(STUDENT).await?;

    server
        .post("/api/attendance/class/class-1/2024-12-02", &teacher, sheet(&["present"]))
        .await?;
    let (_, body) = server.get("/api/notifications/unread/count", &student).await?;
    let before = body["count"].as_u64().unwrap_or_default();

    server
        .post("/api/attendance/class/class-1/2024-12-03", &teacher, sheet(&["absent"]))
        .await?;
    let (_, body) = server.get("/api/notifications", &student).await?;
    let alert = &body["notifications"][0];
    assert_eq!(alert["title"], "Attendance Alert");
    assert_eq!(alert["priority"], "high");
    assert!(alert["message"].as_str().is_some_and(|m| m.contains("50%")), "unexpected alert: {}", alert);

    let (_, body) = server.get("/api/notifications/unread/count", &student).await?;
    assert_eq!(body["count"].as_u64(), Some(before + 1));
    Ok(())
}
