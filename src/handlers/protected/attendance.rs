// handlers/protected/attendance.rs - /api/attendance
//
// One attendance sheet per (class, date), stored under
// `attendance-<classId>-<date>`. Marking again replaces the sheet.
// Students marked absent whose rate in the class drops below
// ALERT_BELOW_PERCENT get an attendance alert.

use axum::extract::{Extension, Json, Path, State};
use serde_json::{json, Value};

use crate::auth::Role;
use crate::database::{Collection, Record};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Tenant};
use crate::services::notifications::NotificationEvent;
use crate::state::AppState;

const ALERT_BELOW_PERCENT: i64 = 75;

pub fn sheet_id(class_id: &str, date: &str) -> String {
    format!("attendance-{}-{}", class_id, date)
}

/// GET /api/attendance/class/:classId/:date - the sheet, or null when unmarked
pub async fn get_class(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path((class_id, date)): Path<(String, String)>,
) -> ApiResult {
    let sheet = state
        .store
        .find_by_id(Collection::Attendance, &sheet_id(&class_id, &date))
        .await
        .filter(|s| tenant.permits(s));
    Ok(ApiResponse::ok().with("attendance", sheet))
}

/// POST /api/attendance/class/:classId/:date - mark or re-mark a class
pub async fn mark_class(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(tenant): Extension<Tenant>,
    Path((class_id, date)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult {
    user.require_role(&[Role::Teacher, Role::SchoolAdmin])?;

    let class = state.store.find_by_id(Collection::Classes, &class_id).await;
    let class = tenant.visible(class, "Class not found")?;

    let records = match body.get("records") {
        Some(Value::Array(entries)) => Value::Array(entries.clone()),
        _ => return Err(ApiError::bad_request("Attendance records are required")),
    };

    let sheet = Record::new()
        .with("schoolId", class.school_id())
        .with("classId", class_id.as_str())
        .with("date", date.as_str())
        .with("records", records)
        .with("markedBy", user.id.as_str());
    let sheet = state
        .store
        .put(Collection::Attendance, sheet_id(&class_id, &date), sheet)
        .await;

    tracing::info!(class = %class_id, date = %date, "attendance marked");
    alert_low_attendance(&state, &class, &sheet).await;
    Ok(ApiResponse::ok().with("attendance", sheet).message("Attendance marked successfully"))
}

/// GET /api/attendance/student/:studentId - sheets that mention the student
pub async fn get_student(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(student_id): Path<String>,
) -> ApiResult {
    let sheets: Vec<Record> = state
        .store
        .find(Collection::Attendance, &tenant.scope(Filter::new()))
        .await
        .into_iter()
        .filter(|sheet| mentions_student(sheet, &student_id))
        .collect();
    Ok(ApiResponse::ok().with("attendance", sheets))
}

fn mentions_student(sheet: &Record, student_id: &str) -> bool {
    entries(sheet).any(|e| e.get("studentId").and_then(Value::as_str) == Some(student_id))
}

async fn alert_low_attendance(state: &AppState, class: &Record, sheet: &Record) {
    let (Some(class_id), Some(school_id)) = (class.id(), class.school_id()) else {
        return;
    };
    let sheets = state
        .store
        .find(Collection::Attendance, &Filter::new().eq("classId", class_id).eq("schoolId", school_id))
        .await;

    for student_id in entries_with_status(sheet, "absent") {
        let Some(percentage) = attendance_percentage(&sheets, &student_id) else {
            continue;
        };
        if percentage >= ALERT_BELOW_PERCENT {
            continue;
        }
        // alerts go to the student's login account
        let user_id = state
            .store
            .find_by_id(Collection::Students, &student_id)
            .await
            .and_then(|s| s.user_id().map(str::to_string));
        let Some(user_id) = user_id else {
            continue;
        };
        let data = json!({ "studentId": user_id, "percentage": percentage });
        state
            .notifications()
            .send_event(NotificationEvent::AttendanceAlert, &data, school_id)
            .await;
    }
}

fn entries(sheet: &Record) -> impl Iterator<Item = &Value> {
    sheet.get("records").and_then(Value::as_array).into_iter().flatten()
}

fn entries_with_status(sheet: &Record, status: &str) -> Vec<String> {
    entries(sheet)
        .filter(|e| e.get("status").and_then(Value::as_str) == Some(status))
        .filter_map(|e| e.get("studentId").and_then(Value::as_str).map(str::to_string))
        .collect()
}

/// Present and late over all of the student's entries, rounded to a whole percent
fn attendance_percentage(sheets: &[Record], student_id: &str) -> Option<i64> {
    let (mut attended, mut marked) = (0u32, 0u32);
    for entry in sheets.iter().flat_map(entries) {
        if entry.get("studentId").and_then(Value::as_str) != Some(student_id) {
            continue;
        }
        match entry.get("status").and_then(Value::as_str) {
            Some("present") | Some("late") => {
                attended += 1;
                marked += 1;
            }
            Some("absent") => marked += 1,
            _ => {}
        }
    }
    (marked > 0).then(|| (f64::from(attended) * 100.0 / f64::from(marked)).round() as i64)
}
