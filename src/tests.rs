//! Integration tests for the attendance backend.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    repo: Arc<Repository>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Create config
        let config = Config {
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            jwt_secret: "test-secret".to_string(),
            admin_email: Some("admin@school.edu".to_string()),
            admin_password: Some("admin-pass".to_string()),
        };

        let state = AppState {
            repo: repo.clone(),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            repo,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a school and return its ID.
    async fn create_school(&self, name: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/school/add-school"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Create a department under a school and return its ID.
    async fn create_department(&self, name: &str, school_id: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/department/add-department"))
            .json(&json!({ "name": name, "schoolId": school_id }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_school_department_course_flow() {
    let fixture = TestFixture::new().await;

    let school_id = fixture.create_school("Engineering").await;

    // Department against a missing school must 404 and create nothing
    let resp = fixture
        .client
        .post(fixture.url("/api/department/add-department"))
        .json(&json!({ "name": "Ghost", "schoolId": "no-such-school" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let dept_id = fixture.create_department("Software", &school_id).await;

    // Listing embeds the parent school
    let resp = fixture
        .client
        .get(fixture.url("/api/department/get-department"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let departments = body.as_array().unwrap();
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0]["name"], "Software");
    assert_eq!(departments[0]["school"]["name"], "Engineering");

    // Course against a missing department must 404 and create nothing
    let resp = fixture
        .client
        .post(fixture.url("/api/course/add-course"))
        .json(&json!({ "name": "Compilers", "departmentId": "no-such-dept" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .get(fixture.url("/api/course/get-course"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());

    // Valid course
    let resp = fixture
        .client
        .post(fixture.url("/api/course/add-course"))
        .json(&json!({ "name": "Compilers", "departmentId": dept_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Compilers");
    assert_eq!(body["data"]["department"]["name"], "Software");
}

#[tokio::test]
async fn test_department_requires_fields() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/department/add-department"))
        .json(&json!({ "name": "", "schoolId": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_student_crud() {
    let fixture = TestFixture::new().await;

    let school_id = fixture.create_school("Engineering").await;
    let dept_id = fixture.create_department("Software", &school_id).await;

    // Add student
    let resp = fixture
        .client
        .post(fixture.url("/api/students/add-student"))
        .json(&json!({
            "studentId": "ETS0001",
            "fullName": "Abebe Kebede",
            "email": "abebe@school.edu",
            "phone": "0911000000",
            "year": "2nd",
            "block": "B-12",
            "dorm": "D-304",
            "departmentId": dept_id,
            "schoolId": school_id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["year"], "2nd");
    assert_eq!(body["department"]["name"], "Software");
    assert_eq!(body["school"]["name"], "Engineering");

    // Duplicate email is rejected
    let resp = fixture
        .client
        .post(fixture.url("/api/students/add-student"))
        .json(&json!({
            "studentId": "ETS0002",
            "fullName": "Someone Else",
            "email": "abebe@school.edu",
            "phone": "0911000001",
            "year": "1st",
            "block": "B-1",
            "dorm": "D-1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Update keeps unset fields
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/students/update-student/{}", id)))
        .json(&json!({ "dorm": "D-305" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Student updated");
    assert_eq!(body["student"]["dorm"], "D-305");
    assert_eq!(body["student"]["fullName"], "Abebe Kebede");

    // Delete, then delete again
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/students/delete-record/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/students/delete-record/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_daily_attendance_idempotence() {
    let fixture = TestFixture::new().await;

    let batch = json!([{ "studentId": "S1", "date": "2024-05-01", "present": true }]);

    for _ in 0..2 {
        let resp = fixture
            .client
            .post(fixture.url("/api/attendances/save-attendance"))
            .json(&batch)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    let resp = fixture
        .client
        .get(fixture.url("/api/attendances/get-attendance?studentId=S1&month=5&year=2024"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["studentId"], "S1");
    assert_eq!(records[0]["present"], true);
    assert_eq!(records[0]["date"], "2024-05-01");
}

#[tokio::test]
async fn test_daily_attendance_false_mark_removes_row() {
    let fixture = TestFixture::new().await;

    // String "true" is coerced
    let resp = fixture
        .client
        .post(fixture.url("/api/attendances/save-attendance"))
        .json(&json!([{ "studentId": "S1", "date": "2024-05-01", "present": "true" }]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    // A false mark reconciles to row absence
    let resp = fixture
        .client
        .post(fixture.url("/api/attendances/save-attendance"))
        .json(&json!([{ "studentId": "S1", "date": "2024-05-01", "present": false }]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = fixture
        .client
        .get(fixture.url("/api/attendances/get-attendance?studentId=S1&month=5&year=2024"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_daily_attendance_fail_fast_batch() {
    let fixture = TestFixture::new().await;

    // The valid first record must not survive the malformed second one
    let resp = fixture
        .client
        .post(fixture.url("/api/attendances/save-attendance"))
        .json(&json!([
            { "studentId": "S1", "date": "2024-05-01", "present": true },
            { "studentId": "", "date": "x", "present": true }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .client
        .get(fixture.url("/api/attendances/get-attendance?studentId=S1&month=5&year=2024"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_daily_attendance_range_boundary() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/attendances/save-attendance"))
        .json(&json!([
            { "studentId": "S1", "date": "2024-04-30", "present": true },
            { "studentId": "S1", "date": "2024-05-01", "present": true },
            { "studentId": "S1", "date": "2024-05-31", "present": true }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = fixture
        .client
        .get(fixture.url("/api/attendances/get-attendance?studentId=S1&month=5&year=2024"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let mut dates: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["date"].as_str().unwrap())
        .collect();
    dates.sort_unstable();
    assert_eq!(dates, vec!["2024-05-01", "2024-05-31"]);
}

#[tokio::test]
async fn test_daily_attendance_all_students_filter() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/attendances/save-attendance"))
        .json(&json!([
            { "studentId": "S1", "date": "2024-05-01", "present": true },
            { "studentId": "S2", "date": "2024-05-02", "present": true }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = fixture
        .client
        .get(fixture.url("/api/attendances/get-attendance?studentId=all&month=5&year=2024"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_daily_attendance_requires_month_and_year() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/attendances/get-attendance?studentId=S1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_daily_attendance_delete() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/attendances/save-attendance"))
        .json(&json!([{ "studentId": "S1", "date": "2024-05-01", "present": true }]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    // Missing params
    let resp = fixture
        .client
        .delete(fixture.url("/api/attendances/delete?studentId=S1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Delete succeeds once, then the key is gone
    let resp = fixture
        .client
        .delete(fixture.url("/api/attendances/delete?studentId=S1&date=2024-05-01"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .delete(fixture.url("/api/attendances/delete?studentId=S1&date=2024-05-01"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_slot_attendance_upsert_single_document() {
    let fixture = TestFixture::new().await;
    let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();

    let first = json!({
        "attendance": [{
            "studentId": "S1",
            "attendance": { "Monday": { "8:00-10:00": "Present" } }
        }],
        "date": "2024-05-06"
    });
    let resp = fixture
        .client
        .post(fixture.url("/api/Tattendances/save-attendance"))
        .json(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Resubmission replaces the document instead of adding a second row
    let second = json!({
        "attendance": [{
            "studentId": "S1",
            "attendance": { "Tuesday": { "10:00-12:00": "Present" } }
        }],
        "date": "2024-05-06"
    });
    let resp = fixture
        .client
        .post(fixture.url("/api/Tattendances/save-attendance"))
        .json(&second)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert_eq!(fixture.repo.count_slot_documents("S1", date).await.unwrap(), 1);

    let record = fixture.repo.get_slot("S1", date).await.unwrap().unwrap();
    let weekdays: Vec<_> = record.attendance.keys().collect();
    assert_eq!(weekdays.len(), 1);
    assert_eq!(weekdays[0].as_str(), "Tuesday");
}

#[tokio::test]
async fn test_slot_attendance_summary() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/Tattendances/save-attendance"))
        .json(&json!({
            "attendance": [
                {
                    "studentId": "S1",
                    "attendance": { "Monday": { "8:00-10:00": "Present" } }
                },
                {
                    "studentId": "S2",
                    "attendance": {
                        "Monday": { "8:00-10:00": "Present", "10:00-12:00": "Present" }
                    }
                },
                { "studentId": "S3", "attendance": {} }
            ],
            "date": "2024-05-06",
            "schedule": [
                { "date": "2024-05-06", "day": "Monday", "time": "8:00-10:00", "course": "Algebra" },
                { "date": "2024-05-06", "day": "Monday", "time": "10:00-12:00", "course": "Physics" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Attendance saved successfully");
    assert_eq!(body["summary"]["Monday-8:00-10:00-Algebra"], 2);
    assert_eq!(body["summary"]["Monday-10:00-12:00-Physics"], 1);
}

#[tokio::test]
async fn test_slot_attendance_rejects_malformed_keys() {
    let fixture = TestFixture::new().await;
    let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();

    // Unknown weekday and slot labels must be rejected at the boundary
    let resp = fixture
        .client
        .post(fixture.url("/api/Tattendances/save-attendance"))
        .json(&json!({
            "attendance": [{
                "studentId": "S1",
                "attendance": { "Funday": { "8:00-10:00": "Present" } }
            }],
            "date": "2024-05-06"
        }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
    assert_eq!(fixture.repo.count_slot_documents("S1", date).await.unwrap(), 0);

    // Unparseable date rejects the submission
    let resp = fixture
        .client
        .post(fixture.url("/api/Tattendances/save-attendance"))
        .json(&json!({
            "attendance": [{
                "studentId": "S1",
                "attendance": { "Monday": { "8:00-10:00": "Present" } }
            }],
            "date": ""
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_admin_login() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/admin/login"))
        .json(&json!({ "email": "admin@school.edu", "password": "admin-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "system admin");
    assert!(body["token"].as_str().is_some());

    let resp = fixture
        .client
        .post(fixture.url("/api/admin/login"))
        .json(&json!({ "email": "admin@school.edu", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/users/get-users"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .client
        .get(fixture.url("/api/users/get-profile"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_user_account_flow() {
    let fixture = TestFixture::new().await;

    // Create a teacher account
    let resp = fixture
        .client
        .post(fixture.url("/api/users/create"))
        .json(&json!({
            "fullName": "Sara Tesfaye",
            "email": "sara@school.edu",
            "password": "hunter2",
            "role": "teacher"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let user_id = body["id"].as_str().unwrap().to_string();
    // Credential material never leaves the server
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("salt").is_none());

    // Duplicate email is rejected
    let resp = fixture
        .client
        .post(fixture.url("/api/users/create"))
        .json(&json!({
            "fullName": "Other Person",
            "email": "sara@school.edu",
            "password": "pw",
            "role": "procter"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Wrong password is rejected
    let resp = fixture
        .client
        .post(fixture.url("/api/users/login"))
        .json(&json!({ "email": "sara@school.edu", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Login and use the token
    let resp = fixture
        .client
        .post(fixture.url("/api/users/login"))
        .json(&json!({ "email": "sara@school.edu", "password": "hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["role"], "teacher");
    let token = body["token"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .get(fixture.url("/api/users/get-profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["fullName"], "Sara Tesfaye");

    let resp = fixture
        .client
        .get(fixture.url("/api/users/checkauth"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["name"], "Sara Tesfaye");

    // Change the password; the old one stops working
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/users/update-password/{}", user_id)))
        .bearer_auth(&token)
        .json(&json!({ "password": "correct-horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .post(fixture.url("/api/users/login"))
        .json(&json!({ "email": "sara@school.edu", "password": "hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .client
        .post(fixture.url("/api/users/login"))
        .json(&json!({ "email": "sara@school.edu", "password": "correct-horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Update the account role
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/users/update-user/{}", user_id)))
        .bearer_auth(&token)
        .json(&json!({ "role": "dep-head" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["role"], "dep-head");

    // List users with the token; stats endpoint counts by role
    let resp = fixture
        .client
        .get(fixture.url("/api/users/get-users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);

    let resp = fixture
        .client
        .get(fixture.url("/api/users/active-users"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["byRole"]["dep-head"], 1);
}
