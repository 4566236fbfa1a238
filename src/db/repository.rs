//! Database repository for CRUD operations.
//!
//! Constructed once at startup and injected through the application state —
//! there are no module-level store handles anywhere in the crate.

use chrono::{NaiveDate, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Course, CreateCourseRequest, CreateDepartmentRequest, CreateStudentRequest, CreateUserRequest,
    DailyAttendanceRecord, Department, Role, School, SlotAttendanceRecord, SlotMap, Student,
    UpdateStudentRequest, UpdateUserRequest, User, Year,
};
use crate::reconcile::DailyWrite;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== SCHOOL OPERATIONS ====================

    /// List all schools.
    pub async fn list_schools(&self) -> Result<Vec<School>, AppError> {
        let rows = sqlx::query("SELECT id, name, created_at, updated_at FROM schools ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(school_from_row).collect())
    }

    /// Get a school by ID.
    pub async fn get_school(&self, id: &str) -> Result<Option<School>, AppError> {
        let row = sqlx::query("SELECT id, name, created_at, updated_at FROM schools WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(school_from_row))
    }

    /// Create a new school.
    pub async fn create_school(&self, name: &str) -> Result<School, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO schools (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(School {
            id,
            name: name.to_string(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    // ==================== DEPARTMENT OPERATIONS ====================

    /// List all departments with their parent school embedded.
    pub async fn list_departments(&self) -> Result<Vec<Department>, AppError> {
        let rows = sqlx::query(
            r#"SELECT d.id, d.school_id, d.name, d.created_at, d.updated_at,
                      s.id AS school_row_id, s.name AS school_name,
                      s.created_at AS school_created_at, s.updated_at AS school_updated_at
               FROM departments d
               LEFT JOIN schools s ON s.id = d.school_id
               ORDER BY d.name"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(department_from_row).collect())
    }

    /// Get a department by ID, parent school embedded.
    pub async fn get_department(&self, id: &str) -> Result<Option<Department>, AppError> {
        let row = sqlx::query(
            r#"SELECT d.id, d.school_id, d.name, d.created_at, d.updated_at,
                      s.id AS school_row_id, s.name AS school_name,
                      s.created_at AS school_created_at, s.updated_at AS school_updated_at
               FROM departments d
               LEFT JOIN schools s ON s.id = d.school_id
               WHERE d.id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(department_from_row))
    }

    /// Create a new department. The caller checks the parent school first.
    pub async fn create_department(
        &self,
        request: &CreateDepartmentRequest,
    ) -> Result<Department, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO departments (id, school_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.school_id)
        .bind(&request.name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_department(&id).await?.ok_or_else(|| {
            AppError::Internal(format!("Department {} vanished after insert", id))
        })
    }

    // ==================== COURSE OPERATIONS ====================

    /// List all courses with their parent department embedded.
    pub async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let rows = sqlx::query(
            r#"SELECT c.id, c.department_id, c.name, c.created_at, c.updated_at,
                      d.id AS dept_row_id, d.school_id AS dept_school_id, d.name AS dept_name,
                      d.created_at AS dept_created_at, d.updated_at AS dept_updated_at
               FROM courses c
               LEFT JOIN departments d ON d.id = c.department_id
               ORDER BY c.name"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(course_from_row).collect())
    }

    /// Create a new course. The caller checks the parent department first.
    pub async fn create_course(&self, request: &CreateCourseRequest) -> Result<Course, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO courses (id, department_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.department_id)
        .bind(&request.name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            r#"SELECT c.id, c.department_id, c.name, c.created_at, c.updated_at,
                      d.id AS dept_row_id, d.school_id AS dept_school_id, d.name AS dept_name,
                      d.created_at AS dept_created_at, d.updated_at AS dept_updated_at
               FROM courses c
               LEFT JOIN departments d ON d.id = c.department_id
               WHERE c.id = ?"#,
        )
        .bind(&id)
        .fetch_one(&self.pool)
        .await?;

        Ok(course_from_row(&row))
    }

    // ==================== STUDENT OPERATIONS ====================

    /// List all students with school and department embedded.
    pub async fn list_students(&self) -> Result<Vec<Student>, AppError> {
        let rows = sqlx::query(&student_select("ORDER BY st.full_name"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(student_from_row).collect()
    }

    /// Get a student by storage ID, school and department embedded.
    pub async fn get_student(&self, id: &str) -> Result<Option<Student>, AppError> {
        let row = sqlx::query(&student_select("WHERE st.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(student_from_row).transpose()
    }

    /// Find a student by email, optionally excluding one storage ID.
    ///
    /// Email uniqueness is checked here before insert/update rather than by
    /// a storage constraint, so duplicates surface as validation errors.
    pub async fn find_student_by_email(
        &self,
        email: &str,
        exclude_id: Option<&str>,
    ) -> Result<Option<Student>, AppError> {
        let row = match exclude_id {
            Some(id) => {
                sqlx::query(&student_select("WHERE st.email = ? AND st.id != ?"))
                    .bind(email)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => {
                sqlx::query(&student_select("WHERE st.email = ?"))
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        row.as_ref().map(student_from_row).transpose()
    }

    /// Create a new student.
    pub async fn create_student(&self, request: &CreateStudentRequest) -> Result<Student, AppError> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"INSERT INTO students (id, student_id, full_name, email, phone, year, block, dorm, department_id, school_id)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&request.student_id)
        .bind(&request.full_name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(request.year.as_str())
        .bind(&request.block)
        .bind(&request.dorm)
        .bind(&request.department_id)
        .bind(&request.school_id)
        .execute(&self.pool)
        .await?;

        self.get_student(&id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Student {} vanished after insert", id)))
    }

    /// Update a student. Unset fields keep their current values.
    pub async fn update_student(
        &self,
        id: &str,
        request: &UpdateStudentRequest,
    ) -> Result<Student, AppError> {
        let existing = self
            .get_student(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

        let student_id = request.student_id.as_ref().unwrap_or(&existing.student_id);
        let full_name = request.full_name.as_ref().unwrap_or(&existing.full_name);
        let email = request.email.as_ref().unwrap_or(&existing.email);
        let phone = request.phone.as_ref().unwrap_or(&existing.phone);
        let year = request.year.unwrap_or(existing.year);
        let block = request.block.as_ref().unwrap_or(&existing.block);
        let dorm = request.dorm.as_ref().unwrap_or(&existing.dorm);
        let department_id = request
            .department_id
            .clone()
            .or(existing.department_id.clone());
        let school_id = request.school_id.clone().or(existing.school_id.clone());

        sqlx::query(
            r#"UPDATE students SET student_id = ?, full_name = ?, email = ?, phone = ?,
                                   year = ?, block = ?, dorm = ?, department_id = ?, school_id = ?
               WHERE id = ?"#,
        )
        .bind(student_id)
        .bind(full_name)
        .bind(email)
        .bind(phone)
        .bind(year.as_str())
        .bind(block)
        .bind(dorm)
        .bind(&department_id)
        .bind(&school_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_student(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Student {} vanished after update", id)))
    }

    /// Delete a student.
    pub async fn delete_student(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Student not found".to_string()));
        }

        Ok(())
    }

    // ==================== USER OPERATIONS ====================

    /// List all staff accounts.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, full_name, email, password_hash, salt, role, school_id, department_id,
                      created_at, updated_at
               FROM users ORDER BY full_name"#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    /// Get a staff account by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, full_name, email, password_hash, salt, role, school_id, department_id,
                      created_at, updated_at
               FROM users WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Find a staff account by email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, full_name, email, password_hash, salt, role, school_id, department_id,
                      created_at, updated_at
               FROM users WHERE email = ?"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Create a staff account from already-derived credential material.
    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
        password_hash: &str,
        salt: &str,
    ) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO users (id, full_name, email, password_hash, salt, role, school_id, department_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&request.full_name)
        .bind(&request.email)
        .bind(password_hash)
        .bind(salt)
        .bind(request.role.as_str())
        .bind(&request.school_id)
        .bind(&request.department_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            full_name: request.full_name.clone(),
            email: request.email.clone(),
            password_hash: password_hash.to_string(),
            salt: salt.to_string(),
            role: request.role,
            school_id: request.school_id.clone(),
            department_id: request.department_id.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update a staff account. Unset fields keep their current values.
    pub async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> Result<User, AppError> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let full_name = request.full_name.as_ref().unwrap_or(&existing.full_name);
        let email = request.email.as_ref().unwrap_or(&existing.email);
        let role = request.role.unwrap_or(existing.role);
        let school_id = request.school_id.clone().or(existing.school_id.clone());
        let department_id = request
            .department_id
            .clone()
            .or(existing.department_id.clone());
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"UPDATE users SET full_name = ?, email = ?, role = ?, school_id = ?, department_id = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(full_name)
        .bind(email)
        .bind(role.as_str())
        .bind(&school_id)
        .bind(&department_id)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: id.to_string(),
            full_name: full_name.clone(),
            email: email.clone(),
            password_hash: existing.password_hash,
            salt: existing.salt,
            role,
            school_id,
            department_id,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Replace a staff account's credential material.
    pub async fn update_user_password(
        &self,
        id: &str,
        password_hash: &str,
        salt: &str,
    ) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, salt = ?, updated_at = ? WHERE id = ?",
        )
        .bind(password_hash)
        .bind(salt)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    /// Count staff accounts grouped by role.
    pub async fn count_users_by_role(&self) -> Result<Vec<(String, i64)>, AppError> {
        let rows = sqlx::query("SELECT role, COUNT(*) AS n FROM users GROUP BY role ORDER BY role")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("role"), row.get("n")))
            .collect())
    }

    // ==================== DAILY ATTENDANCE OPERATIONS ====================

    /// Apply a planned batch of daily writes sequentially.
    ///
    /// Each key's upsert/delete is independent; there is deliberately no
    /// transaction here — a mid-batch storage failure leaves earlier writes
    /// applied and the caller resubmits (the validation pass has already
    /// run, so only storage failures can interrupt the batch).
    pub async fn apply_daily_writes(&self, writes: &[DailyWrite]) -> Result<usize, AppError> {
        for write in writes {
            match write {
                DailyWrite::Upsert { student_id, date } => {
                    sqlx::query(
                        r#"INSERT INTO daily_attendance (student_id, date, present) VALUES (?, ?, 1)
                           ON CONFLICT(student_id, date) DO UPDATE SET present = excluded.present"#,
                    )
                    .bind(student_id)
                    .bind(date)
                    .execute(&self.pool)
                    .await?;
                }
                DailyWrite::Delete { student_id, date } => {
                    // Absence is represented by row absence; deleting a
                    // missing row is already the desired state.
                    sqlx::query("DELETE FROM daily_attendance WHERE student_id = ? AND date = ?")
                        .bind(student_id)
                        .bind(date)
                        .execute(&self.pool)
                        .await?;
                }
            }
        }

        Ok(writes.len())
    }

    /// Fetch daily records within an inclusive date range, optionally for
    /// one student.
    pub async fn fetch_daily_range(
        &self,
        student_id: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyAttendanceRecord>, AppError> {
        let rows = match student_id {
            Some(sid) => {
                sqlx::query(
                    r#"SELECT student_id, present, date FROM daily_attendance
                       WHERE student_id = ? AND date >= ? AND date <= ?"#,
                )
                .bind(sid)
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT student_id, present, date FROM daily_attendance WHERE date >= ? AND date <= ?",
                )
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|row| {
                let present: i64 = row.get("present");
                DailyAttendanceRecord {
                    student_id: row.get("student_id"),
                    present: present != 0,
                    date: row.get("date"),
                }
            })
            .collect())
    }

    /// Delete exactly one daily record by its composite key.
    ///
    /// A missing key is NotFound so the caller can tell a no-op from a
    /// successful removal.
    pub async fn delete_daily(&self, student_id: &str, date: NaiveDate) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM daily_attendance WHERE student_id = ? AND date = ?")
            .bind(student_id)
            .bind(date)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Attendance not found".to_string()));
        }

        Ok(())
    }

    // ==================== SLOT ATTENDANCE OPERATIONS ====================

    /// Upsert one student's slot document for a date.
    ///
    /// Whole-document last-writer-wins: a resubmission replaces the stored
    /// weekday/slot structure, it does not merge with it.
    pub async fn upsert_slot(
        &self,
        student_id: &str,
        date: NaiveDate,
        attendance: &SlotMap,
    ) -> Result<(), AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let attendance_json = serde_json::to_string(attendance)?;

        sqlx::query(
            r#"INSERT INTO slot_attendance (id, student_id, date, attendance, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(student_id, date)
               DO UPDATE SET attendance = excluded.attendance, updated_at = excluded.updated_at"#,
        )
        .bind(&id)
        .bind(student_id)
        .bind(date)
        .bind(&attendance_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get one slot document by its composite key.
    pub async fn get_slot(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> Result<Option<SlotAttendanceRecord>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, student_id, date, attendance, created_at, updated_at
               FROM slot_attendance WHERE student_id = ? AND date = ?"#,
        )
        .bind(student_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let attendance_json: String = row.get("attendance");
        let attendance: SlotMap = serde_json::from_str(&attendance_json)?;

        Ok(Some(SlotAttendanceRecord {
            id: row.get("id"),
            student_id: row.get("student_id"),
            date: row.get("date"),
            attendance,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    /// Count slot documents for one composite key. Used to verify the
    /// storage-layer uniqueness constraint holds.
    pub async fn count_slot_documents(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        let row =
            sqlx::query("SELECT COUNT(*) AS n FROM slot_attendance WHERE student_id = ? AND date = ?")
                .bind(student_id)
                .bind(date)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.get("n"))
    }
}

// Helper functions for row conversion

fn school_from_row(row: &sqlx::sqlite::SqliteRow) -> School {
    School {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn department_from_row(row: &sqlx::sqlite::SqliteRow) -> Department {
    let school_row_id: Option<String> = row.get("school_row_id");
    Department {
        id: row.get("id"),
        school_id: row.get("school_id"),
        name: row.get("name"),
        school: school_row_id.map(|id| School {
            id,
            name: row.get("school_name"),
            created_at: row.get("school_created_at"),
            updated_at: row.get("school_updated_at"),
        }),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn course_from_row(row: &sqlx::sqlite::SqliteRow) -> Course {
    let dept_row_id: Option<String> = row.get("dept_row_id");
    Course {
        id: row.get("id"),
        department_id: row.get("department_id"),
        name: row.get("name"),
        department: dept_row_id.map(|id| Department {
            id,
            school_id: row.get("dept_school_id"),
            name: row.get("dept_name"),
            school: None,
            created_at: row.get("dept_created_at"),
            updated_at: row.get("dept_updated_at"),
        }),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn student_select(suffix: &str) -> String {
    format!(
        r#"SELECT st.id, st.student_id, st.full_name, st.email, st.phone, st.year, st.block,
                  st.dorm, st.department_id, st.school_id,
                  d.id AS dept_row_id, d.school_id AS dept_school_id, d.name AS dept_name,
                  d.created_at AS dept_created_at, d.updated_at AS dept_updated_at,
                  s.id AS school_row_id, s.name AS school_name,
                  s.created_at AS school_created_at, s.updated_at AS school_updated_at
           FROM students st
           LEFT JOIN departments d ON d.id = st.department_id
           LEFT JOIN schools s ON s.id = st.school_id
           {}"#,
        suffix
    )
}

fn student_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Student, AppError> {
    let year_str: String = row.get("year");
    let year = Year::from_str(&year_str)
        .ok_or_else(|| AppError::Internal(format!("Unknown enrollment year: {}", year_str)))?;
    let dept_row_id: Option<String> = row.get("dept_row_id");
    let school_row_id: Option<String> = row.get("school_row_id");

    Ok(Student {
        id: row.get("id"),
        student_id: row.get("student_id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        year,
        block: row.get("block"),
        dorm: row.get("dorm"),
        department_id: row.get("department_id"),
        school_id: row.get("school_id"),
        department: dept_row_id.map(|id| Department {
            id,
            school_id: row.get("dept_school_id"),
            name: row.get("dept_name"),
            school: None,
            created_at: row.get("dept_created_at"),
            updated_at: row.get("dept_updated_at"),
        }),
        school: school_row_id.map(|id| School {
            id,
            name: row.get("school_name"),
            created_at: row.get("school_created_at"),
            updated_at: row.get("school_updated_at"),
        }),
    })
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, AppError> {
    let role_str: String = row.get("role");
    let role = Role::from_str(&role_str)
        .ok_or_else(|| AppError::Internal(format!("Unknown role: {}", role_str)))?;

    Ok(User {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        salt: row.get("salt"),
        role,
        school_id: row.get("school_id"),
        department_id: row.get("department_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
