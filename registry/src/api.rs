//! Remote record services.
//!
//! Each record kind has its own trait so environments can mix transports.
//! Methods return boxed futures; implementations decide how the call is
//! actually carried (HTTP, in-memory, fixtures).

use crate::types::{
    Course, CourseId, CoursePatch, Enrollment, EnrollmentId, EnrollmentPatch, EnrollmentStatus,
    NewCourse, NewEnrollment, NewStudent, NewUser, Student, StudentId, StudentPatch, User, UserId,
    UserPatch,
};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Failure reported by a record service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ApiError(pub String);

pub type ApiFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

pub trait StudentsApi: Send + Sync {
    fn list(&self) -> ApiFuture<Vec<Student>>;
    fn create(&self, new: NewStudent) -> ApiFuture<Student>;
    fn update(&self, id: StudentId, patch: StudentPatch) -> ApiFuture<Student>;
    fn delete(&self, id: StudentId) -> ApiFuture<()>;
}

pub trait CoursesApi: Send + Sync {
    fn list(&self) -> ApiFuture<Vec<Course>>;
    fn create(&self, new: NewCourse) -> ApiFuture<Course>;
    fn update(&self, id: CourseId, patch: CoursePatch) -> ApiFuture<Course>;
    fn delete(&self, id: CourseId) -> ApiFuture<()>;
}

pub trait EnrollmentsApi: Send + Sync {
    fn list(&self) -> ApiFuture<Vec<Enrollment>>;
    fn create(&self, new: NewEnrollment) -> ApiFuture<Enrollment>;
    fn update(&self, id: EnrollmentId, patch: EnrollmentPatch) -> ApiFuture<Enrollment>;
    /// Persist a status change. Admission has already happened locally;
    /// this only records the new status.
    fn set_status(&self, id: EnrollmentId, status: EnrollmentStatus) -> ApiFuture<Enrollment>;
    fn delete(&self, id: EnrollmentId) -> ApiFuture<()>;
}

pub trait UsersApi: Send + Sync {
    fn list(&self) -> ApiFuture<Vec<User>>;
    fn create(&self, new: NewUser) -> ApiFuture<User>;
    fn update(&self, id: UserId, patch: UserPatch) -> ApiFuture<User>;
    fn delete(&self, id: UserId) -> ApiFuture<()>;
}

#[derive(Debug, Default)]
struct Tables {
    students: HashMap<StudentId, Student>,
    courses: HashMap<CourseId, Course>,
    enrollments: HashMap<EnrollmentId, Enrollment>,
    users: HashMap<UserId, User>,
    /// When set, the next call fails with this message instead of running.
    fail_next: Option<String>,
}

/// In-process implementation of all four record services.
///
/// Ids are assigned from a single monotonically increasing counter. Used by
/// the demo binary and by integration tests; `fail_next` injects a one-shot
/// remote failure.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordsApi {
    tables: Arc<Mutex<Tables>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryRecordsApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // Mutex poisoning only happens if a holder panicked; propagating
        // the inner data is still sound for test fixtures.
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn take_failure(&self) -> Option<ApiError> {
        self.lock().fail_next.take().map(ApiError)
    }

    /// Make the next API call, of any kind, fail with `message`.
    pub fn fail_next_call(&self, message: impl Into<String>) {
        self.lock().fail_next = Some(message.into());
    }

    pub fn seed_student(&self, new: NewStudent) -> Student {
        let student = Student {
            id: StudentId(self.next_id()),
            first_name: new.first_name,
            last_name: new.last_name,
            age: new.age,
            email: new.email,
        };
        self.lock().students.insert(student.id, student.clone());
        student
    }

    pub fn seed_course(&self, new: NewCourse) -> Course {
        let course = Course {
            id: CourseId(self.next_id()),
            name: new.name,
            code: new.code,
            instructor: new.instructor,
            duration: new.duration,
            start_date: new.start_date,
            end_date: new.end_date,
            capacity: new.capacity,
            enrolled: 0,
        };
        self.lock().courses.insert(course.id, course.clone());
        course
    }

    pub fn seed_user(&self, new: NewUser) -> User {
        let user = User {
            id: UserId(self.next_id()),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password: new.password,
            role: new.role,
        };
        self.lock().users.insert(user.id, user.clone());
        user
    }

    fn ready<T: Send + 'static>(&self, result: Result<T, ApiError>) -> ApiFuture<T> {
        let outcome = match self.take_failure() {
            Some(err) => Err(err),
            None => result,
        };
        Box::pin(async move { outcome })
    }
}

fn not_found<T>(kind: &str, id: impl std::fmt::Display) -> Result<T, ApiError> {
    Err(ApiError(format!("{kind} {id} not found")))
}

impl StudentsApi for InMemoryRecordsApi {
    fn list(&self) -> ApiFuture<Vec<Student>> {
        let result = {
            let tables = self.lock();
            let mut students: Vec<_> = tables.students.values().cloned().collect();
            students.sort_by_key(|s| s.id);
            Ok(students)
        };
        self.ready(result)
    }

    fn create(&self, new: NewStudent) -> ApiFuture<Student> {
        if let Some(err) = self.take_failure() {
            return Box::pin(async move { Err(err) });
        }
        let student = self.seed_student(new);
        Box::pin(async move { Ok(student) })
    }

    fn update(&self, id: StudentId, patch: StudentPatch) -> ApiFuture<Student> {
        let result = match self.lock().students.get_mut(&id) {
            Some(student) => {
                patch.apply(student);
                Ok(student.clone())
            }
            None => not_found("student", id),
        };
        self.ready(result)
    }

    fn delete(&self, id: StudentId) -> ApiFuture<()> {
        let result = match self.lock().students.remove(&id) {
            Some(_) => Ok(()),
            None => not_found("student", id),
        };
        self.ready(result)
    }
}

impl CoursesApi for InMemoryRecordsApi {
    fn list(&self) -> ApiFuture<Vec<Course>> {
        let result = {
            let tables = self.lock();
            let mut courses: Vec<_> = tables.courses.values().cloned().collect();
            courses.sort_by_key(|c| c.id);
            Ok(courses)
        };
        self.ready(result)
    }

    fn create(&self, new: NewCourse) -> ApiFuture<Course> {
        if let Some(err) = self.take_failure() {
            return Box::pin(async move { Err(err) });
        }
        let course = self.seed_course(new);
        Box::pin(async move { Ok(course) })
    }

    fn update(&self, id: CourseId, patch: CoursePatch) -> ApiFuture<Course> {
        let result = match self.lock().courses.get_mut(&id) {
            Some(course) => {
                patch.apply(course);
                Ok(course.clone())
            }
            None => not_found("course", id),
        };
        self.ready(result)
    }

    fn delete(&self, id: CourseId) -> ApiFuture<()> {
        let result = match self.lock().courses.remove(&id) {
            Some(_) => Ok(()),
            None => not_found("course", id),
        };
        self.ready(result)
    }
}

impl EnrollmentsApi for InMemoryRecordsApi {
    fn list(&self) -> ApiFuture<Vec<Enrollment>> {
        let result = {
            let tables = self.lock();
            let mut enrollments: Vec<_> = tables.enrollments.values().cloned().collect();
            enrollments.sort_by_key(|e| e.id);
            Ok(enrollments)
        };
        self.ready(result)
    }

    fn create(&self, new: NewEnrollment) -> ApiFuture<Enrollment> {
        if let Some(err) = self.take_failure() {
            return Box::pin(async move { Err(err) });
        }
        let enrollment = Enrollment {
            id: EnrollmentId(self.next_id()),
            student_id: new.student_id,
            course_id: new.course_id,
            // The reducer fills a missing date from its clock before the
            // call reaches any record service.
            enrollment_date: new.enrollment_date.unwrap_or_default(),
            status: EnrollmentStatus::Active,
        };
        self.lock()
            .enrollments
            .insert(enrollment.id, enrollment.clone());
        Box::pin(async move { Ok(enrollment) })
    }

    fn update(&self, id: EnrollmentId, patch: EnrollmentPatch) -> ApiFuture<Enrollment> {
        let result = match self.lock().enrollments.get_mut(&id) {
            Some(enrollment) => {
                patch.apply(enrollment);
                Ok(enrollment.clone())
            }
            None => not_found("enrollment", id),
        };
        self.ready(result)
    }

    fn set_status(&self, id: EnrollmentId, status: EnrollmentStatus) -> ApiFuture<Enrollment> {
        let result = match self.lock().enrollments.get_mut(&id) {
            Some(enrollment) => {
                enrollment.status = status;
                Ok(enrollment.clone())
            }
            None => not_found("enrollment", id),
        };
        self.ready(result)
    }

    fn delete(&self, id: EnrollmentId) -> ApiFuture<()> {
        let result = match self.lock().enrollments.remove(&id) {
            Some(_) => Ok(()),
            None => not_found("enrollment", id),
        };
        self.ready(result)
    }
}

impl UsersApi for InMemoryRecordsApi {
    fn list(&self) -> ApiFuture<Vec<User>> {
        let result = {
            let tables = self.lock();
            let mut users: Vec<_> = tables.users.values().cloned().collect();
            users.sort_by_key(|u| u.id);
            Ok(users)
        };
        self.ready(result)
    }

    fn create(&self, new: NewUser) -> ApiFuture<User> {
        if let Some(err) = self.take_failure() {
            return Box::pin(async move { Err(err) });
        }
        let user = self.seed_user(new);
        Box::pin(async move { Ok(user) })
    }

    fn update(&self, id: UserId, patch: UserPatch) -> ApiFuture<User> {
        let result = match self.lock().users.get_mut(&id) {
            Some(user) => {
                patch.apply(user);
                Ok(user.clone())
            }
            None => not_found("user", id),
        };
        self.ready(result)
    }

    fn delete(&self, id: UserId) -> ApiFuture<()> {
        let result = match self.lock().users.remove(&id) {
            Some(_) => Ok(()),
            None => not_found("user", id),
        };
        self.ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_student() -> NewStudent {
        NewStudent {
            first_name: "Ada".into(),
            last_name: "Diallo".into(),
            age: 21,
            email: "ada@example.edu".into(),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_monotonically() {
        let api = InMemoryRecordsApi::new();
        let a = StudentsApi::create(&api, new_student()).await.unwrap();
        let b = StudentsApi::create(&api, new_student()).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn fail_next_call_fails_exactly_once() {
        let api = InMemoryRecordsApi::new();
        api.fail_next_call("backend unavailable");
        assert!(StudentsApi::list(&api).await.is_err());
        assert!(StudentsApi::list(&api).await.is_ok());
    }

    #[tokio::test]
    async fn created_enrollments_start_active() {
        let api = InMemoryRecordsApi::new();
        let enrollment = EnrollmentsApi::create(
            &api,
            NewEnrollment {
                student_id: StudentId(1),
                course_id: CourseId(1),
                enrollment_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            },
        )
        .await
        .unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Active);
    }

    #[tokio::test]
    async fn update_on_missing_record_reports_not_found() {
        let api = InMemoryRecordsApi::new();
        let err = StudentsApi::update(&api, StudentId(9), StudentPatch::default())
            .await
            .unwrap_err();
        assert!(err.0.contains("not found"));
    }
}
