//! Domain records managed by the registry.
//!
//! All records carry numeric surrogate ids assigned by the backing API.
//! Wire format is camelCase JSON, matching the HTTP service the registry
//! was built against.

use campus_registry_core::{Deserialize, Entity, Serialize};
use chrono::NaiveDate;
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Student`] record.
    StudentId
);
entity_id!(
    /// Identifier of a [`Course`] record.
    CourseId
);
entity_id!(
    /// Identifier of an [`Enrollment`] record.
    EnrollmentId
);
entity_id!(
    /// Identifier of a [`User`] account.
    UserId
);

/// A student known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub email: String,
}

impl Student {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Student {
    type Id = StudentId;

    fn id(&self) -> StudentId {
        self.id
    }
}

/// A course offering with a bounded number of seats.
///
/// `enrolled` is a denormalized count of active enrollments, maintained by
/// the enrollment coordinator. It is never computed from the enrollment
/// collection at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub code: String,
    pub instructor: String,
    /// Course length in hours.
    pub duration: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub capacity: u32,
    pub enrolled: u32,
}

impl Course {
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.enrolled >= self.capacity
    }

    #[must_use]
    pub fn seats_left(&self) -> u32 {
        self.capacity.saturating_sub(self.enrolled)
    }
}

impl Entity for Course {
    type Id = CourseId;

    fn id(&self) -> CourseId {
        self.id
    }
}

/// Lifecycle state of an enrollment. Only `Active` enrollments occupy a
/// seat in their course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A student's membership in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub enrollment_date: NaiveDate,
    pub status: EnrollmentStatus,
}

impl Entity for Enrollment {
    type Id = EnrollmentId;

    fn id(&self) -> EnrollmentId {
        self.id
    }
}

/// Role attached to an operator account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

/// An operator account for the registry itself. Plain CRUD, no
/// coordination; the password travels as an opaque string to and from the
/// backing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Payload for creating a [`Student`]; the API assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub email: String,
}

/// Partial update for a [`Student`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<u32>,
    pub email: Option<String>,
}

impl StudentPatch {
    pub fn apply(&self, student: &mut Student) {
        if let Some(first_name) = &self.first_name {
            student.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            student.last_name = last_name.clone();
        }
        if let Some(age) = self.age {
            student.age = age;
        }
        if let Some(email) = &self.email {
            student.email = email.clone();
        }
    }
}

/// Payload for creating a [`Course`]. New courses start with zero enrolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub name: String,
    pub code: String,
    pub instructor: String,
    pub duration: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub capacity: u32,
}

/// Partial update for a [`Course`].
///
/// `enrolled` is patchable for administrative correction only; a direct
/// overwrite bypasses the enrollment coordinator and can desynchronize the
/// count from the enrollment collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub instructor: Option<String>,
    pub duration: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub capacity: Option<u32>,
    pub enrolled: Option<u32>,
}

impl CoursePatch {
    pub fn apply(&self, course: &mut Course) {
        if let Some(name) = &self.name {
            course.name = name.clone();
        }
        if let Some(code) = &self.code {
            course.code = code.clone();
        }
        if let Some(instructor) = &self.instructor {
            course.instructor = instructor.clone();
        }
        if let Some(duration) = self.duration {
            course.duration = duration;
        }
        if let Some(start_date) = self.start_date {
            course.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            course.end_date = end_date;
        }
        if let Some(capacity) = self.capacity {
            course.capacity = capacity;
        }
        if let Some(enrolled) = self.enrolled {
            course.enrolled = enrolled;
        }
    }
}

/// Payload for creating an [`Enrollment`]. New enrollments are `Active`;
/// a missing date is filled from the environment clock at admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnrollment {
    pub student_id: StudentId,
    pub course_id: CourseId,
    #[serde(default)]
    pub enrollment_date: Option<NaiveDate>,
}

/// Partial update for an [`Enrollment`].
///
/// Status is deliberately absent: status changes go through the cancel,
/// complete and reactivate commands so the seat count stays consistent.
/// `course_id` is patchable for administrative correction only; repointing
/// an `Active` row bypasses the enrollment coordinator and can
/// desynchronize both courses' seat counts, like `CoursePatch::enrolled`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrollmentPatch {
    pub student_id: Option<StudentId>,
    pub course_id: Option<CourseId>,
    pub enrollment_date: Option<NaiveDate>,
}

impl EnrollmentPatch {
    pub fn apply(&self, enrollment: &mut Enrollment) {
        if let Some(student_id) = self.student_id {
            enrollment.student_id = student_id;
        }
        if let Some(course_id) = self.course_id {
            enrollment.course_id = course_id;
        }
        if let Some(enrollment_date) = self.enrollment_date {
            enrollment.enrollment_date = enrollment_date;
        }
    }
}

/// Payload for creating a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Partial update for a [`User`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

impl UserPatch {
    pub fn apply(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(password) = &self.password {
            user.password = password.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course() -> Course {
        Course {
            id: CourseId(1),
            name: "Systems Programming".into(),
            code: "CS-301".into(),
            instructor: "R. Huang".into(),
            duration: 40,
            start_date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
            capacity: 2,
            enrolled: 1,
        }
    }

    #[test]
    fn seats_left_saturates_at_zero() {
        let mut c = course();
        c.enrolled = 5;
        assert!(c.is_full());
        assert_eq!(c.seats_left(), 0);
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut c = course();
        CoursePatch {
            instructor: Some("M. Oduya".into()),
            capacity: Some(3),
            ..CoursePatch::default()
        }
        .apply(&mut c);
        assert_eq!(c.instructor, "M. Oduya");
        assert_eq!(c.capacity, 3);
        assert_eq!(c.name, "Systems Programming");
        assert_eq!(c.enrolled, 1);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&EnrollmentStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn records_use_camel_case_wire_names() {
        let student = Student {
            id: StudentId(7),
            first_name: "Ada".into(),
            last_name: "Diallo".into(),
            age: 21,
            email: "ada@example.edu".into(),
        };
        let json = serde_json::to_string(&student).unwrap();
        assert!(json.contains("\"firstName\""));
        assert!(json.contains("\"lastName\""));
    }
}
