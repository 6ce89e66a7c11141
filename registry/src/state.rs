//! Application state: one normalized collection per record kind.

use crate::types::{Course, CourseId, Enrollment, EnrollmentStatus, Student, StudentId, User};
use campus_registry_core::EntityStore;

/// Root state of the registry. Each collection tracks its own loading,
/// loaded and error flags independently.
#[derive(Debug, Clone, Default)]
pub struct RegistryState {
    pub students: EntityStore<Student>,
    pub courses: EntityStore<Course>,
    pub enrollments: EntityStore<Enrollment>,
    pub users: EntityStore<User>,
}

impl RegistryState {
    /// Number of `Active` enrollments currently held for a course.
    ///
    /// This is the ground truth the denormalized `Course::enrolled` count
    /// is expected to match once all in-flight commands have settled.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // collection sizes are tiny
    pub fn active_enrollment_count(&self, course_id: CourseId) -> u32 {
        self.enrollments
            .select_all()
            .filter(|e| e.course_id == course_id && e.status.is_active())
            .count() as u32
    }

    /// Whether the student already holds a seat-counting enrollment in the
    /// course. Cancelled enrollments do not block re-enrollment.
    #[must_use]
    pub fn has_counted_enrollment(&self, student_id: StudentId, course_id: CourseId) -> bool {
        self.enrollments.select_all().any(|e| {
            e.student_id == student_id
                && e.course_id == course_id
                && matches!(
                    e.status,
                    EnrollmentStatus::Active | EnrollmentStatus::Completed
                )
        })
    }
}
