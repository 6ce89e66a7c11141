//! Error taxonomy for enrollment admission and command dispatch.

use crate::types::{CourseId, EnrollmentId, EnrollmentStatus, StudentId};
use campus_registry_runtime::StoreError;

/// Reason an enrollment command was rejected before any effect ran.
///
/// Admission checks are evaluated in declaration order and short-circuit on
/// the first failure. A rejected command leaves every record untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("student {student_id} not found")]
    StudentNotFound { student_id: StudentId },

    #[error("course {course_id} not found")]
    CourseNotFound { course_id: CourseId },

    #[error("course {course_id} is full ({capacity} seats)")]
    CourseFull { course_id: CourseId, capacity: u32 },

    #[error("student {student_id} is already enrolled in course {course_id}")]
    DuplicateEnrollment {
        student_id: StudentId,
        course_id: CourseId,
    },

    #[error("enrollment {enrollment_id} not found")]
    EnrollmentNotFound { enrollment_id: EnrollmentId },

    #[error("cannot change enrollment status from {from} to {to}")]
    InvalidTransition {
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    },
}

/// Outcome surfaced to callers of the command dispatcher.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// The command failed a local admission check; nothing was mutated.
    #[error("rejected: {0}")]
    Rejected(#[from] AdmissionError),

    /// The remote API call failed; the optimistic loading flag was cleared
    /// and the failure message recorded on the collection.
    #[error("remote call failed: {0}")]
    Remote(String),

    /// No terminal event arrived within the configured request timeout.
    #[error("timed out waiting for the command to settle")]
    Timeout,

    /// The underlying store rejected the command.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout => Self::Timeout,
            other => Self::Store(other),
        }
    }
}
