//! The closed action vocabulary of the registry.
//!
//! Commands (imperative names) are sent by callers; events (past-tense
//! names) are produced by effects and fed back into the store. There is no
//! open-ended action type: every state change in the system is one of the
//! variants below.

use crate::error::AdmissionError;
use crate::types::{
    Course, CourseId, CoursePatch, Enrollment, EnrollmentId, EnrollmentPatch, EnrollmentStatus,
    NewCourse, NewEnrollment, NewStudent, NewUser, Student, StudentId, StudentPatch, User, UserId,
    UserPatch,
};

/// Record kind an action belongs to. Used by the dispatcher to route
/// commands to the right serialization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Students,
    Courses,
    Enrollments,
    Users,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryAction {
    // ----- students -----
    LoadStudents,
    /// `generation` echoes the load that produced this response; stale
    /// responses are discarded by the reducer.
    LoadStudentsSucceeded {
        students: Vec<Student>,
        generation: u64,
    },
    LoadStudentsFailed {
        error: String,
        generation: u64,
    },
    AddStudent {
        new: NewStudent,
    },
    AddStudentSucceeded {
        student: Student,
    },
    AddStudentFailed {
        error: String,
    },
    UpdateStudent {
        id: StudentId,
        patch: StudentPatch,
    },
    UpdateStudentSucceeded {
        student: Student,
    },
    UpdateStudentFailed {
        error: String,
    },
    DeleteStudent {
        id: StudentId,
    },
    DeleteStudentSucceeded {
        id: StudentId,
    },
    DeleteStudentFailed {
        error: String,
    },
    SelectStudent {
        id: StudentId,
    },
    ClearSelectedStudent,

    // ----- courses -----
    LoadCourses,
    LoadCoursesSucceeded {
        courses: Vec<Course>,
        generation: u64,
    },
    LoadCoursesFailed {
        error: String,
        generation: u64,
    },
    AddCourse {
        new: NewCourse,
    },
    AddCourseSucceeded {
        course: Course,
    },
    AddCourseFailed {
        error: String,
    },
    UpdateCourse {
        id: CourseId,
        patch: CoursePatch,
    },
    UpdateCourseSucceeded {
        course: Course,
    },
    UpdateCourseFailed {
        error: String,
    },
    DeleteCourse {
        id: CourseId,
    },
    DeleteCourseSucceeded {
        id: CourseId,
    },
    DeleteCourseFailed {
        error: String,
    },
    SelectCourse {
        id: CourseId,
    },
    ClearSelectedCourse,
    /// Seat-count adjustment emitted by the enrollment coordinator after a
    /// committed enrollment change. Local, no remote call.
    IncrementEnrollment {
        course_id: CourseId,
    },
    DecrementEnrollment {
        course_id: CourseId,
    },

    // ----- enrollments -----
    LoadEnrollments,
    LoadEnrollmentsSucceeded {
        enrollments: Vec<Enrollment>,
        generation: u64,
    },
    LoadEnrollmentsFailed {
        error: String,
        generation: u64,
    },
    AddEnrollment {
        new: NewEnrollment,
    },
    AddEnrollmentSucceeded {
        enrollment: Enrollment,
    },
    AddEnrollmentFailed {
        error: String,
    },
    UpdateEnrollment {
        id: EnrollmentId,
        patch: EnrollmentPatch,
    },
    UpdateEnrollmentSucceeded {
        enrollment: Enrollment,
    },
    UpdateEnrollmentFailed {
        error: String,
    },
    DeleteEnrollment {
        id: EnrollmentId,
    },
    /// `course_id` and `was_active` are captured at command time so the
    /// decrement can be decided after the record is gone.
    DeleteEnrollmentSucceeded {
        id: EnrollmentId,
        course_id: CourseId,
        was_active: bool,
    },
    DeleteEnrollmentFailed {
        error: String,
    },
    CancelEnrollment {
        id: EnrollmentId,
    },
    CompleteEnrollment {
        id: EnrollmentId,
    },
    ReactivateEnrollment {
        id: EnrollmentId,
    },
    /// A status transition was committed remotely. `previous` drives the
    /// seat-count adjustment.
    EnrollmentStatusChanged {
        enrollment: Enrollment,
        previous: EnrollmentStatus,
    },
    /// An enrollment command failed a local admission check. No record was
    /// mutated; the reason is recorded on the collection for display.
    EnrollmentRejected {
        reason: AdmissionError,
    },
    SelectEnrollment {
        id: EnrollmentId,
    },
    ClearSelectedEnrollment,

    // ----- users -----
    LoadUsers,
    LoadUsersSucceeded {
        users: Vec<User>,
        generation: u64,
    },
    LoadUsersFailed {
        error: String,
        generation: u64,
    },
    AddUser {
        new: NewUser,
    },
    AddUserSucceeded {
        user: User,
    },
    AddUserFailed {
        error: String,
    },
    UpdateUser {
        id: UserId,
        patch: UserPatch,
    },
    UpdateUserSucceeded {
        user: User,
    },
    UpdateUserFailed {
        error: String,
    },
    DeleteUser {
        id: UserId,
    },
    DeleteUserSucceeded {
        id: UserId,
    },
    DeleteUserFailed {
        error: String,
    },
    SelectUser {
        id: UserId,
    },
    ClearSelectedUser,
}

impl RegistryAction {
    /// Which collection the action primarily touches.
    ///
    /// Seat-count adjustments are classified under enrollments even though
    /// they mutate a course: they are part of an enrollment command's
    /// settlement and must ride the same serialization gate.
    #[must_use]
    pub fn entity_kind(&self) -> EntityKind {
        use RegistryAction as A;
        match self {
            A::LoadStudents
            | A::LoadStudentsSucceeded { .. }
            | A::LoadStudentsFailed { .. }
            | A::AddStudent { .. }
            | A::AddStudentSucceeded { .. }
            | A::AddStudentFailed { .. }
            | A::UpdateStudent { .. }
            | A::UpdateStudentSucceeded { .. }
            | A::UpdateStudentFailed { .. }
            | A::DeleteStudent { .. }
            | A::DeleteStudentSucceeded { .. }
            | A::DeleteStudentFailed { .. }
            | A::SelectStudent { .. }
            | A::ClearSelectedStudent => EntityKind::Students,

            A::LoadCourses
            | A::LoadCoursesSucceeded { .. }
            | A::LoadCoursesFailed { .. }
            | A::AddCourse { .. }
            | A::AddCourseSucceeded { .. }
            | A::AddCourseFailed { .. }
            | A::UpdateCourse { .. }
            | A::UpdateCourseSucceeded { .. }
            | A::UpdateCourseFailed { .. }
            | A::DeleteCourse { .. }
            | A::DeleteCourseSucceeded { .. }
            | A::DeleteCourseFailed { .. }
            | A::SelectCourse { .. }
            | A::ClearSelectedCourse => EntityKind::Courses,

            A::IncrementEnrollment { .. }
            | A::DecrementEnrollment { .. }
            | A::LoadEnrollments
            | A::LoadEnrollmentsSucceeded { .. }
            | A::LoadEnrollmentsFailed { .. }
            | A::AddEnrollment { .. }
            | A::AddEnrollmentSucceeded { .. }
            | A::AddEnrollmentFailed { .. }
            | A::UpdateEnrollment { .. }
            | A::UpdateEnrollmentSucceeded { .. }
            | A::UpdateEnrollmentFailed { .. }
            | A::DeleteEnrollment { .. }
            | A::DeleteEnrollmentSucceeded { .. }
            | A::DeleteEnrollmentFailed { .. }
            | A::CancelEnrollment { .. }
            | A::CompleteEnrollment { .. }
            | A::ReactivateEnrollment { .. }
            | A::EnrollmentStatusChanged { .. }
            | A::EnrollmentRejected { .. }
            | A::SelectEnrollment { .. }
            | A::ClearSelectedEnrollment => EntityKind::Enrollments,

            A::LoadUsers
            | A::LoadUsersSucceeded { .. }
            | A::LoadUsersFailed { .. }
            | A::AddUser { .. }
            | A::AddUserSucceeded { .. }
            | A::AddUserFailed { .. }
            | A::UpdateUser { .. }
            | A::UpdateUserSucceeded { .. }
            | A::UpdateUserFailed { .. }
            | A::DeleteUser { .. }
            | A::DeleteUserSucceeded { .. }
            | A::DeleteUserFailed { .. }
            | A::SelectUser { .. }
            | A::ClearSelectedUser => EntityKind::Users,
        }
    }
}
