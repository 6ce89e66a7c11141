//! Command dispatch with per-collection serialization.
//!
//! Loads are supersedable: callers can fire a new load while one is in
//! flight and the reducer keeps only the latest response. Mutations are
//! serialized per collection behind an async gate, and the gate is held
//! until the command has fully settled, including the correlated seat-count
//! adjustment an enrollment change owes. The next command therefore always
//! admits against a snapshot that reflects every prior commit.

use crate::actions::{EntityKind, RegistryAction};
use crate::environment::RegistryEnvironment;
use crate::error::RegistryError;
use crate::reducer::RegistryReducer;
use crate::state::RegistryState;
use crate::types::{
    Course, CourseId, CoursePatch, Enrollment, EnrollmentId, EnrollmentPatch, NewCourse,
    NewEnrollment, NewStudent, NewUser, Student, StudentId, StudentPatch, User, UserId, UserPatch,
};
use campus_registry_runtime::{Store, StoreError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub type RegistryStore = Store<RegistryState, RegistryAction, RegistryEnvironment, RegistryReducer>;

/// Front door for registry commands.
#[derive(Clone)]
pub struct Dispatcher {
    store: RegistryStore,
    gates: std::sync::Arc<Gates>,
    request_timeout: Duration,
}

#[derive(Default)]
struct Gates {
    students: Mutex<()>,
    courses: Mutex<()>,
    enrollments: Mutex<()>,
    users: Mutex<()>,
}

impl Gates {
    fn for_kind(&self, kind: EntityKind) -> &Mutex<()> {
        match kind {
            EntityKind::Students => &self.students,
            EntityKind::Courses => &self.courses,
            EntityKind::Enrollments => &self.enrollments,
            EntityKind::Users => &self.users,
        }
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(store: RegistryStore, request_timeout: Duration) -> Self {
        Self {
            store,
            gates: std::sync::Arc::new(Gates::default()),
            request_timeout,
        }
    }

    /// The underlying store, for state reads and shutdown.
    #[must_use]
    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    /// Read a value out of the current state snapshot.
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&RegistryState) -> T,
    {
        self.store.state(f).await
    }

    // ----- loads (supersedable, no gate) -----

    pub async fn load_students(&self) -> Result<(), RegistryError> {
        self.load(EntityKind::Students, RegistryAction::LoadStudents)
            .await
    }

    pub async fn load_courses(&self) -> Result<(), RegistryError> {
        self.load(EntityKind::Courses, RegistryAction::LoadCourses)
            .await
    }

    pub async fn load_enrollments(&self) -> Result<(), RegistryError> {
        self.load(EntityKind::Enrollments, RegistryAction::LoadEnrollments)
            .await
    }

    pub async fn load_users(&self) -> Result<(), RegistryError> {
        self.load(EntityKind::Users, RegistryAction::LoadUsers).await
    }

    /// Issue a load and wait for the response whose result the reducer
    /// actually keeps.
    ///
    /// The generation read right after the command was applied is the
    /// floor: a response below it belongs to an already superseded load
    /// and its outcome is ignored, while a caller whose own load was
    /// superseded settles with the surviving load's outcome, matching
    /// what landed in state.
    async fn load(
        &self,
        kind: EntityKind,
        command: RegistryAction,
    ) -> Result<(), RegistryError> {
        let mut rx = self.store.subscribe_actions();
        self.store.send(command).await?;
        // send returns after the reducer ran, so the collection's
        // generation already covers this load (or a newer one).
        let expected = self.store.state(move |s| load_generation(s, kind)).await;

        let deadline = Instant::now() + self.request_timeout;
        let terminal = loop {
            let action = recv_until(&mut rx, deadline).await?;
            if let Some(generation) = load_response_generation(&action) {
                if action.entity_kind() == kind && generation >= expected {
                    break action;
                }
            }
        };
        match load_failure(&terminal) {
            Some(error) => Err(RegistryError::Remote(error)),
            None => Ok(()),
        }
    }

    // ----- students -----

    pub async fn add_student(&self, new: NewStudent) -> Result<Student, RegistryError> {
        match self
            .settle(EntityKind::Students, RegistryAction::AddStudent { new })
            .await?
        {
            RegistryAction::AddStudentSucceeded { student } => Ok(student),
            other => Err(unexpected(other)),
        }
    }

    pub async fn update_student(
        &self,
        id: StudentId,
        patch: StudentPatch,
    ) -> Result<Student, RegistryError> {
        match self
            .settle(
                EntityKind::Students,
                RegistryAction::UpdateStudent { id, patch },
            )
            .await?
        {
            RegistryAction::UpdateStudentSucceeded { student } => Ok(student),
            other => Err(unexpected(other)),
        }
    }

    pub async fn delete_student(&self, id: StudentId) -> Result<(), RegistryError> {
        match self
            .settle(EntityKind::Students, RegistryAction::DeleteStudent { id })
            .await?
        {
            RegistryAction::DeleteStudentSucceeded { .. } => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    // ----- courses -----

    pub async fn add_course(&self, new: NewCourse) -> Result<Course, RegistryError> {
        match self
            .settle(EntityKind::Courses, RegistryAction::AddCourse { new })
            .await?
        {
            RegistryAction::AddCourseSucceeded { course } => Ok(course),
            other => Err(unexpected(other)),
        }
    }

    pub async fn update_course(
        &self,
        id: CourseId,
        patch: CoursePatch,
    ) -> Result<Course, RegistryError> {
        match self
            .settle(
                EntityKind::Courses,
                RegistryAction::UpdateCourse { id, patch },
            )
            .await?
        {
            RegistryAction::UpdateCourseSucceeded { course } => Ok(course),
            other => Err(unexpected(other)),
        }
    }

    pub async fn delete_course(&self, id: CourseId) -> Result<(), RegistryError> {
        match self
            .settle(EntityKind::Courses, RegistryAction::DeleteCourse { id })
            .await?
        {
            RegistryAction::DeleteCourseSucceeded { .. } => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    // ----- enrollments -----

    pub async fn add_enrollment(&self, new: NewEnrollment) -> Result<Enrollment, RegistryError> {
        match self
            .settle(
                EntityKind::Enrollments,
                RegistryAction::AddEnrollment { new },
            )
            .await?
        {
            RegistryAction::AddEnrollmentSucceeded { enrollment } => Ok(enrollment),
            other => Err(unexpected(other)),
        }
    }

    pub async fn update_enrollment(
        &self,
        id: EnrollmentId,
        patch: EnrollmentPatch,
    ) -> Result<Enrollment, RegistryError> {
        match self
            .settle(
                EntityKind::Enrollments,
                RegistryAction::UpdateEnrollment { id, patch },
            )
            .await?
        {
            RegistryAction::UpdateEnrollmentSucceeded { enrollment } => Ok(enrollment),
            other => Err(unexpected(other)),
        }
    }

    pub async fn cancel_enrollment(&self, id: EnrollmentId) -> Result<Enrollment, RegistryError> {
        self.transition(RegistryAction::CancelEnrollment { id }).await
    }

    pub async fn complete_enrollment(&self, id: EnrollmentId) -> Result<Enrollment, RegistryError> {
        self.transition(RegistryAction::CompleteEnrollment { id })
            .await
    }

    pub async fn reactivate_enrollment(
        &self,
        id: EnrollmentId,
    ) -> Result<Enrollment, RegistryError> {
        self.transition(RegistryAction::ReactivateEnrollment { id })
            .await
    }

    async fn transition(&self, command: RegistryAction) -> Result<Enrollment, RegistryError> {
        match self.settle(EntityKind::Enrollments, command).await? {
            RegistryAction::EnrollmentStatusChanged { enrollment, .. } => Ok(enrollment),
            other => Err(unexpected(other)),
        }
    }

    pub async fn delete_enrollment(&self, id: EnrollmentId) -> Result<(), RegistryError> {
        match self
            .settle(
                EntityKind::Enrollments,
                RegistryAction::DeleteEnrollment { id },
            )
            .await?
        {
            RegistryAction::DeleteEnrollmentSucceeded { .. } => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    // ----- users -----

    pub async fn add_user(&self, new: NewUser) -> Result<User, RegistryError> {
        match self
            .settle(EntityKind::Users, RegistryAction::AddUser { new })
            .await?
        {
            RegistryAction::AddUserSucceeded { user } => Ok(user),
            other => Err(unexpected(other)),
        }
    }

    pub async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, RegistryError> {
        match self
            .settle(EntityKind::Users, RegistryAction::UpdateUser { id, patch })
            .await?
        {
            RegistryAction::UpdateUserSucceeded { user } => Ok(user),
            other => Err(unexpected(other)),
        }
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), RegistryError> {
        match self
            .settle(EntityKind::Users, RegistryAction::DeleteUser { id })
            .await?
        {
            RegistryAction::DeleteUserSucceeded { .. } => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    // ----- selection (local, fire-and-forget) -----

    pub async fn select_student(&self, id: StudentId) -> Result<(), RegistryError> {
        self.store.send(RegistryAction::SelectStudent { id }).await?;
        Ok(())
    }

    pub async fn select_course(&self, id: CourseId) -> Result<(), RegistryError> {
        self.store.send(RegistryAction::SelectCourse { id }).await?;
        Ok(())
    }

    pub async fn select_enrollment(&self, id: EnrollmentId) -> Result<(), RegistryError> {
        self.store
            .send(RegistryAction::SelectEnrollment { id })
            .await?;
        Ok(())
    }

    pub async fn clear_selected_student(&self) -> Result<(), RegistryError> {
        self.store.send(RegistryAction::ClearSelectedStudent).await?;
        Ok(())
    }

    pub async fn clear_selected_course(&self) -> Result<(), RegistryError> {
        self.store.send(RegistryAction::ClearSelectedCourse).await?;
        Ok(())
    }

    pub async fn clear_selected_enrollment(&self) -> Result<(), RegistryError> {
        self.store
            .send(RegistryAction::ClearSelectedEnrollment)
            .await?;
        Ok(())
    }

    // ----- settlement -----

    /// Run a mutation to completion under its collection's gate.
    ///
    /// Returns the successful terminal event; rejections and remote
    /// failures become errors. The gate is released only after any owed
    /// seat-count adjustment has been applied.
    async fn settle(
        &self,
        kind: EntityKind,
        command: RegistryAction,
    ) -> Result<RegistryAction, RegistryError> {
        let _permit = self.gates.for_kind(kind).lock().await;
        let mut rx = self.store.subscribe_actions();
        self.store.send(command).await?;

        let deadline = Instant::now() + self.request_timeout;
        let terminal = loop {
            let action = recv_until(&mut rx, deadline).await?;
            // Other collections settle their own commands concurrently;
            // only terminals of this collection belong to this command.
            if action.entity_kind() == kind && is_mutation_terminal(&action) {
                break action;
            }
        };

        if let Some(expected) = owed_adjustment(&terminal) {
            loop {
                if recv_until(&mut rx, deadline).await? == expected {
                    break;
                }
            }
        }

        match terminal {
            RegistryAction::EnrollmentRejected { reason } => Err(RegistryError::Rejected(reason)),
            RegistryAction::AddStudentFailed { error }
            | RegistryAction::UpdateStudentFailed { error }
            | RegistryAction::DeleteStudentFailed { error }
            | RegistryAction::AddCourseFailed { error }
            | RegistryAction::UpdateCourseFailed { error }
            | RegistryAction::DeleteCourseFailed { error }
            | RegistryAction::AddEnrollmentFailed { error }
            | RegistryAction::UpdateEnrollmentFailed { error }
            | RegistryAction::DeleteEnrollmentFailed { error }
            | RegistryAction::AddUserFailed { error }
            | RegistryAction::UpdateUserFailed { error }
            | RegistryAction::DeleteUserFailed { error } => Err(RegistryError::Remote(error)),
            success => Ok(success),
        }
    }
}

async fn recv_until(
    rx: &mut broadcast::Receiver<RegistryAction>,
    deadline: Instant,
) -> Result<RegistryAction, RegistryError> {
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(action)) => return Ok(action),
            Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                tracing::warn!(skipped, "Dispatcher lagged behind the action stream");
            }
            Ok(Err(broadcast::error::RecvError::Closed)) => {
                return Err(RegistryError::Store(StoreError::ChannelClosed));
            }
            Err(_) => return Err(RegistryError::Timeout),
        }
    }
}

/// Terminal events of mutation commands. Load responses and seat-count
/// adjustments are not terminals; they settle other commands.
fn is_mutation_terminal(action: &RegistryAction) -> bool {
    use RegistryAction as A;
    matches!(
        action,
        A::AddStudentSucceeded { .. }
            | A::AddStudentFailed { .. }
            | A::UpdateStudentSucceeded { .. }
            | A::UpdateStudentFailed { .. }
            | A::DeleteStudentSucceeded { .. }
            | A::DeleteStudentFailed { .. }
            | A::AddCourseSucceeded { .. }
            | A::AddCourseFailed { .. }
            | A::UpdateCourseSucceeded { .. }
            | A::UpdateCourseFailed { .. }
            | A::DeleteCourseSucceeded { .. }
            | A::DeleteCourseFailed { .. }
            | A::AddEnrollmentSucceeded { .. }
            | A::AddEnrollmentFailed { .. }
            | A::UpdateEnrollmentSucceeded { .. }
            | A::UpdateEnrollmentFailed { .. }
            | A::DeleteEnrollmentSucceeded { .. }
            | A::DeleteEnrollmentFailed { .. }
            | A::EnrollmentStatusChanged { .. }
            | A::EnrollmentRejected { .. }
            | A::AddUserSucceeded { .. }
            | A::AddUserFailed { .. }
            | A::UpdateUserSucceeded { .. }
            | A::UpdateUserFailed { .. }
            | A::DeleteUserSucceeded { .. }
            | A::DeleteUserFailed { .. }
    )
}

/// The correlated adjustment a committed enrollment change still owes.
/// The dispatcher waits for it before releasing the gate so the next
/// admission check sees the updated seat count.
fn owed_adjustment(terminal: &RegistryAction) -> Option<RegistryAction> {
    use RegistryAction as A;
    match terminal {
        A::AddEnrollmentSucceeded { enrollment } => Some(A::IncrementEnrollment {
            course_id: enrollment.course_id,
        }),
        A::DeleteEnrollmentSucceeded {
            course_id,
            was_active: true,
            ..
        } => Some(A::DecrementEnrollment {
            course_id: *course_id,
        }),
        A::EnrollmentStatusChanged {
            enrollment,
            previous,
        } => match (previous.is_active(), enrollment.status.is_active()) {
            (true, false) => Some(A::DecrementEnrollment {
                course_id: enrollment.course_id,
            }),
            (false, true) => Some(A::IncrementEnrollment {
                course_id: enrollment.course_id,
            }),
            _ => None,
        },
        _ => None,
    }
}

fn load_generation(state: &RegistryState, kind: EntityKind) -> u64 {
    match kind {
        EntityKind::Students => state.students.generation,
        EntityKind::Courses => state.courses.generation,
        EntityKind::Enrollments => state.enrollments.generation,
        EntityKind::Users => state.users.generation,
    }
}

/// The generation a load response echoes; `None` for every other action.
fn load_response_generation(action: &RegistryAction) -> Option<u64> {
    use RegistryAction as A;
    match action {
        A::LoadStudentsSucceeded { generation, .. }
        | A::LoadStudentsFailed { generation, .. }
        | A::LoadCoursesSucceeded { generation, .. }
        | A::LoadCoursesFailed { generation, .. }
        | A::LoadEnrollmentsSucceeded { generation, .. }
        | A::LoadEnrollmentsFailed { generation, .. }
        | A::LoadUsersSucceeded { generation, .. }
        | A::LoadUsersFailed { generation, .. } => Some(*generation),
        _ => None,
    }
}

fn load_failure(terminal: &RegistryAction) -> Option<String> {
    use RegistryAction as A;
    match terminal {
        A::LoadStudentsFailed { error, .. }
        | A::LoadCoursesFailed { error, .. }
        | A::LoadEnrollmentsFailed { error, .. }
        | A::LoadUsersFailed { error, .. } => Some(error.clone()),
        _ => None,
    }
}

/// A terminal of the wrong shape means a command/terminal pairing bug in
/// this module, not a caller mistake.
fn unexpected(action: RegistryAction) -> RegistryError {
    tracing::error!(?action, "Unexpected terminal event for command");
    RegistryError::Store(StoreError::EffectFailed(format!(
        "unexpected terminal event: {action:?}"
    )))
}
