//! The registry reducer.
//!
//! One reducer owns the whole state tree. Commands mark the affected
//! collection as loading and return the remote call as an effect; the
//! effect's outcome comes back as a success or failure event. Seat-count
//! adjustments are emitted as correlated follow-up commands after the
//! triggering event commits, so the course count always trails a committed
//! enrollment change by exactly one feedback hop.

use crate::actions::RegistryAction;
use crate::coordinator::{self, SeatAdjustment};
use crate::environment::RegistryEnvironment;
use crate::error::AdmissionError;
use crate::state::RegistryState;
use crate::types::EnrollmentStatus;
use campus_registry_core::effect::Effect;
use campus_registry_core::reducer::Reducer;
use campus_registry_core::{smallvec, SmallVec};

type Effects = SmallVec<[Effect<RegistryAction>; 4]>;

#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryReducer;

/// Feed a rejection back through the store so request/response waiters
/// observe it like any other terminal event.
fn reject(reason: AdmissionError) -> Effects {
    tracing::info!(%reason, "Enrollment command rejected");
    metrics::counter!("registry.enrollment.rejected").increment(1);
    smallvec![Effect::future(async move {
        Some(RegistryAction::EnrollmentRejected { reason })
    })]
}

fn adjustment_action(
    adjustment: SeatAdjustment,
    course_id: crate::types::CourseId,
) -> RegistryAction {
    match adjustment {
        SeatAdjustment::Increment => RegistryAction::IncrementEnrollment { course_id },
        SeatAdjustment::Decrement => RegistryAction::DecrementEnrollment { course_id },
    }
}

impl Reducer for RegistryReducer {
    type State = RegistryState;
    type Action = RegistryAction;
    type Environment = RegistryEnvironment;

    #[allow(clippy::too_many_lines)] // one arm per action variant, all trivial
    fn reduce(
        &self,
        state: &mut RegistryState,
        action: RegistryAction,
        env: &RegistryEnvironment,
    ) -> Effects {
        use RegistryAction as A;

        match action {
            // ----- students -----
            A::LoadStudents => {
                state.students.generation = state.students.generation.wrapping_add(1);
                state.students.loading = true;
                state.students.error = None;
                let generation = state.students.generation;
                let api = env.students.clone();
                smallvec![Effect::future(async move {
                    Some(match api.list().await {
                        Ok(students) => A::LoadStudentsSucceeded {
                            students,
                            generation,
                        },
                        Err(err) => A::LoadStudentsFailed {
                            error: err.to_string(),
                            generation,
                        },
                    })
                })]
            }
            A::LoadStudentsSucceeded {
                students,
                generation,
            } => {
                if generation != state.students.generation {
                    tracing::debug!(generation, "Discarding superseded student load");
                    return smallvec![];
                }
                state.students.set_all(students);
                state.students.loading = false;
                state.students.loaded = true;
                state.students.error = None;
                smallvec![]
            }
            A::LoadStudentsFailed { error, generation } => {
                if generation != state.students.generation {
                    tracing::debug!(generation, "Discarding superseded student load failure");
                    return smallvec![];
                }
                tracing::warn!(%error, "Loading students failed");
                state.students.loading = false;
                state.students.error = Some(error);
                smallvec![]
            }
            A::AddStudent { new } => {
                state.students.loading = true;
                state.students.error = None;
                let api = env.students.clone();
                smallvec![Effect::future(async move {
                    Some(match api.create(new).await {
                        Ok(student) => A::AddStudentSucceeded { student },
                        Err(err) => A::AddStudentFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::AddStudentSucceeded { student } => {
                tracing::info!(student_id = %student.id, "Student created");
                state.students.add_one(student);
                state.students.loading = false;
                smallvec![]
            }
            A::AddStudentFailed { error } => {
                tracing::warn!(%error, "Creating student failed");
                state.students.loading = false;
                state.students.error = Some(error);
                smallvec![]
            }
            A::UpdateStudent { id, patch } => {
                state.students.loading = true;
                state.students.error = None;
                let api = env.students.clone();
                smallvec![Effect::future(async move {
                    Some(match api.update(id, patch).await {
                        Ok(student) => A::UpdateStudentSucceeded { student },
                        Err(err) => A::UpdateStudentFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::UpdateStudentSucceeded { student } => {
                state.students.update_one(student.id, |s| *s = student.clone());
                state.students.loading = false;
                smallvec![]
            }
            A::UpdateStudentFailed { error } => {
                tracing::warn!(%error, "Updating student failed");
                state.students.loading = false;
                state.students.error = Some(error);
                smallvec![]
            }
            A::DeleteStudent { id } => {
                state.students.loading = true;
                state.students.error = None;
                let api = env.students.clone();
                smallvec![Effect::future(async move {
                    Some(match api.delete(id).await {
                        Ok(()) => A::DeleteStudentSucceeded { id },
                        Err(err) => A::DeleteStudentFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::DeleteStudentSucceeded { id } => {
                // Enrollments referencing this student are kept; selectors
                // render them with a placeholder name.
                state.students.remove_one(id);
                state.students.loading = false;
                smallvec![]
            }
            A::DeleteStudentFailed { error } => {
                tracing::warn!(%error, "Deleting student failed");
                state.students.loading = false;
                state.students.error = Some(error);
                smallvec![]
            }
            A::SelectStudent { id } => {
                state.students.selected_id = Some(id);
                smallvec![]
            }
            A::ClearSelectedStudent => {
                state.students.selected_id = None;
                smallvec![]
            }

            // ----- courses -----
            A::LoadCourses => {
                state.courses.generation = state.courses.generation.wrapping_add(1);
                state.courses.loading = true;
                state.courses.error = None;
                let generation = state.courses.generation;
                let api = env.courses.clone();
                smallvec![Effect::future(async move {
                    Some(match api.list().await {
                        Ok(courses) => A::LoadCoursesSucceeded {
                            courses,
                            generation,
                        },
                        Err(err) => A::LoadCoursesFailed {
                            error: err.to_string(),
                            generation,
                        },
                    })
                })]
            }
            A::LoadCoursesSucceeded {
                courses,
                generation,
            } => {
                if generation != state.courses.generation {
                    tracing::debug!(generation, "Discarding superseded course load");
                    return smallvec![];
                }
                state.courses.set_all(courses);
                state.courses.loading = false;
                state.courses.loaded = true;
                state.courses.error = None;
                smallvec![]
            }
            A::LoadCoursesFailed { error, generation } => {
                if generation != state.courses.generation {
                    tracing::debug!(generation, "Discarding superseded course load failure");
                    return smallvec![];
                }
                tracing::warn!(%error, "Loading courses failed");
                state.courses.loading = false;
                state.courses.error = Some(error);
                smallvec![]
            }
            A::AddCourse { new } => {
                state.courses.loading = true;
                state.courses.error = None;
                let api = env.courses.clone();
                smallvec![Effect::future(async move {
                    Some(match api.create(new).await {
                        Ok(course) => A::AddCourseSucceeded { course },
                        Err(err) => A::AddCourseFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::AddCourseSucceeded { course } => {
                tracing::info!(course_id = %course.id, code = %course.code, "Course created");
                state.courses.add_one(course);
                state.courses.loading = false;
                smallvec![]
            }
            A::AddCourseFailed { error } => {
                tracing::warn!(%error, "Creating course failed");
                state.courses.loading = false;
                state.courses.error = Some(error);
                smallvec![]
            }
            A::UpdateCourse { id, patch } => {
                if patch.enrolled.is_some() {
                    // Administrative overwrite of the seat count. Permitted,
                    // but it can desynchronize the count from the
                    // enrollment collection.
                    tracing::warn!(course_id = %id, "Course update overwrites enrolled count");
                }
                state.courses.loading = true;
                state.courses.error = None;
                let api = env.courses.clone();
                smallvec![Effect::future(async move {
                    Some(match api.update(id, patch).await {
                        Ok(course) => A::UpdateCourseSucceeded { course },
                        Err(err) => A::UpdateCourseFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::UpdateCourseSucceeded { course } => {
                state.courses.update_one(course.id, |c| *c = course.clone());
                state.courses.loading = false;
                smallvec![]
            }
            A::UpdateCourseFailed { error } => {
                tracing::warn!(%error, "Updating course failed");
                state.courses.loading = false;
                state.courses.error = Some(error);
                smallvec![]
            }
            A::DeleteCourse { id } => {
                state.courses.loading = true;
                state.courses.error = None;
                let api = env.courses.clone();
                smallvec![Effect::future(async move {
                    Some(match api.delete(id).await {
                        Ok(()) => A::DeleteCourseSucceeded { id },
                        Err(err) => A::DeleteCourseFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::DeleteCourseSucceeded { id } => {
                state.courses.remove_one(id);
                state.courses.loading = false;
                smallvec![]
            }
            A::DeleteCourseFailed { error } => {
                tracing::warn!(%error, "Deleting course failed");
                state.courses.loading = false;
                state.courses.error = Some(error);
                smallvec![]
            }
            A::SelectCourse { id } => {
                state.courses.selected_id = Some(id);
                smallvec![]
            }
            A::ClearSelectedCourse => {
                state.courses.selected_id = None;
                smallvec![]
            }
            A::IncrementEnrollment { course_id } => {
                // Pure local adjustment. Unknown course ids are tolerated:
                // the course snapshot may not be loaded yet.
                metrics::counter!("registry.seats.adjusted", "direction" => "up").increment(1);
                state.courses.update_one(course_id, |c| {
                    c.enrolled =
                        coordinator::apply_adjustment(c.enrolled, c.capacity, SeatAdjustment::Increment);
                });
                smallvec![]
            }
            A::DecrementEnrollment { course_id } => {
                metrics::counter!("registry.seats.adjusted", "direction" => "down").increment(1);
                state.courses.update_one(course_id, |c| {
                    c.enrolled =
                        coordinator::apply_adjustment(c.enrolled, c.capacity, SeatAdjustment::Decrement);
                });
                smallvec![]
            }

            // ----- enrollments -----
            A::LoadEnrollments => {
                state.enrollments.generation = state.enrollments.generation.wrapping_add(1);
                state.enrollments.loading = true;
                state.enrollments.error = None;
                let generation = state.enrollments.generation;
                let api = env.enrollments.clone();
                smallvec![Effect::future(async move {
                    Some(match api.list().await {
                        Ok(enrollments) => A::LoadEnrollmentsSucceeded {
                            enrollments,
                            generation,
                        },
                        Err(err) => A::LoadEnrollmentsFailed {
                            error: err.to_string(),
                            generation,
                        },
                    })
                })]
            }
            A::LoadEnrollmentsSucceeded {
                enrollments,
                generation,
            } => {
                if generation != state.enrollments.generation {
                    tracing::debug!(generation, "Discarding superseded enrollment load");
                    return smallvec![];
                }
                state.enrollments.set_all(enrollments);
                state.enrollments.loading = false;
                state.enrollments.loaded = true;
                state.enrollments.error = None;
                smallvec![]
            }
            A::LoadEnrollmentsFailed { error, generation } => {
                if generation != state.enrollments.generation {
                    tracing::debug!(generation, "Discarding superseded enrollment load failure");
                    return smallvec![];
                }
                tracing::warn!(%error, "Loading enrollments failed");
                state.enrollments.loading = false;
                state.enrollments.error = Some(error);
                smallvec![]
            }
            A::AddEnrollment { mut new } => {
                if let Err(reason) = coordinator::admit_new_enrollment(state, &new) {
                    return reject(reason);
                }
                if new.enrollment_date.is_none() {
                    new.enrollment_date = Some(env.clock.now().date_naive());
                }
                state.enrollments.loading = true;
                state.enrollments.error = None;
                let api = env.enrollments.clone();
                smallvec![Effect::future(async move {
                    Some(match api.create(new).await {
                        Ok(enrollment) => A::AddEnrollmentSucceeded { enrollment },
                        Err(err) => A::AddEnrollmentFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::AddEnrollmentSucceeded { enrollment } => {
                tracing::info!(
                    enrollment_id = %enrollment.id,
                    course_id = %enrollment.course_id,
                    "Enrollment created"
                );
                let course_id = enrollment.course_id;
                state.enrollments.add_one(enrollment);
                state.enrollments.loading = false;
                smallvec![Effect::future(async move {
                    Some(A::IncrementEnrollment { course_id })
                })]
            }
            A::AddEnrollmentFailed { error } => {
                tracing::warn!(%error, "Creating enrollment failed");
                state.enrollments.loading = false;
                state.enrollments.error = Some(error);
                smallvec![]
            }
            A::UpdateEnrollment { id, patch } => {
                state.enrollments.loading = true;
                state.enrollments.error = None;
                let api = env.enrollments.clone();
                smallvec![Effect::future(async move {
                    Some(match api.update(id, patch).await {
                        Ok(enrollment) => A::UpdateEnrollmentSucceeded { enrollment },
                        Err(err) => A::UpdateEnrollmentFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::UpdateEnrollmentSucceeded { enrollment } => {
                state
                    .enrollments
                    .update_one(enrollment.id, |e| *e = enrollment.clone());
                state.enrollments.loading = false;
                smallvec![]
            }
            A::UpdateEnrollmentFailed { error } => {
                tracing::warn!(%error, "Updating enrollment failed");
                state.enrollments.loading = false;
                state.enrollments.error = Some(error);
                smallvec![]
            }
            A::CancelEnrollment { id } => {
                self.transition(state, env, id, EnrollmentStatus::Cancelled)
            }
            A::CompleteEnrollment { id } => {
                self.transition(state, env, id, EnrollmentStatus::Completed)
            }
            A::ReactivateEnrollment { id } => {
                self.transition(state, env, id, EnrollmentStatus::Active)
            }
            A::EnrollmentStatusChanged {
                enrollment,
                previous,
            } => {
                tracing::info!(
                    enrollment_id = %enrollment.id,
                    from = %previous,
                    to = %enrollment.status,
                    "Enrollment status changed"
                );
                let course_id = enrollment.course_id;
                let adjustment = match (previous.is_active(), enrollment.status.is_active()) {
                    (true, false) => Some(SeatAdjustment::Decrement),
                    (false, true) => Some(SeatAdjustment::Increment),
                    _ => None,
                };
                state
                    .enrollments
                    .update_one(enrollment.id, |e| *e = enrollment.clone());
                state.enrollments.loading = false;
                match adjustment {
                    Some(adjustment) => {
                        let follow_up = adjustment_action(adjustment, course_id);
                        smallvec![Effect::future(async move { Some(follow_up) })]
                    }
                    None => smallvec![],
                }
            }
            A::EnrollmentRejected { reason } => {
                // Terminal. Records are untouched; only the display error
                // on the collection is set.
                state.enrollments.error = Some(reason.to_string());
                smallvec![]
            }
            A::DeleteEnrollment { id } => {
                let Some(enrollment) = state.enrollments.select_by_id(id) else {
                    return reject(AdmissionError::EnrollmentNotFound { enrollment_id: id });
                };
                let course_id = enrollment.course_id;
                let was_active = enrollment.status.is_active();
                state.enrollments.loading = true;
                state.enrollments.error = None;
                let api = env.enrollments.clone();
                smallvec![Effect::future(async move {
                    Some(match api.delete(id).await {
                        Ok(()) => A::DeleteEnrollmentSucceeded {
                            id,
                            course_id,
                            was_active,
                        },
                        Err(err) => A::DeleteEnrollmentFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::DeleteEnrollmentSucceeded {
                id,
                course_id,
                was_active,
            } => {
                state.enrollments.remove_one(id);
                state.enrollments.loading = false;
                if was_active {
                    let follow_up = adjustment_action(SeatAdjustment::Decrement, course_id);
                    smallvec![Effect::future(async move { Some(follow_up) })]
                } else {
                    // The row already gave its seat back when it left
                    // Active; deleting it must not decrement twice.
                    smallvec![]
                }
            }
            A::DeleteEnrollmentFailed { error } => {
                tracing::warn!(%error, "Deleting enrollment failed");
                state.enrollments.loading = false;
                state.enrollments.error = Some(error);
                smallvec![]
            }
            A::SelectEnrollment { id } => {
                state.enrollments.selected_id = Some(id);
                smallvec![]
            }
            A::ClearSelectedEnrollment => {
                state.enrollments.selected_id = None;
                smallvec![]
            }

            // ----- users -----
            A::LoadUsers => {
                state.users.generation = state.users.generation.wrapping_add(1);
                state.users.loading = true;
                state.users.error = None;
                let generation = state.users.generation;
                let api = env.users.clone();
                smallvec![Effect::future(async move {
                    Some(match api.list().await {
                        Ok(users) => A::LoadUsersSucceeded { users, generation },
                        Err(err) => A::LoadUsersFailed {
                            error: err.to_string(),
                            generation,
                        },
                    })
                })]
            }
            A::LoadUsersSucceeded { users, generation } => {
                if generation != state.users.generation {
                    tracing::debug!(generation, "Discarding superseded user load");
                    return smallvec![];
                }
                state.users.set_all(users);
                state.users.loading = false;
                state.users.loaded = true;
                state.users.error = None;
                smallvec![]
            }
            A::LoadUsersFailed { error, generation } => {
                if generation != state.users.generation {
                    tracing::debug!(generation, "Discarding superseded user load failure");
                    return smallvec![];
                }
                tracing::warn!(%error, "Loading users failed");
                state.users.loading = false;
                state.users.error = Some(error);
                smallvec![]
            }
            A::AddUser { new } => {
                state.users.loading = true;
                state.users.error = None;
                let api = env.users.clone();
                smallvec![Effect::future(async move {
                    Some(match api.create(new).await {
                        Ok(user) => A::AddUserSucceeded { user },
                        Err(err) => A::AddUserFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::AddUserSucceeded { user } => {
                state.users.add_one(user);
                state.users.loading = false;
                smallvec![]
            }
            A::AddUserFailed { error } => {
                tracing::warn!(%error, "Creating user failed");
                state.users.loading = false;
                state.users.error = Some(error);
                smallvec![]
            }
            A::UpdateUser { id, patch } => {
                state.users.loading = true;
                state.users.error = None;
                let api = env.users.clone();
                smallvec![Effect::future(async move {
                    Some(match api.update(id, patch).await {
                        Ok(user) => A::UpdateUserSucceeded { user },
                        Err(err) => A::UpdateUserFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::UpdateUserSucceeded { user } => {
                state.users.update_one(user.id, |u| *u = user.clone());
                state.users.loading = false;
                smallvec![]
            }
            A::UpdateUserFailed { error } => {
                tracing::warn!(%error, "Updating user failed");
                state.users.loading = false;
                state.users.error = Some(error);
                smallvec![]
            }
            A::DeleteUser { id } => {
                state.users.loading = true;
                state.users.error = None;
                let api = env.users.clone();
                smallvec![Effect::future(async move {
                    Some(match api.delete(id).await {
                        Ok(()) => A::DeleteUserSucceeded { id },
                        Err(err) => A::DeleteUserFailed {
                            error: err.to_string(),
                        },
                    })
                })]
            }
            A::DeleteUserSucceeded { id } => {
                state.users.remove_one(id);
                state.users.loading = false;
                smallvec![]
            }
            A::DeleteUserFailed { error } => {
                tracing::warn!(%error, "Deleting user failed");
                state.users.loading = false;
                state.users.error = Some(error);
                smallvec![]
            }
            A::SelectUser { id } => {
                state.users.selected_id = Some(id);
                smallvec![]
            }
            A::ClearSelectedUser => {
                state.users.selected_id = None;
                smallvec![]
            }
        }
    }
}

impl RegistryReducer {
    /// Shared path for cancel, complete and reactivate: admit locally,
    /// persist remotely, report the committed transition with its previous
    /// status so the settlement can adjust the seat count.
    fn transition(
        &self,
        state: &mut RegistryState,
        env: &RegistryEnvironment,
        id: crate::types::EnrollmentId,
        to: EnrollmentStatus,
    ) -> Effects {
        let plan = match coordinator::admit_transition(state, id, to) {
            Ok(plan) => plan,
            Err(reason) => return reject(reason),
        };
        state.enrollments.loading = true;
        state.enrollments.error = None;
        let api = env.enrollments.clone();
        smallvec![Effect::future(async move {
            Some(match api.set_status(id, plan.to).await {
                Ok(enrollment) => RegistryAction::EnrollmentStatusChanged {
                    enrollment,
                    previous: plan.previous,
                },
                Err(err) => RegistryAction::UpdateEnrollmentFailed {
                    error: err.to_string(),
                },
            })
        })]
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::api::InMemoryRecordsApi;
    use crate::types::{
        Course, CourseId, Enrollment, EnrollmentId, NewEnrollment, Student, StudentId,
    };
    use campus_registry_testing::{assertions, ReducerTest};
    use chrono::NaiveDate;

    fn env() -> RegistryEnvironment {
        RegistryEnvironment::in_memory(InMemoryRecordsApi::new())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn course(capacity: u32, enrolled: u32) -> Course {
        Course {
            id: CourseId(1),
            name: "Systems Programming".into(),
            code: "CS-301".into(),
            instructor: "R. Huang".into(),
            duration: 40,
            start_date: date(),
            end_date: date(),
            capacity,
            enrolled,
        }
    }

    fn student() -> Student {
        Student {
            id: StudentId(1),
            first_name: "Ada".into(),
            last_name: "Diallo".into(),
            age: 21,
            email: "ada@example.edu".into(),
        }
    }

    fn enrollment(status: EnrollmentStatus) -> Enrollment {
        Enrollment {
            id: EnrollmentId(9),
            student_id: StudentId(1),
            course_id: CourseId(1),
            enrollment_date: date(),
            status,
        }
    }

    fn seeded(capacity: u32, enrolled: u32) -> RegistryState {
        let mut state = RegistryState::default();
        state.students.add_one(student());
        state.courses.add_one(course(capacity, enrolled));
        state
    }

    #[test]
    fn increment_clamps_at_capacity() {
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(seeded(2, 2))
            .when_action(RegistryAction::IncrementEnrollment {
                course_id: CourseId(1),
            })
            .then_state(|state| {
                assert_eq!(state.courses.select_by_id(CourseId(1)).unwrap().enrolled, 2);
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn decrement_clamps_at_zero() {
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(seeded(2, 0))
            .when_action(RegistryAction::DecrementEnrollment {
                course_id: CourseId(1),
            })
            .then_state(|state| {
                assert_eq!(state.courses.select_by_id(CourseId(1)).unwrap().enrolled, 0);
            })
            .run();
    }

    #[test]
    fn adjustments_tolerate_unknown_courses() {
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(RegistryState::default())
            .when_action(RegistryAction::IncrementEnrollment {
                course_id: CourseId(404),
            })
            .then_state(|state| assert!(state.courses.is_empty()))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn full_course_rejects_without_touching_records() {
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(seeded(1, 1))
            .when_action(RegistryAction::AddEnrollment {
                new: NewEnrollment {
                    student_id: StudentId(1),
                    course_id: CourseId(1),
                    enrollment_date: Some(date()),
                },
            })
            .then_state(|state| {
                assert!(state.enrollments.is_empty());
                assert!(!state.enrollments.loading);
                assert_eq!(state.courses.select_by_id(CourseId(1)).unwrap().enrolled, 1);
            })
            // the rejection itself is fed back as an event
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    #[test]
    fn admitted_enrollment_marks_loading_and_calls_out() {
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(seeded(2, 1))
            .when_action(RegistryAction::AddEnrollment {
                new: NewEnrollment {
                    student_id: StudentId(1),
                    course_id: CourseId(1),
                    enrollment_date: Some(date()),
                },
            })
            .then_state(|state| {
                assert!(state.enrollments.loading);
                assert!(state.enrollments.is_empty());
            })
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    #[test]
    fn committed_enrollment_owes_exactly_one_increment() {
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(seeded(2, 0))
            .when_action(RegistryAction::AddEnrollmentSucceeded {
                enrollment: enrollment(EnrollmentStatus::Active),
            })
            .then_state(|state| {
                assert!(state.enrollments.contains(EnrollmentId(9)));
                assert!(!state.enrollments.loading);
                // count is not touched here; the follow-up command does it
                assert_eq!(state.courses.select_by_id(CourseId(1)).unwrap().enrolled, 0);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn rejection_event_only_records_the_reason() {
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(seeded(2, 1))
            .when_action(RegistryAction::EnrollmentRejected {
                reason: AdmissionError::CourseFull {
                    course_id: CourseId(1),
                    capacity: 2,
                },
            })
            .then_state(|state| {
                assert!(state.enrollments.error.as_deref().unwrap().contains("full"));
                assert!(state.enrollments.is_empty());
                assert_eq!(state.courses.select_by_id(CourseId(1)).unwrap().enrolled, 1);
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn stale_load_response_is_discarded() {
        let mut state = seeded(2, 0);
        state.students.generation = 3;
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(state)
            .when_action(RegistryAction::LoadStudentsSucceeded {
                students: vec![],
                generation: 2,
            })
            .then_state(|state| {
                // the stale empty response must not wipe the collection
                assert!(state.students.contains(StudentId(1)));
                assert!(!state.students.loaded);
            })
            .run();
    }

    #[test]
    fn empty_load_still_marks_loaded() {
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(RegistryState::default())
            .when_action(RegistryAction::LoadStudentsSucceeded {
                students: vec![],
                generation: 0,
            })
            .then_state(|state| {
                assert!(state.students.loaded);
                assert!(state.students.is_empty());
                assert!(!state.students.loading);
            })
            .run();
    }

    #[test]
    fn deleting_inactive_enrollment_owes_nothing() {
        let mut state = seeded(2, 1);
        state.enrollments.add_one(enrollment(EnrollmentStatus::Cancelled));
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(state)
            .when_action(RegistryAction::DeleteEnrollmentSucceeded {
                id: EnrollmentId(9),
                course_id: CourseId(1),
                was_active: false,
            })
            .then_state(|state| assert!(state.enrollments.is_empty()))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn status_change_from_active_owes_a_decrement() {
        let mut state = seeded(3, 3);
        state.enrollments.add_one(enrollment(EnrollmentStatus::Active));
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(state)
            .when_action(RegistryAction::EnrollmentStatusChanged {
                enrollment: enrollment(EnrollmentStatus::Cancelled),
                previous: EnrollmentStatus::Active,
            })
            .then_state(|state| {
                assert_eq!(
                    state.enrollments.select_by_id(EnrollmentId(9)).unwrap().status,
                    EnrollmentStatus::Cancelled
                );
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn selection_is_local_and_effect_free() {
        ReducerTest::new(RegistryReducer)
            .with_env(env())
            .given_state(seeded(2, 0))
            .when_action(RegistryAction::SelectStudent { id: StudentId(1) })
            .then_state(|state| assert_eq!(state.students.selected_id, Some(StudentId(1))))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }
}
