//! Enrollment admission control.
//!
//! The coordinator keeps `Course::enrolled` consistent with the set of
//! `Active` enrollments without transactions: every seat-affecting command
//! passes a pure admission check against the current snapshot, and every
//! committed change emits exactly one correlated seat-count adjustment.
//! Rejections happen before any effect runs and mutate nothing.

use crate::error::AdmissionError;
use crate::state::RegistryState;
use crate::types::{CourseId, EnrollmentId, EnrollmentStatus, NewEnrollment};

/// Direction of a seat-count adjustment on a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatAdjustment {
    Increment,
    Decrement,
}

/// Admitted status transition, with the adjustment to emit once the
/// remote update commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub course_id: CourseId,
    pub previous: EnrollmentStatus,
    pub to: EnrollmentStatus,
    pub adjustment: Option<SeatAdjustment>,
}

/// Admission check for a new enrollment. Checks run in order and
/// short-circuit on the first failure.
pub fn admit_new_enrollment(
    state: &RegistryState,
    new: &NewEnrollment,
) -> Result<(), AdmissionError> {
    if !state.students.contains(new.student_id) {
        return Err(AdmissionError::StudentNotFound {
            student_id: new.student_id,
        });
    }
    let Some(course) = state.courses.select_by_id(new.course_id) else {
        return Err(AdmissionError::CourseNotFound {
            course_id: new.course_id,
        });
    };
    if course.is_full() {
        return Err(AdmissionError::CourseFull {
            course_id: course.id,
            capacity: course.capacity,
        });
    }
    if state.has_counted_enrollment(new.student_id, new.course_id) {
        return Err(AdmissionError::DuplicateEnrollment {
            student_id: new.student_id,
            course_id: new.course_id,
        });
    }
    Ok(())
}

/// Admission check for a status transition.
///
/// Leaving `Active` always decrements; re-entering `Active` requires a free
/// seat and increments. Every other edge is rejected as invalid, including
/// transitions to the current status.
pub fn admit_transition(
    state: &RegistryState,
    id: EnrollmentId,
    to: EnrollmentStatus,
) -> Result<TransitionPlan, AdmissionError> {
    let Some(enrollment) = state.enrollments.select_by_id(id) else {
        return Err(AdmissionError::EnrollmentNotFound { enrollment_id: id });
    };
    let previous = enrollment.status;
    let course_id = enrollment.course_id;

    let adjustment = match (previous, to) {
        (EnrollmentStatus::Active, EnrollmentStatus::Cancelled)
        | (EnrollmentStatus::Active, EnrollmentStatus::Completed) => {
            Some(SeatAdjustment::Decrement)
        }
        (EnrollmentStatus::Cancelled, EnrollmentStatus::Active)
        | (EnrollmentStatus::Completed, EnrollmentStatus::Active) => {
            let Some(course) = state.courses.select_by_id(course_id) else {
                return Err(AdmissionError::CourseNotFound { course_id });
            };
            if course.is_full() {
                return Err(AdmissionError::CourseFull {
                    course_id,
                    capacity: course.capacity,
                });
            }
            Some(SeatAdjustment::Increment)
        }
        (from, to) => return Err(AdmissionError::InvalidTransition { from, to }),
    };

    Ok(TransitionPlan {
        course_id,
        previous,
        to,
        adjustment,
    })
}

/// Adjustment owed when an enrollment row is deleted. Only an `Active`
/// enrollment still occupies a seat; deleting a Cancelled or Completed row
/// must not decrement a second time.
#[must_use]
pub fn delete_adjustment(status: EnrollmentStatus) -> Option<SeatAdjustment> {
    status.is_active().then_some(SeatAdjustment::Decrement)
}

/// Apply an adjustment to a seat count, clamped to `0..=capacity`.
/// Never fails; a clamp that engages means the count had already drifted.
#[must_use]
pub fn apply_adjustment(enrolled: u32, capacity: u32, adjustment: SeatAdjustment) -> u32 {
    match adjustment {
        SeatAdjustment::Increment => enrolled.saturating_add(1).min(capacity),
        SeatAdjustment::Decrement => enrolled.saturating_sub(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Course, Enrollment, Student, StudentId};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn state_with(capacity: u32, enrolled: u32) -> RegistryState {
        let mut state = RegistryState::default();
        state.students.add_one(Student {
            id: StudentId(1),
            first_name: "Ada".into(),
            last_name: "Diallo".into(),
            age: 21,
            email: "ada@example.edu".into(),
        });
        state.courses.add_one(Course {
            id: CourseId(1),
            name: "Systems Programming".into(),
            code: "CS-301".into(),
            instructor: "R. Huang".into(),
            duration: 40,
            start_date: date(),
            end_date: date(),
            capacity,
            enrolled,
        });
        state
    }

    fn new_enrollment() -> NewEnrollment {
        NewEnrollment {
            student_id: StudentId(1),
            course_id: CourseId(1),
            enrollment_date: Some(date()),
        }
    }

    #[test]
    fn admits_when_all_checks_pass() {
        let state = state_with(10, 3);
        assert_eq!(admit_new_enrollment(&state, &new_enrollment()), Ok(()));
    }

    #[test]
    fn checks_run_in_order_and_short_circuit() {
        // Unknown student on a full course: the student check fires first.
        let state = state_with(1, 1);
        let new = NewEnrollment {
            student_id: StudentId(99),
            ..new_enrollment()
        };
        assert_eq!(
            admit_new_enrollment(&state, &new),
            Err(AdmissionError::StudentNotFound {
                student_id: StudentId(99)
            })
        );
    }

    #[test]
    fn full_course_rejects() {
        let state = state_with(2, 2);
        assert_eq!(
            admit_new_enrollment(&state, &new_enrollment()),
            Err(AdmissionError::CourseFull {
                course_id: CourseId(1),
                capacity: 2
            })
        );
    }

    #[test]
    fn completed_enrollment_blocks_duplicate() {
        let mut state = state_with(10, 0);
        state.enrollments.add_one(Enrollment {
            id: EnrollmentId(1),
            student_id: StudentId(1),
            course_id: CourseId(1),
            enrollment_date: date(),
            status: EnrollmentStatus::Completed,
        });
        assert_eq!(
            admit_new_enrollment(&state, &new_enrollment()),
            Err(AdmissionError::DuplicateEnrollment {
                student_id: StudentId(1),
                course_id: CourseId(1)
            })
        );
    }

    #[test]
    fn leaving_active_plans_a_decrement() {
        let mut state = state_with(10, 1);
        state.enrollments.add_one(Enrollment {
            id: EnrollmentId(1),
            student_id: StudentId(1),
            course_id: CourseId(1),
            enrollment_date: date(),
            status: EnrollmentStatus::Active,
        });
        let plan = admit_transition(&state, EnrollmentId(1), EnrollmentStatus::Completed).unwrap();
        assert_eq!(plan.adjustment, Some(SeatAdjustment::Decrement));
        assert_eq!(plan.previous, EnrollmentStatus::Active);
    }

    #[test]
    fn reactivation_requires_a_free_seat() {
        let mut state = state_with(1, 1);
        state.enrollments.add_one(Enrollment {
            id: EnrollmentId(1),
            student_id: StudentId(1),
            course_id: CourseId(1),
            enrollment_date: date(),
            status: EnrollmentStatus::Cancelled,
        });
        assert_eq!(
            admit_transition(&state, EnrollmentId(1), EnrollmentStatus::Active),
            Err(AdmissionError::CourseFull {
                course_id: CourseId(1),
                capacity: 1
            })
        );
    }

    #[test]
    fn sideways_and_self_transitions_are_invalid() {
        let mut state = state_with(10, 0);
        state.enrollments.add_one(Enrollment {
            id: EnrollmentId(1),
            student_id: StudentId(1),
            course_id: CourseId(1),
            enrollment_date: date(),
            status: EnrollmentStatus::Cancelled,
        });
        assert_eq!(
            admit_transition(&state, EnrollmentId(1), EnrollmentStatus::Completed),
            Err(AdmissionError::InvalidTransition {
                from: EnrollmentStatus::Cancelled,
                to: EnrollmentStatus::Completed,
            })
        );
        assert_eq!(
            admit_transition(&state, EnrollmentId(1), EnrollmentStatus::Cancelled),
            Err(AdmissionError::InvalidTransition {
                from: EnrollmentStatus::Cancelled,
                to: EnrollmentStatus::Cancelled,
            })
        );
    }

    #[test]
    fn deleting_a_non_active_row_owes_no_adjustment() {
        assert_eq!(
            delete_adjustment(EnrollmentStatus::Active),
            Some(SeatAdjustment::Decrement)
        );
        assert_eq!(delete_adjustment(EnrollmentStatus::Cancelled), None);
        assert_eq!(delete_adjustment(EnrollmentStatus::Completed), None);
    }

    #[test]
    fn missing_enrollment_is_reported_before_anything_else() {
        let state = state_with(10, 0);
        assert_eq!(
            admit_transition(&state, EnrollmentId(42), EnrollmentStatus::Cancelled),
            Err(AdmissionError::EnrollmentNotFound {
                enrollment_id: EnrollmentId(42)
            })
        );
    }

    proptest! {
        #[test]
        fn adjustment_stays_within_bounds(
            enrolled in 0u32..500,
            capacity in 0u32..500,
            increment in proptest::bool::ANY,
        ) {
            let adj = if increment {
                SeatAdjustment::Increment
            } else {
                SeatAdjustment::Decrement
            };
            let next = apply_adjustment(enrolled, capacity, adj);
            prop_assert!(next <= capacity.max(enrolled));
            if adj == SeatAdjustment::Decrement {
                prop_assert!(next <= enrolled);
            }
        }

        #[test]
        fn round_trip_restores_count_when_within_capacity(
            enrolled in 1u32..100,
            headroom in 0u32..100,
        ) {
            let capacity = enrolled + headroom;
            let down = apply_adjustment(enrolled, capacity, SeatAdjustment::Decrement);
            let back = apply_adjustment(down, capacity, SeatAdjustment::Increment);
            prop_assert_eq!(back, enrolled);
        }
    }
}
