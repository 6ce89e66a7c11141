//! Read-side selectors.
//!
//! Pure functions over a state snapshot. Joins are tolerant of broken
//! references: an enrollment whose student or course was deleted renders
//! with a placeholder rather than failing.

use crate::state::RegistryState;
use crate::types::{
    Course, CourseId, Enrollment, EnrollmentStatus, Student, StudentId, User,
};
use campus_registry_core::Serialize;

/// An enrollment joined with display fields from its student and course.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedEnrollment {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub student_name: String,
    pub student_email: String,
    pub course_name: String,
    pub course_code: String,
}

/// All enrollments joined with student and course display fields, in
/// insertion order.
#[must_use]
pub fn enriched_enrollments(state: &RegistryState) -> Vec<EnrichedEnrollment> {
    state
        .enrollments
        .select_all()
        .map(|enrollment| enrich(state, enrollment))
        .collect()
}

fn enrich(state: &RegistryState, enrollment: &Enrollment) -> EnrichedEnrollment {
    let (student_name, student_email) = state
        .students
        .select_by_id(enrollment.student_id)
        .map_or_else(
            || ("Unknown Student".to_string(), "N/A".to_string()),
            |s| (s.full_name(), s.email.clone()),
        );
    let (course_name, course_code) = state
        .courses
        .select_by_id(enrollment.course_id)
        .map_or_else(
            || ("Unknown Course".to_string(), "N/A".to_string()),
            |c| (c.name.clone(), c.code.clone()),
        );
    EnrichedEnrollment {
        enrollment: enrollment.clone(),
        student_name,
        student_email,
        course_name,
        course_code,
    }
}

#[must_use]
pub fn enrollments_by_course(state: &RegistryState, course_id: CourseId) -> Vec<Enrollment> {
    state
        .enrollments
        .select_all()
        .filter(|e| e.course_id == course_id)
        .cloned()
        .collect()
}

#[must_use]
pub fn enrollments_by_student(state: &RegistryState, student_id: StudentId) -> Vec<Enrollment> {
    state
        .enrollments
        .select_all()
        .filter(|e| e.student_id == student_id)
        .cloned()
        .collect()
}

#[must_use]
pub fn active_enrollments(state: &RegistryState) -> Vec<Enrollment> {
    enrollments_by_status(state, EnrollmentStatus::Active)
}

#[must_use]
pub fn enrollments_by_status(state: &RegistryState, status: EnrollmentStatus) -> Vec<Enrollment> {
    state
        .enrollments
        .select_all()
        .filter(|e| e.status == status)
        .cloned()
        .collect()
}

/// Courses ordered by seats taken, fullest first. Ties keep insertion order.
#[must_use]
pub fn courses_by_enrollment(state: &RegistryState) -> Vec<Course> {
    let mut courses: Vec<Course> = state.courses.select_all().cloned().collect();
    courses.sort_by(|a, b| b.enrolled.cmp(&a.enrolled));
    courses
}

/// Courses ordered by free seats, most available first.
#[must_use]
pub fn courses_by_available_seats(state: &RegistryState) -> Vec<Course> {
    let mut courses: Vec<Course> = state.courses.select_all().cloned().collect();
    courses.sort_by(|a, b| b.seats_left().cmp(&a.seats_left()));
    courses
}

/// Case-insensitive student search over name and email.
#[must_use]
pub fn search_students<'a>(state: &'a RegistryState, query: &str) -> Vec<&'a Student> {
    let query = query.to_lowercase();
    state
        .students
        .select_all()
        .filter(|s| {
            s.full_name().to_lowercase().contains(&query)
                || s.email.to_lowercase().contains(&query)
        })
        .collect()
}

/// Case-insensitive course search over name, code and instructor.
#[must_use]
pub fn search_courses<'a>(state: &'a RegistryState, query: &str) -> Vec<&'a Course> {
    let query = query.to_lowercase();
    state
        .courses
        .select_all()
        .filter(|c| {
            c.name.to_lowercase().contains(&query)
                || c.code.to_lowercase().contains(&query)
                || c.instructor.to_lowercase().contains(&query)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub total: usize,
    /// Mean age rounded to the nearest year; `0` for an empty collection.
    pub average_age: u32,
}

#[must_use]
pub fn student_stats(state: &RegistryState) -> StudentStats {
    let total = state.students.select_total();
    let average_age = if total == 0 {
        0
    } else {
        let sum: u64 = state.students.select_all().map(|s| u64::from(s.age)).sum();
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            (sum as f64 / total as f64).round() as u32
        }
    };
    StudentStats { total, average_age }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
    pub total: usize,
    pub total_enrolled: u32,
    /// Mean enrolled-per-course, rounded to one decimal; `0.0` when there
    /// are no courses.
    pub average_enrollment: f64,
    /// Seats taken across all courses as a whole percentage of capacity;
    /// `0` when total capacity is zero.
    pub capacity_utilization: u32,
    /// Courses that still have at least one free seat.
    pub active_courses: usize,
    pub full_courses: usize,
}

#[must_use]
pub fn course_stats(state: &RegistryState) -> CourseStats {
    let total = state.courses.select_total();
    let total_enrolled: u32 = state.courses.select_all().map(|c| c.enrolled).sum();
    let total_capacity: u32 = state.courses.select_all().map(|c| c.capacity).sum();
    let full_courses = state.courses.select_all().filter(|c| c.is_full()).count();
    let active_courses = total - full_courses;

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let average_enrollment = if total == 0 {
        0.0
    } else {
        (f64::from(total_enrolled) / total as f64 * 10.0).round() / 10.0
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let capacity_utilization = if total_capacity == 0 {
        0
    } else {
        (f64::from(total_enrolled) / f64::from(total_capacity) * 100.0).round() as u32
    };

    CourseStats {
        total,
        total_enrolled,
        average_enrollment,
        capacity_utilization,
        active_courses,
        full_courses,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub cancelled: usize,
}

#[must_use]
pub fn enrollment_stats(state: &RegistryState) -> EnrollmentStats {
    let mut stats = EnrollmentStats {
        total: 0,
        active: 0,
        completed: 0,
        cancelled: 0,
    };
    for enrollment in state.enrollments.select_all() {
        stats.total += 1;
        match enrollment.status {
            EnrollmentStatus::Active => stats.active += 1,
            EnrollmentStatus::Completed => stats.completed += 1,
            EnrollmentStatus::Cancelled => stats.cancelled += 1,
        }
    }
    stats
}

/// Snapshot handed to a students list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentsView {
    pub students: Vec<Student>,
    pub loading: bool,
    pub error: Option<String>,
    pub stats: StudentStats,
}

#[must_use]
pub fn students_view(state: &RegistryState) -> StudentsView {
    StudentsView {
        students: state.students.select_all().cloned().collect(),
        loading: state.students.loading,
        error: state.students.error.clone(),
        stats: student_stats(state),
    }
}

/// Snapshot handed to a courses list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursesView {
    pub courses: Vec<Course>,
    pub loading: bool,
    pub error: Option<String>,
    pub stats: CourseStats,
}

#[must_use]
pub fn courses_view(state: &RegistryState) -> CoursesView {
    CoursesView {
        courses: state.courses.select_all().cloned().collect(),
        loading: state.courses.loading,
        error: state.courses.error.clone(),
        stats: course_stats(state),
    }
}

/// Snapshot handed to an enrollments list view, records pre-joined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentsView {
    pub enrollments: Vec<EnrichedEnrollment>,
    pub loading: bool,
    pub error: Option<String>,
    pub stats: EnrollmentStats,
}

#[must_use]
pub fn enrollments_view(state: &RegistryState) -> EnrollmentsView {
    EnrollmentsView {
        enrollments: enriched_enrollments(state),
        loading: state.enrollments.loading,
        error: state.enrollments.error.clone(),
        stats: enrollment_stats(state),
    }
}

#[must_use]
pub fn users_view(state: &RegistryState) -> Vec<User> {
    state.users.select_all().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseId, EnrollmentId};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn student(id: u64, first: &str, last: &str, age: u32) -> Student {
        Student {
            id: StudentId(id),
            first_name: first.into(),
            last_name: last.into(),
            age,
            email: format!("{}@example.edu", first.to_lowercase()),
        }
    }

    fn course(id: u64, name: &str, code: &str, capacity: u32, enrolled: u32) -> Course {
        Course {
            id: CourseId(id),
            name: name.into(),
            code: code.into(),
            instructor: "R. Huang".into(),
            duration: 40,
            start_date: date(),
            end_date: date(),
            capacity,
            enrolled,
        }
    }

    fn enrollment(id: u64, student: u64, course: u64, status: EnrollmentStatus) -> Enrollment {
        Enrollment {
            id: EnrollmentId(id),
            student_id: StudentId(student),
            course_id: CourseId(course),
            enrollment_date: date(),
            status,
        }
    }

    #[test]
    fn empty_aggregates_are_zero() {
        let state = RegistryState::default();
        assert_eq!(student_stats(&state).average_age, 0);
        let stats = course_stats(&state);
        assert_eq!(stats.average_enrollment, 0.0);
        assert_eq!(stats.capacity_utilization, 0);
    }

    #[test]
    fn average_age_rounds_to_nearest_year() {
        let mut state = RegistryState::default();
        state.students.add_one(student(1, "Ada", "Diallo", 21));
        state.students.add_one(student(2, "Ben", "Okafor", 22));
        state.students.add_one(student(3, "Caro", "Lindt", 25));
        // mean 22.67 rounds to 23
        assert_eq!(student_stats(&state).average_age, 23);
    }

    #[test]
    fn average_enrollment_keeps_one_decimal() {
        let mut state = RegistryState::default();
        state.courses.add_one(course(1, "A", "A-1", 10, 3));
        state.courses.add_one(course(2, "B", "B-1", 10, 4));
        state.courses.add_one(course(3, "C", "C-1", 10, 4));
        // mean 3.666... rounds to 3.7
        assert_eq!(course_stats(&state).average_enrollment, 3.7);
    }

    #[test]
    fn utilization_is_a_whole_percentage() {
        let mut state = RegistryState::default();
        state.courses.add_one(course(1, "A", "A-1", 30, 10));
        assert_eq!(course_stats(&state).capacity_utilization, 33);
    }

    #[test]
    fn broken_references_render_placeholders() {
        let mut state = RegistryState::default();
        state
            .enrollments
            .add_one(enrollment(1, 99, 98, EnrollmentStatus::Active));

        let enriched = enriched_enrollments(&state);
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].student_name, "Unknown Student");
        assert_eq!(enriched[0].student_email, "N/A");
        assert_eq!(enriched[0].course_name, "Unknown Course");
        assert_eq!(enriched[0].course_code, "N/A");
    }

    #[test]
    fn course_orderings_sort_without_dropping_records() {
        let mut state = RegistryState::default();
        state.courses.add_one(course(1, "A", "A-1", 10, 2));
        state.courses.add_one(course(2, "B", "B-1", 10, 9));
        state.courses.add_one(course(3, "C", "C-1", 10, 5));

        let by_enrollment: Vec<_> = courses_by_enrollment(&state)
            .iter()
            .map(|c| c.id.0)
            .collect();
        assert_eq!(by_enrollment, [2, 3, 1]);

        let by_seats: Vec<_> = courses_by_available_seats(&state)
            .iter()
            .map(|c| c.id.0)
            .collect();
        assert_eq!(by_seats, [1, 3, 2]);
    }

    #[test]
    fn full_and_active_course_counts_partition_the_collection() {
        let mut state = RegistryState::default();
        state.courses.add_one(course(1, "A", "A-1", 2, 2));
        state.courses.add_one(course(2, "B", "B-1", 2, 1));

        let stats = course_stats(&state);
        assert_eq!(stats.full_courses, 1);
        assert_eq!(stats.active_courses, 1);
    }

    #[test]
    fn enrichment_joins_names_and_codes() {
        let mut state = RegistryState::default();
        state.students.add_one(student(1, "Ada", "Diallo", 21));
        state.courses.add_one(course(2, "Systems", "CS-301", 10, 1));
        state
            .enrollments
            .add_one(enrollment(3, 1, 2, EnrollmentStatus::Active));

        let enriched = enriched_enrollments(&state);
        assert_eq!(enriched[0].student_name, "Ada Diallo");
        assert_eq!(enriched[0].course_code, "CS-301");
    }

    #[test]
    fn search_matches_all_display_fields() {
        let mut state = RegistryState::default();
        state.students.add_one(student(1, "Ada", "Diallo", 21));
        state.courses.add_one(course(2, "Systems", "CS-301", 10, 0));

        assert_eq!(search_students(&state, "diallo").len(), 1);
        assert_eq!(search_students(&state, "ada@example").len(), 1);
        assert_eq!(search_students(&state, "nope").len(), 0);
        assert_eq!(search_courses(&state, "cs-3").len(), 1);
        assert_eq!(search_courses(&state, "huang").len(), 1);
    }

    #[test]
    fn enrollment_stats_count_by_status() {
        let mut state = RegistryState::default();
        state
            .enrollments
            .add_one(enrollment(1, 1, 1, EnrollmentStatus::Active));
        state
            .enrollments
            .add_one(enrollment(2, 2, 1, EnrollmentStatus::Completed));
        state
            .enrollments
            .add_one(enrollment(3, 3, 1, EnrollmentStatus::Cancelled));

        let stats = enrollment_stats(&state);
        assert_eq!(
            (stats.total, stats.active, stats.completed, stats.cancelled),
            (3, 1, 1, 1)
        );
    }
}
