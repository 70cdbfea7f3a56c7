//! Workout progress records and their reconciliation with the course curriculum.
//!
//! All operations are pure: they take the current state by value and return
//! the next one. Callers perform the remote step first and only swap in the
//! returned state once it succeeded, so a failed request never leaves a
//! half-applied update behind.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::course::WorkoutRef;
use crate::model::ids::{CourseId, WorkoutId};

/// Percentage value at which an exercise counts as done.
pub const COMPLETE_PERCENT: f64 = 100.0;

/// Returns true when every exercise reached [`COMPLETE_PERCENT`].
///
/// Values are not clamped; an empty list counts as complete.
#[must_use]
pub fn is_complete(progress_data: &[f64]) -> bool {
    progress_data.iter().all(|value| *value >= COMPLETE_PERCENT)
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// Per-user progress for one workout: one percentage per exercise.
///
/// Doubles as the wire shape of the backend's progress entries, where the
/// completion flag is called `workoutCompleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub workout_id: WorkoutId,
    #[serde(default)]
    pub progress_data: Vec<f64>,
    #[serde(default, rename = "workoutCompleted")]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Builds the record produced by a save, deriving the completion flag.
    #[must_use]
    pub fn saved(workout_id: WorkoutId, progress_data: Vec<f64>, at: DateTime<Utc>) -> Self {
        let completed = is_complete(&progress_data);
        Self {
            workout_id,
            progress_data,
            completed,
            updated_at: Some(at),
        }
    }

    /// Builds a not-started record with `exercise_count` zero entries.
    #[must_use]
    pub fn zeroed(workout_id: WorkoutId, exercise_count: usize) -> Self {
        Self {
            workout_id,
            progress_data: vec![0.0; exercise_count],
            completed: false,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn exercise_progress(&self, index: usize) -> f64 {
        self.progress_data.get(index).copied().unwrap_or(0.0)
    }
}

//
// ─── COURSE VIEW ───────────────────────────────────────────────────────────────
//

/// Merged progress of one course, filtered to workouts the course still has.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressView {
    pub workouts_progress: Vec<ProgressRecord>,
    pub total_workouts: usize,
    pub completed_count: usize,
}

impl CourseProgressView {
    /// Reconciles server progress with the course's current workouts.
    ///
    /// Entries for workouts no longer in the course are dropped.
    #[must_use]
    pub fn reconcile(server_progress: Vec<ProgressRecord>, valid_workouts: &[WorkoutRef]) -> Self {
        let valid_ids: HashSet<&WorkoutId> = valid_workouts.iter().map(|w| &w.id).collect();
        let workouts_progress: Vec<ProgressRecord> = server_progress
            .into_iter()
            .filter(|record| valid_ids.contains(&record.workout_id))
            .collect();

        let mut view = Self {
            workouts_progress,
            total_workouts: valid_workouts.len(),
            completed_count: 0,
        };
        view.recount();
        view
    }

    /// Applies a saved record: replace in place when present, append otherwise.
    #[must_use]
    pub fn apply_save(mut self, record: ProgressRecord) -> Self {
        match self.position(&record.workout_id) {
            Some(index) => self.workouts_progress[index] = record,
            None => self.workouts_progress.push(record),
        }
        self.recount();
        self
    }

    /// Zeroes the record for `workout_id` if there is one.
    ///
    /// Without an `exercise_count` the record keeps its own length.
    #[must_use]
    pub fn apply_reset(mut self, workout_id: &WorkoutId, exercise_count: Option<usize>) -> Self {
        if let Some(index) = self.position(workout_id) {
            let record = &mut self.workouts_progress[index];
            let count = exercise_count.unwrap_or(record.progress_data.len());
            *record = ProgressRecord::zeroed(workout_id.clone(), count);
            self.recount();
        }
        self
    }

    #[must_use]
    pub fn record(&self, workout_id: &WorkoutId) -> Option<&ProgressRecord> {
        self.workouts_progress
            .iter()
            .find(|record| &record.workout_id == workout_id)
    }

    /// Share of completed workouts in percent, 0 for a course without workouts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completion_percentage(&self) -> f64 {
        if self.total_workouts == 0 {
            return 0.0;
        }
        self.completed_count as f64 / self.total_workouts as f64 * 100.0
    }

    fn position(&self, workout_id: &WorkoutId) -> Option<usize> {
        self.workouts_progress
            .iter()
            .position(|record| &record.workout_id == workout_id)
    }

    fn recount(&mut self) {
        self.completed_count = self
            .workouts_progress
            .iter()
            .filter(|record| record.completed)
            .count();
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Everything the client knows about the user's progress.
///
/// - `course_progress`: merged view per course
/// - `workout_progress`: latest record per workout, independent of any course view
/// - `workouts_completed`: completion lookup kept in sync with merged views
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressState {
    course_progress: HashMap<CourseId, CourseProgressView>,
    workout_progress: HashMap<WorkoutId, ProgressRecord>,
    workouts_completed: HashMap<WorkoutId, bool>,
}

impl ProgressState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the course view with server progress filtered to `valid_workouts`.
    #[must_use]
    pub fn merge_course_progress(
        mut self,
        course_id: CourseId,
        server_progress: Vec<ProgressRecord>,
        valid_workouts: &[WorkoutRef],
    ) -> Self {
        let view = CourseProgressView::reconcile(server_progress, valid_workouts);
        for record in &view.workouts_progress {
            self.workouts_completed
                .insert(record.workout_id.clone(), record.completed);
        }
        self.course_progress.insert(course_id, view);
        self
    }

    /// Records that the backend has no progress for the course.
    ///
    /// A known view is kept; otherwise an empty one is installed.
    #[must_use]
    pub fn course_progress_missing(mut self, course_id: CourseId) -> Self {
        self.course_progress.entry(course_id).or_default();
        self
    }

    /// Stores a freshly fetched per-workout record.
    #[must_use]
    pub fn store_workout_progress(mut self, record: ProgressRecord) -> Self {
        self.workout_progress
            .insert(record.workout_id.clone(), record);
        self
    }

    /// Applies a successful save to every place the workout appears.
    ///
    /// The course view is only touched when it is already cached.
    #[must_use]
    pub fn apply_progress_save(
        mut self,
        course_id: &CourseId,
        workout_id: WorkoutId,
        progress_data: Vec<f64>,
        at: DateTime<Utc>,
    ) -> Self {
        let record = ProgressRecord::saved(workout_id.clone(), progress_data, at);

        if let Some(view) = self.course_progress.remove(course_id) {
            self.course_progress
                .insert(course_id.clone(), view.apply_save(record.clone()));
        }
        self.workouts_completed
            .insert(workout_id.clone(), record.completed);
        self.workout_progress.insert(workout_id, record);
        self
    }

    /// Zeroes a workout's progress after a successful reset.
    ///
    /// Every cached record of the workout is zeroed, whether it came from a
    /// per-workout fetch or a course view. Places without a record stay as
    /// they are. Without an `exercise_count` each record keeps its own length.
    #[must_use]
    pub fn apply_progress_reset(
        mut self,
        course_id: &CourseId,
        workout_id: &WorkoutId,
        exercise_count: Option<usize>,
    ) -> Self {
        if let Some(record) = self.workout_progress.get_mut(workout_id) {
            let count = exercise_count.unwrap_or(record.progress_data.len());
            *record = ProgressRecord::zeroed(workout_id.clone(), count);
        }
        if let Some(flag) = self.workouts_completed.get_mut(workout_id) {
            *flag = false;
        }
        if let Some(view) = self.course_progress.remove(course_id) {
            self.course_progress.insert(
                course_id.clone(),
                view.apply_reset(workout_id, exercise_count),
            );
        }
        self
    }

    /// Merged view for a course, or an empty one when nothing is known.
    #[must_use]
    pub fn course_progress(&self, course_id: &CourseId) -> CourseProgressView {
        self.course_progress
            .get(course_id)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_course_progress(&self, course_id: &CourseId) -> bool {
        self.course_progress.contains_key(course_id)
    }

    #[must_use]
    pub fn workout_record(&self, workout_id: &WorkoutId) -> Option<&ProgressRecord> {
        self.workout_progress.get(workout_id)
    }

    /// Completion flag from the lookup filled by merges and saves.
    #[must_use]
    pub fn workout_completed_status(&self, workout_id: &WorkoutId) -> bool {
        self.workouts_completed
            .get(workout_id)
            .copied()
            .unwrap_or(false)
    }

    /// Completion flag of the per-workout record.
    #[must_use]
    pub fn is_completed(&self, workout_id: &WorkoutId) -> bool {
        self.workout_progress
            .get(workout_id)
            .is_some_and(|record| record.completed)
    }

    #[must_use]
    pub fn exercise_progress(&self, workout_id: &WorkoutId, index: usize) -> f64 {
        self.workout_progress
            .get(workout_id)
            .map_or(0.0, |record| record.exercise_progress(index))
    }

    #[must_use]
    pub fn course_completion_percentage(&self, course_id: &CourseId) -> f64 {
        self.course_progress
            .get(course_id)
            .map_or(0.0, CourseProgressView::completion_percentage)
    }
}
