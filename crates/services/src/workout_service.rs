use std::sync::{Arc, Mutex};

use fitness_core::model::{
    CourseId, CourseProgressView, Exercise, ProgressRecord, ProgressState, Workout, WorkoutId,
    WorkoutRef,
};
use tracing::{info, warn};

use crate::Clock;
use crate::api::FitnessApi;
use crate::auth_service::AuthService;
use crate::course_service::CourseService;
use crate::error::ApiError;
use crate::lock;

#[derive(Debug, Default)]
struct WorkoutsState {
    current_workout: Option<Workout>,
    progress: ProgressState,
}

/// Workout content and the user's progress through it.
///
/// Every mutation performs its request first and swaps in the next
/// [`ProgressState`] only after the request succeeded.
pub struct WorkoutService {
    clock: Clock,
    api: Arc<dyn FitnessApi>,
    auth: Arc<AuthService>,
    courses: Arc<CourseService>,
    state: Mutex<WorkoutsState>,
}

impl WorkoutService {
    #[must_use]
    pub fn new(
        clock: Clock,
        api: Arc<dyn FitnessApi>,
        auth: Arc<AuthService>,
        courses: Arc<CourseService>,
    ) -> Self {
        Self {
            clock,
            api,
            auth,
            courses,
            state: Mutex::new(WorkoutsState::default()),
        }
    }

    fn update_progress(&self, apply: impl FnOnce(ProgressState) -> ProgressState) {
        let mut state = lock(&self.state);
        let current = std::mem::take(&mut state.progress);
        state.progress = apply(current);
    }

    /// Load a workout and make it the current one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails; the current workout is kept.
    pub async fn fetch_workout(&self, workout_id: &WorkoutId) -> Result<Workout, ApiError> {
        let token = self.auth.require_token()?;
        let workout = self.api.get_workout(&token, workout_id).await?;
        lock(&self.state).current_workout = Some(workout.clone());
        Ok(workout)
    }

    #[must_use]
    pub fn current_workout(&self) -> Option<Workout> {
        lock(&self.state).current_workout.clone()
    }

    /// Exercises of the current workout, empty when there is none.
    #[must_use]
    pub fn exercises(&self) -> Vec<Exercise> {
        lock(&self.state)
            .current_workout
            .as_ref()
            .map(|workout| workout.exercises.clone())
            .unwrap_or_default()
    }

    pub fn clear_current_workout(&self) {
        lock(&self.state).current_workout = None;
    }

    /// Reload a course's progress and reconcile it with the course's workouts.
    ///
    /// A 404 means the user has no progress yet: an empty view is installed
    /// unless one is already known.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for any other failure; the known progress is kept.
    pub async fn fetch_course_progress(
        &self,
        course_id: &CourseId,
    ) -> Result<CourseProgressView, ApiError> {
        match self.load_course_progress(course_id).await {
            Ok((records, workouts)) => {
                let total = records.len();
                self.update_progress(|progress| {
                    progress.merge_course_progress(course_id.clone(), records, &workouts)
                });
                let view = self.course_progress(course_id);
                info!(
                    %course_id,
                    received = total,
                    kept = view.workouts_progress.len(),
                    completed = view.completed_count,
                    "course progress merged"
                );
                Ok(view)
            }
            Err(err) if err.is_not_found() => {
                info!(%course_id, "no progress recorded for course yet");
                self.update_progress(|progress| {
                    progress.course_progress_missing(course_id.clone())
                });
                Ok(self.course_progress(course_id))
            }
            Err(err) => {
                warn!(%course_id, error = %err, "course progress load failed");
                Err(err)
            }
        }
    }

    async fn load_course_progress(
        &self,
        course_id: &CourseId,
    ) -> Result<(Vec<ProgressRecord>, Vec<WorkoutRef>), ApiError> {
        let token = self.auth.require_token()?;
        let records = self.api.course_progress(&token, course_id).await?;
        let workouts = self.courses.fetch_course_workouts(course_id).await?;
        Ok((records, workouts.iter().map(Workout::to_ref).collect()))
    }

    /// Load the stored progress of a single workout.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn fetch_workout_progress(
        &self,
        course_id: &CourseId,
        workout_id: &WorkoutId,
    ) -> Result<ProgressRecord, ApiError> {
        let token = self.auth.require_token()?;
        let record = self
            .api
            .workout_progress(&token, course_id, workout_id)
            .await?;
        self.update_progress(|progress| progress.store_workout_progress(record.clone()));
        Ok(record)
    }

    /// Save per-exercise progress for a workout.
    ///
    /// Values are sent and stored as given.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the save; local progress is unchanged.
    pub async fn save_workout_progress(
        &self,
        course_id: &CourseId,
        workout_id: &WorkoutId,
        progress_data: Vec<f64>,
    ) -> Result<ProgressRecord, ApiError> {
        let token = self.auth.require_token()?;
        if let Err(err) = self
            .api
            .save_progress(&token, course_id, workout_id, &progress_data)
            .await
        {
            warn!(%course_id, %workout_id, error = %err, "progress save failed");
            return Err(err);
        }

        let at = self.clock.now();
        let record = ProgressRecord::saved(workout_id.clone(), progress_data.clone(), at);
        self.update_progress(|progress| {
            progress.apply_progress_save(course_id, workout_id.clone(), progress_data, at)
        });
        info!(%course_id, %workout_id, completed = record.completed, "progress saved");
        Ok(record)
    }

    /// Reset a workout's progress to zero.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the reset; local progress is unchanged.
    pub async fn reset_workout_progress(
        &self,
        course_id: &CourseId,
        workout_id: &WorkoutId,
    ) -> Result<(), ApiError> {
        let token = self.auth.require_token()?;
        self.api
            .reset_progress(&token, course_id, workout_id)
            .await?;

        let exercise_count = self
            .current_workout()
            .filter(|workout| &workout.id == workout_id)
            .map(|workout| workout.exercise_count());
        self.update_progress(|progress| {
            progress.apply_progress_reset(course_id, workout_id, exercise_count)
        });
        info!(%course_id, %workout_id, "progress reset");
        Ok(())
    }

    /// Merged view for a course, empty when not loaded.
    #[must_use]
    pub fn course_progress(&self, course_id: &CourseId) -> CourseProgressView {
        lock(&self.state).progress.course_progress(course_id)
    }

    #[must_use]
    pub fn workout_record(&self, workout_id: &WorkoutId) -> Option<ProgressRecord> {
        lock(&self.state).progress.workout_record(workout_id).cloned()
    }

    #[must_use]
    pub fn workout_completed_status(&self, workout_id: &WorkoutId) -> bool {
        lock(&self.state).progress.workout_completed_status(workout_id)
    }

    #[must_use]
    pub fn is_workout_completed(&self, workout_id: &WorkoutId) -> bool {
        lock(&self.state).progress.is_completed(workout_id)
    }

    #[must_use]
    pub fn exercise_progress(&self, workout_id: &WorkoutId, exercise_index: usize) -> f64 {
        lock(&self.state)
            .progress
            .exercise_progress(workout_id, exercise_index)
    }

    #[must_use]
    pub fn course_completion_percentage(&self, course_id: &CourseId) -> f64 {
        lock(&self.state)
            .progress
            .course_completion_percentage(course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::api::InMemoryApi;
    use crate::test_support::{EMAIL, PASSWORD, demo_api};
    use fitness_core::time::{fixed_clock, fixed_now};
    use reqwest::StatusCode;

    async fn signed_in(api: &InMemoryApi) -> WorkoutService {
        let api_arc: Arc<dyn FitnessApi> = Arc::new(api.clone());
        let auth = Arc::new(AuthService::new(Arc::clone(&api_arc)));
        auth.login(EMAIL, PASSWORD).await.unwrap();
        let courses = Arc::new(CourseService::new(Arc::clone(&api_arc), Arc::clone(&auth)));
        WorkoutService::new(fixed_clock(), api_arc, auth, courses)
    }

    fn yoga() -> CourseId {
        CourseId::new("yoga")
    }

    fn wid(id: &str) -> WorkoutId {
        WorkoutId::new(id)
    }

    fn record(id: &str, data: &[f64], completed: bool) -> ProgressRecord {
        ProgressRecord {
            workout_id: wid(id),
            progress_data: data.to_vec(),
            completed,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn missing_progress_yields_empty_view() {
        let api = demo_api();
        let service = signed_in(&api).await;

        let view = service.fetch_course_progress(&yoga()).await.unwrap();

        assert_eq!(view, CourseProgressView::default());
    }

    #[tokio::test]
    async fn not_found_keeps_known_view() {
        let api = demo_api();
        api.set_progress(EMAIL, &yoga(), vec![record("y1", &[100.0, 100.0, 100.0], true)]);
        let service = signed_in(&api).await;
        service.fetch_course_progress(&yoga()).await.unwrap();

        api.fail_next(StatusCode::NOT_FOUND, None);
        let view = service.fetch_course_progress(&yoga()).await.unwrap();

        assert_eq!(view.completed_count, 1);
        assert_eq!(view.total_workouts, 4);
    }

    #[tokio::test]
    async fn merge_drops_workouts_removed_from_course() {
        let api = demo_api();
        api.set_progress(
            EMAIL,
            &yoga(),
            vec![
                record("y1", &[100.0, 100.0, 100.0], true),
                record("bonus", &[100.0], true),
            ],
        );
        api.drop_workout(&yoga(), &wid("bonus"));
        let service = signed_in(&api).await;

        let view = service.fetch_course_progress(&yoga()).await.unwrap();

        assert_eq!(view.total_workouts, 3);
        assert_eq!(view.workouts_progress.len(), 1);
        assert_eq!(view.completed_count, 1);
        assert!(service.workout_completed_status(&wid("y1")));
        assert!(!service.workout_completed_status(&wid("bonus")));
    }

    #[tokio::test]
    async fn transport_failure_keeps_last_good_view() {
        let api = demo_api();
        api.set_progress(EMAIL, &yoga(), vec![record("y1", &[100.0, 100.0, 100.0], true)]);
        let service = signed_in(&api).await;
        let before = service.fetch_course_progress(&yoga()).await.unwrap();

        api.fail_next(StatusCode::BAD_GATEWAY, Some("Сервис недоступен"));
        let err = service.fetch_course_progress(&yoga()).await.unwrap_err();

        assert_eq!(err.user_message(), "Сервис недоступен");
        assert_eq!(service.course_progress(&yoga()), before);
    }

    #[tokio::test]
    async fn save_updates_view_and_lookups() {
        let api = demo_api();
        api.set_progress(EMAIL, &yoga(), vec![record("y1", &[0.0, 0.0, 0.0], false)]);
        let service = signed_in(&api).await;
        service.fetch_course_progress(&yoga()).await.unwrap();

        let saved = service
            .save_workout_progress(&yoga(), &wid("y1"), vec![100.0, 100.0, 100.0])
            .await
            .unwrap();
        service
            .save_workout_progress(&yoga(), &wid("y2"), vec![100.0, 50.0])
            .await
            .unwrap();

        assert!(saved.completed);
        assert_eq!(saved.updated_at, Some(fixed_now()));
        let view = service.course_progress(&yoga());
        assert_eq!(view.workouts_progress.len(), 2);
        assert_eq!(view.completed_count, 1);
        assert!(service.is_workout_completed(&wid("y1")));
        assert!(!service.is_workout_completed(&wid("y2")));
        assert_eq!(service.exercise_progress(&wid("y2"), 1), 50.0);
        assert!((service.course_completion_percentage(&yoga()) - 25.0).abs() < f64::EPSILON);
        assert!(api.stored_progress(EMAIL, &yoga(), &wid("y1")).unwrap().completed);
    }

    #[tokio::test]
    async fn failed_save_changes_nothing() {
        let api = demo_api();
        api.set_progress(EMAIL, &yoga(), vec![record("y1", &[10.0, 0.0, 0.0], false)]);
        let service = signed_in(&api).await;
        service.fetch_course_progress(&yoga()).await.unwrap();
        let before = service.course_progress(&yoga());

        api.fail_next(StatusCode::BAD_REQUEST, Some("Неверные данные"));
        let result = service
            .save_workout_progress(&yoga(), &wid("y1"), vec![100.0, 100.0, 100.0])
            .await;

        assert!(result.is_err());
        assert_eq!(service.course_progress(&yoga()), before);
        assert!(!service.is_workout_completed(&wid("y1")));
        assert!(service.workout_record(&wid("y1")).is_none());
    }

    #[tokio::test]
    async fn reset_zeroes_loaded_workout() {
        let api = demo_api();
        api.set_progress(EMAIL, &yoga(), vec![record("y2", &[100.0, 100.0], true)]);
        let service = signed_in(&api).await;
        service.fetch_course_progress(&yoga()).await.unwrap();
        service.fetch_workout_progress(&yoga(), &wid("y2")).await.unwrap();
        assert!(service.is_workout_completed(&wid("y2")));

        service.reset_workout_progress(&yoga(), &wid("y2")).await.unwrap();

        let record = service.workout_record(&wid("y2")).unwrap();
        assert_eq!(record.progress_data, [0.0, 0.0]);
        assert!(!service.is_workout_completed(&wid("y2")));
        assert!(!service.workout_completed_status(&wid("y2")));
        assert_eq!(service.course_progress(&yoga()).completed_count, 0);
    }

    #[tokio::test]
    async fn reset_from_course_view_clears_completion() {
        let api = demo_api();
        api.set_progress(EMAIL, &yoga(), vec![record("y2", &[100.0, 100.0], true)]);
        let service = signed_in(&api).await;
        service.fetch_course_progress(&yoga()).await.unwrap();
        assert!(service.workout_completed_status(&wid("y2")));

        service.reset_workout_progress(&yoga(), &wid("y2")).await.unwrap();

        let view = service.course_progress(&yoga());
        assert_eq!(view.completed_count, 0);
        assert_eq!(view.workouts_progress[0].progress_data, [0.0, 0.0]);
        assert!(!service.workout_completed_status(&wid("y2")));
        assert_eq!(service.course_completion_percentage(&yoga()), 0.0);
        assert!(!api.stored_progress(EMAIL, &yoga(), &wid("y2")).unwrap().completed);
    }

    #[tokio::test]
    async fn reset_of_unknown_workout_is_noop_locally() {
        let api = demo_api();
        let service = signed_in(&api).await;

        service.reset_workout_progress(&yoga(), &wid("y1")).await.unwrap();

        assert!(service.workout_record(&wid("y1")).is_none());
    }

    #[tokio::test]
    async fn workout_progress_defaults_to_zeros() {
        let api = demo_api();
        let service = signed_in(&api).await;

        let record = service
            .fetch_workout_progress(&yoga(), &wid("y1"))
            .await
            .unwrap();

        assert_eq!(record.progress_data, [0.0, 0.0, 0.0]);
        assert_eq!(service.exercise_progress(&wid("y1"), 0), 0.0);
    }

    #[tokio::test]
    async fn current_workout_exposes_exercises() {
        let api = demo_api();
        let service = signed_in(&api).await;
        assert!(service.exercises().is_empty());

        service.fetch_workout(&wid("y1")).await.unwrap();
        assert_eq!(service.exercises().len(), 3);

        service.clear_current_workout();
        assert!(service.current_workout().is_none());
    }
}
