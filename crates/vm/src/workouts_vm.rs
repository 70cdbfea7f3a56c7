use std::sync::Arc;

use fitness_core::model::{
    CourseId, CourseProgressView, Exercise, ProgressRecord, Workout, WorkoutId,
};
use services::{AppServices, AuthService, WorkoutService};

use crate::state::{LoadState, ViewError, parse_id};

const MSG_WORKOUT_ID_MISSING: &str = "Не указан ID тренировки";
const MSG_WORKOUT_FAILED: &str = "Ошибка загрузки тренировки";
const MSG_COURSE_ID_MISSING: &str = "Не указан ID курса";
const MSG_COURSE_PROGRESS_FAILED: &str = "Ошибка загрузки прогресса курса";
const MSG_IDS_MISSING: &str = "Не указаны ID курса или тренировки";
const MSG_WORKOUT_PROGRESS_FAILED: &str = "Ошибка загрузки прогресса тренировки";
const MSG_PARAMS_MISSING: &str = "Не указаны все необходимые параметры";
const MSG_SAVE_FAILED: &str = "Ошибка сохранения прогресса";
const MSG_RESET_FAILED: &str = "Ошибка сброса прогресса";

/// Workout screen state: the open workout and progress through it.
pub struct WorkoutsVm {
    auth: Arc<AuthService>,
    workouts: Arc<WorkoutService>,
    state: LoadState,
    current_workout: Option<Workout>,
}

impl WorkoutsVm {
    #[must_use]
    pub fn new(services: &AppServices) -> Self {
        Self {
            auth: services.auth(),
            workouts: services.workouts(),
            state: LoadState::default(),
            current_workout: None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    #[must_use]
    pub fn error(&self) -> Option<&ViewError> {
        self.state.error()
    }

    pub fn clear_error(&mut self) {
        self.state.clear_error();
    }

    #[must_use]
    pub fn is_user_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    #[must_use]
    pub fn current_workout(&self) -> Option<&Workout> {
        self.current_workout.as_ref()
    }

    pub fn clear_current_workout(&mut self) {
        self.current_workout = None;
    }

    /// Exercises of the workout last loaded through the service.
    #[must_use]
    pub fn exercises(&self) -> Vec<Exercise> {
        self.workouts.exercises()
    }

    fn require_auth(&mut self) -> Result<(), ViewError> {
        if self.auth.is_authenticated() {
            Ok(())
        } else {
            self.state.fail(ViewError::AuthRequired)
        }
    }

    fn ids(
        &mut self,
        course_id: &str,
        workout_id: &str,
        message: &'static str,
    ) -> Result<(CourseId, WorkoutId), ViewError> {
        let parsed: Result<(CourseId, WorkoutId), ViewError> = parse_id(course_id, message)
            .and_then(|course_id| Ok((course_id, parse_id(workout_id, message)?)));
        match parsed {
            Ok(ids) => Ok(ids),
            Err(err) => self.state.fail(err),
        }
    }

    /// # Errors
    ///
    /// Returns `ViewError::InvalidInput` for a blank id, or the load failure.
    pub async fn load_workout(&mut self, workout_id: &str) -> Result<Workout, ViewError> {
        let workout_id: WorkoutId = match parse_id(workout_id, MSG_WORKOUT_ID_MISSING) {
            Ok(id) => id,
            Err(err) => return self.state.fail(err),
        };
        let workout = self
            .state
            .run(MSG_WORKOUT_FAILED, self.workouts.fetch_workout(&workout_id))
            .await?;
        self.current_workout = Some(workout.clone());
        Ok(workout)
    }

    /// # Errors
    ///
    /// Returns `ViewError::AuthRequired` or `ViewError::InvalidInput` before
    /// any request, or the load failure.
    pub async fn load_course_progress(
        &mut self,
        course_id: &str,
    ) -> Result<CourseProgressView, ViewError> {
        self.require_auth()?;
        let course_id: CourseId = match parse_id(course_id, MSG_COURSE_ID_MISSING) {
            Ok(id) => id,
            Err(err) => return self.state.fail(err),
        };
        self.state
            .run(
                MSG_COURSE_PROGRESS_FAILED,
                self.workouts.fetch_course_progress(&course_id),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ViewError::AuthRequired` or `ViewError::InvalidInput` before
    /// any request, or the load failure.
    pub async fn load_workout_progress(
        &mut self,
        course_id: &str,
        workout_id: &str,
    ) -> Result<ProgressRecord, ViewError> {
        self.require_auth()?;
        let (course_id, workout_id) = self.ids(course_id, workout_id, MSG_IDS_MISSING)?;
        self.state
            .run(
                MSG_WORKOUT_PROGRESS_FAILED,
                self.workouts.fetch_workout_progress(&course_id, &workout_id),
            )
            .await
    }

    /// Saves per-exercise percentages for a workout.
    ///
    /// An empty `progress_data` counts as a missing argument.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::AuthRequired` or `ViewError::InvalidInput` before
    /// any request, or the save failure.
    pub async fn save_progress(
        &mut self,
        course_id: &str,
        workout_id: &str,
        progress_data: Vec<f64>,
    ) -> Result<ProgressRecord, ViewError> {
        self.require_auth()?;
        if progress_data.is_empty() {
            return self.state.fail(ViewError::InvalidInput(MSG_PARAMS_MISSING));
        }
        let (course_id, workout_id) = self.ids(course_id, workout_id, MSG_PARAMS_MISSING)?;
        self.state
            .run(
                MSG_SAVE_FAILED,
                self.workouts
                    .save_workout_progress(&course_id, &workout_id, progress_data),
            )
            .await
    }

    /// Zeroes a workout's progress.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::AuthRequired` or `ViewError::InvalidInput` before
    /// any request, or the reset failure.
    pub async fn reset_progress(
        &mut self,
        course_id: &str,
        workout_id: &str,
    ) -> Result<(), ViewError> {
        self.require_auth()?;
        let (course_id, workout_id) = self.ids(course_id, workout_id, MSG_IDS_MISSING)?;
        self.state
            .run(
                MSG_RESET_FAILED,
                self.workouts.reset_workout_progress(&course_id, &workout_id),
            )
            .await
    }

    /// Completion as last reported by the backend or a save.
    #[must_use]
    pub fn workout_completed_status(&self, workout_id: &WorkoutId) -> bool {
        self.workouts.workout_completed_status(workout_id)
    }

    #[must_use]
    pub fn is_workout_completed(&self, workout_id: &WorkoutId) -> bool {
        self.workouts.is_workout_completed(workout_id)
    }

    #[must_use]
    pub fn exercise_progress(&self, workout_id: &WorkoutId, exercise_index: usize) -> f64 {
        self.workouts.exercise_progress(workout_id, exercise_index)
    }

    #[must_use]
    pub fn course_completion_percentage(&self, course_id: &CourseId) -> f64 {
        self.workouts.course_completion_percentage(course_id)
    }
}
