use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use fitness_core::model::{
    Course, CourseId, ProgressRecord, User, Workout, WorkoutId, is_complete,
};
use reqwest::StatusCode;

use super::{AuthToken, Credentials, FitnessApi};
use crate::error::ApiError;

const MSG_SHORT_PASSWORD: &str = "Пароль должен содержать не менее 6 символов";
const MSG_EMAIL_EXISTS: &str = "Пользователь с таким email уже существует";
const MSG_USER_NOT_FOUND: &str = "Пользователь с таким email не найден";
const MSG_WRONG_PASSWORD: &str = "Неверный пароль";

struct Account {
    password: String,
    user: User,
}

#[derive(Default)]
struct Backend {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    courses: Vec<Course>,
    workouts: HashMap<WorkoutId, Workout>,
    progress: HashMap<(String, CourseId), Vec<ProgressRecord>>,
    failures: VecDeque<Option<(StatusCode, Option<String>)>>,
    requests: usize,
}

impl Backend {
    fn begin(&mut self) -> Result<(), ApiError> {
        self.requests += 1;
        match self.failures.pop_front().flatten() {
            Some((status, message)) => Err(ApiError::status(status, message)),
            None => Ok(()),
        }
    }

    fn email_for(&self, token: &AuthToken) -> Result<String, ApiError> {
        self.tokens
            .get(token.as_str())
            .cloned()
            .ok_or_else(|| ApiError::status(StatusCode::UNAUTHORIZED, None))
    }

    fn course(&self, course_id: &CourseId) -> Result<&Course, ApiError> {
        self.courses
            .iter()
            .find(|course| &course.id == course_id)
            .ok_or_else(|| not_found("Курс не найден"))
    }

    fn account_mut(&mut self, email: &str) -> Result<&mut Account, ApiError> {
        self.accounts
            .get_mut(email)
            .ok_or_else(|| ApiError::status(StatusCode::UNAUTHORIZED, None))
    }

    fn issue_token(&mut self, email: &str) -> AuthToken {
        let token = format!("token-{}-{}", self.tokens.len() + 1, email);
        self.tokens.insert(token.clone(), email.to_owned());
        AuthToken::new(token)
    }
}

fn not_found(message: &str) -> ApiError {
    ApiError::status(StatusCode::NOT_FOUND, Some(message.to_owned()))
}

fn bad_request(message: &str) -> ApiError {
    ApiError::status(StatusCode::BAD_REQUEST, Some(message.to_owned()))
}

/// In-memory backend for tests and offline demos.
///
/// Mirrors the REST backend's observable behaviour: course progress is 404
/// until the user saved something for the course, per-workout progress
/// defaults to zeros, and auth failures carry the backend's messages.
#[derive(Clone, Default)]
pub struct InMemoryApi {
    backend: Arc<Mutex<Backend>>,
}

impl InMemoryApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn backend(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a course together with the workouts it lists.
    #[must_use]
    pub fn with_course(self, course: Course, workouts: Vec<Workout>) -> Self {
        {
            let mut backend = self.backend();
            for workout in workouts {
                backend.workouts.insert(workout.id.clone(), workout);
            }
            backend.courses.retain(|c| c.id != course.id);
            backend.courses.push(course);
        }
        self
    }

    /// Adds an account and returns a token already signed in as it.
    pub fn add_account(&self, email: &str, password: &str) -> AuthToken {
        let mut backend = self.backend();
        backend.accounts.insert(
            email.to_owned(),
            Account {
                password: password.to_owned(),
                user: User {
                    id: Some(format!("user-{email}")),
                    email: email.to_owned(),
                    selected_courses: Vec::new(),
                },
            },
        );
        backend.issue_token(email)
    }

    /// Replaces the stored progress of a user's course.
    pub fn set_progress(&self, email: &str, course_id: &CourseId, records: Vec<ProgressRecord>) {
        self.backend()
            .progress
            .insert((email.to_owned(), course_id.clone()), records);
    }

    /// Removes a workout from a course's curriculum, leaving stored progress stale.
    pub fn drop_workout(&self, course_id: &CourseId, workout_id: &WorkoutId) {
        let mut backend = self.backend();
        if let Some(course) = backend.courses.iter_mut().find(|c| &c.id == course_id) {
            course.workouts.retain(|id| id != workout_id);
        }
    }

    /// Makes the next request fail with `status`.
    pub fn fail_next(&self, status: StatusCode, message: Option<&str>) {
        self.backend()
            .failures
            .push_back(Some((status, message.map(str::to_owned))));
    }

    /// Lets the next request through, so a later `fail_next` hits the one after.
    pub fn pass_next(&self) {
        self.backend().failures.push_back(None);
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.backend().requests
    }

    #[must_use]
    pub fn stored_progress(
        &self,
        email: &str,
        course_id: &CourseId,
        workout_id: &WorkoutId,
    ) -> Option<ProgressRecord> {
        self.backend()
            .progress
            .get(&(email.to_owned(), course_id.clone()))
            .and_then(|records| records.iter().find(|r| &r.workout_id == workout_id))
            .cloned()
    }
}

#[async_trait]
impl FitnessApi for InMemoryApi {
    async fn register(&self, credentials: &Credentials) -> Result<Option<AuthToken>, ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        if credentials.password.chars().count() < 6 {
            return Err(bad_request(MSG_SHORT_PASSWORD));
        }
        if backend.accounts.contains_key(&credentials.email) {
            return Err(bad_request(MSG_EMAIL_EXISTS));
        }
        backend.accounts.insert(
            credentials.email.clone(),
            Account {
                password: credentials.password.clone(),
                user: User {
                    id: Some(format!("user-{}", credentials.email)),
                    email: credentials.email.clone(),
                    selected_courses: Vec::new(),
                },
            },
        );
        Ok(None)
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        let account = backend
            .accounts
            .get(&credentials.email)
            .ok_or_else(|| bad_request(MSG_USER_NOT_FOUND))?;
        if account.password != credentials.password {
            return Err(bad_request(MSG_WRONG_PASSWORD));
        }
        Ok(backend.issue_token(&credentials.email))
    }

    async fn current_user(&self, token: &AuthToken) -> Result<User, ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        let email = backend.email_for(token)?;
        Ok(backend.account_mut(&email)?.user.clone())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        Ok(backend.courses.clone())
    }

    async fn get_course(&self, course_id: &CourseId) -> Result<Course, ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        backend.course(course_id).cloned()
    }

    async fn course_workouts(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
    ) -> Result<Vec<Workout>, ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        backend.email_for(token)?;
        let course = backend.course(course_id)?;
        Ok(course
            .workouts
            .iter()
            .filter_map(|id| backend.workouts.get(id).cloned())
            .collect())
    }

    async fn add_user_course(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
    ) -> Result<(), ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        let email = backend.email_for(token)?;
        backend.course(course_id)?;
        let account = backend.account_mut(&email)?;
        if !account.user.select_course(course_id.clone()) {
            return Err(bad_request("Курс уже добавлен"));
        }
        Ok(())
    }

    async fn remove_user_course(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
    ) -> Result<(), ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        let email = backend.email_for(token)?;
        if !backend.account_mut(&email)?.user.deselect_course(course_id) {
            return Err(not_found("Курс не найден"));
        }
        backend.progress.remove(&(email, course_id.clone()));
        Ok(())
    }

    async fn get_workout(
        &self,
        token: &AuthToken,
        workout_id: &WorkoutId,
    ) -> Result<Workout, ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        backend.email_for(token)?;
        backend
            .workouts
            .get(workout_id)
            .cloned()
            .ok_or_else(|| not_found("Тренировка не найдена"))
    }

    async fn course_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
    ) -> Result<Vec<ProgressRecord>, ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        let email = backend.email_for(token)?;
        backend
            .progress
            .get(&(email, course_id.clone()))
            .cloned()
            .ok_or_else(|| not_found("Прогресс не найден"))
    }

    async fn workout_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
        workout_id: &WorkoutId,
    ) -> Result<ProgressRecord, ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        let email = backend.email_for(token)?;
        let stored = backend
            .progress
            .get(&(email, course_id.clone()))
            .and_then(|records| records.iter().find(|r| &r.workout_id == workout_id))
            .cloned();
        if let Some(record) = stored {
            return Ok(record);
        }
        let workout = backend
            .workouts
            .get(workout_id)
            .ok_or_else(|| not_found("Тренировка не найдена"))?;
        Ok(ProgressRecord::zeroed(
            workout_id.clone(),
            workout.exercise_count(),
        ))
    }

    async fn save_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
        workout_id: &WorkoutId,
        progress_data: &[f64],
    ) -> Result<(), ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        let email = backend.email_for(token)?;
        backend.course(course_id)?;
        let record = ProgressRecord {
            workout_id: workout_id.clone(),
            progress_data: progress_data.to_vec(),
            completed: is_complete(progress_data),
            updated_at: None,
        };
        let records = backend
            .progress
            .entry((email, course_id.clone()))
            .or_default();
        match records.iter_mut().find(|r| &r.workout_id == workout_id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn reset_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
        workout_id: &WorkoutId,
    ) -> Result<(), ApiError> {
        let mut backend = self.backend();
        backend.begin()?;
        let email = backend.email_for(token)?;
        if let Some(record) = backend
            .progress
            .get_mut(&(email, course_id.clone()))
            .and_then(|records| records.iter_mut().find(|r| &r.workout_id == workout_id))
        {
            *record = ProgressRecord::zeroed(workout_id.clone(), record.progress_data.len());
        }
        Ok(())
    }
}
