use async_trait::async_trait;
use fitness_core::model::{Course, CourseId, ProgressRecord, User, Workout, WorkoutId};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ApiConfig, AuthToken, Credentials, FitnessApi};
use crate::error::ApiError;

/// `FitnessApi` over HTTP.
#[derive(Clone)]
pub struct HttpFitnessApi {
    client: Client,
    base_url: String,
}

impl HttpFitnessApi {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// JSON text body with an empty content type, the shape the backend's
    /// auth and progress endpoints accept.
    fn with_bare_json<T: Serialize>(
        request: RequestBuilder,
        body: &T,
    ) -> Result<RequestBuilder, ApiError> {
        Ok(request
            .header(CONTENT_TYPE, "")
            .body(serde_json::to_string(body)?))
    }

    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, url = %response.url(), "fitness api response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        Err(ApiError::status(status, message))
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::send(request).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl FitnessApi for HttpFitnessApi {
    async fn register(&self, credentials: &Credentials) -> Result<Option<AuthToken>, ApiError> {
        let request =
            Self::with_bare_json(self.client.post(self.url("/auth/register")), credentials)?;
        let body: AuthResponse = Self::send_json(request).await?;
        Ok(body.token.map(AuthToken::new))
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        let request = Self::with_bare_json(self.client.post(self.url("/auth/login")), credentials)?;
        let body: AuthResponse = Self::send_json(request).await?;
        body.token.map(AuthToken::new).ok_or(ApiError::MissingToken)
    }

    async fn current_user(&self, token: &AuthToken) -> Result<User, ApiError> {
        let request = self
            .client
            .get(self.url("/users/me"))
            .bearer_auth(token.as_str());
        let body: UserEnvelope = Self::send_json(request).await?;
        Ok(body.user)
    }

    async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        Self::send_json(self.client.get(self.url("/courses"))).await
    }

    async fn get_course(&self, course_id: &CourseId) -> Result<Course, ApiError> {
        Self::send_json(self.client.get(self.url(&format!("/courses/{course_id}")))).await
    }

    async fn course_workouts(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
    ) -> Result<Vec<Workout>, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/courses/{course_id}/workouts")))
            .bearer_auth(token.as_str());
        Self::send_json(request).await
    }

    async fn add_user_course(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url("/users/me/courses"))
            .bearer_auth(token.as_str());
        let request = Self::with_bare_json(request, &CourseSelection { course_id })?;
        Self::send(request).await.map(drop)
    }

    async fn remove_user_course(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.url(&format!("/users/me/courses/{course_id}")))
            .bearer_auth(token.as_str());
        Self::send(request).await.map(drop)
    }

    async fn get_workout(
        &self,
        token: &AuthToken,
        workout_id: &WorkoutId,
    ) -> Result<Workout, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/workouts/{workout_id}")))
            .bearer_auth(token.as_str());
        Self::send_json(request).await
    }

    async fn course_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
    ) -> Result<Vec<ProgressRecord>, ApiError> {
        let request = self
            .client
            .get(self.url("/users/me/progress"))
            .query(&[("courseId", course_id.as_str())])
            .bearer_auth(token.as_str());
        let body: CourseProgressBody = Self::send_json(request).await?;
        Ok(body.workouts_progress)
    }

    async fn workout_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
        workout_id: &WorkoutId,
    ) -> Result<ProgressRecord, ApiError> {
        let request = self
            .client
            .get(self.url("/users/me/progress"))
            .query(&[
                ("courseId", course_id.as_str()),
                ("workoutId", workout_id.as_str()),
            ])
            .bearer_auth(token.as_str());
        Self::send_json(request).await
    }

    async fn save_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
        workout_id: &WorkoutId,
        progress_data: &[f64],
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .patch(self.url(&format!("/courses/{course_id}/workouts/{workout_id}")))
            .bearer_auth(token.as_str());
        let request = Self::with_bare_json(request, &ProgressBody { progress_data })?;
        Self::send(request).await.map(drop)
    }

    async fn reset_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
        workout_id: &WorkoutId,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .patch(self.url(&format!(
                "/courses/{course_id}/workouts/{workout_id}/reset"
            )))
            .bearer_auth(token.as_str());
        Self::send(request).await.map(drop)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseProgressBody {
    #[serde(default)]
    workouts_progress: Vec<ProgressRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CourseSelection<'a> {
    course_id: &'a CourseId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressBody<'a> {
    progress_data: &'a [f64],
}
