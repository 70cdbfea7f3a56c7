use std::sync::{Arc, Mutex};

use fitness_core::model::{Course, CourseId, Workout};
use fitness_core::sort_by_lesson_number;
use tracing::{debug, info};

use crate::api::FitnessApi;
use crate::auth_service::AuthService;
use crate::error::ApiError;
use crate::lock;

#[derive(Debug, Default)]
struct Catalogue {
    all: Vec<Course>,
    user: Vec<Course>,
}

impl Catalogue {
    fn find(&self, course_id: &CourseId) -> Option<&Course> {
        self.all
            .iter()
            .chain(self.user.iter())
            .find(|course| &course.id == course_id)
    }
}

/// Course catalogue and the signed-in user's course selection.
pub struct CourseService {
    api: Arc<dyn FitnessApi>,
    auth: Arc<AuthService>,
    catalogue: Mutex<Catalogue>,
}

impl CourseService {
    #[must_use]
    pub fn new(api: Arc<dyn FitnessApi>, auth: Arc<AuthService>) -> Self {
        Self {
            api,
            auth,
            catalogue: Mutex::new(Catalogue::default()),
        }
    }

    /// Load the catalogue, ordered by the backend's `order` field.
    ///
    /// A cached catalogue is returned as-is unless `force_refresh` is set.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the catalogue has to be fetched and the request fails.
    pub async fn fetch_courses(&self, force_refresh: bool) -> Result<Vec<Course>, ApiError> {
        if !force_refresh {
            let cached = self.all_courses();
            if !cached.is_empty() {
                return Ok(cached);
            }
        }

        let mut courses = self.api.list_courses().await?;
        courses.sort_by_key(|course| course.order.unwrap_or(u32::MAX));
        info!(count = courses.len(), "course catalogue loaded");
        lock(&self.catalogue).all.clone_from(&courses);
        Ok(courses)
    }

    #[must_use]
    pub fn all_courses(&self) -> Vec<Course> {
        lock(&self.catalogue).all.clone()
    }

    #[must_use]
    pub fn user_courses(&self) -> Vec<Course> {
        lock(&self.catalogue).user.clone()
    }

    #[must_use]
    pub fn is_user_course(&self, course_id: &CourseId) -> bool {
        lock(&self.catalogue)
            .user
            .iter()
            .any(|course| &course.id == course_id)
    }

    /// Resolve the user's selected course ids into courses.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if any course cannot be loaded; the previous list is kept.
    pub async fn fetch_user_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<Vec<Course>, ApiError> {
        let mut courses = Vec::with_capacity(course_ids.len());
        for course_id in course_ids {
            courses.push(self.get_course_by_id(course_id).await?);
        }
        lock(&self.catalogue).user.clone_from(&courses);
        Ok(courses)
    }

    /// Fetch a course, served from the cached catalogue when possible.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the course is not cached and the request fails.
    pub async fn get_course_by_id(&self, course_id: &CourseId) -> Result<Course, ApiError> {
        let cached = lock(&self.catalogue).find(course_id).cloned();
        if let Some(course) = cached {
            return Ok(course);
        }
        debug!(%course_id, "course not cached, fetching");
        self.api.get_course(course_id).await
    }

    /// Fetch a course's workouts in lesson order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MissingToken` when nobody is signed in, or the request error.
    pub async fn fetch_course_workouts(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Workout>, ApiError> {
        let token = self.auth.require_token()?;
        let workouts = self.api.course_workouts(&token, course_id).await?;
        Ok(sort_by_lesson_number(&workouts))
    }

    /// Add a course to the user's selection.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the course cannot be resolved or the backend rejects it.
    pub async fn add_course(&self, course_id: &CourseId) -> Result<(), ApiError> {
        let token = self.auth.require_token()?;
        let course = self.get_course_by_id(course_id).await?;
        self.api.add_user_course(&token, course_id).await?;

        {
            let mut catalogue = lock(&self.catalogue);
            if !catalogue.user.iter().any(|c| &c.id == course_id) {
                catalogue.user.push(course);
            }
        }
        self.auth.add_course_locally(course_id.clone());
        info!(%course_id, "course added");
        Ok(())
    }

    /// Remove a course from the user's selection.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the removal.
    pub async fn remove_course(&self, course_id: &CourseId) -> Result<(), ApiError> {
        let token = self.auth.require_token()?;
        self.api.remove_user_course(&token, course_id).await?;

        lock(&self.catalogue)
            .user
            .retain(|course| &course.id != course_id);
        self.auth.remove_course_locally(course_id);
        info!(%course_id, "course removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::api::InMemoryApi;
    use crate::test_support::{EMAIL, course, demo_api, workout};
    use fitness_core::model::WorkoutId;
    use reqwest::StatusCode;

    async fn signed_in(api: &InMemoryApi) -> CourseService {
        let api_arc: Arc<dyn FitnessApi> = Arc::new(api.clone());
        let auth = Arc::new(AuthService::new(Arc::clone(&api_arc)));
        auth.login(EMAIL, crate::test_support::PASSWORD).await.unwrap();
        CourseService::new(api_arc, auth)
    }

    #[tokio::test]
    async fn catalogue_is_cached_until_forced() {
        let api = demo_api();
        let service = signed_in(&api).await;

        let first = service.fetch_courses(false).await.unwrap();
        let requests = api.request_count();
        let second = service.fetch_courses(false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.request_count(), requests);

        service.fetch_courses(true).await.unwrap();
        assert_eq!(api.request_count(), requests + 1);
    }

    #[tokio::test]
    async fn catalogue_follows_backend_order() {
        let api = demo_api().with_course(
            Course {
                order: Some(0),
                ..course("first", &[])
            },
            vec![],
        );
        let service = signed_in(&api).await;

        let courses = service.fetch_courses(false).await.unwrap();
        assert_eq!(courses[0].id, CourseId::new("first"));
    }

    #[tokio::test]
    async fn workouts_come_back_in_lesson_order() {
        let api = demo_api();
        let service = signed_in(&api).await;

        let workouts = service
            .fetch_course_workouts(&CourseId::new("yoga"))
            .await
            .unwrap();
        let names: Vec<_> = workouts.iter().filter_map(|w| w.name.as_deref()).collect();
        assert_eq!(names, ["Урок 1", "Урок 2", "Урок 3", "Бонус"]);
    }

    #[tokio::test]
    async fn workouts_need_a_token() {
        let api = demo_api();
        let api_arc: Arc<dyn FitnessApi> = Arc::new(api.clone());
        let service = CourseService::new(
            Arc::clone(&api_arc),
            Arc::new(AuthService::new(api_arc)),
        );

        let err = service
            .fetch_course_workouts(&CourseId::new("yoga"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingToken));
        assert_eq!(api.request_count(), 0);
    }

    #[tokio::test]
    async fn add_and_remove_keep_selection_in_sync() {
        let api = demo_api();
        let service = signed_in(&api).await;
        let yoga = CourseId::new("yoga");

        service.add_course(&yoga).await.unwrap();
        assert!(service.is_user_course(&yoga));
        assert_eq!(service.auth.selected_courses(), [yoga.clone()]);

        service.remove_course(&yoga).await.unwrap();
        assert!(!service.is_user_course(&yoga));
        assert!(service.auth.selected_courses().is_empty());
    }

    #[tokio::test]
    async fn failed_add_changes_nothing() {
        let api = demo_api();
        let service = signed_in(&api).await;
        let yoga = CourseId::new("yoga");
        service.fetch_courses(false).await.unwrap();

        api.fail_next(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert!(service.add_course(&yoga).await.is_err());
        assert!(!service.is_user_course(&yoga));
        assert!(service.auth.selected_courses().is_empty());
    }

    #[tokio::test]
    async fn user_courses_resolve_uncached_ids() {
        let api = demo_api().with_course(
            course("stretch", &["s1"]),
            vec![workout("s1", "day 1", 2)],
        );
        let service = signed_in(&api).await;

        let courses = service
            .fetch_user_courses(&[CourseId::new("stretch")])
            .await
            .unwrap();

        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].workouts, [WorkoutId::new("s1")]);
        assert_eq!(service.user_courses(), courses);
    }
}
