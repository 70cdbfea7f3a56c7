use std::sync::Arc;

use fitness_core::model::{Course, CourseId};
use services::{ApiError, AppServices, AuthService, CourseService};

use crate::state::{LoadState, ViewError, parse_id};

const MSG_COURSES_FAILED: &str = "Ошибка загрузки курсов";
const MSG_USER_COURSES_FAILED: &str = "Ошибка загрузки пользовательских курсов";
const MSG_COURSE_ID_MISSING: &str = "Не указан ID курса";
const MSG_COURSE_FAILED: &str = "Ошибка загрузки курса";
const MSG_TOGGLE_FAILED: &str = "Ошибка изменения статуса курса";

/// What [`CoursesVm::toggle_course`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CourseAction {
    Added,
    Removed,
}

/// Catalogue screen state: all courses, the user's courses, and toggling.
pub struct CoursesVm {
    auth: Arc<AuthService>,
    courses: Arc<CourseService>,
    state: LoadState,
}

impl CoursesVm {
    #[must_use]
    pub fn new(services: &AppServices) -> Self {
        Self {
            auth: services.auth(),
            courses: services.courses(),
            state: LoadState::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &LoadState {
        &self.state
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
    pub fn all_courses(&self) -> Vec<Course> {
        self.courses.all_courses()
    }

    #[must_use]
    pub fn user_courses(&self) -> Vec<Course> {
        self.courses.user_courses()
    }

    /// # Errors
    ///
    /// Returns `ViewError` if the catalogue cannot be loaded.
    pub async fn load_all_courses(
        &mut self,
        force_refresh: bool,
    ) -> Result<Vec<Course>, ViewError> {
        self.state
            .run(MSG_COURSES_FAILED, self.courses.fetch_courses(force_refresh))
            .await
    }

    /// Resolves the signed-in user's selected courses.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::AuthRequired` without a request when signed out.
    pub async fn load_user_courses(&mut self) -> Result<Vec<Course>, ViewError> {
        if !self.auth.is_authenticated() {
            return self.state.fail(ViewError::AuthRequired);
        }
        let course_ids = self.auth.selected_courses();
        self.state
            .run(
                MSG_USER_COURSES_FAILED,
                self.courses.fetch_user_courses(&course_ids),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ViewError::InvalidInput` for a blank id, or the load failure.
    pub async fn get_course_by_id(&mut self, course_id: &str) -> Result<Course, ViewError> {
        let course_id: CourseId = match parse_id(course_id, MSG_COURSE_ID_MISSING) {
            Ok(id) => id,
            Err(err) => return self.state.fail(err),
        };
        self.state
            .run(MSG_COURSE_FAILED, self.courses.get_course_by_id(&course_id))
            .await
    }

    /// Adds the course when the user does not have it, removes it otherwise.
    ///
    /// The signed-in profile counts as well as the loaded user courses.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::AuthRequired` without a request when signed out,
    /// or the backend's failure.
    pub async fn toggle_course(&mut self, course_id: &str) -> Result<CourseAction, ViewError> {
        if !self.auth.is_authenticated() {
            return self.state.fail(ViewError::AuthRequired);
        }
        let course_id: CourseId = match parse_id(course_id, MSG_COURSE_ID_MISSING) {
            Ok(id) => id,
            Err(err) => return self.state.fail(err),
        };

        let selected = self.courses.is_user_course(&course_id)
            || self.auth.selected_courses().contains(&course_id);
        let courses = &self.courses;
        let toggle = async {
            if selected {
                courses.remove_course(&course_id).await?;
                Ok::<_, ApiError>(CourseAction::Removed)
            } else {
                courses.add_course(&course_id).await?;
                Ok(CourseAction::Added)
            }
        };
        self.state.run(MSG_TOGGLE_FAILED, toggle).await
    }

    /// Reloads the catalogue and, when signed in, the user's courses.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub async fn refresh_courses(&mut self) -> Result<(), ViewError> {
        self.load_all_courses(true).await?;
        if self.auth.is_authenticated() {
            self.load_user_courses().await?;
        }
        Ok(())
    }
}
