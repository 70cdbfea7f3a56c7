mod course;
mod ids;
mod progress;
mod user;

pub use course::{Course, DailyDuration, Exercise, Workout, WorkoutRef};
pub use ids::{CourseId, ParseIdError, WorkoutId};
pub use progress::{
    COMPLETE_PERCENT, CourseProgressView, ProgressRecord, ProgressState, is_complete,
};
pub use user::User;
