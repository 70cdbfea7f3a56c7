#![forbid(unsafe_code)]

mod auth_form_vm;
mod courses_vm;
mod state;
mod workouts_vm;

pub use auth_form_vm::{AuthFormVm, AuthMode};
pub use courses_vm::{CourseAction, CoursesVm};
pub use state::{LoadState, ViewError};
pub use workouts_vm::WorkoutsVm;
