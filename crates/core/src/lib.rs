#![forbid(unsafe_code)]

pub mod model;
pub mod ordering;
pub mod time;
pub mod validation;

pub use ordering::{Labeled, extract_lesson_number, sort_by_lesson_number};
pub use time::Clock;
