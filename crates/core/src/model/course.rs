use serde::{Deserialize, Serialize};

use crate::model::ids::{CourseId, WorkoutId};
use crate::ordering::Labeled;

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Daily time commitment advertised for a course, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyDuration {
    pub from: u32,
    pub to: u32,
}

/// A course from the catalogue.
///
/// `workouts` is the course curriculum as the backend lists it. Display order
/// is derived from workout labels, see [`crate::ordering::sort_by_lesson_number`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: CourseId,
    #[serde(default, rename = "nameRU")]
    pub name_ru: String,
    #[serde(default, rename = "nameEN")]
    pub name_en: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub directions: Vec<String>,
    #[serde(default)]
    pub fitting: Vec<String>,
    #[serde(default)]
    pub workouts: Vec<WorkoutId>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub duration_in_days: Option<u32>,
    #[serde(default)]
    pub daily_duration_in_minutes: Option<DailyDuration>,
    #[serde(default)]
    pub order: Option<u32>,
}

impl Course {
    /// Display name, preferring the Russian title.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name_ru.trim().is_empty() {
            &self.name_en
        } else {
            &self.name_ru
        }
    }

    /// Number of workouts in the curriculum.
    #[must_use]
    pub fn workout_count(&self) -> usize {
        self.workouts.len()
    }
}

//
// ─── WORKOUT ───────────────────────────────────────────────────────────────────
//

/// One exercise inside a workout. `quantity` is the repetition target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
}

/// A full workout, including its exercise list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    #[serde(rename = "_id")]
    pub id: WorkoutId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Workout {
    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }

    /// Reference form used by ordering and progress reconciliation.
    #[must_use]
    pub fn to_ref(&self) -> WorkoutRef {
        WorkoutRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

impl Labeled for Workout {
    fn label(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Identifies one workout within a course's curriculum.
///
/// `name` is optional because the backend does not guarantee a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutRef {
    #[serde(rename = "_id")]
    pub id: WorkoutId,
    #[serde(default)]
    pub name: Option<String>,
}

impl WorkoutRef {
    #[must_use]
    pub fn new(id: WorkoutId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

impl Labeled for WorkoutRef {
    fn label(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
