use fitness_core::model::{Course, CourseId, Exercise, Workout, WorkoutId};

use crate::api::InMemoryApi;

pub const EMAIL: &str = "athlete@mail.ru";
pub const PASSWORD: &str = "Secret!!1";

pub fn course(id: &str, workouts: &[&str]) -> Course {
    Course {
        id: CourseId::new(id),
        name_ru: format!("Курс {id}"),
        name_en: id.to_owned(),
        description: String::new(),
        directions: Vec::new(),
        fitting: Vec::new(),
        workouts: workouts.iter().map(|w| WorkoutId::new(*w)).collect(),
        difficulty: None,
        duration_in_days: None,
        daily_duration_in_minutes: None,
        order: None,
    }
}

pub fn workout(id: &str, name: &str, exercises: usize) -> Workout {
    Workout {
        id: WorkoutId::new(id),
        name: Some(name.to_owned()),
        video: None,
        exercises: (1..=exercises)
            .map(|n| Exercise {
                id: None,
                name: format!("Упражнение {n}"),
                quantity: 10,
            })
            .collect(),
    }
}

/// One account and a "yoga" course whose workouts are listed out of lesson order.
pub fn demo_api() -> InMemoryApi {
    let api = InMemoryApi::new().with_course(
        Course {
            order: Some(1),
            ..course("yoga", &["y3", "bonus", "y1", "y2"])
        },
        vec![
            workout("y3", "Урок 3", 2),
            workout("bonus", "Бонус", 1),
            workout("y1", "Урок 1", 3),
            workout("y2", "Урок 2", 2),
        ],
    );
    api.add_account(EMAIL, PASSWORD);
    api
}
