//! Natural ordering of lessons by the number embedded in their labels.
//!
//! Labels come from course authors in several languages ("Урок 3",
//! "День 5", "lesson 12", "day 7"). Items whose label carries no lesson number
//! sort after all numbered items and keep their relative order.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

static LESSON_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(урок|день|lesson|day)\s*([0-9]+)").expect("lesson number pattern is valid")
});

/// Anything that exposes a display label.
///
/// `None` stands for a missing or non-text label and is treated like a label
/// without a number.
pub trait Labeled {
    fn label(&self) -> Option<&str>;
}

impl Labeled for str {
    fn label(&self) -> Option<&str> {
        Some(self)
    }
}

impl Labeled for String {
    fn label(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl Labeled for &str {
    fn label(&self) -> Option<&str> {
        Some(self)
    }
}

impl<T: Labeled> Labeled for Option<T> {
    fn label(&self) -> Option<&str> {
        self.as_ref().and_then(Labeled::label)
    }
}

/// Extracts the lesson number from a label.
///
/// Returns the number following the first lesson token, or `None` when the
/// label is empty or has no token followed by digits.
///
/// Digit runs too long for a `u64` saturate to `u64::MAX`.
#[must_use]
pub fn extract_lesson_number(label: &str) -> Option<u64> {
    if label.is_empty() {
        return None;
    }
    let captures = LESSON_NUMBER.captures(label)?;
    let digits = captures.get(2)?.as_str();
    Some(digits.parse().unwrap_or(u64::MAX))
}

/// Three-way comparison of two items by lesson number.
///
/// Numbered before numberless; two numberless items compare equal.
#[must_use]
pub fn compare_by_lesson_number<T: Labeled + ?Sized>(a: &T, b: &T) -> Ordering {
    let num_a = a.label().and_then(extract_lesson_number);
    let num_b = b.label().and_then(extract_lesson_number);
    match (num_a, num_b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Returns a sorted copy of `items`, leaving the input untouched.
///
/// Relies on `sort_by` being stable for the order among equal items.
#[must_use]
pub fn sort_by_lesson_number<T: Labeled + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by(compare_by_lesson_number);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: Option<String>,
    }

    impl Labeled for Item {
        fn label(&self) -> Option<&str> {
            self.name.as_deref()
        }
    }

    fn items(names: &[&str]) -> Vec<Item> {
        names
            .iter()
            .map(|n| Item {
                name: Some((*n).to_string()),
            })
            .collect()
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().filter_map(|i| i.name.as_deref()).collect()
    }

    #[test]
    fn extracts_number_from_each_language() {
        assert_eq!(extract_lesson_number("Урок 1"), Some(1));
        assert_eq!(extract_lesson_number("День 5"), Some(5));
        assert_eq!(extract_lesson_number("lesson 12"), Some(12));
        assert_eq!(extract_lesson_number("day 3"), Some(3));
    }

    #[test]
    fn extraction_ignores_case() {
        assert_eq!(extract_lesson_number("DAY 7"), Some(7));
        assert_eq!(extract_lesson_number("LESSON 9"), Some(9));
        assert_eq!(extract_lesson_number("УРОК 4"), Some(4));
        assert_eq!(extract_lesson_number("дЕнЬ 2"), Some(2));
    }

    #[test]
    fn extraction_allows_missing_whitespace_and_surrounding_text() {
        assert_eq!(extract_lesson_number("Day10"), Some(10));
        assert_eq!(extract_lesson_number("Йога на каждый день 2 / 5"), Some(2));
        assert_eq!(extract_lesson_number("Morning stretch, lesson 3: legs"), Some(3));
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(extract_lesson_number("day 2, lesson 8"), Some(2));
    }

    #[test]
    fn no_number_is_absent() {
        assert_eq!(extract_lesson_number("Без номера"), None);
        assert_eq!(extract_lesson_number("Тренировка"), None);
        assert_eq!(extract_lesson_number("day"), None);
        assert_eq!(extract_lesson_number("12 lessons"), None);
        assert_eq!(extract_lesson_number(""), None);
    }

    #[test]
    fn overflowing_number_saturates() {
        assert_eq!(
            extract_lesson_number("day 99999999999999999999999"),
            Some(u64::MAX)
        );
    }

    #[test]
    fn overflowing_number_still_sorts_before_numberless() {
        let sorted = sort_by_lesson_number(&items(&[
            "Без номера",
            "Урок 99999999999999999999999",
            "Урок 2",
        ]));
        assert_eq!(
            names(&sorted),
            ["Урок 2", "Урок 99999999999999999999999", "Без номера"]
        );
    }

    #[test]
    fn sorts_by_lesson_number() {
        let sorted = sort_by_lesson_number(&items(&["Урок 3", "Урок 1", "Урок 2"]));
        assert_eq!(names(&sorted), ["Урок 1", "Урок 2", "Урок 3"]);
    }

    #[test]
    fn numberless_items_go_last() {
        let sorted = sort_by_lesson_number(&items(&["Урок 3", "Без номера", "Урок 1"]));
        assert_eq!(names(&sorted), ["Урок 1", "Урок 3", "Без номера"]);
    }

    #[test]
    fn numberless_items_keep_relative_order() {
        let input = items(&["Без номера A", "Урок 1", "Без номера B", "Растяжка", "day 0"]);
        let sorted = sort_by_lesson_number(&input);
        assert_eq!(
            names(&sorted),
            ["day 0", "Урок 1", "Без номера A", "Без номера B", "Растяжка"]
        );
    }

    #[test]
    fn mixed_languages_sort_together() {
        let sorted = sort_by_lesson_number(&items(&["lesson 10", "День 2", "day 3", "Урок 1"]));
        assert_eq!(names(&sorted), ["Урок 1", "День 2", "day 3", "lesson 10"]);
    }

    #[test]
    fn missing_labels_sort_like_numberless() {
        let input = vec![
            Item { name: None },
            Item {
                name: Some("Урок 2".into()),
            },
            Item {
                name: Some("Без номера".into()),
            },
        ];
        let sorted = sort_by_lesson_number(&input);
        assert_eq!(sorted[0].name.as_deref(), Some("Урок 2"));
        assert_eq!(sorted[1].name, None);
        assert_eq!(sorted[2].name.as_deref(), Some("Без номера"));
    }

    #[test]
    fn sorting_leaves_input_untouched_and_is_idempotent() {
        let input = items(&["day 9", "x", "day 1", "y"]);
        let snapshot = input.clone();

        let once = sort_by_lesson_number(&input);
        let twice = sort_by_lesson_number(&once);

        assert_eq!(input, snapshot);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let sorted: Vec<Item> = sort_by_lesson_number(&[]);
        assert!(sorted.is_empty());
    }

    #[test]
    fn plain_strings_are_labeled() {
        let sorted = sort_by_lesson_number(&["day 2".to_string(), "day 1".to_string()]);
        assert_eq!(sorted, ["day 1", "day 2"]);
    }
}
