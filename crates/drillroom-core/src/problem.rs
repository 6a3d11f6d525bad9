//! Practice problem descriptors and the built-in catalog.
//!
//! The engine only carries a [`Problem`]; deciding which one to present
//! next is the caller's concern. A small built-in catalog ships with the
//! crate so a session can start without external data.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Immutable descriptor for the problem a session rehearses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub prompt: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn problem(
    id: &str,
    title: &str,
    prompt: &str,
    difficulty: Difficulty,
    tags: &[&str],
) -> Problem {
    Problem {
        id: id.into(),
        title: title.into(),
        prompt: prompt.into(),
        difficulty,
        tags: tags.iter().map(|t| (*t).into()).collect(),
    }
}

/// The built-in problem set.
pub fn builtin_catalog() -> Vec<Problem> {
    vec![
        problem(
            "two-sum",
            "Two Sum",
            "Given an array of integers and a target, return the indices of the \
             two numbers that add up to the target. Exactly one solution exists; \
             you may not use the same element twice.",
            Difficulty::Easy,
            &["array", "hash-map"],
        ),
        problem(
            "valid-parentheses",
            "Valid Parentheses",
            "Given a string containing just the characters ()[]{}, determine \
             whether the input is valid: brackets must close in the correct order.",
            Difficulty::Easy,
            &["stack", "string"],
        ),
        problem(
            "merge-intervals",
            "Merge Intervals",
            "Given a collection of intervals, merge all overlapping intervals and \
             return the result sorted by start.",
            Difficulty::Medium,
            &["array", "sorting"],
        ),
        problem(
            "lru-cache",
            "LRU Cache",
            "Design a data structure for a least-recently-used cache supporting \
             get and put in O(1) average time, evicting the least recently used \
             entry when capacity is exceeded.",
            Difficulty::Medium,
            &["design", "hash-map", "linked-list"],
        ),
        problem(
            "course-schedule",
            "Course Schedule",
            "Given the number of courses and a list of prerequisite pairs, \
             determine whether you can finish all courses.",
            Difficulty::Medium,
            &["graph", "topological-sort"],
        ),
        problem(
            "median-two-sorted",
            "Median of Two Sorted Arrays",
            "Given two sorted arrays, return the median of the combined order in \
             O(log(m+n)) time.",
            Difficulty::Hard,
            &["binary-search", "divide-and-conquer"],
        ),
    ]
}

/// Look up a built-in problem by id.
pub fn find(id: &str) -> Option<Problem> {
    builtin_catalog().into_iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let catalog = builtin_catalog();
        let mut ids: Vec<_> = catalog.iter().map(|p| p.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn find_known_and_unknown() {
        assert_eq!(find("two-sum").map(|p| p.title), Some("Two Sum".into()));
        assert!(find("fizzbuzz").is_none());
    }
}
