//! Static coding questions and difficulty-based sampling.
//!
//! A question belongs to a difficulty through its id prefix: `q0*` easy,
//! `q3*` medium, `q6*` hard. Ids outside those ranges are never sampled.

use std::{fmt, str::FromStr};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{
    error::{MockviewError, Result},
    types::Question,
};

pub const ROLES: [&str; 5] = [
    "Frontend Developer",
    "Backend Developer",
    "Data Scientist",
    "SDE",
    "ML",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Difficulty::Easy => "q0",
            Difficulty::Medium => "q3",
            Difficulty::Hard => "q6",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = MockviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(MockviewError::validation(format!(
                "Unknown difficulty {other:?}; choose Easy, Medium or Hard."
            ))),
        }
    }
}

struct BankEntry {
    id: &'static str,
    title: &'static str,
    input: &'static str,
    expected_output: &'static str,
}

const fn entry(
    id: &'static str,
    title: &'static str,
    input: &'static str,
    expected_output: &'static str,
) -> BankEntry {
    BankEntry {
        id,
        title,
        input,
        expected_output,
    }
}

static BANK: [BankEntry; 18] = [
    entry("q01", "Reverse a string", "hello", "olleh"),
    entry("q02", "Check if a number is a palindrome", "121", "true"),
    entry("q03", "Find the maximum in an array", "12 43 99 23", "99"),
    entry("q04", "Implement linear search", "1 4 6 9 11\n9", "Found at index 3"),
    entry("q05", "Find the factorial of a number using recursion", "5", "120"),
    entry("q06", "Print Fibonacci series up to N terms", "6", "0 1 1 2 3 5"),
    entry("q07", "Check if a string is a palindrome", "madam", "Yes"),
    entry("q08", "Find the largest of three numbers", "22 99 13", "99"),
    entry("q09", "Count vowels in a string", "education", "5"),
    entry("q10", "Find the sum of digits of a number", "345", "12"),
    entry("q31", "Implement binary search", "1 2 3 4 5 6 7 8 9 10\n5", "Found at index 4"),
    entry("q32", "Find the first non-repeating character in a string", "aabbcddeffg", "c"),
    entry("q33", "Check if two strings are anagrams", "listen\nsilent", "True"),
    entry("q34", "Find the kth smallest element in an array", "7 10 4 3 20 15\n3", "7"),
    entry("q61", "Find the longest palindromic substring", "babad", "bab"),
    entry("q62", "Implement an LRU cache", "4\n7 0 1 2 0 3 0 4", "Page faults: 6"),
    entry("q63", "Merge k sorted linked lists", "3\n1 4 5\n1 3 4\n2 6", "1 1 2 3 4 4 5 6"),
    entry("q64", "Solve the N-Queens problem", "4", "Solutions found: 2"),
];

impl BankEntry {
    fn to_question(&self) -> Question {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Question {
            id: self.id.to_string(),
            text: self.title.to_string(),
            input: non_empty(self.input),
            expected_output: non_empty(self.expected_output),
        }
    }
}

pub fn all() -> Vec<Question> {
    BANK.iter().map(BankEntry::to_question).collect()
}

pub fn find(id: &str) -> Option<Question> {
    BANK.iter().find(|e| e.id == id).map(BankEntry::to_question)
}

pub fn questions_for(difficulty: Difficulty) -> Vec<Question> {
    BANK.iter()
        .filter(|e| e.id.starts_with(difficulty.id_prefix()))
        .map(BankEntry::to_question)
        .collect()
}

/// Pick one question of `difficulty` uniformly at random.
pub fn sample<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Result<Question> {
    questions_for(difficulty)
        .choose(rng)
        .cloned()
        .ok_or_else(|| MockviewError::validation("No questions found for selected difficulty."))
}
