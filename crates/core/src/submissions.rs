use std::{cmp::Reverse, str::FromStr};

use crate::{error::MockviewError, types::Submission};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Difficulty,
    Role,
}

impl FromStr for SortOrder {
    type Err = MockviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "difficulty" => Ok(SortOrder::Difficulty),
            "role" => Ok(SortOrder::Role),
            other => Err(MockviewError::validation(format!(
                "Unknown sort order '{other}'"
            ))),
        }
    }
}

/// Unrecognized difficulties rank 0 and sort first.
fn difficulty_rank(difficulty: &str) -> u8 {
    match difficulty.to_ascii_lowercase().as_str() {
        "easy" => 1,
        "medium" => 2,
        "hard" => 3,
        _ => 0,
    }
}

/// Stable sort, so ties keep the backend's order.
pub fn sort_submissions(submissions: &mut [Submission], order: SortOrder) {
    match order {
        SortOrder::Newest => submissions.sort_by_key(|s| Reverse(s.created_at)),
        SortOrder::Oldest => submissions.sort_by_key(|s| s.created_at),
        SortOrder::Difficulty => submissions.sort_by_key(|s| difficulty_rank(&s.difficulty)),
        SortOrder::Role => submissions.sort_by(|a, b| a.role.cmp(&b.role)),
    }
}
