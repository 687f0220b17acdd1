//! Operator selection over a candidate list

use crate::extractor::models::MediaCandidate;

/// Which candidates to download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    /// Zero-based index into the candidate list
    One(usize),
}

impl Selection {
    pub fn apply<'a>(&self, candidates: &'a [MediaCandidate]) -> Vec<&'a MediaCandidate> {
        match self {
            Selection::All => candidates.iter().collect(),
            Selection::One(index) => candidates.get(*index).into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    pub selection: Selection,
    /// Set when the answer was unusable and "all" was assumed
    pub warning: Option<String>,
}

/// Interprets the operator's answer for a list of `count` candidates shown 1-based.
///
/// Empty input means all. Anything that is not an index in `1..=count`
/// also means all, with a warning; bad input never aborts the run.
pub fn parse_selection(input: &str, count: usize) -> SelectionOutcome {
    let input = input.trim();
    if input.is_empty() {
        return SelectionOutcome {
            selection: Selection::All,
            warning: None,
        };
    }

    match input.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => SelectionOutcome {
            selection: Selection::One(n - 1),
            warning: None,
        },
        Ok(n) => SelectionOutcome {
            selection: Selection::All,
            warning: Some(format!(
                "Selection {} is out of range (1-{}); downloading all {} candidates",
                n, count, count
            )),
        },
        Err(_) => SelectionOutcome {
            selection: Selection::All,
            warning: Some(format!(
                "Selection {:?} is not a number; downloading all {} candidates",
                input, count
            )),
        },
    }
}
