//! Command matching: whitespace- and case-insensitive equality against a step's
//! expected answer or one of its alternates. No punctuation or argument-order
//! leniency.

use crate::domain::Step;

/// Trim, collapse internal whitespace runs to one space, lower-case.
pub fn normalize(s: &str) -> String {
  s.split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// True iff `input` equals the expected answer or any alternate after normalization.
pub fn matches(input: &str, step: &Step) -> bool {
  let needle = normalize(input);
  if needle.is_empty() {
    return false;
  }
  normalize(&step.expected_answer) == needle
    || step.alternate_answers.iter().any(|alt| normalize(alt) == needle)
}
