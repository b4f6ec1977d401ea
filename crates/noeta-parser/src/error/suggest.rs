//! "Did you mean" suggestions based on edit distance.

/// Largest edit distance at which a candidate is still offered.
pub const DEFAULT_THRESHOLD: usize = 3;

/// Default number of candidates returned by [`suggest_similar`].
pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

/// Return up to `max_suggestions` candidates within `threshold` edits of
/// `attempted`, nearest first.
///
/// Comparison ignores case. Ties keep the order of `candidates`.
///
/// ```
/// # use noeta_parser::error::suggest::suggest_similar;
/// let names = ["sales", "scales", "customers"];
/// assert_eq!(suggest_similar("sale", names, 3, 3), vec!["sales", "scales"]);
/// ```
pub fn suggest_similar<'a>(
    attempted: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    max_suggestions: usize,
    threshold: usize,
) -> Vec<&'a str> {
    let attempted = attempted.to_lowercase();

    let mut scored: Vec<(usize, &'a str)> = candidates
        .into_iter()
        .map(|candidate| {
            (
                strsim::levenshtein(&attempted, &candidate.to_lowercase()),
                candidate,
            )
        })
        .filter(|(distance, _)| *distance <= threshold)
        .collect();

    scored.sort_by_key(|(distance, _)| *distance);
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(_, candidate)| candidate)
        .collect()
}

/// The single nearest candidate under the default threshold.
pub fn nearest<'a>(attempted: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    suggest_similar(attempted, candidates, 1, DEFAULT_THRESHOLD)
        .first()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_first() {
        let names = ["customers", "sales", "sale_items"];
        assert_eq!(suggest_similar("sale", names, 3, 3), vec!["sales"]);
        assert_eq!(
            suggest_similar("sale_item", names, 3, 3),
            vec!["sale_items"]
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(nearest("SALES", ["sales"]), Some("sales".to_string()));
        assert_eq!(nearest("Prcie", ["price", "qty"]), Some("price".to_string()));
    }

    #[test]
    fn test_threshold_and_limit() {
        let names = ["a", "b", "c", "d"];
        assert_eq!(suggest_similar("x", names, 3, 3).len(), 3);
        assert!(suggest_similar("completely_different", ["sales"], 3, 3).is_empty());
        assert_eq!(nearest("unknown", ["sales", "customers"]), None);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn check_suggestions_are_bounded(
        attempted: &str,
        candidates: &[String],
    ) -> Result<(), TestCaseError> {
        let found = suggest_similar(attempted, candidates.iter().map(String::as_str), 3, 3);

        prop_assert!(found.len() <= 3);
        let distances: Vec<usize> = found
            .iter()
            .map(|c| strsim::levenshtein(&attempted.to_lowercase(), &c.to_lowercase()))
            .collect();
        prop_assert!(distances.iter().all(|d| *d <= 3));
        prop_assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        Ok(())
    }

    proptest! {
        #[test]
        fn suggestions_are_bounded(
            attempted in "[a-z]{1,8}",
            candidates in prop::collection::vec("[a-z]{1,8}", 0..10),
        ) {
            check_suggestions_are_bounded(&attempted, &candidates)?;
        }
    }
}
