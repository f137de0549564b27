/// Prefix edit distance between `x` and `y`, bounded by `delta`.
///
/// Returns the minimum edit distance between `x` and any prefix of `y` if
/// that is at most `delta`, and `delta + 1` otherwise. Both strings are
/// expected to be normalized already.
pub fn prefix_edit_distance(x: &str, y: &str, delta: usize) -> usize {
    let x: Vec<char> = x.chars().collect();
    let y: Vec<char> = y.chars().collect();

    let n = x.len() + 1;
    // Prefixes of y longer than |x| + delta are already out of budget.
    let m = x.len().saturating_add(delta).saturating_add(1).min(y.len() + 1);

    let mut prev: Vec<usize> = (0..m).collect();
    let mut curr = vec![0; m];

    for i in 1..n {
        curr[0] = i;
        for j in 1..m {
            let substitution = prev[j - 1] + usize::from(x[i - 1] != y[j - 1]);
            let insertion = curr[j - 1] + 1;
            let deletion = prev[j] + 1;
            curr[j] = substitution.min(insertion).min(deletion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev.iter().copied().min().filter(|&d| d <= delta).unwrap_or(delta.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reference_values() {
        assert_eq!(prefix_edit_distance("frei", "frei", 0), 0);
        assert_eq!(prefix_edit_distance("frei", "freiburg", 0), 0);
        assert_eq!(prefix_edit_distance("frei", "breifurg", 1), 1);
        assert_eq!(prefix_edit_distance("freiburg", "stuttgart", 2), 3);
    }

    #[test]
    fn empty_prefix_matches_everything() {
        assert_eq!(prefix_edit_distance("", "berlin", 0), 0);
        assert_eq!(prefix_edit_distance("", "", 0), 0);
    }

    #[test]
    fn empty_candidate_costs_prefix_length() {
        assert_eq!(prefix_edit_distance("ab", "", 2), 2);
        assert_eq!(prefix_edit_distance("abc", "", 1), 2);
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(prefix_edit_distance("mün", "münchen", 0), 0);
        assert_eq!(prefix_edit_distance("mun", "münchen", 1), 1);
    }

    #[test]
    fn ber_against_berlin_and_bern() {
        assert_eq!(prefix_edit_distance("ber", "berlin", 1), 0);
        assert_eq!(prefix_edit_distance("ber", "bern", 1), 0);
        assert_eq!(prefix_edit_distance("bxr", "bern", 1), 1);
    }

    #[test]
    fn huge_budget_does_not_overflow() {
        assert_eq!(prefix_edit_distance("ber", "bern", usize::MAX), 0);
        assert_eq!(prefix_edit_distance("xyz", "bern", usize::MAX), 3);
        assert_eq!(prefix_edit_distance("xyz", "", usize::MAX), 3);
    }

    proptest! {
        #[test]
        fn never_exceeds_budget_plus_one(x in "[a-c]{0,8}", y in "[a-c]{0,12}", delta in 0usize..4) {
            prop_assert!(prefix_edit_distance(&x, &y, delta) <= delta + 1);
        }

        #[test]
        fn extending_candidate_never_hurts(x in "[a-c]{0,6}", y in "[a-c]{0,8}", tail in "[a-c]{0,4}", delta in 0usize..4) {
            let longer = format!("{y}{tail}");
            prop_assert!(prefix_edit_distance(&x, &longer, delta) <= prefix_edit_distance(&x, &y, delta));
        }

        #[test]
        fn a_prefix_of_the_candidate_is_free(y in "[a-z]{0,10}", cut in 0usize..10, delta in 0usize..3) {
            let cut = cut.min(y.len());
            prop_assert_eq!(prefix_edit_distance(&y[..cut], &y, delta), 0);
        }
    }
}
