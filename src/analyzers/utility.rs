use std::collections::HashSet;
use std::hash::Hash;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Counts distinct items, ignoring repeats (`nunique`).
pub fn count_distinct<T, I>(items: I) -> usize
where
    T: Eq + Hash,
    I: IntoIterator<Item = T>,
{
    items.into_iter().collect::<HashSet<T>>().len()
}
