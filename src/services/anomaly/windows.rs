//! Sliding-window slicing of a filled feature matrix.

use crate::types::{FeatureMatrix, Window};

/// All windows `[i - size + 1 ..= i]` for `i` in `size - 1 .. len`.
///
/// Consecutive windows overlap by `size - 1` rows. Returns an empty vector when
/// the matrix is shorter than `size`.
pub fn build_windows(matrix: &FeatureMatrix, size: usize) -> Vec<Window> {
    if size == 0 || matrix.len() < size {
        return Vec::new();
    }

    matrix
        .rows()
        .windows(size)
        .filter_map(Window::from_rows)
        .collect()
}

/// The most recent window, if the matrix is long enough.
pub fn latest_window(matrix: &FeatureMatrix, size: usize) -> Option<Window> {
    if size == 0 || matrix.len() < size {
        return None;
    }
    Window::from_rows(&matrix.rows()[matrix.len() - size..])
}
