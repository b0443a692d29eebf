//! Test data generators for creating synthetic arrays.
//!
//! These generators create predictable, verifiable patterns that can be used
//! across the test suite.

use dx_common::NDArray;

/// Creates an `i64` array holding `0, 1, 2, ...` in row-major order.
///
/// # Example
///
/// ```
/// use test_utils::arange_array;
///
/// let a = arange_array(&[9, 11]);
/// assert_eq!(a.shape(), &[9, 11]);
/// assert_eq!(a.to_vec::<i64>().unwrap()[12], 12);
/// ```
pub fn arange_array(shape: &[usize]) -> NDArray {
    let len: usize = shape.iter().product();
    let values: Vec<i64> = (0..len as i64).collect();
    NDArray::from_vec(shape.to_vec(), values).expect("arange shape is valid")
}

/// Row-major elements of `arange_array(shape)` restricted to a 2-D window.
///
/// `rows` and `cols` are half-open index ranges into the array.
pub fn arange_window(
    shape: &[usize; 2],
    rows: std::ops::Range<usize>,
    cols: std::ops::Range<usize>,
) -> Vec<i64> {
    let mut out = Vec::with_capacity(rows.len() * cols.len());
    for r in rows {
        for c in cols.clone() {
            out.push((r * shape[1] + c) as i64);
        }
    }
    out
}

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`, so that
/// `grid[row][col] == col * 1000 + row` can be checked after a transfer.
pub fn create_test_grid(width: usize, height: usize) -> NDArray {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    NDArray::from_vec(vec![height, width], data).expect("grid shape is valid")
}

/// Creates a grid with temperature-like values in Kelvin.
///
/// Values run from about 250K at the top-left to 310K at the bottom-right.
pub fn create_temperature_grid(width: usize, height: usize) -> NDArray {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let t = (row + col) as f32 / (width + height).max(1) as f32;
            data.push(250.0 + t * 60.0);
        }
    }
    NDArray::from_vec(vec![height, width], data).expect("grid shape is valid")
}

/// Creates an `f64` grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f64) -> NDArray {
    NDArray::from_vec(vec![height, width], vec![value; width * height])
        .expect("grid shape is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arange_window_matches_array() {
        let a = arange_array(&[9, 11]).to_vec::<i64>().unwrap();
        let w = arange_window(&[9, 11], 2..5, 7..9);
        assert_eq!(w, vec![a[29], a[30], a[40], a[41], a[51], a[52]]);
    }

    #[test]
    fn test_create_test_grid_pattern() {
        let grid = create_test_grid(10, 5).to_vec::<f32>().unwrap();
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[1], 1000.0);
        assert_eq!(grid[10], 1.0);
    }

    #[test]
    fn test_temperature_range() {
        let grid = create_temperature_grid(20, 10).to_vec::<f32>().unwrap();
        assert!(grid.iter().all(|&t| (250.0..=310.0).contains(&t)));
    }
}
