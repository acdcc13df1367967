//! Shape validation for lists of image and label arrays.
//!
//! Arrays arrive with shapes that are only known at call time (they may even
//! be dynamically ranked `ArrayD` values), so every check here reads the
//! runtime shape. Checks return before any dependent crop or resize work.

use crate::error::{PreprocessError, Result};
use ndarray::{ArrayView, ArrayView3, Dimension, Ix3};

/// Expected rank of every image and label array: (height, width, channels).
pub const EXPECTED_RANK: usize = 3;

/// Reinterprets `array` as a rank-3 view, failing with
/// [`PreprocessError::Rank`] when it has a different number of dimensions.
pub fn as_rank3<'a, A, D>(array: ArrayView<'a, A, D>, name: &str) -> Result<ArrayView3<'a, A>>
where
    D: Dimension,
{
    let actual = array.ndim();
    if actual != EXPECTED_RANK {
        return Err(PreprocessError::Rank {
            name: name.to_string(),
            expected: EXPECTED_RANK,
            actual,
        });
    }
    array
        .into_dimensionality::<Ix3>()
        .map_err(|_| PreprocessError::Rank {
            name: name.to_string(),
            expected: EXPECTED_RANK,
            actual,
        })
}

/// Checks that `arrays` is non-empty, that every entry is rank 3, and that
/// every entry shares the first entry's height and width.
///
/// Returns the common `(height, width)`.
pub fn validate_shapes<A, D>(arrays: &[ArrayView<'_, A, D>], name: &str) -> Result<(usize, usize)>
where
    D: Dimension,
{
    let first = arrays
        .first()
        .ok_or_else(|| PreprocessError::InvalidArgument(format!("Empty {name} list")))?;
    let first = as_rank3(first.view(), &format!("{name}[0]"))?;
    let (height, width, _) = first.dim();

    validate_matching(&arrays[1..], name, height, width, 1)?;
    Ok((height, width))
}

/// Checks every entry of `arrays` against a reference `(height, width)`.
///
/// `first_index` is the list position of `arrays[0]`, so errors name the
/// entry by its position in the caller's list. An empty list passes.
pub fn validate_matching<A, D>(
    arrays: &[ArrayView<'_, A, D>],
    name: &str,
    height: usize,
    width: usize,
    first_index: usize,
) -> Result<()>
where
    D: Dimension,
{
    for (i, array) in arrays.iter().enumerate() {
        let entry = format!("{name}[{}]", first_index + i);
        let view = as_rank3(array.view(), &entry)?;
        let (h, w, _) = view.dim();
        if h != height {
            return Err(PreprocessError::ShapeMismatch {
                name: entry,
                dimension: "height",
                expected: height,
                actual: h,
            });
        }
        if w != width {
            return Err(PreprocessError::ShapeMismatch {
                name: entry,
                dimension: "width",
                expected: width,
                actual: w,
            });
        }
    }
    Ok(())
}
