use nd::ShapeError;
use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
  /// A Cholesky pivot was not strictly positive; the matrix is singular
  /// or not positive definite.
  #[error("covariance is singular or not positive definite (pivot {pivot} at row {row})")]
  SingularCovariance {
    row: usize,
    pivot: f64,
  },
  #[error("shape mismatch in {context}: expected {expected:?}, found {found:?}")]
  ShapeMismatch {
    context: &'static str,
    expected: Vec<usize>,
    found: Vec<usize>,
  },
  #[error("invalid assimilation window: {0}")]
  InvalidWindow(String),
  #[error(transparent)]
  Shape(#[from] ShapeError),
}

impl Error {
  pub fn shape_mismatch(context: &'static str,
                        expected: &[usize],
                        found: &[usize]) -> Error {
    Error::ShapeMismatch {
      context: context,
      expected: expected.to_vec(),
      found: found.to_vec(),
    }
  }
}

/// Returns `Ok(())` iff `found == expected`.
pub fn check_dim(context: &'static str, expected: usize, found: usize) -> Result<()> {
  if expected == found {
    Ok(())
  } else {
    Err(Error::shape_mismatch(context, &[expected], &[found]))
  }
}

#[test]
fn shape_mismatch_message() {
  let e = check_dim("observation", 2, 3).unwrap_err();
  assert_eq!(e.to_string(),
             "shape mismatch in observation: expected [2], found [3]");
  assert!(check_dim("observation", 3, 3).is_ok());
}
