extern crate ndarray as nd;
extern crate thiserror;

use nd::prelude::*;
use nd::Data;

pub use autodiff::{Gradient, Real, Tape, Var};
pub use error::{check_dim, Error, Result};

pub mod autodiff;
pub mod error;
pub mod utils;

/// Maps a model state into observation space (H).
pub trait ObservationOperator {
  fn eval_at<T>(&self, x: ArrayView<T, Ix1>) -> Result<Array<T, Ix1>>
    where T: Real;
}

/// Advances a state across a time grid (M). The returned trajectory has one
/// column per time point, the first column being `x0`. Auxiliary model
/// arguments are carried by the implementing value.
pub trait Propagator {
  fn propagate<T>(&self, x0: ArrayView<T, Ix1>,
                  time: ArrayView<f64, Ix1>) -> Result<Array<T, Ix2>>
    where T: Real;
}

impl<'a, P> Propagator for &'a P
  where P: Propagator,
{
  fn propagate<T>(&self, x0: ArrayView<T, Ix1>,
                  time: ArrayView<f64, Ix1>) -> Result<Array<T, Ix2>>
    where T: Real,
  {
    (**self).propagate(x0, time)
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;
impl ObservationOperator for Identity {
  fn eval_at<T>(&self, x: ArrayView<T, Ix1>) -> Result<Array<T, Ix1>>
    where T: Real,
  {
    Ok(x.to_owned())
  }
}

/// Linear observation operators.
impl<D> ObservationOperator for ArrayBase<D, Ix2>
  where D: Data<Elem = f64>,
{
  fn eval_at<T>(&self, x: ArrayView<T, Ix1>) -> Result<Array<T, Ix1>>
    where T: Real,
  {
    check_dim("observation operator input", self.ncols(), x.len())?;
    if x.is_empty() {
      return Err(Error::shape_mismatch("observation operator input",
                                       &[1], &[0]));
    }

    let out: Vec<T> = self
      .axis_iter(Axis(0))
      .map(|row| {
        row.iter()
          .zip(x.iter())
          .skip(1)
          .fold(x[0] * row[0], |acc, (&h, &x)| acc + x * h )
      })
      .collect();

    Ok(Array::from(out))
  }
}
