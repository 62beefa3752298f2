extern crate ndarray as nd;
extern crate na_core as nac;
extern crate rand;
extern crate rand_distr;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;

#[cfg(test)]
extern crate na_quadrature as nq;

use nac::{Error, Result};
use nd::{ArrayBase, Data as NdData, Dimension};

pub use data::{generate_model_truth_and_observation, Data};
pub use logger::{init_logger, init_logger_with_level};

pub mod data;
pub mod logger;

/// Root mean square difference between two arrays of the same shape.
pub fn rmse<S1, S2, D>(estimate: &ArrayBase<S1, D>,
                       reference: &ArrayBase<S2, D>) -> Result<f64>
  where S1: NdData<Elem = f64>,
        S2: NdData<Elem = f64>,
        D: Dimension,
{
  if estimate.shape() != reference.shape() {
    return Err(Error::shape_mismatch("rmse", reference.shape(), estimate.shape()));
  }
  if estimate.len() == 0 {
    return Ok(0.0);
  }

  let sum: f64 = estimate
    .iter()
    .zip(reference.iter())
    .map(|(&e, &r)| (e - r) * (e - r) )
    .sum();
  Ok((sum / estimate.len() as f64).sqrt())
}

#[test]
fn rmse_of_offsets() {
  use nd::{arr1, arr2};

  let a = arr1(&[1.0, 2.0, 3.0, 4.0]);
  let b = arr1(&[2.0, 1.0, 4.0, 3.0]);
  assert_eq!(rmse(&a, &b).unwrap(), 1.0);
  assert_eq!(rmse(&a, &a).unwrap(), 0.0);

  let a = arr2(&[[0.0, 3.0]]);
  let b = arr2(&[[4.0, 3.0]]);
  assert_eq!(rmse(&a, &b).unwrap(), 8.0f64.sqrt());

  assert!(rmse(&arr1(&[1.0]), &arr1(&[1.0, 2.0])).is_err());
}
