//! Single analysis time (3DVar) cost:
//!
//! `J(x0) = (x0 - xb)ᵗ B⁻¹ (x0 - xb) + (y - H(x0))ᵗ R⁻¹ (y - H(x0))`

use nac::{check_dim, Error, ObservationOperator, Real, Result};
use nd::{Array, ArrayView, Axis, Dimension, Ix1, Ix2, Zip};

use crate::config::BatchAxis;
use crate::covariance::Covariance;
use crate::minimize::CostFunction;

/// Splits a control (or background) array into its state vectors: one for
/// a 1-D array, one per element along `axis` for a 2-D array.
pub fn state_elements<'a, A, D>(x: ArrayView<'a, A, D>,
                                axis: BatchAxis)
                                -> Result<Vec<ArrayView<'a, A, Ix1>>>
  where D: Dimension,
{
  match x.ndim() {
    1 => Ok(vec![x.into_dimensionality::<Ix1>()?]),
    2 => {
      let x = x.into_dimensionality::<Ix2>()?;
      let axis = match axis {
        BatchAxis::Leading => Axis(0),
        BatchAxis::Trailing => Axis(1),
      };
      let n = x.len_of(axis);
      if n == 0 {
        return Err(Error::shape_mismatch("batch size", &[1], &[0]));
      }

      Ok((0..n)
         .map(|i| x.clone().index_axis_move(axis, i) )
         .collect())
    },
    d => Err(Error::shape_mismatch("control dimensionality", &[2], &[d])),
  }
}

pub(crate) fn accumulate<T>(total: Option<T>, term: T) -> Option<T>
  where T: Real,
{
  Some(match total {
    Some(total) => total + term,
    None => term,
  })
}

pub(crate) fn check_same_shape(context: &'static str,
                               expected: &[usize],
                               found: &[usize]) -> Result<()> {
  if expected == found {
    Ok(())
  } else {
    Err(Error::shape_mismatch(context, expected, found))
  }
}

/// `(x0 - xb)ᵗ B⁻¹ (x0 - xb)`
pub fn background_cost<T>(b: &Covariance,
                          x0: ArrayView<T, Ix1>,
                          xb: ArrayView<f64, Ix1>) -> Result<T>
  where T: Real,
{
  check_dim("background", xb.len(), x0.len())?;
  let d: Array<T, Ix1> = Zip::from(&x0)
    .and(&xb)
    .map_collect(|&x0, &xb| x0 - xb );
  b.quadratic_form(d.view())
}

/// `(y - H(x))ᵗ R⁻¹ (y - H(x))`
pub fn observation_cost<T, H>(h: &H,
                              r: &Covariance,
                              x: ArrayView<T, Ix1>,
                              y: ArrayView<f64, Ix1>) -> Result<T>
  where T: Real,
        H: ObservationOperator,
{
  let hx = h.eval_at(x)?;
  check_dim("observation", y.len(), hx.len())?;
  // the form is even, so H(x) - y gives the same value as y - H(x).
  let d: Array<T, Ix1> = Zip::from(&hx)
    .and(&y)
    .map_collect(|&hx, &y| hx - y );
  r.quadratic_form(d.view())
}

pub fn single_cost<T, H>(h: &H,
                         b: &Covariance,
                         r: &Covariance,
                         x0: ArrayView<T, Ix1>,
                         xb: ArrayView<f64, Ix1>,
                         y: ArrayView<f64, Ix1>) -> Result<T>
  where T: Real,
        H: ObservationOperator,
{
  let jb = background_cost(b, x0.view(), xb)?;
  let jo = observation_cost(h, r, x0, y)?;
  Ok(jb + jo)
}

/// 3DVar cost over a single control vector (`D = Ix1`) or a batch of them
/// (`D = Ix2`), every batch element being compared against the same `y`.
#[derive(Debug, Clone)]
pub struct ThreeDVar<'a, H, D>
  where D: Dimension,
{
  pub h: &'a H,
  pub b: &'a Covariance,
  pub r: &'a Covariance,
  pub xb: ArrayView<'a, f64, D>,
  pub y: ArrayView<'a, f64, Ix1>,
  pub batch_axis: BatchAxis,
}

impl<'a, H, D> CostFunction<D> for ThreeDVar<'a, H, D>
  where H: ObservationOperator,
        D: Dimension,
{
  fn evaluate<T>(&self, x0: ArrayView<T, D>) -> Result<T>
    where T: Real,
  {
    check_same_shape("control vs background", self.xb.shape(), x0.shape())?;

    let x0s = state_elements(x0, self.batch_axis)?;
    let xbs = state_elements(self.xb.view(), self.batch_axis)?;

    let mut total = None;
    for (x0, xb) in x0s.into_iter().zip(xbs.into_iter()) {
      let j = single_cost(self.h, self.b, self.r, x0, xb, self.y)?;
      total = accumulate(total, j);
    }

    total.ok_or_else(|| Error::shape_mismatch("batch size", &[1], &[0]) )
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use nac::{Identity, Tape};
  use nd::{arr1, arr2, Array2};

  fn unit() -> Covariance { Covariance::new(&arr2(&[[1.0]])).unwrap() }

  #[test]
  fn scalar_cost() {
    let b = Covariance::new(&arr2(&[[4.0]])).unwrap();
    let r = unit();
    let xb = arr1(&[0.0]);
    let y = arr1(&[2.0]);
    let cost = ThreeDVar {
      h: &Identity, b: &b, r: &r,
      xb: xb.view(), y: y.view(),
      batch_axis: BatchAxis::Trailing,
    };

    // 1.6^2 / 4 + 0.4^2
    let j = cost.evaluate(arr1(&[1.6]).view()).unwrap();
    assert!((j - 0.8).abs() < 1e-12);
  }

  #[test]
  fn gradient_of_scalar_cost() {
    let b = unit();
    let r = unit();
    let xb = arr1(&[0.0]);
    let y = arr1(&[2.0]);
    let cost = ThreeDVar {
      h: &Identity, b: &b, r: &r,
      xb: xb.view(), y: y.view(),
      batch_axis: BatchAxis::Trailing,
    };

    let tape = Tape::new();
    let x0 = arr1(&[tape.var(0.5)]);
    let j = cost.evaluate(x0.view()).unwrap();
    // d/dx (x^2 + (2 - x)^2) = 4x - 4
    assert_eq!(j.grad().wrt(&x0[0]), -2.0);
  }

  #[test]
  fn batch_is_sum_of_elements() {
    let b = Covariance::new(&arr2(&[[2.0, 0.3], [0.3, 1.0]])).unwrap();
    let r = Covariance::new(&arr2(&[[0.5]])).unwrap();
    let h = arr2(&[[1.0, -1.0]]);
    let y = arr1(&[0.25]);

    // three elements, one per column
    let xb: Array2<f64> = arr2(&[
      [0.0, 1.0, -2.0],
      [1.0, 0.5, 3.0],
    ]);
    let x0: Array2<f64> = arr2(&[
      [0.2, 1.5, -1.0],
      [0.7, 0.0, 2.0],
    ]);

    for &axis in [BatchAxis::Trailing, BatchAxis::Leading].iter() {
      let (xb, x0) = match axis {
        BatchAxis::Trailing => (xb.clone(), x0.clone()),
        BatchAxis::Leading => (xb.t().to_owned(), x0.t().to_owned()),
      };
      let batched = ThreeDVar {
        h: &h, b: &b, r: &r,
        xb: xb.view(), y: y.view(),
        batch_axis: axis,
      };
      let total = batched.evaluate(x0.view()).unwrap();

      let mut expected = 0.0;
      let x0s = state_elements(x0.view(), axis).unwrap();
      let xbs = state_elements(xb.view(), axis).unwrap();
      assert_eq!(x0s.len(), 3);
      for (x0, xb) in x0s.into_iter().zip(xbs.into_iter()) {
        let single = ThreeDVar {
          h: &h, b: &b, r: &r,
          xb: xb, y: y.view(),
          batch_axis: axis,
        };
        expected += single.evaluate(x0).unwrap();
      }

      assert!((total - expected).abs() < 1e-12);
    }
  }

  #[test]
  fn shape_mismatches() {
    let b = unit();
    let r = unit();
    let xb = arr1(&[0.0]);
    let y = arr1(&[2.0, 1.0]);
    let cost = ThreeDVar {
      h: &Identity, b: &b, r: &r,
      xb: xb.view(), y: y.view(),
      batch_axis: BatchAxis::Trailing,
    };
    match cost.evaluate(arr1(&[0.0]).view()) {
      Err(Error::ShapeMismatch { context: "observation", .. }) => {},
      r => panic!("expected an observation shape mismatch, got {:?}", r),
    }

    let y = arr1(&[2.0]);
    let cost = ThreeDVar { y: y.view(), ..cost };
    match cost.evaluate(arr1(&[0.0, 1.0]).view()) {
      Err(Error::ShapeMismatch { context: "control vs background", .. }) => {},
      r => panic!("expected a control shape mismatch, got {:?}", r),
    }
  }

  #[test]
  fn unsupported_dimensionality() {
    let x = nd::Array3::<f64>::zeros((1, 1, 1));
    assert!(state_elements(x.view(), BatchAxis::Leading).is_err());
  }
}
