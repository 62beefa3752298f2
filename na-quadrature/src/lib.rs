extern crate ndarray as nd;
extern crate na_core as nac;

use nac::{Propagator, Real, Result};
use nd::{Array, ArrayView, ArrayViewMut, Ix1, Ix2};

pub use euler::euler;

pub mod euler;

/// dy/dt = f(t, y), written into `yp`. Fails if `y` is not a state the
/// field is defined on.
pub trait VectorField {
  fn eval_field<T>(&self, t: f64,
                   y: ArrayView<T, Ix1>,
                   yp: ArrayViewMut<T, Ix1>) -> Result<()>
    where T: Real;
}

/// Uses forward Euler over the supplied grid as the propagator of a vector
/// field.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euler<F>(pub F);

impl<F> Propagator for Euler<F>
  where F: VectorField,
{
  fn propagate<T>(&self, x0: ArrayView<T, Ix1>,
                  time: ArrayView<f64, Ix1>) -> Result<Array<T, Ix2>>
    where T: Real,
  {
    euler(x0, time, |t, y, yp| self.0.eval_field(t, y, yp) )
  }
}

#[test]
fn euler_propagator() {
  use nd::arr1;

  struct Constant(f64);
  impl VectorField for Constant {
    fn eval_field<T>(&self, _: f64, y: ArrayView<T, Ix1>, mut yp: ArrayViewMut<T, Ix1>)
                     -> Result<()>
      where T: Real,
    {
      // y * 0 + c keeps the result on the same tape as y.
      for i in 0..y.len() {
        yp[i] = y[i] * 0.0 + self.0;
      }
      Ok(())
    }
  }

  let m = Euler(Constant(2.0));
  let traj = m.propagate(arr1(&[1.0]).view(), arr1(&[0.0, 0.5, 1.0]).view())
    .unwrap();
  assert_eq!(traj.row(0), arr1(&[1.0, 2.0, 3.0]));
}
