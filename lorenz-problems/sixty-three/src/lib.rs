extern crate ndarray as nd;
extern crate na_core as nac;
extern crate na_quadrature as na_q;

#[cfg(test)]
extern crate na_variational as nav;

use nac::{check_dim, Real, Result};
use na_q::{Euler, VectorField};
use nd::prelude::*;

/// The Lorenz '63 system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L63Model {
  pub sigma: f64,
  pub rho: f64,
  pub beta: f64,
}
impl L63Model {
  /// Forward Euler over whatever grid the caller supplies.
  pub fn propagator(self) -> Euler<L63Model> { Euler(self) }
}
impl VectorField for L63Model {
  fn eval_field<T>(&self, _: f64,
                   y: ArrayView<T, Ix1>,
                   mut yp: ArrayViewMut<T, Ix1>) -> Result<()>
    where T: Real,
  {
    check_dim("lorenz 63 state", 3, y.len())?;
    check_dim("lorenz 63 derivative", 3, yp.len())?;

    yp[0] = (y[1] - y[0]) * self.sigma;
    yp[1] = y[0] * -(y[2] - self.rho) - y[1];
    yp[2] = y[0] * y[1] - y[2] * self.beta;
    Ok(())
  }
}
impl Default for L63Model {
  fn default() -> Self {
    L63Model {
      sigma: 10.0,
      rho: 28.0,
      beta: 8.0 / 3.0,
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use nac::{Error, Identity, Propagator, Tape};
  use nac::utils::PartialEqWithinTol;
  use nd::arr1;

  fn reference(steps: usize, dt: f64) -> Array<f64, Ix2> {
    const SIGMA: f64 = 10.0;
    const RHO: f64 = 28.0;
    const BETA: f64 = 8.0 / 3.0;

    let mut out = Array::zeros((3, steps));
    let (mut x, mut y, mut z) = (1.0f64, 1.0f64, 1.0f64);
    for i in 0..steps {
      out[[0, i]] = x;
      out[[1, i]] = y;
      out[[2, i]] = z;

      let dx = SIGMA * (y - x);
      let dy = x * (RHO - z) - y;
      let dz = x * y - BETA * z;
      x += dt * dx;
      y += dt * dy;
      z += dt * dz;
    }
    out
  }

  #[test]
  fn golden_trajectory() {
    let time = Array::linspace(0.0, 1.0, 101);
    let m = L63Model::default().propagator();
    let traj = m.propagate(arr1(&[1.0, 1.0, 1.0]).view(), time.view()).unwrap();

    assert_eq!(traj.shape(), &[3, 101]);
    assert!(traj.column(1).partial_eq_within_tol(&arr1(&[1.0, 1.26, 1.0 - 0.01 * 5.0 / 3.0]), 1e-12));
    assert!(traj.partial_eq_within_tol(&reference(101, 0.01), 1e-9));
  }

  #[test]
  fn deterministic() {
    let time = Array::linspace(0.0, 0.5, 51);
    let m = L63Model::default().propagator();
    let x0 = arr1(&[-2.0, 3.0, 20.0]);
    let a = m.propagate(x0.view(), time.view()).unwrap();
    let b = m.propagate(x0.view(), time.view()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.column(0), x0);
  }

  #[test]
  fn one_step_jacobian() {
    // After one step of size dt, d x1[0] / d x0[1] = dt * sigma.
    let m = L63Model::default().propagator();
    let tape = Tape::new();
    let x0 = arr1(&[tape.var(1.0), tape.var(2.0), tape.var(3.0)]);
    let traj = m.propagate(x0.view(), arr1(&[0.0, 0.01]).view()).unwrap();
    let g = traj[[0, 1]].grad();
    assert!((g.wrt(&x0[1]) - 0.1).abs() < 1e-12);
    assert!((g.wrt(&x0[0]) - 0.9).abs() < 1e-12);
    assert_eq!(g.wrt(&x0[2]), 0.0);
  }

  #[test]
  fn wrong_state_dimension_is_an_error() {
    let m = L63Model::default().propagator();
    let r = m.propagate(arr1(&[1.0, 1.0]).view(), arr1(&[0.0, 0.01]).view());
    match r {
      Err(Error::ShapeMismatch { context: "lorenz 63 state", .. }) => {},
      r => panic!("expected a state shape mismatch, got {:?}", r),
    }
  }

  #[test]
  fn four_dvar_with_two_dimensional_state() {
    let m = L63Model::default().propagator();
    let times = arr1(&[0.05]);
    let window = nav::Window::new(2, times.view(), 5, 0.0);
    let xb = arr1(&[1.0, 1.0]);
    let y = Array::<f64, Ix2>::zeros((2, 2));
    let eye = Array::<f64, Ix2>::eye(2);
    let config = nav::VarConfig::default().with_logging(false);

    let r = nav::apply_4dvar(&window, &m, &Identity, eye.view(), eye.view(),
                             xb.view(), y.view(), &config);
    match r {
      Err(Error::ShapeMismatch { context: "lorenz 63 state", .. }) => {},
      r => panic!("expected a shape mismatch, got {:?}", r),
    }
  }
}
