//! Explicit first order (forward Euler) stepping.
//!
//! No step size control and no stability safeguard: stiff systems or long
//! horizons can and will blow up.

use nac::{Error, Real, Result};
use nd::{Array, ArrayView, ArrayViewMut, Ix1, Ix2, Zip};

/// Integrates `f` over `time`, returning a (state dim x time.len()) matrix
/// whose first column is `x0`:
///
/// `y[i] = y[i - 1] + (t[i] - t[i - 1]) * f(t[i - 1], y[i - 1])`
///
/// `time` is assumed to be increasing; this isn't checked. An error from
/// `f` stops the integration and is returned as is.
pub fn euler<T, F>(x0: ArrayView<T, Ix1>,
                   time: ArrayView<f64, Ix1>,
                   mut f: F) -> Result<Array<T, Ix2>>
  where T: Real,
        F: FnMut(f64, ArrayView<T, Ix1>, ArrayViewMut<T, Ix1>) -> Result<()>,
{
  let n = x0.len();
  let steps = time.len();
  if steps == 0 {
    return Err(Error::shape_mismatch("euler time grid", &[1], &[0]));
  }

  let mut flat: Vec<T> = Vec::with_capacity(n * steps);
  flat.extend(x0.iter().cloned());

  let mut y = x0.to_owned();
  // every entry is overwritten by `f` before use.
  let mut yp = x0.to_owned();

  for i in 1..steps {
    let dt = time[i] - time[i - 1];
    f(time[i - 1], y.view(), yp.view_mut())?;

    Zip::from(&mut y)
      .and(&yp)
      .for_each(|y, &yp| {
        *y = *y + yp * dt;
      });

    flat.extend(y.iter().cloned());
  }

  let trajectory = Array::from_shape_vec((steps, n), flat)?;
  Ok(trajectory.reversed_axes())
}

#[cfg(test)]
mod test {
  use super::*;
  use nac::Tape;
  use nac::utils::PartialEqWithinTol;
  use nd::{arr1, Array1};

  fn decay<T: Real>(_: f64, y: ArrayView<T, Ix1>, mut yp: ArrayViewMut<T, Ix1>)
                    -> Result<()> {
    for i in 0..y.len() {
      yp[i] = -y[i];
    }
    Ok(())
  }

  #[test]
  fn first_column_is_initial_state() {
    let x0 = arr1(&[1.0, -2.0]);
    let time = Array1::linspace(0.0, 1.0, 11);
    let traj = euler(x0.view(), time.view(), decay).unwrap();

    assert_eq!(traj.dim(), (2, 11));
    assert_eq!(traj.column(0), x0);
  }

  #[test]
  fn linear_decay_matches_closed_form() {
    // (1 - h)^n for a uniform grid
    let x0 = arr1(&[1.0]);
    let time = arr1(&[0.0, 0.1, 0.2, 0.3]);
    let traj = euler(x0.view(), time.view(), decay).unwrap();

    for i in 0..4 {
      assert!(traj[[0, i]].partial_eq_within_tol(&0.9f64.powi(i as i32), 1e-12));
    }
  }

  #[test]
  fn non_uniform_steps_use_local_dt() {
    let x0 = arr1(&[2.0]);
    let time = arr1(&[0.0, 0.5, 0.75]);
    let traj = euler(x0.view(), time.view(), decay).unwrap();
    assert_eq!(traj[[0, 1]], 1.0);
    assert_eq!(traj[[0, 2]], 0.75);
  }

  #[test]
  fn single_time_point() {
    let x0 = arr1(&[3.0, 4.0]);
    let traj = euler(x0.view(), arr1(&[5.0]).view(), decay).unwrap();
    assert_eq!(traj.dim(), (2, 1));

    assert!(euler(x0.view(), arr1(&[]).view(), decay).is_err());
  }

  #[test]
  fn field_errors_stop_integration() {
    let mut calls = 0;
    let r = euler(arr1(&[1.0]).view(), arr1(&[0.0, 0.1, 0.2, 0.3]).view(),
                  |_, _, _| {
                    calls += 1;
                    if calls == 2 {
                      Err(Error::shape_mismatch("test field", &[2], &[1]))
                    } else {
                      Ok(())
                    }
                  });
    match r {
      Err(Error::ShapeMismatch { context: "test field", .. }) => {},
      r => panic!("expected the field's error, got {:?}", r),
    }
    assert_eq!(calls, 2);
  }

  #[test]
  fn differentiates_through_steps() {
    let tape = Tape::new();
    let x0 = arr1(&[tape.var(1.5)]);
    let time = arr1(&[0.0, 0.1, 0.2]);
    let traj = euler(x0.view(), time.view(), decay).unwrap();

    let last = traj[[0, 2]];
    assert!((last.value() - 1.5 * 0.81).abs() < 1e-12);
    assert!((last.grad().wrt(&x0[0]) - 0.81).abs() < 1e-12);
  }
}
