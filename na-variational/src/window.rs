//! Time-windowed (4DVar) cost.
//!
//! The background term is evaluated at the initial time together with the
//! misfit against the first observation. The control is then carried
//! forward through the propagator, one observation interval at a time, and
//! every later observation contributes one more misfit term. Gradients flow
//! back through each propagation step; over chaotic or long windows this is
//! poorly conditioned.

use nac::{Error, ObservationOperator, Propagator, Real, Result};
use nd::{Array, ArrayView, Dimension, Ix1, Ix2};

use crate::config::BatchAxis;
use crate::cost::{accumulate, check_same_shape, observation_cost, single_cost,
                  state_elements};
use crate::covariance::Covariance;
use crate::minimize::CostFunction;

/// Observation times of an assimilation window. `start_time` is the time of
/// `y[0]` and `time_obs[k]` is the time of `y[k + 1]`.
#[derive(Debug, Clone)]
pub struct Window<'a> {
  pub nobs: usize,
  pub time_obs: ArrayView<'a, f64, Ix1>,
  /// Euler sub-steps per observation interval.
  pub gap: usize,
  pub start_time: f64,
}

impl<'a> Window<'a> {
  pub fn new(nobs: usize,
             time_obs: ArrayView<'a, f64, Ix1>,
             gap: usize,
             start_time: f64) -> Window<'a> {
    Window {
      nobs: nobs,
      time_obs: time_obs,
      gap: gap,
      start_time: start_time,
    }
  }

  /// Checks the window against the number of available observation rows.
  pub fn validate(&self, observations: usize) -> Result<()> {
    if self.nobs == 0 {
      return Err(Error::InvalidWindow("nobs must be at least 1".into()));
    }
    if observations < self.nobs {
      return Err(Error::InvalidWindow(format!("{} observation times declared but only {} observations given",
                                              self.nobs, observations)));
    }
    if self.time_obs.len() + 1 < self.nobs {
      return Err(Error::InvalidWindow(format!("{} observation times declared but only {} given after the start time",
                                              self.nobs, self.time_obs.len())));
    }

    let mut previous = self.start_time;
    for i in 1..self.nobs {
      let t = self.time_obs[i - 1];
      if !(t > previous) {
        return Err(Error::InvalidWindow(format!("observation times must be strictly increasing ({} then {})",
                                                previous, t)));
      }
      previous = t;
    }

    Ok(())
  }

  /// Time of observation `i`.
  pub fn observation_time(&self, i: usize) -> Result<f64> {
    if i == 0 {
      Ok(self.start_time)
    } else {
      self.time_obs
        .get(i - 1)
        .cloned()
        .ok_or_else(|| Error::InvalidWindow(format!("no time for observation {}", i)) )
    }
  }

  /// `gap + 1` evenly spaced points from the time of observation `i - 1` to
  /// the time of observation `i`.
  pub fn segment(&self, i: usize) -> Result<Array<f64, Ix1>> {
    if i == 0 {
      return Err(Error::InvalidWindow("observation 0 has no preceding segment".into()));
    }
    let from = self.observation_time(i - 1)?;
    let to = self.observation_time(i)?;
    Ok(Array::linspace(from, to, self.gap + 1))
  }
}

/// 4DVar cost; `y` holds one observation per row. Batched controls
/// propagate every element on its own and compare each against the shared
/// observation row.
#[derive(Debug, Clone)]
pub struct FourDVar<'a, M, H, D>
  where D: Dimension,
{
  pub window: Window<'a>,
  pub m: &'a M,
  pub h: &'a H,
  pub b: &'a Covariance,
  pub r: &'a Covariance,
  pub xb: ArrayView<'a, f64, D>,
  pub y: ArrayView<'a, f64, Ix2>,
  pub batch_axis: BatchAxis,
}

impl<'a, M, H, D> FourDVar<'a, M, H, D>
  where M: Propagator,
        H: ObservationOperator,
        D: Dimension,
{
  fn propagate_to_end<T>(&self, x: ArrayView<T, Ix1>,
                         time: ArrayView<f64, Ix1>) -> Result<Array<T, Ix1>>
    where T: Real,
  {
    let trajectory = self.m.propagate(x.view(), time)?;
    check_same_shape("propagated trajectory",
                     &[x.len(), time.len()],
                     trajectory.shape())?;
    Ok(trajectory.column(time.len() - 1).to_owned())
  }
}

impl<'a, M, H, D> CostFunction<D> for FourDVar<'a, M, H, D>
  where M: Propagator,
        H: ObservationOperator,
        D: Dimension,
{
  fn evaluate<T>(&self, x0: ArrayView<T, D>) -> Result<T>
    where T: Real,
  {
    self.window.validate(self.y.nrows())?;
    check_same_shape("control vs background", self.xb.shape(), x0.shape())?;

    let x0s = state_elements(x0, self.batch_axis)?;
    let xbs = state_elements(self.xb.view(), self.batch_axis)?;

    let mut total = None;
    let y0 = self.y.row(0);
    for (x0, xb) in x0s.iter().zip(xbs.into_iter()) {
      let j = single_cost(self.h, self.b, self.r, x0.view(), xb, y0)?;
      total = accumulate(total, j);
    }

    let mut running: Vec<Array<T, Ix1>> = x0s
      .into_iter()
      .map(|x| x.to_owned() )
      .collect();
    for iobs in 1..self.window.nobs {
      let time = self.window.segment(iobs)?;
      let y = self.y.row(iobs);

      for xp in running.iter_mut() {
        *xp = self.propagate_to_end(xp.view(), time.view())?;
        let j = observation_cost(self.h, self.r, xp.view(), y)?;
        total = accumulate(total, j);
      }
    }

    total.ok_or_else(|| Error::shape_mismatch("batch size", &[1], &[0]) )
  }
}
