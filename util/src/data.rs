//! Synthetic twin-experiment data: a truth trajectory from a known initial
//! state and noisy observations of it.

use nac::{check_dim, Error, ObservationOperator, Propagator, Result};
use nd::{Array, ArrayView, Ix1, Ix2};
use rand::Rng;
use rand_distr::StandardNormal;

#[derive(Clone, Debug)]
pub struct Data {
  pub times: Array<f64, Ix1>,
  /// One row per time.
  pub truth: Array<f64, Ix2>,
  /// `H(truth)` plus noise, one row per time.
  pub observations: Array<f64, Ix2>,
}

/// Propagates `x0` across `times` with `m`, then observes every truth state
/// through `h` and perturbs component `j` of each observation with
/// `N(0, sigma[j]²)` noise drawn from `rng`.
pub fn generate_model_truth_and_observation<M, H, R>(m: &M,
                                                     x0: ArrayView<f64, Ix1>,
                                                     times: ArrayView<f64, Ix1>,
                                                     h: &H,
                                                     sigma: ArrayView<f64, Ix1>,
                                                     rng: &mut R) -> Result<Data>
  where M: Propagator,
        H: ObservationOperator,
        R: Rng,
{
  if times.len() == 0 {
    return Err(Error::shape_mismatch("time grid", &[1], &[0]));
  }

  let trajectory = m.propagate(x0, times)?;
  if trajectory.shape() != &[x0.len(), times.len()] {
    return Err(Error::shape_mismatch("propagated trajectory",
                                     &[x0.len(), times.len()],
                                     trajectory.shape()));
  }
  let truth = trajectory.reversed_axes();

  let mut observations = Array::zeros((times.len(), sigma.len()));
  for (state, mut obs) in truth.outer_iter().zip(observations.outer_iter_mut()) {
    let hx = h.eval_at(state)?;
    check_dim("observation noise", hx.len(), sigma.len())?;

    for ((o, &hx), &sigma) in obs.iter_mut().zip(hx.iter()).zip(sigma.iter()) {
      let noise: f64 = rng.sample(StandardNormal);
      *o = hx + sigma * noise;
    }
  }

  debug!(steps = times.len(), state_dim = x0.len(), obs_dim = sigma.len(),
         "generated twin experiment data");

  Ok(Data {
    times: times.to_owned(),
    truth: truth,
    observations: observations,
  })
}
