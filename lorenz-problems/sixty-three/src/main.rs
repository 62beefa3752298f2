extern crate ndarray as nd;
extern crate na_core as nac;
extern crate na_variational as nav;
extern crate rand;
extern crate rand_distr;
extern crate sixty_three;
#[macro_use]
extern crate tracing;
extern crate util;

use nac::Result;
use nav::{apply_3dvar, apply_4dvar, VarConfig, Window};
use nd::{arr1, arr2, Array, Axis, Ix1, Ix2};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use sixty_three::L63Model;
use util::data::generate_model_truth_and_observation;
use util::rmse;

const STEPS: usize = 51;
const DT: f64 = 0.01;
const RNG_SEED: u64 = 1;
/// Model steps between observations used by 4DVar.
const GAP: usize = 10;
const NOBS: usize = 5;

fn run() -> Result<()> {
  let mut rand = StdRng::seed_from_u64(RNG_SEED);

  let m = L63Model::default().propagator();
  let h = arr2(&[
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
  ]);
  let gamma = arr1(&[0.2; 2]);
  let times = Array::linspace(0.0, (STEPS - 1) as f64 * DT, STEPS);
  let x0 = arr1(&[1.0, 1.0, 1.0]);

  let data = generate_model_truth_and_observation(&m, x0.view(), times.view(),
                                                  &h, gamma.view(), &mut rand)?;
  let truth0 = data.truth.row(0);

  let background_std = 0.5;
  let xb: Array<f64, Ix1> = truth0
    .map(|&x| x + background_std * rand.sample::<f64, _>(StandardNormal) );
  let b = Array::<f64, Ix2>::eye(3) * (background_std * background_std);
  let r = Array::<f64, Ix2>::eye(2) * (gamma[0] * gamma[0]);

  let config = VarConfig::default()
    .with_learning_rate(0.01)
    .with_max_iterations(5000)
    .with_logging(false);

  info!(rmse = rmse(&xb, &truth0)?, "background");

  let analysis = apply_3dvar(&h, b.view(), r.view(), xb.view(),
                             data.observations.row(0), &config)?;
  info!(rmse = rmse(&analysis.state, &truth0)?,
        iterations = analysis.iterations,
        termination = ?analysis.termination,
        "3DVar analysis");

  let obs_idx: Vec<usize> = (0..NOBS).map(|i| i * GAP ).collect();
  let y = data.observations.select(Axis(0), &obs_idx);
  let time_obs = data.times.select(Axis(0), &obs_idx[1..]);
  let window = Window::new(NOBS, time_obs.view(), GAP, data.times[0]);

  let analysis = apply_4dvar(&window, &m, &h, b.view(), r.view(), xb.view(),
                             y.view(), &config)?;
  info!(rmse = rmse(&analysis.state, &truth0)?,
        iterations = analysis.iterations,
        termination = ?analysis.termination,
        "4DVar analysis");

  Ok(())
}

fn main() {
  util::init_logger();

  if let Err(e) = run() {
    error!("twin experiment failed: {}", e);
    ::std::process::exit(1);
  }
}
