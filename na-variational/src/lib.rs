//! Variational data assimilation: 3DVar and 4DVar analyses obtained by
//! minimizing the background-plus-observation misfit with reverse-mode
//! gradients.

extern crate ndarray as nd;
extern crate na_core as nac;
extern crate nla_factorize as nla;
#[macro_use]
extern crate tracing;

#[cfg(test)]
extern crate na_quadrature as nq;

use nac::{ObservationOperator, Propagator, Result};
use nd::{ArrayView, Dimension, Ix1, Ix2};

pub use config::{BatchAxis, VarConfig};
pub use cost::{background_cost, observation_cost, single_cost, state_elements, ThreeDVar};
pub use covariance::Covariance;
pub use minimize::{gradient, minimize, Adam, Analysis, CostFunction, Optimizer, Sgd,
                   Termination};
pub use window::{FourDVar, Window};

pub mod config;
pub mod cost;
pub mod covariance;
pub mod minimize;
pub mod window;

/// 3DVar analysis of `xb` against the single observation `y`, minimized
/// with Adam at `config.learning_rate`. `xb` may be one state vector or a
/// batch of them laid out along `config.batch_axis`.
pub fn apply_3dvar<H, D>(h: &H,
                         b: ArrayView<f64, Ix2>,
                         r: ArrayView<f64, Ix2>,
                         xb: ArrayView<f64, D>,
                         y: ArrayView<f64, Ix1>,
                         config: &VarConfig) -> Result<Analysis<D>>
  where H: ObservationOperator,
        D: Dimension + 'static,
{
  let b = Covariance::new(&b)?;
  let r = Covariance::new(&r)?;
  let cost = ThreeDVar {
    h: h,
    b: &b,
    r: &r,
    xb: xb.view(),
    y: y.view(),
    batch_axis: config.batch_axis,
  };

  let mut optimizer = Adam::new(config.learning_rate);
  minimize(xb.view(), config, &mut optimizer, &cost)
}

/// 4DVar analysis of `xb` over `window`; row `i` of `y` is the observation
/// at the window's `i`th observation time.
pub fn apply_4dvar<M, H, D>(window: &Window,
                            m: &M,
                            h: &H,
                            b: ArrayView<f64, Ix2>,
                            r: ArrayView<f64, Ix2>,
                            xb: ArrayView<f64, D>,
                            y: ArrayView<f64, Ix2>,
                            config: &VarConfig) -> Result<Analysis<D>>
  where M: Propagator,
        H: ObservationOperator,
        D: Dimension + 'static,
{
  window.validate(y.nrows())?;

  let b = Covariance::new(&b)?;
  let r = Covariance::new(&r)?;
  let cost = FourDVar {
    window: Window::new(window.nobs, window.time_obs.view(),
                        window.gap, window.start_time),
    m: m,
    h: h,
    b: &b,
    r: &r,
    xb: xb.view(),
    y: y.view(),
    batch_axis: config.batch_axis,
  };

  let mut optimizer = Adam::new(config.learning_rate);
  minimize(xb.view(), config, &mut optimizer, &cost)
}
