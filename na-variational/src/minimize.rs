//! Gradient-based minimization of a variational cost.
//!
//! Each iteration records the cost on a fresh tape, takes one reverse sweep
//! for the gradient, checks the gradient norm against the threshold and,
//! failing that, hands the gradient to an `Optimizer`. The tape is dropped
//! before the next iteration starts.

use nac::{Real, Result, Tape, Var};
use nac::utils::norm;
use nd::{Array, ArrayView, ArrayViewMut, Dimension, Ix1, Zip};

use crate::config::VarConfig;

/// A scalar cost of the control array.
pub trait CostFunction<D>
  where D: Dimension,
{
  fn evaluate<T>(&self, x0: ArrayView<T, D>) -> Result<T>
    where T: Real;
}

/// A first order optimizer: given the gradient, updates the parameters in
/// place.
pub trait Optimizer {
  /// Discards all state and prepares for `len` parameters.
  fn reset(&mut self, len: usize);
  fn step(&mut self, params: ArrayViewMut<f64, Ix1>, grad: ArrayView<f64, Ix1>);
}

/// Adaptive moment estimation with bias-corrected first and second moments.
#[derive(Debug, Clone)]
pub struct Adam {
  pub learning_rate: f64,
  pub beta1: f64,
  pub beta2: f64,
  pub epsilon: f64,

  m: Array<f64, Ix1>,
  v: Array<f64, Ix1>,
  t: i32,
}
impl Adam {
  pub fn new(learning_rate: f64) -> Adam {
    Adam {
      learning_rate: learning_rate,
      beta1: 0.9,
      beta2: 0.999,
      epsilon: 1e-8,

      m: Array::zeros(0),
      v: Array::zeros(0),
      t: 0,
    }
  }

  pub fn steps_taken(&self) -> i32 { self.t }
}
impl Optimizer for Adam {
  fn reset(&mut self, len: usize) {
    self.m = Array::zeros(len);
    self.v = Array::zeros(len);
    self.t = 0;
  }

  fn step(&mut self, mut params: ArrayViewMut<f64, Ix1>, grad: ArrayView<f64, Ix1>) {
    if self.m.len() != grad.len() {
      self.reset(grad.len());
    }
    self.t += 1;

    let lr = self.learning_rate;
    let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
    let bias1 = 1.0 - beta1.powi(self.t);
    let bias2 = 1.0 - beta2.powi(self.t);

    Zip::from(&mut params)
      .and(&grad)
      .and(&mut self.m)
      .and(&mut self.v)
      .for_each(|p, &g, m, v| {
        *m = beta1 * *m + (1.0 - beta1) * g;
        *v = beta2 * *v + (1.0 - beta2) * g * g;

        let m_hat = *m / bias1;
        let v_hat = *v / bias2;
        *p -= lr * m_hat / (v_hat.sqrt() + epsilon);
      });
  }
}

/// Plain gradient descent.
#[derive(Debug, Clone, Copy)]
pub struct Sgd {
  pub learning_rate: f64,
}
impl Optimizer for Sgd {
  fn reset(&mut self, _: usize) { }
  fn step(&mut self, mut params: ArrayViewMut<f64, Ix1>, grad: ArrayView<f64, Ix1>) {
    params.scaled_add(-self.learning_rate, &grad);
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
  /// The gradient norm reached the threshold.
  Converged,
  /// `max_iterations` ran out first. Not an error; the last iterate is
  /// still returned.
  Exhausted,
}

#[derive(Debug, Clone)]
pub struct Analysis<D>
  where D: Dimension,
{
  pub state: Array<f64, D>,
  /// Cost and gradient norm from the last evaluation; NaN if none was made.
  pub cost: f64,
  pub gradient_norm: f64,
  /// Number of cost evaluations.
  pub iterations: usize,
  pub termination: Termination,
}
impl<D> Analysis<D>
  where D: Dimension,
{
  pub fn converged(&self) -> bool { self.termination == Termination::Converged }
}

fn flat_gradient<C, D>(cost: &C, dim: D,
                       params: ArrayView<f64, Ix1>)
                       -> Result<(f64, Array<f64, Ix1>)>
  where C: CostFunction<D>,
        D: Dimension,
{
  let tape = Tape::new();
  let leaves: Vec<Var> = params
    .iter()
    .map(|&p| tape.var(p) )
    .collect();
  let x0 = Array::from_shape_vec(dim, leaves.clone())?;

  let j = cost.evaluate(x0.view())?;
  let adjoints = j.grad();
  let grad = leaves
    .iter()
    .map(|v| adjoints.wrt(v) )
    .collect();

  Ok((j.value(), grad))
}

/// The cost at `x` and its gradient with respect to `x`.
pub fn gradient<C, D>(cost: &C, x: ArrayView<f64, D>) -> Result<(f64, Array<f64, D>)>
  where C: CostFunction<D>,
        D: Dimension,
{
  let params: Array<f64, Ix1> = x.iter().cloned().collect();
  let (value, grad) = flat_gradient(cost, x.raw_dim(), params.view())?;
  Ok((value, Array::from_shape_vec(x.raw_dim(), grad.to_vec())?))
}

/// Minimizes `cost` starting from `x_init` (normally the background).
///
/// Stops as soon as the gradient norm is at or below `config.threshold`, or
/// after `config.max_iterations` evaluations. A non-finite cost is logged
/// once at `warn` and otherwise flows into the optimizer like any other
/// value.
pub fn minimize<C, D, O>(x_init: ArrayView<f64, D>,
                         config: &VarConfig,
                         optimizer: &mut O,
                         cost: &C) -> Result<Analysis<D>>
  where C: CostFunction<D>,
        D: Dimension,
        O: Optimizer,
{
  let dim = x_init.raw_dim();
  let mut params: Array<f64, Ix1> = x_init.iter().cloned().collect();
  optimizer.reset(params.len());

  let mut last_cost = ::std::f64::NAN;
  let mut last_norm = ::std::f64::NAN;
  let mut iterations = 0;
  let mut termination = Termination::Exhausted;
  let mut warned = false;

  for n in 0..config.max_iterations {
    let (value, grad) = flat_gradient(cost, dim.clone(), params.view())?;
    let grad_norm = norm(&grad);

    iterations = n + 1;
    last_cost = value;
    last_norm = grad_norm;

    if config.logging {
      info!(iteration = n, cost = value, gradient_norm = grad_norm,
            "variational iteration");
    }
    if !warned && !(value.is_finite() && grad_norm.is_finite()) {
      warn!(iteration = n, cost = value, gradient_norm = grad_norm,
            "non-finite cost or gradient");
      warned = true;
    }

    if grad_norm <= config.threshold {
      termination = Termination::Converged;
      break;
    }

    optimizer.step(params.view_mut(), grad.view());
  }

  debug!(iterations = iterations, cost = last_cost,
         gradient_norm = last_norm, termination = ?termination,
         "minimization finished");

  Ok(Analysis {
    state: Array::from_shape_vec(dim, params.to_vec())?,
    cost: last_cost,
    gradient_norm: last_norm,
    iterations: iterations,
    termination: termination,
  })
}
