
/// Which axis of a 2-D control array indexes the batch elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchAxis {
  /// Element `i` is row `i`.
  Leading,
  /// Element `i` is column `i`.
  Trailing,
}
impl Default for BatchAxis {
  fn default() -> Self { BatchAxis::Trailing }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarConfig {
  /// Stop once the gradient norm is at or below this.
  pub threshold: f64,
  pub max_iterations: usize,
  pub learning_rate: f64,
  pub batch_axis: BatchAxis,
  /// Emit one `info` event per iteration.
  pub logging: bool,
}
impl Default for VarConfig {
  fn default() -> Self {
    VarConfig {
      threshold: 1e-5,
      max_iterations: 1000,
      learning_rate: 1e-3,
      batch_axis: Default::default(),
      logging: true,
    }
  }
}
impl VarConfig {
  pub fn with_threshold(mut self, threshold: f64) -> Self {
    self.threshold = threshold;
    self
  }
  pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
    self.max_iterations = max_iterations;
    self
  }
  pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
    self.learning_rate = learning_rate;
    self
  }
  pub fn with_batch_axis(mut self, batch_axis: BatchAxis) -> Self {
    self.batch_axis = batch_axis;
    self
  }
  pub fn with_logging(mut self, logging: bool) -> Self {
    self.logging = logging;
    self
  }
}
