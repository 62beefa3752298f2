use nac::{check_dim, Real, Result};
use nd::{Array, ArrayBase, ArrayView, Data, Ix1, Ix2};
use nla::CholeskyFactor;

/// A symmetric positive definite covariance (B or R). Factored once on
/// construction; afterwards only ever used to solve `C z = v`.
#[derive(Debug, Clone)]
pub struct Covariance {
  factor: CholeskyFactor<f64>,
}

impl Covariance {
  pub fn new<S>(c: &ArrayBase<S, Ix2>) -> Result<Covariance>
    where S: Data<Elem = f64>,
  {
    Ok(Covariance {
      factor: CholeskyFactor::new(c)?,
    })
  }

  pub fn dim(&self) -> usize { self.factor.dim() }

  pub fn solve<S>(&self, v: &ArrayBase<S, Ix1>) -> Result<Array<f64, Ix1>>
    where S: Data<Elem = f64>,
  {
    self.factor.solve(v)
  }

  /// The Mahalanobis-weighted term `vᵗ C⁻¹ v`.
  pub fn quadratic_form<T>(&self, v: ArrayView<T, Ix1>) -> Result<T>
    where T: Real,
  {
    check_dim("covariance-weighted misfit", self.dim(), v.len())?;
    let values = v.map(|v| v.value() );
    let solved = self.solve(&values)?;
    Ok(T::symmetric_form(v, solved.view()))
  }
}
