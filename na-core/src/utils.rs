
use nd::{ArrayBase, Data, Dimension};

pub trait PartialEqWithinTol<Rhs, Tol> {
  const STD_TOL: Tol;
  fn partial_eq_within_tol(&self, rhs: &Rhs, tol: Tol) -> bool;

  fn partial_neq_within_tol(&self, rhs: &Rhs, tol: Tol) -> bool {
    !self.partial_eq_within_tol(rhs, tol)
  }

  fn partial_eq_within_std_tol(&self, rhs: &Rhs) -> bool {
    self.partial_eq_within_tol(rhs, Self::STD_TOL)
  }
  fn partial_neq_within_std_tol(&self, rhs: &Rhs) -> bool {
    !self.partial_eq_within_std_tol(rhs)
  }
}

impl PartialEqWithinTol<f64, f64> for f64 {
  const STD_TOL: Self = ::std::f64::EPSILON;
  fn partial_eq_within_tol(&self, rhs: &f64, tol: f64) -> bool {
    (self - rhs).abs() <= tol
  }
}

impl<S1, S2, D> PartialEqWithinTol<ArrayBase<S2, D>, f64> for ArrayBase<S1, D>
  where S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
        D: Dimension,
{
  const STD_TOL: f64 = ::std::f64::EPSILON;
  fn partial_eq_within_tol(&self, rhs: &ArrayBase<S2, D>, tol: f64) -> bool {
    self.shape() == rhs.shape() &&
      self.iter()
      .zip(rhs.iter())
      .all(|(l, r)| l.partial_eq_within_tol(r, tol) )
  }
}

/// Euclidean norm.
pub fn norm<S, D>(v: &ArrayBase<S, D>) -> f64
  where S: Data<Elem = f64>,
        D: Dimension,
{
  v.iter().map(|&v| v * v ).sum::<f64>().sqrt()
}

#[test]
fn within_tol() {
  use nd::{arr1, arr2};

  assert!(1.0f64.partial_eq_within_tol(&1.05, 0.1));
  assert!(1.0f64.partial_neq_within_std_tol(&1.05));

  let a = arr2(&[[1.0f64, 2.0], [3.0, 4.0]]);
  let b = arr2(&[[1.0f64, 2.0], [3.0, 4.0 + 1e-10]]);
  assert!(a.partial_eq_within_tol(&b, 1e-9));
  assert!(a.partial_neq_within_std_tol(&b));
  assert!(arr1(&[1.0f64]).partial_neq_within_tol(&arr1(&[1.0f64, 1.0]), 1.0));

  assert_eq!(norm(&arr1(&[3.0f64, 4.0])), 5.0);
}
