use nac::{Error, Result, check_dim};
use nd::{Array, ArrayBase, Data, DataMut,
         Ix1, Ix2,
         ScalarOperand};
use num_traits::{Float, ToPrimitive, Zero};

pub trait Cholesky {
  type RMatrix: Sized;
  /// Returns the upper triangular factor, R, of A = R^*R. Only the upper
  /// triangle of A is read.
  fn l_lstar(self) -> Result<Self::RMatrix>;
}

impl<S> Cholesky for ArrayBase<S, Ix2>
  where S: DataMut,
        S::Elem: Float + ScalarOperand,
{
  type RMatrix = ArrayBase<S, Ix2>;

  fn l_lstar(self) -> Result<Self::RMatrix> {
    let (m, n) = self.dim();
    if m != n || m == 0 {
      return Err(Error::shape_mismatch("cholesky factorization",
                                       &[m.max(1), m.max(1)], &[m, n]));
    }
    let mut r = self;
    let zero: S::Elem = Zero::zero();

    for k in 0..m {
      let pivot = r[[k, k]];
      if !(pivot > zero) || !pivot.is_finite() {
        return Err(Error::SingularCovariance {
          row: k,
          pivot: pivot.to_f64().unwrap_or(::std::f64::NAN),
        });
      }

      for j in k + 1..m {
        let t = {
          let t1 = r.row(j);
          let t2 = t1.slice(s![j..]);
          let t3 = r.row(k);
          let t4 = t3.slice(s![j..]);

          &t2 - &(&t4 * (r[[k, j]] / pivot))
        };

        r.row_mut(j)
          .slice_mut(s![j..])
          .assign(&t);
      }

      let t = pivot.sqrt().recip();
      r.row_mut(k)
        .slice_mut(s![k..])
        .mapv_inplace(|v| v * t );
    }

    for k in 0..m {
      r.row_mut(k)
        .slice_mut(s![..k])
        .fill(zero);
    }

    Ok(r)
  }
}

/// A factored symmetric positive definite matrix, used to solve A z = b
/// without forming A^-1.
#[derive(Debug, Clone)]
pub struct CholeskyFactor<E> {
  r: Array<E, Ix2>,
}
impl<E> CholeskyFactor<E>
  where E: Float + ScalarOperand,
{
  pub fn new<S>(a: &ArrayBase<S, Ix2>) -> Result<CholeskyFactor<E>>
    where S: Data<Elem = E>,
  {
    Ok(CholeskyFactor {
      r: a.to_owned().l_lstar()?,
    })
  }

  pub fn dim(&self) -> usize { self.r.nrows() }

  pub fn solve<S>(&self, b: &ArrayBase<S, Ix1>) -> Result<Array<E, Ix1>>
    where S: Data<Elem = E>,
  {
    let n = self.dim();
    check_dim("cholesky solve", n, b.len())?;
    let r = &self.r;

    // R^* w = b
    let mut w = b.to_owned();
    for i in 0..n {
      let mut acc = w[i];
      for k in 0..i {
        acc = acc - r[[k, i]] * w[k];
      }
      w[i] = acc / r[[i, i]];
    }

    // R z = w
    let mut z = w;
    for i in (0..n).rev() {
      let mut acc = z[i];
      for k in i + 1..n {
        acc = acc - r[[i, k]] * z[k];
      }
      z[i] = acc / r[[i, i]];
    }

    Ok(z)
  }
}

#[test]
fn cholesky_llstar() {
  use nd::arr2;

  let a = arr2(&[
    [4.0, 12.0, -16.0],
    [12.0, 37.0, -43.0],
    [-16.0, -43.0, 98.0],
  ]);

  let l = a.l_lstar().expect("cholesky factorization failed");

  let expected = arr2(&[
    [2.0, 6.0, -8.0],
    [0.0, 1.0, 5.0],
    [0.0, 0.0, 3.0],
  ]);
  assert_eq!(l, expected);
}

#[test]
fn cholesky_solve() {
  use nd::{arr1, arr2};
  use nac::utils::PartialEqWithinTol;

  let a = arr2(&[
    [4.0, 12.0, -16.0],
    [12.0, 37.0, -43.0],
    [-16.0, -43.0, 98.0],
  ]);
  let x = arr1(&[1.0, -2.0, 0.5]);
  let b = a.dot(&x);

  let factor = CholeskyFactor::new(&a).unwrap();
  let z = factor.solve(&b).unwrap();
  assert!(z.partial_eq_within_tol(&x, 1e-10));
}

#[test]
fn cholesky_rejects_singular() {
  use nd::{arr1, arr2};

  let singular = arr2(&[
    [1.0, 1.0],
    [1.0, 1.0],
  ]);
  match CholeskyFactor::new(&singular) {
    Err(Error::SingularCovariance { row: 1, .. }) => {},
    r => panic!("expected a singular covariance error, got {:?}", r),
  }

  let indefinite = arr2(&[[-1.0]]);
  assert!(CholeskyFactor::new(&indefinite).is_err());

  let factor = CholeskyFactor::new(&arr2(&[[2.0]])).unwrap();
  assert!(factor.solve(&arr1(&[1.0, 1.0])).is_err());
}

#[test]
fn cholesky_rejects_non_square() {
  use nd::arr2;

  let a = arr2(&[[1.0, 0.0, 0.0]]);
  match CholeskyFactor::new(&a) {
    Err(Error::ShapeMismatch { .. }) => {},
    r => panic!("expected a shape mismatch, got {:?}", r),
  }
}
