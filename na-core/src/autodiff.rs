//! Reverse-mode differentiation over a Wengert list.
//!
//! Every arithmetic operation on a `Var` appends one node to its `Tape`,
//! recording the indices of its operands together with the local partial
//! derivatives. `Var::grad` then walks the tape once, back to front, to
//! accumulate adjoints. A tape is meant to live for exactly one evaluation:
//! create it, register the inputs, compute, differentiate, drop.

use nd::{ArrayView, Ix1};

use std::cell::RefCell;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

#[derive(Debug, Clone)]
enum Node {
  Leaf,
  Unary(usize, f64),
  Binary(usize, f64, usize, f64),
  Nary(Vec<(usize, f64)>),
}

#[derive(Debug, Default)]
pub struct Tape {
  nodes: RefCell<Vec<Node>>,
}
impl Tape {
  pub fn new() -> Tape {
    Tape {
      nodes: RefCell::new(Vec::new()),
    }
  }

  /// Registers an independent variable.
  pub fn var(&self, value: f64) -> Var {
    let index = self.push(Node::Leaf);
    Var {
      tape: self,
      index: index,
      value: value,
    }
  }

  pub fn len(&self) -> usize { self.nodes.borrow().len() }
  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn push(&self, node: Node) -> usize {
    let mut nodes = self.nodes.borrow_mut();
    nodes.push(node);
    nodes.len() - 1
  }

  fn unary(&self, value: f64, parent: usize, partial: f64) -> Var {
    let index = self.push(Node::Unary(parent, partial));
    Var { tape: self, index: index, value: value, }
  }
  fn binary(&self, value: f64,
            lhs: usize, lhs_partial: f64,
            rhs: usize, rhs_partial: f64) -> Var {
    let index = self.push(Node::Binary(lhs, lhs_partial, rhs, rhs_partial));
    Var { tape: self, index: index, value: value, }
  }
}

#[derive(Clone, Copy)]
pub struct Var<'t> {
  tape: &'t Tape,
  index: usize,
  value: f64,
}

impl<'t> Var<'t> {
  pub fn value(&self) -> f64 { self.value }

  /// Adjoints of every node recorded before (and including) `self`,
  /// seeded with d(self)/d(self) = 1.
  pub fn grad(&self) -> Gradient {
    let nodes = self.tape.nodes.borrow();
    let mut adjoints = vec![0.0; self.index + 1];
    adjoints[self.index] = 1.0;

    for i in (0..self.index + 1).rev() {
      let adjoint = adjoints[i];
      if adjoint == 0.0 { continue; }

      match nodes[i] {
        Node::Leaf => {},
        Node::Unary(p, d) => {
          adjoints[p] += adjoint * d;
        },
        Node::Binary(l, dl, r, dr) => {
          adjoints[l] += adjoint * dl;
          adjoints[r] += adjoint * dr;
        },
        Node::Nary(ref parents) => {
          for &(p, d) in parents.iter() {
            adjoints[p] += adjoint * d;
          }
        },
      }
    }

    Gradient { adjoints: adjoints, }
  }

  fn same_tape(&self, rhs: &Var<'t>) {
    debug_assert!(::std::ptr::eq(self.tape, rhs.tape),
                  "mixing variables from different tapes");
  }
}

impl<'t> fmt::Debug for Var<'t> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Var")
      .field("index", &self.index)
      .field("value", &self.value)
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct Gradient {
  adjoints: Vec<f64>,
}
impl Gradient {
  /// d(output)/d(v). Zero for variables recorded after the output.
  pub fn wrt(&self, v: &Var) -> f64 {
    self.adjoints
      .get(v.index)
      .cloned()
      .unwrap_or(0.0)
  }
}

impl<'t> Add for Var<'t> {
  type Output = Var<'t>;
  fn add(self, rhs: Var<'t>) -> Var<'t> {
    self.same_tape(&rhs);
    self.tape.binary(self.value + rhs.value, self.index, 1.0, rhs.index, 1.0)
  }
}
impl<'t> Sub for Var<'t> {
  type Output = Var<'t>;
  fn sub(self, rhs: Var<'t>) -> Var<'t> {
    self.same_tape(&rhs);
    self.tape.binary(self.value - rhs.value, self.index, 1.0, rhs.index, -1.0)
  }
}
impl<'t> Mul for Var<'t> {
  type Output = Var<'t>;
  fn mul(self, rhs: Var<'t>) -> Var<'t> {
    self.same_tape(&rhs);
    self.tape.binary(self.value * rhs.value,
                     self.index, rhs.value,
                     rhs.index, self.value)
  }
}
impl<'t> Div for Var<'t> {
  type Output = Var<'t>;
  fn div(self, rhs: Var<'t>) -> Var<'t> {
    self.same_tape(&rhs);
    let inv = rhs.value.recip();
    let value = self.value * inv;
    self.tape.binary(value,
                     self.index, inv,
                     rhs.index, -value * inv)
  }
}
impl<'t> Neg for Var<'t> {
  type Output = Var<'t>;
  fn neg(self) -> Var<'t> {
    self.tape.unary(-self.value, self.index, -1.0)
  }
}

impl<'t> Add<f64> for Var<'t> {
  type Output = Var<'t>;
  fn add(self, rhs: f64) -> Var<'t> {
    self.tape.unary(self.value + rhs, self.index, 1.0)
  }
}
impl<'t> Sub<f64> for Var<'t> {
  type Output = Var<'t>;
  fn sub(self, rhs: f64) -> Var<'t> {
    self.tape.unary(self.value - rhs, self.index, 1.0)
  }
}
impl<'t> Mul<f64> for Var<'t> {
  type Output = Var<'t>;
  fn mul(self, rhs: f64) -> Var<'t> {
    self.tape.unary(self.value * rhs, self.index, rhs)
  }
}
impl<'t> Div<f64> for Var<'t> {
  type Output = Var<'t>;
  fn div(self, rhs: f64) -> Var<'t> {
    self.tape.unary(self.value / rhs, self.index, rhs.recip())
  }
}

impl<'t> Add<Var<'t>> for f64 {
  type Output = Var<'t>;
  fn add(self, rhs: Var<'t>) -> Var<'t> { rhs + self }
}
impl<'t> Sub<Var<'t>> for f64 {
  type Output = Var<'t>;
  fn sub(self, rhs: Var<'t>) -> Var<'t> {
    rhs.tape.unary(self - rhs.value, rhs.index, -1.0)
  }
}
impl<'t> Mul<Var<'t>> for f64 {
  type Output = Var<'t>;
  fn mul(self, rhs: Var<'t>) -> Var<'t> { rhs * self }
}
impl<'t> Div<Var<'t>> for f64 {
  type Output = Var<'t>;
  fn div(self, rhs: Var<'t>) -> Var<'t> {
    let value = self / rhs.value;
    rhs.tape.unary(value, rhs.index, -value / rhs.value)
  }
}

/// Scalars the models and cost functions are generic over: plain `f64` for
/// evaluation, `Var` when a gradient is wanted.
pub trait Real: Copy + fmt::Debug
  + Add<Output = Self> + Sub<Output = Self>
  + Mul<Output = Self> + Div<Output = Self>
  + Neg<Output = Self>
  + Add<f64, Output = Self> + Sub<f64, Output = Self>
  + Mul<f64, Output = Self> + Div<f64, Output = Self>
{
  fn value(&self) -> f64;

  fn sin(self) -> Self;
  fn cos(self) -> Self;
  fn exp(self) -> Self;
  fn ln(self) -> Self;
  fn sqrt(self) -> Self;
  fn powi(self, n: i32) -> Self;

  /// `vᵗ z` where `z = C⁻¹ v` for a symmetric `C`, so that the derivative
  /// with respect to `v` is `2 z`. `v` must not be empty and must have the
  /// same length as `solved`.
  fn symmetric_form(v: ArrayView<Self, Ix1>, solved: ArrayView<f64, Ix1>) -> Self;
}

impl Real for f64 {
  fn value(&self) -> f64 { *self }

  fn sin(self) -> f64 { f64::sin(self) }
  fn cos(self) -> f64 { f64::cos(self) }
  fn exp(self) -> f64 { f64::exp(self) }
  fn ln(self) -> f64 { f64::ln(self) }
  fn sqrt(self) -> f64 { f64::sqrt(self) }
  fn powi(self, n: i32) -> f64 { f64::powi(self, n) }

  fn symmetric_form(v: ArrayView<f64, Ix1>, solved: ArrayView<f64, Ix1>) -> f64 {
    debug_assert_eq!(v.len(), solved.len());
    v.dot(&solved)
  }
}

impl<'t> Real for Var<'t> {
  fn value(&self) -> f64 { self.value }

  fn sin(self) -> Var<'t> {
    self.tape.unary(self.value.sin(), self.index, self.value.cos())
  }
  fn cos(self) -> Var<'t> {
    self.tape.unary(self.value.cos(), self.index, -self.value.sin())
  }
  fn exp(self) -> Var<'t> {
    let value = self.value.exp();
    self.tape.unary(value, self.index, value)
  }
  fn ln(self) -> Var<'t> {
    self.tape.unary(self.value.ln(), self.index, self.value.recip())
  }
  fn sqrt(self) -> Var<'t> {
    let value = self.value.sqrt();
    self.tape.unary(value, self.index, 0.5 / value)
  }
  fn powi(self, n: i32) -> Var<'t> {
    let partial = n as f64 * self.value.powi(n - 1);
    self.tape.unary(self.value.powi(n), self.index, partial)
  }

  fn symmetric_form(v: ArrayView<Var<'t>, Ix1>, solved: ArrayView<f64, Ix1>) -> Var<'t> {
    debug_assert_eq!(v.len(), solved.len());
    let tape = v[0].tape;

    let mut value = 0.0;
    let mut parents = Vec::with_capacity(v.len());
    for (x, &z) in v.iter().zip(solved.iter()) {
      x.same_tape(&v[0]);
      value += x.value * z;
      parents.push((x.index, 2.0 * z));
    }

    let index = tape.push(Node::Nary(parents));
    Var { tape: tape, index: index, value: value, }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use nd::arr1;

  #[test]
  fn product_rule() {
    let tape = Tape::new();
    let x = tape.var(3.0);
    let y = tape.var(-2.0);
    let z = x * y + x.sin() - y / x;

    let g = z.grad();
    let dx = -2.0 + 3.0f64.cos() + -2.0 / 9.0;
    let dy = 3.0 - 1.0 / 3.0;
    assert!((g.wrt(&x) - dx).abs() < 1e-12);
    assert!((g.wrt(&y) - dy).abs() < 1e-12);
  }

  #[test]
  fn reused_operand_accumulates() {
    let tape = Tape::new();
    let x = tape.var(1.5);
    let z = x * x * x - 2.0 * x + (4.0 - x);
    let g = z.grad();
    assert!((g.wrt(&x) - (3.0 * 1.5 * 1.5 - 3.0)).abs() < 1e-12);
    assert_eq!(z.value(), 1.5f64.powi(3) - 3.0 + 2.5);
  }

  #[test]
  fn unary_functions() {
    let tape = Tape::new();
    let x = tape.var(0.7);
    let z = x.exp() * x.ln() + x.sqrt() + x.powi(3) + x.cos();
    let g = z.grad();
    let expected = 0.7f64.exp() * 0.7f64.ln() + 0.7f64.exp() / 0.7
      + 0.5 / 0.7f64.sqrt() + 3.0 * 0.49 - 0.7f64.sin();
    assert!((g.wrt(&x) - expected).abs() < 1e-12);
  }

  #[test]
  fn symmetric_form_gradient() {
    let tape = Tape::new();
    let v = arr1(&[tape.var(1.0), tape.var(2.0)]);
    // C = diag(2, 4) => C^-1 v = (0.5, 0.5)
    let solved = arr1(&[0.5, 0.5]);
    let q = Real::symmetric_form(v.view(), solved.view());
    assert_eq!(q.value(), 1.5);
    let g = q.grad();
    assert_eq!(g.wrt(&v[0]), 1.0);
    assert_eq!(g.wrt(&v[1]), 1.0);

    let plain = arr1(&[1.0, 2.0]);
    assert_eq!(<f64 as Real>::symmetric_form(plain.view(), solved.view()), 1.5);
  }

  #[test]
  fn later_variables_have_zero_gradient() {
    let tape = Tape::new();
    let x = tape.var(2.0);
    let z = x * 3.0;
    let late = tape.var(1.0);
    assert_eq!(z.grad().wrt(&late), 0.0);
    assert_eq!(tape.len(), 3);
  }
}
