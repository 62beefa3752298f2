#[macro_use]
extern crate ndarray as nd;
extern crate num_traits;
extern crate na_core as nac;

pub use cholesky::*;

pub mod cholesky;
