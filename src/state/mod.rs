//! The persistent state tree and its shape normalization.

mod normalize;
mod tree;

pub(crate) use normalize::conform;
pub use tree::StateTree;
