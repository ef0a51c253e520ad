//! The implicit de Bruijn graph and path operations over it.

pub mod dbg;
pub mod dot;
pub mod extend;
pub mod split;
