//! Graph construction and representation
//!
//! This module provides graph building and the read-only CSR storage that
//! both estimators consume.

pub mod builder;
pub mod csr;

pub use builder::{GraphBuilder, NodeKey};
pub use csr::{CsrGraph, GraphStats};
