//! Cost breakdown and margin calculation for recipes.
//!
//! Consumes a cycle-validated catalog from `mise-core` and produces
//! [`cost::RecipeCostNode`] attribution trees and [`margin::MarginResult`]
//! pricing figures. Pure and synchronous: no I/O, no internal state.

pub mod cost;
pub mod margin;
