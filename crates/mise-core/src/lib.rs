//! Core types for recipe costing.
//!
//! Provides the generic dependency graph ([`graph::DependencyGraph`]),
//! unit expressions and conversion ([`units`]), the catalog data model
//! ([`catalog`]), exhaustive path diagnostics ([`paths`]), and
//! configuration loading.

pub mod catalog;
pub mod config;
pub mod graph;
pub mod paths;
pub mod units;
