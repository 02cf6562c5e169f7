//! Recipe cost breakdown over a validated catalog.
//!
//! The calculator is a pure function of (recipe, lookup, config): it
//! never mutates the catalog or graph, and it trusts the caller's
//! dependency graph to have been cycle-checked at import/edit time.
//! Evaluation uses an explicit frame stack rather than native
//! recursion, with a configured maximum depth as the circuit breaker
//! behind the acyclicity guarantee.

use mise_core::catalog::{Ingredient, IngredientLine, Lookup, Recipe, RefKind};
use mise_core::config::CalculatorConfig;
use mise_core::units::{UnitError, convert_units};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Errors raised by cost and margin computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CostError {
    #[error("unknown reference: {slug}")]
    UnknownReference { slug: String },
    #[error("recipe nesting exceeds the configured limit of {limit}")]
    DepthExceeded { limit: usize },
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error("invalid costing: {reason}")]
    InvalidCosting { reason: String },
}

/// One node of the cost-attribution tree, mirroring the recipe's
/// ingredient-line hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCostNode {
    pub slug: String,
    pub kind: RefKind,
    /// Ingredient lines: usage quantity converted into purchase-unit
    /// terms. Recipe lines: the line's stated usage amount.
    pub quantity: f64,
    /// Purchase cost per purchase unit in minor currency units.
    /// Zero for recipe nodes, which have no purchase unit.
    pub unit_cost: i64,
    /// This line's contribution to its parent, minor units. Rounding to
    /// integer minor units happens at this step and nowhere earlier.
    pub line_cost: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RecipeCostNode>,
    /// Recipe nodes: sum of child line costs. Leaves: equals
    /// `line_cost`.
    pub total_cost: i64,
}

struct Frame<'a> {
    recipe: &'a Recipe,
    node: RecipeCostNode,
    cursor: usize,
}

/// Compute a recipe's full cost breakdown.
///
/// Each ingredient line costs
/// `round(purchase_cost × quantity_in_purchase_units)`; sub-recipe
/// lines contribute their own computed `total_cost`, not a flattened
/// ingredient list. A failure leaves no state behind — unrelated
/// recipes sharing the same catalog are unaffected.
pub fn compute_recipe_cost(
    recipe: &Recipe,
    lookup: &impl Lookup,
    config: &CalculatorConfig,
) -> Result<RecipeCostNode, CostError> {
    let mut stack: Vec<Frame<'_>> = vec![Frame {
        recipe,
        node: recipe_node(recipe.slug.clone(), 1.0),
        cursor: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let current = frame.recipe;
        if frame.cursor < current.lines.len() {
            let line = &current.lines[frame.cursor];
            frame.cursor += 1;
            match line.kind {
                RefKind::Ingredient => {
                    let ingredient =
                        lookup
                            .ingredient(&line.slug)
                            .ok_or_else(|| CostError::UnknownReference {
                                slug: line.slug.clone(),
                            })?;
                    let child = cost_ingredient_line(ingredient, line)?;
                    frame.node.children.push(child);
                }
                RefKind::Recipe => {
                    let sub = lookup
                        .recipe(&line.slug)
                        .ok_or_else(|| CostError::UnknownReference {
                            slug: line.slug.clone(),
                        })?;
                    if stack.len() >= config.max_depth {
                        warn!(
                            recipe = %recipe.slug,
                            sub = %sub.slug,
                            limit = config.max_depth,
                            "recipe nesting hit the depth circuit breaker"
                        );
                        return Err(CostError::DepthExceeded {
                            limit: config.max_depth,
                        });
                    }
                    let node = recipe_node(sub.slug.clone(), line.usage.amount());
                    stack.push(Frame {
                        recipe: sub,
                        node,
                        cursor: 0,
                    });
                }
            }
        } else if let Some(mut finished) = stack.pop() {
            finished.node.total_cost = finished.node.children.iter().map(|c| c.line_cost).sum();
            finished.node.line_cost = finished.node.total_cost;
            match stack.last_mut() {
                Some(parent) => parent.node.children.push(finished.node),
                None => {
                    debug!(
                        recipe = %recipe.slug,
                        total_cost = finished.node.total_cost,
                        "computed recipe cost"
                    );
                    return Ok(finished.node);
                }
            }
        }
    }

    unreachable!("the root frame returns before the stack drains")
}

fn recipe_node(slug: String, quantity: f64) -> RecipeCostNode {
    RecipeCostNode {
        slug,
        kind: RefKind::Recipe,
        quantity,
        unit_cost: 0,
        line_cost: 0,
        children: Vec::new(),
        total_cost: 0,
    }
}

/// Cost a single leaf line: convert the usage quantity into the
/// ingredient's purchase-unit terms, multiply by the purchase cost, and
/// round to minor units exactly once.
fn cost_ingredient_line(
    ingredient: &Ingredient,
    line: &IngredientLine,
) -> Result<RecipeCostNode, CostError> {
    let purchase_amount = ingredient.purchase_unit.amount();
    if purchase_amount <= 0.0 {
        return Err(CostError::InvalidCosting {
            reason: format!(
                "ingredient {} has a non-positive purchase quantity",
                ingredient.slug
            ),
        });
    }

    let in_purchase_symbol = convert_units(
        line.usage.amount(),
        &line.usage,
        &ingredient.purchase_unit,
        ingredient.conversion.as_ref(),
    )?;
    let quantity = in_purchase_symbol / purchase_amount;
    let line_cost = (ingredient.purchase_cost as f64 * quantity).round() as i64;

    Ok(RecipeCostNode {
        slug: ingredient.slug.clone(),
        kind: RefKind::Ingredient,
        quantity,
        unit_cost: ingredient.purchase_cost,
        line_cost,
        children: Vec::new(),
        total_cost: line_cost,
    })
}

impl RecipeCostNode {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self.kind {
            RefKind::Recipe => writeln!(f, "{pad}{}: {}p", self.slug, self.total_cost)?,
            RefKind::Ingredient => writeln!(
                f,
                "{pad}{} {:.3} x {}p = {}p",
                self.slug, self.quantity, self.unit_cost, self.line_cost
            )?,
        }
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for RecipeCostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
