//! Catalog data model: ingredients, recipes, and the lookup seam.
//!
//! Records arrive here already validated and slug-resolved by the
//! import pipeline; the catalog's job is to hold them, hand them to the
//! calculator through [`Lookup`], and build the dependency graph used
//! for cycle validation (run once per import or edit, not per cost
//! computation).

use crate::graph::{DependencyGraph, GraphError, Projection};
use crate::units::{ConversionRule, Unit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A leaf purchasable item with a cost per purchase unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub slug: String,
    /// Purchase cost in integer minor-currency units (e.g. pence).
    pub purchase_cost: i64,
    /// The quantity the purchase cost buys, e.g. `1000g`.
    pub purchase_unit: Unit,
    /// Optional bridging rule for lines that use a different dimension
    /// than the purchase unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConversionRule>,
    #[serde(default)]
    pub vat: bool,
}

/// What an ingredient-line references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Ingredient,
    Recipe,
}

/// One line of a recipe: a referenced entity plus the quantity used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub slug: String,
    pub kind: RefKind,
    pub usage: Unit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// How a recipe is priced: a fixed sell price, or a target margin the
/// sell price is derived from. The `vat` flag marks the sell price as
/// VAT-inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CostingPolicy {
    FixedPrice { sell_price: i64, vat: bool },
    TargetMargin { percent: f64, vat: bool },
}

/// A costed item composed of ordered ingredient-lines. A recipe may
/// itself appear as a line of another recipe (sub-recipe).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub slug: String,
    /// Stage/class tags, e.g. "starter", "prep".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stage_tags: Vec<String>,
    pub costing: CostingPolicy,
    pub lines: Vec<IngredientLine>,
}

/// The seam between the calculator and whatever loads entities.
pub trait Lookup {
    fn ingredient(&self, slug: &str) -> Option<&Ingredient>;
    fn recipe(&self, slug: &str) -> Option<&Recipe>;
}

/// Slug-keyed store for loaded entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub ingredients: BTreeMap<String, Ingredient>,
    pub recipes: BTreeMap<String, Recipe>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients.insert(ingredient.slug.clone(), ingredient);
    }

    pub fn insert_recipe(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.slug.clone(), recipe);
    }

    /// Build the dependency graph: one node per entity, one edge per
    /// line reference. A line referencing a slug that was never loaded
    /// surfaces as [`GraphError::NodeNotFound`].
    pub fn graph(&self) -> Result<DependencyGraph<RefKind>, GraphError> {
        let mut graph = DependencyGraph::new();
        for slug in self.ingredients.keys() {
            graph.insert(slug.clone(), RefKind::Ingredient);
        }
        for slug in self.recipes.keys() {
            graph.insert(slug.clone(), RefKind::Recipe);
        }
        for recipe in self.recipes.values() {
            for line in &recipe.lines {
                graph.set_dependency(&recipe.slug, &line.slug)?;
            }
        }
        debug!(
            ingredients = self.ingredients.len(),
            recipes = self.recipes.len(),
            "built catalog dependency graph"
        );
        Ok(graph)
    }

    /// Validate that no recipe participates in a reference cycle.
    ///
    /// Run once per import/edit; the calculator trusts this guard
    /// instead of re-checking per cost computation.
    pub fn validate_acyclic(&self) -> Result<(), GraphError> {
        let graph = self.graph()?;
        for slug in self.recipes.keys() {
            graph.dependencies(slug, Projection::Ids)?;
        }
        Ok(())
    }
}

impl Lookup for Catalog {
    fn ingredient(&self, slug: &str) -> Option<&Ingredient> {
        self.ingredients.get(slug)
    }

    fn recipe(&self, slug: &str) -> Option<&Recipe> {
        self.recipes.get(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::parse_unit;

    fn ingredient(slug: &str) -> Ingredient {
        Ingredient {
            slug: slug.to_string(),
            purchase_cost: 100,
            purchase_unit: parse_unit("1000g").unwrap(),
            conversion: None,
            vat: false,
        }
    }

    fn line(slug: &str, kind: RefKind) -> IngredientLine {
        IngredientLine {
            slug: slug.to_string(),
            kind,
            usage: parse_unit("200g").unwrap(),
            note: None,
        }
    }

    fn recipe(slug: &str, lines: Vec<IngredientLine>) -> Recipe {
        Recipe {
            slug: slug.to_string(),
            stage_tags: Vec::new(),
            costing: CostingPolicy::FixedPrice {
                sell_price: 1000,
                vat: false,
            },
            lines,
        }
    }

    #[test]
    fn test_graph_has_node_per_entity_and_edge_per_line() {
        let mut catalog = Catalog::new();
        catalog.insert_ingredient(ingredient("flour"));
        catalog.insert_ingredient(ingredient("water"));
        catalog.insert_recipe(recipe(
            "dough",
            vec![
                line("flour", RefKind::Ingredient),
                line("water", RefKind::Ingredient),
            ],
        ));

        let graph = catalog.graph().unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.get("dough"), Some(&RefKind::Recipe));
        let deps = graph.dependency_ids("dough").unwrap();
        assert_eq!(deps.len(), 2);
    }

    #[test]
    fn test_graph_rejects_dangling_reference() {
        let mut catalog = Catalog::new();
        catalog.insert_recipe(recipe("dough", vec![line("flour", RefKind::Ingredient)]));

        let err = catalog.graph().unwrap_err();
        assert_eq!(
            err,
            GraphError::NodeNotFound {
                id: "flour".to_string()
            }
        );
    }

    #[test]
    fn test_validate_acyclic_passes_nested_recipes() {
        let mut catalog = Catalog::new();
        catalog.insert_ingredient(ingredient("flour"));
        catalog.insert_recipe(recipe("dough", vec![line("flour", RefKind::Ingredient)]));
        catalog.insert_recipe(recipe("pizza", vec![line("dough", RefKind::Recipe)]));

        assert!(catalog.validate_acyclic().is_ok());
    }

    #[test]
    fn test_validate_acyclic_reports_cycle_path() {
        let mut catalog = Catalog::new();
        catalog.insert_recipe(recipe("a", vec![line("b", RefKind::Recipe)]));
        catalog.insert_recipe(recipe("b", vec![line("a", RefKind::Recipe)]));

        match catalog.validate_acyclic().unwrap_err() {
            GraphError::Cycle { path } => {
                assert_eq!(path.first(), path.last());
                assert!(path.len() >= 3);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_costing_policy_serde_tagging() {
        let policy = CostingPolicy::TargetMargin {
            percent: 70.0,
            vat: true,
        };
        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("\"policy\":\"target_margin\""));
        let back: CostingPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
