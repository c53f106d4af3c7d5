//! BOM cost analysis
//!
//! Totals a snapshot, breaks the total down by part category and runs three
//! independent checks over every resolved item: cheaper compatible
//! alternatives, lifecycle risk, and stock shortage.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use solderline_models::{BomSnapshot, LifecycleStage, Urgency};

use super::catalog::PartCatalog;
use crate::config::BomConfig;

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub total_cost: Decimal,
    pub total_quantity: u64,
    pub item_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizationSuggestion {
    CostOptimization {
        designator: String,
        current_part: String,
        current_price: Decimal,
        alternative_part: String,
        alternative_price: Decimal,
        compatibility_score: f64,
        quantity: u32,
        savings: Decimal,
    },
    LifecycleRisk {
        designator: String,
        part_number: String,
        stage: LifecycleStage,
        urgency: Urgency,
    },
    StockShortage {
        designator: String,
        part_number: String,
        required: u32,
        available: u32,
        shortage: u32,
    },
}

impl OptimizationSuggestion {
    pub fn designator(&self) -> &str {
        match self {
            Self::CostOptimization { designator, .. }
            | Self::LifecycleRisk { designator, .. }
            | Self::StockShortage { designator, .. } => designator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostAnalysis {
    pub snapshot_id: uuid::Uuid,
    pub currency: String,
    pub total_cost: Decimal,
    pub categories: BTreeMap<String, CategoryBreakdown>,
    pub suggestions: Vec<OptimizationSuggestion>,
}

impl CostAnalysis {
    /// Sum of savings over the cost optimization suggestions
    pub fn potential_savings(&self) -> Decimal {
        self.suggestions
            .iter()
            .map(|s| match s {
                OptimizationSuggestion::CostOptimization { savings, .. } => *savings,
                _ => Decimal::ZERO,
            })
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct BomCostAggregator {
    high_cost_threshold: Decimal,
    min_alternative_score: f64,
    currency: String,
}

impl BomCostAggregator {
    pub fn new(config: &BomConfig, currency: impl Into<String>) -> Self {
        Self {
            high_cost_threshold: config.high_cost_threshold,
            min_alternative_score: config.min_alternative_score,
            currency: currency.into(),
        }
    }

    /// Analyzes one snapshot. Reads the catalog only for alternatives.
    pub fn analyze<C: PartCatalog + ?Sized>(&self, snapshot: &BomSnapshot, catalog: &C) -> CostAnalysis {
        let mut categories: BTreeMap<String, CategoryBreakdown> = BTreeMap::new();
        let mut suggestions = Vec::new();

        for item in &snapshot.items {
            let category = item
                .part
                .as_ref()
                .and_then(|p| p.category.as_deref())
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(UNCATEGORIZED);

            let breakdown = categories.entry(category.to_string()).or_default();
            breakdown.total_cost += item.extended_cost();
            breakdown.total_quantity += u64::from(item.quantity());
            breakdown.item_count += 1;

            let part = match &item.part {
                Some(part) => part,
                None => continue,
            };
            let quantity = item.quantity();

            if part.unit_price > self.high_cost_threshold {
                let cheapest = catalog
                    .find_alternatives(part.id, self.min_alternative_score)
                    .into_iter()
                    .filter(|alt| alt.part.unit_price < part.unit_price)
                    .min_by(|a, b| {
                        a.part
                            .unit_price
                            .cmp(&b.part.unit_price)
                            .then(b.compatibility_score.total_cmp(&a.compatibility_score))
                    });

                if let Some(alt) = cheapest {
                    suggestions.push(OptimizationSuggestion::CostOptimization {
                        designator: item.designator().to_string(),
                        current_part: part.manufacturer_part_number.clone(),
                        current_price: part.unit_price,
                        alternative_part: alt.part.manufacturer_part_number.clone(),
                        alternative_price: alt.part.unit_price,
                        compatibility_score: alt.compatibility_score,
                        quantity,
                        savings: (part.unit_price - alt.part.unit_price) * Decimal::from(quantity),
                    });
                }
            }

            if let Some(urgency) = part.lifecycle_stage.risk_urgency() {
                suggestions.push(OptimizationSuggestion::LifecycleRisk {
                    designator: item.designator().to_string(),
                    part_number: part.manufacturer_part_number.clone(),
                    stage: part.lifecycle_stage,
                    urgency,
                });
            }

            if part.on_hand_quantity < quantity {
                suggestions.push(OptimizationSuggestion::StockShortage {
                    designator: item.designator().to_string(),
                    part_number: part.manufacturer_part_number.clone(),
                    required: quantity,
                    available: part.on_hand_quantity,
                    shortage: quantity - part.on_hand_quantity,
                });
            }
        }

        let analysis = CostAnalysis {
            snapshot_id: snapshot.id,
            currency: self.currency.clone(),
            total_cost: snapshot.total_cost(),
            categories,
            suggestions,
        };

        tracing::debug!(
            snapshot_id = %snapshot.id,
            total_cost = %analysis.total_cost,
            suggestions = analysis.suggestions.len(),
            "Analyzed BOM cost"
        );

        analysis
    }
}
