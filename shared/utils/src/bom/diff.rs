//! BOM comparison
//!
//! Compares two snapshots by designator. Every designator lands in exactly
//! one of added, removed, modified or unchanged.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use solderline_models::{BomSnapshot, ResolvedBomItem};

/// What differs between the two versions of a designator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTag {
    ComponentChanged,
    QuantityChanged,
    NotesChanged,
}

/// Designator present in only one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct DesignatorDelta {
    pub designator: String,
    pub part_id: Option<Uuid>,
    pub part_number: Option<String>,
    pub quantity: u32,
    /// Signed: positive for added, negative for removed
    pub cost_impact: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModifiedDesignator {
    pub designator: String,
    pub old_part_id: Option<Uuid>,
    pub new_part_id: Option<Uuid>,
    pub old_quantity: u32,
    pub new_quantity: u32,
    pub old_cost: Decimal,
    pub new_cost: Decimal,
    pub changes: BTreeSet<ChangeTag>,
}

impl ModifiedDesignator {
    pub fn cost_impact(&self) -> Decimal {
        self.new_cost - self.old_cost
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostSummary {
    pub total_a: Decimal,
    pub total_b: Decimal,
    pub difference: Decimal,
    pub percentage_change: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub snapshot_a: Uuid,
    pub snapshot_b: Uuid,
    pub added: Vec<DesignatorDelta>,
    pub removed: Vec<DesignatorDelta>,
    pub modified: Vec<ModifiedDesignator>,
    pub unchanged: Vec<String>,
    pub cost: CostSummary,
}

impl ComparisonResult {
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BomDiffEngine;

impl BomDiffEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn compare(&self, a: &BomSnapshot, b: &BomSnapshot) -> ComparisonResult {
        let lookup_a: HashMap<&str, &ResolvedBomItem> = a.items.iter().map(|i| (i.designator(), i)).collect();
        let lookup_b: HashMap<&str, &ResolvedBomItem> = b.items.iter().map(|i| (i.designator(), i)).collect();

        let added: Vec<DesignatorDelta> = b
            .items
            .iter()
            .filter(|item| !lookup_a.contains_key(item.designator()))
            .map(|item| delta(item, item.extended_cost()))
            .collect();

        let mut removed = Vec::new();
        let mut modified = Vec::new();
        let mut unchanged = Vec::new();

        for item_a in &a.items {
            match lookup_b.get(item_a.designator()) {
                None => removed.push(delta(item_a, -item_a.extended_cost())),
                Some(item_b) => {
                    let component_changed = item_a.part_id() != item_b.part_id();
                    let quantity_changed = item_a.quantity() != item_b.quantity();

                    if !(component_changed || quantity_changed) {
                        unchanged.push(item_a.designator().to_string());
                        continue;
                    }

                    let mut changes = BTreeSet::new();
                    if component_changed {
                        changes.insert(ChangeTag::ComponentChanged);
                    }
                    if quantity_changed {
                        changes.insert(ChangeTag::QuantityChanged);
                    }
                    if item_a.line_item.notes != item_b.line_item.notes {
                        changes.insert(ChangeTag::NotesChanged);
                    }

                    modified.push(ModifiedDesignator {
                        designator: item_a.designator().to_string(),
                        old_part_id: item_a.part_id(),
                        new_part_id: item_b.part_id(),
                        old_quantity: item_a.quantity(),
                        new_quantity: item_b.quantity(),
                        old_cost: item_a.extended_cost(),
                        new_cost: item_b.extended_cost(),
                        changes,
                    });
                }
            }
        }

        let cost = cost_summary(a.total_cost(), b.total_cost());

        tracing::debug!(
            snapshot_a = %a.id,
            snapshot_b = %b.id,
            added = added.len(),
            removed = removed.len(),
            modified = modified.len(),
            unchanged = unchanged.len(),
            difference = %cost.difference,
            "Compared BOM snapshots"
        );

        ComparisonResult {
            snapshot_a: a.id,
            snapshot_b: b.id,
            added,
            removed,
            modified,
            unchanged,
            cost,
        }
    }
}

fn delta(item: &ResolvedBomItem, cost_impact: Decimal) -> DesignatorDelta {
    DesignatorDelta {
        designator: item.designator().to_string(),
        part_id: item.part_id(),
        part_number: item.part.as_ref().map(|p| p.manufacturer_part_number.clone()),
        quantity: item.quantity(),
        cost_impact,
    }
}

fn cost_summary(total_a: Decimal, total_b: Decimal) -> CostSummary {
    let difference = total_b - total_a;
    let percentage_change = if total_a > Decimal::ZERO {
        // Only an increase can leave the decimal range, a decrease stops at -100%
        difference
            .checked_div(total_a)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|pct| pct.round_dp(4))
            .unwrap_or(Decimal::MAX)
    } else {
        Decimal::ZERO
    };

    CostSummary {
        total_a,
        total_b,
        difference,
        percentage_change,
    }
}
