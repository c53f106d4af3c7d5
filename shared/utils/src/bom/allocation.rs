//! Allocation readiness
//!
//! Sums the demand a snapshot places on each resolved part and checks it
//! against on-hand stock. Designators draw stock in snapshot order.

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use solderline_models::BomSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Ready,
    Short,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartDemand {
    pub part_id: Uuid,
    pub part_number: String,
    pub required: u64,
    pub available: u64,
    pub shortage: u64,
    pub designators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesignatorAllocation {
    pub designator: String,
    pub part_id: Option<Uuid>,
    pub quantity: u32,
    pub status: AllocationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationPlan {
    pub snapshot_id: Uuid,
    pub parts: Vec<PartDemand>,
    pub designators: Vec<DesignatorAllocation>,
}

impl AllocationPlan {
    /// Every item resolved and no part short
    pub fn is_ready(&self) -> bool {
        self.designators.iter().all(|d| d.status == AllocationStatus::Ready)
            && self.parts.iter().all(|p| p.shortage == 0)
    }

    pub fn short_parts(&self) -> impl Iterator<Item = &PartDemand> {
        self.parts.iter().filter(|p| p.shortage > 0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationPlanner;

impl AllocationPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(&self, snapshot: &BomSnapshot) -> AllocationPlan {
        let mut parts: Vec<PartDemand> = Vec::new();
        let mut positions: HashMap<Uuid, usize> = HashMap::new();
        let mut designators = Vec::with_capacity(snapshot.items.len());

        for item in &snapshot.items {
            let quantity = item.quantity();

            let part = match &item.part {
                Some(part) => part,
                None => {
                    designators.push(DesignatorAllocation {
                        designator: item.designator().to_string(),
                        part_id: None,
                        quantity,
                        status: AllocationStatus::Unresolved,
                    });
                    continue;
                }
            };

            let position = *positions.entry(part.id).or_insert_with(|| {
                parts.push(PartDemand {
                    part_id: part.id,
                    part_number: part.manufacturer_part_number.clone(),
                    required: 0,
                    available: u64::from(part.on_hand_quantity),
                    shortage: 0,
                    designators: Vec::new(),
                });
                parts.len() - 1
            });

            let demand = &mut parts[position];
            demand.required += u64::from(quantity);
            demand.designators.push(item.designator().to_string());

            let status = if demand.required <= demand.available {
                AllocationStatus::Ready
            } else {
                AllocationStatus::Short
            };

            designators.push(DesignatorAllocation {
                designator: item.designator().to_string(),
                part_id: Some(part.id),
                quantity,
                status,
            });
        }

        for demand in &mut parts {
            demand.shortage = demand.required.saturating_sub(demand.available);
        }

        AllocationPlan {
            snapshot_id: snapshot.id,
            parts,
            designators,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use solderline_models::{BomLineItem, PartCatalogEntry, ResolutionMethod, ResolvedBomItem};

    fn resolved(designator: &str, part: &PartCatalogEntry, quantity: u32) -> ResolvedBomItem {
        ResolvedBomItem::resolved(
            BomLineItem::new(designator, "100nF", "0603").with_quantity(quantity),
            part.clone(),
            ResolutionMethod::ParsedValue,
        )
    }

    #[test]
    fn test_stock_is_drawn_in_order() {
        let cap = PartCatalogEntry::new("CL10B104", "100nF", "0603", dec!(0.02)).with_stock(3);
        let snapshot = BomSnapshot::new(
            Uuid::new_v4(),
            "rev-a",
            vec![
                resolved("C1", &cap, 1),
                resolved("C2", &cap, 2),
                resolved("C3", &cap, 1),
            ],
        )
        .unwrap();

        let plan = AllocationPlanner::new().plan(&snapshot);
        let statuses: Vec<_> = plan.designators.iter().map(|d| d.status).collect();
        assert_eq!(
            statuses,
            vec![AllocationStatus::Ready, AllocationStatus::Ready, AllocationStatus::Short]
        );

        assert_eq!(plan.parts.len(), 1);
        assert_eq!(plan.parts[0].required, 4);
        assert_eq!(plan.parts[0].shortage, 1);
        assert_eq!(plan.parts[0].designators, vec!["C1", "C2", "C3"]);
        assert!(!plan.is_ready());
        assert_eq!(plan.short_parts().count(), 1);
    }

    #[test]
    fn test_unresolved_blocks_readiness() {
        let cap = PartCatalogEntry::new("CL10B104", "100nF", "0603", dec!(0.02)).with_stock(100);
        let snapshot = BomSnapshot::new(
            Uuid::new_v4(),
            "rev-a",
            vec![
                resolved("C1", &cap, 1),
                ResolvedBomItem::unresolved(BomLineItem::new("J1", "USB-C", "USB4105")),
            ],
        )
        .unwrap();

        let plan = AllocationPlanner::new().plan(&snapshot);
        assert_eq!(plan.designators[1].status, AllocationStatus::Unresolved);
        assert!(plan.short_parts().next().is_none());
        assert!(!plan.is_ready());
    }

    #[test]
    fn test_ready_snapshot() {
        let cap = PartCatalogEntry::new("CL10B104", "100nF", "0603", dec!(0.02)).with_stock(2);
        let snapshot =
            BomSnapshot::new(Uuid::new_v4(), "rev-a", vec![resolved("C1", &cap, 2)]).unwrap();
        assert!(AllocationPlanner::new().plan(&snapshot).is_ready());
    }
}
