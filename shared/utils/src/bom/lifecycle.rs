//! Lifecycle alerts for parts referenced by a snapshot

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use solderline_models::{BomSnapshot, LifecycleStage, PartCatalogEntry, Urgency};

use crate::config::LifecycleConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleAlert {
    pub part_id: Uuid,
    pub part_number: String,
    pub stage: LifecycleStage,
    pub urgency: Urgency,
    pub last_time_buy: Option<NaiveDate>,
    /// Negative once the last-time-buy date has passed
    pub days_until_last_time_buy: Option<i64>,
    pub affected_designators: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct LifecycleMonitor {
    warning_days: i64,
}

impl LifecycleMonitor {
    pub fn new(config: &LifecycleConfig) -> Self {
        Self {
            warning_days: config.last_time_buy_warning_days,
        }
    }

    /// One alert per at-risk or NRND part, most urgent first
    pub fn check(&self, snapshot: &BomSnapshot, today: NaiveDate) -> Vec<LifecycleAlert> {
        let mut alerts: Vec<LifecycleAlert> = Vec::new();
        let mut positions: HashMap<Uuid, usize> = HashMap::new();

        for item in &snapshot.items {
            let part = match &item.part {
                Some(part) => part,
                None => continue,
            };

            if let Some(&position) = positions.get(&part.id) {
                alerts[position].affected_designators.push(item.designator().to_string());
                continue;
            }

            if let Some(mut alert) = self.evaluate(part, today) {
                alert.affected_designators.push(item.designator().to_string());
                positions.insert(part.id, alerts.len());
                alerts.push(alert);
            }
        }

        alerts.sort_by(|a, b| b.urgency.cmp(&a.urgency));

        if !alerts.is_empty() {
            tracing::info!(
                snapshot_id = %snapshot.id,
                alerts = alerts.len(),
                "Lifecycle alerts raised"
            );
        }

        alerts
    }

    /// Alert for a single part, if its stage warrants one
    pub fn evaluate(&self, part: &PartCatalogEntry, today: NaiveDate) -> Option<LifecycleAlert> {
        let days_left = part.last_time_buy.map(|date| (date - today).num_days());

        let (urgency, message) = match part.lifecycle_stage {
            LifecycleStage::Active => return None,
            LifecycleStage::Nrnd => (Urgency::Info, "Not recommended for new designs".to_string()),
            LifecycleStage::EolAnnounced => match days_left {
                Some(days) if days < 0 => (
                    Urgency::Critical,
                    format!("Last-time-buy date passed {} days ago", -days),
                ),
                Some(days) if days <= self.warning_days => (
                    Urgency::High,
                    format!("Last-time-buy date in {} days", days),
                ),
                _ => (Urgency::Medium, "End of life announced".to_string()),
            },
            LifecycleStage::Eol => (Urgency::High, "End of life".to_string()),
            LifecycleStage::Obsolete => (Urgency::Critical, "Obsolete".to_string()),
        };

        Some(LifecycleAlert {
            part_id: part.id,
            part_number: part.manufacturer_part_number.clone(),
            stage: part.lifecycle_stage,
            urgency,
            last_time_buy: part.last_time_buy,
            days_until_last_time_buy: days_left,
            affected_designators: Vec::new(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use solderline_models::{BomLineItem, ResolutionMethod, ResolvedBomItem};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn monitor() -> LifecycleMonitor {
        LifecycleMonitor::new(&LifecycleConfig::default())
    }

    fn announced(ltb: Option<NaiveDate>) -> PartCatalogEntry {
        let part = PartCatalogEntry::new("TPS62130", "buck", "QFN-16", dec!(1.10))
            .with_lifecycle(LifecycleStage::EolAnnounced);
        match ltb {
            Some(date) => part.with_last_time_buy(date),
            None => part,
        }
    }

    #[test]
    fn test_last_time_buy_escalation() {
        let m = monitor();

        assert_eq!(m.evaluate(&announced(None), today()).unwrap().urgency, Urgency::Medium);

        let far = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(m.evaluate(&announced(Some(far)), today()).unwrap().urgency, Urgency::Medium);

        let soon = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let alert = m.evaluate(&announced(Some(soon)), today()).unwrap();
        assert_eq!(alert.urgency, Urgency::High);
        assert_eq!(alert.days_until_last_time_buy, Some(30));

        let passed = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(m.evaluate(&announced(Some(passed)), today()).unwrap().urgency, Urgency::Critical);
    }

    #[test]
    fn test_stage_severities() {
        let m = monitor();
        let part = |stage| PartCatalogEntry::new("X", "x", "0603", dec!(1)).with_lifecycle(stage);

        assert!(m.evaluate(&part(LifecycleStage::Active), today()).is_none());
        assert_eq!(m.evaluate(&part(LifecycleStage::Nrnd), today()).unwrap().urgency, Urgency::Info);
        assert_eq!(m.evaluate(&part(LifecycleStage::Eol), today()).unwrap().urgency, Urgency::High);
        assert_eq!(
            m.evaluate(&part(LifecycleStage::Obsolete), today()).unwrap().urgency,
            Urgency::Critical
        );
    }

    #[test]
    fn test_alerts_group_designators() {
        let obsolete = PartCatalogEntry::new("NE555", "timer", "SOIC-8", dec!(0.30))
            .with_lifecycle(LifecycleStage::Obsolete);
        let nrnd = PartCatalogEntry::new("LM358", "opamp", "SOIC-8", dec!(0.20))
            .with_lifecycle(LifecycleStage::Nrnd);
        let item = |d: &str, p: &PartCatalogEntry| {
            ResolvedBomItem::resolved(BomLineItem::new(d, "", "SOIC-8"), p.clone(), ResolutionMethod::ManufacturerPart)
        };

        let snapshot = BomSnapshot::new(
            Uuid::new_v4(),
            "rev-a",
            vec![item("U1", &nrnd), item("U2", &obsolete), item("U3", &obsolete)],
        )
        .unwrap();

        let alerts = monitor().check(&snapshot, today());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].part_number, "NE555");
        assert_eq!(alerts[0].affected_designators, vec!["U2", "U3"]);
        assert_eq!(alerts[1].urgency, Urgency::Info);
    }
}
