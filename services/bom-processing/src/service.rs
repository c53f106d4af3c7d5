//! BOM Service
//!
//! Import, comparison and analysis of project BOM snapshots. The matching and
//! analysis steps are synchronous; this layer only loads and stores data.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use sqlx::PgPool;
use uuid::Uuid;

use solderline_database::{BomRepository, PartRepository, ProjectRepository, SnapshotSummary};
use solderline_models::{BomSnapshot, PartAlternative, PartCatalogEntry, Project};
use solderline_utils::{
    validate_file_type, validate_model, AllocationPlan, AllocationPlanner, AppConfig, BomCostAggregator,
    BomDiffEngine, BomFileParser, ComparisonResult, ComponentMatcher, CostAnalysis, InMemoryCatalog,
    LifecycleAlert, LifecycleMonitor, ParsedBom, PartCatalog, ResolutionReport, RowDiagnostic, SolderlineError,
    BOM_FILE_TYPES,
};

/// Outcome of a BOM import
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub project_id: Uuid,
    pub snapshot_id: Uuid,
    pub version_label: String,
    pub source_checksum: Option<String>,
    pub total_rows: usize,
    pub item_count: usize,
    pub skipped_rows: Vec<usize>,
    pub diagnostics: Vec<RowDiagnostic>,
    pub parse_warnings: Vec<String>,
    pub resolution: ResolutionReport,
    pub total_cost: Decimal,
    pub currency: String,
}

/// A new import, before anything is stored
pub struct ImportRequest<'a> {
    pub project_name: &'a str,
    pub customer_name: Option<&'a str>,
    pub version_label: &'a str,
    pub filename: &'a str,
    pub data: &'a [u8],
}

#[derive(Clone)]
pub struct BomService {
    pool: PgPool,
    config: AppConfig,
}

impl BomService {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        Self { pool, config }
    }

    /// Parses, resolves and stores a BOM file as a new snapshot.
    ///
    /// Project lookup or creation, catalog read and snapshot writes share one
    /// transaction; a rejected import leaves nothing behind.
    pub async fn import(&self, request: ImportRequest<'_>) -> Result<ImportReport> {
        validate_file_type(request.filename, BOM_FILE_TYPES)?;

        let parsed = BomFileParser::new()
            .parse_bytes(request.filename, request.data, None)
            .map_err(|e| SolderlineError::bom_parse(format!("{:#}", e)))?;

        let candidate = Project::new(request.project_name, request.customer_name.map(str::to_string));
        validate_model(&candidate)?;

        let mut transaction = self.pool.begin().await.context("Failed to begin import transaction")?;

        let project = ProjectRepository::find_or_create(&mut *transaction, &candidate).await?;
        let parts = PartRepository::load_all(&mut *transaction).await?;
        let alternatives = PartRepository::load_alternatives(&mut *transaction).await?;
        let catalog = InMemoryCatalog::new(parts, alternatives);

        let (snapshot, resolution) = build_snapshot(&project, &request, &parsed, &catalog)?;

        BomRepository::insert_snapshot(&mut *transaction, &snapshot).await?;
        transaction.commit().await.context("Failed to commit import")?;

        tracing::info!(
            project = %project.name,
            snapshot_id = %snapshot.id,
            version = %snapshot.version_label,
            items = snapshot.items.len(),
            unresolved = resolution.unresolved.len(),
            "BOM imported"
        );

        Ok(ImportReport {
            project_id: project.id,
            snapshot_id: snapshot.id,
            version_label: snapshot.version_label.clone(),
            source_checksum: snapshot.source_checksum.clone(),
            total_rows: parsed.total_rows,
            item_count: snapshot.items.len(),
            skipped_rows: parsed.skipped_rows,
            diagnostics: parsed.diagnostics,
            parse_warnings: parsed.parse_warnings,
            resolution,
            total_cost: snapshot.total_cost(),
            currency: self.config.company.currency.clone(),
        })
    }

    /// Stores every part and alternative of a catalog file in one transaction
    pub async fn load_catalog(&self, data: &[u8]) -> Result<CatalogReport> {
        let catalog = parse_catalog_file(data)?;

        let mut transaction = self.pool.begin().await.context("Failed to begin catalog transaction")?;
        for part in &catalog.parts {
            PartRepository::upsert(&mut *transaction, part).await?;
        }
        for alternative in &catalog.alternatives {
            PartRepository::upsert_alternative(&mut *transaction, alternative).await?;
        }
        transaction.commit().await.context("Failed to commit catalog")?;

        tracing::info!(
            parts = catalog.parts.len(),
            alternatives = catalog.alternatives.len(),
            "Catalog loaded"
        );

        Ok(CatalogReport {
            parts: catalog.parts.len(),
            alternatives: catalog.alternatives.len(),
        })
    }

    pub async fn list_snapshots(&self, project_name: &str) -> Result<Vec<SnapshotSummary>> {
        let project = self.project(project_name).await?;
        BomRepository::new(self.pool.clone()).list_by_project(project.id).await
    }

    pub async fn compare(&self, project_name: &str, from: &str, to: &str) -> Result<ComparisonResult> {
        let project = self.project(project_name).await?;
        let a = self.snapshot(&project, from).await?;
        let b = self.snapshot(&project, to).await?;

        Ok(BomDiffEngine::new().compare(&a, &b))
    }

    pub async fn analyze(&self, project_name: &str, version_label: &str) -> Result<CostAnalysis> {
        let project = self.project(project_name).await?;
        let snapshot = self.snapshot(&project, version_label).await?;
        let catalog = self.catalog().await?;

        let aggregator = BomCostAggregator::new(&self.config.bom, self.config.company.currency.clone());
        Ok(aggregator.analyze(&snapshot, &catalog))
    }

    pub async fn allocation(&self, project_name: &str, version_label: &str) -> Result<AllocationPlan> {
        let project = self.project(project_name).await?;
        let snapshot = self.snapshot(&project, version_label).await?;

        Ok(AllocationPlanner::new().plan(&snapshot))
    }

    pub async fn set_allocation(
        &self,
        project_name: &str,
        version_label: &str,
        designator: &str,
        allocated: bool,
    ) -> Result<()> {
        let project = self.project(project_name).await?;
        let mut snapshot = self.snapshot(&project, version_label).await?;

        snapshot.set_allocation(designator, allocated).map_err(SolderlineError::from)?;

        let updated = BomRepository::new(self.pool.clone())
            .set_allocation(snapshot.id, designator, allocated)
            .await?;
        if !updated {
            return Err(SolderlineError::not_found(format!("designator {}", designator)).into());
        }
        Ok(())
    }

    pub async fn alerts(&self, project_name: &str, version_label: &str, today: NaiveDate) -> Result<Vec<LifecycleAlert>> {
        let project = self.project(project_name).await?;
        let snapshot = self.snapshot(&project, version_label).await?;

        Ok(LifecycleMonitor::new(&self.config.lifecycle).check(&snapshot, today))
    }

    async fn catalog(&self) -> Result<InMemoryCatalog> {
        let repository = PartRepository::new(self.pool.clone());
        let parts = repository.find_all().await?;
        let alternatives = repository.find_all_alternatives().await?;
        Ok(InMemoryCatalog::new(parts, alternatives))
    }

    async fn project(&self, name: &str) -> Result<Project> {
        ProjectRepository::new(self.pool.clone())
            .find_by_name(name)
            .await?
            .ok_or_else(|| SolderlineError::not_found(format!("project {}", name)).into())
    }

    async fn snapshot(&self, project: &Project, version_label: &str) -> Result<BomSnapshot> {
        BomRepository::new(self.pool.clone())
            .find_by_label(project.id, version_label)
            .await?
            .ok_or_else(|| {
                SolderlineError::not_found(format!("snapshot {} of project {}", version_label, project.name)).into()
            })
    }
}

/// Parts and alternatives to store in the catalog
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub parts: Vec<PartCatalogEntry>,
    #[serde(default)]
    pub alternatives: Vec<PartAlternative>,
}

#[derive(Debug, Serialize)]
pub struct CatalogReport {
    pub parts: usize,
    pub alternatives: usize,
}

/// Reads a JSON catalog file and validates every entry before anything is stored
pub fn parse_catalog_file(data: &[u8]) -> Result<CatalogFile, SolderlineError> {
    let catalog: CatalogFile = serde_json::from_slice(data)?;

    let mut seen = HashSet::new();
    for part in &catalog.parts {
        validate_model(part)?;
        if !seen.insert(part.id) {
            return Err(SolderlineError::validation("parts", format!("part {} listed twice", part.id)));
        }
    }
    for alternative in &catalog.alternatives {
        validate_model(alternative)?;
        if alternative.part_id == alternative.alternative_id {
            return Err(SolderlineError::validation(
                "alternatives",
                format!("part {} cannot be its own alternative", alternative.part_id),
            ));
        }
    }

    Ok(catalog)
}

/// Resolves parsed line items against the catalog and builds the snapshot.
/// Fails without side effects on invalid items or repeated designators.
pub fn build_snapshot<C: PartCatalog + ?Sized>(
    project: &Project,
    request: &ImportRequest<'_>,
    parsed: &ParsedBom,
    catalog: &C,
) -> Result<(BomSnapshot, ResolutionReport), SolderlineError> {
    for item in &parsed.items {
        validate_model(item)?;
    }

    let (items, report) = ComponentMatcher::new().resolve_all(&parsed.items, catalog);

    let snapshot = BomSnapshot::new(project.id, request.version_label, items)?
        .with_source(request.filename, request.data);

    Ok((snapshot, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use solderline_models::ResolutionMethod;

    const CSV: &str = "Reference,Value,Footprint,MPN\n\
                       \"R1,R2\",10k,0603,\n\
                       C1,100nF,0603,GRM188R71C104KA01\n\
                       D1,red LED,0805,\n";

    fn request<'a>(label: &'a str, data: &'a [u8]) -> ImportRequest<'a> {
        ImportRequest {
            project_name: "Widget",
            customer_name: Some("Acme"),
            version_label: label,
            filename: "widget.csv",
            data,
        }
    }

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new(
            vec![
                PartCatalogEntry::new("RC0603FR-0710KL", "10k resistor", "0603", dec!(0.01)),
                PartCatalogEntry::new("GRM188R71C104KA01", "MLCC", "0603", dec!(0.02)),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_build_snapshot() {
        let project = Project::new("Widget", None);
        let parsed = BomFileParser::new().parse_bytes("widget.csv", CSV.as_bytes(), None).unwrap();

        let (snapshot, report) =
            build_snapshot(&project, &request("rev-a", CSV.as_bytes()), &parsed, &catalog()).unwrap();

        assert_eq!(snapshot.project_id, project.id);
        assert_eq!(snapshot.items.len(), 4);
        assert_eq!(snapshot.item("C1").unwrap().resolution, ResolutionMethod::ManufacturerPart);
        assert_eq!(snapshot.item("R2").unwrap().resolution, ResolutionMethod::ValueFootprint);
        assert_eq!(report.unresolved, vec!["D1"]);
        assert_eq!(snapshot.total_cost(), dec!(0.04));
        assert_eq!(snapshot.source_filename.as_deref(), Some("widget.csv"));
        assert!(snapshot.source_checksum.is_some());
    }

    #[test]
    fn test_build_snapshot_rejects_duplicates() {
        let csv = "Reference,Value\nR1-R3,10k\nR2,4.7k\n";
        let project = Project::new("Widget", None);
        let parsed = BomFileParser::new().parse_bytes("widget.csv", csv.as_bytes(), None).unwrap();

        let err = build_snapshot(&project, &request("rev-a", csv.as_bytes()), &parsed, &catalog()).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("R2"));
    }

    #[test]
    fn test_build_snapshot_rejects_long_designator() {
        let csv = format!("Reference,Value\n{},10k\n", "R".repeat(60));
        let project = Project::new("Widget", None);
        let parsed = BomFileParser::new().parse_bytes("widget.csv", csv.as_bytes(), None).unwrap();

        assert!(build_snapshot(&project, &request("rev-a", csv.as_bytes()), &parsed, &catalog()).is_err());
    }

    #[test]
    fn test_parse_catalog_file() {
        let json = r#"{
            "parts": [
                {
                    "id": "6f1c1d44-3f0a-4d0e-9a57-0f5e8a3c1a01",
                    "manufacturer_part_number": "RC0603FR-0710KL",
                    "name": "10k resistor",
                    "footprint": "0603",
                    "unit_price": "0.01",
                    "on_hand_quantity": 500,
                    "lifecycle_stage": "active",
                    "category": "Passives"
                },
                {
                    "id": "6f1c1d44-3f0a-4d0e-9a57-0f5e8a3c1a02",
                    "manufacturer_part_number": "ERJ-3EKF1002V",
                    "name": "10k resistor",
                    "footprint": "0603",
                    "unit_price": "0.008",
                    "lifecycle_stage": "nrnd"
                }
            ],
            "alternatives": [
                {
                    "part_id": "6f1c1d44-3f0a-4d0e-9a57-0f5e8a3c1a01",
                    "alternative_id": "6f1c1d44-3f0a-4d0e-9a57-0f5e8a3c1a02",
                    "compatibility_score": 0.95
                }
            ]
        }"#;

        let catalog = parse_catalog_file(json.as_bytes()).unwrap();
        assert_eq!(catalog.parts.len(), 2);
        assert_eq!(catalog.parts[0].unit_price, dec!(0.01));
        assert_eq!(catalog.parts[0].on_hand_quantity, 500);
        assert_eq!(catalog.parts[1].on_hand_quantity, 0);
        assert_eq!(catalog.alternatives.len(), 1);
        assert_eq!(catalog.alternatives[0].notes, None);
    }

    #[test]
    fn test_parse_catalog_file_rejects_bad_entries() {
        let self_alternative = r#"{
            "parts": [],
            "alternatives": [{
                "part_id": "6f1c1d44-3f0a-4d0e-9a57-0f5e8a3c1a01",
                "alternative_id": "6f1c1d44-3f0a-4d0e-9a57-0f5e8a3c1a01",
                "compatibility_score": 1.0
            }]
        }"#;
        assert!(parse_catalog_file(self_alternative.as_bytes()).is_err());

        let unnamed = r#"{ "parts": [{ "manufacturer_part_number": "X1", "unit_price": "1" }] }"#;
        assert_eq!(
            parse_catalog_file(unnamed.as_bytes()).unwrap_err().error_code(),
            "VALIDATION_ERROR"
        );

        let duplicated = r#"{ "parts": [
            { "id": "6f1c1d44-3f0a-4d0e-9a57-0f5e8a3c1a01", "manufacturer_part_number": "X1", "name": "x", "unit_price": "1" },
            { "id": "6f1c1d44-3f0a-4d0e-9a57-0f5e8a3c1a01", "manufacturer_part_number": "X2", "name": "y", "unit_price": "1" }
        ] }"#;
        assert!(parse_catalog_file(duplicated.as_bytes()).is_err());

        assert!(parse_catalog_file(b"not json").is_err());
    }
}
