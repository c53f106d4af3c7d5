//! BOM (Bill of Materials) Processing Module
//!
//! Parsing of CSV, Excel (XLSX) and XML BOM files into line items, matching
//! against the part catalog, snapshot comparison, cost analysis, allocation
//! readiness and lifecycle alerts.

pub mod allocation;
pub mod catalog;
pub mod cost;
pub mod diff;
pub mod lifecycle;
pub mod matcher;
pub mod parser;
pub mod record;
pub mod value;

pub use allocation::{AllocationPlan, AllocationPlanner, AllocationStatus, DesignatorAllocation, PartDemand};
pub use catalog::{AlternativeMatch, InMemoryCatalog, PartCatalog};
pub use cost::{BomCostAggregator, CategoryBreakdown, CostAnalysis, OptimizationSuggestion};
pub use diff::{BomDiffEngine, ChangeTag, ComparisonResult, CostSummary, DesignatorDelta, ModifiedDesignator};
pub use lifecycle::{LifecycleAlert, LifecycleMonitor};
pub use matcher::{ComponentMatcher, ResolutionEntry, ResolutionReport};
pub use parser::{BomFileParser, BomFormat, ParsedBom, RowDiagnostic};
pub use record::{expand_designators, BomRecordParser, BomRowError};
pub use value::parse_component_value;
