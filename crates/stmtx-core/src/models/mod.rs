//! Data models: template configuration, extraction results, holdings, and
//! application configuration.

pub mod config;
pub mod extraction;
pub mod portfolio;
pub mod template;

pub use extraction::{DocumentStatus, ExtractionResult, FieldOutcome, FieldValue, ValueSource};
pub use portfolio::{Holding, PortfolioSummary, PriceDiscrepancy, SecurityPosition, TopHolding};
pub use template::{FieldSpec, FieldType, LayoutMarkersSpec, MarkerSpec, RuleSpec, TemplateSpec};
