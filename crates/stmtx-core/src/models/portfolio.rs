//! Holding and portfolio summary data models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One security position found in a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// ISIN as written in the statement.
    pub isin: String,

    /// Whether the ISIN check digit is correct.
    pub isin_valid: bool,

    /// Security name read from the text before the ISIN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_name: Option<String>,

    /// Number of shares/units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,

    /// Price per share/unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    /// Total market value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_value: Option<f64>,

    /// Institution or file the holding came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Byte span of the ISIN in the source text.
    pub position: (usize, usize),
}

/// Quantity and value held at one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTotals {
    pub quantity: f64,
    pub market_value: f64,
}

/// All holdings of one ISIN, aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityPosition {
    pub isin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_name: Option<String>,
    pub total_quantity: f64,
    pub total_market_value: f64,
    /// Market value divided by quantity, when quantity is positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_average_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    pub holdings_by_source: BTreeMap<String, SourceTotals>,
}

/// Prices for the same ISIN that disagree beyond the tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDiscrepancy {
    pub isin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_name: Option<String>,
    pub min_price: f64,
    pub max_price: f64,
    /// Spread relative to the minimum price, in percent (two decimals).
    pub difference_percent: f64,
    pub sources: Vec<String>,
}

/// A position ranked by market value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopHolding {
    pub isin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_name: Option<String>,
    pub market_value: f64,
    pub percent_of_portfolio: f64,
}

/// Portfolio aggregated by ISIN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Positions in first-seen order.
    pub positions: Vec<SecurityPosition>,
    pub total_securities: usize,
    pub total_portfolio_value: f64,
    /// Up to ten positions, largest market value first.
    pub top_holdings: Vec<TopHolding>,
    pub price_discrepancies: Vec<PriceDiscrepancy>,
}
