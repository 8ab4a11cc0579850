//! ISIN-anchored holdings scan and portfolio aggregation.
//!
//! Independent of templates: every ISIN in the text becomes a [`Holding`],
//! with the security name read from the text before it and up to three
//! numbers (quantity, price, market value) read from the text after it.

use std::collections::HashMap;

use tracing::debug;

use crate::models::config::HoldingsConfig;
use crate::models::portfolio::{
    Holding, PortfolioSummary, PriceDiscrepancy, SecurityPosition, SourceTotals, TopHolding,
};
use crate::rules::isin::extract_isins;
use crate::rules::numbers::parse_float;
use crate::rules::patterns::{NAME_BEFORE_ISIN, NUMBER_TOKEN};

/// Number of positions listed in [`PortfolioSummary::top_holdings`].
pub const TOP_HOLDINGS: usize = 10;

const UNKNOWN_SOURCE: &str = "unknown";

/// Scans statement text for holdings.
#[derive(Debug, Clone)]
pub struct HoldingScanner {
    context_window: usize,
}

impl HoldingScanner {
    /// Create a scanner with a 50-byte context window.
    pub fn new() -> Self {
        Self { context_window: 50 }
    }

    pub fn from_config(config: &HoldingsConfig) -> Self {
        Self::new().with_context_window(config.context_window)
    }

    /// Set the number of bytes read on each side of an ISIN.
    pub fn with_context_window(mut self, bytes: usize) -> Self {
        self.context_window = bytes;
        self
    }

    /// Every holding in text order. Repeated ISINs are kept as separate
    /// positions.
    pub fn scan(&self, text: &str) -> Vec<Holding> {
        let occurrences = extract_isins(text);

        let holdings: Vec<Holding> = occurrences
            .iter()
            .enumerate()
            .map(|(i, occ)| {
                let before_start = floor_char_boundary(text, occ.start.saturating_sub(self.context_window));
                let mut after_end = floor_char_boundary(text, occ.end.saturating_add(self.context_window));
                // Numbers past the next ISIN belong to that holding
                if let Some(next) = occurrences.get(i + 1) {
                    after_end = after_end.min(next.start);
                }

                let security_name = name_before(&text[before_start..occ.start]);
                let mut numbers = numbers_in(&text[occ.end..after_end]).into_iter();

                Holding {
                    isin: occ.isin.clone(),
                    isin_valid: occ.valid,
                    security_name,
                    quantity: numbers.next(),
                    price: numbers.next(),
                    market_value: numbers.next(),
                    source: None,
                    position: (occ.start, occ.end),
                }
            })
            .collect();

        debug!("Holdings scan found {} positions", holdings.len());
        holdings
    }

    /// Scan and tag every holding with its source.
    pub fn scan_with_source(&self, text: &str, source: &str) -> Vec<Holding> {
        let mut holdings = self.scan(text);
        for holding in &mut holdings {
            holding.source = Some(source.to_string());
        }
        holdings
    }
}

impl Default for HoldingScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Name-like text at the end of the last line before an ISIN.
fn name_before(context: &str) -> Option<String> {
    let line = context.rsplit('\n').next().unwrap_or(context);
    let line = line.trim_end_matches(|c: char| c.is_whitespace() || c == ':' || c == '|');

    // Drop an "ISIN" label between the name and the code
    let line = match line.len().checked_sub(4) {
        Some(cut) if line.is_char_boundary(cut) && line[cut..].eq_ignore_ascii_case("isin") => &line[..cut],
        _ => line,
    };

    let caps = NAME_BEFORE_ISIN.captures(line)?;
    let name = caps.get(1)?.as_str().trim().trim_end_matches([',', '-', '|']).trim();
    (name.chars().filter(|c| c.is_alphabetic()).count() >= 2).then(|| name.to_string())
}

fn numbers_in(context: &str) -> Vec<f64> {
    NUMBER_TOKEN
        .find_iter(context)
        .filter_map(|m| parse_float(m.as_str()))
        .take(3)
        .collect()
}

impl PortfolioSummary {
    /// Aggregate holdings by ISIN.
    ///
    /// `price_tolerance` is the relative spread (max - min) / min above which
    /// prices for one ISIN are reported as a discrepancy.
    pub fn from_holdings(holdings: &[Holding], price_tolerance: f64) -> Self {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&Holding>> = HashMap::new();
        for holding in holdings {
            let group = groups.entry(holding.isin.as_str()).or_default();
            if group.is_empty() {
                order.push(holding.isin.as_str());
            }
            group.push(holding);
        }

        let mut positions = Vec::with_capacity(order.len());
        let mut price_discrepancies = Vec::new();

        for isin in order {
            let group = &groups[isin];
            let position = aggregate(isin, group);

            if let Some(discrepancy) = discrepancy(&position, group, price_tolerance) {
                debug!(
                    "Price discrepancy for {}: {:.2}%",
                    isin, discrepancy.difference_percent
                );
                price_discrepancies.push(discrepancy);
            }
            positions.push(position);
        }

        let total_portfolio_value: f64 = positions.iter().map(|p| p.total_market_value).sum();

        let mut ranked: Vec<&SecurityPosition> = positions.iter().collect();
        ranked.sort_by(|a, b| b.total_market_value.total_cmp(&a.total_market_value));
        let top_holdings = ranked
            .into_iter()
            .take(TOP_HOLDINGS)
            .map(|p| TopHolding {
                isin: p.isin.clone(),
                security_name: p.security_name.clone(),
                market_value: p.total_market_value,
                percent_of_portfolio: if total_portfolio_value > 0.0 {
                    round2(p.total_market_value / total_portfolio_value * 100.0)
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            total_securities: positions.len(),
            positions,
            total_portfolio_value,
            top_holdings,
            price_discrepancies,
        }
    }
}

fn aggregate(isin: &str, group: &[&Holding]) -> SecurityPosition {
    let total_quantity: f64 = group.iter().filter_map(|h| h.quantity).sum();
    let total_market_value: f64 = group.iter().filter_map(|h| h.market_value).sum();

    let prices: Vec<f64> = group.iter().filter_map(|h| h.price).collect();
    let min_price = prices.iter().copied().reduce(f64::min);
    let max_price = prices.iter().copied().reduce(f64::max);

    let mut holdings_by_source = std::collections::BTreeMap::new();
    for holding in group {
        let source = holding.source.as_deref().unwrap_or(UNKNOWN_SOURCE).to_string();
        let totals: &mut SourceTotals = holdings_by_source.entry(source).or_default();
        totals.quantity += holding.quantity.unwrap_or(0.0);
        totals.market_value += holding.market_value.unwrap_or(0.0);
    }

    SecurityPosition {
        isin: isin.to_string(),
        security_name: most_common_name(group),
        total_quantity,
        total_market_value,
        weighted_average_price: (total_quantity > 0.0).then(|| total_market_value / total_quantity),
        min_price,
        max_price,
        holdings_by_source,
    }
}

/// Most frequent name; ties go to the name seen first.
fn most_common_name(group: &[&Holding]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for name in group.iter().filter_map(|h| h.security_name.as_deref()) {
        match counts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (name, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((name, count));
        }
    }
    best.map(|(name, _)| name.to_string())
}

fn discrepancy(
    position: &SecurityPosition,
    group: &[&Holding],
    tolerance: f64,
) -> Option<PriceDiscrepancy> {
    let (min, max) = (position.min_price?, position.max_price?);
    if min <= 0.0 {
        return None;
    }

    let spread = (max - min) / min;
    if spread <= tolerance {
        return None;
    }

    let mut sources: Vec<String> = Vec::new();
    for holding in group.iter().filter(|h| h.price.is_some()) {
        let source = holding.source.as_deref().unwrap_or(UNKNOWN_SOURCE);
        if !sources.iter().any(|s| s == source) {
            sources.push(source.to_string());
        }
    }

    Some(PriceDiscrepancy {
        isin: position.isin.clone(),
        security_name: position.security_name.clone(),
        min_price: min,
        max_price: max,
        difference_percent: round2(spread * 100.0),
        sources,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TEXT: &str = "Holdings\n\
        Apple Inc. US0378331005 100 185.64 18,564.00\n\
        Microsoft Corp. ISIN: US5949181045 50 410.10 20,505.00\n";

    fn holding(isin: &str, name: &str, qty: f64, price: f64, source: &str) -> Holding {
        Holding {
            isin: isin.to_string(),
            isin_valid: true,
            security_name: Some(name.to_string()),
            quantity: Some(qty),
            price: Some(price),
            market_value: Some(qty * price),
            source: Some(source.to_string()),
            position: (0, 12),
        }
    }

    #[test]
    fn test_scan_reads_name_and_numbers() {
        let holdings = HoldingScanner::new().scan(TEXT);
        assert_eq!(holdings.len(), 2);

        let apple = &holdings[0];
        assert_eq!(apple.isin, "US0378331005");
        assert!(apple.isin_valid);
        assert_eq!(apple.security_name.as_deref(), Some("Apple Inc."));
        assert_eq!(apple.quantity, Some(100.0));
        assert_eq!(apple.price, Some(185.64));
        assert_eq!(apple.market_value, Some(18564.0));

        let msft = &holdings[1];
        assert_eq!(msft.security_name.as_deref(), Some("Microsoft Corp."));
        assert_eq!(msft.quantity, Some(50.0));
        assert_eq!(msft.market_value, Some(20505.0));
    }

    #[test]
    fn test_scan_keeps_duplicates_and_flags_checksum() {
        let text = "Fund A US0378331006 1\nFund A US0378331006 2\n";
        let holdings = HoldingScanner::new().scan(text);

        assert_eq!(holdings.len(), 2);
        assert!(holdings.iter().all(|h| !h.isin_valid));
        assert_eq!(holdings[1].quantity, Some(2.0));
    }

    #[test]
    fn test_scan_window_limits_numbers() {
        let text = "Apple Inc. US0378331005          100";
        let holdings = HoldingScanner::new().with_context_window(5).scan(text);
        assert_eq!(holdings[0].quantity, None);
    }

    #[test]
    fn test_scan_unbounded_window() {
        let config = HoldingsConfig {
            context_window: usize::MAX,
            ..HoldingsConfig::default()
        };
        let holdings = HoldingScanner::from_config(&config).scan("Apple Inc. US0378331005 100 185.64 18,564.00");

        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].security_name.as_deref(), Some("Apple Inc."));
        assert_eq!(holdings[0].quantity, Some(100.0));
        assert_eq!(holdings[0].market_value, Some(18564.0));
    }

    #[test]
    fn test_scan_with_source() {
        let holdings = HoldingScanner::new().scan_with_source(TEXT, "bank_a.txt");
        assert!(holdings.iter().all(|h| h.source.as_deref() == Some("bank_a.txt")));
    }

    #[test]
    fn test_summary_aggregates_by_isin() {
        let holdings = vec![
            holding("US0378331005", "Apple Inc.", 100.0, 100.0, "a"),
            holding("DE0005140008", "Deutsche Bank", 10.0, 10.0, "a"),
            holding("US0378331005", "Apple Inc", 50.0, 102.0, "b"),
            holding("US0378331005", "Apple Inc.", 10.0, 101.0, "b"),
        ];

        let summary = PortfolioSummary::from_holdings(&holdings, 0.05);

        assert_eq!(summary.total_securities, 2);
        let apple = &summary.positions[0];
        assert_eq!(apple.isin, "US0378331005");
        assert_eq!(apple.security_name.as_deref(), Some("Apple Inc."));
        assert_eq!(apple.total_quantity, 160.0);
        assert_eq!(apple.total_market_value, 16110.0);
        assert_eq!(apple.min_price, Some(100.0));
        assert_eq!(apple.max_price, Some(102.0));
        assert_eq!(apple.holdings_by_source["b"].quantity, 60.0);
        assert!((apple.weighted_average_price.unwrap() - 100.6875).abs() < 1e-9);

        assert_eq!(summary.total_portfolio_value, 16210.0);
        assert_eq!(summary.top_holdings[0].isin, "US0378331005");
        assert_eq!(summary.top_holdings[0].percent_of_portfolio, 99.38);
        assert!(summary.price_discrepancies.is_empty());
    }

    #[test]
    fn test_price_discrepancy_flagged() {
        let holdings = vec![
            holding("US0378331005", "Apple Inc.", 10.0, 100.0, "a"),
            holding("US0378331005", "Apple Inc.", 10.0, 110.0, "b"),
        ];

        let summary = PortfolioSummary::from_holdings(&holdings, 0.05);
        assert_eq!(summary.price_discrepancies.len(), 1);

        let d = &summary.price_discrepancies[0];
        assert_eq!(d.difference_percent, 10.0);
        assert_eq!(d.sources, vec!["a".to_string(), "b".to_string()]);

        let relaxed = PortfolioSummary::from_holdings(&holdings, 0.15);
        assert!(relaxed.price_discrepancies.is_empty());
    }

    #[test]
    fn test_empty_summary() {
        let summary = PortfolioSummary::from_holdings(&[], 0.05);
        assert_eq!(summary.total_securities, 0);
        assert_eq!(summary.total_portfolio_value, 0.0);
        assert!(summary.top_holdings.is_empty());
    }
}
