//! Ranking and aggregate queries over stored company metrics

use super::record::CompanyData;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Row returned by the ranking and search queries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanySummary {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub total_esg_risk_score: Option<f64>,
}

impl From<&CompanyData> for CompanySummary {
    fn from(company: &CompanyData) -> Self {
        Self {
            symbol: company.symbol.clone(),
            name: company.name.clone(),
            sector: company.sector.clone(),
            total_esg_risk_score: company.metric("total_esg_risk_score"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorAverage {
    pub sector: String,
    pub avg_esg_score: f64,
    pub company_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControversyEntry {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub controversy_score: f64,
    pub controversy_level: Option<String>,
}

/// Missing scores sort after every present one
fn cmp_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Lowest total ESG risk first. Companies without a total are left out.
pub fn top_companies(companies: &[CompanyData], limit: usize) -> Vec<CompanySummary> {
    let mut rows: Vec<CompanySummary> = companies
        .iter()
        .map(CompanySummary::from)
        .filter(|row| row.total_esg_risk_score.is_some())
        .collect();
    rows.sort_by(|a, b| cmp_scores(a.total_esg_risk_score, b.total_esg_risk_score));
    rows.truncate(limit);
    rows
}

/// Mean total ESG risk per sector, lowest first. Only companies with both a
/// sector and a total count.
pub fn sector_averages(companies: &[CompanyData]) -> Vec<SectorAverage> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for company in companies {
        let sector = company.sector.as_deref().map(str::trim).filter(|s| !s.is_empty());
        if let (Some(sector), Some(total)) = (sector, company.metric("total_esg_risk_score")) {
            let entry = sums.entry(sector).or_insert((0.0, 0));
            entry.0 += total;
            entry.1 += 1;
        }
    }

    let mut averages: Vec<SectorAverage> = sums
        .into_iter()
        .map(|(sector, (sum, count))| SectorAverage {
            sector: sector.to_string(),
            avg_esg_score: sum / count as f64,
            company_count: count,
        })
        .collect();
    averages.sort_by(|a, b| a.avg_esg_score.total_cmp(&b.avg_esg_score));
    averages
}

/// Companies at or above `min_score`, highest controversy first
pub fn high_controversy(companies: &[CompanyData], min_score: f64) -> Vec<ControversyEntry> {
    let mut rows: Vec<ControversyEntry> = companies
        .iter()
        .filter_map(|company| {
            let score = company.metric("controversy_score")?;
            (score >= min_score).then(|| ControversyEntry {
                symbol: company.symbol.clone(),
                name: company.name.clone(),
                controversy_score: score,
                controversy_level: company.controversy_level.clone(),
            })
        })
        .collect();
    rows.sort_by(|a, b| b.controversy_score.total_cmp(&a.controversy_score));
    rows
}

/// Case-insensitive substring match on name or symbol, optionally narrowed
/// to one sector. Ordered by total ESG risk, missing totals last.
pub fn search(
    companies: &[CompanyData],
    query: &str,
    sector: Option<&str>,
    limit: usize,
) -> Vec<CompanySummary> {
    let needle = query.trim().to_lowercase();
    let sector = sector.map(|s| s.trim().to_lowercase());

    let matches_text = |value: &Option<String>| {
        value
            .as_deref()
            .is_some_and(|v| v.to_lowercase().contains(&needle))
    };

    let mut rows: Vec<CompanySummary> = companies
        .iter()
        .filter(|company| matches_text(&company.name) || matches_text(&company.symbol))
        .filter(|company| match &sector {
            Some(wanted) => company
                .sector
                .as_deref()
                .is_some_and(|s| s.trim().to_lowercase() == *wanted),
            None => true,
        })
        .map(CompanySummary::from)
        .collect();
    rows.sort_by(|a, b| cmp_scores(a.total_esg_risk_score, b.total_esg_risk_score));
    rows.truncate(limit);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(symbol: &str, name: &str, sector: &str, total: Option<f64>) -> CompanyData {
        CompanyData {
            sector: Some(sector.to_string()),
            total_esg_risk_score: total,
            ..CompanyData::new(symbol, name)
        }
    }

    fn sample() -> Vec<CompanyData> {
        vec![
            company("OIL", "Crude Oil Co", "Energy", Some(40.0)),
            company("SUN", "Sunny Power", "Energy", Some(20.0)),
            company("BNK", "Big Bank", "Financial", Some(25.0)),
            company("NEW", "New Listing", "Financial", None),
        ]
    }

    #[test]
    fn test_top_companies_skips_missing_totals() {
        let top = top_companies(&sample(), 10);
        let symbols: Vec<_> = top.iter().filter_map(|c| c.symbol.as_deref()).collect();
        assert_eq!(symbols, vec!["SUN", "BNK", "OIL"]);

        assert_eq!(top_companies(&sample(), 1).len(), 1);
    }

    #[test]
    fn test_sector_averages() {
        let averages = sector_averages(&sample());

        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].sector, "Financial");
        assert_eq!(averages[0].company_count, 1);
        assert_eq!(averages[1].sector, "Energy");
        assert!((averages[1].avg_esg_score - 30.0).abs() < 1e-9);
        assert_eq!(averages[1].company_count, 2);
    }

    #[test]
    fn test_high_controversy_threshold_is_inclusive() {
        let companies = vec![
            CompanyData {
                controversy_score: Some(3.0),
                controversy_level: Some("Significant".to_string()),
                ..CompanyData::new("A", "Alpha")
            },
            CompanyData {
                controversy_score: Some(4.0),
                ..CompanyData::new("B", "Beta")
            },
            CompanyData {
                controversy_score: Some(1.0),
                ..CompanyData::new("C", "Gamma")
            },
            CompanyData::new("D", "Delta"),
        ];

        let rows = high_controversy(&companies, 3.0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol.as_deref(), Some("B"));
        assert_eq!(rows[1].controversy_level.as_deref(), Some("Significant"));
    }

    #[test]
    fn test_search_matches_name_or_symbol() {
        let by_name = search(&sample(), "power", None, 20);
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].symbol.as_deref(), Some("SUN"));

        let by_symbol = search(&sample(), "bn", None, 20);
        assert_eq!(by_symbol[0].name.as_deref(), Some("Big Bank"));
    }

    #[test]
    fn test_search_sector_filter_and_order() {
        let rows = search(&sample(), "n", Some("financial"), 20);
        let symbols: Vec<_> = rows.iter().filter_map(|c| c.symbol.as_deref()).collect();
        assert_eq!(symbols, vec!["BNK", "NEW"]);

        assert!(search(&sample(), "oil", Some("Financial"), 20).is_empty());
        assert_eq!(search(&sample(), "o", None, 1).len(), 1);
    }
}
