use super::analytics::{self, CompanySummary, ControversyEntry, SectorAverage};
use super::record::CompanyData;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CompanyStoreError {
    #[error("failed to read companies file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse companies file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-by-symbol lookup of company ESG metrics
pub trait CompanyStore: Send + Sync {
    /// Case-insensitive symbol lookup
    fn get(&self, symbol: &str) -> Option<CompanyData>;

    /// Companies ordered by symbol, at most `limit`
    fn list(&self, limit: usize) -> Vec<CompanyData>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn all(&self) -> Vec<CompanyData> {
        self.list(usize::MAX)
    }

    fn top_companies(&self, limit: usize) -> Vec<CompanySummary> {
        analytics::top_companies(&self.all(), limit)
    }

    fn sector_averages(&self) -> Vec<SectorAverage> {
        analytics::sector_averages(&self.all())
    }

    fn high_controversy(&self, min_score: f64) -> Vec<ControversyEntry> {
        analytics::high_controversy(&self.all(), min_score)
    }

    fn search(&self, query: &str, sector: Option<&str>, limit: usize) -> Vec<CompanySummary> {
        analytics::search(&self.all(), query, sector, limit)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryCompanyStore {
    companies: BTreeMap<String, CompanyData>,
}

impl InMemoryCompanyStore {
    /// Records without a symbol cannot be looked up and are skipped. A later
    /// duplicate symbol replaces an earlier one.
    pub fn from_records(records: impl IntoIterator<Item = CompanyData>) -> Self {
        let mut companies = BTreeMap::new();
        for record in records {
            match record.symbol.as_deref().map(normalize_symbol) {
                Some(key) if !key.is_empty() => {
                    companies.insert(key, record);
                }
                _ => warn!(name = record.display_name(), "Skipping company without symbol"),
            }
        }
        Self { companies }
    }

    /// Loads a JSON array of company records
    pub fn load(path: &Path) -> Result<Self, CompanyStoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CompanyStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<CompanyData> =
            serde_json::from_str(&raw).map_err(|source| CompanyStoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let store = Self::from_records(records);
        info!(path = %path.display(), companies = store.len(), "Loaded company data");
        Ok(store)
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

impl CompanyStore for InMemoryCompanyStore {
    fn get(&self, symbol: &str) -> Option<CompanyData> {
        self.companies.get(&normalize_symbol(symbol)).cloned()
    }

    fn list(&self, limit: usize) -> Vec<CompanyData> {
        self.companies.values().take(limit).cloned().collect()
    }

    fn len(&self) -> usize {
        self.companies.len()
    }

    fn all(&self) -> Vec<CompanyData> {
        self.companies.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let store = InMemoryCompanyStore::from_records(vec![
            CompanyData::new("acme", "Acme Corp"),
            CompanyData::new("BETA", "Beta Inc"),
        ]);

        assert_eq!(store.get("ACME").unwrap().display_name(), "Acme Corp");
        assert_eq!(store.get(" beta ").unwrap().display_name(), "Beta Inc");
        assert!(store.get("GAMMA").is_none());
    }

    #[test]
    fn test_records_without_symbol_are_skipped() {
        let store = InMemoryCompanyStore::from_records(vec![
            CompanyData::new("ACME", "Acme Corp"),
            CompanyData {
                name: Some("Nameless".to_string()),
                ..Default::default()
            },
        ]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_list_respects_limit_and_order() {
        let store = InMemoryCompanyStore::from_records(vec![
            CompanyData::new("ZED", "Zed"),
            CompanyData::new("ACME", "Acme"),
            CompanyData::new("MID", "Mid"),
        ]);

        let listed: Vec<_> = store
            .list(2)
            .into_iter()
            .filter_map(|c| c.symbol)
            .collect();
        assert_eq!(listed, vec!["ACME", "MID"]);
    }

    #[test]
    fn test_rankings_cover_every_record() {
        let store = InMemoryCompanyStore::from_records(vec![
            CompanyData {
                total_esg_risk_score: Some(30.0),
                sector: Some("Energy".to_string()),
                ..CompanyData::new("ZED", "Zed")
            },
            CompanyData {
                total_esg_risk_score: Some(10.0),
                sector: Some("Energy".to_string()),
                ..CompanyData::new("ACME", "Acme")
            },
        ]);

        assert_eq!(store.all().len(), 2);
        assert_eq!(store.top_companies(1)[0].symbol.as_deref(), Some("ACME"));
        assert_eq!(store.sector_averages()[0].company_count, 2);
        assert_eq!(store.search("ze", Some("energy"), 5).len(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"symbol": "ACME", "name": "Acme Corp", "environment_risk_score": 11.0}}]"#
        )
        .unwrap();

        let store = InMemoryCompanyStore::load(file.path()).unwrap();
        assert_eq!(store.get("acme").unwrap().environment_risk_score, Some(11.0));
    }

    #[test]
    fn test_load_errors() {
        let missing = InMemoryCompanyStore::load(Path::new("/nonexistent/companies.json"));
        assert!(matches!(missing, Err(CompanyStoreError::Io { .. })));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            InMemoryCompanyStore::load(file.path()),
            Err(CompanyStoreError::Parse { .. })
        ));
    }
}
