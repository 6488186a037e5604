//! Company ESG metrics, their lookup store and ranking queries

mod analytics;
mod record;
mod store;

pub use analytics::{CompanySummary, ControversyEntry, SectorAverage};
pub use record::CompanyData;
pub use store::{CompanyStore, CompanyStoreError, InMemoryCompanyStore};
