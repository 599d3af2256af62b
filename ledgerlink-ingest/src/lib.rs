//! ledgerlink-ingest: upstream format adapters. Maps CSV rows onto raw
//! [`PseudoTransaction`](ledgerlink_core::model::PseudoTransaction) records
//! via a column-role mapping, including tag splitting and date parsing.

pub mod csv_rows;
pub mod mapping;

pub use csv_rows::parse_csv;
pub use mapping::{ColumnMapping, ColumnRole};
