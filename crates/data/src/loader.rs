use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use valvey_core::domain::{CommodityMonth, PriceListRow};
use valvey_core::Tables;

use crate::records::{CommodityRecord, OrderRecord, PriceRecord, QuoteRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    PriceTable,
    Quotes,
    Orders,
    Commodities,
}

impl Dataset {
    pub const ALL: [Dataset; 4] =
        [Dataset::PriceTable, Dataset::Quotes, Dataset::Orders, Dataset::Commodities];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::PriceTable => "price_table.json",
            Self::Quotes => "quote_sample.json",
            Self::Orders => "order_history.json",
            Self::Commodities => "commodity_prices.json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceTable => "price_table",
            Self::Quotes => "quotes",
            Self::Orders => "orders",
            Self::Commodities => "commodities",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file `{path}` was not found")]
    Missing { path: PathBuf },
    #[error("could not read data file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse data file `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("data file `{path}` must contain a JSON array")]
    NotArray { path: PathBuf },
    #[error("could not write data file `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

/// A table that loaded empty or partially.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoadIssue {
    pub dataset: Dataset,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct LoadReport {
    pub tables: Tables,
    pub issues: Vec<LoadIssue>,
    pub skipped_rows: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Reads all four tables from `dir`. Never fails: an unreadable table is left
/// empty and recorded as an issue, a row that does not decode is skipped, and a
/// row with an unreadable optional field keeps going with that field empty.
pub fn load_tables(dir: &Path) -> LoadReport {
    let mut report = LoadReport::default();

    let price_list =
        load_rows(dir, Dataset::PriceTable, &mut report, |record: PriceRecord, _, _| {
            PriceListRow::try_from(record)
        });
    let quotes =
        load_rows(dir, Dataset::Quotes, &mut report, |record: QuoteRecord, position, _| {
            record.into_row(position)
        });
    let orders = load_rows(dir, Dataset::Orders, &mut report, |record: OrderRecord, _, notes| {
        Ok(record.into_row(notes))
    });
    let commodities =
        load_rows(dir, Dataset::Commodities, &mut report, |record: CommodityRecord, _, _| {
            CommodityMonth::try_from(record)
        });
    report.tables = Tables { price_list, quotes, orders, commodities };

    info!(
        event_name = "system.data.loaded",
        data_dir = %dir.display(),
        price_rows = report.tables.price_list.len(),
        quote_rows = report.tables.quotes.len(),
        order_rows = report.tables.orders.len(),
        commodity_rows = report.tables.commodities.len(),
        skipped_rows = report.skipped_rows,
        issues = report.issues.len(),
        "data tables loaded"
    );

    report
}

fn load_rows<R, T, F>(dir: &Path, dataset: Dataset, report: &mut LoadReport, convert: F) -> Vec<T>
where
    R: DeserializeOwned,
    F: Fn(R, usize, &mut Vec<String>) -> Result<T, String>,
{
    let values = match read_array(&dir.join(dataset.file_name())) {
        Ok(values) => values,
        Err(error) => {
            warn!(
                event_name = "system.data.table_unavailable",
                dataset = dataset.as_str(),
                error = %error,
                "table left empty"
            );
            report.issues.push(LoadIssue { dataset, message: error.to_string() });
            return Vec::new();
        }
    };

    let mut rows = Vec::with_capacity(values.len());
    let mut skipped = 0;
    let mut degraded = 0;
    for (position, value) in values.into_iter().enumerate() {
        let mut notes = Vec::new();
        let decoded = serde_json::from_value::<R>(value)
            .map_err(|error| error.to_string())
            .and_then(|record| convert(record, position, &mut notes));
        match decoded {
            Ok(row) => {
                if !notes.is_empty() {
                    degraded += 1;
                    for note in &notes {
                        warn!(
                            event_name = "system.data.field_dropped",
                            dataset = dataset.as_str(),
                            row = position,
                            reason = %note,
                            "unreadable field left empty"
                        );
                    }
                }
                rows.push(row);
            }
            Err(reason) => {
                skipped += 1;
                warn!(
                    event_name = "system.data.row_skipped",
                    dataset = dataset.as_str(),
                    row = position,
                    reason = %reason,
                    "malformed row skipped"
                );
            }
        }
    }

    if skipped > 0 {
        report.skipped_rows += skipped;
        report.issues.push(LoadIssue {
            dataset,
            message: format!("{skipped} malformed row(s) skipped"),
        });
    }
    if degraded > 0 {
        report.issues.push(LoadIssue {
            dataset,
            message: format!("{degraded} row(s) loaded with unreadable fields left empty"),
        });
    }
    rows
}

pub(crate) fn read_array(path: &Path) -> Result<Vec<Value>, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing { path: path.to_path_buf() });
    }
    let raw = fs::read_to_string(path)
        .map_err(|source| LoadError::Read { path: path.to_path_buf(), source })?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|source| LoadError::Parse { path: path.to_path_buf(), source })?;
    match value {
        Value::Array(values) => Ok(values),
        _ => Err(LoadError::NotArray { path: path.to_path_buf() }),
    }
}
