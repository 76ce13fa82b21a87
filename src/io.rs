use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use itertools::izip;
use polars::{
    df,
    prelude::{Column, DataFrame, DataType, LazyCsvReader, LazyFileListReader, PlPath},
};
use tracing::{debug, info};

use crate::{
    domain::{FlowCol, FlowRecord},
    error::{DataError, FlowError, FlowResult, IoError, SchemaError},
};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

// ================================================================================================
// CSV Loading
// ================================================================================================

/// Loads flow records from a headered CSV file.
///
/// Every column is read as text and converted by [`records_from_df`], so a malformed cell is
/// reported with its row and column instead of silently becoming a null.
///
/// # Errors
/// - `IoError::ReadFailed` if the file cannot be read or is not valid CSV.
/// - Schema violation for missing columns or unparseable cells.
pub fn load_csv(path: impl AsRef<Path>) -> FlowResult<Vec<FlowRecord>> {
    let path = path.as_ref();
    let uri = path.to_str().ok_or_else(|| {
        IoError::FileSystem(format!(
            "Path contains invalid UTF-8 characters: {}",
            path.display()
        ))
    })?;

    let df = LazyCsvReader::new(PlPath::new(uri))
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .map_err(|e| IoError::ReadFailed(format!("Failed to scan '{}': {e}", path.display())))?
        .collect()
        .map_err(|e| IoError::ReadFailed(format!("Failed to read '{}': {e}", path.display())))?;

    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "CSV parsed");

    let records = records_from_df(&df)?;
    info!(path = %path.display(), records = records.len(), "Loaded flow records");
    Ok(records)
}

// ================================================================================================
// DataFrame Conversion
// ================================================================================================

/// Converts a frame with `date`, `etf_ticker`, `net_flow` and an optional `region` column.
///
/// - `date`: text (`YYYY-MM-DD`, optionally with a time part), `Date` or `Datetime`.
/// - `etf_ticker`: required and non-blank in every row; surrounding whitespace is trimmed.
/// - `net_flow`: numeric or text. Empty cells become `None`; anything else must be a finite
///   number.
/// - `region`: optional; blank cells become `None`.
///
/// Row numbers in errors are 0-based data rows (the header is not counted).
pub fn records_from_df(df: &DataFrame) -> FlowResult<Vec<FlowRecord>> {
    let dates = text_cells(required_column(df, FlowCol::Date)?, FlowCol::Date)?;
    let tickers = text_cells(required_column(df, FlowCol::EtfTicker)?, FlowCol::EtfTicker)?;
    let flows = flow_cells(required_column(df, FlowCol::NetFlow)?)?;
    let regions = match df.column(FlowCol::Region.as_str()) {
        Ok(column) => text_cells(column, FlowCol::Region)?,
        Err(_) => vec![None; df.height()],
    };

    let mut records = Vec::with_capacity(df.height());
    for (row, (date, ticker, net_flow, region)) in
        izip!(dates, tickers, flows, regions).enumerate()
    {
        let date = match date {
            Some(raw) => parse_date(row, &raw)?,
            None => {
                return Err(SchemaError::MissingValue { row, field: "date" }.into());
            }
        };

        let etf_ticker = match ticker.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                return Err(SchemaError::MissingValue {
                    row,
                    field: "etf_ticker",
                }
                .into());
            }
        };

        let region = region
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        records.push(FlowRecord {
            date,
            etf_ticker,
            net_flow,
            region,
        });
    }

    Ok(records)
}

/// Builds a frame with one row per record, in the column layout [`records_from_df`] reads.
pub fn records_to_df(records: &[FlowRecord]) -> FlowResult<DataFrame> {
    let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    let tickers: Vec<&str> = records.iter().map(|r| r.etf_ticker.as_str()).collect();
    let flows: Vec<Option<f64>> = records.iter().map(|r| r.net_flow).collect();
    let regions: Vec<Option<&str>> = records.iter().map(FlowRecord::region).collect();

    df!(
        FlowCol::Date.as_str() => dates,
        FlowCol::EtfTicker.as_str() => tickers,
        FlowCol::NetFlow.as_str() => flows,
        FlowCol::Region.as_str() => regions,
    )
    .map_err(|e| DataError::DataFrame(e.to_string()).into())
}

// ================================================================================================
// Helper Functions
// ================================================================================================

fn required_column(df: &DataFrame, col: FlowCol) -> FlowResult<&Column> {
    df.column(col.as_str())
        .map_err(|_| SchemaError::MissingColumn(col.to_string()).into())
}

fn unsupported(col: FlowCol, dtype: &DataType) -> FlowError {
    SchemaError::UnsupportedColumnType {
        column: col.to_string(),
        dtype: dtype.to_string(),
    }
    .into()
}

fn frame_err(e: polars::error::PolarsError) -> FlowError {
    DataError::DataFrame(e.to_string()).into()
}

/// Reads a column as optional strings, casting temporal and categorical-like types to text.
fn text_cells(column: &Column, col: FlowCol) -> FlowResult<Vec<Option<String>>> {
    let dtype = column.dtype();
    let text = match dtype {
        DataType::String => column.clone(),
        DataType::Date | DataType::Datetime(_, _) if col == FlowCol::Date => {
            column.cast(&DataType::String).map_err(frame_err)?
        }
        DataType::Null => column.cast(&DataType::String).map_err(frame_err)?,
        _ if col != FlowCol::Date && !dtype.is_temporal() && !dtype.is_nested() => {
            column.cast(&DataType::String).map_err(frame_err)?
        }
        other => return Err(unsupported(col, other)),
    };

    Ok(text
        .str()
        .map_err(frame_err)?
        .into_iter()
        .map(|cell| cell.map(str::to_string))
        .collect())
}

fn flow_cells(column: &Column) -> FlowResult<Vec<Option<f64>>> {
    let dtype = column.dtype();
    match dtype {
        DataType::String => column
            .str()
            .map_err(frame_err)?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| parse_flow(row, cell))
            .collect(),
        DataType::Null => Ok(vec![None; column.len()]),
        other if other.is_bool() || other.is_temporal() || other.is_nested() => {
            Err(unsupported(FlowCol::NetFlow, other))
        }
        other => {
            let cast = column
                .cast(&DataType::Float64)
                .map_err(|_| unsupported(FlowCol::NetFlow, other))?;
            // A lossy cast turns values into nulls; refuse rather than drop them
            if cast.null_count() != column.null_count() {
                return Err(unsupported(FlowCol::NetFlow, other));
            }
            let values: Vec<Option<f64>> = cast.f64().map_err(frame_err)?.into_iter().collect();
            for (row, value) in values.iter().enumerate() {
                if let Some(v) = value {
                    check_finite(row, *v, &v.to_string())?;
                }
            }
            Ok(values)
        }
    }
}

fn parse_flow(row: usize, cell: Option<&str>) -> FlowResult<Option<f64>> {
    let Some(raw) = cell.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let value = raw.parse::<f64>().map_err(|e| SchemaError::InvalidValue {
        row,
        field: "net_flow",
        value: raw.to_string(),
        msg: e.to_string(),
    })?;
    check_finite(row, value, raw)?;
    Ok(Some(value))
}

fn check_finite(row: usize, value: f64, raw: &str) -> FlowResult<()> {
    if value.is_finite() {
        return Ok(());
    }
    Err(SchemaError::InvalidValue {
        row,
        field: "net_flow",
        value: raw.to_string(),
        msg: "net flow must be a finite number".to_string(),
    }
    .into())
}

fn parse_date(row: usize, raw: &str) -> FlowResult<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .ok_or_else(|| {
            SchemaError::InvalidValue {
                row,
                field: "date",
                value: raw.to_string(),
                msg: "expected YYYY-MM-DD".to_string(),
            }
            .into()
        })
}
