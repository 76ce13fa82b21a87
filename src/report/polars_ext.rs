use polars::prelude::{DataFrame, JsonFormat, JsonWriter, SerWriter};
use serde_json::Value;

use crate::error::{DataError, FlowError, FlowResult, IoError};

pub(crate) fn polars_to_flow_error(report: &str, e: polars::error::PolarsError) -> FlowError {
    FlowError::Data(DataError::DataFrame(format!(
        "Error while building {report} from flow records: {e}"
    )))
}

pub trait DataFrameExt {
    fn to_json_rows(&self) -> FlowResult<Vec<serde_json::Map<String, Value>>>;
}

impl DataFrameExt for DataFrame {
    fn to_json_rows(&self) -> FlowResult<Vec<serde_json::Map<String, Value>>> {
        let height = self.height();
        if height == 0 {
            return Ok(Vec::new());
        }

        // 1. Pre-allocate buffer (Heuristic: approx 2^6 bytes per row)
        let estimated_row_size = self.width() * (1 << 6);
        let mut buf = Vec::with_capacity(height * estimated_row_size);

        // 2. Serialize to memory
        JsonWriter::new(&mut buf)
            .with_json_format(JsonFormat::Json)
            .finish(&mut self.clone())
            .map_err(|e| DataError::DataFrame(e.to_string()))?;

        // 3. Parse back to Value
        let json_val: Value = serde_json::from_slice(&buf).map_err(IoError::Json)?;

        match json_val {
            Value::Array(rows) => Ok(rows
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect()),
            _ => Err(DataError::DataFrame("Polars JSON output was not an array".to_string()).into()),
        }
    }
}
