//! Output schema and weight-column attachment.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use sf_lookup::SfWeights;
use sf_lookup::weights::{SF_COLUMN, SF_DOWN_COLUMN, SF_UP_COLUMN};

use crate::error::{EventIoError, Result};

/// Names of the appended weight columns, in output order.
pub const WEIGHT_COLUMNS: [&str; 3] = [SF_COLUMN, SF_UP_COLUMN, SF_DOWN_COLUMN];

fn weight_field(name: &str) -> FieldRef {
    Arc::new(Field::new(name, DataType::Float64, false))
}

/// Input schema plus the three weight columns.
///
/// A weight column already present in the input keeps its position but
/// becomes non-nullable `Float64`; missing ones are appended.
pub fn output_schema(input: &Schema) -> SchemaRef {
    let mut fields: Vec<FieldRef> = input
        .fields()
        .iter()
        .map(|f| {
            if WEIGHT_COLUMNS.contains(&f.name().as_str()) {
                weight_field(f.name())
            } else {
                f.clone()
            }
        })
        .collect();
    for name in WEIGHT_COLUMNS {
        if input.field_with_name(name).is_err() {
            fields.push(weight_field(name));
        }
    }
    Arc::new(Schema::new_with_metadata(fields, input.metadata().clone()))
}

/// Rebuild `batch` against `schema`, filling the weight columns from `weights`.
///
/// Every other column is carried over unchanged.
pub fn attach_weights(
    batch: &RecordBatch,
    schema: &SchemaRef,
    weights: &SfWeights,
) -> Result<RecordBatch> {
    if weights.len() != batch.num_rows() {
        return Err(EventIoError::SchemaMismatch(format!(
            "{} weights for a batch of {} rows",
            weights.len(),
            batch.num_rows()
        )));
    }

    let weight_columns = weights.columns();
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let name = field.name().as_str();
        let column = match weight_columns.iter().find(|(n, _)| *n == name) {
            Some((_, values)) => Arc::new(Float64Array::from(values.to_vec())) as ArrayRef,
            None => batch
                .column_by_name(name)
                .cloned()
                .ok_or_else(|| EventIoError::MissingColumn(name.to_string()))?,
        };
        columns.push(column);
    }
    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}
