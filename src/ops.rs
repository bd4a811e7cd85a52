//! JSON-level operation wrappers over the pipeline.
//!
//! Each `op_*` function takes rows as `serde_json::Value` (the shape records
//! arrive in) and returns a `Value`. Input rows pass through untouched apart
//! from the columns an operation appends, which are prefixed with `_` unless
//! they are a documented output field such as `predicted_topic`.

use rayon::prelude::*;
use serde_json::{json, Value};

use crate::algo::markup;
use crate::config::{PipelineConfig, TextSource};
use crate::dataset;
use crate::error::{PipelineError, Result};
use crate::features::{self, FEATURE_NAMES};
use crate::inference;
use crate::record::{records_from_values, Record};
use crate::topics::{self, TopicArtifacts};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Extract a text field from a JSON object, returning "" if missing.
pub fn get_text(row: &Value, field: &str) -> String {
    row.get(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn with_column(mut row: Value, name: &str, value: Value) -> Value {
    if let Some(obj) = row.as_object_mut() {
        obj.insert(name.into(), value);
    }
    row
}

// ── Operations ───────────────────────────────────────────────────────────────

/// Append `_plain_<field>` with the markup-stripped text of each listed field.
pub fn op_normalize_text(rows: &[Value], fields: &[&str]) -> Value {
    let output: Vec<Value> = rows
        .par_iter()
        .map(|row| {
            fields.iter().fold(row.clone(), |acc, field| {
                let plain = markup::strip_markup(&get_text(row, field));
                with_column(acc, &format!("_plain_{field}"), Value::String(plain))
            })
        })
        .collect();
    Value::Array(output)
}

/// Engineered features per row, keyed by column name.
pub fn op_features(rows: &[Value], text_source: TextSource) -> Result<Value> {
    let records = records_from_values(rows)?;
    let output: Vec<Value> = records
        .par_iter()
        .map(|r| serde_json::to_value(features::derive(r, text_source)))
        .collect::<std::result::Result<_, _>>()?;
    Ok(Value::Array(output))
}

/// Fit the topic model on the rows' descriptions.
///
/// Returns the serialized artifacts, a keyword summary per topic, and each
/// row's dominant topic.
pub fn op_fit_topics(rows: &[Value], config: &PipelineConfig, top_n: usize) -> Result<Value> {
    let descriptions: Vec<String> = rows.iter().map(|r| get_text(r, "description")).collect();
    let fit = topics::fit(&descriptions, &config.topics)?;

    let summary: Vec<Value> = fit
        .artifacts
        .describe(top_n)
        .into_iter()
        .map(|(label, terms)| {
            let size = fit.assignments.iter().filter(|&&a| a == label).count();
            json!({
                "id": label.index(),
                "label": label.to_string(),
                "size": size,
                "terms": terms
                    .iter()
                    .map(|(term, weight)| json!({"term": term, "weight": weight}))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    let assignments: Vec<Value> = fit
        .assignments
        .iter()
        .enumerate()
        .map(|(i, t)| json!({"item": i, "topic": t.index()}))
        .collect();

    Ok(json!({
        "num_topics": fit.artifacts.n_topics(),
        "num_items": rows.len(),
        "topics": summary,
        "assignments": assignments,
        "artifacts": serde_json::to_value(&fit.artifacts)?,
    }))
}

/// Fit topics, assemble, split and scale; return the partitions.
pub fn op_build_dataset(rows: &[Value], config: &PipelineConfig) -> Result<Value> {
    let records = records_from_values(rows)?;
    let data = dataset::prepare_training_data(&records, config)?;
    let split = &data.split;
    Ok(json!({
        "columns": data.dataset.columns,
        "x_train": split.x_train,
        "y_train": split.y_train,
        "x_test": split.x_test,
        "y_test": split.y_test,
        "train_rows": split.train_rows,
        "test_rows": split.test_rows,
        "scaler": serde_json::to_value(&data.scaler)?,
        "artifacts": serde_json::to_value(&data.artifacts)?,
    }))
}

/// Attach `predicted_topic` (0-based index) to one row, using previously
/// serialized artifacts. The field is left off when the description has no
/// text.
pub fn op_predict_topic(row: &Value, artifacts: &Value) -> Result<Value> {
    if row.get("description").is_none() {
        return Err(PipelineError::MissingField("description"));
    }
    let artifacts = TopicArtifacts::deserialize_checked(artifacts)?;
    let prediction = inference::predict_topic(&artifacts, &get_text(row, "description"))?;
    Ok(match prediction {
        Some(topic) => with_column(row.clone(), "predicted_topic", json!(topic.index())),
        None => row.clone(),
    })
}

/// Score one row fully: feature vector in training column order plus topic.
pub fn op_score(row: &Value, artifacts: &Value, text_source: TextSource) -> Result<Value> {
    let record = Record::from_value(row, 0)?;
    let artifacts = TopicArtifacts::deserialize_checked(artifacts)?;
    let scored = inference::score_record(&artifacts, &record, text_source)?;
    let n_topics = artifacts.n_topics();
    let matrix_row = scored.matrix_row(n_topics)?;
    Ok(json!({
        "columns": dataset::feature_columns(n_topics),
        "row": matrix_row,
        "predicted_topic": scored.predicted_topic,
        "num_features": FEATURE_NAMES.len() + n_topics,
    }))
}
