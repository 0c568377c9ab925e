//! # Index Export
//!
//! JSON renderings of the built tables, keyed by identity label:
//!
//! ```json
//! { "1000003": [ { "features": ["Storage"], "info": { "Totals": 4, "Fails": 1, "Success": 3 } } ] }
//! ```
//!
//! Export is write-only. Tables are always rebuilt from scan results, never
//! read back from these files.

use std::path::Path;

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use recco_core::RecoError;

use crate::aggregate::IndexTables;

/// Category index as `identity → [{features, info}]`.
///
/// Two category sets sharing a label have their lists concatenated.
pub fn category_index_json(tables: &IndexTables) -> Value {
    let mut out = Map::new();
    for combo in tables.category_combos() {
        let rendered: Vec<Value> = tables
            .indexed_combos(&combo.categories)
            .iter()
            .map(|summary| json!({ "features": summary.features, "info": summary.info }))
            .collect();
        let key = combo.identity.to_string();
        if let Some(Value::Array(existing)) = out.get_mut(&key) {
            warn!(identity = %combo.identity, categories = %combo.categories, "identity label shared; merging index lists");
            existing.extend(rendered);
            continue;
        }
        out.insert(key, Value::Array(rendered));
    }
    Value::Object(out)
}

/// Feature Combination table as `identity → {features, counts, info}`, where
/// `counts` is the occurrence count and `info` the summed counters.
///
/// On a shared label the first entry wins.
pub fn feature_table_json(tables: &IndexTables) -> Value {
    let mut out = Map::new();
    for combo in tables.feature_combos() {
        let key = combo.identity.to_string();
        if out.contains_key(&key) {
            warn!(identity = %combo.identity, features = %combo.features, "identity label shared; entry not exported");
            continue;
        }
        out.insert(
            key,
            json!({
                "features": combo.features,
                "counts": combo.occurrences,
                "info": combo.counts,
            }),
        );
    }
    Value::Object(out)
}

/// Write the category index, pretty-printed.
pub fn write_category_index(path: &Path, tables: &IndexTables) -> Result<(), RecoError> {
    write_json(path, &category_index_json(tables))?;
    info!(path = %path.display(), entries = tables.category_combo_count(), "wrote category index");
    Ok(())
}

/// Write the Feature Combination table, pretty-printed.
pub fn write_feature_table(path: &Path, tables: &IndexTables) -> Result<(), RecoError> {
    write_json(path, &feature_table_json(tables))?;
    info!(path = %path.display(), entries = tables.feature_combo_count(), "wrote feature table");
    Ok(())
}

fn write_json(path: &Path, value: &Value) -> Result<(), RecoError> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| RecoError::Serialization(e.to_string()))?;
    std::fs::write(path, text)?;
    Ok(())
}
