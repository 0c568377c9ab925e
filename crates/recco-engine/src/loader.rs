//! # Dataset Loader
//!
//! Reads scan results (one row per control evaluated against a resource
//! group) and groups them by resource group.
//!
//! ## Input
//!
//! CSV with a header row. Required columns: `ResourceGroupId`, `Feature`,
//! `VerificationResult`. `ControlStringId` and `CategoryName` are read when
//! present; categories are always recomputed from the catalog, never taken
//! from the file.
//!
//! ## Row Policy
//!
//! - Rows whose feature is on the ignore list are dropped entirely: they add
//!   neither a set member nor a count.
//! - A row with an empty id, feature, or verdict (or the wrong number of
//!   fields) is malformed. It is skipped and logged unless the config is
//!   strict, in which case the load aborts.
//! - A resource group whose rows were all ignored produces no group.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use recco_core::{Counts, EngineConfig, ItemSet, LoadError};

const RESOURCE_GROUP_ID: &str = "ResourceGroupId";
const FEATURE: &str = "Feature";
const VERIFICATION_RESULT: &str = "VerificationResult";
const CONTROL_STRING_ID: &str = "ControlStringId";
const CATEGORY_NAME: &str = "CategoryName";

/// One scan-result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Resource group the control was evaluated against.
    #[serde(rename = "ResourceGroupId")]
    pub resource_group_id: String,
    /// Feature the control belongs to.
    #[serde(rename = "Feature")]
    pub feature: String,
    /// Verdict string; the configured passed verdict means pass.
    #[serde(rename = "VerificationResult")]
    pub verification_result: String,
    /// Control identifier.
    #[serde(rename = "ControlStringId", default)]
    pub control_id: Option<String>,
    /// Category column as exported by the scanner. Informational only.
    #[serde(rename = "CategoryName", default)]
    pub category_name: Option<String>,
}

impl ScanRecord {
    /// Convenience constructor for the required fields.
    pub fn new(resource_group_id: &str, feature: &str, verification_result: &str) -> Self {
        Self {
            resource_group_id: resource_group_id.to_string(),
            feature: feature.to_string(),
            verification_result: verification_result.to_string(),
            control_id: None,
            category_name: None,
        }
    }
}

/// Features and counters of one resource group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    /// Distinct non-ignored features seen in the group.
    pub features: ItemSet,
    /// Counters over the non-ignored rows.
    pub counts: Counts,
}

/// A row that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    /// 1-based line in the source.
    pub line: u64,
    /// What was wrong.
    pub reason: String,
}

/// Result of loading a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Resource group id → group, in id order.
    pub groups: BTreeMap<String, ResourceGroup>,
    /// Data rows read, including ignored and malformed ones.
    pub rows_read: u64,
    /// Rows dropped because their feature is on the ignore list.
    pub rows_ignored: u64,
    /// Rows skipped as malformed.
    pub malformed: Vec<RowIssue>,
}

/// Group already-parsed records by resource group.
pub fn group_records(
    records: impl IntoIterator<Item = ScanRecord>,
    config: &EngineConfig,
) -> LoadReport {
    let mut report = LoadReport::default();
    for record in records {
        report.rows_read += 1;
        add_row(
            &mut report,
            config,
            &record.resource_group_id,
            &record.feature,
            &record.verification_result,
        );
    }
    report
}

/// Load and group a CSV file.
pub fn load_path(path: &Path, config: &EngineConfig) -> Result<LoadReport, LoadError> {
    let file = std::fs::File::open(path)?;
    let report = load_reader(file, config)?;
    info!(
        path = %path.display(),
        rows = report.rows_read,
        ignored = report.rows_ignored,
        malformed = report.malformed.len(),
        groups = report.groups.len(),
        "loaded scan results"
    );
    Ok(report)
}

/// Load and group CSV from any reader.
pub fn load_reader<R: Read>(reader: R, config: &EngineConfig) -> Result<LoadReport, LoadError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv
        .headers()
        .map_err(|e| LoadError::Csv(e.to_string()))?
        .clone();
    let columns = Columns::locate(&headers)?;

    let mut report = LoadReport::default();
    for result in csv.records() {
        report.rows_read += 1;
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(LoadError::Csv(e.to_string())),
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                skip_malformed(&mut report, config, line, e.to_string())?;
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        match columns.extract(&record) {
            Ok((group, feature, verdict)) => add_row(&mut report, config, group, feature, verdict),
            Err(reason) => skip_malformed(&mut report, config, line, reason)?,
        }
    }
    Ok(report)
}

fn add_row(report: &mut LoadReport, config: &EngineConfig, group: &str, feature: &str, verdict: &str) {
    if config.is_ignored(feature) {
        report.rows_ignored += 1;
        return;
    }
    let entry = report.groups.entry(group.to_string()).or_default();
    entry.features.insert(feature);
    entry.counts.record(config.is_pass(verdict));
}

fn skip_malformed(
    report: &mut LoadReport,
    config: &EngineConfig,
    line: u64,
    reason: String,
) -> Result<(), LoadError> {
    if config.strict {
        return Err(LoadError::MalformedRow { line, reason });
    }
    warn!(line, %reason, "skipping malformed row");
    report.malformed.push(RowIssue { line, reason });
    Ok(())
}

/// Column positions resolved from the header.
struct Columns {
    group: usize,
    feature: usize,
    verdict: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(LoadError::MissingColumn(name))
        };
        let columns = Self {
            group: find(RESOURCE_GROUP_ID)?,
            feature: find(FEATURE)?,
            verdict: find(VERIFICATION_RESULT)?,
        };
        for optional in [CONTROL_STRING_ID, CATEGORY_NAME] {
            if find(optional).is_err() {
                debug!(column = optional, "optional column absent");
            }
        }
        Ok(columns)
    }

    fn extract<'r>(&self, record: &'r csv::StringRecord) -> Result<(&'r str, &'r str, &'r str), String> {
        let field = |idx: usize, name: &str| match record.get(idx) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(format!("empty {name}")),
        };
        Ok((
            field(self.group, RESOURCE_GROUP_ID)?,
            field(self.feature, FEATURE)?,
            field(self.verdict, VERIFICATION_RESULT)?,
        ))
    }
}
