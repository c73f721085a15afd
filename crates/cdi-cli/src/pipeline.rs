//! Input loading and mapping resolution shared by the commands.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use cdi_adapt::{
    Adapter, AdapterKind, CsvAdapter, CsvOptions, DataAdapter, PivotAdapter, parse_json_records,
    perform_pivot, read_csv,
};
use cdi_map::MappingSuggester;
use cdi_model::{MappingConfig, PivotConfig, Record, ValidationResult};
use tracing::{debug, info};

/// How to decode an input file.
#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    /// Adapter to use instead of detecting one from the data.
    pub adapter: Option<AdapterKind>,
    /// Delimiter override for delimited text.
    pub delimiter: Option<char>,
    /// Whether delimited text lacks a header line.
    pub no_header: bool,
}

/// Decoded records with the adapter chosen for them.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub path: PathBuf,
    pub records: Vec<Record>,
    /// Header cells of delimited text as written; empty for JSON.
    pub headers: Vec<String>,
    pub adapter: Adapter,
}

impl LoadedInput {
    /// Validates the records with the chosen adapter. Delimited text is
    /// checked against its header line.
    pub fn validate(&self) -> ValidationResult {
        match self.adapter {
            Adapter::Csv(csv) => csv.validate_with_headers(&self.records, &self.headers),
            adapter => adapter.validate(&self.records),
        }
    }
}

/// Explicit role assignments from the command line.
#[derive(Debug, Clone, Default)]
pub struct RoleOverrides {
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl RoleOverrides {
    fn is_complete(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    fn apply(&self, mut config: MappingConfig) -> MappingConfig {
        let roles = [
            ("x", &self.x),
            ("y", &self.y),
            ("color", &self.color),
            ("size", &self.size),
        ];
        for (role, field) in roles {
            if let Some(field) = field {
                config = config.with_role(role, field.as_str());
            }
        }
        config
    }
}

/// Reads and decodes a file.
///
/// `.json` files are decoded as an array of records; anything else is read
/// as delimited text (tab-separated for `.tsv`). The adapter is the one
/// requested, or else the one the data's shape suggests.
///
/// # Errors
///
/// Fails when the file cannot be read or its JSON is malformed or not an
/// array.
pub fn load_input(path: &Path, options: &InputOptions) -> Result<LoadedInput> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let mut csv_options = CsvOptions::default();
    let (records, headers) = match AdapterKind::from_extension(&extension) {
        Some(AdapterKind::Nested) => {
            let records = parse_json_records(&text)
                .with_context(|| format!("failed to decode {}", path.display()))?;
            (records, Vec::new())
        }
        _ => {
            if extension == "tsv" {
                csv_options = CsvOptions::tsv();
            }
            if let Some(delimiter) = options.delimiter {
                csv_options = csv_options.delimiter(delimiter);
            }
            csv_options = csv_options.has_header(!options.no_header);
            let table = read_csv(&text, &csv_options);
            (table.records, table.headers)
        }
    };

    let kind = options
        .adapter
        .unwrap_or_else(|| AdapterKind::detect(&records));
    let adapter = match kind {
        AdapterKind::Csv => Adapter::Csv(CsvAdapter::new(csv_options)),
        other => Adapter::new(other),
    };
    info!(
        path = %path.display(),
        records = records.len(),
        adapter = kind.name(),
        "loaded input"
    );
    Ok(LoadedInput {
        path: path.to_path_buf(),
        records,
        headers,
        adapter,
    })
}

/// Resolves a `--pivot` argument: `auto` suggests a reshape from the data,
/// anything else is parsed as a JSON pivot configuration.
///
/// # Errors
///
/// Fails when `auto` finds no confident reshape or the JSON is invalid.
pub fn resolve_pivot(spec: &str, records: &[Record]) -> Result<PivotConfig> {
    if spec.trim().eq_ignore_ascii_case("auto") {
        return PivotAdapter::new()
            .suggest_pivot_config(records)
            .ok_or_else(|| anyhow!("no confident reshape found; pass a JSON pivot configuration"));
    }
    serde_json::from_str(spec).context("invalid pivot configuration")
}

/// Builds the mapping for a transform.
///
/// With both x and y given the mapping is exactly the overrides. Otherwise
/// the suggested mapping for the (reshaped, when pivoting) records is used,
/// with any given roles replacing the suggested ones.
///
/// # Errors
///
/// Fails when x or y is missing and no mapping can be suggested.
pub fn build_mapping(
    records: &[Record],
    overrides: &RoleOverrides,
    pivot: Option<PivotConfig>,
) -> Result<MappingConfig> {
    let base = if overrides.is_complete() {
        MappingConfig::new()
    } else {
        let reshaped;
        let sample = match &pivot {
            Some(config) => {
                reshaped = perform_pivot(records, config);
                reshaped.as_slice()
            }
            None => records,
        };
        let Some(suggested) = MappingSuggester::new().suggest_config(sample) else {
            bail!("could not infer a mapping; pass --x and --y");
        };
        suggested
    };

    let mut config = overrides.apply(base);
    if let Some(pivot) = pivot {
        config = config.with_pivot(pivot);
    }
    debug!(
        roles = config.roles().count(),
        pivot = config.pivot.as_ref().map(PivotConfig::kind),
        "resolved mapping"
    );
    Ok(config)
}

/// Role to field path, for display. Accessor fields show as `<accessor>`.
pub fn mapping_summary(config: &MappingConfig) -> BTreeMap<String, String> {
    config
        .roles()
        .map(|(role, field)| {
            let path = field.as_path().unwrap_or("<accessor>");
            (role.to_string(), path.to_string())
        })
        .collect()
}
