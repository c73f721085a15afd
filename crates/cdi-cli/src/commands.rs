use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use cdi_adapt::{
    Adapter, AdapterKind, DataAdapter, NestedAdapter, PivotAdapter, RowErrorPolicy,
    TimeSeriesAdapter, perform_pivot,
};
use cdi_detect::TypeDetector;
use cdi_map::{DEFAULT_MAX_DEPTH, MappingSuggester, enumerate_fields};
use cdi_model::ValidationResult;
use cdi_cli::pipeline::{
    InputOptions, RoleOverrides, build_mapping, load_input, mapping_summary, resolve_pivot,
};

use crate::cli::{InputArgs, OutputFormatArg, PivotArgs, SuggestArgs, TransformArgs};
use crate::summary::{
    Inspection, print_chart_types, print_column_types, print_field_suggestions,
    print_inspection, print_mapping, print_pivot_analysis, print_pivot_suggestion, print_points,
    print_records, print_validation,
};

pub fn run_suggest(args: &SuggestArgs) -> Result<()> {
    let input = load_input(&args.input.file, &input_options(&args.input))?;
    let records = &input.records;
    let suggester = MappingSuggester::new();

    let column_types = TypeDetector::new().detect_record_types(records);
    let analyses = suggester.analyze_fields(records);
    let chart_types = suggester.suggest_chart_type(records);
    let mapping = suggester
        .suggest_config(records)
        .map(|config| mapping_summary(&config));
    let pivot = PivotAdapter::new().suggest_pivot_config(records);
    let flattening = NestedAdapter::new().suggest_flattening_strategy(records);

    match args.input.format {
        OutputFormatArg::Json => print_json(&json!({
            "adapter": input.adapter.kind(),
            "records": records.len(),
            "columnTypes": column_types,
            "fields": analyses,
            "chartTypes": chart_types,
            "mapping": mapping,
            "pivot": pivot,
            "flattening": flattening,
        })),
        OutputFormatArg::Table => {
            println!(
                "{} record(s) from {} via the {} adapter",
                records.len(),
                input.path.display(),
                input.adapter.name()
            );
            println!();
            print_column_types(&column_types);
            println!();
            print_field_suggestions(&analyses, args.limit);
            println!();
            print_chart_types(&chart_types);
            println!();
            print_mapping(mapping.as_ref());
            print_pivot_suggestion(pivot.as_ref());
            Ok(())
        }
    }
}

pub fn run_validate(args: &InputArgs) -> Result<ValidationResult> {
    let input = load_input(&args.file, &input_options(args))?;
    let result = input.validate();
    info!(
        adapter = input.adapter.name(),
        valid = result.is_valid,
        confidence = result.confidence,
        "validated input"
    );
    match args.format {
        OutputFormatArg::Json => print_json(&json!({
            "adapter": input.adapter.kind(),
            "result": result,
        }))?,
        OutputFormatArg::Table => print_validation(input.adapter.name(), &result),
    }
    Ok(result)
}

pub fn run_transform(args: &TransformArgs) -> Result<()> {
    let input = load_input(&args.input.file, &input_options(&args.input))?;
    let pivot = args
        .pivot
        .as_deref()
        .map(|spec| resolve_pivot(spec, &input.records))
        .transpose()?;
    let overrides = RoleOverrides {
        x: args.mapping.x.clone(),
        y: args.mapping.y.clone(),
        color: args.mapping.color.clone(),
        size: args.mapping.size.clone(),
    };
    let mapping = build_mapping(&input.records, &overrides, pivot)?;

    // Reshapes are applied by the pivot adapter.
    let mut adapter = if mapping.pivot.is_some() {
        Adapter::new(AdapterKind::Pivot)
    } else {
        input.adapter
    };
    if args.quiet_rows {
        adapter = adapter.with_policy(RowErrorPolicy::Silent);
    }
    let points = adapter.transform(&input.records, &mapping);
    info!(
        adapter = adapter.name(),
        records = input.records.len(),
        points = points.len(),
        "transformed input"
    );

    match args.input.format {
        OutputFormatArg::Json => print_json(&points),
        OutputFormatArg::Table => {
            print_mapping(Some(&mapping_summary(&mapping)));
            println!();
            print_points(&points);
            let dropped = input.records.len().saturating_sub(points.len());
            if mapping.pivot.is_none() && dropped > 0 {
                println!("{dropped} record(s) dropped");
            }
            Ok(())
        }
    }
}

pub fn run_pivot(args: &PivotArgs) -> Result<()> {
    let input = load_input(&args.input.file, &input_options(&args.input))?;
    let Some(spec) = args.pivot.as_deref() else {
        let analysis = PivotAdapter::new().analyze(&input.records);
        return match args.input.format {
            OutputFormatArg::Json => print_json(&analysis),
            OutputFormatArg::Table => {
                print_pivot_analysis(&analysis);
                Ok(())
            }
        };
    };

    let config = resolve_pivot(spec, &input.records)?;
    let reshaped = perform_pivot(&input.records, &config);
    info!(
        kind = config.kind(),
        input = input.records.len(),
        output = reshaped.len(),
        "reshaped records"
    );
    match args.input.format {
        OutputFormatArg::Json => print_json(&reshaped),
        OutputFormatArg::Table => {
            print_records(&reshaped);
            Ok(())
        }
    }
}

pub fn run_inspect(args: &InputArgs) -> Result<()> {
    let input = load_input(&args.file, &input_options(args))?;
    let records = &input.records;
    let nested = NestedAdapter::new();
    let complexity = nested.complexity(records);
    let flattening = nested.suggest_flattening_strategy(records);
    let fields = records
        .first()
        .map(|first| enumerate_fields(first, DEFAULT_MAX_DEPTH))
        .unwrap_or_default();
    let time_series = TimeSeriesAdapter::new();
    let time_fields = time_series.find_time_fields(records);
    let interval = time_fields
        .first()
        .and_then(|field| time_series.get_time_interval(records, field));
    let pivot = PivotAdapter::new().analyze(records);

    match args.format {
        OutputFormatArg::Json => print_json(&json!({
            "adapter": input.adapter.kind(),
            "records": records.len(),
            "fields": fields,
            "complexity": complexity,
            "flattening": flattening,
            "timeFields": time_fields,
            "timeInterval": interval,
            "pivot": pivot,
        })),
        OutputFormatArg::Table => {
            print_inspection(&Inspection {
                adapter: input.adapter.name(),
                records: records.len(),
                fields: &fields,
                complexity: &complexity,
                flattening: &flattening,
                time_fields: &time_fields,
                interval,
            });
            println!();
            print_pivot_analysis(&pivot);
            Ok(())
        }
    }
}

fn input_options(args: &InputArgs) -> InputOptions {
    InputOptions {
        adapter: args.adapter,
        delimiter: args.delimiter,
        no_header: args.no_header,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{text}");
    Ok(())
}
