//! `strata`: stratified resampling and resampled model evaluation for CSV data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use strata::config::{self, RunConfig};
use strata::dataset::{Dataset, load_csv};
use strata::logging;
use strata::ml::workflow::{Assessment, MetricSummary, summarize};
use strata::resample::{PartitionMap, PartitionName};

fn main() {
    if let Err(err) = run() {
        tracing::error!("{err}");
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Split,
    Folds,
    ThreeWay,
    Evaluate,
}

#[derive(Debug, Clone)]
struct CliOptions {
    command: Command,
    data: PathBuf,
    config: Option<PathBuf>,
    seed: Option<u64>,
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct PartitionReport {
    command: &'static str,
    label_column: String,
    seed: u64,
    records: usize,
    resamples: Vec<Resample>,
}

#[derive(Serialize)]
struct Resample {
    repeat: usize,
    partitions: PartitionMap,
    /// Partition of every record, in record order.
    assignment: Vec<Option<PartitionName>>,
    class_counts: BTreeMap<PartitionName, BTreeMap<String, usize>>,
}

#[derive(Serialize)]
struct EvaluationReport {
    label_column: String,
    seed: u64,
    records: usize,
    assessments: Vec<Assessment>,
    summary: Vec<MetricSummary>,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut config =
        config::load_or_default(options.config.as_deref()).map_err(|err| err.to_string())?;
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    if let Err(err) = logging::init(&config.logging) {
        eprintln!("Logging disabled: {err}");
    }

    let schema = config.schema().map_err(|err| err.to_string())?;
    let dataset = load_csv(&options.data, &schema).map_err(|err| err.to_string())?;
    let json = match options.command {
        Command::Evaluate => to_json(&evaluate(&config, &dataset)?)?,
        command => to_json(&partition(command, &config, &dataset)?)?,
    };
    write_output(options.out.as_deref(), &json)
}

fn partition(
    command: Command,
    config: &RunConfig,
    dataset: &Dataset,
) -> Result<PartitionReport, String> {
    let splitter = config.splitter().map_err(|err| err.to_string())?;
    let len = dataset.len();
    let resampled: Vec<(PartitionMap, Vec<Option<PartitionName>>)> = match command {
        Command::Split => {
            let split = splitter.split(dataset).map_err(|err| err.to_string())?;
            let assignment = split
                .held_out_mask(len)
                .into_iter()
                .map(|held_out| {
                    Some(if held_out {
                        PartitionName::Test
                    } else {
                        PartitionName::Train
                    })
                })
                .collect();
            vec![(split.partition_map(), assignment)]
        }
        Command::Folds => splitter
            .repeated_k_fold(dataset)
            .map_err(|err| err.to_string())?
            .iter()
            .map(|folds| {
                let assignment = (0..len)
                    .map(|index| folds.fold_of(index).map(PartitionName::Fold))
                    .collect();
                (folds.partition_map(), assignment)
            })
            .collect(),
        Command::ThreeWay => {
            let three = splitter
                .train_validation_test(dataset)
                .map_err(|err| err.to_string())?;
            vec![(three.partition_map(), three.labels(len))]
        }
        Command::Evaluate => return Err("evaluate does not produce partitions".to_string()),
    };

    let label_column = config.label_column.as_str();
    let mut resamples = Vec::with_capacity(resampled.len());
    for (repeat, (partitions, assignment)) in resampled.into_iter().enumerate() {
        let mut class_counts = BTreeMap::new();
        for (name, rows) in &partitions {
            let counts = dataset
                .class_counts(label_column, rows)
                .map_err(|err| err.to_string())?;
            tracing::info!("repeat {repeat} {name}: {} records {counts:?}", rows.len());
            class_counts.insert(*name, counts);
        }
        resamples.push(Resample {
            repeat,
            partitions,
            assignment,
            class_counts,
        });
    }
    Ok(PartitionReport {
        command: command_name(command),
        label_column: config.label_column.clone(),
        seed: config.seed,
        records: dataset.len(),
        resamples,
    })
}

fn evaluate(config: &RunConfig, dataset: &Dataset) -> Result<EvaluationReport, String> {
    let assessments = config
        .workflow()
        .evaluate(dataset)
        .map_err(|err| err.to_string())?;
    let summary = summarize(&assessments);
    for metric in &summary {
        tracing::info!(
            "{}: mean {:.4} (std err {:.4}, n={})",
            metric.metric,
            metric.mean,
            metric.std_err,
            metric.n
        );
    }
    Ok(EvaluationReport {
        label_column: config.label_column.clone(),
        seed: config.seed,
        records: dataset.len(),
        assessments,
        summary,
    })
}

fn to_json<T: Serialize>(report: &T) -> Result<String, String> {
    serde_json::to_string_pretty(report).map_err(|err| err.to_string())
}

fn write_output(out: Option<&Path>, json: &str) -> Result<(), String> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|err| err.to_string())?;
            }
            std::fs::write(path, json)
                .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn command_name(command: Command) -> &'static str {
    match command {
        Command::Split => "split",
        Command::Folds => "folds",
        Command::ThreeWay => "three-way",
        Command::Evaluate => "evaluate",
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let command = match args.first().map(String::as_str) {
        Some("split") => Command::Split,
        Some("folds") => Command::Folds,
        Some("three-way") => Command::ThreeWay,
        Some("evaluate") => Command::Evaluate,
        Some("-h" | "--help") | None => return Err(help_text()),
        Some(unknown) => return Err(format!("Unknown command: {unknown}\n\n{}", help_text())),
    };
    let mut data: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut seed: Option<u64> = None;
    let mut out: Option<PathBuf> = None;

    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--data" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--data requires a value".to_string())?;
                data = Some(PathBuf::from(value));
            }
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config = Some(PathBuf::from(value));
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                out = Some(PathBuf::from(value));
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let data = data.ok_or_else(help_text)?;
    Ok(CliOptions {
        command,
        data,
        config,
        seed,
        out,
    })
}

fn help_text() -> String {
    [
        "strata",
        "",
        "Stratified train/test, k-fold and train/validation/test resampling of CSV data.",
        "",
        "Usage:",
        "  strata <split|folds|three-way|evaluate> --data <csv> [options]",
        "",
        "Commands:",
        "  split       Stratified train/test split.",
        "  folds       Stratified (repeated) k-fold assignment.",
        "  three-way   Stratified train/validation/test split.",
        "  evaluate    Fit and assess the configured model on every resample.",
        "",
        "Options:",
        "  --data <csv>      Input CSV with a header row (required).",
        "  --config <toml>   Run config (default: <config dir>/.strata/config.toml).",
        "  --seed <u64>      Override the configured seed.",
        "  --out <json>      Write the JSON report here instead of stdout.",
    ]
    .join("\n")
}
