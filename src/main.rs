use clap::{Parser, Subcommand};
use colored::*;
use cosdist::config::DEFAULT_CONFIG_PATH;
use cosdist::utils::parsing::parse_shape;
use cosdist::{
    load_tensor, save_tensor, CosineDistanceLoss, DType, LossConfig, OutputFormat, Reduction,
    Shape, Tensor,
};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use toon_format::encode_default;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cosdist")]
#[command(version = "0.1")]
#[command(about = "Cosine distance loss over dense tensors", long_about = None)]
struct Cli {
    /// Config file (defaults to ./cosdist.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the output shape for the given input shapes
    Infer {
        /// Predictions shape, e.g. [2, 3]
        #[arg(long, value_parser = parse_shape)]
        predictions_shape: Shape,
        /// Labels shape, e.g. [2, 3]
        #[arg(long, value_parser = parse_shape)]
        labels_shape: Shape,
        /// Reduction: 0-3 or its name
        #[arg(long)]
        reduction: Option<Reduction>,
        /// Reduction axis, negative counts from the end
        #[arg(long, allow_hyphen_values = true)]
        axis: Option<i64>,
    },
    /// Compute the loss from JSON tensor files
    Compute {
        #[arg(long)]
        predictions: PathBuf,
        #[arg(long)]
        labels: PathBuf,
        /// Weights tensor file
        #[arg(long, conflicts_with = "weight")]
        weights: Option<PathBuf>,
        /// Scalar weight (default 1.0)
        #[arg(long, allow_hyphen_values = true)]
        weight: Option<f32>,
        #[arg(long)]
        reduction: Option<Reduction>,
        #[arg(long, allow_hyphen_values = true)]
        axis: Option<i64>,
        /// Write the result tensor to this file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output format: 'display' (human-readable) or 'toon' (machine-readable)
        #[arg(long)]
        format: Option<OutputFormat>,
    },
    /// Write a default cosdist.toml
    Init,
}

#[derive(Serialize)]
struct LossReport<'a> {
    reduction: Reduction,
    axis: i64,
    shape: &'a Shape,
    values: &'a [f32],
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => LossConfig::from_path(path)?,
        None => LossConfig::load(),
    };

    match cli.command {
        Commands::Infer {
            predictions_shape,
            labels_shape,
            reduction,
            axis,
        } => {
            let loss = CosineDistanceLoss::new(
                reduction.unwrap_or(config.loss.reduction),
                axis.unwrap_or(config.loss.axis),
            );
            match loss.infer(&predictions_shape, DType::Float32, &labels_shape) {
                Ok(spec) => println!("{} {}", spec.shape, spec.dtype),
                Err(e) => {
                    eprintln!("{}: {}", "Error".red(), e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Compute {
            predictions,
            labels,
            weights,
            weight,
            reduction,
            axis,
            output,
            format,
        } => {
            let loss = CosineDistanceLoss::new(
                reduction.unwrap_or(config.loss.reduction),
                axis.unwrap_or(config.loss.axis),
            );
            let format = format.unwrap_or(config.output.format);

            let predictions = load_tensor(&predictions)?;
            let labels = load_tensor(&labels)?;
            let weights = match weights {
                Some(path) => load_tensor(&path)?,
                None => Tensor::scalar(weight.unwrap_or(1.0)),
            };
            tracing::info!(
                reduction = %loss.reduction,
                axis = loss.axis,
                predictions = %predictions.shape,
                "computing loss"
            );

            let result = match loss.evaluate(&predictions, &weights, &labels) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("{}: {}", "Error".red(), e);
                    std::process::exit(1);
                }
            };

            print_result(&loss, &result, format)?;

            if let Some(path) = output {
                save_tensor(&path, &result)?;
                tracing::info!("wrote {}", path.display());
            }
        }
        Commands::Init => {
            handle_init()?;
        }
    }

    Ok(())
}

/// `--verbose` wins over `RUST_LOG`; otherwise `RUST_LOG` applies, then `info`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_result(
    loss: &CosineDistanceLoss,
    result: &Tensor,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Display => println!("{}", result),
        OutputFormat::Toon => {
            let report = LossReport {
                reduction: loss.reduction,
                axis: loss.axis,
                shape: &result.shape,
                values: &result.data,
            };
            let toon = encode_default(&report)
                .unwrap_or_else(|e| format!("Error encoding TOON: {}", e));
            println!("{}", toon);
        }
    }
    Ok(())
}

fn handle_init() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = DEFAULT_CONFIG_PATH;
    if !std::path::Path::new(config_path).exists() {
        fs::write(config_path, LossConfig::default().to_toml()?)?;
        println!("Created default configuration: {}", config_path.green());
    } else {
        println!(
            "Configuration file already exists: {}",
            config_path.yellow()
        );
    }
    Ok(())
}
