use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use flightdelay::config::FeatureSet;
use flightdelay_cli::predict::{run_prediction, PredictConfig};
use flightdelay_cli::serve::{run_server, ServeConfig};
use flightdelay_cli::train::input::TrainConfig;
use flightdelay_cli::train::trainer;
use flightdelay_cli::util::validate_tsv_or_csv_file;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(
            env_logger::Env::default().filter_or("FLIGHTDELAY_LOG", "error,flightdelay=info"),
        )
        .init();

    let models_dir_arg = || {
        Arg::new("models_dir")
            .long("models-dir")
            .help("Directory holding the persisted model artifacts")
            .value_parser(clap::builder::NonEmptyStringValueParser::new())
            .value_hint(ValueHint::DirPath)
    };
    let feature_set_arg = || {
        Arg::new("feature_set")
            .long("feature-set")
            .help("Feature schema to derive")
            .value_parser(["top-ten", "extended"])
            .value_hint(ValueHint::Other)
    };

    let matches = Command::new("flightdelay")
        .version(clap::crate_version!())
        .about(
            "\u{2708}\u{FE0F} flightdelay - Predict whether a flight departs \
             more than 15 minutes late",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train the delay classifier on a flight CSV and persist it")
                .arg(
                    Arg::new("config")
                        .help("Path to training configuration file (JSON)")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("train_data")
                        .short('d')
                        .long("data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to training data. Overrides the training data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(models_dir_arg())
                .arg(feature_set_arg())
                .arg(
                    Arg::new("validation_fraction")
                        .long("validation-fraction")
                        .help("Share of rows held out for the evaluation report")
                        .value_parser(clap::value_parser!(f32)),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Predict delays for every row of a flight CSV with the latest model")
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .required(true)
                        .help("Path to the input data file (*.csv or *.tsv)")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Path to write predictions (CSV). Defaults to stdout.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(models_dir_arg())
                .arg(feature_set_arg()),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve predictions over HTTP")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .help("Address to listen on")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .help("Port to listen on")
                        .value_parser(clap::value_parser!(u16)),
                )
                .arg(models_dir_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        Some(("serve", sub_m)) => handle_serve(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path = matches.get_one::<PathBuf>("config");
    match config_path {
        Some(path) => log::info!("[flightdelay::train] Training from config: {:?}", path),
        None => log::info!("[flightdelay::train] No config provided; using defaults."),
    }

    let params = TrainConfig::from_arguments(config_path, matches)?;
    if config_path.is_none() {
        log::debug!(
            "Effective config:\n{}",
            serde_json::to_string_pretty(&params).unwrap_or_default()
        );
    }

    match trainer::run_training(&params) {
        Ok(summary) => {
            log::info!(
                "[flightdelay::train] Trained on {} rows ({} held out), \
                 positive-class weight {:.4}",
                summary.train_rows,
                summary.validation_rows,
                summary.scale_pos_weight
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let data = matches
        .get_one::<String>("data")
        .cloned()
        .unwrap_or_default();
    validate_tsv_or_csv_file(&data)?;

    let defaults = ServeConfig::default();
    let feature_set = matches
        .get_one::<String>("feature_set")
        .map(|s| s.parse::<FeatureSet>())
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let config = PredictConfig {
        data,
        output: matches.get_one::<PathBuf>("output_file").cloned(),
        models_dir: matches
            .get_one::<String>("models_dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.models_dir),
        feature_set,
    };
    log::info!("[flightdelay::predict] Predicting {}", config.data);

    match run_prediction(&config) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    let mut config = ServeConfig::default();
    if let Some(host) = matches.get_one::<String>("host") {
        config.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.port = *port;
    }
    if let Some(models_dir) = matches.get_one::<String>("models_dir") {
        config.models_dir = PathBuf::from(models_dir);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    match runtime.block_on(run_server(config)) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Server failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
