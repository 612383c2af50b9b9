//! flightdelay: flight-delay classification.
//!
//! This crate turns raw flight records into a pinned feature table
//! (`preprocessing`), trains and serves a gradient-boosted tree classifier
//! that predicts whether a departure will be more than 15 minutes late
//! (`models`), and carries the CSV I/O and evaluation helpers used by the
//! `flightdelay` command line tool.
//!
//! ```no_run
//! use flightdelay::config::FeatureSet;
//! use flightdelay::io::read_flights_csv;
//! use flightdelay::models::DelayModel;
//! use flightdelay::preprocessing::{preprocess_with_labels, FeatureSchema};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let records = read_flights_csv("data/data.csv")?;
//! let schema = FeatureSchema::for_set(FeatureSet::TopTen);
//! let (features, labels) = preprocess_with_labels(&records, schema)?;
//!
//! let model = DelayModel::new("models");
//! model.fit(&features, &labels)?;
//! let predictions = model.predict(&features)?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod preprocessing;
pub mod stats;
