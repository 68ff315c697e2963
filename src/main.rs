/*
 * main.rs
 * Part of the byte-gammon project
 * Created Date: Monday, April 7th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Fri Jul 4 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use engine::defs::About;
use engine::engine::{Engine, EngineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = About::SHORT_DESCRIPTION, long_about = None)]
struct Options {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
#[command(about = "Available commands")]
enum Command {
    /// Recommend an action for a position, as JSON on stdout.
    Hint {
        /// Position identifier, e.g.
        /// `XGID=-b----E-C---eE---c-e----B-:0:0:1:65:0:0:0:0:10`
        xgid: String,

        /// Search depth in plies.
        #[arg(short, long, default_value_t = 0)]
        plies: u32,

        /// Text weights file.
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Binary weights file; preferred over the text file when present.
        #[arg(long)]
        binary_weights: Option<PathBuf>,

        /// Number of evaluation-cache entries.
        #[arg(long)]
        cache_size: Option<u32>,

        /// Skip generating the bearoff database (faster start, weaker
        /// endgame evaluation).
        #[arg(long)]
        no_bearoff: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let options = Options::parse();

    match options.command {
        Command::Hint {
            xgid,
            plies,
            weights,
            binary_weights,
            cache_size,
            no_bearoff,
        } => {
            let mut config = EngineConfig::default();
            if let Some(path) = weights {
                config.weights_path = path;
            }
            if binary_weights.is_some() {
                config.binary_weights_path = binary_weights;
            }
            if let Some(size) = cache_size {
                config.cache_size = size;
            }
            config.bearoff = !no_bearoff;

            let mut engine = Engine::init(config)?;
            println!("{}", engine.hint(&xgid, plies));
            engine.shutdown();
        }
    }

    Ok(())
}
