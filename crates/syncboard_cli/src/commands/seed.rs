//! Seed board loading and printing.

use super::CliError;
use std::path::Path;
use syncboard_protocol::{seed, ApplicationState};

/// Reads a seed board from `path`, or returns the built-in board.
pub fn load(path: Option<&Path>) -> Result<ApplicationState, CliError> {
    let Some(path) = path else {
        return Ok(seed::default_board());
    };
    let bytes = std::fs::read(path).map_err(|source| CliError::SeedRead {
        path: path.to_path_buf(),
        source,
    })?;
    ApplicationState::from_slice(&bytes).map_err(|source| CliError::SeedParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the built-in board as pretty JSON to `output`, or stdout.
pub fn print(output: Option<&Path>) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&seed::default_board())?;
    match output {
        Some(path) => std::fs::write(path, json + "\n")?,
        None => println!("{json}"),
    }
    Ok(())
}
