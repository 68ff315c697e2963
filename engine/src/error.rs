/*
 * error.rs
 * Part of the byte-gammon project
 * Created Date: Monday, March 17th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jun 24 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use gammon::match_state::CubeError;
use gammon::xgid::XgidError;
use thiserror::Error;

/// Engine-level errors. Every variant maps to a negative integer code at
/// the public boundary; parse errors keep the parser's own sub-codes.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("position id error: {0}")]
    InputParse(#[from] XgidError),
    #[error("out of range: {0}")]
    OutOfRange(String),
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl EngineError {
    pub fn code(&self) -> i32 {
        match self {
            EngineError::InputParse(err) => err.code(),
            EngineError::OutOfRange(_) => -5,
            EngineError::ResourceUnavailable(_) => -6,
            EngineError::InternalInvariant(_) => -7,
        }
    }
}

impl From<CubeError> for EngineError {
    fn from(err: CubeError) -> Self {
        EngineError::OutOfRange(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
