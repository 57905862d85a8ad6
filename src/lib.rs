//! Sheet cutting optimizer for rectangular pieces.
//!
//! Pieces are expanded into units, ordered largest first, and packed sheet by sheet with a
//! best-fit skyline packer. When several stock sizes are offered, each round commits the size
//! with the fullest layout for what is left. Runs are pure and deterministic.
//!
//! ```ignore
//! use sheet_optimizer::{CutPiece, OptimizeOptions, SheetSize, optimize};
//!
//! let sheets = [SheetSize::new(3050, 2050).with_price(140.0)];
//! let pieces = [CutPiece::new("front", 600, 400, 4), CutPiece::new("base", 300, 200, 2).fixed()];
//! let result = optimize(&sheets, &pieces, &OptimizeOptions::default())?;
//! println!("{} sheets, {:.1}% waste", result.total_sheets, result.waste_percentage);
//! ```

pub mod config;
pub mod error;
pub mod expand;
pub mod render;
pub mod skyline;
pub mod solver;
pub mod types;

pub use config::OptimizeOptions;
pub use error::{OptimizationError, Result};
pub use types::{CutPiece, OptimizationResult, PlacedPiece, SheetLayout, SheetSize};

use tracing::instrument;

use crate::solver::Solver;

/// Lays out every piece on the fewest, fullest sheets. Fails without a partial plan when the
/// input is malformed or some piece fits on no candidate sheet.
#[instrument(skip_all, fields(sheets = sheets.len(), pieces = pieces.len()))]
pub fn optimize(
    sheets: &[SheetSize],
    pieces: &[CutPiece],
    options: &OptimizeOptions,
) -> Result<OptimizationResult> {
    let result = Solver::new(sheets, pieces, *options).solve()?;
    tracing::info!(
        total_sheets = result.total_sheets,
        waste_percentage = result.waste_percentage,
        cutting_distance = result.cutting_distance,
        "optimization finished"
    );
    Ok(result)
}
