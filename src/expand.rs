//! Turns demand lines into the ordered sequence of physical pieces the packer consumes.

use std::collections::HashSet;

use crate::error::{OptimizationError, Result};
use crate::types::{CutPiece, Rect};

/// One physical piece to cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPiece {
    pub id: String,
    /// Position of the originating [`CutPiece`] in the input.
    pub source: usize,
    pub source_id: String,
    pub rect: Rect,
    pub can_rotate: bool,
    pub label: Option<String>,
}

/// Upper bound on the number of physical pieces in one run.
pub const MAX_UNITS: u64 = 10_000;

pub fn validate_pieces(pieces: &[CutPiece]) -> Result<()> {
    if pieces.is_empty() {
        return Err(OptimizationError::NoPieces);
    }
    let mut seen = HashSet::new();
    let mut total: u64 = 0;
    for p in pieces {
        if p.width == 0 {
            return Err(OptimizationError::invalid_piece(&p.id, "width must be positive"));
        }
        if p.height == 0 {
            return Err(OptimizationError::invalid_piece(&p.id, "height must be positive"));
        }
        if p.quantity == 0 {
            return Err(OptimizationError::invalid_piece(&p.id, "quantity must be positive"));
        }
        if !seen.insert(p.id.as_str()) {
            return Err(OptimizationError::invalid_piece(&p.id, "duplicate piece id"));
        }
        total += p.quantity as u64;
        if total > MAX_UNITS {
            return Err(OptimizationError::invalid_piece(
                &p.id,
                format!("run exceeds {MAX_UNITS} pieces in total"),
            ));
        }
    }
    Ok(())
}

/// Validates `pieces`, then expands every demand line into unit pieces sorted largest first:
/// area descending, then longest side descending, then input order.
pub fn expand_pieces(pieces: &[CutPiece]) -> Result<Vec<UnitPiece>> {
    validate_pieces(pieces)?;

    let total: usize = pieces.iter().map(|p| p.quantity as usize).sum();
    let mut units = Vec::with_capacity(total);
    for (source, p) in pieces.iter().enumerate() {
        for i in 0..p.quantity {
            units.push(UnitPiece {
                id: format!("{}_{}", p.id, i),
                source,
                source_id: p.id.clone(),
                rect: p.rect(),
                can_rotate: p.can_rotate,
                label: p.label.clone(),
            });
        }
    }

    // sort_by is stable, so equal keys keep input order
    units.sort_by(|a, b| {
        b.rect
            .area()
            .cmp(&a.rect.area())
            .then_with(|| b.rect.max_side().cmp(&a.rect.max_side()))
    });
    Ok(units)
}
