use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::OptimizeOptions;
use crate::error::{OptimizationError, Result};
use crate::expand::{UnitPiece, expand_pieces};
use crate::skyline::SkylineBin;
use crate::types::{CutPiece, OptimizationResult, SheetLayout, SheetSize};

/// Allocates pieces across sheets, one sheet per round.
pub struct Solver<'a> {
    sheets: &'a [SheetSize],
    pieces: &'a [CutPiece],
    options: OptimizeOptions,
}

/// Outcome of packing the current remainder onto one fresh sheet.
struct Round {
    sheet_index: usize,
    bin: SkylineBin,
    placed: Vec<usize>,
}

impl Round {
    fn used_area(&self) -> u64 {
        self.bin.used_area()
    }
}

impl<'a> Solver<'a> {
    pub fn new(sheets: &'a [SheetSize], pieces: &'a [CutPiece], options: OptimizeOptions) -> Self {
        Self {
            sheets,
            pieces,
            options,
        }
    }

    pub fn solve(&self) -> Result<OptimizationResult> {
        self.options.validate()?;
        self.validate_sheets()?;
        let mut remaining = expand_pieces(self.pieces)?;

        let mut layouts: Vec<SheetLayout> = Vec::new();
        while !remaining.is_empty() {
            let Some(round) = self.best_round(&remaining) else {
                return Err(self.unplaceable(&remaining));
            };

            tracing::debug!(
                sheet = layouts.len() + 1,
                sheet_index = round.sheet_index,
                placed = round.placed.len(),
                remaining = remaining.len() - round.placed.len(),
                "allocated sheet"
            );

            remaining = take_unplaced(remaining, &round.placed);
            let sheet = self.sheets[round.sheet_index].clone();
            layouts.push(SheetLayout::new(
                round.sheet_index,
                sheet,
                round.bin.into_placements(),
            ));
        }

        Ok(OptimizationResult::from_layouts(
            layouts,
            self.options.cutting_speed_mm_per_min,
        ))
    }

    fn validate_sheets(&self) -> Result<()> {
        let Some(first) = self.sheets.first() else {
            return Err(OptimizationError::NoSheets);
        };
        let margins = self.options.margin.saturating_mul(2) as u64;
        for (index, sheet) in self.sheets.iter().enumerate() {
            if sheet.width == 0 || sheet.height == 0 {
                return Err(OptimizationError::invalid_sheet(
                    index,
                    format!("dimensions must be positive, got {}", sheet.rect()),
                ));
            }
            if !sheet.price_per_sheet.is_finite() || sheet.price_per_sheet < 0.0 {
                return Err(OptimizationError::invalid_sheet(
                    index,
                    format!("price must be non-negative, got {}", sheet.price_per_sheet),
                ));
            }
            if !sheet.thickness.is_finite() || sheet.thickness < 0.0 {
                return Err(OptimizationError::invalid_sheet(
                    index,
                    format!("thickness must be non-negative, got {}", sheet.thickness),
                ));
            }
            if sheet.width as u64 <= margins || sheet.height as u64 <= margins {
                return Err(OptimizationError::invalid_sheet(
                    index,
                    format!(
                        "margin of {}mm leaves no usable area on {}",
                        self.options.margin,
                        sheet.rect()
                    ),
                ));
            }
            if sheet.material != first.material || sheet.thickness != first.thickness {
                return Err(OptimizationError::invalid_sheet(
                    index,
                    "all sheets in a run must share one material and thickness",
                ));
            }
        }
        Ok(())
    }

    /// Packs the remainder onto a fresh sheet of every candidate type and keeps the one with the
    /// highest utilization. Ties go to the cheaper sheet, then to the earlier candidate.
    fn best_round(&self, remaining: &[UnitPiece]) -> Option<Round> {
        let mut best: Option<Round> = None;
        for (sheet_index, sheet) in self.sheets.iter().enumerate() {
            let mut bin = SkylineBin::new(sheet.rect(), self.options.blade_kerf, self.options.margin);
            let placed = bin.pack(remaining);
            if placed.is_empty() {
                continue;
            }
            let round = Round {
                sheet_index,
                bin,
                placed,
            };
            let better = match &best {
                None => true,
                Some(current) => self.compare_rounds(&round, current) == Ordering::Greater,
            };
            if better {
                best = Some(round);
            }
        }
        best
    }

    fn compare_rounds(&self, a: &Round, b: &Round) -> Ordering {
        let sheet_a = &self.sheets[a.sheet_index];
        let sheet_b = &self.sheets[b.sheet_index];
        // used_a / area_a vs used_b / area_b, cross-multiplied to stay exact
        let util_a = a.used_area() as u128 * sheet_b.area() as u128;
        let util_b = b.used_area() as u128 * sheet_a.area() as u128;
        util_a.cmp(&util_b).then_with(|| {
            sheet_b
                .price_per_sheet
                .total_cmp(&sheet_a.price_per_sheet)
        })
    }

    fn unplaceable(&self, remaining: &[UnitPiece]) -> OptimizationError {
        let sources: BTreeSet<usize> = remaining.iter().map(|u| u.source).collect();
        let ids: Vec<String> = sources
            .into_iter()
            .map(|i| self.pieces[i].id.clone())
            .collect();
        tracing::warn!(ids = ?ids, "pieces fit on no candidate sheet");
        OptimizationError::UnplaceablePiece { ids }
    }
}

/// Drops the placed indices (ascending) from `remaining`, keeping the order of the rest.
fn take_unplaced(remaining: Vec<UnitPiece>, placed: &[usize]) -> Vec<UnitPiece> {
    let mut placed = placed.iter().peekable();
    remaining
        .into_iter()
        .enumerate()
        .filter_map(|(i, unit)| {
            if placed.peek() == Some(&&i) {
                placed.next();
                None
            } else {
                Some(unit)
            }
        })
        .collect()
}
