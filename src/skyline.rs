use crate::expand::UnitPiece;
use crate::types::{PlacedPiece, Rect};

/// A free stretch of the top profile: everything above `y` between `x` and `x + width` is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkylineSegment {
    pub x: u32,
    pub y: u32,
    pub width: u32,
}

impl SkylineSegment {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }
}

/// Packs pieces onto a single sheet by keeping the skyline of what has been placed so far.
#[derive(Debug, Clone)]
pub struct SkylineBin {
    kerf: u32,
    /// Highest usable y coordinate (sheet height minus margin).
    ceiling: u32,
    segments: Vec<SkylineSegment>,
    placements: Vec<PlacedPiece>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredPlacement {
    pub segment_idx: usize,
    pub rotated: bool,
    /// Wasted area beside the piece, then resulting top edge, then x.
    pub score: (u64, u32, u32),
}

impl SkylineBin {
    pub fn new(sheet: Rect, kerf: u32, margin: u32) -> Self {
        let usable_w = sheet.w.saturating_sub(margin.saturating_mul(2));
        Self {
            kerf,
            ceiling: sheet.h.saturating_sub(margin),
            segments: vec![SkylineSegment {
                x: margin,
                y: margin,
                width: usable_w,
            }],
            placements: Vec::new(),
        }
    }

    pub fn into_placements(self) -> Vec<PlacedPiece> {
        self.placements
    }

    pub fn used_area(&self) -> u64 {
        self.placements.iter().map(|p| p.footprint().area()).sum()
    }

    /// Places as many of `pieces` as fit, in order, and returns the indices that were placed.
    /// Pieces that fit nowhere are skipped and left to the caller.
    pub fn pack(&mut self, pieces: &[UnitPiece]) -> Vec<usize> {
        let mut placed = Vec::new();
        for (i, unit) in pieces.iter().enumerate() {
            if let Some(scored) = self.find_best(unit.rect, unit.can_rotate) {
                self.place(scored, unit);
                placed.push(i);
            }
        }
        placed
    }

    /// Best-fit search over every segment and allowed orientation.
    pub fn find_best(&self, piece: Rect, allow_rotate: bool) -> Option<ScoredPlacement> {
        let orientations: &[bool] = if allow_rotate && !piece.is_square() {
            &[false, true]
        } else {
            &[false]
        };

        let mut best: Option<ScoredPlacement> = None;
        for &rotated in orientations {
            let cut = if rotated { piece.rotated() } else { piece };
            let footprint = cut.inflated(self.kerf);
            for (idx, seg) in self.segments.iter().enumerate() {
                if let Some(score) = self.score(seg, footprint)
                    && best.is_none_or(|b| score < b.score)
                {
                    best = Some(ScoredPlacement {
                        segment_idx: idx,
                        rotated,
                        score,
                    });
                }
            }
        }
        best
    }

    fn score(&self, seg: &SkylineSegment, footprint: Rect) -> Option<(u64, u32, u32)> {
        if seg.width < footprint.w {
            return None;
        }
        let top = seg.y.checked_add(footprint.h)?;
        if top > self.ceiling {
            return None;
        }
        let waste = (seg.width - footprint.w) as u64 * footprint.h as u64;
        Some((waste, top, seg.x))
    }

    pub fn place(&mut self, scored: ScoredPlacement, unit: &UnitPiece) -> PlacedPiece {
        let seg = self.segments[scored.segment_idx];
        let cut = if scored.rotated {
            unit.rect.rotated()
        } else {
            unit.rect
        };
        let footprint = cut.inflated(self.kerf);

        let placement = PlacedPiece {
            piece_id: unit.id.clone(),
            source_id: unit.source_id.clone(),
            label: unit.label.clone(),
            x: seg.x,
            y: seg.y,
            width: footprint.w,
            height: footprint.h,
            cut_width: cut.w,
            cut_height: cut.h,
            rotated: scored.rotated,
        };

        self.split(scored.segment_idx, footprint);
        self.merge();
        self.placements.push(placement.clone());

        placement
    }

    /// Raises the part of the segment under the piece; the rest stays at the old height.
    fn split(&mut self, idx: usize, footprint: Rect) {
        let seg = self.segments[idx];
        self.segments[idx] = SkylineSegment {
            x: seg.x,
            y: seg.y + footprint.h,
            width: footprint.w,
        };
        let rest = seg.width - footprint.w;
        if rest > 0 {
            self.segments.insert(
                idx + 1,
                SkylineSegment {
                    x: seg.x + footprint.w,
                    y: seg.y,
                    width: rest,
                },
            );
        }
    }

    fn merge(&mut self) {
        let mut i = 1;
        while i < self.segments.len() {
            if self.segments[i - 1].y == self.segments[i].y {
                self.segments[i - 1].width += self.segments[i].width;
                self.segments.remove(i);
            } else {
                i += 1;
            }
        }
    }
}
