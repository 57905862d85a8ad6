use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn perimeter(&self) -> u64 {
        2 * (self.w as u64 + self.h as u64)
    }

    pub fn max_side(&self) -> u32 {
        self.w.max(self.h)
    }

    pub fn is_square(&self) -> bool {
        self.w == self.h
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    /// Grows both sides by `amount`, saturating on overflow.
    pub fn inflated(&self, amount: u32) -> Self {
        Self {
            w: self.w.saturating_add(amount),
            h: self.h.saturating_add(amount),
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

fn default_true() -> bool {
    true
}

/// A standard stock sheet offered for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSize {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub thickness: f64,
    #[serde(default)]
    pub price_per_sheet: f64,
}

impl SheetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            material: String::new(),
            thickness: 0.0,
            price_per_sheet: 0.0,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price_per_sheet = price;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.height)
    }

    pub fn area(&self) -> u64 {
        self.rect().area()
    }
}

/// One demand line: `quantity` identical rectangles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutPiece {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub quantity: u32,
    #[serde(default = "default_true")]
    pub can_rotate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CutPiece {
    pub fn new(id: impl Into<String>, width: u32, height: u32, quantity: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            quantity,
            can_rotate: true,
            label: None,
        }
    }

    pub fn fixed(mut self) -> Self {
        self.can_rotate = false;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedPiece {
    /// Unit identity, `{sourceId}_{index}`.
    pub piece_id: String,
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub x: u32,
    pub y: u32,
    /// Footprint including kerf, after rotation.
    pub width: u32,
    pub height: u32,
    /// Finished piece size, after rotation.
    pub cut_width: u32,
    pub cut_height: u32,
    pub rotated: bool,
}

impl PlacedPiece {
    pub fn footprint(&self) -> Rect {
        Rect::new(self.width, self.height)
    }

    pub fn cut_rect(&self) -> Rect {
        Rect::new(self.cut_width, self.cut_height)
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn top(&self) -> u32 {
        self.y + self.height
    }

    pub fn overlaps(&self, other: &PlacedPiece) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetLayout {
    /// Position of the chosen sheet among the candidates.
    pub sheet_index: usize,
    pub sheet: SheetSize,
    pub placed_pieces: Vec<PlacedPiece>,
    pub used_area: u64,
    pub utilization_percent: f64,
    pub waste_percent: f64,
}

impl SheetLayout {
    pub fn new(sheet_index: usize, sheet: SheetSize, placed_pieces: Vec<PlacedPiece>) -> Self {
        let used_area: u64 = placed_pieces.iter().map(|p| p.footprint().area()).sum();
        let utilization_percent = percent(used_area, sheet.area());
        Self {
            sheet_index,
            sheet,
            placed_pieces,
            used_area,
            utilization_percent,
            waste_percent: 100.0 - utilization_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub sheets: Vec<SheetLayout>,
    pub total_sheets: usize,
    pub total_area: u64,
    pub used_area: u64,
    pub waste_area: u64,
    pub waste_percentage: f64,
    pub utilization_percentage: f64,
    pub total_cost: f64,
    /// Sum of finished-piece perimeters; an estimate of blade travel, not a tool path.
    pub cutting_distance: u64,
    pub estimated_time_minutes: f64,
}

impl OptimizationResult {
    pub fn from_layouts(sheets: Vec<SheetLayout>, cutting_speed_mm_per_min: f64) -> Self {
        let total_area: u64 = sheets.iter().map(|s| s.sheet.area()).sum();
        let used_area: u64 = sheets.iter().map(|s| s.used_area).sum();
        let total_cost: f64 = sheets.iter().map(|s| s.sheet.price_per_sheet).sum();
        let cutting_distance: u64 = sheets
            .iter()
            .flat_map(|s| &s.placed_pieces)
            .map(|p| p.cut_rect().perimeter())
            .sum();
        let utilization_percentage = percent(used_area, total_area);
        Self {
            total_sheets: sheets.len(),
            sheets,
            total_area,
            used_area,
            waste_area: total_area - used_area,
            waste_percentage: 100.0 - utilization_percentage,
            utilization_percentage,
            total_cost,
            cutting_distance,
            estimated_time_minutes: cutting_distance as f64 / cutting_speed_mm_per_min,
        }
    }

    pub fn placed_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placed_pieces.len()).sum()
    }

    /// Placed units grouped by originating piece id.
    pub fn counts_by_piece(&self) -> BTreeMap<&str, u32> {
        let mut counts = BTreeMap::new();
        for p in self.sheets.iter().flat_map(|s| &s.placed_pieces) {
            *counts.entry(p.source_id.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
