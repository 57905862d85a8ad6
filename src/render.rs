//! Plain-text reports: an ASCII cut diagram per sheet and a cut-list for a whole run.

use std::fmt::Write;

use crate::types::{OptimizationResult, SheetLayout};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

pub fn render_sheet(layout: &SheetLayout) -> String {
    let sheet = layout.sheet.rect();
    let scale = f64::min(MAX_WIDTH / sheet.w as f64, MAX_HEIGHT / sheet.h as f64);
    let grid_w = (sheet.w as f64 * scale).round() as usize;
    let grid_h = (sheet.h as f64 * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for p in &layout.placed_pieces {
        let sx = (p.x as f64 * scale).round() as usize;
        let sy = (p.y as f64 * scale).round() as usize;
        let sw = (p.width as f64 * scale).round() as usize;
        let sh = (p.height as f64 * scale).round() as usize;

        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        // Only write the id where it fits inside the box.
        let label: Vec<char> = p.source_id.chars().collect();
        if sw > 2 && sh > 1 && label.len() < sw - 1 {
            let cy = sy + sh / 2;
            let start_x = (sx + sw / 2).saturating_sub(label.len() / 2).max(sx + 1);
            for (i, &ch) in label.iter().enumerate() {
                let x = start_x + i;
                if x < sx + sw && cy < grid.len() && x < grid[cy].len() {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

#[allow(clippy::needless_range_loop)]
fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = if rows > 0 { grid[0].len() } else { return };

    for i in x..=x + w {
        if i >= cols {
            break;
        }
        for row in [y, y + h] {
            if row < rows {
                grid[row][i] = edge(grid[row][i], '-');
            }
        }
    }

    for j in y..=y + h {
        if j >= rows {
            break;
        }
        for col in [x, x + w] {
            if col < cols {
                grid[j][col] = edge(grid[j][col], '|');
            }
        }
    }

    for cx in [x, x + w] {
        for cy in [y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}

/// Crossing lines become a corner.
fn edge(current: char, line: char) -> char {
    match (current, line) {
        ('+', _) | ('|', '-') | ('-', '|') => '+',
        _ => line,
    }
}

/// Per-sheet listing of every piece to cut, followed by run totals.
pub fn cut_list(result: &OptimizationResult) -> String {
    let mut out = String::new();
    for (i, layout) in result.sheets.iter().enumerate() {
        let sheet = &layout.sheet;
        let _ = write!(out, "Sheet {}/{}: {}", i + 1, result.total_sheets, sheet.rect());
        if !sheet.material.is_empty() {
            let _ = write!(out, " {}", sheet.material);
        }
        if sheet.thickness > 0.0 {
            let _ = write!(out, " {}mm", sheet.thickness);
        }
        let _ = writeln!(out, ", {:.1}% used", layout.utilization_percent);

        for p in &layout.placed_pieces {
            let _ = write!(out, "  {:<12} {} @ ({}, {})", p.piece_id, p.cut_rect(), p.x, p.y);
            if p.rotated {
                out.push_str(" [rotated]");
            }
            if let Some(label) = &p.label {
                let _ = write!(out, " {label}");
            }
            out.push('\n');
        }
    }

    let _ = writeln!(
        out,
        "Summary: {} sheet{}, {:.1}% waste, cost {:.2}, {:.2} m cut, ~{:.1} min",
        result.total_sheets,
        if result.total_sheets == 1 { "" } else { "s" },
        result.waste_percentage,
        result.total_cost,
        result.cutting_distance as f64 / 1000.0,
        result.estimated_time_minutes,
    );
    out
}
