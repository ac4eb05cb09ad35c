//! Grid tiling arithmetic: places one browser window inside a `cols x rows`
//! grid tiled across a screen resolution.
//!
//! Grounded on `_calc_tile_bounds` in
//! `original_source/.../playwright_script_executor_agent.py`: clamp the tile
//! index into range, divide the screen into evenly spaced cells separated by
//! a fixed margin, and return the pixel bounds of one cell. Pure arithmetic,
//! not imported from the grounding repo (it has no windowing code of its
//! own) — an ordinary floating-point-free port of the original's integer math.

use qa_core_utils::WindowBounds;

pub const DEFAULT_MARGIN_PX: i32 = 8;
pub const MIN_CELL_WIDTH: i32 = 200;
pub const MIN_CELL_HEIGHT: i32 = 150;

/// `index` is clamped to `[0, cols*rows)`. A non-positive `cols`/`rows` is
/// treated as `1` so the grid always has at least one tile.
pub fn tile_bounds(index: u32, cols: u32, rows: u32, screen_w: i32, screen_h: i32) -> WindowBounds {
    let cols = cols.max(1) as i32;
    let rows = rows.max(1) as i32;
    let total = (cols * rows).max(1);
    let index = index.min(total as u32 - 1) as i32;

    let cell_w = ((screen_w - (cols + 1) * DEFAULT_MARGIN_PX) / cols).max(MIN_CELL_WIDTH);
    let cell_h = ((screen_h - (rows + 1) * DEFAULT_MARGIN_PX) / rows).max(MIN_CELL_HEIGHT);

    let r = index / cols;
    let c = index % cols;

    WindowBounds {
        left: DEFAULT_MARGIN_PX + c * (cell_w + DEFAULT_MARGIN_PX),
        top: DEFAULT_MARGIN_PX + r * (cell_h + DEFAULT_MARGIN_PX),
        width: cell_w,
        height: cell_h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tile_is_top_left() {
        let bounds = tile_bounds(0, 5, 2, 1920, 1080);
        assert_eq!(bounds.left, DEFAULT_MARGIN_PX);
        assert_eq!(bounds.top, DEFAULT_MARGIN_PX);
    }

    #[test]
    fn test_second_row_starts_after_first_row_height() {
        let first = tile_bounds(0, 5, 2, 1920, 1080);
        let sixth = tile_bounds(5, 5, 2, 1920, 1080);
        assert_eq!(sixth.top, first.top + first.height + DEFAULT_MARGIN_PX);
        assert_eq!(sixth.left, first.left);
    }

    #[test]
    fn test_out_of_range_index_clamps_to_last_tile() {
        let last = tile_bounds(9, 5, 2, 1920, 1080);
        let overflowing = tile_bounds(999, 5, 2, 1920, 1080);
        assert_eq!(last.left, overflowing.left);
        assert_eq!(last.top, overflowing.top);
    }

    #[test]
    fn test_cell_size_has_a_floor_on_tiny_screens() {
        let bounds = tile_bounds(0, 10, 10, 100, 100);
        assert_eq!(bounds.width, MIN_CELL_WIDTH);
        assert_eq!(bounds.height, MIN_CELL_HEIGHT);
    }

    #[test]
    fn test_zero_grid_dims_treated_as_one() {
        let bounds = tile_bounds(0, 0, 0, 1920, 1080);
        assert!(bounds.width > 0 && bounds.height > 0);
    }
}
