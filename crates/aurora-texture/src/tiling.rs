//! Block placement inside a tiled surface.
//!
//! The block grid is cut into tile-rows [`TILE_BLOCKS`] blocks tall. Tile-rows are
//! stored top to bottom, the tiles of a tile-row left to right, and the blocks of a
//! tile column by column. Edge tiles are clipped to the grid, so the tiled surface
//! is a permutation of the linear one and never larger.

/// Tile side length, in blocks (32x32 pixels).
pub const TILE_BLOCKS: usize = 8;

/// Position of block (`bx`, `by`) in the tiled stream of a `blocks_wide`x`blocks_high` grid.
pub fn tiled_block_index(bx: usize, by: usize, blocks_wide: usize, blocks_high: usize) -> usize {
    let tile_row = by / TILE_BLOCKS;
    let rows = TILE_BLOCKS.min(blocks_high - tile_row * TILE_BLOCKS);

    let tile_row_start = tile_row * TILE_BLOCKS * blocks_wide;
    let tile_start = (bx / TILE_BLOCKS) * TILE_BLOCKS * rows;

    tile_row_start + tile_start + (bx % TILE_BLOCKS) * rows + (by % TILE_BLOCKS)
}
