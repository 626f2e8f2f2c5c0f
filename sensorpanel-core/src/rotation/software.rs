//! Software rotation
//!
//! Quarter turns walk the region in tiles so reads and writes both stay
//! within a few cache lines: 32×256 tiles for 90°/270° (the destination
//! advances down a column), 256×32 for 180°.

use crate::config::Rotation;
use crate::geometry::Area;

use super::{dest_size, map_point};

const TILE_NARROW: u32 = 32;
const TILE_WIDE: u32 = 256;

/// Tile size `(width, height)` for a rotation
pub const fn tile_size(rotation: Rotation) -> (u32, u32) {
    if rotation.swaps_axes() {
        (TILE_NARROW, TILE_WIDE)
    } else {
        (TILE_WIDE, TILE_NARROW)
    }
}

/// Copy `region` of `src` into `dst`, rotated
///
/// Bounds are checked by the caller.
pub(super) fn copy_region(
    src: &[u8],
    dst: &mut [u8],
    region: Area,
    src_w: u16,
    src_h: u16,
    rotation: Rotation,
    bpp: usize,
) {
    if rotation == Rotation::Deg0 {
        copy_rows(src, dst, region, src_w, bpp);
        return;
    }

    let (dst_w, _) = dest_size(src_w, src_h, rotation);
    let (tile_w, tile_h) = tile_size(rotation);
    let (x1, y1, x2, y2) = (
        region.x1 as u32,
        region.y1 as u32,
        region.x2 as u32,
        region.y2 as u32,
    );

    let mut ty = y1;
    while ty <= y2 {
        let ty_end = (ty + tile_h - 1).min(y2);
        let mut tx = x1;
        while tx <= x2 {
            let tx_end = (tx + tile_w - 1).min(x2);
            for y in ty..=ty_end {
                let row = y as usize * src_w as usize;
                for x in tx..=tx_end {
                    let (dx, dy) = map_point(x as u16, y as u16, src_w, src_h, rotation);
                    let s = (row + x as usize) * bpp;
                    let d = (dy as usize * dst_w as usize + dx as usize) * bpp;
                    dst[d..d + bpp].copy_from_slice(&src[s..s + bpp]);
                }
            }
            tx = tx_end + 1;
        }
        ty = ty_end + 1;
    }
}

fn copy_rows(src: &[u8], dst: &mut [u8], region: Area, width: u16, bpp: usize) {
    let len = region.width() as usize * bpp;
    for y in region.y1..=region.y2 {
        let start = (y as usize * width as usize + region.x1 as usize) * bpp;
        dst[start..start + len].copy_from_slice(&src[start..start + len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_shapes() {
        assert_eq!(tile_size(Rotation::Deg90), (32, 256));
        assert_eq!(tile_size(Rotation::Deg270), (32, 256));
        assert_eq!(tile_size(Rotation::Deg180), (256, 32));
    }

    #[test]
    fn test_180_small() {
        // 3×2 canvas, one byte per pixel
        let src = [1, 2, 3, 4, 5, 6];
        let mut dst = [0u8; 6];
        copy_region(&src, &mut dst, Area::full(3, 2), 3, 2, Rotation::Deg180, 1);
        assert_eq!(dst, [6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_90_small() {
        // 3×2 source becomes a 2×3 destination:
        //   1 2 3        4 1
        //   4 5 6   ->   5 2
        //                6 3
        let src = [1, 2, 3, 4, 5, 6];
        let mut dst = [0u8; 6];
        copy_region(&src, &mut dst, Area::full(3, 2), 3, 2, Rotation::Deg90, 1);
        assert_eq!(dst, [4, 1, 5, 2, 6, 3]);
    }

    #[test]
    fn test_270_small() {
        //   1 2 3        3 6
        //   4 5 6   ->   2 5
        //                1 4
        let src = [1, 2, 3, 4, 5, 6];
        let mut dst = [0u8; 6];
        copy_region(&src, &mut dst, Area::full(3, 2), 3, 2, Rotation::Deg270, 1);
        assert_eq!(dst, [3, 6, 2, 5, 1, 4]);
    }

    #[test]
    fn test_rows_copy_only_region() {
        let src = [9u8; 16];
        let mut dst = [0u8; 16];
        copy_region(&src, &mut dst, Area::new(1, 1, 2, 2), 4, 4, Rotation::Deg0, 1);
        assert_eq!(
            dst,
            [0, 0, 0, 0, 0, 9, 9, 0, 0, 9, 9, 0, 0, 0, 0, 0]
        );
    }
}
