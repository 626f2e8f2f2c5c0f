//! Accelerator-backed rotation
//!
//! The engine rotates counter-clockwise, so logical 90° is requested as
//! engine 270° and vice versa. The destination offset places the rotated
//! block where the software path would have written it.

use crate::config::{PixelFormat, Rotation};
use crate::geometry::Area;
use crate::traits::{AccelAngle, AccelError, RotationAccelerator, SrmOperation};

use super::dest_size;

/// Engine angle and destination offset for a rotated region
pub(super) fn placement(region: Area, src_w: u16, src_h: u16, rotation: Rotation) -> (AccelAngle, u16, u16) {
    let (w, h) = (src_w, src_h);
    match rotation {
        Rotation::Deg0 => (AccelAngle::Deg0, region.x1, region.y1),
        Rotation::Deg90 => (AccelAngle::Deg270, h - region.y2 - 1, region.x1),
        Rotation::Deg180 => (AccelAngle::Deg180, w - region.x2 - 1, h - region.y2 - 1),
        Rotation::Deg270 => (AccelAngle::Deg90, region.y1, w - region.x2 - 1),
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn copy_region<A: RotationAccelerator>(
    accel: &mut A,
    src: &[u8],
    dst: &mut [u8],
    region: Area,
    src_w: u16,
    src_h: u16,
    rotation: Rotation,
    format: PixelFormat,
) -> Result<(), AccelError> {
    let (angle, dst_x, dst_y) = placement(region, src_w, src_h, rotation);
    let (dst_width, dst_height) = dest_size(src_w, src_h, rotation);

    accel.scale_rotate_mirror(SrmOperation {
        src,
        src_width: src_w,
        src_height: src_h,
        block_x: region.x1,
        block_y: region.y1,
        block_width: region.width() as u16,
        block_height: region.height() as u16,
        dst,
        dst_width,
        dst_height,
        dst_x,
        dst_y,
        format,
        angle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_matches_mapping() {
        let region = Area::new(10, 10, 20, 15);
        let (angle, x, y) = placement(region, 480, 800, Rotation::Deg90);
        assert_eq!(angle, AccelAngle::Deg270);
        assert_eq!((x, y), (784, 10));

        let (angle, x, y) = placement(region, 480, 800, Rotation::Deg270);
        assert_eq!(angle, AccelAngle::Deg90);
        assert_eq!((x, y), (10, 459));

        let (angle, x, y) = placement(region, 480, 800, Rotation::Deg180);
        assert_eq!(angle, AccelAngle::Deg180);
        assert_eq!((x, y), (459, 784));
    }
}
