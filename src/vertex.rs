//! Packed layout vertices for the line shader.
//!
//! Each vertex carries its tile position, an extrusion vector pointing to
//! one edge of the width-`w` ribbon, a handful of flag bits and the
//! cumulative distance along the line (`linesofar`, sampled downstream
//! for dash patterns). Everything is squeezed into 8 bytes:
//!
//! - `a_pos.x`: tile x doubled, low bit = round flag.
//! - `a_pos.y`: tile y doubled, low bit = upper flag (which side of the
//!   centerline the vertex extrudes to).
//! - `a_data[0..2]`: extrusion scaled by [`EXTRUDE_SCALE`] and biased by
//!   128 into unsigned bytes.
//! - `a_data[2]`: direction sign (2 bits) plus the low 6 bits of
//!   `linesofar`.
//! - `a_data[3]`: the high 8 bits of `linesofar`.

use crate::types::{TilePoint, V2};
use bytemuck::{Pod, Zeroable};

/// Fixed-point scale applied to extrusion vectors.
///
/// Extrusions are stored in signed bytes, so the largest representable
/// extrusion is `128 / EXTRUDE_SCALE` (just over twice the half-width).
pub const EXTRUDE_SCALE: f64 = 63.0;

/// Number of bits available for `linesofar` in the vertex.
pub const LINE_DISTANCE_BUFFER_BITS: u32 = 14;

/// Scale applied to line distances before packing.
///
/// There are not enough bits to store the full-precision distance, so it
/// is scaled down, trading precision for range.
pub const LINE_DISTANCE_SCALE: f64 = 1.0 / 2.0;

/// The maximum line distance, in tile units, that fits in the buffer.
pub const MAX_LINE_DISTANCE: f64 =
    ((1u32 << LINE_DISTANCE_BUFFER_BITS) as f64) / LINE_DISTANCE_SCALE;

/// One packed line vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct LineVertex {
    pub a_pos: [i16; 2],
    pub a_data: [u8; 4],
}

impl LineVertex {
    /// Pack a vertex.
    ///
    /// # Parameters
    ///
    /// - `p`: Tile position of the centerline point.
    /// - `extrude`: Extrusion vector, in half-width units. Magnitude must
    ///   stay below `128 / EXTRUDE_SCALE`.
    /// - `round`: Set for vertices that belong to round caps or joins.
    /// - `upper`: Which side of the centerline this vertex extrudes to.
    /// - `dir`: Tangential direction sign (-1, 0 or 1), used for square
    ///   caps that extend past the endpoint.
    /// - `linesofar`: Scaled cumulative distance along the line.
    pub fn pack(
        p: TilePoint,
        extrude: V2,
        round: bool,
        upper: bool,
        dir: i8,
        linesofar: i32,
    ) -> LineVertex {
        debug_assert!(linesofar >= 0);
        let dir_bits = (dir.signum() as i32 + 1) as u8;
        LineVertex {
            a_pos: [
                ((p.x as i32) * 2 | (round as i32)) as i16,
                ((p.y as i32) * 2 | (upper as i32)) as i16,
            ],
            a_data: [
                ((EXTRUDE_SCALE * extrude.x).round() as i32 + 128) as u8,
                ((EXTRUDE_SCALE * extrude.y).round() as i32 + 128) as u8,
                dir_bits | (((linesofar & 0x3F) << 2) as u8),
                (linesofar >> 6) as u8,
            ],
        }
    }

    /// Tile position of the vertex.
    pub fn position(&self) -> TilePoint {
        TilePoint::new(self.a_pos[0] >> 1, self.a_pos[1] >> 1)
    }

    /// Extrusion vector, recovered at fixed-point precision.
    pub fn extrude(&self) -> V2 {
        V2::new(
            (self.a_data[0] as f64 - 128.0) / EXTRUDE_SCALE,
            (self.a_data[1] as f64 - 128.0) / EXTRUDE_SCALE,
        )
    }

    /// Whether the round flag is set.
    pub fn is_round(&self) -> bool {
        self.a_pos[0] & 1 == 1
    }

    /// Whether the vertex extrudes to the upper side of the centerline.
    pub fn is_upper(&self) -> bool {
        self.a_pos[1] & 1 == 1
    }

    /// Scaled cumulative distance along the line.
    pub fn linesofar(&self) -> i32 {
        ((self.a_data[2] >> 2) as i32) | ((self.a_data[3] as i32) << 6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;
    use crate::compare::Tol;
    use proptest::prelude::*;

    #[test]
    fn test_flags_do_not_disturb_position() {
        let p = TilePoint::new(123, -45);
        let v = LineVertex::pack(p, V2::new(0.0, 1.0), true, true, 0, 0);
        assert_eq!(v.position(), p);
        assert!(v.is_round());
        assert!(v.is_upper());

        let v = LineVertex::pack(p, V2::new(0.0, 1.0), false, false, 0, 0);
        assert_eq!(v.position(), p);
        assert!(!v.is_round());
        assert!(!v.is_upper());
    }

    #[test]
    fn test_extrude_quantization() {
        let p = TilePoint::new(0, 0);
        let e = V2::new(-0.7071, 0.7071);
        let v = LineVertex::pack(p, e, false, false, 0, 0);
        // One quantization step is 1/63, so recovery is within half a step.
        let tol = Tol::abs(0.5 / EXTRUDE_SCALE);
        assert_close!(tol, v.extrude(), e);
    }

    #[test]
    fn test_linesofar_split_across_bytes() {
        let p = TilePoint::new(0, 0);
        let v = LineVertex::pack(p, V2::new(1.0, 0.0), false, false, 1, 0x1FFF);
        assert_eq!(v.linesofar(), 0x1FFF);
    }

    proptest! {
        /// Any distance within the 14-bit range survives packing.
        #[test]
        fn test_linesofar_roundtrip(linesofar in 0i32..(1 << LINE_DISTANCE_BUFFER_BITS)) {
            let v = LineVertex::pack(
                TilePoint::new(0, 0),
                V2::new(0.0, -1.0),
                false,
                true,
                -1,
                linesofar,
            );
            prop_assert_eq!(v.linesofar(), linesofar);
        }

        /// Packing never panics for in-range extrusions and positions.
        #[test]
        fn test_pack_positions(x in -8192i16..8192, y in -8192i16..8192) {
            let v = LineVertex::pack(
                TilePoint::new(x, y),
                V2::new(1.0, 1.0),
                false,
                false,
                0,
                0,
            );
            prop_assert_eq!(v.position(), TilePoint::new(x, y));
        }
    }
}
