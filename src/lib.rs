//! Tessellation of map-tile line features into GPU-ready triangle meshes.
//!
//! Line features arrive as polylines in integer tile coordinates. A
//! [`LineBucket`] turns them into extruded ribbons: per-vertex extrusion
//! normals (the vertex shader applies the actual line width), join and
//! cap geometry, and a packed distance-along-line for dash patterns. The
//! output is partitioned into [`Segment`]s so 16-bit indices suffice.
//!
//! The lifecycle is a one-way handoff. A worker builds a bucket to
//! completion and freezes it with [`LineBucket::finish`]; the resulting
//! [`FinishedBucket`] moves to the render thread, which attaches GPU
//! buffers via [`FinishedBucket::upload`].

pub mod compare;

mod bucket;
mod feature;
mod segment;
mod style;
mod types;
mod upload;
mod vertex;

pub use bucket::{FinishedBucket, LineBucket, PaintPropertyBinder};
pub use feature::{FeatureType, LineFeature, PropertyValue};
pub use segment::{Segment, MAX_SEGMENT_VERTICES};
pub use style::{LineCap, LineJoin, LineLayout, LinePaint};
pub use types::{TilePoint, EXTENT, P2, TILE_SIZE, V2};
pub use upload::UploadedBucket;
pub use vertex::{
    LineVertex, EXTRUDE_SCALE, LINE_DISTANCE_BUFFER_BITS, LINE_DISTANCE_SCALE, MAX_LINE_DISTANCE,
};
