//! Tessellation of line features into extruded ribbon meshes.
//!
//! A [`LineBucket`] accumulates the full vertex/index/segment output for
//! one tile-layer. It is built to completion by a single worker, frozen
//! into a [`FinishedBucket`], and moved to the render thread for the
//! one-time GPU upload. There is no concurrent access window: build and
//! render access are temporally disjoint by the handoff.

use crate::feature::{FeatureType, LineFeature};
use crate::segment::{Segment, SegmentVector};
use crate::style::{LineCap, LineJoin, LineLayout, LinePaint};
use crate::types::{diff, dist, offset_toward, perp, unit, TilePoint, EXTENT, TILE_SIZE, V2};
use crate::vertex::{LineVertex, LINE_DISTANCE_SCALE, MAX_LINE_DISTANCE};
use cgmath::InnerSpace;
use log::{debug, trace};

/// cos(37.5°). Corners whose half-angle cosine falls below this are
/// "sharp" and get isolated from their neighboring sub-segments.
const COS_HALF_SHARP_CORNER: f64 = 0.793_353_340_291_235_2;

/// Distance, in screen pixels at nominal tile size, that a sharp corner
/// is pushed away from its neighboring vertices.
const SHARP_CORNER_OFFSET: f64 = 15.0;

/// Collaborator that records data-driven paint attributes per feature.
///
/// Geometry is style-independent at build time, but paint values (color,
/// opacity, ...) may vary per feature. After each feature is tessellated
/// the bucket reports the new end of the vertex range, so the binder can
/// emit one attribute entry covering every vertex the feature produced.
pub trait PaintPropertyBinder: Send {
    /// Record attribute data for `feature`, covering the vertex range up
    /// to `vertex_length`.
    fn populate(&mut self, feature: &LineFeature, vertex_length: usize);
}

/// Join dispatch, widened with the two derived kinds that keep extrusion
/// vectors inside the fixed-point encodable range.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum JoinKind {
    Miter,
    Bevel,
    /// A miter longer than 2 half-widths, flipped across the segment.
    FlipBevel,
    /// A round join approximated by a fan of pie slices.
    FakeRound,
    /// A round join completed in the fragment shader.
    Round,
}

impl JoinKind {
    fn from_style(join: LineJoin) -> JoinKind {
        match join {
            LineJoin::Bevel => JoinKind::Bevel,
            LineJoin::Round => JoinKind::Round,
            LineJoin::Miter => JoinKind::Miter,
        }
    }
}

/// Vertex/index/segment accumulator for the line features of one
/// tile-layer.
pub struct LineBucket {
    layout: LineLayout,
    /// Factor by which the tile is rendered at a finer zoom than its
    /// native data resolution.
    overscaling: u32,
    /// Correction applied to every distance advance so dash periodicity
    /// stays consistent on overscaled tiles.
    distance_scale: f64,
    vertices: Vec<LineVertex>,
    indices: Vec<u16>,
    segments: SegmentVector,
    binders: Vec<Box<dyn PaintPropertyBinder>>,
    /// Segment-local indices of the last three emitted vertices, forming
    /// the triangle chain. -1 when disconnected.
    e1: i32,
    e2: i32,
    e3: i32,
}

impl LineBucket {
    /// Create an empty bucket.
    ///
    /// # Parameters
    ///
    /// - `layout`: Evaluated layout parameters, fixed for the build.
    /// - `overscaling`: Overscaling factor of the owning tile (>= 1).
    pub fn new(layout: LineLayout, overscaling: u32) -> LineBucket {
        assert!(overscaling >= 1);
        LineBucket {
            layout,
            overscaling,
            distance_scale: 1.0 / overscaling as f64,
            vertices: Vec::new(),
            indices: Vec::new(),
            segments: SegmentVector::new(),
            binders: Vec::new(),
            e1: -1,
            e2: -1,
            e3: -1,
        }
    }

    /// Register a paint property binder to be notified per feature.
    pub fn add_binder(&mut self, binder: Box<dyn PaintPropertyBinder>) {
        self.binders.push(binder);
    }

    /// Tessellate one feature into the bucket.
    ///
    /// Every ring/line of the feature is walked in order; afterwards each
    /// registered binder is notified with the new vertex length.
    pub fn add_feature(&mut self, feature: &LineFeature) {
        for line in &feature.geometry {
            self.add_geometry(line, feature.feature_type);
        }
        let vertex_length = self.vertices.len();
        for binder in &mut self.binders {
            binder.populate(feature, vertex_length);
        }
    }

    /// Whether any triangles have been accumulated.
    pub fn has_data(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Radius around a query point that could hit a line of this layer.
    ///
    /// Hit-testing expands a click point by this radius before running
    /// precise geometric intersection.
    pub fn query_radius(&self, paint: &LinePaint) -> f64 {
        paint.rendered_width() / 2.0 + paint.blur
    }

    /// Freeze the bucket for handoff to the render thread.
    pub fn finish(self) -> FinishedBucket {
        debug!(
            "froze line bucket: {} vertices, {} triangles, {} segments",
            self.vertices.len(),
            self.indices.len() / 3,
            self.segments.len()
        );
        FinishedBucket {
            vertices: self.vertices,
            indices: self.indices,
            segments: self.segments.into_inner(),
            binders: self.binders,
        }
    }

    /// Tessellate one line into an extruded ribbon.
    ///
    /// Walks the point sequence computing an extrusion normal per vertex
    /// and inserting join/cap geometry, emitting a vertex pair (one per
    /// ribbon edge) at every stop. Degenerate geometry tessellates to
    /// nothing.
    fn add_geometry(&mut self, coordinates: &[TilePoint], feature_type: FeatureType) {
        // Trim duplicate points off the ends, then skip past any at the
        // start. Remaining interior duplicates are skipped in the walk.
        let mut len = coordinates.len();
        while len >= 2 && coordinates[len - 1] == coordinates[len - 2] {
            len -= 1;
        }
        let mut first = 0;
        while first + 1 < len && coordinates[first] == coordinates[first + 1] {
            first += 1;
        }

        let is_polygon = feature_type == FeatureType::Polygon;
        if len < if is_polygon { 3 } else { 2 } {
            trace!("dropping degenerate line ({len} distinct points)");
            return;
        }
        let coordinates = &coordinates[..len];
        let first_coordinate = coordinates[first];

        // A ring: the wrap-around point gets a join and no caps anywhere.
        // Only explicit closure counts; an unclosed polygon ring walks as
        // an open line.
        let closed = len - first > 2 && first_coordinate == coordinates[len - 1];

        let join = JoinKind::from_style(self.layout.join);
        let miter_limit = if self.layout.join == LineJoin::Bevel {
            1.05
        } else {
            self.layout.miter_limit
        };
        let round_limit = self.layout.round_limit;
        let cap = self.layout.cap;

        let sharp_corner_offset =
            SHARP_CORNER_OFFSET * (EXTENT as f64 / (TILE_SIZE * self.overscaling as f64));

        let mut distance = 0.0;
        let mut start_of_line = true;
        let mut current_coordinate: Option<TilePoint> = None;
        let mut prev_coordinate: Option<TilePoint> = None;
        let mut prev_normal: Option<V2> = None;
        let mut next_normal: Option<V2> = None;

        // Disconnect from any previously tessellated line.
        self.e1 = -1;
        self.e2 = -1;
        self.e3 = -1;

        if closed {
            // Treat the wrap-around point as an interior vertex by seeding
            // the walk with the closing edge.
            current_coordinate = Some(coordinates[len - 2]);
            next_normal = Some(perp(unit(diff(first_coordinate, coordinates[len - 2]))));
        }

        // Coarse room estimate; exact counts depend on the joins chosen.
        self.ensure_segment((len - first) * 10);

        for i in first..len {
            let next_coordinate = if closed && i == len - 1 {
                // The last vertex of a ring is treated like the first.
                Some(coordinates[first + 1])
            } else if i + 1 < len {
                Some(coordinates[i + 1])
            } else {
                None
            };

            // Skip duplicated interior vertices.
            if next_coordinate == Some(coordinates[i]) {
                continue;
            }

            if let Some(n) = next_normal {
                prev_normal = Some(n);
            }
            if let Some(c) = current_coordinate {
                prev_coordinate = Some(c);
            }
            let current = coordinates[i];
            current_coordinate = Some(current);

            // Normal toward the next vertex. With no next vertex, pretend
            // the line continues straight.
            next_normal = next_coordinate
                .map(|next| perp(unit(diff(next, current))))
                .or(prev_normal);
            if prev_normal.is_none() {
                // Beginning of a non-closed line: a straight "join".
                prev_normal = next_normal;
            }
            let prev_normal_v = prev_normal.expect("line has at least one sub-segment");
            let next_normal_v = next_normal.expect("line has at least one sub-segment");

            // The join extrusion bisects the two sub-segment normals. At
            // 180° the normals cancel; the zero vector is kept so that
            // cos_half_angle below becomes 0 and the miter degenerates.
            let mut join_normal = prev_normal_v + next_normal_v;
            if join_normal.x != 0.0 || join_normal.y != 0.0 {
                join_normal = unit(join_normal);
            }

            let cos_half_angle =
                join_normal.x * next_normal_v.x + join_normal.y * next_normal_v.y;

            // Miter length as a ratio of the half-width: the inverse
            // cosine of the half-angle.
            let miter_length = if cos_half_angle != 0.0 {
                1.0 / cos_half_angle
            } else {
                f64::INFINITY
            };

            let is_sharp_corner = cos_half_angle < COS_HALF_SHARP_CORNER
                && prev_coordinate.is_some()
                && next_coordinate.is_some();

            // Isolate sharp corners from long incoming sub-segments so the
            // corner extrusion does not smear along them.
            if is_sharp_corner && i > first {
                let prev = prev_coordinate.expect("sharp corner has a previous vertex");
                let prev_segment_length = dist(current, prev);
                if prev_segment_length > 2.0 * sharp_corner_offset {
                    let new_prev = offset_toward(current, prev, sharp_corner_offset);
                    distance += dist(new_prev, prev) * self.distance_scale;
                    self.add_current_vertex(new_prev, &mut distance, prev_normal_v, 0.0, 0.0, false);
                    prev_coordinate = Some(new_prev);
                }
            }

            // An interior vertex gets a join; an open endpoint gets a cap.
            let middle_vertex = prev_coordinate.is_some() && next_coordinate.is_some();
            let mut current_join = join;

            if middle_vertex {
                if current_join == JoinKind::Round {
                    if miter_length < round_limit {
                        current_join = JoinKind::Miter;
                    } else if miter_length <= 2.0 {
                        current_join = JoinKind::FakeRound;
                    }
                }
                if current_join == JoinKind::Miter && miter_length > miter_limit {
                    current_join = JoinKind::Bevel;
                }
                if current_join == JoinKind::Bevel {
                    // Extrusions longer than 2 half-widths do not fit the
                    // fixed-point encoding; flip the bevel instead.
                    if miter_length > 2.0 {
                        current_join = JoinKind::FlipBevel;
                    }
                    // A bevel this small would not be visible; a miter
                    // saves a triangle.
                    if miter_length < miter_limit {
                        current_join = JoinKind::Miter;
                    }
                }
            }

            // Advance the distance-along-line to the current vertex.
            if let Some(prev) = prev_coordinate {
                if !start_of_line {
                    distance += dist(current, prev) * self.distance_scale;
                }
            }

            if middle_vertex && current_join == JoinKind::Miter {
                let scaled = join_normal * miter_length;
                self.add_current_vertex(current, &mut distance, scaled, 0.0, 0.0, false);
            } else if middle_vertex && current_join == JoinKind::FlipBevel {
                // The miter is too long; flip the direction to produce a
                // beveled join within the encodable range.
                let flipped = if miter_length > 100.0 {
                    // Almost parallel lines.
                    next_normal_v
                } else {
                    let direction = if prev_normal_v.x * next_normal_v.y
                        - prev_normal_v.y * next_normal_v.x
                        > 0.0
                    {
                        -1.0
                    } else {
                        1.0
                    };
                    let bevel_length = miter_length
                        * (prev_normal_v + next_normal_v).magnitude()
                        / (prev_normal_v - next_normal_v).magnitude();
                    perp(join_normal) * bevel_length * direction
                };
                self.add_current_vertex(current, &mut distance, flipped, 0.0, 0.0, false);
                self.add_current_vertex(current, &mut distance, flipped * -1.0, 0.0, 0.0, false);
            } else if middle_vertex
                && (current_join == JoinKind::Bevel || current_join == JoinKind::FakeRound)
            {
                let line_turns_left =
                    prev_normal_v.x * next_normal_v.y - prev_normal_v.y * next_normal_v.x > 0.0;
                let offset = -(miter_length * miter_length - 1.0).sqrt();
                let (offset_a, offset_b) = if line_turns_left {
                    (offset, 0.0)
                } else {
                    (0.0, offset)
                };

                // Close the previous sub-segment.
                if !start_of_line {
                    self.add_current_vertex(
                        current,
                        &mut distance,
                        prev_normal_v,
                        offset_a,
                        offset_b,
                        false,
                    );
                }

                if current_join == JoinKind::FakeRound {
                    // The angle is sharp enough that a single bevel
                    // triangle would be visible. Approximate the arc with
                    // pie slices, more of them for sharper angles. The
                    // count is an approximation, not exact arc math.
                    let n = ((0.5 - (cos_half_angle - 0.5)) * 8.0).floor() as i32;
                    for m in 0..n {
                        let slice_normal = unit(
                            next_normal_v * ((m as f64 + 1.0) / (n as f64 + 1.0)) + prev_normal_v,
                        );
                        self.add_pie_slice_vertex(current, distance, slice_normal, line_turns_left);
                    }
                    self.add_pie_slice_vertex(current, distance, join_normal, line_turns_left);
                    for k in (0..n).rev() {
                        let slice_normal = unit(
                            prev_normal_v * ((k as f64 + 1.0) / (n as f64 + 1.0)) + next_normal_v,
                        );
                        self.add_pie_slice_vertex(current, distance, slice_normal, line_turns_left);
                    }
                }

                // Start the next sub-segment.
                if next_coordinate.is_some() {
                    self.add_current_vertex(
                        current,
                        &mut distance,
                        next_normal_v,
                        -offset_a,
                        -offset_b,
                        false,
                    );
                }
            } else if !middle_vertex && cap == LineCap::Butt {
                // Close the previous sub-segment flush with the endpoint.
                if !start_of_line {
                    self.add_current_vertex(current, &mut distance, prev_normal_v, 0.0, 0.0, false);
                }
                // Start the next sub-segment flush with the endpoint.
                if next_coordinate.is_some() {
                    self.add_current_vertex(current, &mut distance, next_normal_v, 0.0, 0.0, false);
                }
            } else if !middle_vertex && cap == LineCap::Square {
                if !start_of_line {
                    // Close the line with a cap extended by half the width.
                    self.add_current_vertex(current, &mut distance, prev_normal_v, 1.0, 1.0, false);
                    // The cap is finished; disconnect the chain.
                    self.e1 = -1;
                    self.e2 = -1;
                }
                if next_coordinate.is_some() {
                    self.add_current_vertex(
                        current,
                        &mut distance,
                        next_normal_v,
                        -1.0,
                        -1.0,
                        false,
                    );
                }
            } else if (middle_vertex && current_join == JoinKind::Round)
                || (!middle_vertex && cap == LineCap::Round)
            {
                if !start_of_line {
                    // Close the previous sub-segment, then add the round
                    // cap/join vertices completed in the fragment shader.
                    self.add_current_vertex(current, &mut distance, prev_normal_v, 0.0, 0.0, false);
                    self.add_current_vertex(current, &mut distance, prev_normal_v, 1.0, 1.0, true);
                    self.e1 = -1;
                    self.e2 = -1;
                }
                if next_coordinate.is_some() {
                    self.add_current_vertex(current, &mut distance, next_normal_v, -1.0, -1.0, true);
                    self.add_current_vertex(current, &mut distance, next_normal_v, 0.0, 0.0, false);
                }
            }

            // Isolate sharp corners from long outgoing sub-segments.
            if is_sharp_corner && i < len - 1 {
                let next = next_coordinate.expect("sharp corner has a next vertex");
                let next_segment_length = dist(current, next);
                if next_segment_length > 2.0 * sharp_corner_offset {
                    let new_current = offset_toward(current, next, sharp_corner_offset);
                    distance += dist(new_current, current) * self.distance_scale;
                    self.add_current_vertex(
                        new_current,
                        &mut distance,
                        next_normal_v,
                        0.0,
                        0.0,
                        false,
                    );
                    current_coordinate = Some(new_current);
                }
            }

            start_of_line = false;
        }
    }

    /// Emit the vertex pair for one ribbon cross-section and chain it into
    /// the triangle strip.
    ///
    /// # Parameters
    ///
    /// - `p`: Centerline point of the cross-section.
    /// - `distance`: Accumulated distance along the line. Reset in place
    ///   when it outgrows the packed encoding.
    /// - `normal`: Extrusion normal toward the left ribbon edge.
    /// - `end_left`/`end_right`: Tangential offsets applied to the left
    ///   and right vertices, used by square caps and bevel shoulders.
    /// - `round`: Marks round cap/join vertices for the shader.
    fn add_current_vertex(
        &mut self,
        p: TilePoint,
        distance: &mut f64,
        normal: V2,
        end_left: f64,
        end_right: f64,
        round: bool,
    ) {
        self.ensure_segment(2);
        let linesofar = (*distance * LINE_DISTANCE_SCALE) as i32;

        let mut extrude = normal;
        if end_left != 0.0 {
            extrude -= perp(normal) * end_left;
        }
        let e3 = self.push_vertex(LineVertex::pack(
            p,
            extrude,
            round,
            false,
            dir_sign(end_left),
            linesofar,
        ));
        self.chain_vertex(e3);

        let mut extrude = -normal;
        if end_right != 0.0 {
            extrude -= perp(normal) * end_right;
        }
        let e3 = self.push_vertex(LineVertex::pack(
            p,
            extrude,
            round,
            true,
            dir_sign(-end_right),
            linesofar,
        ));
        self.chain_vertex(e3);

        // The packed distance saturates. When it gets close, reset to
        // zero and re-emit the cross-section so the ribbon stays
        // connected across the wrap.
        if *distance > MAX_LINE_DISTANCE / 2.0 {
            *distance = 0.0;
            self.add_current_vertex(p, distance, normal, end_left, end_right, round);
        }
    }

    /// Emit one pie-slice vertex of a fake-round join fan.
    ///
    /// The fan is anchored on the two chained vertices at the inside of
    /// the turn; each slice replaces the outer chain vertex only.
    fn add_pie_slice_vertex(
        &mut self,
        p: TilePoint,
        distance: f64,
        extrude: V2,
        line_turns_left: bool,
    ) {
        self.ensure_segment(1);
        let flipped = if line_turns_left { extrude * -1.0 } else { extrude };
        let linesofar = (distance * LINE_DISTANCE_SCALE) as i32;

        let e3 = self.push_vertex(LineVertex::pack(
            p,
            flipped,
            false,
            line_turns_left,
            0,
            linesofar,
        ));
        self.e3 = e3;
        if self.e1 >= 0 && self.e2 >= 0 {
            self.push_triangle(self.e1 as u16, self.e2 as u16, self.e3 as u16);
        }
        if line_turns_left {
            self.e2 = self.e3;
        } else {
            self.e1 = self.e3;
        }
    }

    /// Make room for `additional` vertices in the active segment.
    ///
    /// When a new segment opens, the triangle chain is broken so that no
    /// triangle ever references vertices across a segment boundary.
    fn ensure_segment(&mut self, additional: usize) {
        let opened = self
            .segments
            .ensure(additional, self.vertices.len(), self.indices.len());
        if opened {
            self.e1 = -1;
            self.e2 = -1;
            self.e3 = -1;
        }
    }

    /// Append one vertex, returning its segment-local index.
    fn push_vertex(&mut self, vertex: LineVertex) -> i32 {
        self.vertices.push(vertex);
        let segment = self.segments.active();
        let local = segment.vertex_length;
        segment.vertex_length += 1;
        debug_assert!(segment.vertex_length <= crate::segment::MAX_SEGMENT_VERTICES);
        local as i32
    }

    /// Chain a newly emitted vertex into the triangle strip.
    fn chain_vertex(&mut self, e3: i32) {
        self.e3 = e3;
        if self.e1 >= 0 && self.e2 >= 0 {
            self.push_triangle(self.e1 as u16, self.e2 as u16, self.e3 as u16);
        }
        self.e1 = self.e2;
        self.e2 = self.e3;
    }

    /// Append one triangle with segment-local indices.
    fn push_triangle(&mut self, a: u16, b: u16, c: u16) {
        let segment = self.segments.active();
        debug_assert!((a as usize) < segment.vertex_length);
        debug_assert!((b as usize) < segment.vertex_length);
        debug_assert!((c as usize) < segment.vertex_length);
        segment.index_length += 3;
        self.indices.extend_from_slice(&[a, b, c]);
    }
}

/// Tangential direction sign for the packed vertex.
fn dir_sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// A frozen bucket, ready for GPU upload.
///
/// Produced by [`LineBucket::finish`]; immutable from here on. Ownership
/// moves to the render thread, where [`FinishedBucket::upload`] attaches
/// the GPU buffers.
pub struct FinishedBucket {
    pub(crate) vertices: Vec<LineVertex>,
    pub(crate) indices: Vec<u16>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) binders: Vec<Box<dyn PaintPropertyBinder>>,
}

impl FinishedBucket {
    /// The packed vertex stream.
    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    /// The triangle index stream (segment-local 16-bit indices).
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Segment descriptors partitioning the streams.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The paint binders carried across from the build.
    pub fn binders(&self) -> &[Box<dyn PaintPropertyBinder>] {
        &self.binders
    }

    /// Whether any triangles were accumulated. Empty buckets are skipped
    /// by the renderer without uploading buffers.
    pub fn has_data(&self) -> bool {
        !self.indices.is_empty()
    }

    /// See [`LineBucket::query_radius`].
    pub fn query_radius(&self, paint: &LinePaint) -> f64 {
        paint.rendered_width() / 2.0 + paint.blur
    }
}
