//! GPU-addressable sub-ranges of the vertex and index buffers.
//!
//! Triangle indices are 16-bit, so a single draw can only address 2^16
//! vertices. The accumulated vertex/index streams are therefore cut into
//! segments, each with its own vertex base; indices inside a segment are
//! relative to that base.

/// Ceiling on the number of vertices addressable within one segment.
pub const MAX_SEGMENT_VERTICES: usize = u16::MAX as usize;

/// A contiguous sub-range of the vertex and index buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Absolute offset of this segment's first vertex.
    pub vertex_offset: usize,
    /// Absolute offset of this segment's first index.
    pub index_offset: usize,
    /// Number of vertices owned by this segment.
    pub vertex_length: usize,
    /// Number of indices owned by this segment.
    pub index_length: usize,
}

impl Segment {
    /// Create an empty segment based at the given buffer offsets.
    pub fn new(vertex_offset: usize, index_offset: usize) -> Segment {
        Segment {
            vertex_offset,
            index_offset,
            vertex_length: 0,
            index_length: 0,
        }
    }
}

/// Ordered list of segments partitioning the accumulated buffers.
#[derive(Debug, Default)]
pub struct SegmentVector {
    segments: Vec<Segment>,
}

impl SegmentVector {
    pub fn new() -> SegmentVector {
        SegmentVector {
            segments: Vec::new(),
        }
    }

    /// Make sure a segment with room for `additional` vertices is open.
    ///
    /// A new segment is started when none is open, or when the active
    /// segment already holds vertices and adding `additional` more would
    /// exceed [`MAX_SEGMENT_VERTICES`]. A fresh segment is based at the
    /// current absolute buffer lengths, so segment ranges tile the
    /// buffers without gaps or overlaps.
    ///
    /// # Parameters
    ///
    /// - `additional`: Number of vertices the caller is about to append.
    /// - `vertex_len`: Current absolute length of the vertex buffer.
    /// - `index_len`: Current absolute length of the index buffer.
    ///
    /// # Returns
    ///
    /// `true` if a new segment was opened.
    pub fn ensure(&mut self, additional: usize, vertex_len: usize, index_len: usize) -> bool {
        let open_new = match self.segments.last() {
            None => true,
            Some(active) => {
                active.vertex_length > 0
                    && active.vertex_length + additional > MAX_SEGMENT_VERTICES
            }
        };
        if open_new {
            self.segments.push(Segment::new(vertex_len, index_len));
        }
        open_new
    }

    /// The segment currently being written.
    ///
    /// Must not be called before [`SegmentVector::ensure`] has opened one.
    pub fn active(&mut self) -> &mut Segment {
        debug_assert!(!self.segments.is_empty());
        self.segments.last_mut().unwrap()
    }

    /// Read-only view of all segments.
    pub fn as_slice(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Consume the vector, yielding the segment list.
    pub fn into_inner(self) -> Vec<Segment> {
        self.segments
    }
}
