//! One-time GPU buffer attachment for finished buckets.
//!
//! Upload happens on the render thread, which owns the device. The
//! finished bucket is consumed; the CPU-side copies of the streams are
//! dropped once the buffers exist.

use crate::bucket::FinishedBucket;
use crate::segment::Segment;
use log::trace;
use wgpu::util::DeviceExt;

/// A bucket whose streams live on the GPU.
///
/// Drawing iterates the segments, binding each one's sub-range of the
/// vertex buffer as the base for its 16-bit indices.
pub struct UploadedBucket {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    segments: Vec<Segment>,
}

impl FinishedBucket {
    /// Create GPU buffers for the vertex and index streams.
    ///
    /// Empty buckets must be filtered out with
    /// [`FinishedBucket::has_data`] before upload.
    pub fn upload(self, device: &wgpu::Device) -> UploadedBucket {
        assert!(self.has_data());
        trace!(
            "uploading line bucket: {} vertex bytes, {} index bytes",
            std::mem::size_of_val(self.vertices.as_slice()),
            std::mem::size_of_val(self.indices.as_slice()),
        );
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Linemesh: line vertices"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Linemesh: line indices"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        UploadedBucket {
            vertex_buffer,
            index_buffer,
            segments: self.segments,
        }
    }
}

impl UploadedBucket {
    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    /// Segment descriptors partitioning the uploaded streams.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}
