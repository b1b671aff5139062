//! Error types for the mdmsm-metric crate.

/// Error type for all fallible operations in the mdmsm-metric crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetricError {
    /// Returned when a coordinate buffer does not match the requested shape.
    #[error("coordinate buffer of length {len} cannot hold {n_frames} frames of {n_atoms} atoms")]
    ShapeMismatch {
        /// Length of the flat buffer.
        len: usize,
        /// Requested number of frames.
        n_frames: usize,
        /// Requested number of atoms per frame.
        n_atoms: usize,
    },

    /// Returned when frames and the reference have different atom counts.
    #[error("atom count mismatch: frames have {frames} atoms, reference has {reference}")]
    AtomCountMismatch {
        /// Atoms per frame in the segment.
        frames: usize,
        /// Atoms in the reference frame.
        reference: usize,
    },

    /// Returned when a frame has no atoms to compare.
    #[error("frames contain no atoms")]
    NoAtoms,

    /// Returned when a coordinate is NaN or infinite.
    #[error("non-finite coordinate in frame {frame}")]
    NonFiniteCoordinate {
        /// Index of the offending frame within the segment passed to
        /// [`Metric::distances`](crate::Metric::distances). Partitioned
        /// evaluation rebases block-local indices onto that segment.
        frame: usize,
    },

    /// Returned when the reference frame holds a NaN or infinite coordinate.
    #[error("non-finite coordinate in reference frame")]
    NonFiniteReference,

    /// Returned when a frame index is outside the coordinate array.
    #[error("frame index {index} out of bounds for {n_frames} frames")]
    FrameOutOfBounds {
        /// The requested frame.
        index: usize,
        /// Number of frames available.
        n_frames: usize,
    },

    /// Returned when the partition count is zero.
    #[error("partition count must be >= 1, got {partitions}")]
    InvalidPartitions {
        /// The invalid partition count.
        partitions: usize,
    },

    /// Returned when a kernel returns the wrong number of distances.
    #[error("kernel returned {got} distances for {expected} frames")]
    OutputLengthMismatch {
        /// Number of frames passed to the kernel.
        expected: usize,
        /// Number of distances returned.
        got: usize,
    },

    /// Returned when the distance kernel fails on one partition.
    #[error("partition {index} (frames {start}..{end}) failed: {source}")]
    Partition {
        /// Zero-based partition index.
        index: usize,
        /// First frame of the partition.
        start: usize,
        /// One past the last frame of the partition.
        end: usize,
        /// The kernel error.
        #[source]
        source: Box<MetricError>,
    },

    /// Returned by external kernels plugged in through [`crate::metric_fn`].
    #[error("distance kernel failed: {reason}")]
    Kernel {
        /// Description of the kernel failure.
        reason: String,
    },
}
