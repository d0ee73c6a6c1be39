//! Submaps and the rolling two-submap rotation.
//!
//! Except during initialization, there are always two submaps taking
//! insertions: an older one used for scan matching and a newer one
//! still being initialized. Once the newer submap has seen
//! `num_range_data` scans it takes over matching, the older submap is
//! finished and dropped from the rotation. External holders of the
//! shared handle keep reading the finished, now immutable, submap.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::config::{ConfigError, LocalSlamConfig};
use crate::core::{Point2D, Pose2D, RangeData};
use crate::grid::{
    CellDims, GridError, MapLimits, ProbabilityGrid, RangeDataInserter,
};

/// Cells per side of a freshly created submap grid; it grows on demand.
const INITIAL_SUBMAP_CELLS: i32 = 100;

/// Errors from submap insertion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmapError {
    /// The submap was already finished.
    #[error("cannot insert range data into a finished submap")]
    Finished,

    /// The underlying grid rejected an access.
    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Debug)]
struct SubmapInner {
    grid: ProbabilityGrid,
    num_range_data: u32,
    finished: bool,
}

/// One locally-consistent occupancy grid built from consecutive scans.
///
/// The single ingest context is the only mutator; the mutex exists so
/// `finish` publication and `grid_copy` snapshots are race-free against
/// concurrent readers, and is uncontended on the insertion path.
#[derive(Debug)]
pub struct Submap {
    local_pose: Pose2D,
    inner: Mutex<SubmapInner>,
}

impl Submap {
    /// Create an unfinished submap whose grid is centered on `origin`.
    pub fn new(resolution: f32, origin: Point2D) -> Self {
        let half_extent = 0.5 * INITIAL_SUBMAP_CELLS as f32 * resolution;
        let limits = MapLimits::new(
            resolution,
            Point2D::new(origin.x + half_extent, origin.y + half_extent),
            CellDims::new(INITIAL_SUBMAP_CELLS, INITIAL_SUBMAP_CELLS),
        );
        Self {
            local_pose: Pose2D::new(origin.x, origin.y, 0.0),
            inner: Mutex::new(SubmapInner {
                grid: ProbabilityGrid::new(limits),
                num_range_data: 0,
                finished: false,
            }),
        }
    }

    /// Pose of this submap in the local SLAM frame.
    #[inline]
    pub fn local_pose(&self) -> Pose2D {
        self.local_pose
    }

    /// Number of scans inserted so far.
    pub fn num_range_data(&self) -> u32 {
        self.inner.lock().num_range_data
    }

    /// Whether the submap has been finished.
    pub fn finished(&self) -> bool {
        self.inner.lock().finished
    }

    /// Deep copy of the grid for read-only consumers.
    ///
    /// Blocks concurrent insertion only for the duration of the copy.
    pub fn grid_copy(&self) -> ProbabilityGrid {
        self.inner.lock().grid.clone()
    }

    /// Run `f` against the live grid without copying it.
    pub fn with_grid<R>(&self, f: impl FnOnce(&ProbabilityGrid) -> R) -> R {
        f(&self.inner.lock().grid)
    }

    /// Insert `range_data`. The submap must not be finished.
    pub fn insert_range_data(
        &self,
        range_data: &RangeData,
        inserter: &RangeDataInserter,
    ) -> Result<(), SubmapError> {
        let mut inner = self.inner.lock();
        if inner.finished {
            return Err(SubmapError::Finished);
        }
        inserter.insert(range_data, &mut inner.grid)?;
        inner.num_range_data += 1;
        Ok(())
    }

    /// Publish this submap as finished; the grid is immutable afterwards.
    pub fn finish(&self) {
        self.inner.lock().finished = true;
    }
}

/// The rolling pair of submaps receiving insertions.
pub struct ActiveSubmaps {
    resolution: f32,
    num_range_data: u32,
    inserter: RangeDataInserter,
    matching_submap_index: usize,
    submaps: Vec<Arc<Submap>>,
}

impl ActiveSubmaps {
    /// Create an empty rotation; the first scan creates the first submap.
    pub fn new(config: &LocalSlamConfig) -> Result<Self, ConfigError> {
        if !(config.resolution > 0.0) {
            return Err(ConfigError::InvalidResolution(config.resolution));
        }
        if config.num_range_data < 1 {
            return Err(ConfigError::InvalidNumRangeData);
        }
        Ok(Self {
            resolution: config.resolution,
            num_range_data: config.num_range_data,
            inserter: RangeDataInserter::new(config.inserter)?,
            matching_submap_index: 0,
            submaps: Vec::new(),
        })
    }

    /// Index of the submap currently used for scan matching.
    /// Monotonically non-decreasing across the run.
    #[inline]
    pub fn matching_index(&self) -> usize {
        self.matching_submap_index
    }

    /// The submap scans are matched against, once one exists.
    pub fn matching_submap(&self) -> Option<&Arc<Submap>> {
        self.submaps.first()
    }

    /// Shared handles to the active submaps, oldest first.
    pub fn submaps(&self) -> &[Arc<Submap>] {
        &self.submaps
    }

    /// Insert `range_data` into every active submap and advance the
    /// rotation when the newest submap reaches the scan threshold.
    ///
    /// Returns handles to the submaps the scan was inserted into.
    pub fn insert_range_data(
        &mut self,
        range_data: &RangeData,
    ) -> Result<Vec<Arc<Submap>>, SubmapError> {
        if self.submaps.is_empty() {
            self.add_submap(range_data.origin);
        }
        for submap in &self.submaps {
            submap.insert_range_data(range_data, &self.inserter)?;
        }
        let insertion_submaps = self.submaps.to_vec();
        let newest_full = self
            .submaps
            .last()
            .is_some_and(|s| s.num_range_data() == self.num_range_data);
        if newest_full {
            self.add_submap(range_data.origin);
        }
        Ok(insertion_submaps)
    }

    fn add_submap(&mut self, origin: Point2D) {
        if self.submaps.len() > 1 {
            self.submaps[0].finish();
            let retired = self.submaps.remove(0);
            self.matching_submap_index += 1;
            log::debug!(
                "retired submap with {} scans; matching index now {}",
                retired.num_range_data(),
                self.matching_submap_index
            );
        }
        self.submaps.push(Arc::new(Submap::new(self.resolution, origin)));
    }
}
