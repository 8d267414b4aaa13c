//! Time-binned energy grid and segment deposition.
//!
//! The grid covers the scene's bounding box with cubic voxels. Each voxel
//! holds an energy-time histogram that grows lazily up to `max_bins` bins.
//! Ray segments are walked cell by cell with a 3D DDA (Amanatides–Woo) and
//! deposit a share of their energy into every cell they cross.

use ndarray::Array3;

use crate::error::{Error, Result, try_reserve};
use crate::geom::bboxes::BoundingBox;
use crate::sim::engine::propagation::PropagationModel;
use crate::{Point, Vector};

/// Energy-time histogram of one grid cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Voxel {
    bins: Vec<f64>,
}

impl Voxel {
    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn total_energy(&self) -> f64 {
        self.bins.iter().sum()
    }

    /// Adds `energy` to `bin`, growing the histogram with zeros as needed.
    ///
    /// Bins at or past `max_bins` are rejected with
    /// [`Error::BinOutOfRange`] and leave the voxel untouched.
    pub fn deposit(&mut self, bin: usize, energy: f64, max_bins: usize) -> Result<()> {
        if bin >= max_bins {
            return Err(Error::BinOutOfRange { bin, max_bins });
        }
        if bin >= self.bins.len() {
            let additional = bin + 1 - self.bins.len();
            try_reserve(&mut self.bins, additional, "voxel bins")?;
            self.bins.resize(bin + 1, 0.0);
        }
        self.bins[bin] += energy;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.bins.clear();
    }
}

/// Straight piece of a ray path to be deposited into the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    /// Distance from the source to `start` along the path.
    pub start_distance: f64,
    /// Energy carried along the segment, including source intensity.
    pub energy: f64,
}

impl Segment {
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

/// Tally of one or more segment depositions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepositStats {
    /// Cells that received energy.
    pub cells: usize,
    /// Deposits rejected because their time bin was beyond `max_bins`.
    pub out_of_range: usize,
    pub energy: f64,
}

impl std::ops::AddAssign for DepositStats {
    fn add_assign(&mut self, other: Self) {
        self.cells += other.cells;
        self.out_of_range += other.out_of_range;
        self.energy += other.energy;
    }
}

/// Voxel grid stored z-outermost: flat index `(z * ny + y) * nx + x`.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    /// Indexed `[z, y, x]`.
    voxels: Array3<Voxel>,
    dims: [usize; 3],
    origin: Point,
    voxel_size: f64,
    bin_width: f64,
    max_bins: usize,
}

impl VoxelGrid {
    /// Creates a grid covering `bbox` with cubes of edge `voxel_size`.
    ///
    /// Each axis gets `ceil(extent / voxel_size)` cells, and at least one so
    /// flat or empty scenes still have a grid.
    pub fn new(bbox: &BoundingBox, voxel_size: f64, bin_width: f64, max_bins: usize) -> Result<Self> {
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(Error::invalid(format!("voxel size must be > 0, got {voxel_size}")));
        }
        if !(bin_width.is_finite() && bin_width > 0.0) {
            return Err(Error::invalid(format!("bin width must be > 0, got {bin_width}")));
        }

        let extent = bbox.extent().as_array();
        let mut dims = [1usize; 3];
        for (n, e) in dims.iter_mut().zip(extent) {
            let cells = (e / voxel_size).ceil();
            if !cells.is_finite() || cells >= usize::MAX as f64 {
                return Err(Error::Allocation(format!(
                    "voxel grid axis with {cells} cells is too large"
                )));
            }
            *n = (cells as usize).max(1);
        }

        let count = dims[0]
            .checked_mul(dims[1])
            .and_then(|c| c.checked_mul(dims[2]))
            .ok_or_else(|| Error::Allocation(format!("voxel grid {dims:?} is too large")))?;

        let mut storage: Vec<Voxel> = Vec::new();
        try_reserve(&mut storage, count, "voxel grid")?;
        storage.resize_with(count, Voxel::default);
        let voxels = Array3::from_shape_vec((dims[2], dims[1], dims[0]), storage)
            .map_err(|e| Error::invalid(format!("voxel grid shape: {e}")))?;

        log::debug!(
            "Voxel grid {}x{}x{} ({count} cells), voxel size {voxel_size}, {max_bins} bins",
            dims[0],
            dims[1],
            dims[2]
        );

        Ok(Self {
            voxels,
            dims,
            origin: bbox.min,
            voxel_size,
            bin_width,
            max_bins,
        })
    }

    /// Number of cells along x, y and z.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn max_bins(&self) -> usize {
        self.max_bins
    }

    /// Box covered by the grid. May extend past the scene box on axes whose
    /// extent is not a multiple of the voxel size.
    pub fn bounds(&self) -> BoundingBox {
        let [nx, ny, nz] = self.dims;
        let s = self.voxel_size;
        BoundingBox::new(
            self.origin,
            self.origin + Vector::new(nx as f64 * s, ny as f64 * s, nz as f64 * s),
        )
    }

    /// Flat storage index of cell `(x, y, z)`.
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        let [nx, ny, _] = self.dims;
        (z * ny + y) * nx + x
    }

    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Option<&Voxel> {
        self.voxels.get((z, y, x))
    }

    /// Cell containing a world point, or `None` outside the grid.
    pub fn cell_of(&self, pt: Point) -> Option<[usize; 3]> {
        let p = (pt - self.origin) * (1.0 / self.voxel_size);
        let mut cell = [0usize; 3];
        for ((c, g), n) in cell.iter_mut().zip(p.as_array()).zip(self.dims) {
            if !(0.0..=n as f64).contains(&g) {
                return None;
            }
            // Points on the far face belong to the last cell
            *c = (g.floor() as usize).min(n - 1);
        }
        Some(cell)
    }

    pub fn voxel_at(&self, pt: Point) -> Option<&Voxel> {
        let [x, y, z] = self.cell_of(pt)?;
        self.voxel(x, y, z)
    }

    pub fn cell_center(&self, x: usize, y: usize, z: usize) -> Point {
        let s = self.voxel_size;
        self.origin
            + Vector::new(
                (x as f64 + 0.5) * s,
                (y as f64 + 0.5) * s,
                (z as f64 + 0.5) * s,
            )
    }

    /// All voxels in storage order.
    pub fn voxels(&self) -> impl Iterator<Item = &Voxel> + '_ {
        self.voxels.iter()
    }

    /// Sum of all deposited energy.
    pub fn total_energy(&self) -> f64 {
        self.voxels.iter().map(Voxel::total_energy).sum()
    }

    /// Empties every histogram.
    pub fn clear(&mut self) {
        self.voxels.iter_mut().for_each(Voxel::clear);
    }

    /// Walks `seg` through the grid and deposits its energy.
    ///
    /// Each crossed cell receives `(sub_len / seg_len) * energy * spreading`,
    /// binned by the time of flight at the middle of the crossed piece. The
    /// segment is clipped to the grid first, so parts outside the grid
    /// deposit nothing.
    pub fn deposit_segment(
        &mut self,
        seg: &Segment,
        propagation: &impl PropagationModel,
    ) -> Result<DepositStats> {
        let mut stats = DepositStats::default();

        let seg_len = seg.length();
        if seg_len <= 0.0 || !seg_len.is_finite() {
            return Ok(stats);
        }
        let dir = (seg.end - seg.start) * (1.0 / seg_len);

        let Some((t_enter, t_exit)) = self.bounds().clip_segment(seg.start, dir, 0.0, seg_len)
        else {
            return Ok(stats);
        };
        if t_exit <= t_enter {
            return Ok(stats);
        }

        // Entry point in grid units
        let entry = seg.start + dir * t_enter;
        let g = ((entry - self.origin) * (1.0 / self.voxel_size)).as_array();
        let d = dir.as_array();
        let step = dir.signum();
        let delta = dir.delta().as_array();

        let mut cell = [0i64; 3];
        let mut t_max = [f64::INFINITY; 3];
        let mut t_delta = [f64::INFINITY; 3];
        for axis in 0..3 {
            let n = self.dims[axis] as i64;
            cell[axis] = (g[axis].floor() as i64).clamp(0, n - 1);
            if step[axis] == 0 {
                continue;
            }
            t_delta[axis] = delta[axis] * self.voxel_size;
            let boundary = if step[axis] > 0 {
                (cell[axis] + 1) as f64
            } else {
                cell[axis] as f64
            };
            t_max[axis] = t_enter + (boundary - g[axis]) * self.voxel_size / d[axis];
        }

        let mut t = t_enter;
        loop {
            let axis = (0..3)
                .min_by(|&a, &b| t_max[a].total_cmp(&t_max[b]))
                .unwrap_or(0);
            let t_next = t_max[axis].min(t_exit);
            let sub_len = t_next - t;

            if sub_len > 0.0 {
                let distance = seg.start_distance + 0.5 * (t + t_next);
                let time = propagation.time_of_flight(distance);
                let bin = (time / self.bin_width).floor() as usize;
                let energy = (sub_len / seg_len) * seg.energy * propagation.spreading(distance);

                let [x, y, z] = cell.map(|c| c as usize);
                let max_bins = self.max_bins;
                match self.voxels[(z, y, x)].deposit(bin, energy, max_bins) {
                    Ok(()) => {
                        stats.cells += 1;
                        stats.energy += energy;
                    }
                    Err(Error::BinOutOfRange { .. }) => stats.out_of_range += 1,
                    Err(e) => return Err(e),
                }
            }

            if t_next >= t_exit {
                break;
            }
            t = t_next;
            cell[axis] += step[axis];
            if cell[axis] < 0 || cell[axis] >= self.dims[axis] as i64 {
                break;
            }
            t_max[axis] += t_delta[axis];
        }

        Ok(stats)
    }
}
