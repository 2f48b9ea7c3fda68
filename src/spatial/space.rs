//! Z-order spaces
//!
//! A space has inclusive integer bounds per dimension. Coordinates are
//! offset from the low bound and need `x_bits[d]` bits; a z-value interleaves
//! those bits, most significant first, in the order given by `interleave`.
//! Z-values are right-justified in a `u64` and use `z_bits` bits.

use super::errors::{SpatialError, SpatialResult};

/// Largest supported dimensionality
pub const MAX_DIMENSIONS: usize = 6;

/// Largest supported z-value width
pub const MAX_Z_BITS: u32 = 57;

/// An axis-aligned box with inclusive bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxRegion {
    pub lo: Vec<i64>,
    pub hi: Vec<i64>,
}

impl BoxRegion {
    pub fn new(lo: Vec<i64>, hi: Vec<i64>) -> Self {
        Self { lo, hi }
    }

    pub fn dimensions(&self) -> usize {
        self.lo.len()
    }

    /// Returns true if `point` lies inside the box
    pub fn contains(&self, point: &[i64]) -> bool {
        point.len() == self.lo.len()
            && point
                .iter()
                .zip(self.lo.iter().zip(&self.hi))
                .all(|(x, (lo, hi))| lo <= x && x <= hi)
    }
}

/// A node of the z-order trie: the first `level` bits of a z-value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZCell {
    /// Leading z bits, right-justified
    pub bits: u64,
    pub level: u32,
}

impl ZCell {
    /// The cell covering the whole space
    pub fn root() -> Self {
        Self { bits: 0, level: 0 }
    }

    /// The two halves of this cell
    pub fn children(&self) -> [ZCell; 2] {
        let left = ZCell {
            bits: self.bits << 1,
            level: self.level + 1,
        };
        let right = ZCell {
            bits: left.bits | 1,
            level: left.level,
        };
        [left, right]
    }
}

/// Inclusive range of z-values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZInterval {
    pub lo: u64,
    pub hi: u64,
}

impl ZInterval {
    pub fn contains(&self, z: u64) -> bool {
        self.lo <= z && z <= self.hi
    }
}

/// A bounded space and its z-order mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    lo: Vec<i64>,
    hi: Vec<i64>,
    interleave: Vec<usize>,
    x_bits: Vec<u32>,
    /// For z bit `p`, its position within the coordinate of `interleave[p]`,
    /// counted from the most significant bit
    zx: Vec<u32>,
    z_bits: u32,
}

impl Space {
    /// Space with the default interleave, cycling through dimensions
    pub fn new(lo: Vec<i64>, hi: Vec<i64>) -> SpatialResult<Self> {
        Self::build(lo, hi, None)
    }

    /// Space with an explicit interleave of length `z_bits`
    pub fn with_interleave(
        lo: Vec<i64>,
        hi: Vec<i64>,
        interleave: Vec<usize>,
    ) -> SpatialResult<Self> {
        Self::build(lo, hi, Some(interleave))
    }

    fn build(lo: Vec<i64>, hi: Vec<i64>, interleave: Option<Vec<usize>>) -> SpatialResult<Self> {
        let dimensions = lo.len();
        if dimensions == 0 || dimensions > MAX_DIMENSIONS {
            return Err(SpatialError::InvalidDimensions(dimensions));
        }
        if hi.len() != dimensions {
            return Err(SpatialError::DimensionMismatch {
                expected: dimensions,
                actual: hi.len(),
            });
        }
        let mut x_bits = Vec::with_capacity(dimensions);
        for d in 0..dimensions {
            if lo[d] >= hi[d] {
                return Err(SpatialError::InvalidBounds {
                    dimension: d,
                    lo: lo[d],
                    hi: hi[d],
                });
            }
            let n = hi[d] as i128 - lo[d] as i128 + 1;
            let mut bits = 0u32;
            while (1i128 << bits) < n {
                bits += 1;
            }
            x_bits.push(bits);
        }
        let z_bits: u32 = x_bits.iter().sum();
        if z_bits > MAX_Z_BITS {
            return Err(SpatialError::TooManyBits(z_bits));
        }

        let interleave = match interleave {
            Some(pattern) => pattern,
            None => {
                // Round robin over dimensions that still have bits left
                let mut left = x_bits.clone();
                let mut pattern = Vec::with_capacity(z_bits as usize);
                let mut d = 0;
                while pattern.len() < z_bits as usize {
                    if left[d] > 0 {
                        left[d] -= 1;
                        pattern.push(d);
                    }
                    d = (d + 1) % dimensions;
                }
                pattern
            }
        };
        if interleave.len() != z_bits as usize {
            return Err(SpatialError::InvalidInterleave(format!(
                "length {} does not match {} z bits",
                interleave.len(),
                z_bits
            )));
        }
        let mut seen = vec![0u32; dimensions];
        let mut zx = Vec::with_capacity(interleave.len());
        for (p, d) in interleave.iter().enumerate() {
            if *d >= dimensions {
                return Err(SpatialError::InvalidInterleave(format!(
                    "position {} refers to dimension {}",
                    p, d
                )));
            }
            zx.push(seen[*d]);
            seen[*d] += 1;
        }
        if seen != x_bits {
            return Err(SpatialError::InvalidInterleave(format!(
                "bits per dimension {:?}, expected {:?}",
                seen, x_bits
            )));
        }

        Ok(Self {
            lo,
            hi,
            interleave,
            x_bits,
            zx,
            z_bits,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.lo.len()
    }

    pub fn z_bits(&self) -> u32 {
        self.z_bits
    }

    pub fn lo(&self) -> &[i64] {
        &self.lo
    }

    pub fn hi(&self) -> &[i64] {
        &self.hi
    }

    /// Offset of `value` from the low bound of `dimension`
    fn offset(&self, dimension: usize, value: i64) -> SpatialResult<u64> {
        if value < self.lo[dimension] || value > self.hi[dimension] {
            return Err(SpatialError::OutOfBounds { dimension, value });
        }
        Ok((value as i128 - self.lo[dimension] as i128) as u64)
    }

    /// Z-value of a point at full resolution
    pub fn shuffle(&self, point: &[i64]) -> SpatialResult<u64> {
        if point.len() != self.dimensions() {
            return Err(SpatialError::DimensionMismatch {
                expected: self.dimensions(),
                actual: point.len(),
            });
        }
        let mut offsets = Vec::with_capacity(point.len());
        for (d, x) in point.iter().enumerate() {
            offsets.push(self.offset(d, *x)?);
        }
        let mut z = 0u64;
        for (p, d) in self.interleave.iter().enumerate() {
            let shift = self.x_bits[*d] - 1 - self.zx[p];
            z = (z << 1) | ((offsets[*d] >> shift) & 1);
        }
        Ok(z)
    }

    /// Point with z-value `z`, the inverse of [`Space::shuffle`].
    ///
    /// Fails if `z` is wider than the space or decodes past a high bound.
    pub fn unshuffle(&self, z: u64) -> SpatialResult<Vec<i64>> {
        if z >> self.z_bits != 0 {
            return Err(SpatialError::InvalidZ(z as i128));
        }
        let mut offsets = vec![0u64; self.dimensions()];
        for (p, d) in self.interleave.iter().enumerate() {
            let bit = (z >> (self.z_bits as usize - 1 - p)) & 1;
            offsets[*d] |= bit << (self.x_bits[*d] - 1 - self.zx[p]);
        }
        let mut point = Vec::with_capacity(offsets.len());
        for (d, offset) in offsets.into_iter().enumerate() {
            let value = self.lo[d] as i128 + offset as i128;
            if value > self.hi[d] as i128 {
                return Err(SpatialError::InvalidZ(z as i128));
            }
            point.push(value as i64);
        }
        Ok(point)
    }

    /// Z-values covered by `cell`
    pub fn interval(&self, cell: ZCell) -> ZInterval {
        let free = self.z_bits - cell.level;
        let lo = cell.bits << free;
        let hi = lo | ((1u64 << free) - 1);
        ZInterval { lo, hi }
    }

    /// Coordinate ranges covered by `cell`, one inclusive `(lo, hi)` per
    /// dimension. Ranges may extend past the high bound of the space.
    pub fn cell_region(&self, cell: ZCell) -> Vec<(i128, i128)> {
        let dimensions = self.dimensions();
        let mut fixed = vec![0u32; dimensions];
        let mut offsets = vec![0u64; dimensions];
        for p in 0..cell.level as usize {
            let d = self.interleave[p];
            let bit = (cell.bits >> (cell.level as usize - 1 - p)) & 1;
            offsets[d] |= bit << (self.x_bits[d] - 1 - self.zx[p]);
            fixed[d] += 1;
        }
        (0..dimensions)
            .map(|d| {
                let base = self.lo[d] as i128 + offsets[d] as i128;
                let span = 1i128 << (self.x_bits[d] - fixed[d]);
                (base, base + span - 1)
            })
            .collect()
    }

    /// Check a query box against the space
    pub fn check_box(&self, region: &BoxRegion) -> SpatialResult<()> {
        if region.lo.len() != self.dimensions() || region.hi.len() != self.dimensions() {
            return Err(SpatialError::DimensionMismatch {
                expected: self.dimensions(),
                actual: region.lo.len().max(region.hi.len()),
            });
        }
        for d in 0..self.dimensions() {
            self.offset(d, region.lo[d])?;
            self.offset(d, region.hi[d])?;
            if region.lo[d] > region.hi[d] {
                return Err(SpatialError::InvalidBounds {
                    dimension: d,
                    lo: region.lo[d],
                    hi: region.hi[d],
                });
            }
        }
        Ok(())
    }
}
