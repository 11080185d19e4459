//! Mapping between abstract search coordinates and physical settings.
//!
//! The optimizer searches over **abstract coordinates** — one value per
//! configured [`ParameterGroup`]. Each group addresses one or more physical
//! quantities on the machine. A group is either *absolute* (the coordinate
//! is broadcast to every quantity in the group) or *relative* (the
//! coordinate is an offset from each quantity's value at optimizer start,
//! frozen for the whole run).
//!
//! [`ParameterMap`] converts in both directions, derives valid abstract
//! bounds from physical bounds, and records every evaluated
//! abstract→physical mapping in an append-only audit table for replay.
//! No physical I/O happens here; reads and writes belong to the
//! [`Evaluator`](crate::Evaluator) collaborator.

use parking_lot::RwLock;

use crate::config::GroupConfig;
use crate::{Error, Result};

/// How a parameter group's abstract coordinate addresses its physical
/// quantities.
///
/// Resolved once at configuration time; the conversion functions only match
/// on the variant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupKind {
    /// The coordinate is an offset from each quantity's frozen initial value.
    Relative {
        /// Initial physical value of each quantity, captured at run start.
        initial: Vec<f64>,
    },
    /// The coordinate is the physical value itself, broadcast to every
    /// quantity in the group.
    Absolute,
}

/// One abstract search coordinate and the physical quantities it drives.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterGroup {
    size: usize,
    kind: GroupKind,
}

impl ParameterGroup {
    /// An absolute group driving `size` physical quantities.
    #[must_use]
    pub fn absolute(size: usize) -> Self {
        Self {
            size,
            kind: GroupKind::Absolute,
        }
    }

    /// A relative group with one frozen initial value per physical quantity.
    #[must_use]
    pub fn relative(initial: Vec<f64>) -> Self {
        Self {
            size: initial.len(),
            kind: GroupKind::Relative { initial },
        }
    }

    /// Number of physical quantities in the group.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The group's addressing kind.
    #[must_use]
    pub fn kind(&self) -> &GroupKind {
        &self.kind
    }
}

/// Converter between abstract coordinates and physical settings.
#[derive(Debug)]
pub struct ParameterMap {
    groups: Vec<ParameterGroup>,
    physical_count: usize,
    audit: RwLock<Vec<(Vec<f64>, Vec<f64>)>>,
}

impl ParameterMap {
    /// Builds a map over the given groups.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyGroup`] if any group (or the group list itself)
    /// is empty.
    pub fn new(groups: Vec<ParameterGroup>) -> Result<Self> {
        if groups.is_empty() {
            return Err(Error::EmptyGroup { index: 0 });
        }
        for (index, group) in groups.iter().enumerate() {
            if group.size == 0 {
                return Err(Error::EmptyGroup { index });
            }
        }
        let physical_count = groups.iter().map(|g| g.size).sum();
        Ok(Self {
            groups,
            physical_count,
            audit: RwLock::new(Vec::new()),
        })
    }

    /// Number of abstract coordinates (groups).
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of physical quantities across all groups.
    #[must_use]
    pub fn physical_count(&self) -> usize {
        self.physical_count
    }

    /// Converts abstract coordinates to physical settings and records the
    /// mapping in the audit table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `abstract_coords` does not
    /// have one value per group.
    pub fn to_physical(&self, abstract_coords: &[f64]) -> Result<Vec<f64>> {
        if abstract_coords.len() != self.groups.len() {
            return Err(Error::DimensionMismatch {
                expected: self.groups.len(),
                got: abstract_coords.len(),
            });
        }

        let mut physical = Vec::with_capacity(self.physical_count);
        for (group, &coord) in self.groups.iter().zip(abstract_coords) {
            match &group.kind {
                GroupKind::Relative { initial } => {
                    physical.extend(initial.iter().map(|&init| init + coord));
                }
                GroupKind::Absolute => {
                    physical.extend(core::iter::repeat(coord).take(group.size));
                }
            }
        }

        self.audit
            .write()
            .push((abstract_coords.to_vec(), physical.clone()));
        Ok(physical)
    }

    /// Converts physical settings back to abstract coordinates.
    ///
    /// The first quantity of each group is the representative; under the
    /// broadcast rule all quantities in a group carry the same coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `physical` does not have one
    /// value per physical quantity.
    pub fn to_abstract(&self, physical: &[f64]) -> Result<Vec<f64>> {
        if physical.len() != self.physical_count {
            return Err(Error::DimensionMismatch {
                expected: self.physical_count,
                got: physical.len(),
            });
        }

        let mut coords = Vec::with_capacity(self.groups.len());
        let mut offset = 0;
        for group in &self.groups {
            let value = match &group.kind {
                GroupKind::Relative { initial } => physical[offset] - initial[0],
                GroupKind::Absolute => physical[offset],
            };
            coords.push(value);
            offset += group.size;
        }
        Ok(coords)
    }

    /// Derives abstract-coordinate bounds from per-quantity physical bounds.
    ///
    /// For a relative group the bound is the tightest offset interval across
    /// the group's quantities (max of the lower deltas, min of the upper
    /// deltas), so that no quantity can be pushed past its own physical
    /// bound. For an absolute group it is the intersection of the
    /// per-quantity intervals.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] on wrong bound vector lengths and
    /// [`Error::InvalidBounds`] if a derived interval is empty.
    pub fn derive_bounds(
        &self,
        physical_lower: &[f64],
        physical_upper: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        if physical_lower.len() != self.physical_count || physical_upper.len() != self.physical_count
        {
            return Err(Error::DimensionMismatch {
                expected: self.physical_count,
                got: physical_lower.len().min(physical_upper.len()),
            });
        }

        let mut lower = Vec::with_capacity(self.groups.len());
        let mut upper = Vec::with_capacity(self.groups.len());
        let mut offset = 0;

        for group in &self.groups {
            let lo_slice = &physical_lower[offset..offset + group.size];
            let hi_slice = &physical_upper[offset..offset + group.size];

            let (lo, hi) = match &group.kind {
                GroupKind::Relative { initial } => {
                    let lo = lo_slice
                        .iter()
                        .zip(initial)
                        .map(|(&l, &init)| l - init)
                        .fold(f64::NEG_INFINITY, f64::max);
                    let hi = hi_slice
                        .iter()
                        .zip(initial)
                        .map(|(&h, &init)| h - init)
                        .fold(f64::INFINITY, f64::min);
                    (lo, hi)
                }
                GroupKind::Absolute => {
                    let lo = lo_slice.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let hi = hi_slice.iter().copied().fold(f64::INFINITY, f64::min);
                    (lo, hi)
                }
            };

            if lo > hi {
                return Err(Error::InvalidBounds {
                    lower: lo,
                    upper: hi,
                });
            }

            lower.push(lo);
            upper.push(hi);
            offset += group.size;
        }

        Ok((lower, upper))
    }

    /// Snapshot of the append-only abstract→physical audit table, in
    /// evaluation order.
    #[must_use]
    pub fn audit_log(&self) -> Vec<(Vec<f64>, Vec<f64>)> {
        self.audit.read().clone()
    }

    /// Builds a map and its abstract bounds from per-group configuration and
    /// the machine's initial physical values.
    ///
    /// Relative groups freeze their slice of `initial_physical` for the run;
    /// each group's physical bounds are broadcast to its quantities and then
    /// tightened into abstract bounds via [`derive_bounds`](Self::derive_bounds).
    ///
    /// # Errors
    ///
    /// Returns the first configuration-class error: invalid group settings,
    /// mismatched `initial_physical` length, or an empty derived interval.
    pub fn from_configs(
        configs: &[GroupConfig],
        initial_physical: &[f64],
    ) -> Result<(Self, Vec<f64>, Vec<f64>)> {
        let mut groups = Vec::with_capacity(configs.len());
        let mut physical_lower = Vec::new();
        let mut physical_upper = Vec::new();
        let mut offset = 0;

        for (index, config) in configs.iter().enumerate() {
            config.validate(index)?;
            if offset + config.size > initial_physical.len() {
                return Err(Error::DimensionMismatch {
                    expected: offset + config.size,
                    got: initial_physical.len(),
                });
            }

            let group = if config.relative {
                ParameterGroup::relative(initial_physical[offset..offset + config.size].to_vec())
            } else {
                ParameterGroup::absolute(config.size)
            };
            groups.push(group);

            physical_lower.extend(core::iter::repeat(config.lower_bound).take(config.size));
            physical_upper.extend(core::iter::repeat(config.upper_bound).take(config.size));
            offset += config.size;
        }

        if offset != initial_physical.len() {
            return Err(Error::DimensionMismatch {
                expected: offset,
                got: initial_physical.len(),
            });
        }

        let map = Self::new(groups)?;
        let (lower, upper) = map.derive_bounds(&physical_lower, &physical_upper)?;
        Ok((map, lower, upper))
    }
}
