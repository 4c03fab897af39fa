/// Compatibility values below this are treated as zero and the edge is dropped.
pub const DEFAULT_PROB_FLOOR: f64 = 1.0e-6;

/// Weight given to padding pairs so the square problem always has a complete matching.
pub const PADDING_WEIGHT: f64 = 1.01e-6;

/// Weight given to a forced (entity, peak) pair. Context scores never exceed 3.0,
/// so this dominates any sum of ordinary edges the solver can build.
pub const FORCED_WEIGHT: f64 = 1.0e4;

/// Deviation (in sigmas) whose quality defines the zero point of the normalised scale.
pub const DEFAULT_REFERENCE_DEVIATION: f64 = 2.0;

/// Smallest tail probability fed to `ln`. Anything smaller is clamped here.
pub const MIN_TAIL_PROB: f64 = 1.0e-300;

/// Outlier guard multiplier for accumulated contributions.
pub const DEFAULT_REJECT_FACTOR: f64 = 10_000.0;

/// Widening of the tolerance window used for self-consistency.
pub const DEFAULT_SPREAD_FACTOR: f64 = 2.0;

/// Sentinel used by input files for "no value measured".
pub const DEFAULT_MISSING_VALUE: f64 = -9999.0;

/// Total assigned to an entity that received no contribution.
pub const UNASSIGNED_TOTAL: f64 = -1.0;

/// Context bonus for one consistent neighbour side.
pub const CONTEXT_BONUS_SINGLE: f64 = 1.0;

/// Context bonus for a fully consistent neighbourhood (both sides, or the only side of a chain end).
pub const CONTEXT_BONUS_FULL: f64 = 2.0;
