//! Components G/H/I: bucketing a raw per-glyph metric table into a
//! class-based JFM representation, and splitting/reassembling a
//! composite ZVP specification across its VF and JFM halves.

mod error;
mod reduce;
mod zvp;

pub use error::Error;
pub use reduce::{
    rounding_cover, tfm_reduce, tfm_reduce_jpl, tfm_reduce_jpl_x, tfm_shorten, Cover, RawMetricEntry, ReducedMetric,
    RoundMode,
};
pub use zvp::{compose_zvp, divide_zvp};
