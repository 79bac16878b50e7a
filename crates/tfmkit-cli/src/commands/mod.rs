//! CLI command implementations, one module per external collaborator
//! or core subsystem (§6).

mod jfm;
mod locate;
mod pl_tfm;
mod vf;
mod zvp;

pub use jfm::{jfm_reduce, ReduceMode};
pub use locate::locate;
pub use pl_tfm::{pl_to_tfm, tfm_to_pl};
pub use vf::{vf_to_vp, vp_to_vf};
pub use zvp::{zvp_compose, zvp_divide};
