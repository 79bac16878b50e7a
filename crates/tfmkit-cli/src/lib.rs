//! Command-line front end for the tfmkit TeX font metric toolkit.

pub mod cli;
pub mod commands;
pub mod io;
