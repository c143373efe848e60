//! Mission Planner CLI library: command implementations and the
//! repository wiring they share.

pub mod commands;
pub mod context;
