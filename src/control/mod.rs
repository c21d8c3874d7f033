//! Closed-loop temperature control: setpoint trajectory, PID and smoothing.

pub mod filter;
pub mod pid;
pub mod planner;
