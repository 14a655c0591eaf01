//! One module per `ControllerKind`, one struct per variant within it.

pub mod ai;
pub mod av;
pub mod desktop;
pub mod power;
pub mod remote;
pub mod verification;
pub mod web;
