/// Domain model: pure data and rules, no I/O and no clock.

pub mod entity;
pub mod grid;
pub mod rules;
pub mod tile;
