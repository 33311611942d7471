/// Terminal front end: keyboard and gamepad input, sound, rendering.

pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod sound;
