//! Seamless looping background playback.
//!
//! [`crossfade`] holds the dual-slot loop controller; [`media`] decodes clips
//! and plays them as slots; [`parallax`] has the scroll and pointer
//! calculators; [`gpu`] composites the two layers.

pub mod accessibility;
pub mod crossfade;
pub mod gpu;
pub mod media;
pub mod parallax;
pub mod settings;
