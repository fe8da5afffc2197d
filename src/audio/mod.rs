//! Audio byte-format helpers.
//!
//! Playback itself is a host-application concern; this module only inspects
//! synthesized payloads before they are handed over.

pub mod wav;
