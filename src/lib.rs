#![doc = include_str!("../README.md")]

pub mod checksum;
mod constellation;
mod document;
mod error;
mod header;
mod lines;
mod track;
mod version;

pub use constellation::{Constellation, Sv};
pub use document::{Cggtts, BIPM_TRACKING_DURATION_SECONDS};
pub use error::{Error, Result};
pub use header::{Coordinates, Hardware, Header, SystemDelay};
pub use track::{CommonViewClass, IonoDelay, IonoMeasurement, Track, TrackData};
pub use version::{Column, Version};

pub mod prelude {
    pub use crate::{Cggtts, Constellation, Error, Header, Result, Track, Version};
}
