//! Track-table decoding.
//!
//! One row per tracked satellite pass, fixed-width columns per the layout
//! fixed by the header's version tag. Any single bad row rejects the whole
//! file; a table with gaps is not a valid metrology record.

use hifitime::{Duration, Epoch};
use serde::ser::SerializeMap;
use serde::Serialize;
use tracing::trace;

use crate::checksum;
use crate::constellation::{Constellation, Sv};
use crate::lines::Line;
use crate::version::{self, Column, Version};
use crate::{Error, Result};

/// Per-pass clock-offset statistics. Offsets and scatter in nanoseconds,
/// slopes in picoseconds per second.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TrackData {
    /// Offset of the satellite clock against the receiver clock
    pub refsv: f64,
    /// Slope of `refsv` over the pass
    pub srsv: f64,
    /// Offset of the reference timescale against the GNSS timescale
    pub refsys: f64,
    /// Slope of `refsys` over the pass
    pub srsys: f64,
    /// Data scatter, root-mean-square of the residuals
    pub dsg: f64,
}

/// Modeled ionospheric delay block of the extended layout. Delays in
/// nanoseconds, slopes in ps/s.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct IonoDelay {
    pub mdtr: f64,
    pub smdt: f64,
    pub mdio: f64,
    pub smdi: f64,
}

/// Measured ionospheric delay group, present only on dual-frequency rows.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct IonoMeasurement {
    pub msio: f64,
    pub smsi: f64,
    pub isg: f64,
}

/// Common-view class of a pass: `FF` rows come from an all-in-view
/// multi-channel receiver, anything else from a scheduled single channel.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonViewClass {
    SingleChannel,
    MultiChannel,
}

impl CommonViewClass {
    fn decode(field: &str) -> Option<Self> {
        if field.len() != 2 || !field.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        if field == "FF" {
            Some(CommonViewClass::MultiChannel)
        } else {
            Some(CommonViewClass::SingleChannel)
        }
    }
}

/// One validated satellite pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub sv: Sv,
    pub class: CommonViewClass,
    /// Date and time of the start of the pass (MJD + seconds of day)
    pub epoch: Epoch,
    /// Track length
    pub duration: Duration,
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub data: TrackData,
    /// Issue of ephemeris
    pub ioe: u16,
    /// Modeled ionospheric delay, extended layout only
    pub iono_delay: Option<IonoDelay>,
    /// Measured ionospheric delay, dual-frequency rows only
    pub iono_measurement: Option<IonoMeasurement>,
    /// GLONASS FDMA channel, `None` for other constellations
    pub fdma_channel: Option<i8>,
    /// Receiver hardware channel, extended layout only
    pub hardware_channel: Option<u8>,
    /// Tracked frequency code, e.g. `L1C`, extended layout only
    pub frequency_code: Option<String>,
}

impl Track {
    #[must_use]
    pub fn constellation(&self) -> Constellation {
        self.sv.constellation
    }

    /// Decode one checksum-validated row against the layout of `version`.
    pub(crate) fn parse(line: &Line, version: Version) -> Result<Track> {
        let content = checksum::verify(line)?;
        let body = content.strip_suffix(' ').ok_or_else(|| Error::Format {
            line: line.number,
            field: "row",
            value: content.to_string(),
        })?;
        let mut fields = Fields::new(body, version, line.number)?;

        let sat = fields.next_str()?;
        let sv = Sv::decode(sat).ok_or_else(|| Error::Format {
            line: line.number,
            field: "SAT",
            value: sat.to_string(),
        })?;
        let cl = fields.next_str()?;
        let class = CommonViewClass::decode(cl).ok_or_else(|| Error::Format {
            line: line.number,
            field: "CL",
            value: cl.to_string(),
        })?;
        let mjd = fields.next_int()?;
        let seconds_of_day = sttime(fields.next_raw()?, line.number)?;
        let epoch = Epoch::from_mjd_utc(mjd as f64) + Duration::from_seconds(seconds_of_day as f64);
        let duration = Duration::from_seconds(fields.next_int()? as f64);
        let elevation_deg = fields.next_scaled()?;
        let azimuth_deg = fields.next_scaled()?;
        let data = TrackData {
            refsv: fields.next_scaled()?,
            srsv: fields.next_scaled()?,
            refsys: fields.next_scaled()?,
            srsys: fields.next_scaled()?,
            dsg: fields.next_scaled()?,
        };
        let ioe = fields.next_u16()?;

        let mut iono_delay = None;
        let mut iono_measurement = None;
        let mut fdma_channel = None;
        let mut hardware_channel = None;
        let mut frequency_code = None;
        if version == Version::Version2E {
            iono_delay = Some(IonoDelay {
                mdtr: fields.next_scaled()?,
                smdt: fields.next_scaled()?,
                mdio: fields.next_scaled()?,
                smdi: fields.next_scaled()?,
            });
            if fields.optional_present() {
                iono_measurement = Some(IonoMeasurement {
                    msio: fields.next_scaled()?,
                    smsi: fields.next_scaled()?,
                    isg: fields.next_scaled()?,
                });
            }
            let fr = fields.next_i8()?;
            fdma_channel = (fr != 0).then_some(fr);
            hardware_channel = Some(fields.next_u8()?);
            frequency_code = Some(fields.next_str()?.to_string());
        }

        let track = Track {
            sv,
            class,
            epoch,
            duration,
            elevation_deg,
            azimuth_deg,
            data,
            ioe,
            iono_delay,
            iono_measurement,
            fdma_channel,
            hardware_channel,
            frequency_code,
        };
        trace!(sv = %track.sv, line = line.number, "decoded track");
        Ok(track)
    }
}

impl Serialize for Track {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let c = self.sv.constellation;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("satellite", &self.sv)?;
        map.serialize_entry("class", &self.class)?;
        map.serialize_entry("epoch", &self.epoch.to_isoformat())?;
        map.serialize_entry("duration_seconds", &self.duration.to_seconds())?;
        map.serialize_entry("elevation_deg", &self.elevation_deg)?;
        map.serialize_entry("azimuth_deg", &self.azimuth_deg)?;
        map.serialize_entry("is_gps", &(c == Constellation::Gps))?;
        map.serialize_entry("is_galileo", &(c == Constellation::Galileo))?;
        map.serialize_entry("is_beidou", &(c == Constellation::BeiDou))?;
        map.serialize_entry("is_glonass", &(c == Constellation::Glonass))?;
        map.serialize_entry("is_qzss", &(c == Constellation::Qzss))?;
        map.serialize_entry("is_irnss", &(c == Constellation::Irnss))?;
        map.serialize_entry("is_sbas", &(c == Constellation::Sbas))?;
        map.serialize_entry("data", &self.data)?;
        map.serialize_entry("ioe", &self.ioe)?;
        if let Some(iono) = &self.iono_delay {
            map.serialize_entry("iono_delay", iono)?;
        }
        if let Some(iono) = &self.iono_measurement {
            map.serialize_entry("iono_measurement", iono)?;
        }
        if let Some(fr) = self.fdma_channel {
            map.serialize_entry("fdma_channel", &fr)?;
        }
        if let Some(hc) = self.hardware_channel {
            map.serialize_entry("hardware_channel", &hc)?;
        }
        if let Some(frc) = &self.frequency_code {
            map.serialize_entry("frequency_code", frc)?;
        }
        map.end()
    }
}

/// Fixed-width cursor over a row body, walking the active column table.
/// Skips the optional group when the row width says it is absent.
struct Fields<'a> {
    body: &'a str,
    layout: &'static [Column],
    line: usize,
    index: usize,
    pos: usize,
    with_optional: bool,
}

impl<'a> Fields<'a> {
    fn new(body: &'a str, version: Version, line: usize) -> Result<Self> {
        let layout = version.layout();
        let without = version::body_width(layout, false);
        let with = version::body_width(layout, true);
        let with_optional = if body.len() == without {
            false
        } else if body.len() == with && with != without {
            true
        } else {
            return Err(Error::Format {
                line,
                field: "row",
                value: body.to_string(),
            });
        };
        Ok(Fields {
            body,
            layout,
            line,
            index: 0,
            pos: 0,
            with_optional,
        })
    }

    fn optional_present(&self) -> bool {
        self.with_optional
    }

    /// The next column and its raw, untrimmed field text.
    fn next_column(&mut self) -> Result<(&'static Column, &'a str)> {
        while !self.with_optional && self.layout.get(self.index).is_some_and(|c| c.optional) {
            self.index += 1;
        }
        let col = &self.layout[self.index];
        let end = self.pos + col.width;
        let raw = self.body.get(self.pos..end).ok_or_else(|| Error::Format {
            line: self.line,
            field: col.name,
            value: self.body[self.pos.min(self.body.len())..].to_string(),
        })?;
        // every column but the last is followed by a blank separator
        if end < self.body.len() && &self.body[end..=end] != " " {
            return Err(Error::Format {
                line: self.line,
                field: col.name,
                value: raw.to_string(),
            });
        }
        self.index += 1;
        self.pos = end + 1;
        Ok((col, raw))
    }

    fn next_raw(&mut self) -> Result<&'a str> {
        Ok(self.next_column()?.1)
    }

    fn next_str(&mut self) -> Result<&'a str> {
        Ok(self.next_column()?.1.trim())
    }

    fn next_int(&mut self) -> Result<i64> {
        let (col, raw) = self.next_column()?;
        raw.trim().parse().map_err(|_| Error::Format {
            line: self.line,
            field: col.name,
            value: raw.to_string(),
        })
    }

    fn next_scaled(&mut self) -> Result<f64> {
        let (col, raw) = self.next_column()?;
        let counts: i64 = raw.trim().parse().map_err(|_| Error::Format {
            line: self.line,
            field: col.name,
            value: raw.to_string(),
        })?;
        Ok(counts as f64 / f64::from(col.scale))
    }

    fn next_u16(&mut self) -> Result<u16> {
        let (col, raw) = self.next_column()?;
        raw.trim().parse().map_err(|_| Error::Format {
            line: self.line,
            field: col.name,
            value: raw.to_string(),
        })
    }

    fn next_u8(&mut self) -> Result<u8> {
        let (col, raw) = self.next_column()?;
        raw.trim().parse().map_err(|_| Error::Format {
            line: self.line,
            field: col.name,
            value: raw.to_string(),
        })
    }

    fn next_i8(&mut self) -> Result<i8> {
        let (col, raw) = self.next_column()?;
        raw.trim().parse().map_err(|_| Error::Format {
            line: self.line,
            field: col.name,
            value: raw.to_string(),
        })
    }
}

/// `hhmmss` start-of-track time, bounds-checked, as seconds of day.
fn sttime(raw: &str, line: usize) -> Result<u32> {
    let invalid = || Error::Format {
        line,
        field: "STTIME",
        value: raw.to_string(),
    };
    if raw.len() != 6 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hh: u32 = raw[0..2].parse().map_err(|_| invalid())?;
    let mm: u32 = raw[2..4].parse().map_err(|_| invalid())?;
    let ss: u32 = raw[4..6].parse().map_err(|_| invalid())?;
    if hh > 23 || mm > 59 || ss > 59 {
        return Err(invalid());
    }
    Ok(hh * 3600 + mm * 60 + ss)
}
