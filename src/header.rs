//! Header block decoding.
//!
//! The header is a fixed, ordered prefix of labelled lines describing the
//! station, receiver, antenna coordinates and system delays. Every labelled
//! line is checksum-validated exactly like a track row. The version tag on
//! the first line fixes the track-table layout for the rest of the file.

use hifitime::Epoch;
use serde::ser::SerializeMap;
use serde::Serialize;
use tracing::debug;

use crate::checksum;
use crate::lines::Line;
use crate::version::Version;
use crate::{Error, Result};

/// Receiver or ionospheric-measurement-system hardware description.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Hardware {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
}

/// Antenna phase center coordinates, meters, Earth-centered Earth-fixed.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// System delays, all in nanoseconds.
///
/// A header carries either the antenna-cable / local-reference pair, or a
/// receiver-reported combined `TOT DLY` value. When the combined value is
/// present it is authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemDelay {
    /// Receiver internal delay (`INT DLY`), not part of the cable total
    pub internal_delay: Option<f64>,
    /// Antenna cable delay (`CAB DLY`)
    pub antenna_cable_delay: f64,
    /// Local reference delay (`REF DLY`)
    pub local_ref_delay: f64,
    /// Receiver-reported combined delay (`TOT DLY`)
    pub total_delay: Option<f64>,
    pub calibration_id: Option<String>,
}

impl SystemDelay {
    /// Total cable delay: the reported combined value when present,
    /// otherwise the sum of the antenna cable and local reference delays.
    #[must_use]
    pub fn total_cable_delay_nanos(&self) -> f64 {
        self.total_delay
            .unwrap_or(self.antenna_cable_delay + self.local_ref_delay)
    }
}

impl Serialize for SystemDelay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("antenna_cable_delay", &self.antenna_cable_delay)?;
        map.serialize_entry("local_ref_delay", &self.local_ref_delay)?;
        map.serialize_entry("total_cable_delay_nanos", &self.total_cable_delay_nanos())?;
        if let Some(internal) = self.internal_delay {
            map.serialize_entry("internal_delay", &internal)?;
        }
        if let Some(cal) = &self.calibration_id {
            map.serialize_entry("calibration_id", cal)?;
        }
        map.end()
    }
}

/// Decoded CGGTTS header block.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Format revision governing the track-table layout
    pub version: Version,
    /// Calendar date of the format revision
    pub revision_date: Epoch,
    /// 4-5 character laboratory code
    pub station: String,
    pub nb_channels: u16,
    pub receiver: Hardware,
    /// Ionospheric measurement system, when one is installed
    pub ims_hardware: Option<Hardware>,
    /// Reference clock or timescale identifier, e.g. `UTC(OP)`
    pub reference_time: String,
    /// Terrestrial reference frame of the antenna coordinates
    pub reference_frame: String,
    pub apc_coordinates: Coordinates,
    pub comments: Option<String>,
    pub delay: SystemDelay,
}

const TITLE_2E: &str = "CGGTTS GENERIC DATA FORMAT VERSION";
const TITLE_1: &str = "GGTTS GPS DATA FORMAT VERSION";

impl Header {
    /// Consume the header block from `lines`, returning the decoded header
    /// and the remaining lines, positioned at the first track row.
    pub(crate) fn parse(lines: &[Line]) -> Result<(Header, &[Line])> {
        let mut cursor = Cursor::new(lines);

        let version = parse_version(cursor.next("VERSION")?)?;
        let revision_date = parse_date(cursor.take("REV DATE")?)?;
        let receiver = parse_hardware(cursor.take("RCVR")?)?;
        let nb_channels = parse_int(cursor.take("CH")?)?;
        let ims_hardware = match cursor.take_optional("IMS")? {
            Some(field) if field.value != "99999" => Some(parse_hardware(field)?),
            _ => None,
        };
        let station = parse_station(cursor.take("LAB")?)?;
        let x = parse_meters(cursor.take("X")?)?;
        let y = parse_meters(cursor.take("Y")?)?;
        let z = parse_meters(cursor.take("Z")?)?;
        let reference_frame = cursor.take("FRAME")?.value.to_string();
        let comments = cursor
            .take_optional("COMMENTS")?
            .map(|field| field.value.to_string());
        let delay = parse_delays(&mut cursor)?;
        let reference_time = cursor.take("REF")?.value.to_string();

        cursor.separator()?;
        cursor.banner("SAT", "column banner")?;
        cursor.banner("hhmmss", "unit banner")?;

        let header = Header {
            version,
            revision_date,
            station,
            nb_channels,
            receiver,
            ims_hardware,
            reference_time,
            reference_frame,
            apc_coordinates: Coordinates { x, y, z },
            comments,
            delay,
        };
        debug!(station = %header.station, version = %header.version, "decoded header");
        Ok((header, cursor.rest()))
    }
}

impl Header {
    /// Emit the header's key-value entries into `map`. Shared between the
    /// header's own `Serialize` impl and the flattened document projection.
    pub(crate) fn serialize_fields<M: SerializeMap>(
        &self,
        map: &mut M,
    ) -> std::result::Result<(), M::Error> {
        map.serialize_entry("station", &self.station)?;
        map.serialize_entry("version", &self.version)?;
        map.serialize_entry("revision_date", &self.revision_date.to_isoformat())?;
        map.serialize_entry("nb_channels", &self.nb_channels)?;
        map.serialize_entry("receiver", &self.receiver)?;
        if let Some(ims) = &self.ims_hardware {
            map.serialize_entry("ims_hardware", ims)?;
        }
        map.serialize_entry("reference_time", &self.reference_time)?;
        map.serialize_entry("reference_frame", &self.reference_frame)?;
        map.serialize_entry("apc_coordinates", &self.apc_coordinates)?;
        if let Some(comments) = &self.comments {
            map.serialize_entry("comments", comments)?;
        }
        map.serialize_entry("delay", &self.delay)
    }
}

impl Serialize for Header {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.serialize_fields(&mut map)?;
        map.end()
    }
}

/// A labelled header value with the line it came from, for diagnostics.
struct Field<'a> {
    line: usize,
    label: &'static str,
    value: &'a str,
}

impl Field<'_> {
    fn invalid(&self) -> Error {
        Error::Format {
            line: self.line,
            field: self.label,
            value: self.value.to_string(),
        }
    }
}

struct Cursor<'a> {
    lines: &'a [Line],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(lines: &'a [Line]) -> Self {
        Cursor { lines, pos: 0 }
    }

    fn next_number(&self) -> usize {
        self.lines.last().map_or(1, |l| l.number + 1)
    }

    fn next(&mut self, label: &'static str) -> Result<&'a Line> {
        match self.lines.get(self.pos) {
            Some(line) => {
                self.pos += 1;
                Ok(line)
            }
            None => Err(Error::MissingHeader {
                line: self.next_number(),
                label,
            }),
        }
    }

    /// Consume the mandatory labelled line, checksum-validated.
    fn take(&mut self, label: &'static str) -> Result<Field<'a>> {
        let line = self.next(label)?;
        let content = checksum::verify(line)?;
        match labelled(content, label) {
            Some(value) => Ok(Field {
                line: line.number,
                label,
                value,
            }),
            None => Err(Error::MissingHeader {
                line: line.number,
                label,
            }),
        }
    }

    /// Consume the labelled line if it is next, leaving the cursor in place
    /// otherwise. The peeked line is checksum-validated either way.
    fn take_optional(&mut self, label: &'static str) -> Result<Option<Field<'a>>> {
        let Some(line) = self.lines.get(self.pos) else {
            return Ok(None);
        };
        let content = checksum::verify(line)?;
        match labelled(content, label) {
            Some(value) => {
                self.pos += 1;
                Ok(Some(Field {
                    line: line.number,
                    label,
                    value,
                }))
            }
            None => Ok(None),
        }
    }

    /// Consume the blank line closing the labelled block.
    fn separator(&mut self) -> Result<()> {
        let line = self.next("header separator")?;
        if line.is_blank() {
            Ok(())
        } else {
            Err(Error::Format {
                line: line.number,
                field: "header separator",
                value: line.text.clone(),
            })
        }
    }

    /// Consume one column-banner line. Banners are fixed boilerplate and
    /// carry no checksum; they are only sanity-checked by `marker`.
    fn banner(&mut self, marker: &str, label: &'static str) -> Result<()> {
        let line = self.next(label)?;
        if line.text.contains(marker) {
            Ok(())
        } else {
            Err(Error::Format {
                line: line.number,
                field: label,
                value: line.text.clone(),
            })
        }
    }

    fn rest(&self) -> &'a [Line] {
        &self.lines[self.pos..]
    }
}

/// Split `LABEL = value`, or `None` when the label does not match.
fn labelled<'a>(content: &'a str, label: &str) -> Option<&'a str> {
    let rest = content.trim_end().strip_prefix(label)?;
    Some(rest.trim_start().strip_prefix('=')?.trim())
}

fn parse_version(line: &Line) -> Result<Version> {
    let content = checksum::verify(line)?;
    let tag = labelled(content, TITLE_2E)
        .or_else(|| labelled(content, TITLE_1))
        .ok_or_else(|| Error::Format {
            line: line.number,
            field: "VERSION",
            value: content.trim_end().to_string(),
        })?;
    Version::from_tag(tag).ok_or_else(|| Error::UnsupportedRevision {
        line: line.number,
        tag: tag.to_string(),
    })
}

fn parse_date(field: Field) -> Result<Epoch> {
    let mut parts = field.value.split('-');
    let (Some(y), Some(m), Some(d), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(field.invalid());
    };
    let year: i32 = y.parse().map_err(|_| field.invalid())?;
    let month: u8 = m.parse().map_err(|_| field.invalid())?;
    let day: u8 = d.parse().map_err(|_| field.invalid())?;
    Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0).map_err(|_| field.invalid())
}

fn parse_hardware(field: Field) -> Result<Hardware> {
    let tokens: Vec<&str> = field.value.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(field.invalid());
    }
    let year = match tokens.get(3) {
        Some(tok) => Some(tok.parse::<u16>().map_err(|_| field.invalid())?),
        None => None,
    };
    let release = (tokens.len() > 4).then(|| tokens[4..].join(" "));
    Ok(Hardware {
        manufacturer: tokens[0].to_string(),
        model: tokens[1].to_string(),
        serial_number: tokens[2].to_string(),
        year,
        release,
    })
}

fn parse_int(field: Field) -> Result<u16> {
    field.value.parse().map_err(|_| field.invalid())
}

fn parse_station(field: Field) -> Result<String> {
    let code = field.value;
    if (4..=5).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(code.to_string())
    } else {
        Err(field.invalid())
    }
}

/// `<value> m` coordinate line.
fn parse_meters(field: Field) -> Result<f64> {
    let mut tokens = field.value.split_whitespace();
    let (Some(value), Some("m"), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(field.invalid());
    };
    value.parse().map_err(|_| field.invalid())
}

/// `<value> ns` with optional trailing annotation, e.g.
/// `32.9 ns (GPS C1)`.
fn parse_nanos(field: &Field, text: &str) -> Result<f64> {
    let mut tokens = text.split_whitespace();
    let (Some(value), Some("ns")) = (tokens.next(), tokens.next()) else {
        return Err(field.invalid());
    };
    value.parse().map_err(|_| field.invalid())
}

/// The delay block: optional `INT DLY` (with optional `CAL_ID`), then
/// either `CAB DLY` + `REF DLY` or the combined `TOT DLY`.
fn parse_delays(cursor: &mut Cursor) -> Result<SystemDelay> {
    let mut internal_delay = None;
    let mut calibration_id = None;
    if let Some(field) = cursor.take_optional("INT DLY")? {
        let mut parts = field.value.splitn(2, ',');
        internal_delay = Some(parse_nanos(&field, parts.next().unwrap_or_default())?);
        if let Some(rest) = parts.next() {
            let id = labelled(rest.trim(), "CAL_ID").ok_or_else(|| field.invalid())?;
            if id != "NA" {
                calibration_id = Some(id.to_string());
            }
        }
    }

    if let Some(field) = cursor.take_optional("TOT DLY")? {
        let total = parse_nanos(&field, field.value)?;
        return Ok(SystemDelay {
            internal_delay,
            antenna_cable_delay: 0.0,
            local_ref_delay: 0.0,
            total_delay: Some(total),
            calibration_id,
        });
    }

    let cab = cursor.take("CAB DLY")?;
    let antenna_cable_delay = parse_nanos(&cab, cab.value)?;
    let refd = cursor.take("REF DLY")?;
    let local_ref_delay = parse_nanos(&refd, refd.value)?;
    Ok(SystemDelay {
        internal_delay,
        antenna_cable_delay,
        local_ref_delay,
        total_delay: None,
        calibration_id,
    })
}
