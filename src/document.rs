//! Document assembly: one decoded CGGTTS file.

use std::io::BufRead;
use std::path::Path;

use hifitime::{Duration, Epoch};
use serde::ser::SerializeMap;
use serde::Serialize;
use tracing::debug;

use crate::constellation::Constellation;
use crate::header::Header;
use crate::lines::{Line, Lines};
use crate::track::{CommonViewClass, Track};
use crate::Result;

/// Length of one slot of the BIPM common-view tracking schedule, seconds.
pub const BIPM_TRACKING_DURATION_SECONDS: f64 = 780.0;

/// A decoded CGGTTS file: header block plus the ordered track table.
///
/// Decoding is all-or-nothing; a `Cggtts` never holds a partially valid
/// table. The value is immutable once built and exclusively owned by the
/// caller, so parsing is freely reentrant across threads and files.
#[derive(Debug, Clone, PartialEq)]
pub struct Cggtts {
    pub header: Header,
    pub tracks: Vec<Track>,
}

impl Cggtts {
    /// Decode the CGGTTS file at `path`.
    ///
    /// The file handle is held only for the duration of the read and
    /// released before decoding starts, on success and failure alike.
    ///
    /// # Errors
    /// [`Error::Io`](crate::Error::Io) when the path cannot be opened or
    /// read; otherwise any decoding error per [`crate::Error`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Cggtts> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading cggtts file");
        let lines = Lines::open(path)?.collect::<std::io::Result<Vec<Line>>>()?;
        Self::assemble(&lines)
    }

    /// Decode CGGTTS content from any buffered reader.
    pub fn parse<R: BufRead>(reader: R) -> Result<Cggtts> {
        let lines = Lines::new(reader).collect::<std::io::Result<Vec<Line>>>()?;
        Self::assemble(&lines)
    }

    fn assemble(lines: &[Line]) -> Result<Cggtts> {
        let (header, rest) = Header::parse(lines)?;
        let mut tracks = Vec::with_capacity(rest.len());
        for line in rest {
            if line.is_blank() {
                continue;
            }
            tracks.push(Track::parse(line, header.version)?);
        }
        debug!(
            station = %header.station,
            version = %header.version,
            tracks = tracks.len(),
            "decoded document",
        );
        Ok(Cggtts { header, tracks })
    }

    /// Total cable delay of the installation, nanoseconds.
    #[must_use]
    pub fn total_cable_delay_nanos(&self) -> f64 {
        self.header.delay.total_cable_delay_nanos()
    }

    /// Epoch of the first track, `None` for an empty table.
    #[must_use]
    pub fn first_epoch(&self) -> Option<Epoch> {
        self.tracks.first().map(|t| t.epoch)
    }

    /// Epoch of the last track, `None` for an empty table.
    #[must_use]
    pub fn last_epoch(&self) -> Option<Epoch> {
        self.tracks.last().map(|t| t.epoch)
    }

    /// Time span between the first and last track epochs.
    #[must_use]
    pub fn total_duration(&self) -> Option<Duration> {
        Some(self.last_epoch()? - self.first_epoch()?)
    }

    /// The single constellation shared by every track, `None` for a mixed
    /// or empty document.
    #[must_use]
    pub fn constellation(&self) -> Option<Constellation> {
        let first = self.tracks.first()?.constellation();
        self.tracks
            .iter()
            .all(|t| t.constellation() == first)
            .then_some(first)
    }

    #[must_use]
    pub fn is_gps_cggtts(&self) -> bool {
        self.constellation() == Some(Constellation::Gps)
    }

    #[must_use]
    pub fn is_galileo_cggtts(&self) -> bool {
        self.constellation() == Some(Constellation::Galileo)
    }

    #[must_use]
    pub fn is_beidou_cggtts(&self) -> bool {
        self.constellation() == Some(Constellation::BeiDou)
    }

    #[must_use]
    pub fn is_glonass_cggtts(&self) -> bool {
        self.constellation() == Some(Constellation::Glonass)
    }

    #[must_use]
    pub fn is_qzss_cggtts(&self) -> bool {
        self.constellation() == Some(Constellation::Qzss)
    }

    #[must_use]
    pub fn is_irnss_cggtts(&self) -> bool {
        self.constellation() == Some(Constellation::Irnss)
    }

    #[must_use]
    pub fn is_sbas_cggtts(&self) -> bool {
        self.constellation() == Some(Constellation::Sbas)
    }

    /// True when every track carries a measured ionospheric group.
    #[must_use]
    pub fn has_ionospheric_data(&self) -> bool {
        !self.tracks.is_empty() && self.tracks.iter().all(|t| t.iono_measurement.is_some())
    }

    /// Multi-channel only when every pass was observed multi-channel.
    #[must_use]
    pub fn common_view_class(&self) -> CommonViewClass {
        if !self.tracks.is_empty()
            && self
                .tracks
                .iter()
                .all(|t| t.class == CommonViewClass::MultiChannel)
        {
            CommonViewClass::MultiChannel
        } else {
            CommonViewClass::SingleChannel
        }
    }

    /// True when every track lasts exactly one BIPM schedule slot.
    #[must_use]
    pub fn follows_bipm_tracking(&self) -> bool {
        !self.tracks.is_empty()
            && self
                .tracks
                .iter()
                .all(|t| t.duration.to_seconds() == BIPM_TRACKING_DURATION_SECONDS)
    }

    /// Project the document into the generic key-value shape consumed at
    /// the scripting-language boundary.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("document serialization is infallible")
    }
}

impl Serialize for Cggtts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.header.serialize_fields(&mut map)?;
        map.serialize_entry("is_gps", &self.is_gps_cggtts())?;
        map.serialize_entry("is_galileo", &self.is_galileo_cggtts())?;
        map.serialize_entry("is_beidou", &self.is_beidou_cggtts())?;
        map.serialize_entry("is_glonass", &self.is_glonass_cggtts())?;
        map.serialize_entry("is_qzss", &self.is_qzss_cggtts())?;
        map.serialize_entry("is_irnss", &self.is_irnss_cggtts())?;
        map.serialize_entry("is_sbas", &self.is_sbas_cggtts())?;
        map.serialize_entry("has_ionospheric_data", &self.has_ionospheric_data())?;
        map.serialize_entry("common_view_class", &self.common_view_class())?;
        map.serialize_entry("follows_bipm_tracking", &self.follows_bipm_tracking())?;
        if let (Some(first), Some(last)) = (self.first_epoch(), self.last_epoch()) {
            map.serialize_entry("first_epoch", &first.to_isoformat())?;
            map.serialize_entry("last_epoch", &last.to_isoformat())?;
            map.serialize_entry("total_duration_seconds", &(last - first).to_seconds())?;
        }
        map.serialize_entry("tracks_count", &self.tracks.len())?;
        map.serialize_entry("tracks", &self.tracks)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::checksum::checksum;
    use crate::{Error, Version};

    fn signed(body: &str) -> String {
        let content = format!("{body} ");
        format!("{content}{:02X}", checksum(&content))
    }

    fn row(fields: &[&str]) -> String {
        signed(&fields.join(" "))
    }

    fn track_fields(sat: &'static str, sttime: &'static str) -> Vec<&'static str> {
        vec![
            sat, "FF", "59568", sttime, " 780", "450", "1800", "+0000012345", "  +123",
            "-0000005432", "   -12", "  25", " 45", "  12", "  +5", "  11", "  -3", " 0", " 3",
            "L1C",
        ]
    }

    fn file_2e(rows: &[Vec<&str>]) -> String {
        let mut out: Vec<String> = [
            "CGGTTS GENERIC DATA FORMAT VERSION = 2E",
            "REV DATE = 2014-02-20",
            "RCVR = ORBSTAR GTR50 2567 2013 v1.11",
            "CH = 20",
            "IMS = 99999",
            "LAB = OPMT",
            "X = +4027881.79 m",
            "Y = +306998.67 m",
            "Z = +4919499.36 m",
            "FRAME = ITRF",
            "INT DLY = 32.9 ns (GPS C1), CAL_ID = 1015-2021",
            "CAB DLY = 155.2 ns",
            "REF DLY = 14.0 ns",
            "REF = UTC(OP)",
        ]
        .iter()
        .map(|body| signed(body))
        .collect();
        out.push(String::new());
        out.push("SAT CL  MJD  STTIME TRKL ELV AZTH   REFSV      SRSV     REFSYS    SRSYS  DSG IOE MDTR SMDT MDIO SMDI FR HC FRC CK".to_string());
        out.push("             hhmmss  s  .1dg .1dg    .1ns    .1ps/s     .1ns    .1ps/s .1ns     .1ns.1ps/s.1ns.1ps/s".to_string());
        for fields in rows {
            out.push(row(fields));
        }
        out.push(String::new());
        out.join("\n")
    }

    fn parse(content: &str) -> Result<Cggtts> {
        Cggtts::parse(Cursor::new(content.to_string()))
    }

    #[test]
    fn assembles_header_and_tracks() {
        let content = file_2e(&[
            track_fields("G05", "001000"),
            track_fields("G12", "002600"),
        ]);
        let cgg = parse(&content).unwrap();

        assert_eq!(cgg.header.version, Version::Version2E);
        assert_eq!(cgg.tracks.len(), 2);
        assert_eq!(cgg.tracks[1].sv.to_string(), "G12");
        assert!((cgg.total_cable_delay_nanos() - 169.2).abs() < 1e-9);
        assert_eq!(cgg.constellation(), Some(Constellation::Gps));
        assert!(cgg.is_gps_cggtts());
        assert!(!cgg.is_glonass_cggtts());
        assert!(cgg.follows_bipm_tracking());
        assert_eq!(cgg.common_view_class(), CommonViewClass::MultiChannel);
        assert!(!cgg.has_ionospheric_data());
        assert_eq!(
            cgg.total_duration().unwrap(),
            Duration::from_seconds(960.0),
        );
    }

    #[test]
    fn mixed_constellations_have_no_document_constellation() {
        let content = file_2e(&[
            track_fields("G05", "001000"),
            track_fields("E11", "002600"),
        ]);
        let cgg = parse(&content).unwrap();
        assert_eq!(cgg.constellation(), None);
        assert!(!cgg.is_gps_cggtts());
        assert!(!cgg.is_galileo_cggtts());
    }

    #[test]
    fn one_bad_row_rejects_the_whole_file() {
        let mut rows = vec![
            track_fields("G05", "001000"),
            track_fields("G12", "002600"),
        ];
        rows[1][0] = "Z12";
        let err = parse(&file_2e(&rows)).unwrap_err();
        assert!(matches!(err, Error::Format { field: "SAT", .. }));
    }

    #[test]
    fn empty_table_is_a_valid_document() {
        let cgg = parse(&file_2e(&[])).unwrap();
        assert!(cgg.tracks.is_empty());
        assert_eq!(cgg.first_epoch(), None);
        assert_eq!(cgg.total_duration(), None);
        assert!(!cgg.follows_bipm_tracking());
        assert!(!cgg.has_ionospheric_data());
    }

    #[test]
    fn projection_contains_the_contract_keys() {
        let cgg = parse(&file_2e(&[track_fields("G05", "001000")])).unwrap();
        let value = cgg.to_json();

        assert_eq!(value["station"], "OPMT");
        assert_eq!(value["version"], "2E");
        assert_eq!(value["nb_channels"], 20);
        assert_eq!(value["receiver"]["manufacturer"], "ORBSTAR");
        assert_eq!(value["receiver"]["model"], "GTR50");
        assert_eq!(value["receiver"]["serial_number"], "2567");
        assert_eq!(value["apc_coordinates"]["x"], 4027881.79);
        assert_eq!(value["delay"]["antenna_cable_delay"], 155.2);
        assert_eq!(value["delay"]["local_ref_delay"], 14.0);
        assert!(value["delay"]["total_cable_delay_nanos"].is_number());
        assert_eq!(value["tracks_count"], 1);
        assert_eq!(value["tracks"].as_array().unwrap().len(), 1);
        assert_eq!(value["tracks"][0]["satellite"], "G05");
        assert_eq!(value["tracks"][0]["is_gps"], true);
        assert_eq!(value["tracks"][0]["data"]["refsv"], 1234.5);
        assert_eq!(value["is_gps"], true);
        assert_eq!(value["common_view_class"], "MultiChannel");
        assert!(value["revision_date"].as_str().unwrap().starts_with("2014-02-20"));
    }

    #[test]
    fn parse_is_idempotent() {
        let content = file_2e(&[track_fields("G05", "001000")]);
        assert_eq!(parse(&content).unwrap(), parse(&content).unwrap());
    }
}
