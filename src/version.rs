//! Format revisions and their track-row column layouts.
//!
//! Track rows are fixed width, but the column set varies by the revision
//! tag declared in the header. Each supported revision carries its own
//! column table; the tag is decoded once by the header parser and threaded
//! into the track parser, never re-derived per row.

use std::fmt::Display;

use serde::Serialize;

/// One track-table column: name, character width, and the divisor taking
/// the raw integer count to its engineering unit (10 for the
/// tenth-of-nanosecond, tenth-of-picosecond-per-second and tenth-of-degree
/// columns, 1 for plain integers and text).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub width: usize,
    pub scale: u32,
    /// Part of a group that may be absent from a row as a whole
    pub optional: bool,
}

impl Column {
    const fn new(name: &'static str, width: usize, scale: u32) -> Self {
        Column {
            name,
            width,
            scale,
            optional: false,
        }
    }

    const fn optional(name: &'static str, width: usize, scale: u32) -> Self {
        Column {
            name,
            width,
            scale,
            optional: true,
        }
    }
}

/// Original 1993 layout: satellite pass statistics only.
const VERSION_1: &[Column] = &[
    Column::new("SAT", 3, 1),
    Column::new("CL", 2, 1),
    Column::new("MJD", 5, 1),
    Column::new("STTIME", 6, 1),
    Column::new("TRKL", 4, 1),
    Column::new("ELV", 3, 10),
    Column::new("AZTH", 4, 10),
    Column::new("REFSV", 11, 10),
    Column::new("SRSV", 6, 10),
    Column::new("REFSYS", 11, 10),
    Column::new("SRSYS", 6, 10),
    Column::new("DSG", 4, 10),
    Column::new("IOE", 3, 1),
];

/// 2E layout: adds the modeled ionosphere block, the measured ionosphere
/// group (optional as a whole), and the channel/frequency trailer.
const VERSION_2E: &[Column] = &[
    Column::new("SAT", 3, 1),
    Column::new("CL", 2, 1),
    Column::new("MJD", 5, 1),
    Column::new("STTIME", 6, 1),
    Column::new("TRKL", 4, 1),
    Column::new("ELV", 3, 10),
    Column::new("AZTH", 4, 10),
    Column::new("REFSV", 11, 10),
    Column::new("SRSV", 6, 10),
    Column::new("REFSYS", 11, 10),
    Column::new("SRSYS", 6, 10),
    Column::new("DSG", 4, 10),
    Column::new("IOE", 3, 1),
    Column::new("MDTR", 4, 10),
    Column::new("SMDT", 4, 10),
    Column::new("MDIO", 4, 10),
    Column::new("SMDI", 4, 10),
    Column::optional("MSIO", 4, 10),
    Column::optional("SMSI", 4, 10),
    Column::optional("ISG", 3, 10),
    Column::new("FR", 2, 1),
    Column::new("HC", 2, 1),
    Column::new("FRC", 3, 1),
];

/// Supported CGGTTS format revisions. The set is closed: any other tag in
/// the header is an unsupported-revision error, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// Original GPS data format, tag `01`
    Version1,
    /// Extended format, tag `2E`
    Version2E,
}

impl Version {
    /// Decode a header version tag, or `None` for tags outside the
    /// supported set (including the recognized but unimplemented `02`).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "01" => Some(Version::Version1),
            "2E" => Some(Version::Version2E),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Version::Version1 => "01",
            Version::Version2E => "2E",
        }
    }

    /// Ordered column table for this revision, checksum field excluded.
    #[must_use]
    pub fn layout(&self) -> &'static [Column] {
        match self {
            Version::Version1 => VERSION_1,
            Version::Version2E => VERSION_2E,
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

/// Row body width in characters (blank-separated columns, trailing checksum
/// field excluded), with or without the optional group.
pub(crate) fn body_width(layout: &[Column], with_optional: bool) -> usize {
    let cols: Vec<&Column> = layout
        .iter()
        .filter(|c| with_optional || !c.optional)
        .collect();
    cols.iter().map(|c| c.width).sum::<usize>() + cols.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_dispatch_is_closed() {
        assert_eq!(Version::from_tag("01"), Some(Version::Version1));
        assert_eq!(Version::from_tag("2E"), Some(Version::Version2E));
        assert_eq!(Version::from_tag("02"), None);
        assert_eq!(Version::from_tag("2e"), None);
        assert_eq!(Version::from_tag("3A"), None);
    }

    #[test]
    fn row_widths() {
        assert_eq!(body_width(Version::Version1.layout(), false), 80);
        assert_eq!(body_width(Version::Version2E.layout(), false), 110);
        assert_eq!(body_width(Version::Version2E.layout(), true), 124);
    }

    #[test]
    fn version_1_has_no_optional_group() {
        assert!(Version::Version1.layout().iter().all(|c| !c.optional));
        let w = body_width(Version::Version1.layout(), true);
        assert_eq!(w, body_width(Version::Version1.layout(), false));
    }

    #[test]
    fn optional_group_is_contiguous() {
        let layout = Version::Version2E.layout();
        let first = layout.iter().position(|c| c.optional).unwrap();
        let last = layout.iter().rposition(|c| c.optional).unwrap();
        assert!(layout[first..=last].iter().all(|c| c.optional));
        assert_eq!(layout[first].name, "MSIO");
        assert_eq!(layout[last].name, "ISG");
    }

    #[test]
    fn display_matches_tag() {
        assert_eq!(Version::Version2E.to_string(), "2E");
        assert_eq!(Version::Version1.to_string(), "01");
    }
}
