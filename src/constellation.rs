use std::fmt::Display;

use serde::Serialize;

/// GNSS constellation, derived from the first character of the satellite
/// identifier.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constellation {
    Gps,
    Galileo,
    BeiDou,
    Glonass,
    Qzss,
    Irnss,
    Sbas,
}

impl Constellation {
    /// Map a satellite identifier prefix to its constellation, or `None` for
    /// an unrecognized prefix.
    #[must_use]
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'G' => Some(Constellation::Gps),
            'E' => Some(Constellation::Galileo),
            'C' => Some(Constellation::BeiDou),
            'R' => Some(Constellation::Glonass),
            'J' => Some(Constellation::Qzss),
            'I' => Some(Constellation::Irnss),
            'S' => Some(Constellation::Sbas),
            _ => None,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> char {
        match self {
            Constellation::Gps => 'G',
            Constellation::Galileo => 'E',
            Constellation::BeiDou => 'C',
            Constellation::Glonass => 'R',
            Constellation::Qzss => 'J',
            Constellation::Irnss => 'I',
            Constellation::Sbas => 'S',
        }
    }
}

impl Display for Constellation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Constellation::Gps => "GPS",
            Constellation::Galileo => "Galileo",
            Constellation::BeiDou => "BeiDou",
            Constellation::Glonass => "Glonass",
            Constellation::Qzss => "QZSS",
            Constellation::Irnss => "IRNSS",
            Constellation::Sbas => "SBAS",
        };
        write!(f, "{name}")
    }
}

/// Satellite vehicle identifier: constellation prefix plus a two-digit PRN,
/// e.g. `G05`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sv {
    pub constellation: Constellation,
    pub prn: u8,
}

impl Sv {
    /// Decode from the 3-character satellite column, or `None` when the
    /// prefix or PRN digits do not parse.
    #[must_use]
    pub fn decode(field: &str) -> Option<Self> {
        let mut chars = field.chars();
        let constellation = Constellation::from_prefix(chars.next()?)?;
        let prn: u8 = chars.as_str().parse().ok()?;
        Some(Sv { constellation, prn })
    }
}

impl Display for Sv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:02}", self.constellation.prefix(), self.prn)
    }
}

impl Serialize for Sv {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
