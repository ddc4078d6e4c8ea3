//! Regional parameter identifiers as they appear on the wire.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

/// Declares a fieldless enum whose wire form is a fixed string per variant.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $err:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(non_camel_case_types)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseError::$err(s.to_string())),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

wire_enum! {
    /// Common name of a regulatory region.
    CommonName, CommonName {
        EU868 => "EU868",
        US915 => "US915",
        CN779 => "CN779",
        EU433 => "EU433",
        AU915 => "AU915",
        CN470 => "CN470",
        AS923 => "AS923",
        AS923_2 => "AS923_2",
        AS923_3 => "AS923_3",
        AS923_4 => "AS923_4",
        KR920 => "KR920",
        IN865 => "IN865",
        RU864 => "RU864",
        ISM2400 => "ISM2400",
    }
}

wire_enum! {
    /// LoRaWAN MAC layer version implemented by a device.
    MacVersion, MacVersion {
        LORAWAN_1_0_0 => "1.0.0",
        LORAWAN_1_0_1 => "1.0.1",
        LORAWAN_1_0_2 => "1.0.2",
        LORAWAN_1_0_3 => "1.0.3",
        LORAWAN_1_0_4 => "1.0.4",
        LORAWAN_1_1_0 => "1.1.0",
    }
}

wire_enum! {
    /// Revision of the regional parameters specification.
    Revision, Revision {
        A => "A",
        B => "B",
        RP002_1_0_0 => "RP002-1.0.0",
        RP002_1_0_1 => "RP002-1.0.1",
        RP002_1_0_2 => "RP002-1.0.2",
        RP002_1_0_3 => "RP002-1.0.3",
        RP002_1_0_4 => "RP002-1.0.4",
    }
}
