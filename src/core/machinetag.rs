//! Machinetag codec.
//!
//! The wire format is exactly `namespace:type="value"`: a run of
//! non-colon characters, a colon, a run of non-equals characters, an
//! equals sign, and the value between one pair of double quotes ending
//! the string. Empty segments are grammatical. The value itself must not
//! contain a double quote; the format has no escaping.

use std::fmt;
use std::str::FromStr;

use super::error::MalformedTag;

/// Namespace used for every tag this crate generates.
pub const MISP_GALAXY_NAMESPACE: &str = "misp-galaxy";

/// One parsed machinetag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MachineTag {
    pub namespace: String,
    pub tag_type: String,
    pub value: String,
}

impl MachineTag {
    pub fn new(
        namespace: impl Into<String>,
        tag_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            tag_type: tag_type.into(),
            value: value.into(),
        }
    }

    /// Tag in the `misp-galaxy` namespace.
    pub fn misp_galaxy(tag_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(MISP_GALAXY_NAMESPACE, tag_type, value)
    }

    /// Parse a machinetag string.
    ///
    /// Splits at the first `:` and the first `=`; the remainder must be
    /// a double-quoted run with no embedded quote.
    pub fn parse(raw: &str) -> Result<Self, MalformedTag> {
        let Some((namespace, rest)) = raw.split_once(':') else {
            return Err(MalformedTag {
                raw: raw.to_string(),
                reason: "missing `:` separator",
            });
        };
        let Some((tag_type, quoted)) = rest.split_once('=') else {
            return Err(MalformedTag {
                raw: raw.to_string(),
                reason: "missing `=` separator",
            });
        };
        let value = quoted
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .ok_or(MalformedTag {
                raw: raw.to_string(),
                reason: "value must be wrapped in double quotes",
            })?;
        if value.contains('"') {
            return Err(MalformedTag {
                raw: raw.to_string(),
                reason: "value must not contain a double quote",
            });
        }
        Ok(Self::new(namespace, tag_type, value))
    }
}

impl FromStr for MachineTag {
    type Err = MalformedTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MachineTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}=\"{}\"", self.namespace, self.tag_type, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_first_separators() {
        let tag = MachineTag::parse("misp-galaxy:threat-actor=\"Sofacy\"").unwrap();
        assert_eq!(tag.namespace, "misp-galaxy");
        assert_eq!(tag.tag_type, "threat-actor");
        assert_eq!(tag.value, "Sofacy");
    }

    #[test]
    fn display_roundtrips() {
        let raw = "misp-galaxy:ransomware=\"Locky\"";
        let tag: MachineTag = raw.parse().unwrap();
        assert_eq!(tag.to_string(), raw);
    }

    #[test]
    fn empty_segments_are_grammatical() {
        let tag = MachineTag::parse(":=\"\"").unwrap();
        assert_eq!(tag.namespace, "");
        assert_eq!(tag.tag_type, "");
        assert_eq!(tag.value, "");
    }

    #[test]
    fn type_may_contain_a_colon() {
        let tag = MachineTag::parse("ns:a:b=\"v\"").unwrap();
        assert_eq!(tag.namespace, "ns");
        assert_eq!(tag.tag_type, "a:b");
    }

    #[test]
    fn malformed_tags_are_rejected() {
        for raw in [
            "blah",
            "no-equals:type\"v\"",
            "ns:type=v",
            "ns:type=\"v",
            "ns:type=v\"",
            "ns:type=\"a\"b\"",
        ] {
            assert!(MachineTag::parse(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn misp_galaxy_namespace_is_fixed() {
        let tag = MachineTag::misp_galaxy("tool", "PlugX");
        assert_eq!(tag.to_string(), "misp-galaxy:tool=\"PlugX\"");
    }
}
