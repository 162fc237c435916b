// SPDX-License-Identifier: MIT

use serde::{Deserialize, Deserializer};

use crate::utils::pretty_bytes;

/// Byte size parsed from a `K`/`M`/`G`-suffixed string or a bare byte count.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Size(pub u64);

impl<'de> Deserialize<'de> for Size {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SizeVisitor;

        impl<'de> serde::de::Visitor<'de> for SizeVisitor {
            type Value = Size;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a size string like '64K', '3M', '1G' or a byte count")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                parse_size_bytes(value)
                    .map(Size)
                    .map_err(|e| E::custom(e.to_string()))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Size(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(value)
                    .map(Size)
                    .map_err(|_| E::custom(format!("Negative size {value}")))
            }
        }

        deserializer.deserialize_any(SizeVisitor)
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", pretty_bytes(self.0))
    }
}

pub fn parse_size_bytes(size: &str) -> anyhow::Result<u64> {
    let lower = size.trim().to_lowercase();

    if let Some(num) = lower.strip_suffix('k') {
        Ok(num.trim().parse::<u64>()? * 1024)
    } else if let Some(num) = lower.strip_suffix('m') {
        Ok(num.trim().parse::<u64>()? * 1024 * 1024)
    } else if let Some(num) = lower.strip_suffix('g') {
        Ok(num.trim().parse::<u64>()? * 1024 * 1024 * 1024)
    } else if !lower.is_empty() && lower.chars().all(|c| c.is_ascii_digit()) {
        Ok(lower.parse::<u64>()?)
    } else {
        anyhow::bail!("Unknown size format '{}'. Use K, M or G suffix.", size)
    }
}

/// clap value parser sharing the profile's size grammar.
pub fn parse_size_arg(value: &str) -> Result<u64, String> {
    parse_size_bytes(value).map_err(|e| e.to_string())
}
