use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Bit marking a hardened derivation step
pub const HARDENED: u32 = 0x8000_0000;

/// Number of leading components the device app hardens implicitly
const HARDENED_COMPONENTS: usize = 3;

/// A `m/purpose'/coin'/account'/change/index` derivation path.
///
/// Components are stored unhardened: the first three are hardened when the
/// path is serialized for the device, so callers write `[44, 931, 0, 0, 0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bip44Path([u32; 5]);

impl Bip44Path {
    /// Length in bytes of [`Bip44Path::serialize`]
    pub const SERIALIZED_LEN: usize = 20;

    /// Create a path, components must not carry the hardened bit
    pub fn new(components: [u32; 5]) -> Result<Self> {
        match components
            .iter()
            .enumerate()
            .find(|(_, value)| **value & HARDENED != 0)
        {
            Some((index, value)) => Err(Error::HardenedComponent {
                index,
                value: *value,
            }),
            None => Ok(Self(components)),
        }
    }

    /// The components as given at construction
    pub fn components(&self) -> &[u32; 5] {
        &self.0
    }

    /// The components as sent to the device, first three hardened
    pub fn hardened(&self) -> [u32; 5] {
        let mut components = self.0;
        for c in components.iter_mut().take(HARDENED_COMPONENTS) {
            *c |= HARDENED;
        }
        components
    }

    /// Serialize in the format used by the app: 5 little endian `u32`
    pub fn serialize(&self) -> Vec<u8> {
        self.hardened()
            .iter()
            .fold(Vec::with_capacity(Self::SERIALIZED_LEN), |mut acc, c| {
                acc.extend_from_slice(&c.to_le_bytes());
                acc
            })
    }
}

impl TryFrom<[u32; 5]> for Bip44Path {
    type Error = Error;

    fn try_from(components: [u32; 5]) -> Result<Self> {
        Self::new(components)
    }
}

impl fmt::Display for Bip44Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for (i, c) in self.0.iter().enumerate() {
            if i < HARDENED_COMPONENTS {
                write!(f, "/{c}'")?;
            } else {
                write!(f, "/{c}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Bip44Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidPath(s.to_string());
        let rest = s.strip_prefix("m/").unwrap_or(s);
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != 5 {
            return Err(invalid());
        }

        let mut components = [0u32; 5];
        for (i, part) in parts.iter().enumerate() {
            let unmarked = part.trim_end_matches(['\'', 'h']);
            let marked = unmarked.len() != part.len();
            if marked && i >= HARDENED_COMPONENTS {
                return Err(invalid());
            }
            components[i] = unmarked.parse().map_err(|_| invalid())?;
        }
        Self::new(components)
    }
}
