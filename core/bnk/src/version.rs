//! Bank generation versions.
//!
//! The version word read from BKHD selects the binary layout of almost every
//! structure in the bank. It is checked once here and then passed by value to
//! every decoder and encoder.

use crate::error::{BnkError, Result};

/// Stock versions whose layouts this codec implements. Sorted.
pub const SUPPORTED_VERSIONS: &[u32] = &[
    112, 113, 118, 120, 125, 126, 128, 129, 132, 134, 135, 136, 140, 141, 144, 145, 150, 152,
    154,
];

/// Vendor builds that ship a modified layout under a marked version word.
const CUSTOM_BUILDS: &[(u32, &str)] = &[
    (0x8000_0071, "B build 113"),
    (0x8000_0088, "B build 136"),
    (0x8000_0089, "B build 137"),
];

const CUSTOM_BIT: u32 = 0x8000_0000;
const SCRAMBLED_BITS: u32 = 0x7FFF_0000;

/// Validate a BKHD version word and return it when the codec understands it.
pub fn check_version(version: u32) -> Result<u32> {
    if version <= 1 {
        return Err(BnkError::LegacyVersion(version));
    }
    if let Some((_, marker)) = CUSTOM_BUILDS.iter().find(|(v, _)| *v == version) {
        return Err(BnkError::CustomBuild { version, marker });
    }
    if version & CUSTOM_BIT != 0 {
        return Err(BnkError::UnknownCustomBuild(version));
    }
    if version & SCRAMBLED_BITS != 0 {
        return Err(BnkError::Encrypted(version));
    }
    if SUPPORTED_VERSIONS.binary_search(&version).is_ok() {
        Ok(version)
    } else {
        Err(BnkError::UnsupportedVersion {
            version,
            supported: SUPPORTED_VERSIONS,
        })
    }
}

/// Counts and some IDs switch from fixed-width integers to 7-bit varints.
pub(crate) fn uses_var_counts(version: u32) -> bool {
    version > 122
}

/// FX metadata list after the node FX chunk.
pub(crate) fn has_fx_metadata(version: u32) -> bool {
    version >= 136
}

/// Attachment-parameter override flag, dropped again after 145.
pub(crate) fn has_attachment_override(version: u32) -> bool {
    (128..=145).contains(&version)
}

/// Reflections aux bus reference in aux params.
pub(crate) fn has_reflections_aux(version: u32) -> bool {
    version >= 135
}

/// Action type codes for break/trigger/bypass were renumbered.
pub(crate) fn uses_renumbered_actions(version: u32) -> bool {
    version >= 150
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_list_is_sorted() {
        assert!(SUPPORTED_VERSIONS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_version_classes() {
        assert!(matches!(check_version(0), Err(BnkError::LegacyVersion(0))));
        assert!(matches!(check_version(1), Err(BnkError::LegacyVersion(1))));
        assert!(matches!(
            check_version(0x8000_0088),
            Err(BnkError::CustomBuild { marker: "B build 136", .. })
        ));
        assert!(matches!(
            check_version(0x8000_0140),
            Err(BnkError::UnknownCustomBuild(0x8000_0140))
        ));
        assert!(matches!(
            check_version(0x3A91_008D),
            Err(BnkError::Encrypted(_))
        ));
        assert!(matches!(check_version(141), Ok(141)));
        assert!(matches!(
            check_version(142),
            Err(BnkError::UnsupportedVersion { version: 142, .. })
        ));
    }
}
