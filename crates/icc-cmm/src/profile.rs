//! Public profile handle: a thin, typed wrapper around a parsed
//! [`crate::icc::IccProfile`] for callers who don't need the parser's
//! internals, but still want to hand a profile to
//! [`crate::pipeline::CmmPipeline::add_xform`].

use crate::icc::header::ColorSpace as IccColorSpace;
use crate::icc::IccProfile;
use crate::{Error, Result};

/// A parsed ICC v2/v4 profile.
#[derive(Debug, Clone)]
pub struct ColorProfile {
    profile: IccProfile,
}

/// Color space type, mirrored from the ICC header signature for callers
/// who don't want to depend on `icc::header` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ColorSpace {
    /// RGB color space
    Rgb,
    /// CMYK color space
    Cmyk,
    /// Grayscale
    Gray,
    /// CIE L*a*b*
    Lab,
    /// CIE XYZ
    Xyz,
    /// Unknown color space, carrying the raw 4-byte signature
    Unknown(u32),
}

impl From<IccColorSpace> for ColorSpace {
    fn from(space: IccColorSpace) -> Self {
        match space {
            IccColorSpace::Rgb => ColorSpace::Rgb,
            IccColorSpace::Cmyk => ColorSpace::Cmyk,
            IccColorSpace::Gray => ColorSpace::Gray,
            IccColorSpace::Lab => ColorSpace::Lab,
            IccColorSpace::Xyz => ColorSpace::Xyz,
            _ => ColorSpace::Unknown(0),
        }
    }
}

/// Profile connection space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileConnectionSpace {
    /// CIE XYZ
    Xyz,
    /// CIE L*a*b*
    Lab,
}

impl ColorProfile {
    /// Parse a profile from raw ICC bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let profile = IccProfile::parse(data).map_err(Error::ProfileParse)?;
        Ok(Self { profile })
    }

    /// The parsed profile this handle wraps, for `CmmPipeline::add_xform`.
    pub fn inner(&self) -> &IccProfile {
        &self.profile
    }

    pub fn color_space(&self) -> ColorSpace {
        self.profile.header.color_space.into()
    }

    /// `(major, minor)` ICC version, e.g. `(4, 4)`.
    pub fn version(&self) -> (u8, u8) {
        (self.profile.header.version.major, self.profile.header.version.minor)
    }

    pub fn pcs(&self) -> Option<ProfileConnectionSpace> {
        match self.profile.header.pcs {
            IccColorSpace::Xyz => Some(ProfileConnectionSpace::Xyz),
            IccColorSpace::Lab => Some(ProfileConnectionSpace::Lab),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<String> {
        self.profile.description()
    }

    /// Raw profile bytes, as originally parsed.
    pub fn data(&self) -> &[u8] {
        self.profile.raw_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_small_profile() {
        let small_data = [0u8; 64];
        assert!(ColorProfile::from_bytes(&small_data).is_err());
    }
}
