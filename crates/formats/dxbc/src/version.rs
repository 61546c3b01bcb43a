/// Program stage from the high half of the version token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramType {
    Pixel,
    Vertex,
    Geometry,
    Hull,
    Domain,
    Compute,
    /// Value outside the known set, kept as-is.
    Raw(u16),
}

impl ProgramType {
    pub fn from_u16(v: u16) -> Self {
        match v {
            0 => Self::Pixel,
            1 => Self::Vertex,
            2 => Self::Geometry,
            3 => Self::Hull,
            4 => Self::Domain,
            5 => Self::Compute,
            _ => Self::Raw(v),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Self::Pixel => 0,
            Self::Vertex => 1,
            Self::Geometry => 2,
            Self::Hull => 3,
            Self::Domain => 4,
            Self::Compute => 5,
            Self::Raw(v) => v,
        }
    }

    /// Two-letter profile prefix as used by `fxc` (`ps`, `vs`, ...).
    pub fn profile_prefix(self) -> &'static str {
        match self {
            Self::Pixel => "ps",
            Self::Vertex => "vs",
            Self::Geometry => "gs",
            Self::Hull => "hs",
            Self::Domain => "ds",
            Self::Compute => "cs",
            Self::Raw(_) => "??",
        }
    }
}

/// Decoded version token, the first word of an instruction chunk payload.
///
/// Layout: bits 0-3 minor, bits 4-7 major, bits 16-31 program type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderVersion {
    pub major: u8,
    pub minor: u8,
    pub program_type: ProgramType,
}

impl ShaderVersion {
    pub fn from_token(token: u32) -> Self {
        Self {
            minor: (token & 0xF) as u8,
            major: ((token >> 4) & 0xF) as u8,
            program_type: ProgramType::from_u16((token >> 16) as u16),
        }
    }

    pub fn to_token(self) -> u32 {
        (self.minor as u32 & 0xF)
            | ((self.major as u32 & 0xF) << 4)
            | ((self.program_type.as_u16() as u32) << 16)
    }

    /// Whether the chunk tag `SHEX` is expected (shader model 5+) rather than `SHDR`.
    pub fn uses_shex(self) -> bool {
        self.major >= 5
    }
}

impl std::fmt::Display for ShaderVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.program_type.profile_prefix(),
            self.major,
            self.minor
        )
    }
}
