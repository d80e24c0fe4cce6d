//! Shading mode selection with lambert fallback.

/// Shading model a material renders with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Shading {
    /// Diffuse-lit surface (the default).
    #[default]
    Lambert,
    /// Unlit, texture color only.
    Color,
    /// PBR surface with roughness/metalness.
    Realistic,
}

impl Shading {
    /// Parse a shading name. Returns `None` for unknown names; callers fall
    /// back to lambert and warn.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "lambert" => Some(Self::Lambert),
            "color" => Some(Self::Color),
            "realistic" => Some(Self::Realistic),
            _ => None,
        }
    }

    /// Parse a shading name, warning and falling back to lambert when the
    /// name is unknown.
    pub fn parse_or_lambert(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::warn!("unknown shading \"{name}\", falling back to lambert");
            Self::Lambert
        })
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lambert => "lambert",
            Self::Color => "color",
            Self::Realistic => "realistic",
        }
    }
}
