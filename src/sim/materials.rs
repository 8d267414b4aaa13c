use serde::{Deserialize, Serialize};
use std::fmt;

/// Room surface material.
///
/// Each variant carries a single broadband absorption coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    #[default]
    Concrete,
    Plastic,
    Wood,
}

impl Material {
    pub const ALL: [Material; 3] = [Material::Concrete, Material::Plastic, Material::Wood];

    /// Fraction of incident energy absorbed on reflection, in `[0, 1)`.
    pub fn absorption(&self) -> f64 {
        match self {
            Material::Concrete => 0.02,
            Material::Plastic => 0.03,
            Material::Wood => 0.10,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Material::Concrete => "concrete",
            Material::Plastic => "plastic",
            Material::Wood => "wood",
        }
    }

    /// Case-insensitive lookup by name. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorption_coefficients() {
        assert_eq!(Material::Concrete.absorption(), 0.02);
        assert_eq!(Material::Plastic.absorption(), 0.03);
        assert_eq!(Material::Wood.absorption(), 0.10);
        for m in Material::ALL {
            assert!((0.0..1.0).contains(&m.absorption()));
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Material::from_name("wood"), Some(Material::Wood));
        assert_eq!(Material::from_name(" Plastic "), Some(Material::Plastic));
        assert_eq!(Material::from_name("glass"), None);
    }

    #[test]
    fn test_serde_lowercase() {
        let m: Material = serde_json::from_str("\"concrete\"").unwrap();
        assert_eq!(m, Material::Concrete);
        assert_eq!(serde_json::to_string(&Material::Wood).unwrap(), "\"wood\"");
    }
}
