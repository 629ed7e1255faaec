// ABOUTME: Rock type taxonomy - 12 variants across sedimentary/igneous/metamorphic/soil
// ABOUTME: Fixed hardness and erosion-resistance values drawn from a static table (§3, §4.rock)

/// Closed rock-type enum. Ordering within each category follows
/// `original_source/engine/include/world/geological_data.h`'s relative
/// hardness ranking (igneous > metamorphic > sedimentary > soil) where the
/// distilled spec itself does not pin down exact numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RockType {
    // Sedimentary
    Limestone,
    Sandstone,
    Shale,
    // Igneous
    Granite,
    Basalt,
    Obsidian,
    // Metamorphic
    Marble,
    Slate,
    Quartzite,
    // Soil
    Clay,
    Sand,
    Loam,
}

impl RockType {
    pub const ALL: [RockType; 12] = [
        RockType::Limestone,
        RockType::Sandstone,
        RockType::Shale,
        RockType::Granite,
        RockType::Basalt,
        RockType::Obsidian,
        RockType::Marble,
        RockType::Slate,
        RockType::Quartzite,
        RockType::Clay,
        RockType::Sand,
        RockType::Loam,
    ];

    /// Hardness on a 0-10 scale.
    pub fn hardness(self) -> f32 {
        match self {
            RockType::Obsidian => 9.5,
            RockType::Granite => 8.5,
            RockType::Basalt => 7.5,
            RockType::Quartzite => 8.0,
            RockType::Marble => 6.0,
            RockType::Slate => 5.5,
            RockType::Sandstone => 4.5,
            RockType::Limestone => 4.0,
            RockType::Shale => 3.0,
            RockType::Loam => 1.5,
            RockType::Clay => 1.2,
            RockType::Sand => 1.0,
        }
    }

    /// Erosion resistance on a 0-10 scale; broadly tracks hardness but
    /// soluble sedimentary rock (limestone) is softer to chemical weathering
    /// than its mechanical hardness alone would suggest.
    pub fn erosion_resistance(self) -> f32 {
        match self {
            RockType::Obsidian => 9.0,
            RockType::Granite => 8.5,
            RockType::Quartzite => 8.5,
            RockType::Basalt => 7.0,
            RockType::Marble => 5.5,
            RockType::Slate => 5.0,
            RockType::Sandstone => 4.0,
            RockType::Shale => 3.5,
            RockType::Limestone => 2.5,
            RockType::Loam => 1.5,
            RockType::Clay => 1.3,
            RockType::Sand => 1.0,
        }
    }

    pub fn is_sedimentary(self) -> bool {
        matches!(self, RockType::Limestone | RockType::Sandstone | RockType::Shale)
    }

    pub fn is_igneous(self) -> bool {
        matches!(self, RockType::Granite | RockType::Basalt | RockType::Obsidian)
    }

    pub fn is_metamorphic(self) -> bool {
        matches!(self, RockType::Marble | RockType::Slate | RockType::Quartzite)
    }

    pub fn is_soil(self) -> bool {
        matches!(self, RockType::Clay | RockType::Sand | RockType::Loam)
    }

    /// Permeability used by `WaterSystemSimulator` groundwater recharge (§4.F).
    pub fn permeability(self) -> f32 {
        match self {
            RockType::Sandstone => 0.8,
            RockType::Limestone => 0.9,
            RockType::Shale => 0.2,
            RockType::Granite => 0.3,
            RockType::Basalt => 0.4,
            _ => 0.5,
        }
    }

    /// Fractal-detail rock-type multiplier used by `FractalDetailEngine` (§4.I).
    pub fn detail_multiplier(self) -> f32 {
        match self {
            RockType::Granite => 1.3,
            RockType::Sandstone => 0.9,
            RockType::Slate => 1.1,
            RockType::Basalt => 1.0,
            RockType::Limestone => 0.8,
            _ => 1.0,
        }
    }

    /// Mountain-building metamorphism under high crustal stress (§4.D).
    pub fn metamorphose_under_stress(self) -> RockType {
        match self {
            RockType::Sandstone => RockType::Slate,
            RockType::Granite => RockType::Marble,
            other => other,
        }
    }
}

impl Default for RockType {
    fn default() -> Self {
        RockType::Granite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardness_ordering_matches_category_expectation() {
        assert!(RockType::Granite.hardness() > RockType::Shale.hardness());
        assert!(RockType::Obsidian.hardness() > RockType::Sand.hardness());
    }

    #[test]
    fn permeability_table_covers_named_types() {
        assert_eq!(RockType::Sandstone.permeability(), 0.8);
        assert_eq!(RockType::Limestone.permeability(), 0.9);
        assert_eq!(RockType::Shale.permeability(), 0.2);
        assert_eq!(RockType::Granite.permeability(), 0.3);
        assert_eq!(RockType::Basalt.permeability(), 0.4);
        assert_eq!(RockType::Loam.permeability(), 0.5);
    }

    #[test]
    fn metamorphism_transforms_expected_pairs() {
        assert_eq!(RockType::Sandstone.metamorphose_under_stress(), RockType::Slate);
        assert_eq!(RockType::Granite.metamorphose_under_stress(), RockType::Marble);
        assert_eq!(RockType::Basalt.metamorphose_under_stress(), RockType::Basalt);
    }
}
