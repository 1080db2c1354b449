use std::fmt;

use serde::{Deserialize, Serialize};

/// A named section of an analysis framework
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDef {
    /// Key used in the generated JSON and in template region markers
    pub key: &'static str,
    /// Label shown to readers
    pub label: &'static str,
}

const FOUR_P_SECTIONS: &[SectionDef] = &[
    SectionDef { key: "product", label: "Product" },
    SectionDef { key: "price", label: "Price" },
    SectionDef { key: "place", label: "Place" },
    SectionDef { key: "promotion", label: "Promotion" },
];

const FIVE_FORCES_SECTIONS: &[SectionDef] = &[
    SectionDef { key: "new_entrants", label: "Threat of new entrants" },
    SectionDef { key: "supplier_power", label: "Bargaining power of suppliers" },
    SectionDef { key: "buyer_power", label: "Bargaining power of buyers" },
    SectionDef { key: "substitutes", label: "Threat of substitutes" },
    SectionDef { key: "rivalry", label: "Industry rivalry" },
];

/// Business framework an analysis is produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    /// Product, Price, Place, Promotion
    FourP,
    /// Porter's Five Forces
    FiveForces,
}

impl Framework {
    /// Sections in presentation order
    pub fn sections(&self) -> &'static [SectionDef] {
        match self {
            Framework::FourP => FOUR_P_SECTIONS,
            Framework::FiveForces => FIVE_FORCES_SECTIONS,
        }
    }

    pub fn section_keys(&self) -> impl Iterator<Item = &'static str> {
        self.sections().iter().map(|s| s.key)
    }

    pub fn section(&self, key: &str) -> Option<&'static SectionDef> {
        self.sections().iter().find(|s| s.key == key)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Framework::FourP => "4P Analysis",
            Framework::FiveForces => "Five Forces Analysis",
        }
    }

    /// Whether a strategic summary header is generated for this framework
    pub fn supports_summary(&self) -> bool {
        matches!(self, Framework::FourP)
    }

    /// Short tag used in output file names
    pub fn file_tag(&self) -> &'static str {
        match self {
            Framework::FourP => "4P_analysis",
            Framework::FiveForces => "five_forces_analysis",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
