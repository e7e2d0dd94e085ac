//! Packing engine configuration.

use serde::{Deserialize, Serialize};

use crate::stepping::StepPolicy;

/// Key casing used when writing persisted packing documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCasing {
    /// `loose_pieces`, `total_quantity`, `piece_count`.
    #[default]
    Snake,
    /// `loosePieces`, `totalQuantity`, `pieceCount`.
    Camel,
}

impl core::str::FromStr for FieldCasing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snake" | "snake_case" => Ok(FieldCasing::Snake),
            "camel" | "camelcase" => Ok(FieldCasing::Camel),
            other => Err(format!("unknown field casing '{other}'")),
        }
    }
}

/// Packing engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingConfig {
    /// Quantity stepping for the manual quantity field.
    pub step_policy: StepPolicy,
    /// Write an explicit `mode` key and trust it on load.
    pub persist_mode_tag: bool,
    /// Key casing at the persistence boundary.
    pub casing: FieldCasing,
    /// Decimal places for displayed totals.
    pub display_scale: u32,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            step_policy: StepPolicy::default(),
            persist_mode_tag: false,
            casing: FieldCasing::Snake,
            display_scale: 2,
        }
    }
}

impl PackingConfig {
    /// Defaults overridden by `LOOMERP_PERSIST_PACKING_MODE` and
    /// `LOOMERP_PACKING_CASING`. Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("LOOMERP_PERSIST_PACKING_MODE") {
            config.persist_mode_tag = raw.parse::<bool>().unwrap_or(false);
        }

        if let Ok(raw) = std::env::var("LOOMERP_PACKING_CASING") {
            match raw.parse::<FieldCasing>() {
                Ok(casing) => config.casing = casing,
                Err(e) => tracing::warn!(error = %e, "ignoring LOOMERP_PACKING_CASING"),
            }
        }

        config
    }

    pub fn with_step_policy(mut self, policy: StepPolicy) -> Self {
        self.step_policy = policy;
        self
    }

    pub fn with_mode_tag(mut self, persist: bool) -> Self {
        self.persist_mode_tag = persist;
        self
    }

    pub fn with_casing(mut self, casing: FieldCasing) -> Self {
        self.casing = casing;
        self
    }

    pub fn with_display_scale(mut self, scale: u32) -> Self {
        self.display_scale = scale;
        self
    }
}
