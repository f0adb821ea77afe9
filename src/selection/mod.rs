//! Winner selection: typed generation requests and their resolution against the catalog.

use rand::Rng;

use crate::animation::spin::SpeedLevel;
use crate::catalog::model::{Catalog, Entry, MAX_POSITION};
use crate::foundation::error::{WheelError, WheelResult};

/// How the winning entry is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Exact lookup of a catalog position.
    Manual {
        /// Requested position.
        number: u32,
    },
    /// Uniform draw over the catalog.
    Random,
}

/// Validated generation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Winner selection mode.
    pub selection: Selection,
    /// Spin intensity.
    pub speed: SpeedLevel,
    /// Optional spin-phase duration in milliseconds.
    pub spin_duration_ms: Option<u64>,
}

/// Request body of `POST /api/generate-wheel`, before validation.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWheelBody {
    /// Requested position, required unless `is_random`.
    #[serde(default)]
    pub selected_number: Option<i64>,
    /// Draw the winner at random.
    #[serde(default)]
    pub is_random: bool,
    /// Speed level, clamped into `1..=5`.
    #[serde(default)]
    pub spin_speed: Option<i64>,
    /// Spin-phase duration in milliseconds.
    #[serde(default)]
    pub spin_duration: Option<i64>,
}

impl GenerateWheelBody {
    /// Validate into a [`GenerationRequest`].
    pub fn validate(&self) -> WheelResult<GenerationRequest> {
        let selection = if self.is_random {
            Selection::Random
        } else {
            let n = self.selected_number.ok_or_else(|| {
                WheelError::validation("selectedNumber is required when isRandom is false")
            })?;
            let number = u32::try_from(n)
                .ok()
                .filter(|n| *n <= MAX_POSITION)
                .ok_or_else(|| {
                    WheelError::validation(format!(
                        "selectedNumber must be between 0 and {MAX_POSITION}, got {n}"
                    ))
                })?;
            Selection::Manual { number }
        };

        let spin_duration_ms = match self.spin_duration {
            None => None,
            Some(ms) if ms > 0 => Some(ms as u64),
            Some(ms) => {
                return Err(WheelError::validation(format!(
                    "spinDuration must be > 0 ms, got {ms}"
                )));
            }
        };

        Ok(GenerationRequest {
            selection,
            speed: self
                .spin_speed
                .map(SpeedLevel::clamped)
                .unwrap_or_default(),
            spin_duration_ms,
        })
    }
}

/// Resolve the winning entry using the supplied RNG for random draws.
pub fn resolve_with<R: Rng + ?Sized>(
    catalog: &Catalog,
    selection: Selection,
    rng: &mut R,
) -> WheelResult<Entry> {
    match selection {
        Selection::Manual { number } => catalog
            .find(number)
            .cloned()
            .ok_or_else(|| {
                WheelError::not_found(format!("no catalog entry for position {number}"))
            }),
        Selection::Random => {
            if catalog.is_empty() {
                return Err(WheelError::not_found("catalog is empty"));
            }
            let i = rng.gen_range(0..catalog.len());
            Ok(catalog.entries()[i].clone())
        }
    }
}

/// Resolve the winning entry; random draws use the thread-local CSPRNG.
pub fn resolve(catalog: &Catalog, selection: Selection) -> WheelResult<Entry> {
    resolve_with(catalog, selection, &mut rand::thread_rng())
}

#[cfg(test)]
#[path = "../../tests/unit/selection/mod.rs"]
mod tests;
