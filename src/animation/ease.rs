/// Easing functions used to map normalized animation progress.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// Linear interpolation.
    Linear,
    /// Cubic ease-out; drives the wheel deceleration.
    OutCubic,
    /// Elastic ease-out with period `0.3`; overshoots then settles. Drives the overlay reveal.
    OutElastic,
}

const ELASTIC_PERIOD: f64 = 0.3;

impl Ease {
    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    ///
    /// `OutElastic` may return values above `1.0` transiently.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::OutElastic => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let p = ELASTIC_PERIOD;
                2f64.powf(-10.0 * t) * ((t - p / 4.0) * (2.0 * std::f64::consts::PI) / p).sin()
                    + 1.0
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
