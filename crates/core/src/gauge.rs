//! Percentage gauges with colour banding.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeBand {
    Good,
    Caution,
    Alert,
}

impl GaugeBand {
    pub fn as_str(self) -> &'static str {
        match self {
            GaugeBand::Good => "good",
            GaugeBand::Caution => "caution",
            GaugeBand::Alert => "alert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeThresholds {
    pub good_above: f64,
    pub caution_above: f64,
    pub polarity: Polarity,
}

impl GaugeThresholds {
    pub const fn higher_is_better() -> Self {
        Self {
            good_above: 85.0,
            caution_above: 50.0,
            polarity: Polarity::HigherIsBetter,
        }
    }

    pub const fn lower_is_better() -> Self {
        Self {
            good_above: 85.0,
            caution_above: 50.0,
            polarity: Polarity::LowerIsBetter,
        }
    }

    /// Band for `value`. Lower-is-better gauges are scored as `100 - value`.
    pub fn band(&self, value: f64) -> GaugeBand {
        let score = match self.polarity {
            Polarity::HigherIsBetter => value,
            Polarity::LowerIsBetter => 100.0 - value,
        };
        if score > self.good_above {
            GaugeBand::Good
        } else if score > self.caution_above {
            GaugeBand::Caution
        } else {
            GaugeBand::Alert
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if !in_range(self.good_above) || !in_range(self.caution_above) {
            return Err("gauge thresholds must be within 0-100".to_string());
        }
        if self.caution_above > self.good_above {
            return Err(format!(
                "caution_above ({}) must not exceed good_above ({})",
                self.caution_above, self.good_above
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    name: &'static str,
    thresholds: GaugeThresholds,
    value: Option<f64>,
}

impl Gauge {
    pub fn new(name: &'static str, thresholds: GaugeThresholds) -> Self {
        Self {
            name,
            thresholds,
            value: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Overwrite the reading. Non-finite values are ignored; others are clamped to 0-100.
    pub fn set(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            tracing::warn!(gauge = self.name, "Ignoring non-finite gauge value");
            return false;
        }
        self.value = Some(value.clamp(0.0, 100.0));
        true
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn band(&self) -> Option<GaugeBand> {
        self.value.map(|v| self.thresholds.band(v))
    }

    pub fn display(&self) -> String {
        match self.value {
            Some(v) => format!("{:.1}%", v),
            None => "--".to_string(),
        }
    }
}
