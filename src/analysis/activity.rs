//! Activity, liveability and survivability classification of hourly
//! indoor conditions against empirical limit curves.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Humidity grid spacing of the limit-curve tables (%).
pub const RH_STEP: f64 = 0.5;
/// Lowest tabulated humidity (%).
pub const RH_MIN: f64 = 0.5;
/// Highest tabulated humidity (%).
pub const RH_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    /// Young adults, 18 to 40.
    Young,
    /// Adults over 65.
    Elderly,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 2] = [AgeGroup::Young, AgeGroup::Elderly];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Young => "young",
            AgeGroup::Elderly => "elderly",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    /// Beyond this temperature the exposure is not survivable.
    Survivability,
    /// Beyond this temperature no activity is sustainable without storing heat.
    Liveability,
    /// Beyond this temperature only light activity is sustainable.
    LightActivity,
}

impl LimitKind {
    pub const ALL: [LimitKind; 3] = [
        LimitKind::Survivability,
        LimitKind::Liveability,
        LimitKind::LightActivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LimitKind::Survivability => "survivability",
            LimitKind::Liveability => "liveability",
            LimitKind::LightActivity => "light_activity",
        }
    }
}

/// Snaps a relative humidity to the table grid, in half-percent steps.
///
/// The result is clamped to `[RH_MIN, RH_MAX]` and returned as an integer
/// grid index (`rh / RH_STEP`). `None` for NaN.
pub fn snap_humidity(rh: f64) -> Option<u16> {
    if rh.is_nan() {
        return None;
    }
    Some((rh.clamp(RH_MIN, RH_MAX) / RH_STEP).round() as u16)
}

fn is_tabulated_humidity(rh: f64) -> bool {
    (RH_MIN..=RH_MAX).contains(&rh)
}

/// Limiting dry-bulb temperature as a function of relative humidity.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitCurve {
    kind: LimitKind,
    age_group: AgeGroup,
    /// Grid index (`rh / RH_STEP`) -> limiting temperature (°C).
    limits: BTreeMap<u16, f64>,
}

impl LimitCurve {
    /// Builds a curve from `(relative humidity %, temperature °C)` points.
    ///
    /// Points are snapped to the humidity grid; a later point on the same
    /// grid index replaces an earlier one. Humidities outside
    /// `[RH_MIN, RH_MAX]` and non-finite temperatures are rejected.
    pub fn from_points<I>(kind: LimitKind, age_group: AgeGroup, points: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut limits = BTreeMap::new();
        for (rh, t) in points {
            match snap_humidity(rh) {
                Some(idx) if is_tabulated_humidity(rh) && t.is_finite() => {
                    limits.insert(idx, t);
                }
                _ => {
                    return Err(AnalysisError::InvalidParameter(format!(
                        "{} limit for {age_group}: invalid point (rh {rh}, T {t})",
                        kind.as_str()
                    )));
                }
            }
        }
        Ok(Self {
            kind,
            age_group,
            limits,
        })
    }

    pub fn kind(&self) -> LimitKind {
        self.kind
    }

    pub fn age_group(&self) -> AgeGroup {
        self.age_group
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Limiting temperature at the grid point nearest to `rh`.
    pub fn limit_at(&self, rh: f64) -> Result<f64, AnalysisError> {
        let idx = snap_humidity(rh).ok_or_else(|| {
            AnalysisError::InvalidParameter("relative humidity is NaN".to_string())
        })?;
        self.limits
            .get(&idx)
            .copied()
            .ok_or(AnalysisError::LimitCurveGap {
                kind: self.kind,
                age_group: self.age_group,
                rh: idx as f64 * RH_STEP,
            })
    }

    /// Checks that every grid point from `RH_MIN` to `RH_MAX` is tabulated.
    pub fn validate_complete(&self) -> Result<(), AnalysisError> {
        let first = (RH_MIN / RH_STEP).round() as u16;
        let last = (RH_MAX / RH_STEP).round() as u16;
        match (first..=last).find(|i| !self.limits.contains_key(i)) {
            Some(missing) => Err(AnalysisError::LimitCurveGap {
                kind: self.kind,
                age_group: self.age_group,
                rh: missing as f64 * RH_STEP,
            }),
            None => Ok(()),
        }
    }
}

/// All limit curves of a run, keyed by limit type and age group.
#[derive(Debug, Clone, Default)]
pub struct LimitCurveSet {
    curves: HashMap<(LimitKind, AgeGroup), LimitCurve>,
}

impl LimitCurveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, curve: LimitCurve) {
        self.curves.insert((curve.kind, curve.age_group), curve);
    }

    pub fn get(&self, kind: LimitKind, age_group: AgeGroup) -> Result<&LimitCurve, AnalysisError> {
        self.curves
            .get(&(kind, age_group))
            .ok_or(AnalysisError::LimitCurveMissing { kind, age_group })
    }

    /// Ensures all three limit types exist for every age group and cover
    /// the whole humidity grid.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for age_group in AgeGroup::ALL {
            for kind in LimitKind::ALL {
                self.get(kind, age_group)?.validate_complete()?;
            }
        }
        Ok(())
    }
}

/// Mutually exclusive activity bands, from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActivityBand {
    /// Moderate or vigorous activity can be sustained.
    ModerateOrVigorous,
    /// Only light activity can be sustained.
    LightOnly,
    /// Survivable, but no activity without storing heat.
    LiveableNoActivity,
    NotSurvivable,
}

impl ActivityBand {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Hour counts per activity band, indexed by [`ActivityBand::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTally {
    pub counts: [usize; 4],
}

impl ActivityTally {
    pub fn add(&mut self, band: ActivityBand) {
        self.counts[band.index()] += 1;
    }

    pub fn count(&self, band: ActivityBand) -> usize {
        self.counts[band.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Classifies hourly conditions for one age group.
#[derive(Debug, Clone, Copy)]
pub struct ActivityClassifier<'a> {
    survivability: &'a LimitCurve,
    liveability: &'a LimitCurve,
    light_activity: &'a LimitCurve,
}

impl<'a> ActivityClassifier<'a> {
    pub fn new(curves: &'a LimitCurveSet, age_group: AgeGroup) -> Result<Self, AnalysisError> {
        Ok(Self {
            survivability: curves.get(LimitKind::Survivability, age_group)?,
            liveability: curves.get(LimitKind::Liveability, age_group)?,
            light_activity: curves.get(LimitKind::LightActivity, age_group)?,
        })
    }

    /// Evaluates the limits top-down; reaching a limit (`>=`) puts the hour in that band.
    pub fn classify(&self, temperature: f64, rh: f64) -> Result<ActivityBand, AnalysisError> {
        if temperature >= self.survivability.limit_at(rh)? {
            return Ok(ActivityBand::NotSurvivable);
        }
        if temperature >= self.liveability.limit_at(rh)? {
            return Ok(ActivityBand::LiveableNoActivity);
        }
        if temperature >= self.light_activity.limit_at(rh)? {
            return Ok(ActivityBand::LightOnly);
        }
        Ok(ActivityBand::ModerateOrVigorous)
    }

    /// Tallies the classification of paired temperature and humidity samples.
    pub fn tally<I>(&self, samples: I) -> Result<ActivityTally, AnalysisError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut tally = ActivityTally::default();
        for (t, rh) in samples {
            tally.add(self.classify(t, rh)?);
        }
        Ok(tally)
    }
}
