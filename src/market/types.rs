//! Canonical market vocabulary shared by the normalizer and the engine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Canonical outcome key used to align outcomes across bookmakers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum OutcomeKey {
    /// Home side wins.
    Home,
    /// Match ends level.
    Draw,
    /// Away side wins.
    Away,
    /// Total goes over the line.
    Over,
    /// Total stays under the line.
    Under,
    /// Label could not be mapped. Never satisfies coverage.
    Unknown,
}

impl OutcomeKey {
    /// Upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKey::Home => "HOME",
            OutcomeKey::Draw => "DRAW",
            OutcomeKey::Away => "AWAY",
            OutcomeKey::Over => "OVER",
            OutcomeKey::Under => "UNDER",
            OutcomeKey::Unknown => "UNKNOWN",
        }
    }

    /// Whether this is a real outcome (anything but `Unknown`).
    pub fn is_known(&self) -> bool {
        !matches!(self, OutcomeKey::Unknown)
    }
}

/// Shape of a market without its parameters.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FamilyKind {
    /// Two-way winner market, no draw.
    Moneyline,
    /// 1X2 market.
    ThreeWay,
    /// Over/under a numeric line.
    Totals,
}

impl FamilyKind {
    /// Outcomes that must all be priced for the market to be fully covered,
    /// in canonical order.
    pub fn required_outcomes(&self) -> &'static [OutcomeKey] {
        match self {
            FamilyKind::Moneyline => &[OutcomeKey::Home, OutcomeKey::Away],
            FamilyKind::ThreeWay => &[OutcomeKey::Home, OutcomeKey::Draw, OutcomeKey::Away],
            FamilyKind::Totals => &[OutcomeKey::Over, OutcomeKey::Under],
        }
    }
}

/// Market family. Only totals carry a line, so a totals market without a
/// line cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MarketFamily {
    /// Two-way winner market.
    Moneyline,
    /// 1X2 market.
    ThreeWay,
    /// Over/under market.
    Totals {
        /// Threshold the total is compared against (e.g. 2.5).
        line: f64,
    },
}

impl MarketFamily {
    /// Family without parameters.
    pub fn kind(&self) -> FamilyKind {
        match self {
            MarketFamily::Moneyline => FamilyKind::Moneyline,
            MarketFamily::ThreeWay => FamilyKind::ThreeWay,
            MarketFamily::Totals { .. } => FamilyKind::Totals,
        }
    }

    /// Line for totals markets.
    pub fn line(&self) -> Option<f64> {
        match self {
            MarketFamily::Totals { line } => Some(*line),
            _ => None,
        }
    }

    /// See [`FamilyKind::required_outcomes`].
    pub fn required_outcomes(&self) -> &'static [OutcomeKey] {
        self.kind().required_outcomes()
    }
}

/// Temporal scope of a market. Only full time is produced today.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Period {
    #[default]
    FullTime,
    FirstHalf,
    SecondHalf,
    FirstQuarter,
    SecondQuarter,
    ThirdQuarter,
    FourthQuarter,
}

/// Result of classifying a provider market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NormalizedMarket {
    /// Market family (carries the line for totals).
    pub family: MarketFamily,
    /// Temporal scope.
    pub period: Period,
    /// Complete canonical outcome set required for coverage.
    pub outcomes: Vec<OutcomeKey>,
}

impl NormalizedMarket {
    /// Build a market whose outcome set is the family's required set.
    pub fn new(family: MarketFamily, period: Period) -> Self {
        Self {
            family,
            period,
            outcomes: family.required_outcomes().to_vec(),
        }
    }

    /// Line for totals markets.
    pub fn line(&self) -> Option<f64> {
        self.family.line()
    }

    /// Short human label, e.g. `three-way full_time` or `totals 2.5 full_time`.
    pub fn label(&self) -> String {
        match self.family.line() {
            Some(line) => format!("{} {} {}", self.family.kind(), line, self.period),
            None => format!("{} {}", self.family.kind(), self.period),
        }
    }
}

/// One raw outcome as delivered by a provider.
///
/// `point` is the side-channel threshold providers attach to totals
/// outcomes; it is never parsed out of `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RawOutcome {
    /// Provider label ("Arsenal", "Draw", "Over", ...).
    pub name: String,
    /// Decimal odd.
    pub price: f64,
    /// Line value for totals outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<f64>,
}

impl RawOutcome {
    /// Outcome without a line.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            point: None,
        }
    }

    /// Outcome carrying a line value.
    pub fn with_point(name: impl Into<String>, price: f64, point: f64) -> Self {
        Self {
            name: name.into(),
            price,
            point: Some(point),
        }
    }
}
