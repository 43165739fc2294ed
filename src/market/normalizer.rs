//! Provider market and outcome normalization.
//!
//! Maps provider-specific vocabulary onto [`OutcomeKey`] / [`MarketFamily`]
//! and decides whether an observed outcome set covers its market.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use super::types::{FamilyKind, MarketFamily, NormalizedMarket, OutcomeKey, Period, RawOutcome};

/// Provider key for winner markets.
pub const MARKET_H2H: &str = "h2h";
/// Provider key for over/under markets.
pub const MARKET_TOTALS: &str = "totals";

/// Labels that mark a draw outcome.
const DRAW_LABELS: [&str; 2] = ["draw", "x"];

static DEFAULT_SYNONYMS: Lazy<OutcomeSynonyms> = Lazy::new(OutcomeSynonyms::default);

/// Synonym lists used when a label is not one of the event's team names.
///
/// Home/away entries match the whole label; over/under entries match as
/// substrings. Everything is stored lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeSynonyms {
    home: Vec<String>,
    away: Vec<String>,
    over: Vec<String>,
    under: Vec<String>,
}

impl Default for OutcomeSynonyms {
    fn default() -> Self {
        Self {
            home: lowered(["1", "home"]),
            away: lowered(["2", "away"]),
            over: lowered(["over", "acima", "mais de"]),
            under: lowered(["under", "abaixo", "menos de"]),
        }
    }
}

impl OutcomeSynonyms {
    /// Add extra substrings meaning "over".
    pub fn with_over<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        extend_unique(&mut self.over, extra);
        self
    }

    /// Add extra substrings meaning "under".
    pub fn with_under<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        extend_unique(&mut self.under, extra);
        self
    }

    /// Over substrings.
    pub fn over(&self) -> &[String] {
        &self.over
    }

    /// Under substrings.
    pub fn under(&self) -> &[String] {
        &self.under
    }
}

fn lowered<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

fn extend_unique<I, S>(target: &mut Vec<String>, extra: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for item in extra {
        let item = item.as_ref().trim().to_lowercase();
        if !item.is_empty() && !target.contains(&item) {
            target.push(item);
        }
    }
}

fn is_draw_label(label: &str) -> bool {
    let label = label.trim();
    DRAW_LABELS.iter().any(|d| label.eq_ignore_ascii_case(d))
}

/// Classify a provider market.
///
/// Returns `None` for unsupported market keys and for totals markets with no
/// numeric line on any outcome; callers skip those markets silently.
pub fn normalize(market_key: &str, outcomes: &[RawOutcome]) -> Option<NormalizedMarket> {
    match market_key {
        MARKET_H2H => {
            let family = if outcomes.iter().any(|o| is_draw_label(&o.name)) {
                MarketFamily::ThreeWay
            } else {
                MarketFamily::Moneyline
            };
            Some(NormalizedMarket::new(family, Period::FullTime))
        }
        MARKET_TOTALS => {
            let line = outcomes
                .iter()
                .find_map(|o| o.point.filter(|p| p.is_finite()))?;
            Some(NormalizedMarket::new(
                MarketFamily::Totals { line },
                Period::FullTime,
            ))
        }
        _ => None,
    }
}

/// Map a provider label to a canonical key using the default synonyms.
pub fn normalize_outcome_key(label: &str, home_team: &str, away_team: &str) -> OutcomeKey {
    normalize_outcome_key_with(label, home_team, away_team, &DEFAULT_SYNONYMS)
}

/// Map a provider label to a canonical key.
///
/// Priority: team names, draw literals, home/away synonyms, then over and
/// under substrings. Anything else is [`OutcomeKey::Unknown`].
pub fn normalize_outcome_key_with(
    label: &str,
    home_team: &str,
    away_team: &str,
    synonyms: &OutcomeSynonyms,
) -> OutcomeKey {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return OutcomeKey::Unknown;
    }

    if label == home_team.trim().to_lowercase() {
        return OutcomeKey::Home;
    }
    if label == away_team.trim().to_lowercase() {
        return OutcomeKey::Away;
    }
    if DRAW_LABELS.contains(&label.as_str()) {
        return OutcomeKey::Draw;
    }
    if synonyms.home.contains(&label) {
        return OutcomeKey::Home;
    }
    if synonyms.away.contains(&label) {
        return OutcomeKey::Away;
    }
    if synonyms.over.iter().any(|s| label.contains(s.as_str())) {
        return OutcomeKey::Over;
    }
    if synonyms.under.iter().any(|s| label.contains(s.as_str())) {
        return OutcomeKey::Under;
    }

    OutcomeKey::Unknown
}

/// Whether the observed keys cover every outcome the family requires.
///
/// Keys are compared upper-cased; order and duplicates do not matter.
pub fn validate_coverage<I, S>(family: FamilyKind, observed: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let observed: HashSet<String> = observed
        .into_iter()
        .map(|k| k.as_ref().trim().to_uppercase())
        .collect();

    family
        .required_outcomes()
        .iter()
        .all(|key| observed.contains(key.as_str()))
}
