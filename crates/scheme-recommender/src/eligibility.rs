/// Eligibility predicates and income normalisation.
///
/// `is_eligible` is a conjunction of independent checks evaluated in order; the
/// first failing check decides. Malformed bounds on the scheme side never fail a check.
use regex::Regex;

use sahayak_common::api::{NumberOrText, UserProfile};

use crate::model::{SchemeEntry, ANY};

/// Normalise an income string such as "₹2.5 lakh", "8LPA", "1,50,000" or "3 crore" to rupees.
///
/// A unit only counts when no letter follows it, so "3 kids" reads as 3. Currency text
/// around the amount is ignored. Returns `None` when the text has no amount ("any",
/// "no limit", blank).
pub fn clean_income(raw: &str) -> Option<u64> {
    let re = Regex::new(
        r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(?:(crores?|cr|lakhs?|lacs?|lpa|l|thousands?|k)(?:[^a-z]|$))?",
    )
    .expect("valid regex");
    let caps = re.captures(raw)?;
    let amount: f64 = caps[1].replace(',', "").parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
        Some(unit) if unit.starts_with("cr") => 1e7,
        Some(unit) if unit.starts_with('l') => 1e5,
        Some(unit) if unit.starts_with('k') || unit.starts_with("th") => 1e3,
        _ => 1.0,
    };
    let rupees = (amount * multiplier).round();
    (rupees.is_finite() && rupees >= 0.0).then_some(rupees as u64)
}

fn is_unrestricted(cell: &str) -> bool {
    cell == ANY
}

fn normalised(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

fn profile_income(income: &NumberOrText) -> Option<u64> {
    match income {
        NumberOrText::Number(_) => income.as_u64(),
        NumberOrText::Text(text) => clean_income(text),
    }
}

fn age_in_range(scheme: &SchemeEntry, profile: &UserProfile) -> bool {
    // Unreadable profile ages skip both age checks.
    let Some(age) = profile.age.as_ref().and_then(NumberOrText::as_u32) else {
        return true;
    };
    scheme.min_age.value().map_or(true, |min| age >= min)
        && scheme.max_age.value().map_or(true, |max| age <= max)
}

fn matches_exact(cell: &str, value: Option<&String>) -> bool {
    is_unrestricted(cell) || normalised(value).is_some_and(|v| v == cell)
}

fn within_income(scheme: &SchemeEntry, profile: &UserProfile) -> bool {
    let Some(ceiling) = scheme.income_ceiling.value() else {
        return true;
    };
    profile
        .income
        .as_ref()
        .and_then(profile_income)
        .is_some_and(|income| income <= ceiling)
}

fn matches_occupation(scheme: &SchemeEntry, profile: &UserProfile) -> bool {
    let cell = scheme.filters.occupation.as_str();
    if is_unrestricted(cell) || cell == "none" {
        return true;
    }
    profile.occupation.as_ref().is_some_and(|occupation| {
        occupation
            .values()
            .into_iter()
            .map(|o| o.trim().to_lowercase())
            .any(|o| !o.is_empty() && cell.contains(&o))
    })
}

fn matches_state(scheme: &SchemeEntry, profile: &UserProfile) -> bool {
    let cell = scheme.filters.state.as_str();
    is_unrestricted(cell) || cell == "central" || matches_exact(cell, profile.state.as_ref())
}

/// Whether `profile` satisfies every restriction `scheme` declares.
pub fn is_eligible(scheme: &SchemeEntry, profile: &UserProfile) -> bool {
    age_in_range(scheme, profile)
        && matches_exact(&scheme.filters.gender, profile.gender.as_ref())
        && matches_exact(&scheme.filters.caste, profile.caste.as_ref())
        && within_income(scheme, profile)
        && matches_occupation(scheme, profile)
        && matches_state(scheme, profile)
}
