//! Option surcharge rules.
//!
//! Rules are evaluated in table order against a claimed-column set, so a
//! surcharge column is charged at most once no matter how many rules match it.
//! The table order also fixes the order of itemized labels.

use std::borrow::Cow;
use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{OptionSurcharges, SurchargeColumn};

/// Coating flag values that mean "no coating".
const NO_COATING: &[&str] = &["N0", "NO", ""];

/// Spec keywords in priority order; only the first match is charged.
const DISC_SPEC_PRIORITY: &[(&str, &[SurchargeColumn])] = &[
    ("SCS13", &[SurchargeColumn::DiscScs13]),
    ("SUS316", &[SurchargeColumn::DiscScs16]),
    ("SUS304", &[SurchargeColumn::DiscScs13]),
];

const BOTH_COATINGS: &[SurchargeColumn] =
    &[SurchargeColumn::InternalCoating, SurchargeColumn::ExternalCoating];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CoatingSide {
    Internal,
    External,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trigger {
    /// Upper-cased description contains the keyword.
    Keyword(&'static str),
    /// Quote-level coating flag is set to something other than "none".
    CoatingFlag(CoatingSide),
    /// Upper-cased spec string names a disc material.
    DiscSpec,
}

#[derive(Clone, Copy, Debug)]
struct OptionRule {
    trigger: Trigger,
    columns: &'static [SurchargeColumn],
}

const OPTION_RULES: &[OptionRule] = &[
    OptionRule { trigger: Trigger::Keyword("I/O-P"), columns: BOTH_COATINGS },
    OptionRule { trigger: Trigger::Keyword("I/O-T"), columns: BOTH_COATINGS },
    OptionRule { trigger: Trigger::Keyword("LOCK"), columns: &[SurchargeColumn::Lock] },
    OptionRule { trigger: Trigger::Keyword("I-T"), columns: &[SurchargeColumn::InternalCoating] },
    OptionRule { trigger: Trigger::Keyword("O-T"), columns: &[SurchargeColumn::ExternalCoating] },
    OptionRule { trigger: Trigger::Keyword("IND"), columns: &[SurchargeColumn::Indicator] },
    OptionRule { trigger: Trigger::Keyword("L/SW"), columns: &[SurchargeColumn::LimitSwitch] },
    OptionRule { trigger: Trigger::Keyword("EXT"), columns: &[SurchargeColumn::Extension] },
    OptionRule {
        trigger: Trigger::CoatingFlag(CoatingSide::Internal),
        columns: &[SurchargeColumn::InternalCoating],
    },
    OptionRule {
        trigger: Trigger::CoatingFlag(CoatingSide::External),
        columns: &[SurchargeColumn::ExternalCoating],
    },
    // Disc columns come from DISC_SPEC_PRIORITY.
    OptionRule { trigger: Trigger::DiscSpec, columns: &[] },
];

/// Inputs the option rules look at.
#[derive(Clone, Copy, Debug, Default)]
pub struct OptionInput<'a> {
    pub description: &'a str,
    pub internal_coating: Option<&'a str>,
    pub external_coating: Option<&'a str>,
    pub spec: Option<&'a str>,
}

impl<'a> OptionInput<'a> {
    pub fn description(description: &'a str) -> Self {
        Self { description, ..Self::default() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeItem {
    pub label: String,
    pub column: SurchargeColumn,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub total: Decimal,
    pub items: Vec<SurchargeItem>,
}

struct NormalizedInput<'a> {
    description: String,
    spec: Option<String>,
    raw: &'a OptionInput<'a>,
}

impl Trigger {
    fn fire(
        &self,
        input: &NormalizedInput<'_>,
        default_columns: &'static [SurchargeColumn],
    ) -> Option<(Cow<'static, str>, &'static [SurchargeColumn])> {
        match self {
            Self::Keyword(keyword) => input
                .description
                .contains(keyword)
                .then_some((Cow::Borrowed(*keyword), default_columns)),
            Self::CoatingFlag(side) => {
                let (flag, label) = match side {
                    CoatingSide::Internal => (input.raw.internal_coating, "internal coating"),
                    CoatingSide::External => (input.raw.external_coating, "external coating"),
                };
                coating_requested(flag).then_some((Cow::Borrowed(label), default_columns))
            }
            Self::DiscSpec => {
                let spec = input.spec.as_deref()?;
                DISC_SPEC_PRIORITY
                    .iter()
                    .find(|(keyword, _)| spec.contains(keyword))
                    .map(|(keyword, columns)| (Cow::Owned(format!("DISC({keyword})")), *columns))
            }
        }
    }
}

fn coating_requested(flag: Option<&str>) -> bool {
    flag.map(str::trim).is_some_and(|value| !NO_COATING.contains(&value))
}

/// Applies the option rule table to one price-list row.
pub fn evaluate(surcharges: &OptionSurcharges, input: &OptionInput<'_>) -> OptionQuote {
    let normalized = NormalizedInput {
        description: input.description.to_uppercase(),
        spec: input.spec.map(str::to_uppercase),
        raw: input,
    };

    let mut claimed = BTreeSet::new();
    let mut quote = OptionQuote::default();

    for rule in OPTION_RULES {
        let Some((label, columns)) = rule.trigger.fire(&normalized, rule.columns) else {
            continue;
        };

        for &column in columns {
            if claimed.contains(&column) {
                continue;
            }
            let Some(amount) = surcharges.chargeable(column) else {
                continue;
            };
            let Some(total) = quote.total.checked_add(amount) else {
                continue;
            };
            claimed.insert(column);
            quote.total = total;
            quote.items.push(SurchargeItem { label: label.to_string(), column, amount });
        }
    }

    quote
}
