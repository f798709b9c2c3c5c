use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::components::level_up::ChoiceCategory;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum FindingCategory {
    Spells,
    Invocations,
    Metamagic,
    FightingStyles,
    PactBoons,
    Subclasses,
    Asis,
    Features,
    Other,
}

impl From<ChoiceCategory> for FindingCategory {
    fn from(category: ChoiceCategory) -> Self {
        match category {
            ChoiceCategory::Invocation => FindingCategory::Invocations,
            ChoiceCategory::Metamagic => FindingCategory::Metamagic,
            ChoiceCategory::FightingStyle => FindingCategory::FightingStyles,
            ChoiceCategory::PactBoon => FindingCategory::PactBoons,
            ChoiceCategory::Feature => FindingCategory::Features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FindingDetail {
    #[serde(rename_all = "camelCase")]
    Spells {
        expected: usize,
        actual: usize,
        missing: usize,
        cantrips: bool,
    },
    #[serde(rename_all = "camelCase")]
    Choice {
        feature: String,
        required: u8,
        actual: usize,
    },
    #[serde(rename_all = "camelCase")]
    Subclass { title: String },
    #[serde(rename_all = "camelCase")]
    Asi { unused_levels: Vec<u8> },
    Other,
}

/// A choice the player still owes the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub class: String,
    /// Class level at which the choice became required
    pub level: u8,
    pub message: String,
    pub detail: FindingDetail,
}

impl Finding {
    /// One finding for all unused ASI levels of a class, or `None` if every
    /// ASI was used. The finding's level is the earliest unused one.
    pub fn unused_asis(class: &str, unused_levels: Vec<u8>) -> Option<Finding> {
        let level = *unused_levels.first()?;
        let levels = unused_levels
            .iter()
            .map(|level| level.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Some(Finding {
            class: class.to_string(),
            level,
            message: format!("{} has unused ASIs at levels {}", class, levels),
            detail: FindingDetail::Asi { unused_levels },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingChoices {
    pub spells: Vec<Finding>,
    pub invocations: Vec<Finding>,
    pub metamagic: Vec<Finding>,
    pub fighting_styles: Vec<Finding>,
    pub pact_boons: Vec<Finding>,
    pub subclasses: Vec<Finding>,
    pub asis: Vec<Finding>,
    pub features: Vec<Finding>,
    pub other: Vec<Finding>,
}

impl MissingChoices {
    pub fn get(&self, category: FindingCategory) -> &Vec<Finding> {
        match category {
            FindingCategory::Spells => &self.spells,
            FindingCategory::Invocations => &self.invocations,
            FindingCategory::Metamagic => &self.metamagic,
            FindingCategory::FightingStyles => &self.fighting_styles,
            FindingCategory::PactBoons => &self.pact_boons,
            FindingCategory::Subclasses => &self.subclasses,
            FindingCategory::Asis => &self.asis,
            FindingCategory::Features => &self.features,
            FindingCategory::Other => &self.other,
        }
    }

    pub fn get_mut(&mut self, category: FindingCategory) -> &mut Vec<Finding> {
        match category {
            FindingCategory::Spells => &mut self.spells,
            FindingCategory::Invocations => &mut self.invocations,
            FindingCategory::Metamagic => &mut self.metamagic,
            FindingCategory::FightingStyles => &mut self.fighting_styles,
            FindingCategory::PactBoons => &mut self.pact_boons,
            FindingCategory::Subclasses => &mut self.subclasses,
            FindingCategory::Asis => &mut self.asis,
            FindingCategory::Features => &mut self.features,
            FindingCategory::Other => &mut self.other,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FindingCategory, &Finding)> {
        FindingCategory::iter()
            .flat_map(move |category| self.get(category).iter().map(move |f| (category, f)))
    }

    pub fn len(&self) -> usize {
        FindingCategory::iter()
            .map(|category| self.get(category).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    is_valid: bool,
    missing: MissingChoices,
    warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            missing: MissingChoices::default(),
            warnings: Vec::new(),
        }
    }

    pub fn from_parts(missing: MissingChoices, warnings: Vec<String>) -> Self {
        Self {
            is_valid: missing.is_empty(),
            missing,
            warnings,
        }
    }

    /// True iff no category has any finding. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn missing(&self) -> &MissingChoices {
        &self.missing
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn push(&mut self, category: FindingCategory, finding: Finding) {
        self.missing.get_mut(category).push(finding);
        self.is_valid = false;
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn findings(&self) -> impl Iterator<Item = (FindingCategory, &Finding)> {
        self.missing.iter()
    }

    pub fn findings_for_class<'a>(&'a self, class_name: &'a str) -> impl Iterator<Item = &'a Finding> {
        self.missing
            .iter()
            .map(|(_, finding)| finding)
            .filter(move |finding| finding.class.eq_ignore_ascii_case(class_name))
    }
}

/// Counts of what is still missing, for a compact overview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingChoicesSummary {
    pub total: usize,
    pub by_category: BTreeMap<FindingCategory, usize>,
    pub classes: BTreeSet<String>,
    pub messages: Vec<String>,
}

impl From<&ValidationReport> for MissingChoicesSummary {
    fn from(report: &ValidationReport) -> Self {
        let mut summary = MissingChoicesSummary::default();
        for (category, finding) in report.findings() {
            summary.total += 1;
            *summary.by_category.entry(category).or_default() += 1;
            summary.classes.insert(finding.class.clone());
            summary.messages.push(finding.message.clone());
        }
        summary
    }
}
