use serde::{Deserialize, Serialize};

use crate::components::class::ClassFeatureRef;

/// Class feature references come either as a plain `"Name|Class|Source|Level"`
/// string or as an object carrying extra flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassFeatureRefDefinition {
    Plain(String),
    #[serde(rename_all = "camelCase")]
    Detailed {
        class_feature: String,
        #[serde(default)]
        gain_subclass_feature: bool,
    },
}

fn parse_reference(reference: &str, gain_subclass_feature: bool) -> ClassFeatureRef {
    let mut parts = reference.split('|').map(str::trim);
    let name = parts.next().unwrap_or_default().to_string();
    let class_name = parts.next().unwrap_or_default().to_string();
    let class_source = parts
        .next()
        .filter(|source| !source.is_empty())
        .map(str::to_string);
    let level = parts.next().and_then(|level| level.parse::<u8>().ok());

    ClassFeatureRef {
        name,
        class_name,
        class_source,
        level,
        gain_subclass_feature,
    }
}

impl From<ClassFeatureRefDefinition> for ClassFeatureRef {
    fn from(definition: ClassFeatureRefDefinition) -> Self {
        match definition {
            ClassFeatureRefDefinition::Plain(reference) => parse_reference(&reference, false),
            ClassFeatureRefDefinition::Detailed {
                class_feature,
                gain_subclass_feature,
            } => parse_reference(&class_feature, gain_subclass_feature),
        }
    }
}

impl From<ClassFeatureRef> for ClassFeatureRefDefinition {
    fn from(feature: ClassFeatureRef) -> Self {
        let reference = format!(
            "{}|{}|{}|{}",
            feature.name,
            feature.class_name,
            feature.class_source.unwrap_or_default(),
            feature.level.map(|level| level.to_string()).unwrap_or_default()
        );
        if feature.gain_subclass_feature {
            ClassFeatureRefDefinition::Detailed {
                class_feature: reference,
                gain_subclass_feature: true,
            }
        } else {
            ClassFeatureRefDefinition::Plain(reference)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_reference() {
        let feature: ClassFeatureRef =
            serde_json::from_str(r#""Ability Score Improvement|Fighter||4""#).unwrap();
        assert_eq!(feature.name, "Ability Score Improvement");
        assert_eq!(feature.class_name, "Fighter");
        assert_eq!(feature.class_source, None);
        assert_eq!(feature.level, Some(4));
        assert!(!feature.gain_subclass_feature);
    }

    #[test]
    fn detailed_reference() {
        let feature: ClassFeatureRef = serde_json::from_str(
            r#"{"classFeature": "Martial Archetype|Fighter|PHB|3", "gainSubclassFeature": true}"#,
        )
        .unwrap();
        assert_eq!(feature.name, "Martial Archetype");
        assert_eq!(feature.class_source.as_deref(), Some("PHB"));
        assert_eq!(feature.level, Some(3));
        assert!(feature.gain_subclass_feature);
    }

    #[test]
    fn unparseable_level_is_none() {
        let feature: ClassFeatureRef = serde_json::from_str(r#""Second Wind""#).unwrap();
        assert_eq!(feature.name, "Second Wind");
        assert_eq!(feature.level, None);
    }

    #[test]
    fn serializes_back_to_reference_string() {
        let feature: ClassFeatureRef = serde_json::from_str(r#""Action Surge|Fighter||2""#).unwrap();
        assert_eq!(
            serde_json::to_string(&feature).unwrap(),
            r#""Action Surge|Fighter||2""#
        );
    }
}
