use std::{
    env,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    components::class::{ClassDefinition, ClassFeature},
    registry::registry::{Registry, RegistryEntry, RegistryError},
};

/// Environment variable pointing at a directory of class JSON files.
pub const CLASS_DATA_ENV: &str = "PROGRESSION_CLASS_DATA";

/// Read-only lookup of class data. Everything in the engine consumes class
/// data through this trait, so tests can swap in their own provider.
pub trait ClassDataProvider {
    fn class(&self, name: &str) -> Option<&ClassDefinition>;

    fn class_names(&self) -> Vec<String>;

    /// Features the class grants up to and including `level`. An empty
    /// `source` matches any source.
    fn class_features(&self, name: &str, level: u8, source: &str) -> Vec<ClassFeature>;

    fn subclass_features(&self, class_name: &str, subclass_name: &str, level: u8)
    -> Vec<ClassFeature>;
}

impl RegistryEntry for ClassDefinition {
    type Id = String;

    fn id(&self) -> Self::Id {
        self.name.to_lowercase()
    }
}

#[derive(Debug, Clone)]
pub struct ClassRegistry {
    classes: Registry<String, ClassDefinition>,
}

impl ClassRegistry {
    pub fn from_entries(
        classes: impl IntoIterator<Item = ClassDefinition>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            classes: Registry::from_entries(classes)?,
        })
    }

    pub fn load_from_directory(directory: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let classes = Registry::load_from_directory(directory.as_ref())?;
        info!(
            "Loaded {} classes from {:?}",
            classes.len(),
            directory.as_ref()
        );
        Ok(Self { classes })
    }

    /// Loads from the directory in `PROGRESSION_CLASS_DATA`, or from the class
    /// data bundled with the crate.
    pub fn load_from_env() -> Result<Self, RegistryError> {
        match env::var_os(CLASS_DATA_ENV) {
            Some(directory) => Self::load_from_directory(PathBuf::from(directory)),
            None => Self::load_bundled(),
        }
    }

    pub fn load_bundled() -> Result<Self, RegistryError> {
        Self::load_from_directory(bundled_class_directory())
    }
}

pub fn bundled_class_directory() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/classes")
}

impl ClassDataProvider for ClassRegistry {
    fn class(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.get(&name.to_lowercase())
    }

    fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .classes
            .values()
            .map(|class| class.name.clone())
            .collect();
        names.sort();
        names
    }

    fn class_features(&self, name: &str, level: u8, source: &str) -> Vec<ClassFeature> {
        let Some(class) = self.class(name) else {
            warn!("No class data for {}", name);
            return Vec::new();
        };

        if !source.is_empty() && !class.source.is_empty() && !class.source.eq_ignore_ascii_case(source)
        {
            warn!(
                "Class {} is only known from source {}, not {}",
                class.name, class.source, source
            );
        }

        // The feature table is the canonical list; text is attached where the
        // class data carries it.
        class
            .class_features
            .iter()
            .filter_map(|reference| {
                let feature_level = reference.level?;
                if feature_level > level {
                    return None;
                }
                let entries = class
                    .features
                    .iter()
                    .find(|feature| {
                        feature.level == feature_level
                            && feature.name.eq_ignore_ascii_case(&reference.name)
                    })
                    .map(|feature| feature.entries.clone())
                    .unwrap_or_default();
                Some(ClassFeature {
                    name: reference.name.clone(),
                    source: reference
                        .class_source
                        .clone()
                        .unwrap_or_else(|| class.source.clone()),
                    class_name: class.name.clone(),
                    subclass_name: None,
                    level: feature_level,
                    entries,
                })
            })
            .collect()
    }

    fn subclass_features(
        &self,
        class_name: &str,
        subclass_name: &str,
        level: u8,
    ) -> Vec<ClassFeature> {
        let Some(subclass) = self
            .class(class_name)
            .and_then(|class| class.subclass(subclass_name))
        else {
            return Vec::new();
        };

        subclass
            .features
            .iter()
            .filter(|feature| feature.level <= level)
            .map(|feature| ClassFeature {
                class_name: class_name.to_string(),
                subclass_name: Some(subclass.name.clone()),
                ..feature.clone()
            })
            .collect()
    }
}
