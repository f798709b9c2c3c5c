use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    hash::Hash,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Registry<K, V> {
    pub entries: HashMap<K, V>,
}

pub trait RegistryEntry {
    type Id: Eq + Hash + Clone + Debug;

    fn id(&self) -> Self::Id;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Duplicate ID found: {0}")]
    DuplicateId(String),
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: RegistryEntry<Id = K>,
{
    pub fn from_entries(values: impl IntoIterator<Item = V>) -> Result<Self, RegistryError> {
        let mut entries = HashMap::new();
        for value in values {
            let id = value.id();
            if entries.insert(id.clone(), value).is_some() {
                return Err(RegistryError::DuplicateId(format!("{:?}", id)));
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, id: &K) -> Option<&V> {
        self.entries.get(id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: RegistryEntry<Id = K> + DeserializeOwned,
{
    /// Loads every `.json` file in the directory as one entry. Other files are
    /// ignored.
    pub fn load_from_directory(directory: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let mut entries = HashMap::new();

        let mut paths = fs::read_dir(directory)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<PathBuf>, _>>()?;
        paths.sort();

        for path in paths {
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let file_contents = fs::read_to_string(&path)?;
            let value = serde_json::from_str::<V>(&file_contents).map_err(|source| {
                RegistryError::Json {
                    path: path.clone(),
                    source,
                }
            })?;

            let id = value.id();
            debug!("Loaded registry entry {:?} from {:?}", id, path);

            if entries.insert(id.clone(), value).is_some() {
                return Err(RegistryError::DuplicateId(format!(
                    "{:?} in file {:?}",
                    id, path
                )));
            }
        }

        Ok(Self { entries })
    }
}
