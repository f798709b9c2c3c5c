use std::{fmt, sync::Arc};

use uuid::Uuid;

use crate::components::id::LevelUpId;

pub type EventId = Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionEvent {
    pub id: EventId,
    pub kind: ProgressionEventKind,
}

impl ProgressionEvent {
    pub fn new(kind: ProgressionEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            ProgressionEventKind::MulticlassAdded { class_name, .. }
            | ProgressionEventKind::MulticlassRemoved { class_name }
            | ProgressionEventKind::ClassLevelChanged { class_name, .. } => Some(class_name),
            ProgressionEventKind::LevelUpRecorded { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressionEventKind {
    MulticlassAdded {
        class_name: String,
        level: u8,
    },
    MulticlassRemoved {
        class_name: String,
    },
    /// An existing class was set to a new level
    ClassLevelChanged {
        class_name: String,
        from: u8,
        to: u8,
    },
    LevelUpRecorded {
        record_id: LevelUpId,
        from_level: u8,
        to_level: u8,
    },
}

impl fmt::Display for ProgressionEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressionEventKind::MulticlassAdded { class_name, level } => {
                write!(f, "Added {} at level {}", class_name, level)
            }
            ProgressionEventKind::MulticlassRemoved { class_name } => {
                write!(f, "Removed {}", class_name)
            }
            ProgressionEventKind::ClassLevelChanged {
                class_name,
                from,
                to,
            } => write!(f, "{} {} -> {}", class_name, from, to),
            ProgressionEventKind::LevelUpRecorded {
                from_level,
                to_level,
                ..
            } => write!(f, "Level up {} -> {}", from_level, to_level),
        }
    }
}

pub type ProgressionListener = Arc<dyn Fn(&ProgressionEvent) + Send + Sync + 'static>;
