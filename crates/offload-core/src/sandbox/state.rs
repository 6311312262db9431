//! ContextState - execution context が所有する環境
//!
//! registry（実行可能な task の集合）とロード済みライブラリの一覧。
//! どちらも追加のみで、context の寿命の間は消えません。

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::ports::Library;
use crate::typed::{DynHandler, TypedRegistry};

/// One successful library load, in load order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedLibrary {
    pub location: String,
    pub name: String,
}

pub struct ContextState {
    registry: RwLock<TypedRegistry>,
    libraries: RwLock<Vec<LoadedLibrary>>,
}

impl ContextState {
    pub fn new(registry: TypedRegistry) -> Self {
        Self {
            registry: RwLock::new(registry),
            libraries: RwLock::new(Vec::new()),
        }
    }

    pub fn handler(&self, task_type: &str) -> Option<Arc<dyn DynHandler>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(task_type)
    }

    pub fn registered_types(&self) -> Vec<String> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .registered_types()
    }

    pub fn loaded_libraries(&self) -> Vec<LoadedLibrary> {
        self.libraries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `library` and record the load. Loading the same location
    /// twice records it twice.
    pub fn install(&self, location: &str, library: &dyn Library) -> LoadedLibrary {
        {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            library.install(&mut registry);
        }
        let loaded = LoadedLibrary {
            location: location.to_string(),
            name: library.name().to_string(),
        };
        self.libraries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(loaded.clone());
        loaded
    }
}
