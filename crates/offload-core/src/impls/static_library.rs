//! StaticLibraryResolver - location をキーにした in-memory のライブラリ一覧
//!
//! 実際の取得（HTTP など）を伴わない開発・テスト用の `LibraryResolver`。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::TaskError;
use crate::ports::{Library, LibraryResolver};

#[derive(Default, Clone)]
pub struct StaticLibraryResolver {
    libraries: HashMap<String, Arc<dyn Library>>,
}

impl StaticLibraryResolver {
    pub fn new() -> Self {
        Self {
            libraries: HashMap::new(),
        }
    }

    pub fn with_library(mut self, location: impl Into<String>, library: impl Library + 'static) -> Self {
        self.insert(location, Arc::new(library));
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, library: Arc<dyn Library>) {
        self.libraries.insert(location.into(), library);
    }

    pub fn locations(&self) -> Vec<String> {
        let mut locations: Vec<String> = self.libraries.keys().cloned().collect();
        locations.sort();
        locations
    }
}

#[async_trait]
impl LibraryResolver for StaticLibraryResolver {
    async fn resolve(&self, location: &str) -> Result<Arc<dyn Library>, TaskError> {
        self.libraries
            .get(location)
            .cloned()
            .ok_or_else(|| TaskError::LibraryLoad {
                location: location.to_string(),
                reason: "no library is published at this location".to_string(),
            })
    }
}
