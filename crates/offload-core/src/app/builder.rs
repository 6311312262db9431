//! SupervisorBuilder - Supervisor の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::future::Future;
use std::sync::Arc;

use super::config::ContextConfig;
use super::supervisor::Supervisor;
use crate::domain::errors::TaskError;
use crate::impls::StaticLibraryResolver;
use crate::ports::{IdGenerator, LibraryResolver, SystemClock, UlidGenerator};
use crate::sandbox::{ContextState, TaskArg};
use crate::typed::{Handler, RegistryError, Task, TypedRegistry};

/// SupervisorBuilder は Supervisor を構築
///
/// # 使用例
/// ```ignore
/// let supervisor = SupervisorBuilder::new()
///     .register::<MyTask, _>(MyTaskHandler)?
///     .library_resolver(resolver)
///     .expect_tasks(&["my_namespace.my_task.v1"])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - expect_tasks() で期待される task_type を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - 不足があれば BuildError を返す
///
/// execution context 自体は build() では起動しません（最初の dispatch 時）。
pub struct SupervisorBuilder {
    registry: TypedRegistry,
    expected_tasks: Option<Vec<String>>,
    config: ContextConfig,
    resolver: Option<Arc<dyn LibraryResolver>>,
    ids: Option<Box<dyn IdGenerator>>,
}

/// BuildError は Supervisor 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing task types: {0:?}. These tasks were expected but not registered.")]
    MissingTaskTypes(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl SupervisorBuilder {
    pub fn new() -> Self {
        Self {
            registry: TypedRegistry::new(),
            expected_tasks: None,
            config: ContextConfig::default(),
            resolver: None,
            ids: None,
        }
    }

    /// Handler を登録
    pub fn register<T: Task, H: Handler<T> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<T, H>(handler)?;
        Ok(self)
    }

    /// async closure を Handler として登録
    pub fn register_fn<T, F, Fut>(mut self, f: F) -> Result<Self, RegistryError>
    where
        T: Task,
        F: Fn(TaskArg<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.registry.register_fn::<T, F, Fut>(f)?;
        Ok(self)
    }

    /// 未設定の場合は空の `StaticLibraryResolver`（全ての location が失敗する）
    pub fn library_resolver(mut self, resolver: impl LibraryResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    /// 期待される task_type のリストを設定
    pub fn expect_tasks(mut self, task_types: &[&str]) -> Self {
        self.expected_tasks = Some(task_types.iter().map(|t| t.to_string()).collect());
        self
    }

    /// # 検証
    /// - expect_tasks() で設定された task_type が全て登録されているかチェック
    /// - 不足があれば BuildError::MissingTaskTypes を返す
    pub fn build(self) -> Result<Arc<Supervisor>, BuildError> {
        if let Some(expected_tasks) = &self.expected_tasks {
            let missing_tasks: Vec<String> = expected_tasks
                .iter()
                .filter(|t| !self.registry.contains(t))
                .cloned()
                .collect();
            if !missing_tasks.is_empty() {
                return Err(BuildError::MissingTaskTypes(missing_tasks));
            }
        }

        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(StaticLibraryResolver::new()));
        let ids = self
            .ids
            .unwrap_or_else(|| Box::new(UlidGenerator::new(SystemClock)));

        Ok(Arc::new(Supervisor::new(
            self.config,
            ContextState::new(self.registry),
            resolver,
            ids,
        )))
    }
}

impl Default for SupervisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
