//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **StaticLibraryResolver**: in-memory のライブラリ一覧
//! - **HandlerBundle**: 静的にコンパイルされた Handler の集合（`Library`）

pub mod bundle;
pub mod static_library;

pub use self::bundle::HandlerBundle;
pub use self::static_library::StaticLibraryResolver;
