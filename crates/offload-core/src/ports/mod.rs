//! Ports - 抽象化レイヤー
//!
//! 時刻・ID 生成・ライブラリ取得といった外部依存を trait で切り離します。

pub mod clock;
pub mod id_generator;
pub mod library;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::library::{Library, LibraryResolver};
