//! Shared invocation context for the autolink crates.
//!
//! Holds what both the resolution path and the config-plugin path need without
//! depending on each other: target platforms, layered project options, the
//! diagnostics collector, the memoization scope and cancellation.

pub mod cancel;
pub mod diagnostics;
pub mod memo;
pub mod options;
pub mod platform;

pub use cancel::CancelToken;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use memo::{MemoError, MemoScope, MemoStats, Memoizer, PathKind};
pub use options::{AutolinkingOptions, ModuleOverride, OptionsError, OptionsLayer};
pub use platform::Platform;
