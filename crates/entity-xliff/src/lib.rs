//! Entity XLIFF core
//!
//! Flattens content entity graphs into labeled translatable trees and merges
//! translated trees back into parallel target entities, saving every touched
//! entity deepest first.
//!
//! The host content system is reached only through the traits in [`host`].
//! A long-lived [`EntityXliff`] holds the registries and hooks; each request
//! opens a [`TranslationSession`] that owns all per-operation caches.

pub mod config;
pub mod error;
pub mod field;
pub mod hooks;
pub mod host;
pub mod model;
pub mod scheduler;
pub mod service;
pub mod session;
pub mod telemetry;
pub mod translatable;
pub mod walker;

pub use config::{Config, TranslatableInfo};
pub use error::{MergeReport, SkipReason, SkippedBranch, XliffError, XliffResult};
pub use field::{FieldData, FieldHandler, FieldHandlerKind, FieldHandlerRegistry, Translation};
pub use hooks::{HookRegistry, TranslationHook};
pub use host::{
    Actor, ActorContext, ElevatedActor, EntityMetadata, EntityStorage, Host, TranslationFeatures,
    TranslationHandler, with_elevated_actor,
};
pub use model::{
    Entity, EntityKey, FieldPath, LANGUAGE_NONE, LabeledTree, Leaf, PropertyInfo, RecordRef,
    TreeNode,
};
pub use service::EntityXliff;
pub use session::{SessionOptions, TranslationSession};
pub use translatable::{Paradigm, StrategyKind, Translatable, TranslatableRegistry};
