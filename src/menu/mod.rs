//! Hierarchical bot menu: model, tree transforms, visibility, preview and editing.
//!
//! The flat [`store::MenuStore`] is the source of truth. Trees are derived
//! with [`tree::build`] and written back through [`tree::flatten`] /
//! [`reorder::batch`].

pub mod editor;
pub mod form;
pub mod model;
pub mod navigator;
pub mod outline;
pub mod reorder;
pub mod store;
pub mod tree;
pub mod visibility;

pub use editor::{Confirmation, LoadState, MenuEditor};
pub use form::{FieldError, FormErrors, MenuItemDraft, MenuItemPayload};
pub use model::{ItemKind, ItemType, Language, LanguageGate, MenuItem, MenuItemId, SystemAction, Visibility};
pub use navigator::{BotButton, BotScreen, ButtonAction, MenuNavigator, PressOutcome};
pub use reorder::{MoveRequest, ReorderEntry, ReorderError};
pub use store::MenuStore;
pub use tree::{build, flatten, IntegrityIssue, MenuForest, MenuNode, TreeError};
pub use visibility::{is_visible, visible, ViewerContext};
