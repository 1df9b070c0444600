//! Test doubles for the backend seam
//!
//! `InMemoryMenuRepository` implements both `MenuRepository` and
//! `FaqDirectory` without a network, so editor flows can be exercised in unit
//! and integration tests:
//!
//! ```rust
//! # async fn demo() -> subadmin::core::error::AppResult<()> {
//! use subadmin::menu::MenuEditor;
//! use subadmin::testing::InMemoryMenuRepository;
//!
//! let mut editor = MenuEditor::new(InMemoryMenuRepository::new());
//! editor.load().await?;
//! assert!(editor.store().is_empty());
//! # Ok(())
//! # }
//! ```

pub mod memory;

pub use memory::{InMemoryMenuRepository, RepoCall};
