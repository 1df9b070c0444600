//! Editor session over one backend.
//!
//! The session owns the flat [`MenuStore`], derives trees from it on demand
//! and pushes every change through a [`MenuRepository`]. Load failures leave
//! the session in [`LoadState::Failed`] until [`MenuEditor::retry`]. Mutation
//! failures are logged and returned while the local state keeps the attempted
//! change, so the next reload is what reconciles with the backend.

use std::collections::HashMap;

use crate::api::records::{FaqEntry, MenuTemplate, TemplateApplied};
use crate::api::{FaqDirectory, MenuRepository};
use crate::core::error::{AppError, AppResult};

use super::form::{FieldError, FormErrors, MenuItemDraft};
use super::model::{ItemKind, Language, MenuItem, MenuItemId};
use super::outline::{self, OutlineRow, OutlineState};
use super::reorder::{self, MoveRequest, ReorderEntry, ReorderError};
use super::store::MenuStore;
use super::tree::{self, IntegrityIssue, MenuForest};

/// Answers accepted as an explicit "yes".
const AFFIRMATIVE: &[&str] = &["y", "yes", "да", "д"];

/// Proof that the operator explicitly agreed to a destructive operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation(());

impl Confirmation {
    /// Accepts only an explicit affirmative answer.
    pub fn from_user_answer(answer: &str) -> AppResult<Self> {
        let normalized = answer.trim().to_lowercase();
        if AFFIRMATIVE.contains(&normalized.as_str()) {
            Ok(Self(()))
        } else {
            Err(AppError::Confirmation(format!("answer '{}' is not a confirmation", answer.trim())))
        }
    }
}

/// Where the last load left the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loaded,
    /// Holds the error message until a retry succeeds.
    Failed(String),
}

pub struct MenuEditor<R> {
    repo: R,
    store: MenuStore,
    state: LoadState,
    outline: OutlineState,
    faq: HashMap<i64, FaqEntry>,
    /// Ids the last load returned more than once; the store keeps the last row.
    duplicate_ids: Vec<IntegrityIssue>,
}

impl<R> MenuEditor<R>
where
    R: MenuRepository + FaqDirectory,
{
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            store: MenuStore::new(),
            state: LoadState::NotLoaded,
            outline: OutlineState::new(),
            faq: HashMap::new(),
            duplicate_ids: Vec::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn store(&self) -> &MenuStore {
        &self.store
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn outline_state(&mut self) -> &mut OutlineState {
        &mut self.outline
    }

    /// Loads the flat list, replacing local state.
    pub async fn load(&mut self) -> AppResult<()> {
        let result = self.repo.load().await;
        self.finish_load(result)
    }

    /// Loads through the pre-built tree endpoint instead of the flat list.
    pub async fn load_from_tree(&mut self) -> AppResult<()> {
        let result = self.repo.load_tree().await;
        self.finish_load(result)
    }

    /// Manual retry after a failed load.
    pub async fn retry(&mut self) -> AppResult<()> {
        log::info!("Retrying menu load");
        self.load().await
    }

    fn finish_load(&mut self, result: AppResult<Vec<MenuItem>>) -> AppResult<()> {
        match result {
            Ok(items) => {
                self.duplicate_ids = tree::integrity_report(&items)
                    .into_iter()
                    .filter(|issue| matches!(issue, IntegrityIssue::DuplicateId { .. }))
                    .collect();
                self.store = MenuStore::from_items(items);
                for issue in self.integrity_report() {
                    log::warn!("Menu integrity: {}", issue);
                }
                if let Ok(forest) = self.store.tree() {
                    self.outline.retain_existing(&forest);
                }
                self.state = LoadState::Loaded;
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load menu: {}", e);
                self.state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    pub fn tree(&self) -> AppResult<MenuForest> {
        Ok(self.store.tree()?)
    }

    /// Problems in the loaded menu, including ids the backend sent twice.
    pub fn integrity_report(&self) -> Vec<IntegrityIssue> {
        self.duplicate_ids
            .iter()
            .cloned()
            .chain(self.store.integrity_report())
            .collect()
    }

    pub fn outline_rows(&self) -> AppResult<Vec<OutlineRow>> {
        Ok(outline::rows(&self.tree()?, &self.outline))
    }

    /// Validates and persists a form submission.
    ///
    /// New items go after their future siblings. An explicit `sort_order` is a
    /// position among the siblings and is applied as a move once the item is
    /// saved, so positions stay unique. Edits are applied locally before the
    /// request is sent.
    pub async fn submit(&mut self, draft: &MenuItemDraft, context_parent: Option<MenuItemId>) -> AppResult<MenuItem> {
        let mut payload = draft.validate(context_parent)?;

        let Some(id) = draft.id else {
            self.check_parent(payload.parent_id)?;
            let requested = payload.sort_order.take();
            payload.sort_order = Some(self.store.next_sort_order(payload.parent_id));
            let item = match self.repo.create(&payload).await {
                Ok(item) => item,
                Err(e) => {
                    log::error!("Failed to create menu item '{}': {}", payload.text_ru, e);
                    return Err(e);
                }
            };
            log::info!("Created menu item {} ({})", item.id, item.item_type());
            self.store.upsert(item.clone());
            if let Some(order) = requested {
                self.place(item.id, item.parent_id, order).await?;
            }
            return Ok(self.store.get(item.id).cloned().unwrap_or(item));
        };

        let existing = self
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("menu item {}", id)))?;

        let children = self.store.children(Some(id)).len();
        if existing.is_section() && !matches!(payload.kind, ItemKind::Section) && children > 0 {
            return Err(FormErrors(vec![FieldError::SectionHasChildren(children)]).into());
        }

        // Only a changed position is a request to move
        let requested = payload.sort_order.filter(|order| *order != existing.sort_order);
        if payload.parent_id != existing.parent_id {
            let forest = self.tree()?;
            reorder::validate_move(
                &forest,
                &MoveRequest {
                    id,
                    new_parent: payload.parent_id,
                    position: usize::MAX,
                },
            )?;
            payload.sort_order = Some(self.store.next_sort_order(payload.parent_id));
        } else {
            payload.sort_order = Some(existing.sort_order);
        }

        let local = payload.clone().into_item(id, existing.sort_order);
        self.store.upsert(local);

        let saved = match self.repo.update(id, &payload).await {
            Ok(saved) => saved,
            Err(e) => {
                log::error!("Failed to update menu item {}: {}", id, e);
                return Err(e);
            }
        };
        log::info!("Updated menu item {}", id);
        self.store.upsert(saved.clone());
        if let Some(order) = requested {
            self.place(id, saved.parent_id, order).await?;
        }
        Ok(self.store.get(id).cloned().unwrap_or(saved))
    }

    /// New children are only accepted under an existing section.
    fn check_parent(&self, parent: Option<MenuItemId>) -> AppResult<()> {
        let Some(parent_id) = parent else {
            return Ok(());
        };
        match self.store.get(parent_id) {
            None => Err(ReorderError::UnknownParent(parent_id).into()),
            Some(parent) if !parent.is_section() => Err(ReorderError::TargetNotSection(parent_id).into()),
            Some(_) => Ok(()),
        }
    }

    /// Moves a saved item to `order` among its siblings and persists the batch.
    async fn place(&mut self, id: MenuItemId, parent: Option<MenuItemId>, order: i32) -> AppResult<()> {
        let request = MoveRequest {
            id,
            new_parent: parent,
            position: usize::try_from(order).unwrap_or(0),
        };
        self.move_item(request).await?;
        Ok(())
    }

    /// Deletes an item and its subtree. Returns the removed ids.
    pub async fn delete(&mut self, id: MenuItemId, _confirmation: Confirmation) -> AppResult<Vec<MenuItemId>> {
        let removed: Vec<MenuItemId> = self.store.remove_cascade(id).iter().map(|item| item.id).collect();
        if removed.is_empty() {
            return Err(AppError::NotFound(format!("menu item {}", id)));
        }

        if let Err(e) = self.repo.delete(id).await {
            log::error!("Failed to delete menu item {}: {}", id, e);
            return Err(e);
        }
        log::info!("Deleted menu item {} with {} descendant(s)", id, removed.len() - 1);
        Ok(removed)
    }

    /// Drag/drop move: reparent and/or reposition, then persist the full batch.
    pub async fn move_item(&mut self, request: MoveRequest) -> AppResult<Vec<ReorderEntry>> {
        let mut forest = self.tree()?;
        reorder::apply_move(&mut forest, &request)?;
        self.persist_order(&forest).await
    }

    /// Rearranges one sibling group and persists the full batch.
    pub async fn reorder_level(
        &mut self,
        parent: Option<MenuItemId>,
        order: &[MenuItemId],
    ) -> AppResult<Vec<ReorderEntry>> {
        let mut forest = self.tree()?;
        reorder::reorder_siblings(&mut forest, parent, order)?;
        self.persist_order(&forest).await
    }

    async fn persist_order(&mut self, forest: &MenuForest) -> AppResult<Vec<ReorderEntry>> {
        let entries = reorder::batch(forest);
        self.store.apply_reorder(&entries);

        if let Err(e) = self.repo.reorder(&entries).await {
            log::error!("Failed to persist reorder of {} item(s): {}", entries.len(), e);
            return Err(e);
        }
        log::info!("Persisted order of {} item(s)", entries.len());
        Ok(entries)
    }

    /// Copies an item and puts the copy right after its source.
    pub async fn duplicate(&mut self, id: MenuItemId) -> AppResult<MenuItem> {
        let Some(source) = self.store.get(id) else {
            return Err(AppError::NotFound(format!("menu item {}", id)));
        };
        let position = self
            .store
            .children(source.parent_id)
            .iter()
            .position(|item| item.id == id)
            .map_or(usize::MAX, |index| index + 1);

        let copy = match self.repo.duplicate(id).await {
            Ok(copy) => copy,
            Err(e) => {
                log::error!("Failed to duplicate menu item {}: {}", id, e);
                return Err(e);
            }
        };
        log::info!("Duplicated menu item {} as {}", id, copy.id);
        self.store.upsert(copy.clone());
        self.move_item(MoveRequest {
            id: copy.id,
            new_parent: copy.parent_id,
            position,
        })
        .await?;
        Ok(self.store.get(copy.id).cloned().unwrap_or(copy))
    }

    pub async fn templates(&self) -> AppResult<Vec<MenuTemplate>> {
        self.repo.templates().await
    }

    /// Applies a starter template, then reloads the menu.
    pub async fn apply_template(
        &mut self,
        template_id: &str,
        clear_existing: bool,
        _confirmation: Confirmation,
    ) -> AppResult<TemplateApplied> {
        let applied = match self.repo.apply_template(template_id, clear_existing).await {
            Ok(applied) => applied,
            Err(e) => {
                log::error!("Failed to apply template {}: {}", template_id, e);
                return Err(e);
            }
        };
        log::info!("{} ({} item(s))", applied.message, applied.items_created);
        self.load().await?;
        Ok(applied)
    }

    /// Fetches FAQ entries used to label `faq` items. Returns how many were loaded.
    pub async fn load_faq(&mut self) -> AppResult<usize> {
        let entries = self.repo.faq_entries().await?;
        self.faq = entries.into_iter().map(|entry| (entry.id, entry)).collect();
        Ok(self.faq.len())
    }

    /// The FAQ entry a `faq` item points at, if it is known.
    pub fn faq_entry(&self, item: &MenuItem) -> Option<&FaqEntry> {
        match &item.kind {
            ItemKind::Faq { faq_ref } => faq_ref.trim().parse().ok().and_then(|id: i64| self.faq.get(&id)),
            _ => None,
        }
    }

    pub fn faq_label(&self, item: &MenuItem, language: Language) -> Option<&str> {
        self.faq_entry(item).map(|entry| entry.question(language))
    }

    /// `faq` items whose reference does not match a loaded FAQ entry.
    pub fn unresolved_faq_items(&self) -> Vec<MenuItemId> {
        self.store
            .items()
            .iter()
            .filter(|item| matches!(item.kind, ItemKind::Faq { .. }) && self.faq_entry(item).is_none())
            .map(|item| item.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::model::ItemType;
    use crate::testing::{InMemoryMenuRepository, RepoCall};
    use pretty_assertions::assert_eq;

    fn seeded() -> MenuEditor<InMemoryMenuRepository> {
        let mut section = MenuItem::new(1, None, ItemKind::Section, "Раздел");
        section.sort_order = 0;
        let child = MenuItem::new(2, Some(1), ItemKind::Text { body: "x".into() }, "Текст");
        let mut faq = MenuItem::new(3, None, ItemKind::Faq { faq_ref: "7".into() }, "Вопрос");
        faq.sort_order = 1;
        MenuEditor::new(InMemoryMenuRepository::with_items(vec![section, child, faq]))
    }

    fn yes() -> Confirmation {
        Confirmation::from_user_answer("да").unwrap()
    }

    // ==================== Confirmation Tests ====================

    #[test]
    fn test_confirmation_needs_explicit_yes() {
        assert!(Confirmation::from_user_answer(" Yes ").is_ok());
        assert!(Confirmation::from_user_answer("y").is_ok());
        assert!(matches!(
            Confirmation::from_user_answer(""),
            Err(AppError::Confirmation(_))
        ));
        assert!(Confirmation::from_user_answer("no").is_err());
    }

    // ==================== load Tests ====================

    #[tokio::test]
    async fn test_load_failure_then_retry() {
        let mut editor = seeded();
        editor.repository().fail_loads(true);
        assert!(editor.load().await.is_err());
        assert!(matches!(editor.state(), LoadState::Failed(_)));

        editor.repository().fail_loads(false);
        editor.retry().await.unwrap();
        assert_eq!(editor.state(), &LoadState::Loaded);
        assert_eq!(editor.store().len(), 3);
    }

    // ==================== submit Tests ====================

    #[tokio::test]
    async fn test_submit_new_item_appends_to_context_level() {
        let mut editor = seeded();
        editor.load().await.unwrap();

        let mut draft = MenuItemDraft::new(ItemType::Link, "Канал");
        draft.value = "https://t.me/channel".into();
        let item = editor.submit(&draft, Some(MenuItemId(1))).await.unwrap();

        assert_eq!(item.parent_id, Some(MenuItemId(1)));
        assert_eq!(item.sort_order, 1);
        assert_eq!(item.icon.as_deref(), Some("🔗"));
        assert_eq!(item.text_en.as_deref(), Some("Канал"));
        assert!(editor.store().contains(item.id));
    }

    #[tokio::test]
    async fn test_submit_invalid_draft_sends_nothing() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        let draft = MenuItemDraft::new(ItemType::System, "Без действия");

        let err = editor.submit(&draft, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(editor.repository().calls().await, vec![RepoCall::Load]);
    }

    #[tokio::test]
    async fn test_section_with_children_keeps_its_type() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        let section = editor.store().get(MenuItemId(1)).cloned().unwrap();

        let mut draft = MenuItemDraft::from_item(&section);
        draft.item_type = ItemType::Text;
        draft.value = "body".into();
        let err = editor.submit(&draft, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_failed_update_keeps_attempted_state() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        editor.repository().fail_mutations(true);

        let mut draft = MenuItemDraft::from_item(editor.store().get(MenuItemId(2)).unwrap());
        draft.text_ru = "Новое имя".into();
        assert!(editor.submit(&draft, None).await.is_err());
        assert_eq!(
            editor.store().get(MenuItemId(2)).map(|i| i.text_ru.as_str()),
            Some("Новое имя")
        );
    }

    #[tokio::test]
    async fn test_edit_cannot_reparent_into_own_subtree() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        let mut draft = MenuItemDraft::from_item(editor.store().get(MenuItemId(1)).unwrap());
        draft.parent_id = Some(MenuItemId(2));

        let err = editor.submit(&draft, None).await.unwrap_err();
        assert!(matches!(err, AppError::Reorder(_)));
    }

    #[tokio::test]
    async fn test_edit_into_other_section_goes_last() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        let mut draft = MenuItemDraft::from_item(editor.store().get(MenuItemId(3)).unwrap());
        draft.parent_id = Some(MenuItemId(1));

        let saved = editor.submit(&draft, None).await.unwrap();
        assert_eq!((saved.parent_id, saved.sort_order), (Some(MenuItemId(1)), 1));
    }

    fn sibling_ids(editor: &MenuEditor<InMemoryMenuRepository>, parent: Option<MenuItemId>) -> Vec<MenuItemId> {
        editor.store().children(parent).iter().map(|item| item.id).collect()
    }

    fn has_duplicate_sort_order(editor: &MenuEditor<InMemoryMenuRepository>) -> bool {
        editor
            .integrity_report()
            .iter()
            .any(|issue| matches!(issue, IntegrityIssue::DuplicateSortOrder { .. }))
    }

    #[tokio::test]
    async fn test_submit_under_leaf_is_rejected() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        let mut draft = MenuItemDraft::new(ItemType::Text, "Вложенный");
        draft.value = "body".into();

        let err = editor.submit(&draft, Some(MenuItemId(3))).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Reorder(ReorderError::TargetNotSection(MenuItemId(3)))
        ));
        assert_eq!(editor.repository().calls().await, vec![RepoCall::Load]);
        assert!(editor.tree().is_ok());
    }

    #[tokio::test]
    async fn test_submit_under_unknown_parent_is_rejected() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        let draft = MenuItemDraft::new(ItemType::Section, "Потерянный");

        let err = editor.submit(&draft, Some(MenuItemId(99))).await.unwrap_err();
        assert!(matches!(err, AppError::Reorder(ReorderError::UnknownParent(_))));
    }

    #[tokio::test]
    async fn test_create_at_taken_position_shifts_siblings() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        let mut draft = MenuItemDraft::new(ItemType::Section, "Новый");
        draft.sort_order = Some(0);

        let item = editor.submit(&draft, None).await.unwrap();

        assert_eq!(item.sort_order, 0);
        assert_eq!(sibling_ids(&editor, None), vec![item.id, MenuItemId(1), MenuItemId(3)]);
        assert!(!has_duplicate_sort_order(&editor));
        assert_eq!(editor.repository().items().await, editor.store().items());
    }

    #[tokio::test]
    async fn test_edit_position_moves_within_level() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        let mut draft = MenuItemDraft::from_item(editor.store().get(MenuItemId(3)).unwrap());
        draft.sort_order = Some(0);

        let saved = editor.submit(&draft, None).await.unwrap();

        assert_eq!(saved.sort_order, 0);
        assert_eq!(sibling_ids(&editor, None), vec![MenuItemId(3), MenuItemId(1)]);
        assert!(!has_duplicate_sort_order(&editor));
    }

    // ==================== delete / move / duplicate Tests ====================

    #[tokio::test]
    async fn test_delete_cascades_locally_and_remotely() {
        let mut editor = seeded();
        editor.load().await.unwrap();

        let removed = editor.delete(MenuItemId(1), yes()).await.unwrap();
        assert_eq!(removed, vec![MenuItemId(1), MenuItemId(2)]);
        assert_eq!(editor.store().len(), 1);
        assert_eq!(editor.repository().items().await.len(), 1);
    }

    #[tokio::test]
    async fn test_move_sends_full_batch() {
        let mut editor = seeded();
        editor.load().await.unwrap();

        let entries = editor
            .move_item(MoveRequest {
                id: MenuItemId(3),
                new_parent: Some(MenuItemId(1)),
                position: 0,
            })
            .await
            .unwrap();

        assert_eq!(entries.len(), 3);
        let moved = editor.store().get(MenuItemId(3)).unwrap();
        assert_eq!((moved.parent_id, moved.sort_order), (Some(MenuItemId(1)), 0));
        assert_eq!(editor.store().get(MenuItemId(2)).map(|i| i.sort_order), Some(1));
        assert_eq!(editor.repository().items().await, editor.store().items());
    }

    #[tokio::test]
    async fn test_rejected_move_sends_nothing() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        let err = editor
            .move_item(MoveRequest {
                id: MenuItemId(1),
                new_parent: Some(MenuItemId(3)),
                position: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Reorder(_)));
        assert_eq!(editor.repository().calls().await, vec![RepoCall::Load]);
    }

    #[tokio::test]
    async fn test_duplicate_lands_after_source() {
        let mut editor = seeded();
        editor.load().await.unwrap();

        let copy = editor.duplicate(MenuItemId(1)).await.unwrap();

        assert!(!copy.is_active);
        assert_eq!(copy.sort_order, 1);
        assert_eq!(sibling_ids(&editor, None), vec![MenuItemId(1), copy.id, MenuItemId(3)]);
        assert!(!has_duplicate_sort_order(&editor));
    }

    #[test]
    fn test_duplicate_ids_from_backend_are_reported() {
        let mut editor = MenuEditor::new(InMemoryMenuRepository::new());
        let first = MenuItem::new(1, None, ItemKind::Text { body: "a".into() }, "Первый");
        let second = MenuItem::new(1, None, ItemKind::Text { body: "b".into() }, "Второй");

        editor.finish_load(Ok(vec![first, second])).unwrap();

        assert_eq!(editor.store().len(), 1);
        assert_eq!(
            editor.integrity_report(),
            vec![IntegrityIssue::DuplicateId { id: MenuItemId(1) }]
        );
    }

    // ==================== templates / FAQ Tests ====================

    #[tokio::test]
    async fn test_apply_template_reloads() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        let templates = editor.templates().await.unwrap();
        assert_eq!(templates.len(), 2);

        let applied = editor.apply_template("crypto_signals", true, yes()).await.unwrap();
        assert_eq!(applied.items_created, 5);
        assert_eq!(editor.store().len(), 5);
        assert_eq!(editor.state(), &LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_faq_labels() {
        let mut editor = seeded();
        editor.load().await.unwrap();
        editor
            .repository()
            .set_faq(vec![FaqEntry {
                id: 7,
                question_ru: "Как оплатить?".into(),
                question_en: Some("How to pay?".into()),
                answer_ru: "Картой".into(),
                answer_en: None,
                is_active: true,
            }])
            .await;
        assert_eq!(editor.load_faq().await.unwrap(), 1);

        let faq_item = editor.store().get(MenuItemId(3)).cloned().unwrap();
        assert_eq!(editor.faq_label(&faq_item, Language::En), Some("How to pay?"));
        assert!(editor.unresolved_faq_items().is_empty());
    }
}
