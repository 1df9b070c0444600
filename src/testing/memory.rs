//! In-memory stand-in for the admin backend.
//!
//! Behaves like the REST API for everything the editor relies on: ids are
//! assigned on create, `text_en` defaults to `text_ru`, deletes cascade,
//! reorder rows write `parent_id`/`sort_order`, duplicates start inactive and
//! templates build their starter items. Every call is recorded so tests can
//! assert on what was sent.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Mutex;

use crate::api::records::{FaqEntry, MenuTemplate, TemplateApplied};
use crate::api::{FaqDirectory, MenuRepository};
use crate::core::error::{AppError, AppResult};
use crate::menu::form::MenuItemPayload;
use crate::menu::model::{ItemKind, Language, LanguageGate, MenuItem, MenuItemId, SystemAction, Visibility};
use crate::menu::reorder::ReorderEntry;
use crate::menu::store::MenuStore;

/// A call received by the in-memory repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCall {
    Load,
    LoadTree,
    /// Carries `text_ru`, since the id is not known yet
    Create(String),
    Update(MenuItemId),
    Delete(MenuItemId),
    Reorder(Vec<ReorderEntry>),
    Duplicate(MenuItemId),
    Templates,
    ApplyTemplate { id: String, clear_existing: bool },
    FaqEntries,
}

#[derive(Debug, Default)]
struct State {
    store: MenuStore,
    next_id: i64,
    faq: Vec<FaqEntry>,
    calls: Vec<RepoCall>,
}

impl State {
    fn allocate_id(&mut self) -> MenuItemId {
        self.next_id += 1;
        MenuItemId(self.next_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryMenuRepository {
    state: Mutex<State>,
    fail_loads: AtomicBool,
    fail_mutations: AtomicBool,
}

fn rejected(status: StatusCode, detail: &str) -> AppError {
    AppError::HttpStatus {
        status,
        body: serde_json::json!({ "detail": detail }).to_string(),
    }
}

impl InMemoryMenuRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with `items`; new ids continue after the largest.
    pub fn with_items(items: Vec<MenuItem>) -> Self {
        let next_id = items.iter().map(|item| item.id.0).max().unwrap_or(0);
        Self {
            state: Mutex::new(State {
                store: MenuStore::from_items(items),
                next_id,
                ..State::default()
            }),
            ..Self::default()
        }
    }

    pub async fn set_faq(&self, entries: Vec<FaqEntry>) {
        self.state.lock().await.faq = entries;
    }

    /// While set, `load`/`load_tree` answer 503.
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// While set, every mutation answers 500 and changes nothing.
    pub fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Stored items, ordered by id.
    pub async fn items(&self) -> Vec<MenuItem> {
        self.state.lock().await.store.items()
    }

    pub async fn calls(&self) -> Vec<RepoCall> {
        self.state.lock().await.calls.clone()
    }

    fn check_load(&self) -> AppResult<()> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(rejected(StatusCode::SERVICE_UNAVAILABLE, "Backend unavailable"));
        }
        Ok(())
    }

    fn check_mutation(&self) -> AppResult<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(rejected(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"));
        }
        Ok(())
    }
}

fn walk_from(store: &MenuStore, parent: Option<MenuItemId>, out: &mut Vec<MenuItem>) {
    for child in store.children(parent) {
        out.push(child.clone());
        walk_from(store, Some(child.id), out);
    }
}

fn check_parent(store: &MenuStore, parent: Option<MenuItemId>) -> AppResult<()> {
    match parent {
        Some(id) if !store.contains(id) => Err(rejected(StatusCode::NOT_FOUND, "Parent menu item not found")),
        _ => Ok(()),
    }
}

#[async_trait]
impl MenuRepository for InMemoryMenuRepository {
    async fn load(&self) -> AppResult<Vec<MenuItem>> {
        let mut state = self.state.lock().await;
        state.calls.push(RepoCall::Load);
        self.check_load()?;
        let mut items = state.store.items();
        items.sort_by_key(|item| item.sort_order);
        Ok(items)
    }

    async fn load_tree(&self) -> AppResult<Vec<MenuItem>> {
        let mut state = self.state.lock().await;
        state.calls.push(RepoCall::LoadTree);
        self.check_load()?;
        // The backend only walks down from root, so unreachable rows never show up
        let mut out = Vec::new();
        walk_from(&state.store, None, &mut out);
        Ok(out)
    }

    async fn create(&self, payload: &MenuItemPayload) -> AppResult<MenuItem> {
        let mut state = self.state.lock().await;
        state.calls.push(RepoCall::Create(payload.text_ru.clone()));
        self.check_mutation()?;
        check_parent(&state.store, payload.parent_id)?;

        let id = state.allocate_id();
        let mut item = payload.clone().into_item(id, 0);
        if item.text_en.is_none() {
            item.text_en = Some(item.text_ru.clone());
        }
        state.store.upsert(item.clone());
        Ok(item)
    }

    async fn update(&self, id: MenuItemId, payload: &MenuItemPayload) -> AppResult<MenuItem> {
        let mut state = self.state.lock().await;
        state.calls.push(RepoCall::Update(id));
        self.check_mutation()?;
        let Some(existing) = state.store.get(id).cloned() else {
            return Err(rejected(StatusCode::NOT_FOUND, "Menu item not found"));
        };
        if payload.parent_id == Some(id) {
            return Err(rejected(StatusCode::BAD_REQUEST, "Cannot set self as parent"));
        }
        check_parent(&state.store, payload.parent_id)?;

        let item = payload.clone().into_item(id, existing.sort_order);
        state.store.upsert(item.clone());
        Ok(item)
    }

    async fn delete(&self, id: MenuItemId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(RepoCall::Delete(id));
        self.check_mutation()?;
        if state.store.remove_cascade(id).is_empty() {
            return Err(rejected(StatusCode::NOT_FOUND, "Menu item not found"));
        }
        Ok(())
    }

    async fn reorder(&self, entries: &[ReorderEntry]) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(RepoCall::Reorder(entries.to_vec()));
        self.check_mutation()?;
        // Unknown ids are skipped, like the backend does
        state.store.apply_reorder(entries);
        Ok(())
    }

    async fn duplicate(&self, id: MenuItemId) -> AppResult<MenuItem> {
        let mut state = self.state.lock().await;
        state.calls.push(RepoCall::Duplicate(id));
        self.check_mutation()?;
        let Some(source) = state.store.get(id).cloned() else {
            return Err(rejected(StatusCode::NOT_FOUND, "Menu item not found"));
        };

        let copy = MenuItem {
            id: state.allocate_id(),
            text_en: Some(format!("{} (copy)", source.label(Language::En))),
            text_ru: format!("{} (copy)", source.text_ru),
            is_active: false,
            sort_order: source.sort_order + 1,
            ..source
        };
        state.store.upsert(copy.clone());
        Ok(copy)
    }

    async fn templates(&self) -> AppResult<Vec<MenuTemplate>> {
        self.state.lock().await.calls.push(RepoCall::Templates);
        Ok(starter_templates()
            .into_iter()
            .map(|template| MenuTemplate {
                id: template.id.to_string(),
                name: template.name.to_string(),
                description_ru: Some(template.description_ru.to_string()),
                description_en: Some(template.description_en.to_string()),
                items_count: template.items.len(),
            })
            .collect())
    }

    async fn apply_template(&self, template_id: &str, clear_existing: bool) -> AppResult<TemplateApplied> {
        let mut state = self.state.lock().await;
        state.calls.push(RepoCall::ApplyTemplate {
            id: template_id.to_string(),
            clear_existing,
        });
        self.check_mutation()?;
        let Some(template) = starter_templates().into_iter().find(|t| t.id == template_id) else {
            return Err(rejected(StatusCode::NOT_FOUND, "Template not found"));
        };

        if clear_existing {
            state.store = MenuStore::new();
        }
        let created = template.items.len();
        for (kind, text_ru, text_en, icon, visibility, sort_order) in template.items {
            let id = state.allocate_id();
            state.store.upsert(MenuItem {
                id,
                parent_id: None,
                kind,
                text_ru: text_ru.to_string(),
                text_en: Some(text_en.to_string()),
                icon: Some(icon.to_string()),
                visibility,
                visibility_language: LanguageGate::All,
                is_active: true,
                sort_order,
            });
        }

        Ok(TemplateApplied {
            success: true,
            message: format!("Template '{}' applied successfully", template.name),
            items_created: created,
        })
    }
}

#[async_trait]
impl FaqDirectory for InMemoryMenuRepository {
    async fn faq_entries(&self) -> AppResult<Vec<FaqEntry>> {
        let mut state = self.state.lock().await;
        state.calls.push(RepoCall::FaqEntries);
        self.check_load()?;
        Ok(state.faq.clone())
    }
}

type TemplateRow = (ItemKind, &'static str, &'static str, &'static str, Visibility, i32);

struct StarterTemplate {
    id: &'static str,
    name: &'static str,
    description_ru: &'static str,
    description_en: &'static str,
    items: Vec<TemplateRow>,
}

fn system(action: SystemAction) -> ItemKind {
    ItemKind::System { action }
}

/// The two starter menus the backend ships.
fn starter_templates() -> Vec<StarterTemplate> {
    vec![
        StarterTemplate {
            id: "crypto_signals",
            name: "Крипто-сигналы / Crypto Signals",
            description_ru: "Шаблон для продажи доступа к крипто-сигналам",
            description_en: "Template for selling access to crypto signals",
            items: vec![
                (system(SystemAction::Tariffs), "Получить доступ", "Get access", "🚀", Visibility::All, 1),
                (system(SystemAction::Subscriptions), "Мои подписки", "My subscriptions", "💳", Visibility::All, 2),
                (ItemKind::Section, "Настройки", "Settings", "⚙️", Visibility::Subscribed, 3),
                (
                    ItemKind::Text {
                        body: "📞 Контакты / Contacts\n\nAdmin: @admin\nSupport: @support\nChannel: @channel".to_string(),
                    },
                    "Контакты",
                    "Contacts",
                    "📞",
                    Visibility::All,
                    4,
                ),
                (system(SystemAction::Promocode), "Промокод", "Promocode", "🎁", Visibility::All, 5),
            ],
        },
        StarterTemplate {
            id: "channel_access",
            name: "Продажа каналов / Channel Access",
            description_ru: "Базовый шаблон для продажи доступа к каналам",
            description_en: "Basic template for selling channel access",
            items: vec![
                (system(SystemAction::Tariffs), "Тарифы", "Plans", "📺", Visibility::NotSubscribed, 1),
                (system(SystemAction::Subscriptions), "Мои подписки", "My subscriptions", "💳", Visibility::All, 2),
                (system(SystemAction::Promocode), "Промокод", "Promocode", "🎁", Visibility::All, 3),
                (system(SystemAction::Language), "Язык", "Language", "🌐", Visibility::All, 4),
                (system(SystemAction::Support), "Поддержка", "Support", "💬", Visibility::All, 5),
            ],
        },
    ]
}
