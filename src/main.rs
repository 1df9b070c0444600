use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use dotenvy::dotenv;

use subadmin::cli::{parse_path, preview_language, Cli, Commands};
use subadmin::core::logging::parse_level;
use subadmin::core::{config, init_logger};
use subadmin::menu::{
    tree,
    ButtonAction, Confirmation, Language, MenuEditor, MenuItemDraft, MenuItemId, MenuNavigator, MoveRequest,
    PressOutcome, ViewerContext,
};
use subadmin::HttpMenuRepository;

type Editor = MenuEditor<HttpMenuRepository>;

/// Main entry point for the menu console
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails or the backend rejects a request.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH, parse_level(&config::LOG_LEVEL))?;

    let repo = HttpMenuRepository::from_env().context("Failed to configure admin API client")?;
    log::info!("Using admin API at {}", repo.base_url());
    let mut editor = MenuEditor::new(repo);

    match cli.command {
        Some(Commands::Outline { collapsed, from_tree }) => {
            if from_tree {
                editor.load_from_tree().await?;
            } else {
                editor.load().await?;
            }
            run_outline(&mut editor, collapsed)
        }
        Some(Commands::Preview {
            lang,
            subscribed,
            path,
            press,
        }) => {
            editor.load().await?;
            let context = ViewerContext::new(
                preview_language(lang.as_deref(), &config::PREVIEW_LANGUAGE),
                subscribed,
            );
            let path = match path {
                Some(raw) => parse_path(&raw).context("Invalid --path")?,
                None => Vec::new(),
            };
            run_preview(&mut editor, context, &path, press.map(MenuItemId)).await
        }
        Some(Commands::Add {
            item_type,
            parent,
            fields,
        }) => {
            editor.load().await?;
            let mut draft = MenuItemDraft::new(item_type, "");
            fields.apply_to(&mut draft);
            let created = editor.submit(&draft, parent.map(MenuItemId)).await?;
            println!("✅ Created #{} {}", created.id, created.button_text(console_language()));
            Ok(())
        }
        Some(Commands::Edit { id, item_type, fields }) => {
            editor.load().await?;
            let id = MenuItemId(id);
            let item = editor
                .store()
                .get(id)
                .with_context(|| format!("Menu item {} not found", id))?;
            let mut draft = MenuItemDraft::from_item(item);
            if let Some(item_type) = item_type {
                draft.item_type = item_type;
            }
            fields.apply_to(&mut draft);
            let updated = editor.submit(&draft, None).await?;
            println!("✅ Saved #{} {}", updated.id, updated.button_text(console_language()));
            Ok(())
        }
        Some(Commands::Move { id, parent, position }) => {
            editor.load().await?;
            let request = MoveRequest {
                id: MenuItemId(id),
                new_parent: parent.map(MenuItemId),
                position: position.unwrap_or(usize::MAX),
            };
            let entries = editor.move_item(request).await?;
            println!("✅ Moved #{} ({} item(s) renumbered)", id, entries.len());
            Ok(())
        }
        Some(Commands::Order { parent, ids }) => {
            editor.load().await?;
            let order: Vec<MenuItemId> = ids.into_iter().map(MenuItemId).collect();
            let entries = editor.reorder_level(parent.map(MenuItemId), &order).await?;
            println!("✅ Saved order ({} item(s) renumbered)", entries.len());
            Ok(())
        }
        Some(Commands::Delete { id, yes }) => {
            editor.load().await?;
            let id = MenuItemId(id);
            let forest = editor.tree()?;
            let nested = tree::find(&forest, id)
                .with_context(|| format!("Menu item {} not found", id))?
                .descendant_ids()
                .len();
            let prompt = format!("Delete menu item {} and {} nested item(s)?", id, nested);
            let confirmation = confirm(yes, &prompt)?;
            let removed = editor.delete(id, confirmation).await?;
            println!("🗑 Deleted {} item(s)", removed.len());
            Ok(())
        }
        Some(Commands::Duplicate { id }) => {
            editor.load().await?;
            let copy = editor.duplicate(MenuItemId(id)).await?;
            println!("✅ Created copy #{} {}", copy.id, copy.button_text(console_language()));
            Ok(())
        }
        Some(Commands::Templates) => {
            let language = console_language();
            for template in editor.templates().await? {
                println!("{}: {} ({} item(s))", template.id, template.name, template.items_count);
                if let Some(description) = template.description(language) {
                    println!("    {}", description);
                }
            }
            Ok(())
        }
        Some(Commands::ApplyTemplate { id, keep_existing, yes }) => {
            let prompt = if keep_existing {
                format!("Add items from template '{}' to the menu?", id)
            } else {
                format!("Replace the whole menu with template '{}'?", id)
            };
            let confirmation = confirm(yes, &prompt)?;
            let applied = editor.apply_template(&id, !keep_existing, confirmation).await?;
            println!("✅ {} ({} item(s) created)", applied.message, applied.items_created);
            Ok(())
        }
        Some(Commands::Check) => {
            editor.load().await?;
            run_check(&mut editor).await
        }
        None => {
            editor.load().await?;
            run_outline(&mut editor, false)
        }
    }
}

fn run_outline(editor: &mut Editor, collapsed: bool) -> Result<()> {
    let forest = editor.tree()?;
    if collapsed {
        editor.outline_state().collapse_all();
    } else {
        editor.outline_state().expand_all(&forest);
    }

    let rows = editor.outline_rows()?;
    if rows.is_empty() {
        println!("Menu is empty. Add an item or apply a template.");
    }
    for row in rows {
        println!("{}", row);
    }
    Ok(())
}

async fn run_preview(
    editor: &mut Editor,
    context: ViewerContext,
    path: &[MenuItemId],
    press: Option<MenuItemId>,
) -> Result<()> {
    let forest = editor.tree()?;
    let mut navigator = MenuNavigator::new(&forest, context);
    for id in path {
        if !navigator.enter_by_id(*id) {
            anyhow::bail!("Section {} is not reachable from the current level", id);
        }
    }

    if let Some(id) = press {
        match navigator.press_id(id) {
            PressOutcome::Entered(_) => {}
            PressOutcome::OpenUrl(url) => {
                println!("🔗 Opens {}", url);
                return Ok(());
            }
            PressOutcome::ShowText(text) => {
                println!("{}", text);
                return Ok(());
            }
            PressOutcome::ShowFaq(faq_id) => {
                let message = match editor.load_faq().await {
                    Ok(_) => editor
                        .store()
                        .get(id)
                        .and_then(|item| editor.faq_entry(item))
                        .map(|entry| entry.bot_message(context.language)),
                    Err(e) => {
                        log::warn!("Failed to load FAQ entries: {}", e);
                        None
                    }
                };
                match (message, faq_id) {
                    (Some(message), _) => println!("{}", message),
                    (None, Some(faq_id)) => println!("❓ FAQ #{} not found", faq_id),
                    (None, None) => println!("❓ FAQ reference is not a number"),
                }
                return Ok(());
            }
            PressOutcome::RunSystemAction(action) => {
                println!("⚙️ Opens built-in screen: {}", action.label_ru());
                return Ok(());
            }
            PressOutcome::Nothing => {
                println!("Nothing happens");
                return Ok(());
            }
        }
    }

    let screen = navigator.screen();
    println!("{}", screen.title);
    if screen.is_fallback {
        println!("(no configured items, showing the built-in main menu)");
    }
    for button in screen.buttons {
        match button.action {
            ButtonAction::Callback(data) => println!("[ {} ]  → {}", button.text, data),
            ButtonAction::Url(url) => println!("[ {} ]  → {}", button.text, url),
        }
    }
    Ok(())
}

async fn run_check(editor: &mut Editor) -> Result<()> {
    let issues = editor.integrity_report();
    for issue in &issues {
        let level = if issue.is_fatal() { "error" } else { "warning" };
        println!("{}: {}", level, issue);
    }

    if let Err(e) = editor.load_faq().await {
        log::warn!("Skipping FAQ reference check: {}", e);
    } else {
        for id in editor.unresolved_faq_items() {
            println!("warning: menu item {} points at an unknown FAQ entry", id);
        }
    }

    let fatal = issues.iter().filter(|issue| issue.is_fatal()).count();
    if fatal > 0 {
        anyhow::bail!("{} integrity error(s) found", fatal);
    }
    if issues.is_empty() {
        println!("✅ {} item(s), no integrity problems", editor.store().len());
    }
    Ok(())
}

fn console_language() -> Language {
    preview_language(None, &config::PREVIEW_LANGUAGE)
}

/// Confirmation from `--yes` or an interactive answer on stdin.
fn confirm(assume_yes: bool, prompt: &str) -> Result<Confirmation> {
    if assume_yes {
        return Ok(Confirmation::from_user_answer("yes")?);
    }
    eprint!("{} [y/N] ", prompt);
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(Confirmation::from_user_answer(&answer)?)
}
