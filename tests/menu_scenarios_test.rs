//! End-to-end menu behavior through the public API
//!
//! Run with: cargo test --test menu_scenarios_test

use pretty_assertions::assert_eq;

use subadmin::menu::{
    build, flatten, reorder, visible, ItemKind, Language, LanguageGate, MenuEditor, MenuItem, MenuItemId,
    MenuNavigator, MenuNode, MoveRequest, ReorderError, ViewerContext, Visibility,
};
use subadmin::testing::{InMemoryMenuRepository, RepoCall};
use subadmin::AppError;

fn section(id: i64, parent: Option<i64>, text: &str, sort_order: i32) -> MenuItem {
    let mut item = MenuItem::new(id, parent, ItemKind::Section, text);
    item.sort_order = sort_order;
    item
}

fn text(id: i64, parent: Option<i64>, label: &str, sort_order: i32) -> MenuItem {
    let mut item = MenuItem::new(id, parent, ItemKind::Text { body: "body".into() }, label);
    item.sort_order = sort_order;
    item
}

fn ids(nodes: &[&MenuNode]) -> Vec<MenuItemId> {
    nodes.iter().map(|node| node.id()).collect()
}

fn shape(forest: &[MenuNode]) -> Vec<(MenuItemId, Vec<MenuItemId>)> {
    forest
        .iter()
        .map(|node| (node.id(), node.descendant_ids()))
        .collect()
}

// ============================================================================
// Tree Properties
// ============================================================================

mod tree_properties {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalized_items() -> Vec<MenuItem> {
        vec![
            section(1, None, "Помощь", 0),
            text(2, Some(1), "Правила", 0),
            section(3, Some(1), "Оплата", 1),
            text(4, Some(3), "Карты", 0),
            text(5, None, "О канале", 1),
        ]
    }

    #[test]
    fn test_round_trip_of_normalized_tree_is_exact() {
        let tree = build(&normalized_items()).unwrap();
        let rebuilt = build(&flatten(&tree)).unwrap();
        assert_eq!(rebuilt, tree);
    }

    #[test]
    fn test_round_trip_keeps_shape_with_sparse_sort_orders() {
        let items = vec![
            section(10, None, "A", 40),
            text(11, Some(10), "A1", 7),
            text(12, Some(10), "A2", 3),
            text(13, None, "B", 5),
        ];
        let tree = build(&items).unwrap();
        let rebuilt = build(&flatten(&tree)).unwrap();

        assert_eq!(shape(&rebuilt), shape(&tree));
        assert_eq!(rebuilt[0].id(), MenuItemId(13));
        assert_eq!(rebuilt[1].children[0].id(), MenuItemId(12));

        // Once flattened, the tree is normalized and round-trips exactly
        let again = build(&flatten(&rebuilt)).unwrap();
        assert_eq!(again, rebuilt);
    }

    #[test]
    fn test_leaves_never_get_children() {
        let tree = build(&normalized_items()).unwrap();
        fn check(level: &[MenuNode]) {
            for node in level {
                if !node.item.is_section() {
                    assert!(node.children.is_empty(), "leaf {} has children", node.id());
                }
                check(&node.children);
            }
        }
        check(&tree);
    }

    #[test]
    fn test_child_of_leaf_is_reported() {
        let items = vec![text(1, None, "Лист", 0), text(2, Some(1), "Потомок", 0)];
        let err = build(&items).unwrap_err();
        assert_eq!(err.issues().len(), 1);
    }

    #[test]
    fn test_visible_is_pure() {
        let tree = build(&normalized_items()).unwrap();
        let ctx = ViewerContext::new(Language::Ru, false);

        let first = ids(&visible(&tree, &ctx));
        let _ = visible(&tree[0].children, &ctx);
        let second = ids(&visible(&tree, &ctx));

        assert_eq!(first, second);
    }
}

// ============================================================================
// Visibility Scenarios
// ============================================================================

mod visibility_scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_subscriber_only_item() {
        let mut gated = text(2, None, "Сигналы", 1);
        gated.visibility = Visibility::Subscribed;
        let tree = build(&[text(1, None, "Всем", 0), gated]).unwrap();

        let outsider = ViewerContext::new(Language::Ru, false);
        assert_eq!(ids(&visible(&tree, &outsider)), vec![MenuItemId(1)]);

        let subscriber = ViewerContext::new(Language::Ru, true);
        assert_eq!(ids(&visible(&tree, &subscriber)), vec![MenuItemId(1), MenuItemId(2)]);
    }

    #[test]
    fn test_language_gate_wins_over_other_flags() {
        let mut english = text(1, None, "Only EN", 0);
        english.visibility_language = LanguageGate::En;

        for visibility in [Visibility::All, Visibility::Subscribed, Visibility::NotSubscribed] {
            for subscribed in [false, true] {
                let mut item = english.clone();
                item.visibility = visibility;
                let tree = build(&[item]).unwrap();
                let ctx = ViewerContext::new(Language::Ru, subscribed);
                assert!(visible(&tree, &ctx).is_empty());
            }
        }
    }
}

// ============================================================================
// Navigation Scenarios
// ============================================================================

mod navigation_scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    fn faq_tree() -> Vec<MenuNode> {
        let faq = MenuItem::new(2, Some(1), ItemKind::Faq { faq_ref: "5".into() }, "Как оплатить?");
        build(&[section(1, None, "FAQ", 0), faq]).unwrap()
    }

    #[test]
    fn test_enter_and_back() {
        let tree = faq_tree();
        let mut nav = MenuNavigator::new(&tree, ViewerContext::default());

        assert_eq!(ids(&nav.current_items()), vec![MenuItemId(1)]);
        assert!(nav.enter(&tree[0]));
        assert_eq!(ids(&nav.current_items()), vec![MenuItemId(2)]);
        nav.back();
        assert_eq!(ids(&nav.current_items()), vec![MenuItemId(1)]);
    }

    #[test]
    fn test_entering_a_leaf_is_rejected() {
        let tree = faq_tree();
        let mut nav = MenuNavigator::new(&tree, ViewerContext::default());
        assert!(nav.enter(&tree[0]));

        assert!(!nav.enter(&tree[0].children[0]));
        assert_eq!(nav.depth(), 1);
        assert_eq!(ids(&nav.current_items()), vec![MenuItemId(2)]);
    }

    #[test]
    fn test_empty_menu_shows_built_in_screen() {
        let tree: Vec<MenuNode> = Vec::new();
        let nav = MenuNavigator::new(&tree, ViewerContext::new(Language::En, false));
        let screen = nav.screen();

        assert!(screen.is_fallback);
        assert!(!screen.buttons.is_empty());
    }
}

// ============================================================================
// Reorder Scenarios
// ============================================================================

mod reorder_scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    fn abc() -> Vec<MenuItem> {
        vec![text(1, None, "A", 0), text(2, None, "B", 1), text(3, None, "C", 2)]
    }

    #[test]
    fn test_drag_last_to_front() {
        let mut tree = build(&abc()).unwrap();
        reorder::reorder_siblings(&mut tree, None, &[MenuItemId(3), MenuItemId(1), MenuItemId(2)]).unwrap();

        let flat: Vec<(MenuItemId, Option<MenuItemId>, i32)> = flatten(&tree)
            .into_iter()
            .map(|item| (item.id, item.parent_id, item.sort_order))
            .collect();
        assert_eq!(
            flat,
            vec![
                (MenuItemId(3), None, 0),
                (MenuItemId(1), None, 1),
                (MenuItemId(2), None, 2),
            ]
        );
    }

    #[test]
    fn test_moving_section_into_own_child_is_rejected() {
        let items = vec![section(1, None, "Внешний", 0), section(2, Some(1), "Внутренний", 0)];
        let mut tree = build(&items).unwrap();
        let before = tree.clone();

        let err = reorder::apply_move(
            &mut tree,
            &MoveRequest {
                id: MenuItemId(1),
                new_parent: Some(MenuItemId(2)),
                position: 0,
            },
        )
        .unwrap_err();

        assert!(matches!(err, ReorderError::WouldCreateCycle { .. }));
        assert_eq!(tree, before);
    }
}

// ============================================================================
// Editor Flows
// ============================================================================

mod editor_flows {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_reorder_is_persisted_as_one_batch() {
        let repo = InMemoryMenuRepository::with_items(vec![
            text(1, None, "A", 0),
            text(2, None, "B", 1),
            text(3, None, "C", 2),
        ]);
        let mut editor = MenuEditor::new(repo);
        editor.load().await.unwrap();

        let entries = editor
            .reorder_level(None, &[MenuItemId(3), MenuItemId(1), MenuItemId(2)])
            .await
            .unwrap();
        assert_eq!(entries.len(), 3);

        let calls = editor.repository().calls().await;
        assert!(matches!(calls.last(), Some(RepoCall::Reorder(batch)) if batch.len() == 3));

        let stored = editor.repository().items().await;
        let c = stored.iter().find(|item| item.id == MenuItemId(3)).unwrap();
        assert_eq!(c.sort_order, 0);
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_local_state() {
        let repo = InMemoryMenuRepository::with_items(vec![text(1, None, "A", 0), text(2, None, "B", 1)]);
        let mut editor = MenuEditor::new(repo);
        editor.load().await.unwrap();
        editor.repository().fail_mutations(true);

        let err = editor
            .reorder_level(None, &[MenuItemId(2), MenuItemId(1)])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::HttpStatus { .. }));
        assert_eq!(editor.store().get(MenuItemId(2)).unwrap().sort_order, 0);
    }
}
