//! TodoMVC scenario bodies

use pagecheck::prelude::*;

const SAUSAGES: &str = "buy some sausages";

/// Add `titles` and wait until exactly that many records are persisted
pub async fn add_and_converge(todo: TodoMvcPage, titles: Vec<String>) -> PagecheckResult<()> {
    todo.add_todos(&titles).await?;
    let converged = todo.records().wait_for_count(titles.len()).await?;
    let persisted: Vec<&str> = converged.snapshot.titles().collect();
    assert_eq!(persisted, titles.iter().map(String::as_str).collect::<Vec<_>>());
    Ok(())
}

pub async fn default_todos_in_order(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    expect(&todo.todo_titles).to_have_texts(&DEFAULT_TODOS).await?;
    todo.records().wait_for_count(3).await?;

    todo.check_item(0).await?;
    todo.records().wait_for_completed(1).await?;
    expect(&todo.item(0)).to_have_class("completed").await?;
    expect(&todo.todo_items)
        .to_have_classes(&["completed", "", ""])
        .await
}

pub async fn input_cleared_after_add(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.add_todo(DEFAULT_TODOS[0]).await?;
    expect(&todo.new_todo).to_be_empty().await?;
    todo.records().wait_for_title(DEFAULT_TODOS[0]).await?;
    Ok(())
}

pub async fn items_left_counter(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    expect(&todo.todo_count).to_have_text("3 items left").await?;
    todo.check_item(0).await?;
    todo.check_item(2).await?;
    expect(&todo.todo_count).to_have_text("1 item left").await?;
    todo.records().wait_for_completed(2).await?;
    Ok(())
}

pub async fn mark_all_then_clear(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    todo.mark_all_complete().await?;
    expect(&todo.todo_items)
        .to_have_classes(&["completed", "completed", "completed"])
        .await?;
    todo.records().wait_for_completed(3).await?;

    todo.clear_all_complete().await?;
    expect(&todo.todo_items).to_have_classes(&["", "", ""]).await?;
    todo.records().wait_for_completed(0).await?;
    Ok(())
}

/// The toggle-all checkbox follows per-item changes
pub async fn toggle_all_tracks_items(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    todo.mark_all_complete().await?;
    expect(&todo.toggle_all).to_be_checked().await?;
    todo.records().wait_for_completed(3).await?;

    todo.uncheck_item(0).await?;
    expect(&todo.toggle_all).not().to_be_checked().await?;
    todo.check_item(0).await?;
    todo.records().wait_for_completed(3).await?;
    expect(&todo.toggle_all).to_be_checked().await
}

pub async fn edit_trims_whitespace(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    todo.edit_item(1, "    buy some sausages    ", EditCommit::Enter)
        .await?;
    expect(&todo.todo_titles)
        .to_have_texts(&[DEFAULT_TODOS[0], SAUSAGES, DEFAULT_TODOS[2]])
        .await?;
    let converged = todo.records().wait_for_title(SAUSAGES).await?;
    assert!(!converged.snapshot.contains_title(DEFAULT_TODOS[1]));
    Ok(())
}

pub async fn edit_to_empty_removes(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    todo.records().wait_for_count(3).await?;
    todo.edit_item(1, "", EditCommit::Enter).await?;
    expect(&todo.todo_titles)
        .to_have_texts(&[DEFAULT_TODOS[0], DEFAULT_TODOS[2]])
        .await?;
    let converged = todo.records().wait_for_count(2).await?;
    assert!(!converged.snapshot.contains_title(DEFAULT_TODOS[1]));
    Ok(())
}

pub async fn escape_cancels_edit(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    todo.edit_item(1, SAUSAGES, EditCommit::Escape).await?;
    expect(&todo.todo_titles).to_have_texts(&DEFAULT_TODOS).await?;
    let unchanged = RecordPredicate::custom("default titles", |set| {
        set.titles().eq(DEFAULT_TODOS.iter().copied())
    });
    todo.records().wait_for(unchanged).await?;
    Ok(())
}

pub async fn blur_saves_edit(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    todo.edit_item(1, SAUSAGES, EditCommit::Blur).await?;
    expect(&todo.todo_titles)
        .to_have_texts(&[DEFAULT_TODOS[0], SAUSAGES, DEFAULT_TODOS[2]])
        .await?;
    todo.records().wait_for_title(SAUSAGES).await?;
    Ok(())
}

/// Checkbox and label of the edited item disappear behind its editor
pub async fn editing_hides_controls(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    todo.begin_edit(1).await?;
    expect(&todo.item_checkbox(1)).not().to_be_visible().await?;
    expect(&todo.item_title(1)).to_be_hidden().await?;
    expect(&todo.item_editor(1)).to_be_visible().await?;
    expect(&todo.item_editor(1)).to_have_value(DEFAULT_TODOS[1]).await?;
    todo.item_editor(1).press("Escape").await?;
    expect(&todo.item_title(1)).to_be_visible().await
}

pub async fn clear_completed(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    expect(&todo.clear_completed).to_be_hidden().await?;
    todo.check_item(1).await?;
    expect(&todo.clear_completed).to_be_visible().await?;

    todo.clear_completed_items().await?;
    expect(&todo.todo_titles)
        .to_have_texts(&[DEFAULT_TODOS[0], DEFAULT_TODOS[2]])
        .await?;
    expect(&todo.clear_completed).to_be_hidden().await?;
    todo.records().wait_for_count(2).await?;
    Ok(())
}

/// Persisted state survives a reload once it has converged
pub async fn reload_keeps_state(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.add_todos(&DEFAULT_TODOS[..2]).await?;
    todo.check_item(0).await?;
    let before = todo.records().wait_for_completed(1).await?.snapshot;

    todo.page().reload().await?;
    expect(&todo.todo_titles)
        .to_have_texts(&DEFAULT_TODOS[..2])
        .await?;
    expect(&todo.todo_items)
        .to_have_classes(&["completed", ""])
        .await?;
    let after = todo.records().wait_for_count(2).await?.snapshot;
    assert_eq!(before, after);
    Ok(())
}

pub async fn routing_filters(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    todo.check_item(1).await?;
    todo.records().wait_for_completed(1).await?;

    todo.show(Filter::Active).await?;
    expect_page(todo.page()).to_have_url(&Filter::Active.url()).await?;
    expect(&todo.todo_titles)
        .to_have_texts(&[DEFAULT_TODOS[0], DEFAULT_TODOS[2]])
        .await?;

    todo.show(Filter::Completed).await?;
    expect(&todo.todo_titles).to_have_texts(&[DEFAULT_TODOS[1]]).await?;

    todo.show(Filter::All).await?;
    expect(&todo.todo_items).to_have_count(3).await
}

/// Filter changes are history entries
pub async fn back_button(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    todo.check_item(1).await?;
    todo.records().wait_for_completed(1).await?;

    todo.show(Filter::All).await?;
    expect(&todo.todo_items).to_have_count(3).await?;
    todo.show(Filter::Active).await?;
    expect(&todo.todo_items).to_have_count(2).await?;
    todo.show(Filter::Completed).await?;
    expect(&todo.todo_items).to_have_count(1).await?;

    todo.page().go_back().await?;
    expect(&todo.todo_items).to_have_count(2).await?;
    todo.page().go_back().await?;
    expect(&todo.todo_items).to_have_count(3).await
}

pub async fn selected_filter_highlight(todo: TodoMvcPage) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    expect(todo.filter_link(Filter::All)).to_have_class("selected").await?;

    todo.show(Filter::Active).await?;
    expect(todo.filter_link(Filter::Active)).to_have_class("selected").await?;
    expect(todo.filter_link(Filter::All)).not().to_have_class("selected").await?;

    todo.show(Filter::Completed).await?;
    expect(todo.filter_link(Filter::Completed))
        .to_have_class("selected")
        .await
}

/// Capture the three-item list against baseline `todomvc-defaults`
pub async fn screenshot_baseline(todo: TodoMvcPage, store: ScreenshotStore) -> PagecheckResult<()> {
    todo.create_default_todos().await?;
    todo.records().wait_for_count(3).await?;
    expect(&todo.todo_titles).to_have_texts(&DEFAULT_TODOS).await?;
    expect_page(todo.page())
        .to_have_screenshot(&store, "todomvc-defaults")
        .await?;
    let again = expect_page(todo.page())
        .to_have_screenshot(&store, "todomvc-defaults")
        .await?;
    assert!(matches!(again, SnapshotCheck::Matched | SnapshotCheck::Updated));
    Ok(())
}
