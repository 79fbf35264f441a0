//! Plain-text renderer for view models.
//!
//! Produces the line-oriented output used by the `flight-search` shell. Query
//! matches are wrapped in `[brackets]` and favorite routes are marked with `*`.

use crate::app::SearchUiState;
use crate::ui::viewmodel::{AirportLabel, DisplayItem, FlightItem, SuggestionItem, UIViewModel};
use std::fmt::Write as _;

/// Computes the view model for `state` and renders it.
#[must_use]
pub fn render(state: &SearchUiState) -> String {
    render_to_string(&state.compute_viewmodel())
}

/// Renders a view model as numbered plain-text lines.
///
/// # Example
///
/// ```rust
/// use flight_search::app::SearchUiState;
/// use flight_search::ui::render_to_string;
///
/// let text = render_to_string(&SearchUiState::default().compute_viewmodel());
/// assert!(text.contains("Search for an airport"));
/// ```
#[must_use]
pub fn render_to_string(vm: &UIViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", vm.header.title);
    let _ = writeln!(out, "search: {}", vm.search_bar.query);

    if let Some(empty) = &vm.empty_state {
        let _ = writeln!(out, "  {}", empty.message);
        if !empty.subtitle.is_empty() {
            let _ = writeln!(out, "  {}", empty.subtitle);
        }
        return out;
    }

    for (index, item) in vm.display_items.iter().enumerate() {
        let line = match item {
            DisplayItem::Suggestion(suggestion) => render_suggestion(suggestion),
            DisplayItem::Flight(flight) => render_flight(flight),
        };
        let _ = writeln!(out, "{index:>3}. {line}");
    }
    out
}

fn render_suggestion(item: &SuggestionItem) -> String {
    format!(
        "{}  {}",
        highlight(&item.code, &item.code_highlights),
        highlight(&item.name, &item.name_highlights)
    )
}

fn render_flight(item: &FlightItem) -> String {
    let marker = if item.is_favorite { '*' } else { ' ' };
    format!(
        "{marker} {} -> {}",
        render_label(&item.departure),
        render_label(&item.destination)
    )
}

fn render_label(label: &AirportLabel) -> String {
    match &label.name {
        Some(name) => format!("{} ({name})", label.code),
        None => label.code.clone(),
    }
}

/// Wraps each `(start, end)` byte range of `text` in brackets.
///
/// Ranges must be sorted, non-overlapping and on char boundaries; any range
/// that is not is skipped.
fn highlight(text: &str, ranges: &[(usize, usize)]) -> String {
    let mut out = String::with_capacity(text.len() + ranges.len() * 2);
    let mut cursor = 0;
    for &(start, end) in ranges {
        let (Some(before), Some(matched)) = (text.get(cursor..start), text.get(start..end)) else {
            continue;
        };
        out.push_str(before);
        out.push('[');
        out.push_str(matched);
        out.push(']');
        cursor = end;
    }
    out.push_str(text.get(cursor..).unwrap_or_default());
    out
}
