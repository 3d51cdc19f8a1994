//! Journey-stage chevron indicator.
//!
//! Renders the five stages in journey order with the pinned stage
//! highlighted, e.g. `Awareness ❯ Consideration ❯ [Purchase] ❯ ...`.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::domain::{JourneyStage, Selection};

const CHEVRON: &str = " \u{276f} ";

/// Build the chevron line for the current stage selection. The pinned stage
/// is highlighted in `highlight` (the active psychography's color).
pub fn journey_line(stage: &Selection, highlight: Color) -> Line<'static> {
    let pinned = stage.pinned();
    let mut spans: Vec<Span<'static>> = Vec::new();

    for (i, s) in JourneyStage::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(CHEVRON, Style::default().fg(Color::DarkGray)));
        }
        let name = s.display_name();
        let style = if pinned == Some(name) {
            Style::default().fg(highlight).add_modifier(Modifier::BOLD)
        } else if pinned.is_none() {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(name, style));
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chevron_line_lists_every_stage_in_order() {
        let line = journey_line(&Selection::All, Color::Yellow);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(
            text,
            "Awareness \u{276f} Consideration \u{276f} Purchase \u{276f} Satisfaction \u{276f} Loyalty"
        );
    }

    #[test]
    fn pinned_stage_is_the_only_bold_span() {
        let line = journey_line(&Selection::one("Purchase"), Color::Yellow);
        let bold: Vec<&str> = line
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::BOLD))
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(bold, ["Purchase"]);
    }
}
