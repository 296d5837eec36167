use crate::conversation::{RequestId, Role};
use crate::theme::Theme;
use crate::ui::markdown::MarkdownDocument;
use eframe::egui::{self, RichText, ScrollArea};

pub const PLACEHOLDER_TEXT: &str = "Thinking...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnBody {
    /// Waiting on the completion for this request; shown as plain text.
    Pending(RequestId),
    Rendered(MarkdownDocument),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub body: TurnBody,
}

#[derive(Debug, Default)]
pub struct ChatView {
    turns: Vec<ChatTurn>,
    scroll_to_bottom: bool,
}

impl ChatView {
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    #[cfg(test)]
    pub fn pending_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|turn| matches!(turn.body, TurnBody::Pending(_)))
            .count()
    }

    pub fn append_message(&mut self, role: Role, text: &str) {
        self.turns.push(ChatTurn {
            role,
            body: TurnBody::Rendered(MarkdownDocument::parse(text)),
        });
        self.scroll_to_bottom = true;
    }

    pub fn append_pending(&mut self, id: RequestId) {
        self.turns.push(ChatTurn {
            role: Role::Assistant,
            body: TurnBody::Pending(id),
        });
        self.scroll_to_bottom = true;
    }

    /// Rewrites the placeholder for `id`. Returns false when no such
    /// placeholder exists, in which case the text is appended as a new turn.
    pub fn replace_pending(&mut self, id: RequestId, text: &str) -> bool {
        let slot = self
            .turns
            .iter_mut()
            .rev()
            .find(|turn| turn.body == TurnBody::Pending(id));

        let replaced = match slot {
            Some(turn) => {
                turn.body = TurnBody::Rendered(MarkdownDocument::parse(text));
                true
            }
            None => {
                tracing::warn!(%id, "no pending turn for reply, appending instead");
                self.turns.push(ChatTurn {
                    role: Role::Assistant,
                    body: TurnBody::Rendered(MarkdownDocument::parse(text)),
                });
                false
            }
        };
        self.scroll_to_bottom = true;
        replaced
    }

    pub fn show(&mut self, ui: &mut egui::Ui, theme: &Theme, max_height: f32) {
        ScrollArea::vertical()
            .id_salt("chat_transcript")
            .max_height(max_height)
            .stick_to_bottom(true)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for turn in &self.turns {
                    let (label, frame) = match turn.role {
                        Role::User => ("You", theme.user_turn_frame()),
                        Role::Assistant | Role::System => ("Advisor", theme.card_frame()),
                    };
                    frame.show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(RichText::new(label).color(theme.text_muted).size(12.0));
                        match &turn.body {
                            TurnBody::Pending(_) => {
                                ui.label(
                                    RichText::new(PLACEHOLDER_TEXT)
                                        .color(theme.text_muted)
                                        .italics(),
                                );
                            }
                            TurnBody::Rendered(document) => document.show(ui, theme),
                        }
                    });
                    ui.add_space(theme.spacing_8);
                }

                if self.scroll_to_bottom {
                    ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                }
            });
        self.scroll_to_bottom = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_ids(view: &ChatView) -> Vec<RequestId> {
        view.turns()
            .iter()
            .filter_map(|turn| match turn.body {
                TurnBody::Pending(id) => Some(id),
                TurnBody::Rendered(_) => None,
            })
            .collect()
    }

    fn text_of(turn: &ChatTurn) -> String {
        match &turn.body {
            TurnBody::Pending(_) => PLACEHOLDER_TEXT.to_string(),
            TurnBody::Rendered(document) => document.to_plain_text(),
        }
    }

    fn request_ids() -> (RequestId, RequestId) {
        let mut manager = crate::conversation::ConversationManager::new(
            "directive",
            "model",
            crate::conversation::TokenBudgets {
                freeform: 1,
                routine: 1,
            },
        );
        let first = manager.begin_freeform("a").expect("input should be accepted");
        let second = manager.begin_freeform("b").expect("input should be accepted");
        (first.id, second.id)
    }

    #[test]
    fn every_mutation_requests_scroll() {
        let (id, _) = request_ids();
        let mut view = ChatView::default();
        assert!(!view.scroll_to_bottom);

        view.append_message(Role::User, "hi");
        assert!(view.scroll_to_bottom);
        view.scroll_to_bottom = false;

        view.append_pending(id);
        assert!(view.scroll_to_bottom);
        view.scroll_to_bottom = false;

        view.replace_pending(id, "hello");
        assert!(view.scroll_to_bottom);
    }

    #[test]
    fn replies_land_in_their_own_placeholder_regardless_of_order() {
        let (first, second) = request_ids();
        let mut view = ChatView::default();
        view.append_message(Role::User, "first question");
        view.append_pending(first);
        view.append_message(Role::User, "second question");
        view.append_pending(second);

        assert!(view.replace_pending(second, "second answer"));
        assert_eq!(pending_ids(&view), vec![first]);
        assert!(view.replace_pending(first, "first answer"));

        let texts: Vec<String> = view.turns().iter().map(text_of).collect();
        assert_eq!(
            texts,
            vec!["first question", "first answer", "second question", "second answer"]
        );
        assert_eq!(view.pending_count(), 0);
    }

    #[test]
    fn replacing_unknown_placeholder_appends_new_turn() {
        let (first, second) = request_ids();
        let mut view = ChatView::default();
        view.append_pending(first);

        assert!(!view.replace_pending(second, "late reply"));
        assert_eq!(view.turns().len(), 2);
        assert_eq!(view.pending_count(), 1);
        assert_eq!(view.turns()[1].role, Role::Assistant);
        assert_eq!(text_of(&view.turns()[1]), "late reply");
    }

    #[test]
    fn assistant_text_is_rendered_as_markdown() {
        let (id, _) = request_ids();
        let mut view = ChatView::default();
        view.append_pending(id);
        view.replace_pending(id, "**Step 1:** cleanse");

        let TurnBody::Rendered(document) = &view.turns()[0].body else {
            panic!("placeholder should be replaced");
        };
        assert_eq!(document.to_plain_text(), "Step 1: cleanse");
    }
}
