use crate::catalog::{CatalogError, CatalogStore, Product, ProductId};
use crate::completion::CompletionError;
use crate::config::AppConfig;
use crate::conversation::{
    CompletionRequest, ConversationError, ConversationManager, RequestId, Resolution, Role,
    TokenBudgets,
};
use crate::selection::{SelectionError, SelectionManager, SelectionStore, Toggle};
use crate::ui::chat::ChatView;
use crate::ui::product_grid::CatalogView;
use std::time::{SystemTime, UNIX_EPOCH};

pub const EMPTY_SELECTION_ALERT: &str = "Please select products first!";
pub const ROUTINE_REQUEST_LABEL: &str = "Generate a routine with my selected products...";

/// Everything the window shows, owned in one place and mutated only from the
/// UI thread. Network work is described by the returned requests and fed
/// back through [`AppState::apply_catalog`] and [`AppState::apply_completion`].
pub struct AppState {
    categories: Vec<String>,
    category: Option<String>,
    catalog: CatalogStore,
    selection: SelectionManager,
    catalog_view: CatalogView,
    conversation: ConversationManager,
    chat: ChatView,
    alert: Option<&'static str>,
    diagnostics: Vec<String>,
}

impl AppState {
    pub fn new(config: &AppConfig, selection_store: Box<dyn SelectionStore>) -> Self {
        let mut state = Self {
            categories: config.categories.clone(),
            category: None,
            catalog: CatalogStore::default(),
            selection: SelectionManager::load(selection_store),
            catalog_view: CatalogView::default(),
            conversation: ConversationManager::new(
                config.system_directive.clone(),
                config.model.clone(),
                TokenBudgets {
                    freeform: config.freeform_max_tokens,
                    routine: config.routine_max_tokens,
                },
            ),
            chat: ChatView::default(),
            alert: None,
            diagnostics: Vec::new(),
        };
        state.collect_selection_warnings();
        state
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn catalog_view(&self) -> &CatalogView {
        &self.catalog_view
    }

    #[cfg(test)]
    pub fn chat(&self) -> &ChatView {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatView {
        &mut self.chat
    }

    pub fn conversation(&self) -> &ConversationManager {
        &self.conversation
    }

    pub fn alert(&self) -> Option<&'static str> {
        self.alert
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics
            .push(format!("[{}] {}", timestamp(), message.into()));
    }

    /// Records the chosen category. The caller fetches the catalog for it.
    pub fn choose_category(&mut self, category: impl Into<String>) {
        let category = category.into();
        tracing::info!(%category, "category selected");
        self.category = Some(category);
    }

    /// Applies a catalog fetch issued for `category`. Results for a category
    /// that is no longer chosen are dropped. Returns how many cards were rendered.
    pub fn apply_catalog(
        &mut self,
        category: &str,
        result: Result<Vec<Product>, CatalogError>,
    ) -> Result<usize, CatalogError> {
        if self.category.as_deref() != Some(category) {
            tracing::debug!(%category, "dropping catalog for a stale category");
            return Ok(self.catalog_view.cards().len());
        }

        let products = self.catalog.filter(result?, category);
        let count = products.len();
        self.catalog_view.render(products, &self.selection);
        Ok(count)
    }

    /// A click on a rendered card: expand or collapse it, then flip its selection.
    pub fn click_card(&mut self, id: ProductId) -> Result<Option<Toggle>, SelectionError> {
        if !self.catalog_view.click(id) {
            return Ok(None);
        }
        let toggle = self.selection.toggle(id, &self.catalog)?;
        self.catalog_view.set_marker(id, toggle.is_selected());
        self.collect_selection_warnings();
        Ok(Some(toggle))
    }

    pub fn remove_selected(&mut self, id: ProductId) {
        self.selection.remove(id);
        self.catalog_view.set_marker(id, false);
        self.collect_selection_warnings();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.catalog_view.clear_markers();
        self.collect_selection_warnings();
    }

    /// Blank input is ignored and yields no request.
    pub fn submit_chat(&mut self, text: &str) -> Option<CompletionRequest> {
        match self.conversation.begin_freeform(text) {
            Ok(request) => {
                self.chat.append_message(Role::User, text.trim());
                self.chat.append_pending(request.id);
                Some(request)
            }
            Err(ConversationError::EmptyInput) => None,
            Err(err) => {
                self.report_conversation_error(err);
                None
            }
        }
    }

    /// With nothing selected this raises the alert and yields no request.
    pub fn generate_routine(&mut self) -> Option<CompletionRequest> {
        match self.conversation.begin_routine(self.selection.items()) {
            Ok(request) => {
                self.chat.append_message(Role::User, ROUTINE_REQUEST_LABEL);
                self.chat.append_pending(request.id);
                Some(request)
            }
            Err(ConversationError::EmptySelection) => {
                tracing::info!("routine requested with an empty selection");
                self.alert = Some(EMPTY_SELECTION_ALERT);
                None
            }
            Err(err) => {
                self.report_conversation_error(err);
                None
            }
        }
    }

    pub fn apply_completion(
        &mut self,
        id: RequestId,
        result: Result<String, CompletionError>,
    ) -> Resolution {
        if let Err(err) = &result {
            self.log_diagnostic(format!("completion {id} failed: {err}"));
        }
        let resolution = self.conversation.resolve(id, result);
        self.chat.replace_pending(id, resolution.text());
        resolution
    }

    fn report_conversation_error(&mut self, err: ConversationError) {
        tracing::error!("could not build completion request: {err}");
        self.log_diagnostic(format!("could not build completion request: {err}"));
    }

    fn collect_selection_warnings(&mut self) {
        for warning in self.selection.take_warnings() {
            self.log_diagnostic(warning);
        }
    }
}

fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_secs().to_string(),
        Err(_) => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;
    use crate::conversation::{Message, FAILURE_NOTICE};
    use crate::selection::store::InMemoryStore;
    use crate::ui::chat::{TurnBody, PLACEHOLDER_TEXT};

    fn catalog_products() -> Vec<Product> {
        vec![product(1, "Cleanser", "cleanser"), product(2, "Serum", "serum")]
    }

    fn state_with(store: InMemoryStore) -> AppState {
        AppState::new(&AppConfig::default(), Box::new(store))
    }

    fn state_filtered_to(category: &str) -> AppState {
        let mut state = state_with(InMemoryStore::default());
        state.choose_category(category);
        state
            .apply_catalog(category, Ok(catalog_products()))
            .expect("catalog should apply");
        state
    }

    fn turn_texts(state: &AppState) -> Vec<String> {
        state
            .chat()
            .turns()
            .iter()
            .map(|turn| match &turn.body {
                TurnBody::Pending(_) => PLACEHOLDER_TEXT.to_string(),
                TurnBody::Rendered(document) => document.to_plain_text(),
            })
            .collect()
    }

    fn roles(state: &AppState) -> Vec<Role> {
        state
            .conversation()
            .transcript()
            .messages()
            .iter()
            .map(|message| message.role)
            .collect()
    }

    #[test]
    fn filter_select_and_remove_keep_card_marker_in_sync() {
        let mut state = state_filtered_to("serum");
        let ids: Vec<_> = state
            .catalog_view()
            .cards()
            .iter()
            .map(|card| card.product.id)
            .collect();
        assert_eq!(ids, vec![2]);

        assert_eq!(state.click_card(2), Ok(Some(Toggle::Added)));
        assert_eq!(
            state.selection().panel_rows(),
            vec![(2, "Serum (Brand)".to_string())]
        );
        let card = state.catalog_view().card(2).expect("card 2 should render");
        assert!(card.selected);
        assert!(card.description_visible);

        state.remove_selected(2);
        assert!(state.selection().is_empty());
        assert!(!state.catalog_view().card(2).expect("card 2 should render").selected);
    }

    #[test]
    fn clicking_a_card_twice_deselects_it() {
        let mut state = state_filtered_to("cleanser");
        state.click_card(1).expect("toggle should succeed");
        assert_eq!(state.click_card(1), Ok(Some(Toggle::Removed)));
        assert!(state.selection().is_empty());
        assert!(!state.catalog_view().card(1).expect("card 1").selected);
    }

    #[test]
    fn clicking_an_unrendered_card_changes_nothing() {
        let mut state = state_filtered_to("serum");
        assert_eq!(state.click_card(1), Ok(None));
        assert!(state.selection().is_empty());
    }

    #[test]
    fn refiltering_marks_cards_from_the_selection() {
        let mut state = state_filtered_to("serum");
        state.click_card(2).expect("toggle should succeed");

        state.choose_category("cleanser");
        state
            .apply_catalog("cleanser", Ok(catalog_products()))
            .expect("catalog should apply");
        state.choose_category("serum");
        state
            .apply_catalog("serum", Ok(catalog_products()))
            .expect("catalog should apply");

        assert!(state.catalog_view().card(2).expect("card 2").selected);
        assert_eq!(state.selection().items().len(), 1);
    }

    #[test]
    fn stale_catalog_results_are_dropped() {
        let mut state = state_filtered_to("serum");
        state.choose_category("cleanser");

        let rendered = state
            .apply_catalog("serum", Ok(vec![product(3, "Other", "serum")]))
            .expect("stale results are not an error");
        assert_eq!(rendered, 1);
        assert!(state.catalog_view().card(3).is_none());
        assert!(state.catalog_view().card(2).is_some());
    }

    #[test]
    fn catalog_failure_surfaces_to_caller() {
        let mut state = state_with(InMemoryStore::default());
        state.choose_category("serum");
        let parse_error =
            crate::catalog::parse_catalog(b"not json").expect_err("fixture is invalid");

        let error = state
            .apply_catalog("serum", Err(parse_error))
            .expect_err("failure should propagate");
        assert!(matches!(error, CatalogError::Parse(_)));
        assert!(state.catalog_view().cards().is_empty());
    }

    #[test]
    fn clear_empties_selection_and_every_marker() {
        let mut state = state_with(InMemoryStore::default());
        state.choose_category("all");
        let all: Vec<Product> = catalog_products()
            .into_iter()
            .map(|mut p| {
                p.category = "all".to_string();
                p
            })
            .collect();
        state.apply_catalog("all", Ok(all)).expect("catalog should apply");
        state.click_card(1).expect("toggle should succeed");
        state.click_card(2).expect("toggle should succeed");

        state.clear_selection();
        assert!(state.selection().is_empty());
        assert!(state.catalog_view().cards().iter().all(|card| !card.selected));
    }

    #[test]
    fn selection_survives_restart() {
        let store = InMemoryStore::default();
        let mut state = state_with(store.clone());
        state.choose_category("serum");
        state
            .apply_catalog("serum", Ok(catalog_products()))
            .expect("catalog should apply");
        state.click_card(2).expect("toggle should succeed");

        let restarted = state_with(store);
        assert_eq!(restarted.selection().items(), state.selection().items());
    }

    #[test]
    fn routine_with_empty_selection_alerts_without_request() {
        let mut state = state_with(InMemoryStore::default());

        assert!(state.generate_routine().is_none());
        assert_eq!(state.alert(), Some(EMPTY_SELECTION_ALERT));
        assert_eq!(state.conversation().in_flight(), 0);
        assert_eq!(state.conversation().transcript().len(), 1);
        assert!(state.chat().turns().is_empty());

        state.dismiss_alert();
        assert!(state.alert().is_none());
    }

    #[test]
    fn routine_request_shows_short_label_but_sends_products() {
        let mut state = state_filtered_to("serum");
        state.click_card(2).expect("toggle should succeed");

        let request = state.generate_routine().expect("selection is non-empty");
        assert_eq!(request.payload.max_tokens, 400);
        assert!(request.payload.messages[1].content.contains("\"name\": \"Serum\""));
        assert_eq!(turn_texts(&state), vec![ROUTINE_REQUEST_LABEL, PLACEHOLDER_TEXT]);
    }

    #[test]
    fn freeform_exchange_adds_one_user_and_one_assistant_turn() {
        let mut state = state_with(InMemoryStore::default());
        let request = state
            .submit_chat("What's a good night routine?")
            .expect("non-empty input should send");

        assert_eq!(
            turn_texts(&state),
            vec!["What's a good night routine?", PLACEHOLDER_TEXT]
        );
        assert_eq!(state.chat().pending_count(), 1);

        let resolution = state.apply_completion(
            request.id,
            Ok("Double **cleanse**, then moisturize.".to_string()),
        );
        assert!(matches!(resolution, Resolution::Resolved(_)));
        assert_eq!(
            turn_texts(&state),
            vec![
                "What's a good night routine?",
                "Double cleanse, then moisturize."
            ]
        );
        assert_eq!(roles(&state), vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(
            state.conversation().transcript().messages()[2],
            Message::new(Role::Assistant, "Double **cleanse**, then moisturize.")
        );
    }

    #[test]
    fn failed_exchange_shows_notice_and_keeps_transcript_clean() {
        let mut state = state_with(InMemoryStore::default());
        let request = state.submit_chat("hello").expect("non-empty input should send");
        let error = serde_json::from_str::<serde_json::Value>("{")
            .expect_err("fixture is invalid JSON");

        let resolution =
            state.apply_completion(request.id, Err(CompletionError::InvalidJson(error)));
        assert_eq!(resolution, Resolution::Failed(FAILURE_NOTICE));
        assert_eq!(turn_texts(&state), vec!["hello", FAILURE_NOTICE]);
        assert_eq!(roles(&state), vec![Role::System, Role::User]);
        assert_eq!(state.diagnostics().len(), 1);
    }

    #[test]
    fn blank_chat_input_is_ignored() {
        let mut state = state_with(InMemoryStore::default());
        assert!(state.submit_chat("   ").is_none());
        assert!(state.chat().turns().is_empty());
        assert!(state.diagnostics().is_empty());
    }

    #[test]
    fn overlapping_requests_resolve_into_their_own_turns() {
        let mut state = state_with(InMemoryStore::default());
        let first = state.submit_chat("first").expect("should send");
        let second = state.submit_chat("second").expect("should send");

        state.apply_completion(second.id, Ok("answer two".to_string()));
        state.apply_completion(first.id, Ok("answer one".to_string()));

        assert_eq!(
            turn_texts(&state),
            vec!["first", "answer one", "second", "answer two"]
        );
        assert_eq!(state.chat().pending_count(), 0);
    }

    #[test]
    fn unreadable_stored_selection_is_reported_in_diagnostics() {
        let state = state_with(InMemoryStore::with_json("{broken"));
        assert!(state.selection().is_empty());
        assert_eq!(state.diagnostics().len(), 1);
        assert!(state.diagnostics()[0].contains("stored selection unreadable"));
    }
}
