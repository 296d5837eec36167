use crate::catalog::{CatalogFetcher, ProductId};
use crate::completion::CompletionClient;
use crate::conversation::{CompletionRequest, Resolution};
use crate::event::AppEvent;
use crate::state::AppState;
use crate::theme::Theme;
use eframe::egui::{self, Color32, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use tokio::runtime::Handle;

pub struct AdvisorApp {
    rx: Receiver<AppEvent>,
    tx: Sender<AppEvent>,
    runtime_handle: Handle,
    ctx: egui::Context,
    fetcher: CatalogFetcher,
    completions: Arc<dyn CompletionClient>,
    state: AppState,
    theme: Theme,
    input_buffer: String,
}

impl AdvisorApp {
    pub fn new(
        ctx: egui::Context,
        runtime_handle: Handle,
        fetcher: CatalogFetcher,
        completions: Arc<dyn CompletionClient>,
        state: AppState,
    ) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        let theme = Theme::default();
        theme.apply_visuals(&ctx);
        egui_extras::install_image_loaders(&ctx);
        Self {
            rx,
            tx,
            runtime_handle,
            ctx,
            fetcher,
            completions,
            state,
            theme,
            input_buffer: String::new(),
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.state.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::CatalogFetched { category, result } => {
                match self.state.apply_catalog(&category, result) {
                    Ok(count) => tracing::debug!(%category, count, "catalog rendered"),
                    Err(err) => {
                        tracing::error!(%category, "catalog load failed: {err}");
                        self.state
                            .log_diagnostic(format!("catalog load failed: {err}"));
                    }
                }
            }
            AppEvent::CompletionFinished { id, result } => {
                let resolution = self.state.apply_completion(id, result);
                let resolved = matches!(resolution, Resolution::Resolved(_));
                tracing::info!(%id, resolved, "completion applied");
            }
        }
        self.ctx.request_repaint();
    }

    fn request_catalog(&mut self, category: String) {
        self.state.choose_category(category.clone());

        let fetcher = self.fetcher.clone();
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        self.runtime_handle.spawn(async move {
            let result = fetcher.load().await;
            let _ = tx.send(AppEvent::CatalogFetched { category, result });
            ctx.request_repaint();
        });
    }

    fn dispatch(&self, request: CompletionRequest) {
        tracing::info!(id = %request.id, kind = ?request.kind, "dispatching completion");
        let client = Arc::clone(&self.completions);
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        self.runtime_handle.spawn(async move {
            let result = client.complete(&request.payload).await;
            let _ = tx.send(AppEvent::CompletionFinished {
                id: request.id,
                result,
            });
            ctx.request_repaint();
        });
    }

    fn submit_prompt(&mut self) {
        if let Some(request) = self.state.submit_chat(&self.input_buffer) {
            self.input_buffer.clear();
            self.dispatch(request);
        }
    }

    fn generate_routine(&mut self) {
        if let Some(request) = self.state.generate_routine() {
            self.dispatch(request);
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let mut chosen: Option<String> = None;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Routine Advisor");
                ui.separator();
                ui.label("Category");
                let current = self.state.category().unwrap_or("Choose a category");
                egui::ComboBox::from_id_salt("category_filter")
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for category in self.state.categories() {
                            let is_current = self.state.category() == Some(category.as_str());
                            if ui.selectable_label(is_current, category).clicked() {
                                chosen = Some(category.clone());
                            }
                        }
                    });
            });
        });

        if let Some(category) = chosen {
            self.request_catalog(category);
        }
    }

    fn render_left_panel(&mut self, ctx: &egui::Context) {
        let mut clicked: Option<ProductId> = None;
        egui::SidePanel::left("products_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Products");
                ui.separator();
                clicked = self.state.catalog_view().show(ui, &self.theme);
            });

        if let Some(id) = clicked {
            if let Err(err) = self.state.click_card(id) {
                tracing::warn!("card click ignored: {err}");
                self.state.log_diagnostic(format!("card click ignored: {err}"));
            }
        }
    }

    fn render_right_panel(&mut self, ctx: &egui::Context) {
        let mut removed: Option<ProductId> = None;
        let mut clear_all = false;
        let mut generate = false;
        egui::SidePanel::right("selection_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Selected Products");
                ui.separator();

                let rows = self.state.selection().panel_rows();
                if self.state.selection().is_empty() {
                    ui.label(RichText::new("No products selected").color(self.theme.text_muted));
                }
                ScrollArea::vertical()
                    .id_salt("selected_products")
                    .max_height((ui.available_height() - 120.0).max(80.0))
                    .show(ui, |ui| {
                        for (id, label) in &rows {
                            ui.horizontal(|ui| {
                                ui.label(label);
                                if ui.small_button("✖").on_hover_text("Remove").clicked() {
                                    removed = Some(*id);
                                }
                            });
                        }
                    });

                ui.separator();
                ui.horizontal(|ui| {
                    clear_all = ui.button("Clear All").clicked();
                    generate = ui
                        .button(RichText::new("Generate Routine").color(self.theme.accent_primary))
                        .clicked();
                });
            });

        if let Some(id) = removed {
            self.state.remove_selected(id);
        }
        if clear_all {
            self.state.clear_selection();
        }
        if generate {
            self.generate_routine();
        }
    }

    fn render_center_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Chat");
            ui.separator();

            let transcript_height = (ui.available_height() - 170.0).max(120.0);
            let theme = self.theme.clone();
            self.state.chat_mut().show(ui, &theme, transcript_height);

            ui.separator();
            egui::CollapsingHeader::new("Diagnostics")
                .default_open(false)
                .show(ui, |ui| {
                    ScrollArea::vertical()
                        .id_salt("diagnostics_log")
                        .max_height(90.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            ui.label(
                                RichText::new(format!(
                                    "{} transcript messages, {} awaiting reply",
                                    self.state.conversation().transcript().len(),
                                    self.state.conversation().in_flight()
                                ))
                                .color(self.theme.text_muted),
                            );
                            for entry in self.state.diagnostics() {
                                ui.label(RichText::new(entry).color(self.theme.danger));
                            }
                        });
                });

            ui.separator();
            let mut send_now = false;
            self.theme.composer_frame().show(ui, |ui| {
                ui.horizontal(|ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.input_buffer)
                            .desired_width(ui.available_width() - 80.0)
                            .hint_text("Ask about products or routines..."),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        send_now = true;
                    }
                    send_now |= ui
                        .add_enabled(
                            !self.input_buffer.trim().is_empty(),
                            egui::Button::new("Send"),
                        )
                        .clicked();
                });
            });

            if send_now {
                self.submit_prompt();
            }
        });
    }

    fn render_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.state.alert() else {
            return;
        };
        let mut dismissed = false;
        egui::Modal::new(egui::Id::new("blocking_alert")).show(ctx, |ui| {
            ui.set_min_width(260.0);
            ui.label(RichText::new(message).color(Color32::WHITE));
            ui.add_space(self.theme.spacing_12);
            dismissed = ui.button("OK").clicked();
        });
        if dismissed {
            self.state.dismiss_alert();
        }
    }
}

impl eframe::App for AdvisorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.render_top_bar(ctx);
        self.render_right_panel(ctx);
        self.render_left_panel(ctx);
        self.render_center_panel(ctx);
        self.render_alert(ctx);
    }
}
