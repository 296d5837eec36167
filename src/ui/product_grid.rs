use crate::catalog::{Product, ProductId};
use crate::selection::SelectionManager;
use crate::theme::Theme;
use eframe::egui::{self, ImageSource, RichText, ScrollArea, Sense};
use std::borrow::Cow;

const IMAGE_MAX_SIZE: egui::Vec2 = egui::vec2(96.0, 96.0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub product: Product,
    pub description_visible: bool,
    pub selected: bool,
}

impl ProductCard {
    /// The product's `image` reference, resolved by the installed image loaders.
    pub fn image_source(&self) -> Option<ImageSource<'_>> {
        let uri = self.product.image.trim();
        (!uri.is_empty()).then(|| ImageSource::Uri(Cow::Borrowed(uri)))
    }
}

/// Cards for the products of the current filter. Cards are addressed by
/// product id; products outside the filter have no card.
#[derive(Debug, Default)]
pub struct CatalogView {
    cards: Vec<ProductCard>,
}

impl CatalogView {
    pub fn cards(&self) -> &[ProductCard] {
        &self.cards
    }

    #[cfg(test)]
    pub fn card(&self, id: ProductId) -> Option<&ProductCard> {
        self.cards.iter().find(|card| card.product.id == id)
    }

    /// Replaces every card. Descriptions start hidden; markers follow the selection.
    pub fn render(&mut self, products: Vec<Product>, selection: &SelectionManager) {
        self.cards = products
            .into_iter()
            .map(|product| ProductCard {
                selected: selection.contains(product.id),
                product,
                description_visible: false,
            })
            .collect();
    }

    /// Flips the description of the clicked card. Returns false if no card has that id.
    pub fn click(&mut self, id: ProductId) -> bool {
        match self.card_mut(id) {
            Some(card) => {
                card.description_visible = !card.description_visible;
                true
            }
            None => false,
        }
    }

    pub fn set_marker(&mut self, id: ProductId, selected: bool) {
        if let Some(card) = self.card_mut(id) {
            card.selected = selected;
        }
    }

    pub fn clear_markers(&mut self) {
        for card in &mut self.cards {
            card.selected = false;
        }
    }

    fn card_mut(&mut self, id: ProductId) -> Option<&mut ProductCard> {
        self.cards.iter_mut().find(|card| card.product.id == id)
    }

    /// Draws the grid and reports the card clicked this frame, if any.
    pub fn show(&self, ui: &mut egui::Ui, theme: &Theme) -> Option<ProductId> {
        let mut clicked = None;
        if self.cards.is_empty() {
            ui.label(RichText::new("Choose a category to see products").color(theme.text_muted));
            return clicked;
        }

        ScrollArea::vertical()
            .id_salt("product_grid")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for card in &self.cards {
                    let frame = if card.selected {
                        theme.selected_card_frame()
                    } else {
                        theme.card_frame()
                    };
                    let response = frame
                        .show(ui, |ui| {
                            ui.set_width(ui.available_width());
                            if let Some(source) = card.image_source() {
                                ui.add(
                                    egui::Image::new(source)
                                        .max_size(IMAGE_MAX_SIZE)
                                        .maintain_aspect_ratio(true)
                                        .corner_radius(egui::CornerRadius::same(theme.radius_8)),
                                );
                            }
                            ui.label(RichText::new(&card.product.name).strong().size(15.0));
                            ui.label(
                                RichText::new(&card.product.brand).color(theme.accent_primary),
                            );
                            if card.description_visible {
                                ui.label(
                                    RichText::new(&card.product.description)
                                        .color(theme.text_muted),
                                );
                            }
                        })
                        .response
                        .interact(Sense::click());
                    if response.clicked() {
                        clicked = Some(card.product.id);
                    }
                    ui.add_space(theme.spacing_8);
                }
            });
        clicked
    }
}
