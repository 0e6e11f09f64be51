//! Wires the selection store to the map and the results table.
//!
//! The explorer is the only place user intents enter: choosing a country or a
//! city, clicking a marker or a row, collapsing the table and going back.
//! Both surfaces only ever write through the store and render from its
//! snapshots, so a click on one of them shows up on the other after a single
//! state update.

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::map::{CanvasError, MapCanvas, MarkerId, MarkerSynchronizer, SyncReport};
use crate::models::PostalCode;
use crate::store::{LoadOutcome, SelectionError, SelectionStore};
use crate::table::{ResultsTable, TableView};

/// Entry of a country or city picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Group digits by thousands, `40000` -> `"40,000"`
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub struct Explorer<C, M> {
    store: SelectionStore<C>,
    map: MarkerSynchronizer<M>,
    table: ResultsTable,
}

impl<C: Catalog, M: MapCanvas> Explorer<C, M> {
    pub fn new(catalog: C, canvas: M, config: &Config) -> Self {
        Self {
            store: SelectionStore::with_page_size(catalog, config.catalog.page_size),
            map: MarkerSynchronizer::new(canvas, config.map.clone()),
            table: ResultsTable::new(),
        }
    }

    pub fn store(&self) -> &SelectionStore<C> {
        &self.store
    }

    pub fn map(&self) -> &MarkerSynchronizer<M> {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MarkerSynchronizer<M> {
        &mut self.map
    }

    /// Create the map inside `container` and draw whatever is already loaded.
    pub fn open_map(&mut self, container: &str) -> Result<SyncReport, CanvasError> {
        self.map.canvas_mut().open(container)?;
        Ok(self.map.sync(&self.store.snapshot()))
    }

    pub async fn load_countries(&self) -> LoadOutcome {
        self.store.load_countries().await
    }

    pub async fn retry(&self) -> LoadOutcome {
        info!("Retrying country list");
        self.store.retry().await
    }

    pub async fn choose_country(&mut self, code: &str) -> Result<LoadOutcome, SelectionError> {
        let country = self
            .store
            .snapshot()
            .countries
            .iter()
            .find(|c| c.code == code)
            .cloned();

        let Some(country) = country else {
            warn!("Country not found: {}", code);
            return Err(SelectionError::UnknownCountry(code.to_string()));
        };

        self.table.selection_started();
        Ok(self.store.select_country(country).await)
    }

    pub async fn choose_city(&mut self, name: &str) -> Result<LoadOutcome, SelectionError> {
        let city = self
            .store
            .snapshot()
            .cities
            .iter()
            .find(|c| c.name == name)
            .cloned();

        let Some(city) = city else {
            warn!("City not found: {}", name);
            return Err(SelectionError::UnknownCity(name.to_string()));
        };

        self.table.selection_started();
        self.store.select_city(city).await
    }

    pub fn search(&self, query: &str) {
        self.store.update_search_query(query);
    }

    pub fn marker_clicked(&mut self, id: MarkerId) -> Option<PostalCode> {
        self.map.marker_clicked(id, &self.store)
    }

    pub fn row_clicked(&mut self, record: &PostalCode) {
        self.table.row_clicked(record, &self.store, &mut self.map);
    }

    pub fn table_toggled(&mut self, expanded: bool) {
        self.table.set_expanded(expanded);
    }

    /// Back to the country list with the map at its initial view.
    pub fn go_back(&mut self) {
        self.store.clear_selection();
        self.table.selection_started();
        self.map.reset_to_initial_view();
        info!("Selection cleared, back to map overview");
    }

    pub fn country_options(&self) -> Vec<SelectOption> {
        self.store
            .snapshot()
            .countries
            .iter()
            .map(|c| SelectOption {
                value: c.code.clone(),
                label: format!("{} ({} codes)", c.name, format_count(c.count)),
            })
            .collect()
    }

    pub fn city_options(&self) -> Vec<SelectOption> {
        self.store
            .snapshot()
            .cities
            .iter()
            .map(|c| SelectOption {
                value: c.name.clone(),
                label: format!("{} ({} codes)", c.name, format_count(c.postal_count)),
            })
            .collect()
    }

    /// Bring the map up to date and return the table to display.
    pub fn render(&mut self) -> TableView {
        let state = self.store.snapshot();
        self.map.sync(&state);
        self.table.view(&state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::map::{CanvasOp, HeadlessCanvas};
    use crate::testing::{Call, MockCatalog};

    type TestExplorer = Explorer<Arc<MockCatalog>, HeadlessCanvas>;

    fn catalog() -> Arc<MockCatalog> {
        Arc::new(
            MockCatalog::new()
                .with_country("FR", 40000)
                .with_country("US", 41000)
                .with_city("FR", "Paris", 1200)
                .with_city("FR", "Lyon", 250)
                .with_city("US", "Portland", 80),
        )
    }

    async fn explorer(catalog: &Arc<MockCatalog>) -> TestExplorer {
        let mut explorer = Explorer::new(
            catalog.clone(),
            HeadlessCanvas::new(1024, 768),
            &Config::default(),
        );
        explorer.open_map("map").unwrap();
        assert_eq!(explorer.load_countries().await, LoadOutcome::Applied);
        explorer
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(40000), "40,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[tokio::test]
    async fn test_paris_scenario() {
        let catalog = catalog();
        let mut explorer = explorer(&catalog).await;

        explorer.choose_country("FR").await.unwrap();
        let outcome = explorer.choose_city("Paris").await.unwrap();
        let view = explorer.render();

        assert_eq!(outcome, LoadOutcome::Applied);
        assert_eq!(catalog.page_calls("Paris").len(), 12);
        assert_eq!(view.rows.len(), 1200);
        assert_eq!(view.rows[0].postal_code, MockCatalog::postal_code_at("Paris", 0));
        assert_eq!(view.rows[1199].postal_code, MockCatalog::postal_code_at("Paris", 1199));
        assert!(view.expanded);
        assert_eq!(explorer.map().marker_count(), 1200);
        assert!(explorer
            .map()
            .canvas()
            .ops()
            .iter()
            .any(|op| matches!(op, CanvasOp::FitBounds { .. })));
    }

    #[tokio::test]
    async fn test_marker_click_highlights_row() {
        let catalog = catalog();
        let mut explorer = explorer(&catalog).await;
        explorer.choose_country("US").await.unwrap();
        explorer.choose_city("Portland").await.unwrap();
        explorer.render();
        let revision = explorer.store().snapshot().revision;

        let clicked = explorer.marker_clicked(MarkerId(7)).unwrap();
        let view = explorer.render();

        assert_eq!(explorer.store().snapshot().revision, revision + 1);
        assert_eq!(view.active_row().unwrap().id, clicked.identity_key());
        assert_eq!(explorer.map().canvas().selected_markers(), vec![MarkerId(7)]);
    }

    #[tokio::test]
    async fn test_row_click_highlights_marker() {
        let catalog = catalog();
        let mut explorer = explorer(&catalog).await;
        explorer.choose_country("US").await.unwrap();
        explorer.choose_city("Portland").await.unwrap();
        let view = explorer.render();
        let revision = explorer.store().snapshot().revision;

        explorer.row_clicked(&view.rows[3].record);
        let view = explorer.render();

        assert_eq!(explorer.store().snapshot().revision, revision + 1);
        assert_eq!(explorer.map().canvas().selected_markers(), vec![MarkerId(3)]);
        assert_eq!(view.active_row().unwrap().id, view.rows[3].id);
    }

    #[tokio::test]
    async fn test_new_selection_expands_collapsed_table() {
        let catalog = catalog();
        let mut explorer = explorer(&catalog).await;
        explorer.choose_country("FR").await.unwrap();
        explorer.choose_city("Lyon").await.unwrap();

        explorer.table_toggled(false);
        assert!(!explorer.render().expanded);

        explorer.choose_city("Paris").await.unwrap();
        assert!(explorer.render().expanded);
    }

    #[tokio::test]
    async fn test_go_back() {
        let catalog = catalog();
        let mut explorer = explorer(&catalog).await;
        explorer.choose_country("FR").await.unwrap();
        explorer.choose_city("Lyon").await.unwrap();
        explorer.render();

        explorer.go_back();
        let view = explorer.render();

        let state = explorer.store().snapshot();
        assert!(!state.has_selected_country());
        assert_eq!(state.countries.len(), 2);
        assert!(view.rows.is_empty());
        assert_eq!(explorer.map().marker_count(), 0);
        let settings = Config::default().map;
        assert_eq!(
            explorer.map().canvas().center(),
            Some(settings.initial_center())
        );
    }

    #[tokio::test]
    async fn test_option_labels() {
        let catalog = catalog();
        let mut explorer = explorer(&catalog).await;
        explorer.choose_country("FR").await.unwrap();

        let countries = explorer.country_options();
        assert_eq!(countries[0].value, "FR");
        assert_eq!(countries[0].label, "France (40,000 codes)");
        assert_eq!(countries[1].label, "United States (41,000 codes)");

        let cities = explorer.city_options();
        assert_eq!(cities[0].value, "Paris");
        assert_eq!(cities[0].label, "Paris (1,200 codes)");
    }

    #[tokio::test]
    async fn test_unknown_keys_are_ignored() {
        let catalog = catalog();
        let mut explorer = explorer(&catalog).await;
        let revision = explorer.store().snapshot().revision;

        assert_eq!(
            explorer.choose_country("ZZ").await,
            Err(SelectionError::UnknownCountry("ZZ".to_string()))
        );
        explorer.choose_country("FR").await.unwrap();
        assert!(matches!(
            explorer.choose_city("Atlantis").await,
            Err(SelectionError::UnknownCity(_))
        ));
        assert!(explorer.store().snapshot().revision > revision);
        assert!(!catalog.calls().contains(&Call::cities("ZZ")));
    }

    #[tokio::test]
    async fn test_retry_after_country_failure() {
        let catalog = catalog();
        catalog.fail(Call::Facets);
        let mut explorer = Explorer::new(
            catalog.clone(),
            HeadlessCanvas::new(800, 600),
            &Config::default(),
        );

        assert_eq!(explorer.load_countries().await, LoadOutcome::Failed);
        assert!(explorer.store().snapshot().last_error.is_some());
        assert!(explorer.country_options().is_empty());

        catalog.recover(&Call::Facets);
        assert_eq!(explorer.retry().await, LoadOutcome::Applied);
        assert_eq!(explorer.country_options().len(), 2);
        assert!(explorer.render().rows.is_empty());
    }
}
