//! Tabular view of the filtered postal-code collection.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::map::{MapCanvas, MarkerSynchronizer};
use crate::models::PostalCode;
use crate::store::{SelectionState, SelectionStore};

/// Decimals shown for coordinates
pub const COORDINATE_PRECISION: usize = 4;

pub const EMPTY_STATE_MESSAGE: &str = "No postal codes found";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// Derived from the identity triple, stable across renders
    pub id: String,
    pub postal_code: String,
    pub place_name: String,
    pub region: String,
    pub latitude: String,
    pub longitude: String,
    pub is_active: bool,
    #[serde(skip)]
    pub record: PostalCode,
}

impl TableRow {
    fn new(record: &PostalCode, is_active: bool) -> Self {
        Self {
            id: record.identity_key(),
            postal_code: record.postal_code.clone(),
            place_name: record.place_name.clone(),
            region: record.region.clone(),
            latitude: format!("{:.*}", COORDINATE_PRECISION, record.latitude),
            longitude: format!("{:.*}", COORDINATE_PRECISION, record.longitude),
            is_active,
            record: record.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    pub expanded: bool,
    /// Set when there are no rows
    pub empty_message: Option<&'static str>,
}

impl TableView {
    pub fn active_row(&self) -> Option<&TableRow> {
        self.rows.iter().find(|row| row.is_active)
    }
}

/// Presentation state of the results table.
///
/// The table expands on its own whenever there are rows, unless the user
/// collapsed it. That choice lasts until the next country or city selection.
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    manual_collapsed: bool,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self, state: &SelectionState) -> TableView {
        let rows: Vec<TableRow> = state
            .filtered_postal_codes()
            .into_iter()
            .map(|record| TableRow::new(record, state.is_active(record)))
            .collect();

        let has_rows = !rows.is_empty();
        TableView {
            expanded: has_rows && !self.manual_collapsed,
            empty_message: (!has_rows).then_some(EMPTY_STATE_MESSAGE),
            rows,
        }
    }

    pub fn is_expanded(&self, state: &SelectionState) -> bool {
        !self.manual_collapsed && !state.filtered_postal_codes().is_empty()
    }

    /// User toggle
    pub fn set_expanded(&mut self, expanded: bool) {
        self.manual_collapsed = !expanded;
    }

    /// Forget the user's collapse when a new selection begins
    pub fn selection_started(&mut self) {
        self.manual_collapsed = false;
    }

    /// Make the clicked row's record active and recenter the map on it.
    pub fn row_clicked<C: Catalog, M: MapCanvas>(
        &self,
        record: &PostalCode,
        store: &SelectionStore<C>,
        map: &mut MarkerSynchronizer<M>,
    ) {
        store.set_active_record(Some(record.clone()));
        map.focus(record);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::MapSettings;
    use crate::map::{CanvasOp, HeadlessCanvas};
    use crate::testing::{record, MockCatalog};

    fn state() -> SelectionState {
        SelectionState {
            postal_codes: Arc::new(vec![
                record("10001", "New York", "New York", 40.7484, -73.99671),
                record("90001", "Los Angeles", "California", 33.97312, -118.2479),
            ]),
            collection_version: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_rows_format_coordinates() {
        let view = ResultsTable::new().view(&state());

        assert_eq!(view.rows.len(), 2);
        let row = &view.rows[0];
        assert_eq!(row.id, "10001-40.7484--73.99671");
        assert_eq!(row.latitude, "40.7484");
        assert_eq!(row.longitude, "-73.9967");
        assert_eq!(view.rows[1].latitude, "33.9731");
        assert!(view.expanded);
        assert!(view.empty_message.is_none());
        assert!(view.active_row().is_none());
    }

    #[test]
    fn test_active_row_by_identity() {
        let mut state = state();
        let mut copy = state.postal_codes[1].clone();
        copy.region = "CA".to_string();
        state.active_record = Some(copy);

        let view = ResultsTable::new().view(&state);

        assert_eq!(view.active_row().unwrap().postal_code, "90001");
        assert_eq!(view.rows.iter().filter(|r| r.is_active).count(), 1);
    }

    #[test]
    fn test_rows_follow_search_filter() {
        let mut state = state();
        state.search_query = "california".to_string();
        let view = ResultsTable::new().view(&state);
        assert_eq!(view.rows.len(), 1);

        state.search_query = "nowhere".to_string();
        let view = ResultsTable::new().view(&state);
        assert!(view.rows.is_empty());
        assert!(!view.expanded);
        assert_eq!(view.empty_message, Some(EMPTY_STATE_MESSAGE));
    }

    #[test]
    fn test_manual_collapse_until_next_selection() {
        let state = state();
        let mut table = ResultsTable::new();

        table.set_expanded(false);
        assert!(!table.view(&state).expanded);
        assert!(!table.is_expanded(&state));

        table.selection_started();
        assert!(table.view(&state).expanded);

        table.set_expanded(false);
        table.set_expanded(true);
        assert!(table.is_expanded(&state));
    }

    #[test]
    fn test_never_expanded_without_rows() {
        let table = ResultsTable::new();
        assert!(!table.is_expanded(&SelectionState::default()));
    }

    #[tokio::test]
    async fn test_row_click_activates_and_recenters() {
        let store = SelectionStore::new(Arc::new(MockCatalog::new()));
        let mut canvas = HeadlessCanvas::new(800, 600);
        canvas.open("map").unwrap();
        let mut map = MarkerSynchronizer::new(canvas, MapSettings::default());
        let clicked = state().postal_codes[0].clone();
        let revision = store.snapshot().revision;

        ResultsTable::new().row_clicked(&clicked, &store, &mut map);

        let state = store.snapshot();
        assert_eq!(state.revision, revision + 1);
        assert!(state.is_active(&clicked));
        assert!(matches!(
            map.canvas().ops(),
            [CanvasOp::FlyTo { center, .. }] if *center == clicked.position()
        ));
    }
}
