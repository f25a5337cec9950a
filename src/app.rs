//! Application state and event handling.
//!
//! This module defines the top-level coordinator: it owns the loaded
//! responses, one view state per tab, and the shared hover/selection state.
//! Input events are translated into [`SelectionEvent`]s here and nowhere
//! else; renderers only read.

use crate::config::Config;
use crate::midi::{ApiResponse, LoadedResponse, ResponseData, ResponseId};
use crate::viz::geometry::{PianoRollGeometry, PixelRect};
use crate::viz::grid::Pager;
use crate::viz::highlight::hit_test;
use crate::viz::selection::{SelectionEvent, SelectionState};
use crate::viz::xref::{find_response, NoteRef, TokenRef};
use ratatui::layout::Rect;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

/// Smallest and largest horizontal zoom, in canvas pixels per column.
const MIN_PIXELS_PER_COLUMN: f64 = 0.5;
const MAX_PIXELS_PER_COLUMN: f64 = 400.0;

/// Rows kept visible above the highest note when a tab opens.
const INITIAL_HEADROOM_ROWS: i32 = 2;

/// Layout regions for mouse hit testing.
/// Stores the screen coordinates of each UI panel.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegions {
    /// The file tab bar at the top.
    pub tab_bar: Rect,
    /// The token grid panel.
    pub token_grid: Rect,
    /// The hovered token details below the grid.
    pub token_info: Rect,
    /// The piano roll panel.
    pub piano_roll: Rect,
    /// The piano roll note area, excluding key labels (set during rendering).
    pub roll_grid: Rect,
    /// The music info panel.
    pub music_info: Rect,
    /// The key hint and status line.
    pub footer: Rect,
    /// Screen cell of each drawn token block with its flat index (set during rendering).
    pub token_cells: Vec<(Rect, usize)>,
    /// Screen span of each tab title with its tab index (set during rendering).
    pub tab_titles: Vec<(Rect, usize)>,
}

impl LayoutRegions {
    /// Checks if a point is within a rectangle.
    fn contains(rect: Rect, x: u16, y: u16) -> bool {
        x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
    }

    /// Returns the flat index of the token block under the pointer.
    pub fn token_at(&self, x: u16, y: u16) -> Option<usize> {
        self.token_cells
            .iter()
            .find(|(rect, _)| Self::contains(*rect, x, y))
            .map(|(_, index)| *index)
    }

    /// Returns the tab whose title is under the pointer.
    pub fn tab_at(&self, x: u16, y: u16) -> Option<usize> {
        self.tab_titles
            .iter()
            .find(|(rect, _)| Self::contains(*rect, x, y))
            .map(|(_, index)| *index)
    }

    /// Checks if a point is within the piano roll note area.
    pub fn is_in_roll_grid(&self, x: u16, y: u16) -> bool {
        Self::contains(self.roll_grid, x, y)
    }

    /// Checks if a point is within the token grid panel.
    pub fn is_in_token_grid(&self, x: u16, y: u16) -> bool {
        Self::contains(self.token_grid, x, y)
    }
}

/// Maps terminal cells of the piano roll onto the canvas.
///
/// Each terminal row shows one pitch row of the canvas; each column covers
/// `pixels_per_column` canvas pixels of time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollViewport {
    /// Canvas pixels scrolled past time zero.
    pub scroll_px: f64,
    /// Canvas row shown at the top, counted from the highest pitch.
    pub scroll_row: usize,
    pub pixels_per_column: f64,
}

impl RollViewport {
    /// Opens on the highest notes of the response with a little headroom.
    pub fn new(geometry: &PianoRollGeometry, pixels_per_column: f64) -> Self {
        let top = geometry.high_octave - geometry.highest_pitch - INITIAL_HEADROOM_ROWS;
        Self {
            scroll_px: 0.0,
            scroll_row: top.max(0) as usize,
            pixels_per_column,
        }
    }

    /// Returns the canvas x span `[left, right]` of a terminal column.
    pub fn column_span(&self, geometry: &PianoRollGeometry, col: u16) -> (f64, f64) {
        let left =
            geometry.metrics.keyboard_width + self.scroll_px + col as f64 * self.pixels_per_column;
        (left, left + self.pixels_per_column)
    }

    /// Returns the canvas points tested for a pointer on a terminal cell.
    ///
    /// The cell center comes first, then the left and right edges so notes
    /// narrower than one column can still be picked.
    pub fn hit_points(&self, geometry: &PianoRollGeometry, col: u16, row: u16) -> [(f64, f64); 3] {
        let row_height = geometry.metrics.note_row_height;
        let y = (self.scroll_row + row as usize) as f64 * row_height + row_height / 2.0;
        let (left, right) = self.column_span(geometry, col);
        [((left + right) / 2.0, y), (left, y), (right, y)]
    }

    /// Returns the terminal row and column range covered by a canvas rectangle.
    ///
    /// Every rectangle on screen covers at least one column. Returns None when
    /// the rectangle lies outside a `cols` x `rows` window.
    pub fn rect_cells(
        &self,
        geometry: &PianoRollGeometry,
        rect: &PixelRect,
        cols: u16,
        rows: u16,
    ) -> Option<(u16, std::ops::Range<u16>)> {
        let row_abs = (rect.y / geometry.metrics.note_row_height).round() as i64;
        let row = row_abs - self.scroll_row as i64;
        if row < 0 || row >= rows as i64 {
            return None;
        }

        let origin = geometry.metrics.keyboard_width + self.scroll_px;
        let start = ((rect.x - origin) / self.pixels_per_column).floor() as i64;
        let end = (((rect.right() - origin) / self.pixels_per_column).ceil() as i64).max(start + 1);
        if end <= 0 || start >= cols as i64 {
            return None;
        }

        let start = start.max(0) as u16;
        let end = end.min(cols as i64) as u16;
        Some((row as u16, start..end))
    }

    /// Scrolls by whole columns and rows, staying on the canvas.
    pub fn scroll_by(&mut self, geometry: &PianoRollGeometry, cols: i32, rows: i32) {
        let max_px = (geometry.canvas_width - geometry.metrics.keyboard_width).max(0.0);
        self.scroll_px =
            (self.scroll_px + cols as f64 * self.pixels_per_column).clamp(0.0, max_px);

        let max_row = geometry.num_rows().saturating_sub(1) as i64;
        self.scroll_row = (self.scroll_row as i64 + rows as i64).clamp(0, max_row) as usize;
    }

    /// Multiplies the horizontal zoom by `factor`.
    pub fn zoom(&mut self, factor: f64) {
        self.pixels_per_column = (self.pixels_per_column * factor)
            .clamp(MIN_PIXELS_PER_COLUMN, MAX_PIXELS_PER_COLUMN);
    }
}

/// View state of one loaded response's tab.
#[derive(Debug, Clone)]
pub struct TabView {
    pub pager: Pager,
    /// Track shown in the piano roll.
    pub track: usize,
    /// Show type abbreviations in token blocks instead of blank swatches.
    pub show_types: bool,
    /// First grid row shown.
    pub grid_scroll: usize,
    /// Computed once from every track of the response.
    pub geometry: PianoRollGeometry,
    pub viewport: RollViewport,
}

/// One file tab.
#[derive(Debug, Clone)]
pub enum Tab {
    Loaded { id: ResponseId, view: TabView },
    /// A file that could not be loaded, shown as its error text.
    Failed { title: String, error: String },
}

/// Borrowed contents of the active tab.
pub enum ActiveTab<'a> {
    Loaded {
        response: &'a LoadedResponse,
        view: &'a TabView,
    },
    Failed {
        title: &'a str,
        error: &'a str,
    },
}

/// Main application state.
pub struct App {
    pub config: Config,
    /// Loaded responses, in the order they were added.
    responses: Vec<LoadedResponse>,
    tabs: Vec<Tab>,
    /// Index of the tab currently shown.
    pub active_tab: usize,
    /// Hover and selection shared by the token grid and the piano roll.
    pub selection: SelectionState,
    /// Layout regions for mouse hit testing (updated each frame).
    pub layout: LayoutRegions,
    /// Status message to display.
    pub status_message: Option<(String, Instant)>,
    /// Panel failures already logged, so a broken panel does not log every frame.
    reported_faults: HashSet<String>,
}

impl App {
    /// Creates an application with no files open.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            responses: Vec::new(),
            tabs: Vec::new(),
            active_tab: 0,
            selection: SelectionState::new(),
            layout: LayoutRegions::default(),
            status_message: None,
            reported_faults: HashSet::new(),
        }
    }

    /// Returns every loaded response.
    pub fn responses(&self) -> &[LoadedResponse] {
        &self.responses
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Returns the display title of a tab.
    pub fn tab_title(&self, tab: &Tab) -> String {
        match tab {
            Tab::Loaded { id, .. } => find_response(&self.responses, *id)
                .map(|r| r.name.clone())
                .unwrap_or_default(),
            Tab::Failed { title, .. } => title.clone(),
        }
    }

    /// Returns the contents of the active tab, if any tab is open.
    pub fn active(&self) -> Option<ActiveTab<'_>> {
        match self.tabs.get(self.active_tab)? {
            Tab::Loaded { id, view } => Some(ActiveTab::Loaded {
                response: find_response(&self.responses, *id)?,
                view,
            }),
            Tab::Failed { title, error } => Some(ActiveTab::Failed { title, error }),
        }
    }

    /// Returns the active loaded response and its view state.
    pub fn active_loaded(&self) -> Option<(&LoadedResponse, &TabView)> {
        match self.active()? {
            ActiveTab::Loaded { response, view } => Some((response, view)),
            ActiveTab::Failed { .. } => None,
        }
    }

    fn active_view_mut(&mut self) -> Option<&mut TabView> {
        match self.tabs.get_mut(self.active_tab)? {
            Tab::Loaded { view, .. } => Some(view),
            Tab::Failed { .. } => None,
        }
    }

    /// Token count of the active response.
    fn active_token_count(&self) -> usize {
        self.active_loaded()
            .map(|(response, _)| response.tokens().len())
            .unwrap_or(0)
    }

    /// Updates the layout regions based on current terminal size.
    /// Called by the UI module during rendering.
    pub fn update_layout(&mut self, layout: LayoutRegions) {
        self.layout = layout;
    }

    /// Sets a status message to display temporarily.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Clears expired status messages.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > Duration::from_secs(3) {
                self.status_message = None;
            }
        }
    }

    /// Logs a panel that failed to render, once per file and panel.
    ///
    /// # Returns
    ///
    /// true if this failure had not been reported before
    pub fn report_render_fault(&mut self, panel: &str, error: &dyn fmt::Display) -> bool {
        let file = self
            .tabs
            .get(self.active_tab)
            .map(|tab| self.tab_title(tab))
            .unwrap_or_default();
        let first = self
            .reported_faults
            .insert(format!("{}\0{}\0{}", file, panel, error));
        if first {
            tracing::warn!("Failed to render {} of {}: {}", panel, file, error);
        }
        first
    }

    // ==================== Files ====================

    /// Loads a response file and opens it as a new tab.
    ///
    /// Unreadable files and error responses still get a tab, showing the
    /// error text.
    ///
    /// # Returns
    ///
    /// true if the file loaded as a displayable response
    pub fn open_file(&mut self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let result = ApiResponse::load_from_file(path)
            .map_err(|e| e.to_string())
            .and_then(ApiResponse::into_data);

        if let Err(ref error) = result {
            tracing::warn!("Failed to load {}: {}", path.display(), error);
        }
        self.add_response(name, result)
    }

    /// Adds a processed file as a new tab and makes it active.
    ///
    /// Hover and selection are reset whenever the set of files changes.
    ///
    /// # Returns
    ///
    /// true if the response carried data
    pub fn add_response(
        &mut self,
        name: impl Into<String>,
        result: Result<ResponseData, String>,
    ) -> bool {
        let name = name.into();
        let loaded = match result {
            Ok(data) => {
                self.add_loaded(LoadedResponse::new(name, data));
                true
            }
            Err(error) => {
                self.tabs.push(Tab::Failed { title: name, error });
                self.active_tab = self.tabs.len() - 1;
                false
            }
        };
        self.selection.apply(SelectionEvent::Clear, &self.responses);
        loaded
    }

    fn add_loaded(&mut self, response: LoadedResponse) {
        let geometry = PianoRollGeometry::compute(response.tracks(), self.config.roll);
        let view = TabView {
            pager: Pager::new(self.config.page_size),
            track: 0,
            show_types: false,
            grid_scroll: 0,
            geometry,
            viewport: RollViewport::new(&geometry, self.config.pixels_per_column),
        };
        tracing::info!(
            "Opened {} ({} tokens, {} tracks)",
            response.name,
            response.tokens().len(),
            response.tracks().len()
        );

        self.tabs.push(Tab::Loaded {
            id: response.id(),
            view,
        });
        self.responses.push(response);
        self.active_tab = self.tabs.len() - 1;
    }

    /// Closes the active tab and discards its response.
    pub fn close_active_tab(&mut self) {
        if self.active_tab >= self.tabs.len() {
            return;
        }

        if let Tab::Loaded { id, .. } = self.tabs.remove(self.active_tab) {
            self.responses.retain(|r| r.id() != id);
        }
        self.selection.apply(SelectionEvent::Clear, &self.responses);
        self.active_tab = self.active_tab.min(self.tabs.len().saturating_sub(1));
    }

    pub fn next_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active_tab = (self.active_tab + 1) % self.tabs.len();
        }
    }

    pub fn prev_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active_tab = (self.active_tab + self.tabs.len() - 1) % self.tabs.len();
        }
    }

    // ==================== Token grid ====================

    pub fn next_page(&mut self) {
        let total = self.active_token_count();
        if let Some(view) = self.active_view_mut() {
            if view.pager.enabled && view.pager.next(total) {
                view.grid_scroll = 0;
            }
        }
    }

    pub fn prev_page(&mut self) {
        if let Some(view) = self.active_view_mut() {
            if view.pager.enabled && view.pager.prev() {
                view.grid_scroll = 0;
            }
        }
    }

    /// Toggles pagination. Only offered when there is more than one page.
    pub fn toggle_pagination(&mut self) {
        let total = self.active_token_count();
        let Some(view) = self.active_view_mut() else {
            return;
        };
        if !view.pager.can_paginate(total) {
            self.set_status("Only one page of tokens");
            return;
        }

        view.pager.toggle();
        view.grid_scroll = 0;
        let message = if view.pager.enabled {
            "Pagination on"
        } else {
            "Pagination off"
        };
        self.set_status(message);
    }

    pub fn toggle_token_types(&mut self) {
        if let Some(view) = self.active_view_mut() {
            view.show_types = !view.show_types;
        }
    }

    /// Scrolls the token grid by whole rows, stopping at the last row.
    pub fn scroll_grid(&mut self, rows: i32) {
        let total = self.active_token_count();
        let (page_size, chunk_size) = (self.config.page_size.max(1), self.config.chunk_size.max(1));
        let Some(view) = self.active_view_mut() else {
            return;
        };

        let shown = if view.pager.enabled {
            total
                .saturating_sub(view.pager.page * page_size)
                .min(page_size)
        } else {
            total
        };
        let last_row = shown.div_ceil(chunk_size).saturating_sub(1) as i64;
        view.grid_scroll = (view.grid_scroll as i64 + rows as i64).clamp(0, last_row) as usize;
    }

    // ==================== Piano roll ====================

    pub fn next_track(&mut self) {
        let tracks = self
            .active_loaded()
            .map(|(r, _)| r.tracks().len())
            .unwrap_or(0);
        if let Some(view) = self.active_view_mut() {
            if view.track + 1 < tracks {
                view.track += 1;
            }
        }
    }

    pub fn prev_track(&mut self) {
        if let Some(view) = self.active_view_mut() {
            view.track = view.track.saturating_sub(1);
        }
    }

    /// Scrolls the piano roll by whole columns and rows.
    pub fn scroll_roll(&mut self, cols: i32, rows: i32) {
        if let Some(view) = self.active_view_mut() {
            let geometry = view.geometry;
            view.viewport.scroll_by(&geometry, cols, rows);
        }
    }

    /// Returns the piano roll to time zero.
    pub fn scroll_roll_home(&mut self) {
        if let Some(view) = self.active_view_mut() {
            view.viewport.scroll_px = 0.0;
        }
    }

    /// Zooms the piano roll horizontally.
    pub fn zoom(&mut self, factor: f64) {
        let Some(view) = self.active_view_mut() else {
            return;
        };
        view.viewport.zoom(factor);
        let message = format!("Zoom: {:.1} px/col", view.viewport.pixels_per_column);
        self.set_status(message);
    }

    // ==================== Selection ====================

    /// Drops every hover and selection.
    pub fn clear_selection(&mut self) {
        self.selection.apply(SelectionEvent::Clear, &self.responses);
    }

    /// Resolves a pointer on the piano roll to a note of the active track.
    ///
    /// Returns None when the pointer is outside the roll, Some(None) when it
    /// is over empty canvas.
    fn roll_hit(&self, x: u16, y: u16) -> Option<Option<NoteRef>> {
        if !self.layout.is_in_roll_grid(x, y) {
            return None;
        }
        let (response, view) = self.active_loaded()?;
        let col = x - self.layout.roll_grid.x;
        let row = y - self.layout.roll_grid.y;
        let notes = response.track_notes(view.track);

        let hit = view
            .viewport
            .hit_points(&view.geometry, col, row)
            .into_iter()
            .find_map(|(px, py)| hit_test(&view.geometry, notes, px, py));
        Some(hit.map(|index| NoteRef::new(response.id(), view.track, index)))
    }

    /// Resolves a pointer on the token grid to a token of the active response.
    fn token_hit(&self, x: u16, y: u16) -> Option<TokenRef> {
        let index = self.layout.token_at(x, y)?;
        let (response, _) = self.active_loaded()?;
        Some(TokenRef::new(response.id(), index))
    }

    /// Handles pointer motion: hovering a token or a note.
    pub fn handle_mouse_move(&mut self, x: u16, y: u16) {
        let event = if let Some(token) = self.token_hit(x, y) {
            SelectionEvent::HoverToken(Some(token))
        } else if let Some(note) = self.roll_hit(x, y) {
            SelectionEvent::HoverNote(note)
        } else {
            SelectionEvent::HoverToken(None)
        };
        self.selection.apply(event, &self.responses);
    }

    /// Handles a mouse click event.
    ///
    /// # Returns
    ///
    /// true if the click was handled
    pub fn handle_mouse_click(&mut self, x: u16, y: u16) -> bool {
        if let Some(tab) = self.layout.tab_at(x, y) {
            self.active_tab = tab;
            return true;
        }

        let event = if let Some(token) = self.token_hit(x, y) {
            SelectionEvent::SelectToken(Some(token))
        } else if let Some(note) = self.roll_hit(x, y) {
            SelectionEvent::SelectNote(note)
        } else {
            return false;
        };
        self.selection.apply(event, &self.responses);
        true
    }

    /// Handles mouse wheel events.
    ///
    /// # Arguments
    ///
    /// * `x` - Screen X coordinate
    /// * `y` - Screen Y coordinate
    /// * `delta_x` - Horizontal scroll amount (positive = right)
    /// * `delta_y` - Vertical scroll amount (positive = up)
    /// * `ctrl_held` - Whether Ctrl/Cmd is held (for zoom)
    pub fn handle_mouse_scroll(
        &mut self,
        x: u16,
        y: u16,
        delta_x: i16,
        delta_y: i16,
        ctrl_held: bool,
    ) {
        if self.layout.is_in_roll_grid(x, y) {
            if ctrl_held {
                if delta_y > 0 {
                    self.zoom(0.8);
                } else if delta_y < 0 {
                    self.zoom(1.25);
                }
            } else {
                self.scroll_roll(delta_x as i32 * 4, -(delta_y as i32));
            }
        } else if self.layout.is_in_token_grid(x, y) {
            self.scroll_grid(-(delta_y as i32));
        }
    }
}
