//! Segmentation session
//!
//! One explicit context owns all mutable state: the five layers, the edit
//! history, the mode slots, the lasso, the in-progress stroke, labels and
//! selection. Every mutation goes through the operations here, and each
//! asynchronous round trip is issued as a typed request value and applied
//! back through an `apply_*` entry point that re-validates the session
//! state first.

use kurbo::Point;
use uuid::Uuid;

use crate::draw::{DrawTool, StrokeTarget};
use crate::geojson;
use crate::history::{CommandKind, EditCommand, EditHistory};
use crate::input::{InputState, PointerButton};
use crate::label::{LabelPoint, LabelRequestState, LabelSet, LabelType};
use crate::lasso::{LassoEngine, LassoState, LASSO_CROP_SIZE};
use crate::layer::{Layer, LayerStore};
use crate::mode::{
    self, CursorStyle, DrawMode, LabelMode, LassoDrawMode, LassoMode, Mode, StateSlot,
};
use crate::notice::{Notice, NoticeKind, NoticeQueue};
use crate::planar;
use crate::polygon::{Polygon, PolygonSet};
use crate::radius::RadiusStore;
use crate::select::{Feature, FeatureSet, Selection};
use crate::service::{
    LabelPointDto, LabelsRequest, LabelsResponse, LassoStartRequest, LassoStartResponse,
    LassoStepRequest, LassoStepResponse, MeanColorRequest, MeanColorResponse, ServiceError,
    TargetId,
};

/// Click tolerance in screen pixels, for lasso closure/undo and label
/// removal.
pub const CLICK_TOLERANCE: f64 = 10.0;

/// The per-session editing context.
pub struct SegmentationSession {
    target_id: Option<TargetId>,

    layers: LayerStore,
    history: EditHistory<EditCommand>,

    mode: StateSlot<Mode>,
    draw_mode: StateSlot<DrawMode>,
    lasso_mode: StateSlot<LassoMode>,
    lasso_draw_mode: StateSlot<LassoDrawMode>,
    label_mode: StateSlot<LabelMode>,

    cursor: CursorStyle,
    input: InputState,
    radius: RadiusStore,

    lasso: LassoEngine,
    draw: DrawTool,
    labels: LabelSet,
    label_state: LabelRequestState,

    selection: Selection,
    features: FeatureSet,
    select_active: bool,

    pending_lasso_start: Option<LassoStartRequest>,
    pending_labels: Option<LabelsRequest>,
    pending_mean_color: Option<MeanColorRequest>,
    display_color: Option<[f64; 3]>,

    /// World units per screen pixel, for pixel-based click tolerances.
    resolution: f64,

    notices: NoticeQueue,
}

impl Default for SegmentationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentationSession {
    pub fn new() -> Self {
        Self {
            target_id: None,
            layers: LayerStore::new(),
            history: EditHistory::new(),
            mode: mode::mode_slot(),
            draw_mode: mode::draw_mode_slot(),
            lasso_mode: mode::lasso_mode_slot(),
            lasso_draw_mode: mode::lasso_draw_mode_slot(),
            label_mode: mode::label_mode_slot(),
            cursor: CursorStyle::Default,
            input: InputState::new(),
            radius: RadiusStore::new(),
            lasso: LassoEngine::new(),
            draw: DrawTool::new(),
            labels: LabelSet::new(),
            label_state: LabelRequestState::Off,
            selection: Selection::new(),
            features: FeatureSet::new(),
            select_active: true,
            pending_lasso_start: None,
            pending_labels: None,
            pending_mean_color: None,
            display_color: None,
            resolution: 1.0,
            notices: NoticeQueue::new(),
        }
    }

    // ------------------------------------------------------------------
    // Target lifecycle
    // ------------------------------------------------------------------

    /// Install a new annotation target with its externally supplied
    /// baseline polygon. Clears all prior state.
    pub fn select_target(&mut self, target_id: TargetId, base_import: PolygonSet) {
        self.reset_data();
        self.target_id = Some(target_id);
        self.layers.set(Layer::BaseImport, base_import);
        self.reset_ui();
    }

    /// Drop the active target and all state.
    pub fn clear_target(&mut self) {
        self.reset_data();
        self.target_id = None;
        self.reset_ui();
    }

    /// Clear all edits and layers but keep the active target selected.
    pub fn reset(&mut self) {
        let target = self.target_id.clone();
        self.reset_data();
        self.target_id = target;
        self.reset_ui();
    }

    fn reset_data(&mut self) {
        self.history.clear();
        self.layers.reset();
        self.labels.clear();
        self.label_state = LabelRequestState::Off;
        self.lasso.reset();
        self.draw.cancel();
        self.selection.clear();
        self.features.clear();
        self.pending_lasso_start = None;
        self.pending_labels = None;
        self.pending_mean_color = None;
        self.display_color = None;
    }

    fn reset_ui(&mut self) {
        let _ = self.set_mode(Mode::View);
        self.refresh_user_facing();
    }

    // ------------------------------------------------------------------
    // Mode transitions
    // ------------------------------------------------------------------

    /// Switch the primary mode. Cursor and visibility updates run before
    /// interaction activation so no frame observes a stale cursor or a
    /// hidden-but-active tool. Returns a lasso step request when a repeat
    /// entry into lasso mode re-issues one.
    pub fn set_mode(&mut self, new_mode: Mode) -> Option<LassoStepRequest> {
        let old_mode = self.mode.get();
        self.mode.set(new_mode);
        log::debug!(
            "mode {} -> {}",
            old_mode.display_name(),
            new_mode.display_name()
        );

        // Leaving lasso cancels any in-progress lasso before anything
        // else can observe it.
        if new_mode == Mode::Lasso {
            self.cursor = CursorStyle::Crosshair;
        } else {
            self.cancel_lasso();
            self.cursor = CursorStyle::Default;
        }
        self.update_cursor();

        let mut step_request = None;

        if matches!(new_mode, Mode::Add | Mode::Erase) {
            self.draw_mode.show();
            if new_mode == old_mode {
                self.cycle_draw_mode();
            } else {
                self.reset_draw_mode();
            }
        } else {
            self.finish_stroke();
            self.draw_mode.hide();
            if self.draw_mode.is(DrawMode::Select) {
                // Leaving a draw-select: reveal the composite again.
                self.select_active = false;
                self.refresh_user_facing();
            }
        }

        if new_mode == Mode::Lasso {
            self.lasso_mode.show();
            self.lasso_draw_mode.show();
            if new_mode == old_mode {
                if self.input.shift {
                    self.lasso_mode.cycle();
                } else {
                    self.lasso_draw_mode.cycle();
                    step_request = self.lasso_step_request(self.input.pointer);
                }
            } else {
                self.lasso_mode.reset();
                self.lasso_draw_mode.reset();
            }
        } else {
            self.lasso_mode.hide();
            self.lasso_draw_mode.hide();
        }

        if new_mode == Mode::Label {
            self.label_mode.show();
            if new_mode == old_mode {
                self.label_mode.cycle();
            } else {
                self.label_mode.reset();
            }
        } else {
            self.label_mode.hide();
        }

        if matches!(new_mode, Mode::Add | Mode::Erase) {
            self.radius.show();
        } else {
            self.radius.hide();
        }

        // Finish any stroke whose target does not match the new mode;
        // commit validation discards it.
        let stroke_mismatch = self
            .draw
            .active()
            .map(|stroke| stroke.target.mode() != new_mode)
            .unwrap_or(false);
        if stroke_mismatch {
            self.finish_stroke();
        }

        self.select_active = new_mode == Mode::View
            || (matches!(new_mode, Mode::Add | Mode::Erase) && self.draw_mode.is(DrawMode::Select));

        step_request
    }

    /// Switch the draw sub-mode.
    pub fn set_draw_mode(&mut self, new_mode: DrawMode) {
        let old_mode = self.draw_mode.get();
        self.draw_mode.set(new_mode);
        self.on_draw_mode_changed(new_mode, old_mode);
    }

    fn cycle_draw_mode(&mut self) {
        let old_mode = self.draw_mode.get();
        self.draw_mode.cycle();
        let new_mode = self.draw_mode.get();
        self.on_draw_mode_changed(new_mode, old_mode);
    }

    fn reset_draw_mode(&mut self) {
        let old_mode = self.draw_mode.get();
        self.draw_mode.reset();
        let new_mode = self.draw_mode.get();
        self.on_draw_mode_changed(new_mode, old_mode);
    }

    fn on_draw_mode_changed(&mut self, new_mode: DrawMode, old_mode: DrawMode) {
        let mode = self.mode.get();
        if !matches!(mode, Mode::Add | Mode::Erase) {
            return;
        }

        self.update_cursor();

        if new_mode == DrawMode::Select {
            // Select discards the in-progress stroke and swaps the
            // user-facing features to the raw accumulation layer.
            self.finish_stroke();
            self.select_active = true;
            let layer = if mode == Mode::Erase {
                Layer::Erase
            } else {
                Layer::Add
            };
            self.features = FeatureSet::from_set(self.layers.get(layer));
            self.selection.clear();
        } else if old_mode == DrawMode::Select {
            self.select_active = false;
            self.selection.clear();
            self.refresh_user_facing();
        }
    }

    fn update_cursor(&mut self) {
        self.cursor = match self.mode.get() {
            Mode::Lasso => {
                if self.lasso.state() == LassoState::Waiting {
                    CursorStyle::Progress
                } else {
                    CursorStyle::Crosshair
                }
            }
            Mode::Label => {
                if self.label_state == LabelRequestState::Waiting {
                    CursorStyle::Progress
                } else {
                    CursorStyle::Default
                }
            }
            Mode::Add | Mode::Erase if !self.draw_mode.is(DrawMode::Select) => CursorStyle::Hidden,
            _ => CursorStyle::Default,
        };
    }

    // ------------------------------------------------------------------
    // Input feed
    // ------------------------------------------------------------------

    pub fn set_modifiers(&mut self, shift: bool, alt: bool) {
        self.input.shift = shift;
        self.input.alt = alt;
    }

    /// World units per screen pixel, used by pixel-based tolerances.
    pub fn set_resolution(&mut self, resolution: f64) {
        if resolution > 0.0 {
            self.resolution = resolution;
        }
    }

    fn pixel_distance(&self, a: Point, b: Point) -> f64 {
        (b - a).hypot() / self.resolution
    }

    /// A button went down. In add/erase mode this starts a stroke.
    pub fn button_pressed(&mut self, coordinate: Point, button: PointerButton) {
        self.input.pointer = coordinate;
        self.input.button = Some(button);

        let Some(target) = StrokeTarget::from_mode(self.mode.get()) else {
            return;
        };
        if self.draw_mode.is(DrawMode::Select) || button == PointerButton::Middle {
            return;
        }
        self.draw.begin(target, button, coordinate);
    }

    /// A button came up. Commits the in-progress stroke, if any.
    pub fn button_released(&mut self, button: PointerButton) {
        if self.input.button == Some(button) {
            self.input.button = None;
        }
        if button != PointerButton::Middle {
            self.finish_stroke();
        }
    }

    /// The pointer moved. Extends an active stroke, drives the magnetic
    /// lasso step, and keeps the manual tentative edge tracking.
    pub fn pointer_moved(&mut self, coordinate: Point) -> Option<LassoStepRequest> {
        self.input.pointer = coordinate;

        if self.draw.is_active() {
            self.draw.append(coordinate);
        }

        self.update_cursor();

        if self.mode.is(Mode::Lasso) {
            if self.lasso.state() == LassoState::Active
                && self.lasso_draw_mode.is(LassoDrawMode::Magnetic)
            {
                return self.lasso_step_request(coordinate);
            }
            if self.lasso.state() != LassoState::Off
                && self.lasso_draw_mode.is(LassoDrawMode::Manual)
            {
                let last = self.lasso.last_point().map(|p| p.coordinate);
                if let Some(start) = last {
                    self.lasso.set_tentative_edge(vec![start, coordinate]);
                }
            }
        }

        None
    }

    /// A discrete click. Routed to the label or lasso tool by mode.
    pub fn click(&mut self, coordinate: Point) -> Option<LassoStartRequest> {
        self.input.pointer = coordinate;
        match self.mode.get() {
            Mode::Label => {
                self.label_click(coordinate);
                None
            }
            Mode::Lasso => self.lasso_click(coordinate),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Draw tool
    // ------------------------------------------------------------------

    /// Buffered preview of the in-progress stroke for display.
    pub fn stroke_preview(&self) -> Option<PolygonSet> {
        let stroke = self.draw.active()?;
        let radius = self.radius.get(stroke.target);
        Some(stroke.preview(radius, self.should_fill(stroke.button)))
    }

    fn should_fill(&self, button: PointerButton) -> bool {
        (self.draw_mode.is(DrawMode::Fill) && button != PointerButton::Secondary)
            || (self.draw_mode.is(DrawMode::NoFill) && button == PointerButton::Secondary)
    }

    /// Finish the in-progress stroke. Valid strokes commit; degenerate or
    /// mode-mismatched strokes are discarded with no history entry.
    fn finish_stroke(&mut self) {
        let Some(stroke) = self.draw.take() else {
            return;
        };

        if stroke.points.len() < 2 {
            log::debug!("discarding degenerate stroke");
            return;
        }
        if self.mode.get() != stroke.target.mode() || self.draw_mode.is(DrawMode::Select) {
            log::debug!("discarding stroke that no longer matches the active tool");
            return;
        }

        let radius = self.radius.get(stroke.target);
        let buffered = stroke.preview(radius, self.should_fill(stroke.button));
        if buffered.is_empty() {
            log::debug!("discarding stroke with empty buffer");
            return;
        }

        let erase = self.layers.get(Layer::Erase).clone();
        let add = self.layers.get(Layer::Add).clone();

        // A committed stroke always carves the opposing layer so Add and
        // Erase stay disjoint.
        match stroke.target {
            StrokeTarget::Erase => {
                self.history.save(EditCommand::Erase {
                    erase: erase.clone(),
                    add: add.clone(),
                });
                self.layers.set(Layer::Erase, erase.union(&buffered));
                self.layers.set(Layer::Add, add.difference(&buffered));
            }
            StrokeTarget::Add => {
                self.history.save(EditCommand::Add {
                    erase: erase.clone(),
                    add: add.clone(),
                });
                self.layers.set(Layer::Add, add.union(&buffered));
                self.layers.set(Layer::Erase, erase.difference(&buffered));
            }
        }

        self.refresh_user_facing();
    }

    // ------------------------------------------------------------------
    // Radius
    // ------------------------------------------------------------------

    pub fn set_radius(&mut self, radius: f64) {
        if let Some(target) = StrokeTarget::from_mode(self.mode.get()) {
            self.radius.set(target, radius);
        }
    }

    pub fn increase_radius(&mut self) {
        if let Some(target) = StrokeTarget::from_mode(self.mode.get()) {
            self.radius.increase(target);
        }
    }

    pub fn decrease_radius(&mut self) {
        if let Some(target) = StrokeTarget::from_mode(self.mode.get()) {
            self.radius.decrease(target);
        }
    }

    // ------------------------------------------------------------------
    // Lasso
    // ------------------------------------------------------------------

    fn lasso_click(&mut self, clicked: Point) -> Option<LassoStartRequest> {
        // Re-entrancy guard: one round trip at a time.
        if self.lasso.state() == LassoState::Waiting {
            return None;
        }
        let Some(target) = self.target_id.clone() else {
            self.notices
                .push(NoticeKind::Warning, "There is no selected target to edit.");
            return None;
        };

        // Keep the chain connected by snapping onto the tentative edge
        // end (which in magnetic mode is the server-snapped position).
        let mut coordinate = clicked;
        if let Some(snap) = self.lasso.tentative_edge_end() {
            coordinate = snap;
        }

        let mut removed = false;
        let last_coordinate = self.lasso.last_point().map(|p| p.coordinate);
        if let Some(last) = last_coordinate {
            if self.pixel_distance(last, coordinate) < CLICK_TOLERANCE {
                // Undo the last point.
                self.lasso.pop_point();
                if self.lasso.points().is_empty() {
                    self.cancel_lasso();
                    self.update_cursor();
                    return None;
                }
                // Every edge incident to the removed point goes with it,
                // committed and tentative alike.
                let committed = self.lasso.points().len().saturating_sub(1);
                self.lasso.truncate_edges(committed);
                removed = true;
                coordinate = self
                    .lasso
                    .last_point()
                    .map(|p| p.coordinate)
                    .unwrap_or(coordinate);
            }
        }

        if !removed && self.lasso.points().len() > 2 {
            let first_coordinate = self.lasso.first_point().map(|p| p.coordinate);
            if let Some(first) = first_coordinate {
                if self.pixel_distance(first, coordinate) < CLICK_TOLERANCE {
                    self.close_lasso();
                    self.update_cursor();
                    return None;
                }
            }
        }

        if !removed {
            self.lasso.push_point(coordinate);
            self.lasso.ensure_committed_edges();
        }

        self.lasso.set_state(LassoState::Waiting);
        self.update_cursor();

        let request = LassoStartRequest {
            coordinate: geojson::from_point(coordinate),
            crop_size: LASSO_CROP_SIZE,
            target_id: target,
        };
        self.pending_lasso_start = Some(request.clone());
        Some(request)
    }

    /// Outcome of the lasso-start round trip.
    pub fn apply_lasso_start(
        &mut self,
        result: Result<LassoStartResponse, ServiceError>,
    ) -> Option<LassoStepRequest> {
        let Some(pending) = self.pending_lasso_start.take() else {
            log::warn!("lasso-start response with no outstanding request");
            return None;
        };

        match result {
            Err(error) => {
                // Hard failure: roll back to Off and tell the user.
                log::error!("lasso-start failed: {error}");
                self.cancel_lasso();
                self.update_cursor();
                self.notices.push(
                    NoticeKind::Error,
                    "Error getting lasso data from the server. Please try again later.",
                );
                None
            }
            Ok(response) => {
                let valid = self.mode.is(Mode::Lasso)
                    && self.lasso.state() == LassoState::Waiting
                    && self.target_id.as_ref() == Some(&response.target_id);
                if !valid {
                    log::info!("discarding stale lasso-start response");
                    if self.lasso.state() == LassoState::Waiting {
                        self.cancel_lasso();
                    }
                    self.update_cursor();
                    return None;
                }

                self.lasso.set_state(LassoState::Active);
                self.lasso
                    .set_start_coordinate(geojson::to_point(pending.coordinate));
                self.update_cursor();

                // Prime the magnetic edge toward the current pointer.
                self.lasso_step_request(self.input.pointer)
            }
        }
    }

    fn lasso_step_request(&self, coordinate: Point) -> Option<LassoStepRequest> {
        if self.lasso.state() != LassoState::Active {
            return None;
        }
        let target = self.target_id.clone()?;
        Some(LassoStepRequest {
            coordinate: geojson::from_point(coordinate),
            target_id: target,
        })
    }

    /// Outcome of a lasso-step round trip.
    pub fn apply_lasso_step(&mut self, result: Result<LassoStepResponse, ServiceError>) {
        match result {
            Err(ServiceError::Timeout) => {
                // Soft failure: the user simply moves again.
                log::warn!("lasso-step timed out");
            }
            Err(error) => {
                log::error!("lasso-step failed: {error}");
                self.cancel_lasso();
                self.update_cursor();
                self.notices.push(
                    NoticeKind::Error,
                    "Error getting lasso data from the server. Please try again later.",
                );
            }
            Ok(response) => {
                if !self.mode.is(Mode::Lasso)
                    || self.target_id.as_ref() != Some(&response.target_id)
                {
                    log::info!("discarding stale lasso-step response");
                    self.cancel_lasso();
                    self.update_cursor();
                    return;
                }
                if self.lasso.state() != LassoState::Active
                    || !self.lasso_draw_mode.is(LassoDrawMode::Magnetic)
                {
                    return;
                }
                match geojson::to_points(&response.geometry) {
                    Some(coordinates) if coordinates.len() >= 2 => {
                        self.lasso.set_tentative_edge(coordinates);
                    }
                    _ => log::warn!("lasso-step returned unusable geometry"),
                }
            }
        }
    }

    /// Close the loop: polygonize the edge chain and commit per the lasso
    /// mode, with the secondary button inverting add/erase.
    fn close_lasso(&mut self) {
        let ring = self.lasso.closure_ring();
        let polygon = planar::polygonize(&ring);
        if polygon.is_empty() {
            log::warn!("lasso closure produced no area, discarding");
            self.cancel_lasso();
            return;
        }

        let should_erase = (self.lasso_mode.is(LassoMode::Erase) && !self.input.secondary_held())
            || (self.lasso_mode.is(LassoMode::Add) && self.input.secondary_held());

        if should_erase {
            let erase = self.layers.get(Layer::Erase).clone();
            let add = self.layers.get(Layer::Add).clone();
            self.history.save(EditCommand::Erase {
                erase: erase.clone(),
                add: add.clone(),
            });
            self.layers.set(Layer::Erase, erase.union(&polygon));
            self.layers.set(Layer::Add, add.difference(&polygon));
        } else {
            let base_partial = self.layers.get(Layer::BasePartial).clone();
            self.history.save(EditCommand::BasePartialSet {
                base_partial: base_partial.clone(),
            });
            self.layers
                .set(Layer::BasePartial, base_partial.union(&polygon));
        }

        self.refresh_user_facing();
        self.lasso.reset();
    }

    /// Abandon the lasso: clear points, edges and guides. Nothing was
    /// committed, so there is no history entry.
    pub fn cancel_lasso(&mut self) {
        self.lasso.reset();
        self.pending_lasso_start = None;
    }

    // ------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------

    fn label_click(&mut self, coordinate: Point) {
        // A click near an existing point removes it instead.
        let tolerance = CLICK_TOLERANCE * self.resolution;
        if let Some(removed) = self.labels.remove_near(coordinate, tolerance) {
            self.history.save(EditCommand::LabelRemove { point: removed });
            return;
        }

        let mut label_type = match self.label_mode.get() {
            LabelMode::Positive => LabelType::Positive,
            LabelMode::Negative => LabelType::Negative,
        };
        if self.input.secondary_held() {
            label_type = label_type.inverted();
        }

        let point = LabelPoint::new(coordinate, label_type);
        self.labels.push(point.clone());
        self.history.save(EditCommand::LabelAdd { point });
    }

    /// Submit the collected label points for full-region inference. A
    /// no-op while a submission is outstanding.
    pub fn submit_labels(&mut self) -> Option<LabelsRequest> {
        if self.label_state == LabelRequestState::Waiting {
            return None;
        }
        let Some(target) = self.target_id.clone() else {
            self.notices
                .push(NoticeKind::Warning, "There is no selected target to edit.");
            return None;
        };

        self.label_state = LabelRequestState::Waiting;
        self.update_cursor();

        let request = LabelsRequest {
            points: self
                .labels
                .points()
                .iter()
                .map(|point| LabelPointDto {
                    coordinate: geojson::from_point(point.coordinate),
                    label_type: point.label_type,
                })
                .collect(),
            target_id: target,
        };
        self.pending_labels = Some(request.clone());
        Some(request)
    }

    /// Outcome of the label submission. On success the full label result
    /// replaces the base-total layer wholesale.
    pub fn apply_labels(&mut self, result: Result<LabelsResponse, ServiceError>) {
        let pending = self.pending_labels.take();
        self.label_state = LabelRequestState::Off;

        if pending.is_none() {
            log::warn!("labels response with no outstanding request");
            self.update_cursor();
            return;
        }

        match result {
            Err(error) => {
                log::error!("labels submission failed: {error}");
                self.notices
                    .push(NoticeKind::Error, "Error sending labels to server.");
            }
            Ok(response) => {
                if self.target_id.as_ref() != Some(&response.target_id) {
                    log::info!("discarding stale labels response");
                    self.notices
                        .push(NoticeKind::Error, "Error sending labels to server.");
                } else {
                    match geojson::to_polygon_set(&response.geometry) {
                        Some(geometry) => {
                            let base_total = self.layers.get(Layer::BaseTotal).clone();
                            self.history.save(EditCommand::BaseTotalSet { base_total });
                            self.layers.set(Layer::BaseTotal, geometry);
                            self.refresh_user_facing();
                        }
                        None => {
                            log::warn!("labels response carried non-area geometry");
                            self.notices
                                .push(NoticeKind::Error, "Error sending labels to server.");
                        }
                    }
                }
            }
        }

        self.update_cursor();
    }

    // ------------------------------------------------------------------
    // Composite and mean color
    // ------------------------------------------------------------------

    /// The visible composite. Cached by layer content; a cache miss also
    /// queues the cosmetic mean-color request.
    pub fn composite(&mut self) -> PolygonSet {
        self.refresh_composite()
    }

    fn refresh_composite(&mut self) -> PolygonSet {
        let composite = self.layers.composite();
        if composite.recomputed {
            if let Some(target) = self.target_id.clone() {
                self.pending_mean_color = Some(MeanColorRequest {
                    geometry: geojson::multi_polygon(&composite.polygons),
                    target_id: target,
                });
            }
        }
        composite.polygons
    }

    /// Recompute the composite and re-materialize the user-facing feature
    /// set (unless a draw-select is showing a raw layer).
    fn refresh_user_facing(&mut self) {
        let composite = self.refresh_composite();
        let draw_select = matches!(self.mode.get(), Mode::Add | Mode::Erase)
            && self.draw_mode.is(DrawMode::Select);
        if !draw_select {
            self.features = FeatureSet::from_set(&composite);
            // Features were re-identified, so stale selections go.
            let ids: Vec<Uuid> = self.selection.ids().to_vec();
            for id in ids {
                if !self.features.contains(id) {
                    self.selection.remove(&id);
                }
            }
        }
    }

    /// The queued mean-color request, if a composite recompute produced
    /// one.
    pub fn take_mean_color_request(&mut self) -> Option<MeanColorRequest> {
        self.pending_mean_color.take()
    }

    /// Outcome of the mean-color round trip. Cosmetic: failures only
    /// clear the stored color.
    pub fn apply_mean_color(&mut self, result: Result<MeanColorResponse, ServiceError>) {
        match result {
            Err(error) => {
                log::error!("mean-color failed: {error}");
                self.display_color = None;
            }
            Ok(response) => {
                if self.target_id.as_ref() == Some(&response.target_id) {
                    self.display_color = Some(response.color);
                } else {
                    log::info!("discarding stale mean-color response");
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn select_feature(&mut self, id: Uuid) {
        if self.select_active && self.features.contains(id) {
            self.selection.add(id);
        }
    }

    pub fn deselect_feature(&mut self, id: Uuid) {
        self.selection.remove(&id);
    }

    pub fn toggle_feature(&mut self, id: Uuid) {
        if self.select_active && self.features.contains(id) {
            self.selection.toggle(id);
        }
    }

    /// Delete the selected features. In view mode this is a soft delete
    /// into the erase layer; in a draw-select it removes features from
    /// the corresponding accumulation layer directly. No-op when nothing
    /// is selected.
    pub fn delete_selected(&mut self) {
        if self.selection.is_empty() {
            return;
        }

        let in_view = self.mode.is(Mode::View);
        let in_draw_select = matches!(self.mode.get(), Mode::Add | Mode::Erase)
            && self.draw_mode.is(DrawMode::Select);
        if !in_view && !in_draw_select {
            log::error!("delete invoked outside view or draw-select mode");
            return;
        }

        self.history.save(EditCommand::SelectDelete {
            base_total: self.layers.get(Layer::BaseTotal).clone(),
            base_partial: self.layers.get(Layer::BasePartial).clone(),
            erase: self.layers.get(Layer::Erase).clone(),
            add: self.layers.get(Layer::Add).clone(),
        });

        if in_view {
            let selected: Vec<Polygon> = self
                .selection
                .ids()
                .iter()
                .filter_map(|id| self.features.get(*id))
                .map(|feature| feature.polygon.clone())
                .collect();
            let selected_set = PolygonSet::from_polygons(selected);

            let erase = self.layers.get(Layer::Erase).clone();
            let new_erase = erase.union(&selected_set);
            let add = self.layers.get(Layer::Add).clone();
            let new_add = add.difference(&new_erase);
            self.layers.set(Layer::Erase, new_erase);
            self.layers.set(Layer::Add, new_add);

            self.selection.clear();
            self.refresh_user_facing();
        } else {
            let ids: Vec<Uuid> = self.selection.ids().to_vec();
            let remaining = self.features.remove(&ids);
            let layer = if self.mode.is(Mode::Erase) {
                Layer::Erase
            } else {
                Layer::Add
            };
            self.layers.set(layer, remaining);

            self.selection.clear();
            // The raw layer stays on display; only the cached composite
            // needs refreshing.
            let _ = self.refresh_composite();
        }
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    /// Undo the most recent command. Returns the kind applied, or `None`
    /// when the undo stack is empty.
    pub fn undo(&mut self) -> Option<CommandKind> {
        let command = self.history.pop_undo()?;
        let kind = command.kind();
        if let Some(inverse) = self.apply_undo(command) {
            self.history.queue_redo(inverse);
        }
        Some(kind)
    }

    /// Redo the most recently undone command.
    pub fn redo(&mut self) -> Option<CommandKind> {
        let command = self.history.pop_redo()?;
        let kind = command.kind();
        if let Some(inverse) = self.apply_redo(command) {
            self.history.save_preserving_redo(inverse);
        }
        Some(kind)
    }

    fn apply_undo(&mut self, command: EditCommand) -> Option<EditCommand> {
        match command {
            EditCommand::LabelAdd { point } => {
                if !self.labels.remove_by_id(point.id) {
                    log::error!("undo: label point {} not found", point.id);
                    return None;
                }
                Some(EditCommand::LabelAdd { point })
            }
            EditCommand::LabelRemove { point } => {
                self.labels.push(point.clone());
                Some(EditCommand::LabelRemove { point })
            }
            other => Some(self.swap_layer_state(other)),
        }
    }

    fn apply_redo(&mut self, command: EditCommand) -> Option<EditCommand> {
        match command {
            EditCommand::LabelAdd { point } => {
                self.labels.push(point.clone());
                Some(EditCommand::LabelAdd { point })
            }
            EditCommand::LabelRemove { point } => {
                if !self.labels.remove_by_id(point.id) {
                    log::error!("redo: label point {} not found", point.id);
                    return None;
                }
                Some(EditCommand::LabelRemove { point })
            }
            other => Some(self.swap_layer_state(other)),
        }
    }

    /// Apply a layer-state command and return the inverse capturing the
    /// state it overwrote. Layer commands are symmetric under undo and
    /// redo.
    fn swap_layer_state(&mut self, command: EditCommand) -> EditCommand {
        let inverse = match command {
            EditCommand::Erase { erase, add } => {
                let previous = EditCommand::Erase {
                    erase: self.layers.get(Layer::Erase).clone(),
                    add: self.layers.get(Layer::Add).clone(),
                };
                self.layers.set(Layer::Erase, erase);
                self.layers.set(Layer::Add, add);
                previous
            }
            EditCommand::Add { erase, add } => {
                let previous = EditCommand::Add {
                    erase: self.layers.get(Layer::Erase).clone(),
                    add: self.layers.get(Layer::Add).clone(),
                };
                self.layers.set(Layer::Erase, erase);
                self.layers.set(Layer::Add, add);
                previous
            }
            EditCommand::BaseTotalSet { base_total } => {
                let previous = EditCommand::BaseTotalSet {
                    base_total: self.layers.get(Layer::BaseTotal).clone(),
                };
                self.layers.set(Layer::BaseTotal, base_total);
                previous
            }
            EditCommand::BasePartialSet { base_partial } => {
                let previous = EditCommand::BasePartialSet {
                    base_partial: self.layers.get(Layer::BasePartial).clone(),
                };
                self.layers.set(Layer::BasePartial, base_partial);
                previous
            }
            EditCommand::SelectDelete {
                base_total,
                base_partial,
                erase,
                add,
            } => {
                let previous = EditCommand::SelectDelete {
                    base_total: self.layers.get(Layer::BaseTotal).clone(),
                    base_partial: self.layers.get(Layer::BasePartial).clone(),
                    erase: self.layers.get(Layer::Erase).clone(),
                    add: self.layers.get(Layer::Add).clone(),
                };
                self.layers.set(Layer::BaseTotal, base_total);
                self.layers.set(Layer::BasePartial, base_partial);
                self.layers.set(Layer::Erase, erase);
                self.layers.set(Layer::Add, add);
                previous
            }
            EditCommand::LabelAdd { .. } | EditCommand::LabelRemove { .. } => {
                unreachable!("label commands are handled by the caller")
            }
        };
        self.refresh_user_facing();
        inverse
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn target_id(&self) -> Option<&TargetId> {
        self.target_id.as_ref()
    }

    pub fn mode(&self) -> Mode {
        self.mode.get()
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode.get()
    }

    pub fn lasso_mode(&self) -> LassoMode {
        self.lasso_mode.get()
    }

    pub fn lasso_draw_mode(&self) -> LassoDrawMode {
        self.lasso_draw_mode.get()
    }

    pub fn label_mode(&self) -> LabelMode {
        self.label_mode.get()
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    pub fn layer(&self, layer: Layer) -> &PolygonSet {
        self.layers.get(layer)
    }

    pub fn lasso(&self) -> &LassoEngine {
        &self.lasso
    }

    pub fn labels(&self) -> &[LabelPoint] {
        self.labels.points()
    }

    pub fn features(&self) -> &[Feature] {
        self.features.features()
    }

    pub fn selection(&self) -> &[Uuid] {
        self.selection.ids()
    }

    pub fn selection_active(&self) -> bool {
        self.select_active
    }

    pub fn stroke_active(&self) -> bool {
        self.draw.is_active()
    }

    pub fn radius(&self) -> &RadiusStore {
        &self.radius
    }

    pub fn display_color(&self) -> Option<[f64; 3]> {
        self.display_color
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Drain pending user-facing notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Ring;

    fn session_with_target() -> SegmentationSession {
        let mut session = SegmentationSession::new();
        session.select_target(TargetId::new("target-1"), PolygonSet::empty());
        session
    }

    fn square_set(x0: f64, y0: f64, x1: f64, y1: f64) -> PolygonSet {
        PolygonSet::from_ring(Ring::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]))
    }

    #[test]
    fn test_default_mode_is_view() {
        let session = SegmentationSession::new();
        assert_eq!(session.mode(), Mode::View);
        assert!(session.selection_active());
    }

    #[test]
    fn test_repeat_mode_entry_cycles_sub_mode() {
        let mut session = session_with_target();
        session.set_mode(Mode::Add);
        assert_eq!(session.draw_mode(), DrawMode::Fill);

        session.set_mode(Mode::Add);
        assert_eq!(session.draw_mode(), DrawMode::NoFill);

        session.set_mode(Mode::Add);
        assert_eq!(session.draw_mode(), DrawMode::Fill);

        // Entering from a different mode resets instead of cycling.
        session.set_mode(Mode::Add);
        assert_eq!(session.draw_mode(), DrawMode::NoFill);
        session.set_mode(Mode::View);
        session.set_mode(Mode::Add);
        assert_eq!(session.draw_mode(), DrawMode::Fill);
    }

    #[test]
    fn test_repeat_lasso_entry_with_shift_cycles_lasso_mode() {
        let mut session = session_with_target();
        session.set_mode(Mode::Lasso);
        assert_eq!(session.lasso_mode(), LassoMode::Add);
        assert_eq!(session.lasso_draw_mode(), LassoDrawMode::Magnetic);

        session.set_modifiers(true, false);
        session.set_mode(Mode::Lasso);
        assert_eq!(session.lasso_mode(), LassoMode::Erase);
        assert_eq!(session.lasso_draw_mode(), LassoDrawMode::Magnetic);

        session.set_modifiers(false, false);
        session.set_mode(Mode::Lasso);
        assert_eq!(session.lasso_draw_mode(), LassoDrawMode::Manual);
    }

    #[test]
    fn test_cursor_affordances() {
        let mut session = session_with_target();
        assert_eq!(session.cursor(), CursorStyle::Default);

        session.set_mode(Mode::Lasso);
        assert_eq!(session.cursor(), CursorStyle::Crosshair);

        session.set_mode(Mode::Add);
        assert_eq!(session.cursor(), CursorStyle::Hidden);

        session.set_mode(Mode::View);
        assert_eq!(session.cursor(), CursorStyle::Default);
    }

    #[test]
    fn test_stroke_commit_updates_add_layer() {
        let mut session = session_with_target();
        session.set_mode(Mode::Add);
        session.set_radius(10.0);

        session.button_pressed(Point::new(0.0, 0.0), PointerButton::Primary);
        session.pointer_moved(Point::new(20.0, 0.0));
        session.button_released(PointerButton::Primary);

        assert!(!session.layer(Layer::Add).is_empty());
        assert!(session.layer(Layer::Add).contains(Point::new(10.0, 0.0)));
        assert!(session.can_undo());
    }

    #[test]
    fn test_mode_switch_discards_uncommitted_stroke() {
        let mut session = session_with_target();
        session.set_mode(Mode::Add);

        session.button_pressed(Point::new(0.0, 0.0), PointerButton::Primary);
        session.pointer_moved(Point::new(20.0, 0.0));
        session.set_mode(Mode::View);

        assert!(session.layer(Layer::Add).is_empty());
        assert!(session.layer(Layer::Erase).is_empty());
        assert!(!session.can_undo());
        assert!(!session.stroke_active());
    }

    #[test]
    fn test_degenerate_stroke_is_discarded() {
        let mut session = session_with_target();
        session.set_mode(Mode::Add);

        session.button_pressed(Point::new(5.0, 5.0), PointerButton::Primary);
        session.button_released(PointerButton::Primary);

        assert!(session.layer(Layer::Add).is_empty());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_add_and_erase_stay_disjoint() {
        let mut session = session_with_target();
        session.set_mode(Mode::Add);
        session.set_radius(10.0);
        session.button_pressed(Point::new(0.0, 0.0), PointerButton::Primary);
        session.pointer_moved(Point::new(30.0, 0.0));
        session.button_released(PointerButton::Primary);

        session.set_mode(Mode::Erase);
        session.set_radius(5.0);
        session.button_pressed(Point::new(10.0, 0.0), PointerButton::Primary);
        session.pointer_moved(Point::new(20.0, 0.0));
        session.button_released(PointerButton::Primary);

        let overlap = session
            .layer(Layer::Add)
            .intersection(session.layer(Layer::Erase));
        assert!(overlap.area() < 1e-6);
    }

    #[test]
    fn test_label_click_add_and_proximity_remove() {
        let mut session = session_with_target();
        session.set_mode(Mode::Label);

        session.click(Point::new(10.0, 10.0));
        assert_eq!(session.labels().len(), 1);
        assert_eq!(session.labels()[0].label_type, LabelType::Positive);

        // Clicking near the existing point removes it.
        session.click(Point::new(11.0, 10.0));
        assert!(session.labels().is_empty());

        // Both actions are undoable.
        assert_eq!(session.undo(), Some(CommandKind::LabelRemove));
        assert_eq!(session.labels().len(), 1);
        assert_eq!(session.undo(), Some(CommandKind::LabelAdd));
        assert!(session.labels().is_empty());
    }

    #[test]
    fn test_secondary_button_inverts_label_type() {
        let mut session = session_with_target();
        session.set_mode(Mode::Label);

        session.input.button = Some(PointerButton::Secondary);
        session.click(Point::new(10.0, 10.0));
        assert_eq!(session.labels()[0].label_type, LabelType::Negative);
    }

    #[test]
    fn test_label_submission_guard_and_apply() {
        let mut session = session_with_target();
        session.set_mode(Mode::Label);
        session.click(Point::new(1.0, 1.0));

        let request = session.submit_labels().unwrap();
        assert_eq!(request.points.len(), 1);

        // Re-entrant submission is a no-op while waiting.
        assert!(session.submit_labels().is_none());

        let geometry = geojson::multi_polygon(&square_set(0.0, 0.0, 5.0, 5.0));
        session.apply_labels(Ok(LabelsResponse {
            geometry,
            target_id: TargetId::new("target-1"),
        }));

        assert!(!session.layer(Layer::BaseTotal).is_empty());
        assert!(session.composite().contains(Point::new(2.0, 2.0)));

        // Undo restores the empty base total.
        assert_eq!(session.undo(), Some(CommandKind::BaseTotalSet));
        assert!(session.layer(Layer::BaseTotal).is_empty());
    }

    #[test]
    fn test_stale_labels_response_is_discarded() {
        let mut session = session_with_target();
        session.set_mode(Mode::Label);
        session.click(Point::new(1.0, 1.0));
        let _ = session.submit_labels().unwrap();

        let geometry = geojson::multi_polygon(&square_set(0.0, 0.0, 5.0, 5.0));
        session.apply_labels(Ok(LabelsResponse {
            geometry,
            target_id: TargetId::new("other-target"),
        }));

        assert!(session.layer(Layer::BaseTotal).is_empty());
        assert!(!session.can_undo() || session.undo() != Some(CommandKind::BaseTotalSet));
    }

    #[test]
    fn test_lasso_click_flow_and_closure() {
        let mut session = session_with_target();
        session.set_mode(Mode::Lasso);
        // Manual edges keep the test independent of step round trips.
        session.set_mode(Mode::Lasso);
        assert_eq!(session.lasso_draw_mode(), LassoDrawMode::Manual);

        let clicks = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
        ];
        for click in clicks {
            let request = session.click(click).expect("lasso start request");
            session.apply_lasso_start(Ok(LassoStartResponse {
                target_id: TargetId::new("target-1"),
            }));
            assert_eq!(session.lasso().state(), LassoState::Active);
            let _ = request;
        }
        assert_eq!(session.lasso().points().len(), 3);

        // Closing click within tolerance of the first point.
        assert!(session.click(Point::new(0.0, 5.0)).is_none());
        assert_eq!(session.lasso().state(), LassoState::Off);

        let base_partial = session.layer(Layer::BasePartial);
        assert!(!base_partial.is_empty());
        assert!(base_partial.contains(Point::new(80.0, 40.0)));
        assert!((base_partial.area() - 5000.0).abs() < 10.0);
    }

    #[test]
    fn test_lasso_undo_point_click() {
        let mut session = session_with_target();
        session.set_mode(Mode::Lasso);

        for click in [Point::new(0.0, 0.0), Point::new(100.0, 0.0)] {
            session.click(click).expect("lasso start request");
            session.apply_lasso_start(Ok(LassoStartResponse {
                target_id: TargetId::new("target-1"),
            }));
        }
        assert_eq!(session.lasso().points().len(), 2);
        assert_eq!(session.lasso().edges().len(), 1);

        // Clicking on the last point removes it and re-issues a start.
        let request = session.click(Point::new(101.0, 1.0));
        assert!(request.is_some());
        assert_eq!(session.lasso().points().len(), 1);
        assert!(session.lasso().edges().is_empty());

        session.apply_lasso_start(Ok(LassoStartResponse {
            target_id: TargetId::new("target-1"),
        }));

        // Removing the only remaining point cancels the lasso.
        assert!(session.click(Point::new(0.0, 1.0)).is_none());
        assert_eq!(session.lasso().state(), LassoState::Off);
        assert!(session.lasso().points().is_empty());
    }

    #[test]
    fn test_lasso_waiting_ignores_reentrant_clicks() {
        let mut session = session_with_target();
        session.set_mode(Mode::Lasso);

        assert!(session.click(Point::new(0.0, 0.0)).is_some());
        assert_eq!(session.lasso().state(), LassoState::Waiting);
        assert!(session.click(Point::new(50.0, 50.0)).is_none());
        assert_eq!(session.lasso().points().len(), 1);
    }

    #[test]
    fn test_stale_lasso_start_is_discarded() {
        let mut session = session_with_target();
        session.set_mode(Mode::Lasso);
        assert!(session.click(Point::new(0.0, 0.0)).is_some());

        // Mode changes while the request is in flight.
        session.set_mode(Mode::View);
        let follow_up = session.apply_lasso_start(Ok(LassoStartResponse {
            target_id: TargetId::new("target-1"),
        }));
        assert!(follow_up.is_none());
        assert_eq!(session.lasso().state(), LassoState::Off);
        assert!(session.lasso().points().is_empty());
    }

    #[test]
    fn test_lasso_hard_failure_resets_and_notifies() {
        let mut session = session_with_target();
        session.set_mode(Mode::Lasso);
        assert!(session.click(Point::new(0.0, 0.0)).is_some());

        session.apply_lasso_start(Err(ServiceError::Failed("boom".into())));
        assert_eq!(session.lasso().state(), LassoState::Off);

        let notices = session.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Error);
    }

    #[test]
    fn test_lasso_step_timeout_is_soft() {
        let mut session = session_with_target();
        session.set_mode(Mode::Lasso);
        assert!(session.click(Point::new(0.0, 0.0)).is_some());
        session.apply_lasso_start(Ok(LassoStartResponse {
            target_id: TargetId::new("target-1"),
        }));
        assert_eq!(session.lasso().state(), LassoState::Active);

        session.apply_lasso_step(Err(ServiceError::Timeout));
        assert_eq!(session.lasso().state(), LassoState::Active);
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn test_magnetic_step_replaces_tentative_edge() {
        let mut session = session_with_target();
        session.set_mode(Mode::Lasso);
        assert!(session.click(Point::new(0.0, 0.0)).is_some());
        session.apply_lasso_start(Ok(LassoStartResponse {
            target_id: TargetId::new("target-1"),
        }));

        let snapped = geojson::line_string(&[
            Point::new(0.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(20.0, 5.0),
        ]);
        session.apply_lasso_step(Ok(LassoStepResponse {
            geometry: snapped,
            target_id: TargetId::new("target-1"),
        }));

        assert_eq!(session.lasso().edges().len(), 1);
        assert_eq!(session.lasso().edges()[0].coordinates.len(), 3);
    }

    #[test]
    fn test_mean_color_request_fires_once_per_recompute() {
        let mut session = session_with_target();
        session.set_mode(Mode::Add);
        session.button_pressed(Point::new(0.0, 0.0), PointerButton::Primary);
        session.pointer_moved(Point::new(30.0, 0.0));
        session.button_released(PointerButton::Primary);

        assert!(session.take_mean_color_request().is_some());
        // No second request without a layer mutation.
        let _ = session.composite();
        assert!(session.take_mean_color_request().is_none());

        session.apply_mean_color(Ok(MeanColorResponse {
            color: [120.0, 50.0, 50.0],
            target_id: TargetId::new("target-1"),
        }));
        assert_eq!(session.display_color(), Some([120.0, 50.0, 50.0]));

        session.apply_mean_color(Err(ServiceError::Failed("no raster".into())));
        assert_eq!(session.display_color(), None);
    }

    #[test]
    fn test_select_delete_in_view_mode_soft_deletes() {
        let mut session = session_with_target();
        session.set_mode(Mode::Add);
        session.set_radius(10.0);
        session.button_pressed(Point::new(0.0, 0.0), PointerButton::Primary);
        session.pointer_moved(Point::new(30.0, 0.0));
        session.button_released(PointerButton::Primary);

        session.set_mode(Mode::View);
        let feature_id = session.features()[0].id;
        session.select_feature(feature_id);
        session.delete_selected();

        assert!(session.composite().is_empty());
        assert!(!session.layer(Layer::Erase).is_empty());
        assert!(session.selection().is_empty());

        // Undo restores all four layers.
        assert_eq!(session.undo(), Some(CommandKind::SelectDelete));
        assert!(session.layer(Layer::Erase).is_empty());
        assert!(!session.composite().is_empty());
    }

    #[test]
    fn test_delete_with_empty_selection_is_noop() {
        let mut session = session_with_target();
        session.delete_selected();
        assert!(!session.can_undo());
    }

    #[test]
    fn test_reset_clears_edits_but_keeps_target() {
        let mut session = session_with_target();
        session.set_mode(Mode::Label);
        session.click(Point::new(1.0, 1.0));
        assert!(session.can_undo());

        session.reset();
        assert!(!session.can_undo());
        assert!(session.labels().is_empty());
        assert_eq!(session.mode(), Mode::View);
        assert_eq!(session.target_id(), Some(&TargetId::new("target-1")));
    }

    #[test]
    fn test_select_target_installs_base_import() {
        let mut session = SegmentationSession::new();
        session.select_target(TargetId::new("t"), square_set(0.0, 0.0, 10.0, 10.0));
        assert!(session.composite().contains(Point::new(5.0, 5.0)));
        assert_eq!(session.features().len(), 1);
    }
}
