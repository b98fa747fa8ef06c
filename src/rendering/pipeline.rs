use crate::core::{
    geo::LatLng,
    viewport::{CanvasSize, Viewport},
};
use crate::layers::marker::Marker;

/// Why a frame was repainted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedrawReason {
    Initial,
    ViewportChanged,
    MarkersChanged,
    PositionChanged,
    Resized,
    Forced,
}

/// Redraw bookkeeping: the single place that decides whether a frame needs
/// painting.
///
/// The host either marks reasons explicitly or lets [`RenderPipeline::observe`]
/// diff the inputs of the next frame against the last painted one.
#[derive(Debug, Clone, Default)]
pub struct RenderPipeline {
    pending: Vec<RedrawReason>,
    initial_render_done: bool,
    last_view: Option<(LatLng, u8)>,
    last_canvas: Option<CanvasSize>,
    last_markers: Vec<Marker>,
    last_position: Option<LatLng>,
    frame_count: u64,
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, reason: RedrawReason) {
        if !self.pending.contains(&reason) {
            self.pending.push(reason);
        }
    }

    pub fn mark_viewport_changed(&mut self) {
        self.mark(RedrawReason::ViewportChanged);
    }

    pub fn mark_resized(&mut self) {
        self.mark(RedrawReason::Resized);
    }

    pub fn force(&mut self) {
        self.mark(RedrawReason::Forced);
    }

    /// Compares this frame's inputs with the last observed ones
    pub fn observe(
        &mut self,
        viewport: &Viewport,
        canvas: CanvasSize,
        markers: &[Marker],
        animated_position: Option<LatLng>,
    ) {
        if !self.initial_render_done {
            self.mark(RedrawReason::Initial);
        }

        let view = (viewport.center, viewport.zoom());
        if self.last_view.is_some_and(|last| last != view) {
            self.mark(RedrawReason::ViewportChanged);
        }
        self.last_view = Some(view);

        if self.last_canvas.is_some_and(|last| last != canvas) {
            self.mark(RedrawReason::Resized);
        }
        self.last_canvas = Some(canvas);

        if self.last_markers.as_slice() != markers {
            if self.initial_render_done {
                self.mark(RedrawReason::MarkersChanged);
            }
            self.last_markers = markers.to_vec();
        }

        if self.last_position != animated_position {
            if self.initial_render_done {
                self.mark(RedrawReason::PositionChanged);
            }
            self.last_position = animated_position;
        }
    }

    pub fn needs_redraw(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drains the pending reasons. A non-empty result means "paint now".
    pub fn take_reasons(&mut self) -> Vec<RedrawReason> {
        let reasons = std::mem::take(&mut self.pending);
        if !reasons.is_empty() {
            self.initial_render_done = true;
            self.frame_count += 1;
            log::trace!("redraw #{}: {:?}", self.frame_count, reasons);
        }
        reasons
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
