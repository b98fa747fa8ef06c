//! [`DrawSurface`] backed by an HTML canvas 2D context.

use crate::core::geo::Point;
use crate::rendering::context::{Color, DrawSurface, Stroke};
use std::f64::consts::TAU;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

pub struct CanvasSurface {
    context: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasSurface {
    pub fn new(context: CanvasRenderingContext2d, width: f64, height: f64) -> Self {
        Self {
            context,
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn set_stroke(&self, stroke: Stroke) {
        self.context
            .set_stroke_style(&JsValue::from_str(&stroke.color.to_css()));
        self.context.set_line_width(f64::from(stroke.width));
    }

    fn set_fill(&self, color: Color) {
        self.context
            .set_fill_style(&JsValue::from_str(&color.to_css()));
    }

    fn trace(&self, points: &[Point]) {
        self.context.begin_path();
        if let Some((first, rest)) = points.split_first() {
            self.context.move_to(first.x, first.y);
            for point in rest {
                self.context.line_to(point.x, point.y);
            }
        }
    }
}

impl DrawSurface for CanvasSurface {
    fn clear(&mut self, color: Color) {
        self.set_fill(color);
        self.context.fill_rect(0.0, 0.0, self.width, self.height);
    }

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.set_stroke(stroke);
        self.trace(&[from, to]);
        self.context.stroke();
    }

    fn polyline(&mut self, points: &[Point], stroke: Stroke) {
        self.set_stroke(stroke);
        self.context.set_line_join("round");
        self.trace(points);
        self.context.stroke();
    }

    fn filled_circle(&mut self, center: Point, radius: f64, fill: Color, stroke: Option<Stroke>) {
        self.context.begin_path();
        if let Err(e) = self.context.arc(center.x, center.y, radius, 0.0, TAU) {
            log::warn!("canvas arc failed: {:?}", e);
            return;
        }
        self.set_fill(fill);
        self.context.fill();
        if let Some(stroke) = stroke {
            self.set_stroke(stroke);
            self.context.stroke();
        }
    }

    fn filled_polygon(&mut self, points: &[Point], fill: Color) {
        self.trace(points);
        self.context.close_path();
        self.set_fill(fill);
        self.context.fill();
    }

    fn text(&mut self, position: Point, text: &str, size: f32, color: Color) {
        self.set_fill(color);
        self.context.set_font(&format!("{}px sans-serif", size));
        self.context.set_text_align("center");
        self.context.set_text_baseline("middle");
        if let Err(e) = self.context.fill_text(text, position.x, position.y) {
            log::warn!("canvas fill_text failed: {:?}", e);
        }
    }
}
