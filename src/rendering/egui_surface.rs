//! [`DrawSurface`] backed by an egui painter.

use crate::core::geo::Point;
use crate::rendering::context::{Color, DrawSurface, Stroke};
use egui::{Align2, Color32, FontId, Painter, Pos2, Shape};

impl From<Color> for Color32 {
    fn from(color: Color) -> Self {
        Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
    }
}

impl From<Stroke> for egui::Stroke {
    fn from(stroke: Stroke) -> Self {
        egui::Stroke::new(stroke.width, Color32::from(stroke.color))
    }
}

/// Paints into the rectangle covered by `painter`, offset by its top-left
/// corner so canvas coordinates start at zero.
pub struct EguiSurface<'a> {
    painter: &'a Painter,
    origin: Pos2,
}

impl<'a> EguiSurface<'a> {
    pub fn new(painter: &'a Painter) -> Self {
        Self {
            painter,
            origin: painter.clip_rect().min,
        }
    }

    fn pos(&self, point: Point) -> Pos2 {
        Pos2::new(
            self.origin.x + point.x as f32,
            self.origin.y + point.y as f32,
        )
    }
}

impl DrawSurface for EguiSurface<'_> {
    fn clear(&mut self, color: Color) {
        self.painter
            .rect_filled(self.painter.clip_rect(), 0.0, Color32::from(color));
    }

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.painter
            .line_segment([self.pos(from), self.pos(to)], egui::Stroke::from(stroke));
    }

    fn polyline(&mut self, points: &[Point], stroke: Stroke) {
        let points = points.iter().map(|p| self.pos(*p)).collect();
        self.painter
            .add(Shape::line(points, egui::Stroke::from(stroke)));
    }

    fn filled_circle(&mut self, center: Point, radius: f64, fill: Color, stroke: Option<Stroke>) {
        let stroke = stroke.map(egui::Stroke::from).unwrap_or(egui::Stroke::NONE);
        self.painter
            .circle(self.pos(center), radius as f32, Color32::from(fill), stroke);
    }

    fn filled_polygon(&mut self, points: &[Point], fill: Color) {
        let points = points.iter().map(|p| self.pos(*p)).collect();
        self.painter.add(Shape::convex_polygon(
            points,
            Color32::from(fill),
            egui::Stroke::NONE,
        ));
    }

    fn text(&mut self, position: Point, text: &str, size: f32, color: Color) {
        self.painter.text(
            self.pos(position),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(size),
            Color32::from(color),
        );
    }
}
