//! Canvas 2D drawing (WASM only)
//!
//! Mirrored webcam background, then the stick and ball on top of the nose.

use glam::Vec2;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement};

use super::layout::{PlayfieldLayout, cover_rect};
use crate::sim::FrameSnapshot;

/// `HAVE_CURRENT_DATA`
const VIDEO_READY: u16 = 2;

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    video: HtmlVideoElement,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement, video: HtmlVideoElement) -> Result<Self, JsValue> {
        use wasm_bindgen::JsCast;

        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx, video })
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    /// Match the canvas to the video's native resolution
    pub fn sync_to_video(&self) {
        let (w, h) = (self.video.video_width(), self.video.video_height());
        if w > 0 && h > 0 {
            self.canvas.set_width(w);
            self.canvas.set_height(h);
        }
    }

    pub fn draw(&self, snapshot: &FrameSnapshot) -> Result<(), JsValue> {
        let size = self.size();
        let ctx = &self.ctx;

        ctx.save();
        ctx.clear_rect(0.0, 0.0, size.x as f64, size.y as f64);

        // Selfie view
        ctx.translate(size.x as f64, 0.0)?;
        ctx.scale(-1.0, 1.0)?;

        if self.video.ready_state() >= VIDEO_READY {
            let video = Vec2::new(
                self.video.video_width() as f32,
                self.video.video_height() as f32,
            );
            let (x, y, w, h) = cover_rect(size, video);
            ctx.draw_image_with_html_video_element_and_dw_and_dh(
                &self.video,
                x as f64,
                y as f64,
                w as f64,
                h as f64,
            )?;
        } else {
            self.draw_fallback_background(size)?;
        }

        if let Some(layout) = PlayfieldLayout::from_snapshot(snapshot) {
            self.draw_playfield(&layout, snapshot.ball_skin.as_deref())?;
        }

        ctx.restore();
        Ok(())
    }

    fn draw_fallback_background(&self, size: Vec2) -> Result<(), JsValue> {
        let gradient = self
            .ctx
            .create_linear_gradient(0.0, 0.0, size.x as f64, size.y as f64);
        gradient.add_color_stop(0.0, "#1b1f2b")?;
        gradient.add_color_stop(1.0, "#090b12")?;
        self.ctx.set_fill_style_canvas_gradient(&gradient);
        self.ctx.fill_rect(0.0, 0.0, size.x as f64, size.y as f64);
        Ok(())
    }

    fn draw_playfield(&self, layout: &PlayfieldLayout, skin: Option<&str>) -> Result<(), JsValue> {
        let ctx = &self.ctx;

        // Stick: a round-capped line, inset so the caps end at the stick ends
        let (left, right) = layout.stick_ends();
        let inset = (right - left).normalize_or_zero()
            * (layout.thickness / 2.0).min(layout.length / 2.0);
        let (left, right) = (left + inset, right - inset);
        ctx.begin_path();
        ctx.move_to(left.x as f64, left.y as f64);
        ctx.line_to(right.x as f64, right.y as f64);
        ctx.set_line_width(layout.thickness as f64);
        ctx.set_line_cap("round");
        ctx.set_stroke_style_str("rgba(255, 255, 255, 0.92)");
        ctx.set_shadow_color("rgba(0, 0, 0, 0.35)");
        ctx.set_shadow_blur(10.0);
        ctx.stroke();
        ctx.set_shadow_blur(0.0);

        self.draw_ball(
            layout.ball_center(),
            layout.rotation as f64,
            layout.ball_radius as f64,
            skin,
        )
    }

    fn draw_ball(
        &self,
        center: Vec2,
        rotation: f64,
        r: f64,
        skin: Option<&str>,
    ) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.save();
        ctx.translate(center.x as f64, center.y as f64)?;
        ctx.rotate(rotation)?;

        let shade = ctx.create_radial_gradient(0.0, -r * 0.4, r * 0.3, 0.0, 0.0, r)?;
        shade.add_color_stop(0.0, "rgba(255,255,255,0.95)")?;
        shade.add_color_stop(0.3, "rgba(220,220,220,0.9)")?;
        shade.add_color_stop(1.0, "rgba(40,40,40,0.95)")?;

        ctx.begin_path();
        ctx.arc(0.0, 0.0, r, 0.0, std::f64::consts::TAU)?;
        ctx.set_fill_style_canvas_gradient(&shade);
        ctx.fill();

        if let Some(glyph) = skin {
            // Undo the selfie mirror so the glyph reads correctly
            ctx.scale(-1.0, 1.0)?;
            ctx.set_font(&format!("{}px system-ui", r * 1.4));
            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            ctx.set_fill_style_str("#ffffff");
            ctx.fill_text(glyph, 0.0, 0.0)?;
        }

        ctx.restore();
        Ok(())
    }
}
