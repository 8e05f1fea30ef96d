//! Scroll and pointer driven parallax.
//!
//! Every calculator follows the same shape: derive a normalized progress in
//! [-1, 1] from element geometry, map it to a [`Transform`], and only do so
//! while the element is near the viewport and motion is allowed.
//!
//! The `seamloop` window has no scroll position, so it only uses
//! [`PointerTilt`]. [`ImageParallax`], [`SectionParallax`], [`VisibilityGate`]
//! and [`ParallaxDriver`] are for hosts that embed the loop in a scrolling
//! page: feed the driver intersection changes and call
//! [`ParallaxDriver::frame`] once per displayed frame.

pub mod visibility;

pub use visibility::VisibilityGate;

/// Element box relative to the viewport's top-left, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ElementBounds {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.left + self.width * 0.5, self.top + self.height * 0.5)
    }
}

/// Visual transform produced by a calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
    pub rotate_x_deg: f32,
    pub rotate_y_deg: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        rotate_x_deg: 0.0,
        rotate_y_deg: 0.0,
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// `(viewport centre − element centre) / viewport height`, clamped to [-1, 1].
///
/// Positive while the element sits above the viewport centre.
pub fn scroll_progress(bounds: &ElementBounds, viewport_height: f32) -> f32 {
    if viewport_height <= 0.0 {
        return 0.0;
    }
    let (_, center_y) = bounds.center();
    ((viewport_height * 0.5 - center_y) / viewport_height).clamp(-1.0, 1.0)
}

/// Maps scroll progress to a transform.
pub trait ProgressMapper {
    fn map(&self, progress: f32) -> Transform;
}

/// Foreground image drifting against the scroll direction.
///
/// The image is held at a constant overscale so the drift never exposes its edges.
#[derive(Debug, Clone, Copy)]
pub struct ImageParallax {
    pub travel_px: f32,
    pub scale: f32,
}

impl Default for ImageParallax {
    fn default() -> Self {
        Self {
            travel_px: 60.0,
            scale: 1.15,
        }
    }
}

impl ProgressMapper for ImageParallax {
    fn map(&self, progress: f32) -> Transform {
        Transform {
            translate_y: progress * self.travel_px,
            scale: self.scale,
            ..Transform::IDENTITY
        }
    }
}

/// Section background: drifts like [`ImageParallax`] and zooms in slightly
/// as the section reaches the viewport centre.
#[derive(Debug, Clone, Copy)]
pub struct SectionParallax {
    pub travel_px: f32,
    pub zoom: f32,
}

impl Default for SectionParallax {
    fn default() -> Self {
        Self {
            travel_px: 120.0,
            zoom: 0.08,
        }
    }
}

impl ProgressMapper for SectionParallax {
    fn map(&self, progress: f32) -> Transform {
        Transform {
            translate_y: progress * self.travel_px,
            scale: 1.0 + self.zoom * (1.0 - progress.abs()),
            ..Transform::IDENTITY
        }
    }
}

/// Tilt toward the pointer, with a small matching shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerTilt {
    pub max_degrees: f32,
    pub shift_px: f32,
}

impl Default for PointerTilt {
    fn default() -> Self {
        Self {
            max_degrees: 4.0,
            shift_px: 12.0,
        }
    }
}

impl PointerTilt {
    /// Pointer offset from the element centre, normalized to [-1, 1] per axis.
    pub fn normalized(pointer: (f32, f32), bounds: &ElementBounds) -> (f32, f32) {
        let (cx, cy) = bounds.center();
        let half_w = (bounds.width * 0.5).max(f32::EPSILON);
        let half_h = (bounds.height * 0.5).max(f32::EPSILON);
        (
            ((pointer.0 - cx) / half_w).clamp(-1.0, 1.0),
            ((pointer.1 - cy) / half_h).clamp(-1.0, 1.0),
        )
    }

    pub fn transform(&self, pointer: (f32, f32), bounds: &ElementBounds) -> Transform {
        let (nx, ny) = Self::normalized(pointer, bounds);
        Transform {
            translate_x: nx * self.shift_px,
            translate_y: ny * self.shift_px,
            scale: 1.0,
            rotate_x_deg: -ny * self.max_degrees,
            rotate_y_deg: nx * self.max_degrees,
        }
    }
}

/// Drives one scroll calculator for one element.
///
/// Recomputes only while the element intersects the viewport (with the
/// gate's margin). Under reduced motion the transform stays at identity.
pub struct ParallaxDriver<M: ProgressMapper> {
    mapper: M,
    gate: VisibilityGate,
    reduced_motion: bool,
    visible: bool,
    transform: Transform,
}

impl<M: ProgressMapper> ParallaxDriver<M> {
    pub fn new(mapper: M, gate: VisibilityGate, reduced_motion: bool) -> Self {
        Self {
            mapper,
            gate,
            reduced_motion,
            visible: false,
            transform: Transform::IDENTITY,
        }
    }

    /// Feed an intersection change. Returns whether per-frame work should run.
    pub fn on_intersection(&mut self, bounds: &ElementBounds, viewport_height: f32) -> bool {
        self.visible = self.gate.is_intersecting(bounds, viewport_height);
        self.is_active()
    }

    pub fn is_active(&self) -> bool {
        self.visible && !self.reduced_motion
    }

    /// Per-frame update. Off-screen or reduced-motion frames return the held transform.
    pub fn frame(&mut self, bounds: &ElementBounds, viewport_height: f32) -> Transform {
        if self.is_active() {
            self.transform = self.mapper.map(scroll_progress(bounds, viewport_height));
        }
        self.transform
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VH: f32 = 800.0;

    fn centered_at(y: f32) -> ElementBounds {
        ElementBounds::new(0.0, y - 100.0, 400.0, 200.0)
    }

    #[test]
    fn progress_zero_at_viewport_center() {
        assert!(scroll_progress(&centered_at(400.0), VH).abs() < 1e-6);
    }

    #[test]
    fn progress_sign_and_clamp() {
        // Above centre is positive
        assert!((scroll_progress(&centered_at(0.0), VH) - 0.5).abs() < 1e-6);
        assert!((scroll_progress(&centered_at(800.0), VH) + 0.5).abs() < 1e-6);
        assert!((scroll_progress(&centered_at(-5000.0), VH) - 1.0).abs() < 1e-6);
        assert!((scroll_progress(&centered_at(5000.0), VH) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn progress_degenerate_viewport() {
        assert!(scroll_progress(&centered_at(100.0), 0.0).abs() < 1e-6);
    }

    #[test]
    fn image_parallax_is_linear() {
        let m = ImageParallax {
            travel_px: 50.0,
            scale: 1.2,
        };
        let t = m.map(-0.5);
        assert!((t.translate_y + 25.0).abs() < 1e-6);
        assert!((t.scale - 1.2).abs() < 1e-6);
        assert!((m.map(1.0).translate_y - 50.0).abs() < 1e-6);
    }

    #[test]
    fn section_parallax_zooms_toward_center() {
        let m = SectionParallax {
            travel_px: 100.0,
            zoom: 0.1,
        };
        assert!((m.map(0.0).scale - 1.1).abs() < 1e-6);
        assert!((m.map(1.0).scale - 1.0).abs() < 1e-6);
        assert!((m.map(-1.0).scale - 1.0).abs() < 1e-6);
        assert!((m.map(0.5).translate_y - 50.0).abs() < 1e-6);
    }

    #[test]
    fn pointer_tilt_follows_pointer() {
        let tilt = PointerTilt {
            max_degrees: 10.0,
            shift_px: 20.0,
        };
        let bounds = ElementBounds::new(0.0, 0.0, 200.0, 100.0);

        let center = tilt.transform((100.0, 50.0), &bounds);
        assert_eq!(center, Transform::IDENTITY);

        let corner = tilt.transform((200.0, 0.0), &bounds);
        assert!((corner.rotate_y_deg - 10.0).abs() < 1e-6);
        assert!((corner.rotate_x_deg - 10.0).abs() < 1e-6);
        assert!((corner.translate_x - 20.0).abs() < 1e-6);
        assert!((corner.translate_y + 20.0).abs() < 1e-6);

        // Outside the element clamps to the edge
        let far = tilt.transform((-900.0, 50.0), &bounds);
        assert!((far.rotate_y_deg + 10.0).abs() < 1e-6);
    }

    #[test]
    fn driver_follows_a_page_scroll() {
        // Section 400px tall starting 1200px down the page, scrolled top to bottom
        let mut d = ParallaxDriver::new(SectionParallax::default(), VisibilityGate::default(), false);
        let mut last_translate = f32::NEG_INFINITY;
        let mut active_frames = 0;
        for scroll in (0..=2400).step_by(40) {
            let bounds = ElementBounds::new(0.0, 1200.0 - scroll as f32, 400.0, 400.0);
            if !d.on_intersection(&bounds, VH) {
                continue;
            }
            active_frames += 1;
            let t = d.frame(&bounds, VH);
            assert!(t.translate_y >= last_translate);
            assert!(t.scale >= 1.0 && t.scale <= 1.08 + 1e-6);
            last_translate = t.translate_y;
        }
        assert!(active_frames > 0);
        // Fully scrolled past: the gate closes and the last value is held
        let gone = ElementBounds::new(0.0, -1200.0, 400.0, 400.0);
        assert!(!d.on_intersection(&gone, VH));
        assert!((d.frame(&gone, VH).translate_y - last_translate).abs() < 1e-6);
    }

    #[test]
    fn driver_only_updates_while_visible() {
        let mut d = ParallaxDriver::new(ImageParallax::default(), VisibilityGate::new(0.0), false);
        let near = centered_at(200.0);
        let off = ElementBounds::new(0.0, 2000.0, 400.0, 200.0);

        assert!(!d.is_active());
        assert_eq!(d.frame(&near, VH), Transform::IDENTITY);

        assert!(d.on_intersection(&near, VH));
        let t = d.frame(&near, VH);
        assert!(t.translate_y > 0.0);

        assert!(!d.on_intersection(&off, VH));
        // Held at the last on-screen value
        assert_eq!(d.frame(&off, VH), t);
    }

    #[test]
    fn driver_reduced_motion_is_static() {
        let mut d = ParallaxDriver::new(SectionParallax::default(), VisibilityGate::new(100.0), true);
        let near = centered_at(100.0);
        assert!(!d.on_intersection(&near, VH));
        for _ in 0..10 {
            assert_eq!(d.frame(&near, VH), Transform::IDENTITY);
        }
    }
}
