use super::ElementBounds;

/// Intersection test with a pre-trigger margin, so work starts just before
/// an element scrolls into view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityGate {
    pub margin_px: f32,
}

impl Default for VisibilityGate {
    fn default() -> Self {
        Self { margin_px: 200.0 }
    }
}

impl VisibilityGate {
    pub fn new(margin_px: f32) -> Self {
        Self {
            margin_px: margin_px.max(0.0),
        }
    }

    pub fn is_intersecting(&self, bounds: &ElementBounds, viewport_height: f32) -> bool {
        bounds.bottom() > -self.margin_px && bounds.top < viewport_height + self.margin_px
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(top: f32) -> ElementBounds {
        ElementBounds::new(0.0, top, 100.0, 100.0)
    }

    #[test]
    fn inside_viewport() {
        let gate = VisibilityGate::new(0.0);
        assert!(gate.is_intersecting(&at(0.0), 600.0));
        assert!(gate.is_intersecting(&at(550.0), 600.0));
    }

    #[test]
    fn outside_without_margin() {
        let gate = VisibilityGate::new(0.0);
        assert!(!gate.is_intersecting(&at(600.0), 600.0));
        assert!(!gate.is_intersecting(&at(-100.0), 600.0));
    }

    #[test]
    fn margin_pre_triggers() {
        let gate = VisibilityGate::new(150.0);
        assert!(gate.is_intersecting(&at(700.0), 600.0));
        assert!(gate.is_intersecting(&at(-200.0), 600.0));
        assert!(!gate.is_intersecting(&at(750.0), 600.0));
    }

    #[test]
    fn negative_margin_clamps() {
        assert!((VisibilityGate::new(-5.0).margin_px).abs() < 1e-6);
    }
}
