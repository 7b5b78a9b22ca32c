//! Scroll driven camera movement.
//!
//! The page reports its scroll position as the document body's top edge
//! relative to the viewport: `0.0` at the top and increasingly negative as
//! the reader scrolls down. The camera position is a fixed linear function of
//! that value and is not clamped, so the parallax keeps going for as long as
//! the page does.

use crate::{camera::PerspectiveCamera, config::ScrollFactors};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollCameraDriver {
    factors: ScrollFactors,
}

impl ScrollCameraDriver {
    pub fn new(factors: ScrollFactors) -> Self {
        Self { factors }
    }

    /// Place the camera for the body offset `top` (pixels).
    pub fn on_scroll(&self, camera: &mut PerspectiveCamera, top: f64) {
        let t = top as f32;
        camera.position.z = t * self.factors.z;
        camera.position.x = t * self.factors.x;
        camera.position.y = t * self.factors.y;
    }
}

/// Virtual document scroll for hosts without a page, fed by the mouse wheel.
///
/// Mirrors a browser page of `height` scrollable pixels: `top` starts at zero
/// and can go down to `-height` but never above the top of the page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageScroll {
    top: f64,
    height: f64,
}

impl PageScroll {
    /// Pixels a single wheel line scrolls, close to what desktop browsers use.
    pub const LINE_HEIGHT: f64 = 48.0;

    pub fn new(height: f64) -> Self {
        Self {
            top: 0.0,
            height: height.max(0.0),
        }
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    /// Scroll by wheel lines; positive lines scroll towards the top of the page.
    /// Returns the new top when it changed.
    pub fn scroll_lines(&mut self, lines: f64) -> Option<f64> {
        self.scroll_pixels(lines * Self::LINE_HEIGHT)
    }

    pub fn scroll_pixels(&mut self, pixels: f64) -> Option<f64> {
        let top = (self.top + pixels).clamp(-self.height, 0.0);
        if top == self.top {
            return None;
        }
        self.top = top;
        Some(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{camera::Projection, config::SceneConfig};

    fn setup() -> (ScrollCameraDriver, PerspectiveCamera) {
        let config = SceneConfig::default();
        let camera = PerspectiveCamera::new(
            config.camera.start_position,
            Projection::new(800, 600, config.camera.fovy, config.camera.znear, config.camera.zfar),
        );
        (ScrollCameraDriver::new(config.scroll), camera)
    }

    #[test]
    fn top_of_page_puts_camera_at_origin() {
        let (driver, mut camera) = setup();
        driver.on_scroll(&mut camera, 0.0);
        assert_eq!(camera.position, [0.0, 0.0, 0.0].into());
    }

    #[test]
    fn position_is_linear_in_scroll_offset() {
        let (driver, mut camera) = setup();
        for top in [-1500.0_f64, -300.0, 250.0] {
            driver.on_scroll(&mut camera, top);
            let t = top as f32;
            assert_eq!(camera.position.z, t * -0.01);
            assert_eq!(camera.position.x, t * -0.0002);
            assert_eq!(camera.position.y, t * -0.0002);
        }
    }

    #[test]
    fn scrolling_down_moves_camera_towards_positive_z() {
        let (driver, mut camera) = setup();
        driver.on_scroll(&mut camera, -2000.0);
        assert!((camera.position.z - 20.0).abs() < 1e-4);
        assert!((camera.position.x - 0.4).abs() < 1e-6);
    }

    #[test]
    fn same_offset_gives_same_position() {
        let (driver, mut camera) = setup();
        driver.on_scroll(&mut camera, -777.0);
        let first = camera.position;
        camera.position = [5.0, 5.0, 5.0].into();
        driver.on_scroll(&mut camera, -777.0);
        assert_eq!(camera.position, first);
    }

    #[test]
    fn offsets_are_not_clamped() {
        let (driver, mut camera) = setup();
        driver.on_scroll(&mut camera, -1.0e7);
        assert!((camera.position.z - 1.0e5).abs() < 1.0);
        assert!((camera.position.y - 2.0e3).abs() < 1.0);
    }

    #[test]
    fn page_scroll_stays_within_the_page() {
        let mut page = PageScroll::new(100.0);
        assert_eq!(page.scroll_lines(1.0), None);
        assert_eq!(page.scroll_lines(-1.0), Some(-48.0));
        assert_eq!(page.scroll_lines(-5.0), Some(-100.0));
        assert_eq!(page.scroll_pixels(-10.0), None);
        assert_eq!(page.scroll_pixels(30.0), Some(-70.0));
        assert_eq!(page.top(), -70.0);
    }
}
