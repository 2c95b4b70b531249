//! Window placement: cascade positions for new windows and clamping of
//! restored geometry to the screen.

use super::geometry::{Geometry, Point};
use crate::config::WindowConfig;

/// Minimum visible extent, per axis, of a restored window
const MIN_VISIBLE: i32 = 100;

/// Logical screen rectangle from config.
pub fn screen_bounds(config: &WindowConfig) -> Geometry {
    Geometry::new(0, 0, config.screen_width, config.screen_height)
}

/// Position for a new detached window.
///
/// The requested point is shifted by a cascade step that cycles every
/// `cascade_cycle` windows, then clamped so the window is fully on-screen.
pub fn smart_position(requested: Point, cascade_index: u32, config: &WindowConfig) -> Geometry {
    let step = (cascade_index % config.cascade_cycle.max(1)) as i32;
    let offset = config.cascade_offset * step;
    let screen = screen_bounds(config);
    let width = config.default_width.min(screen.width);
    let height = config.default_height.min(screen.height);

    let x = (requested.x + offset)
        .min(screen.right() - width as i32)
        .max(screen.x);
    let y = (requested.y + offset)
        .min(screen.bottom() - height as i32)
        .max(screen.y);
    Geometry::new(x, y, width, height)
}

/// Shrink to the screen and keep at least [`MIN_VISIBLE`] pixels visible on
/// each axis.
pub fn clamp_to_screen(geometry: Geometry, screen: Geometry) -> Geometry {
    // Ensure window isn't larger than the screen
    let width = geometry.width.min(screen.width);
    let height = geometry.height.min(screen.height);

    let x = geometry
        .x
        .max(screen.x - width as i32 + MIN_VISIBLE)
        .min(screen.right() - MIN_VISIBLE);
    let y = geometry
        .y
        .max(screen.y - height as i32 + MIN_VISIBLE)
        .min(screen.bottom() - MIN_VISIBLE);

    Geometry::new(x, y, width, height)
}

/// Geometry for a window being restored from a session.
///
/// Saved geometry that still overlaps the screen is clamped; geometry that
/// is effectively off-screen falls back to the cascade position.
pub fn restore_geometry(
    saved: Geometry,
    cascade_index: u32,
    config: &WindowConfig,
) -> Geometry {
    let screen = screen_bounds(config);
    let (w, h) = saved.overlap(&screen);
    if (w as i32) < MIN_VISIBLE || (h as i32) < MIN_VISIBLE || saved.width == 0 || saved.height == 0
    {
        log::info!(
            "Saved window geometry {:?} is off-screen, using cascade position",
            saved
        );
        return smart_position(Point::new(screen.x, screen.y), cascade_index, config);
    }
    clamp_to_screen(saved, screen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Geometry {
        Geometry::new(0, 0, 1920, 1080)
    }

    #[test]
    fn test_clamp_to_screen_within_bounds() {
        let g = Geometry::new(100, 100, 800, 600);
        assert_eq!(clamp_to_screen(g, screen()), g);
    }

    #[test]
    fn test_clamp_to_screen_too_large() {
        let g = clamp_to_screen(Geometry::new(0, 0, 3000, 2000), screen());
        assert_eq!((g.width, g.height), (1920, 1080));
    }

    #[test]
    fn test_clamp_to_screen_offscreen_right() {
        let g = clamp_to_screen(Geometry::new(1900, 100, 800, 600), screen());
        assert_eq!(g.x, 1820);
    }

    #[test]
    fn test_clamp_to_screen_offscreen_left() {
        let g = clamp_to_screen(Geometry::new(-790, 100, 800, 600), screen());
        assert_eq!(g.x, -700);
    }

    #[test]
    fn test_smart_position_cascades_and_wraps() {
        let config = WindowConfig::default();
        let first = smart_position(Point::new(200, 200), 0, &config);
        let second = smart_position(Point::new(200, 200), 1, &config);
        let wrapped = smart_position(Point::new(200, 200), config.cascade_cycle, &config);
        assert_eq!(first.origin(), Point::new(200, 200));
        assert_eq!(second.origin(), Point::new(230, 230));
        assert_eq!(wrapped, first);
    }

    #[test]
    fn test_smart_position_stays_fully_on_screen() {
        let config = WindowConfig::default();
        let g = smart_position(Point::new(1800, 1000), 3, &config);
        assert_eq!(g.right(), 1920);
        assert_eq!(g.bottom(), 1080);
        let g = smart_position(Point::new(-500, -500), 0, &config);
        assert_eq!(g.origin(), Point::new(0, 0));
    }

    #[test]
    fn test_restore_geometry_offscreen_falls_back() {
        let config = WindowConfig::default();
        let g = restore_geometry(Geometry::new(5000, 5000, 800, 600), 2, &config);
        assert_eq!(g, smart_position(Point::new(0, 0), 2, &config));
    }

    #[test]
    fn test_restore_geometry_partially_visible_is_clamped() {
        let config = WindowConfig::default();
        let g = restore_geometry(Geometry::new(1700, 100, 800, 600), 0, &config);
        assert_eq!(g, Geometry::new(1700, 100, 800, 600));
    }
}
