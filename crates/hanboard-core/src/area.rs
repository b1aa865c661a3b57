//! Active-area registration shared by every keyboard in the process.
//!
//! The OS hook is process-wide, so several keyboards may register an area at once.
//! Registrations form a stack keyed by owner: the most recent registration is the
//! active one, and removing it re-activates the previous registration.

use crate::types::{Point, PointF, Rect};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps global screen coordinates into an owner's local coordinates.
pub trait CoordinateSpace: Send + Sync {
    fn point_from_screen(&self, screen: Point) -> PointF;
}

impl<F> CoordinateSpace for F
where
    F: Fn(Point) -> PointF + Send + Sync,
{
    fn point_from_screen(&self, screen: Point) -> PointF {
        self(screen)
    }
}

/// Owner placed at `origin` on screen, with `scale` device pixels per local unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenOffset {
    pub origin: Point,
    pub scale: f64,
}

impl ScreenOffset {
    pub const fn new(origin: Point) -> Self {
        Self { origin, scale: 1.0 }
    }

    pub const fn with_scale(origin: Point, scale: f64) -> Self {
        Self { origin, scale }
    }
}

impl CoordinateSpace for ScreenOffset {
    fn point_from_screen(&self, screen: Point) -> PointF {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        PointF::new(
            f64::from(screen.x - self.origin.x) / scale,
            f64::from(screen.y - self.origin.y) / scale,
        )
    }
}

/// Identifies the keyboard instance that registered an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AreaOwnerId(u64);

impl AreaOwnerId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Rectangle in `owner` coordinates covering the on-screen keyboard.
#[derive(Clone)]
pub struct ActiveArea {
    pub rect: Rect,
    pub owner: Arc<dyn CoordinateSpace>,
}

impl ActiveArea {
    pub fn new(rect: Rect, owner: Arc<dyn CoordinateSpace>) -> Self {
        Self { rect, owner }
    }

    pub fn contains_screen(&self, screen: Point) -> bool {
        self.rect.contains(self.owner.point_from_screen(screen))
    }
}

impl fmt::Debug for ActiveArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveArea")
            .field("rect", &self.rect)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct AreaRegistry {
    stack: Vec<(AreaOwnerId, ActiveArea)>,
}

impl AreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace `owner`'s area and make it the active one.
    pub fn register(&mut self, owner: AreaOwnerId, area: ActiveArea) {
        self.stack.retain(|(id, _)| *id != owner);
        if let Some((previous, _)) = self.stack.last() {
            warn!(
                "Active area of {:?} overrides the area of {:?} until it is unregistered",
                owner, previous
            );
        }
        debug!("Registered active area {:?} for {:?}", area.rect, owner);
        self.stack.push((owner, area));
    }

    /// Returns true if `owner` had a registration.
    pub fn unregister(&mut self, owner: AreaOwnerId) -> bool {
        let before = self.stack.len();
        self.stack.retain(|(id, _)| *id != owner);
        self.stack.len() != before
    }

    pub fn active(&self) -> Option<&ActiveArea> {
        self.stack.last().map(|(_, area)| area)
    }

    pub fn active_owner(&self) -> Option<AreaOwnerId> {
        self.stack.last().map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Suppression test. With nothing registered every point counts as inside.
    pub fn is_inside(&self, screen: Point) -> bool {
        match self.active() {
            Some(area) => area.contains_screen(screen),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_at(x: i32, y: i32, w: f64, h: f64) -> ActiveArea {
        ActiveArea::new(
            Rect::new(0.0, 0.0, w, h),
            Arc::new(ScreenOffset::new(Point::new(x, y))),
        )
    }

    #[test]
    fn empty_registry_treats_everything_as_inside() {
        let reg = AreaRegistry::new();
        assert!(reg.is_inside(Point::new(-5000, 9000)));
    }

    #[test]
    fn point_is_mapped_into_owner_space() {
        let mut reg = AreaRegistry::new();
        reg.register(AreaOwnerId::next(), area_at(100, 600, 800.0, 300.0));
        assert!(reg.is_inside(Point::new(100, 600)));
        assert!(reg.is_inside(Point::new(500, 750)));
        assert!(!reg.is_inside(Point::new(99, 700)));
        assert!(!reg.is_inside(Point::new(500, 901)));
    }

    #[test]
    fn scaled_owner() {
        let area = ActiveArea::new(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Arc::new(ScreenOffset::with_scale(Point::new(0, 0), 2.0)),
        );
        assert!(area.contains_screen(Point::new(200, 200)));
        assert!(!area.contains_screen(Point::new(201, 10)));
    }

    #[test]
    fn closure_owner() {
        let owner = Arc::new(|p: Point| PointF::new(f64::from(p.x), f64::from(p.y) - 50.0));
        let area = ActiveArea::new(Rect::new(0.0, 0.0, 10.0, 10.0), owner);
        assert!(area.contains_screen(Point::new(5, 55)));
        assert!(!area.contains_screen(Point::new(5, 5)));
    }

    #[test]
    fn latest_registration_wins_and_unregister_restores_previous() {
        let mut reg = AreaRegistry::new();
        let first = AreaOwnerId::next();
        let second = AreaOwnerId::next();
        reg.register(first, area_at(0, 0, 100.0, 100.0));
        reg.register(second, area_at(1000, 1000, 100.0, 100.0));

        assert_eq!(reg.active_owner(), Some(second));
        assert!(!reg.is_inside(Point::new(50, 50)));

        assert!(reg.unregister(second));
        assert_eq!(reg.active_owner(), Some(first));
        assert!(reg.is_inside(Point::new(50, 50)));
    }

    #[test]
    fn re_registering_moves_owner_to_top() {
        let mut reg = AreaRegistry::new();
        let first = AreaOwnerId::next();
        let second = AreaOwnerId::next();
        reg.register(first, area_at(0, 0, 10.0, 10.0));
        reg.register(second, area_at(0, 0, 10.0, 10.0));
        reg.register(first, area_at(0, 0, 10.0, 10.0));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.active_owner(), Some(first));
        assert!(!reg.unregister(AreaOwnerId::next()));
    }
}
