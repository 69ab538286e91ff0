//! Surface damage accumulated between paint passes.

use model::{DevicePx, Rect};

/// Above this many rects the damage collapses into its bounding box.
const MAX_DAMAGE_RECTS: usize = 32;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum DirtyRectMask {
    #[default]
    Clean,
    Full,
    Rects(Vec<Rect<DevicePx>>),
}

impl DirtyRectMask {
    pub(crate) fn is_clean(&self) -> bool {
        matches!(self, DirtyRectMask::Clean)
    }

    pub(crate) fn mark_full(&mut self) {
        *self = DirtyRectMask::Full;
    }

    /// Adds `rect` clipped to `bounds`. Returns whether anything was recorded.
    pub(crate) fn mark_rect(&mut self, rect: &Rect<DevicePx>, bounds: &Rect<DevicePx>) -> bool {
        let rect = rect.intersect(bounds);
        if rect.is_empty() {
            return false;
        }
        if rect.contains_rect(bounds) {
            self.mark_full();
            return true;
        }
        match self {
            DirtyRectMask::Full => return false,
            DirtyRectMask::Clean => *self = DirtyRectMask::Rects(vec![rect]),
            DirtyRectMask::Rects(rects) => {
                if rects.iter().any(|existing| existing.contains_rect(&rect)) {
                    return false;
                }
                rects.push(rect);
                if rects.len() > MAX_DAMAGE_RECTS {
                    let merged = rects
                        .iter()
                        .fold(Rect::empty(), |acc: Rect<DevicePx>, next| acc.union(next));
                    *rects = vec![merged];
                }
            }
        }
        true
    }

    /// Moves recorded rects that overlap `area` by the scroll delta, clipped to `area`.
    pub(crate) fn shift_within(&mut self, area: &Rect<DevicePx>, delta_x: i64, delta_y: i64) {
        let DirtyRectMask::Rects(rects) = self else {
            return;
        };
        for rect in rects.iter_mut() {
            if !rect.intersects(area) {
                continue;
            }
            *rect = rect.offset(delta_x, delta_y).intersect(area);
        }
        rects.retain(|rect| !rect.is_empty());
        if rects.is_empty() {
            *self = DirtyRectMask::Clean;
        }
    }

    /// Drains the mask into a list of rects within `bounds`.
    pub(crate) fn take_rects(&mut self, bounds: &Rect<DevicePx>) -> Vec<Rect<DevicePx>> {
        match std::mem::take(self) {
            DirtyRectMask::Clean => Vec::new(),
            DirtyRectMask::Full => {
                if bounds.is_empty() {
                    Vec::new()
                } else {
                    vec![*bounds]
                }
            }
            DirtyRectMask::Rects(rects) => rects,
        }
    }

    pub(crate) fn rects(&self, bounds: &Rect<DevicePx>) -> Vec<Rect<DevicePx>> {
        match self {
            DirtyRectMask::Clean => Vec::new(),
            DirtyRectMask::Full => vec![*bounds],
            DirtyRectMask::Rects(rects) => rects.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Rect<DevicePx> = Rect::new(0, 0, 100, 100);

    #[test]
    fn rects_are_clipped_and_kept_in_order() {
        let mut mask = DirtyRectMask::default();
        assert!(mask.mark_rect(&Rect::new(90, 90, 20, 20), &BOUNDS));
        assert!(mask.mark_rect(&Rect::new(0, 0, 5, 5), &BOUNDS));
        assert!(!mask.mark_rect(&Rect::new(1, 1, 2, 2), &BOUNDS));
        assert!(!mask.mark_rect(&Rect::new(200, 0, 5, 5), &BOUNDS));
        assert_eq!(
            mask.take_rects(&BOUNDS),
            vec![Rect::new(90, 90, 10, 10), Rect::new(0, 0, 5, 5)]
        );
        assert!(mask.is_clean());
    }

    #[test]
    fn covering_rect_promotes_to_full() {
        let mut mask = DirtyRectMask::default();
        mask.mark_rect(&Rect::new(-10, -10, 200, 200), &BOUNDS);
        assert_eq!(mask, DirtyRectMask::Full);
        assert!(!mask.mark_rect(&Rect::new(0, 0, 5, 5), &BOUNDS));
        assert_eq!(mask.take_rects(&BOUNDS), vec![BOUNDS]);
    }

    #[test]
    fn many_rects_collapse_to_bounding_box() {
        let mut mask = DirtyRectMask::default();
        for index in 0..=MAX_DAMAGE_RECTS as i64 {
            mask.mark_rect(&Rect::new(index * 2, 0, 1, 1), &BOUNDS);
        }
        assert_eq!(
            mask.rects(&BOUNDS),
            vec![Rect::new(0, 0, MAX_DAMAGE_RECTS as i64 * 2 + 1, 1)]
        );
    }

    #[test]
    fn scroll_moves_damage_inside_area() {
        let mut mask = DirtyRectMask::default();
        mask.mark_rect(&Rect::new(0, 50, 10, 10), &BOUNDS);
        mask.shift_within(&BOUNDS, 0, -20);
        assert_eq!(mask.rects(&BOUNDS), vec![Rect::new(0, 30, 10, 10)]);
    }
}
