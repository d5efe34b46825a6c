//! Flex rows and columns, with optional wrapping into tracks

use std::ops::Range;

use lumen_core::{Dim, Point, Size};

use super::Item;
use crate::style::{Align, Justify, Style, XY};

/// Split items into tracks no longer than `wrap_at` along `main`.
///
/// An item longer than the limit gets a track of its own.
pub(crate) fn lines(items: &[Item], main: Dim, gap: f32, wrap_at: Option<f32>) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut used = 0.0;
    for (i, item) in items.iter().enumerate() {
        let size = item.actual.dim(main);
        if i == start {
            used = size;
            continue;
        }
        match wrap_at {
            Some(max) if used + gap + size > max + 0.01 => {
                out.push(start..i);
                start = i;
                used = size;
            }
            _ => used += gap + size,
        }
    }
    if start < items.len() || out.is_empty() {
        out.push(start..items.len());
    }
    out
}

/// Track length limit. Before any space is known a wrapping container
/// reports its narrowest shape: one item per track.
fn wrap_limit(style: &Style, avail_main: Option<f32>) -> Option<f32> {
    if style.wrap {
        Some(avail_main.unwrap_or(0.0))
    } else {
        None
    }
}

fn line_main(items: &[Item], main: Dim, gap: f32) -> f32 {
    let sum: f32 = items.iter().map(|it| it.actual.dim(main)).sum();
    sum + gap * items.len().saturating_sub(1) as f32
}

fn line_cross(items: &[Item], cross: Dim) -> f32 {
    items.iter().map(|it| it.actual.dim(cross)).fold(0.0, f32::max)
}

/// Size needed by the items, given the available main-axis length when known
pub(crate) fn content_size(style: &Style, items: &[Item], avail_main: Option<f32>) -> Size {
    if items.is_empty() {
        return Size::ZERO;
    }
    let main = style.direction.dim();
    let cross = main.other();
    let gap_main = style.gap.dim(main).dots;
    let gap_cross = style.gap.dim(cross).dots;

    let tracks = lines(items, main, gap_main, wrap_limit(style, avail_main));
    let mut size = Size::ZERO;
    for track in &tracks {
        let slice = &items[track.clone()];
        size.set_dim(main, size.dim(main).max(line_main(slice, main, gap_main)));
        size.set_dim(cross, size.dim(cross) + line_cross(slice, cross));
    }
    size.set_dim(
        cross,
        size.dim(cross) + gap_cross * tracks.len().saturating_sub(1) as f32,
    );
    size
}

/// Allocations for each item within `avail`, plus whether it stretches
pub(crate) fn distribute(style: &Style, items: &[Item], avail: Size) -> Vec<(Size, XY<bool>)> {
    let main = style.direction.dim();
    let cross = main.other();
    let gap_main = style.gap.dim(main).dots;
    let tracks = lines(items, main, gap_main, wrap_limit(style, Some(avail.dim(main))));
    let single = tracks.len() == 1;

    let mut out = Vec::with_capacity(items.len());
    for track in tracks {
        let slice = &items[track];
        let extra = avail.dim(main) - line_main(slice, main, gap_main);
        let total_grow: f32 = slice.iter().map(|it| it.grow.dim(main)).sum();
        let slot = if single {
            avail.dim(cross)
        } else {
            line_cross(slice, cross)
        };

        for item in slice {
            let mut alloc = item.actual;
            if extra > 0.0 && total_grow > 0.0 {
                let share = extra * item.grow.dim(main) / total_grow;
                alloc.set_dim(main, item.actual.dim(main) + share);
            }
            let stretch = item.align_self.unwrap_or(style.align) == Align::Stretch;
            if stretch || item.grow.dim(cross) > 0.0 {
                alloc.set_dim(cross, slot.max(item.actual.dim(cross)));
            }
            let mut flags = XY::splat(false);
            flags.set_dim(cross, stretch);
            out.push((alloc, flags));
        }
    }
    out
}

/// Leading offset and extra spacing between `n` items sharing `free` space
pub(crate) fn justify_offsets(justify: Justify, free: f32, n: usize) -> (f32, f32) {
    let free = free.max(0.0);
    let n = n.max(1) as f32;
    match justify {
        Justify::Start => (0.0, 0.0),
        Justify::Center => (free / 2.0, 0.0),
        Justify::End => (free, 0.0),
        Justify::SpaceBetween if n > 1.0 => (0.0, free / (n - 1.0)),
        Justify::SpaceBetween => (0.0, 0.0),
        Justify::SpaceAround => (free / n / 2.0, free / n),
        Justify::SpaceEvenly => (free / (n + 1.0), free / (n + 1.0)),
    }
}

/// Offset of an item of `size` within a slot of `slot`
pub(crate) fn align_offset(align: Align, slot: f32, size: f32) -> f32 {
    match align {
        Align::Start | Align::Stretch => 0.0,
        Align::Center => ((slot - size) / 2.0).max(0.0),
        Align::End => (slot - size).max(0.0),
    }
}

/// Positions of the items relative to the content origin
pub(crate) fn arrange(style: &Style, items: &[Item], content: Size) -> Vec<Point> {
    let main = style.direction.dim();
    let cross = main.other();
    let gap_main = style.gap.dim(main).dots;
    let gap_cross = style.gap.dim(cross).dots;
    let tracks = lines(items, main, gap_main, wrap_limit(style, Some(content.dim(main))));
    let single = tracks.len() == 1 && !style.wrap;

    let cross_sizes: Vec<f32> = tracks
        .iter()
        .map(|t| {
            if single {
                content.dim(cross)
            } else {
                line_cross(&items[t.clone()], cross)
            }
        })
        .collect();
    let used_cross: f32 =
        cross_sizes.iter().sum::<f32>() + gap_cross * tracks.len().saturating_sub(1) as f32;
    let (mut cross_pos, cross_between) =
        justify_offsets(style.align_content, content.dim(cross) - used_cross, tracks.len());

    let mut out = vec![Point::ZERO; items.len()];
    for (track, track_cross) in tracks.into_iter().zip(cross_sizes) {
        let slice = &items[track.clone()];
        let free = content.dim(main) - line_main(slice, main, gap_main);
        let (mut pos, between) = justify_offsets(style.justify, free, slice.len());
        for (i, item) in track.zip(slice) {
            let align = item.align_self.unwrap_or(style.align);
            let mut p = Point::ZERO;
            p.set_dim(main, pos);
            p.set_dim(
                cross,
                cross_pos + align_offset(align, track_cross, item.actual.dim(cross)),
            );
            out[i] = p;
            pos += item.actual.dim(main) + gap_main + between;
        }
        cross_pos += track_cross + gap_cross + cross_between;
    }
    out
}

#[cfg(test)]
mod tests {
    use lumen_core::Length;

    use super::*;
    use crate::tree::WidgetId;

    fn item(w: f32, h: f32, grow: f32) -> Item {
        Item {
            id: WidgetId::default(),
            actual: Size::new(w, h),
            grow: XY::new(grow, 0.0),
            align_self: None,
            justify_self: None,
            rel_pos: Point::ZERO,
        }
    }

    #[test]
    fn grow_shares_extra_space() {
        let style = Style::default();
        let items = [item(50.0, 10.0, 1.0), item(50.0, 10.0, 0.0), item(50.0, 10.0, 1.0)];
        let allocs = distribute(&style, &items, Size::new(300.0, 10.0));
        let widths: Vec<f32> = allocs.iter().map(|(a, _)| a.width).collect();
        assert_eq!(widths, vec![125.0, 50.0, 125.0]);
    }

    #[test]
    fn wrap_breaks_tracks() {
        let mut style = Style::default();
        style.wrap = true;
        let items = vec![item(40.0, 20.0, 0.0); 6];
        let size = content_size(&style, &items, Some(100.0));
        assert_eq!(size, Size::new(80.0, 60.0));
        assert_eq!(lines(&items, Dim::X, 0.0, Some(100.0)).len(), 3);
        let narrowest = content_size(&style, &items, None);
        assert_eq!(narrowest, Size::new(40.0, 120.0));
        style.wrap = false;
        assert_eq!(content_size(&style, &items, None), Size::new(240.0, 20.0));
    }

    #[test]
    fn justify_and_gap() {
        let mut style = Style::default();
        style.gap = XY::splat(Length::px(10.0));
        style.justify = Justify::SpaceBetween;
        let items = [item(20.0, 10.0, 0.0), item(20.0, 10.0, 0.0), item(20.0, 10.0, 0.0)];
        let pos = arrange(&style, &items, Size::new(100.0, 10.0));
        let xs: Vec<f32> = pos.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 40.0, 80.0]);

        style.justify = Justify::Center;
        let pos = arrange(&style, &items, Size::new(100.0, 10.0));
        assert_eq!(pos[0].x, 10.0);
    }

    #[test]
    fn cross_alignment() {
        let mut style = Style::default();
        style.align = Align::Center;
        let items = [item(20.0, 10.0, 0.0)];
        let pos = arrange(&style, &items, Size::new(100.0, 30.0));
        assert_eq!(pos[0].y, 10.0);
        let allocs = distribute(&style, &items, Size::new(100.0, 30.0));
        assert_eq!(allocs[0].0.height, 10.0);

        style.align = Align::Stretch;
        let allocs = distribute(&style, &items, Size::new(100.0, 30.0));
        assert_eq!(allocs[0].0.height, 30.0);
        assert!(allocs[0].1.y);
    }
}
