//! Grid layout: a fixed column count, rows inferred from the item count

use lumen_core::{Dim, Point, Size};

use super::flex::align_offset;
use super::Item;
use crate::style::{Align, Style, XY};

struct Tracks {
    cols: Vec<f32>,
    rows: Vec<f32>,
}

fn columns(style: &Style, len: usize) -> usize {
    style.columns.max(1).min(len.max(1))
}

/// Track sizes from the items, with `extra` space handed out by grow factors
fn tracks(style: &Style, items: &[Item], avail: Option<Size>) -> Tracks {
    let ncols = columns(style, items.len());
    let nrows = items.len().div_ceil(ncols);
    let mut cols = vec![0.0f32; ncols];
    let mut rows = vec![0.0f32; nrows];
    let mut col_grow = vec![0.0f32; ncols];
    let mut row_grow = vec![0.0f32; nrows];
    for (i, item) in items.iter().enumerate() {
        let (c, r) = (i % ncols, i / ncols);
        cols[c] = cols[c].max(item.actual.width);
        rows[r] = rows[r].max(item.actual.height);
        col_grow[c] = col_grow[c].max(item.grow.x);
        row_grow[r] = row_grow[r].max(item.grow.y);
    }
    if let Some(avail) = avail {
        let used = total(&cols, style.gap.x.dots);
        grow_tracks(&mut cols, &col_grow, avail.width - used);
        let used = total(&rows, style.gap.y.dots);
        grow_tracks(&mut rows, &row_grow, avail.height - used);
    }
    Tracks { cols, rows }
}

fn grow_tracks(tracks: &mut [f32], grow: &[f32], extra: f32) {
    let total_grow: f32 = grow.iter().sum();
    if extra <= 0.0 || total_grow <= 0.0 {
        return;
    }
    for (t, g) in tracks.iter_mut().zip(grow) {
        *t += extra * g / total_grow;
    }
}

fn total(tracks: &[f32], gap: f32) -> f32 {
    tracks.iter().sum::<f32>() + gap * tracks.len().saturating_sub(1) as f32
}

pub(crate) fn content_size(style: &Style, items: &[Item]) -> Size {
    if items.is_empty() {
        return Size::ZERO;
    }
    let t = tracks(style, items, None);
    Size::new(total(&t.cols, style.gap.x.dots), total(&t.rows, style.gap.y.dots))
}

fn cell_align(style: &Style, item: &Item, dim: Dim) -> Align {
    match dim {
        Dim::X => item.justify_self.unwrap_or(style.align),
        Dim::Y => item.align_self.unwrap_or(style.align),
    }
}

pub(crate) fn distribute(style: &Style, items: &[Item], avail: Size) -> Vec<(Size, XY<bool>)> {
    if items.is_empty() {
        return Vec::new();
    }
    let t = tracks(style, items, Some(avail));
    let ncols = t.cols.len();
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let cell = Size::new(t.cols[i % ncols], t.rows[i / ncols]);
            let mut alloc = item.actual;
            let mut stretch = XY::splat(false);
            for dim in [Dim::X, Dim::Y] {
                let s = cell_align(style, item, dim) == Align::Stretch;
                stretch.set_dim(dim, s);
                if s || item.grow.dim(dim) > 0.0 {
                    alloc.set_dim(dim, cell.dim(dim));
                }
            }
            (alloc, stretch)
        })
        .collect()
}

pub(crate) fn arrange(style: &Style, items: &[Item], content: Size) -> Vec<Point> {
    if items.is_empty() {
        return Vec::new();
    }
    let t = tracks(style, items, Some(content));
    let ncols = t.cols.len();
    let (gx, gy) = (style.gap.x.dots, style.gap.y.dots);
    let col_starts: Vec<f32> = t
        .cols
        .iter()
        .scan(0.0, |acc, w| {
            let start = *acc;
            *acc += w + gx;
            Some(start)
        })
        .collect();
    let row_starts: Vec<f32> = t
        .rows
        .iter()
        .scan(0.0, |acc, h| {
            let start = *acc;
            *acc += h + gy;
            Some(start)
        })
        .collect();

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let (c, r) = (i % ncols, i / ncols);
            Point::new(
                col_starts[c] + align_offset(cell_align(style, item, Dim::X), t.cols[c], item.actual.width),
                row_starts[r] + align_offset(cell_align(style, item, Dim::Y), t.rows[r], item.actual.height),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::WidgetId;

    fn item(w: f32, h: f32) -> Item {
        Item {
            id: WidgetId::default(),
            actual: Size::new(w, h),
            grow: XY::splat(0.0),
            align_self: None,
            justify_self: None,
            rel_pos: Point::ZERO,
        }
    }

    #[test]
    fn tracks_take_column_and_row_maxima() {
        let mut style = Style::default();
        style.columns = 2;
        let items = [item(10.0, 5.0), item(30.0, 5.0), item(20.0, 15.0)];
        assert_eq!(content_size(&style, &items), Size::new(50.0, 20.0));
        let pos = arrange(&style, &items, Size::new(50.0, 20.0));
        assert_eq!(pos[1], Point::new(20.0, 0.0));
        assert_eq!(pos[2], Point::new(0.0, 5.0));
    }

    #[test]
    fn cells_align_items() {
        let mut style = Style::default();
        style.columns = 1;
        let mut it = item(10.0, 10.0);
        it.justify_self = Some(Align::Center);
        let pos = arrange(&style, &[it, item(30.0, 10.0)], Size::new(30.0, 20.0));
        assert_eq!(pos[0].x, 10.0);
    }
}
