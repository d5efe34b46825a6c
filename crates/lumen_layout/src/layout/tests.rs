use std::rc::Rc;

use lumen_core::{Length, Rect, Size};

use super::*;
use crate::scroll::scroll_to;
use crate::styling::{style_tree, StyleCx};
use crate::text::EstimatedTextMeasurer;
use crate::widgets::{Frame, Text};

fn styled(tree: &mut SceneTree, id: WidgetId, f: impl Fn(&mut Style) + 'static) {
    tree.get_mut(id).unwrap().stylers.main.push(Rc::new(f));
}

fn run(tree: &mut SceneTree, size: Size) -> LayoutStats {
    let root = tree.root();
    let cx = StyleCx {
        viewport: size,
        ..StyleCx::default()
    };
    style_tree(tree, root, &cx);
    let settings = Settings::default();
    let lcx = LayoutCx {
        measurer: &EstimatedTextMeasurer,
        settings: &settings,
    };
    layout_scene(tree, root, size, &lcx)
}

fn within(inner: Rect, outer: Rect) -> bool {
    const EPS: f32 = 0.01;
    inner.is_empty()
        || (inner.x() >= outer.x() - EPS
            && inner.y() >= outer.y() - EPS
            && inner.max_x() <= outer.max_x() + EPS
            && inner.max_y() <= outer.max_y() + EPS)
}

#[test]
fn grow_factors_split_leftover_width() {
    let mut tree = SceneTree::with_root("root");
    let root = tree.root();
    let ids: Vec<WidgetId> = [1.0, 0.0, 1.0]
        .into_iter()
        .enumerate()
        .map(|(i, grow)| {
            let id = tree.add(root, &format!("c{i}"), Frame::new()).unwrap();
            styled(&mut tree, id, move |s| {
                s.set_min(Length::px(50.0), Length::px(20.0));
                s.set_grow(grow, 0.0);
            });
            id
        })
        .collect();

    run(&mut tree, Size::new(300.0, 40.0));

    let widths: Vec<f32> = ids.iter().map(|&id| tree.get(id).unwrap().geom.actual.width).collect();
    assert_eq!(widths, vec![125.0, 50.0, 125.0]);
    let xs: Vec<f32> = ids
        .iter()
        .map(|&id| tree.get(id).unwrap().geom.total_bbox.x())
        .collect();
    assert_eq!(xs, vec![0.0, 125.0, 175.0]);
}

#[test]
fn wrapping_row_reflows_into_tracks() {
    let mut tree = SceneTree::with_root("root");
    let root = tree.root();
    styled(&mut tree, root, |s| {
        s.column();
    });
    let wrap = tree.add(root, "wrap", Frame::row()).unwrap();
    styled(&mut tree, wrap, |s| {
        s.wrap = true;
        s.min.x = Length::px(100.0);
        s.max.x = Length::px(100.0);
    });
    let items: Vec<WidgetId> = (0..6)
        .map(|i| {
            let id = tree.add(wrap, &format!("i{i}"), Frame::new()).unwrap();
            styled(&mut tree, id, |s| {
                s.set_size(Length::px(40.0), Length::px(20.0));
            });
            id
        })
        .collect();

    let stats = run(&mut tree, Size::new(300.0, 300.0));

    assert!(stats.converged);
    assert!(stats.size_down_iterations <= 3);
    let frame = &tree.get(wrap).unwrap().geom;
    assert_eq!(frame.actual, Size::new(100.0, 60.0));
    let rows: Vec<f32> = items
        .iter()
        .map(|&id| tree.get(id).unwrap().geom.total_bbox.y())
        .collect();
    assert_eq!(rows, vec![0.0, 0.0, 20.0, 20.0, 40.0, 40.0]);
    assert_eq!(tree.get(items[1]).unwrap().geom.total_bbox.x(), 40.0);
}

#[test]
fn scrolling_child_absorbs_content_height() {
    let mut tree = SceneTree::with_root("root");
    let root = tree.root();
    let scroller = tree.add(root, "scroller", Frame::column()).unwrap();
    styled(&mut tree, scroller, |s| {
        s.overflow.y = Overflow::Auto;
        s.set_grow(1.0, 1.0);
    });
    let content = tree.add(scroller, "content", Frame::new()).unwrap();
    styled(&mut tree, content, |s| {
        s.set_size(Length::px(100.0), Length::px(1000.0));
    });

    run(&mut tree, Size::new(200.0, 100.0));

    assert_eq!(tree.get(root).unwrap().geom.actual.height, 100.0);
    let g = &tree.get(scroller).unwrap().geom;
    assert_eq!(g.actual.height, 100.0);
    let bar = g.scrollbars.y.expect("vertical scrollbar");
    assert!(g.scrollbars.x.is_none());
    assert!((bar.visible_pct - 0.1).abs() < 1e-4);
    assert_eq!(g.max_scroll(Dim::Y), 900.0);

    assert!(scroll_to(&mut tree, scroller, Dim::Y, 900.0));
    position_scene(&mut tree, root, Rect::new(0.0, 0.0, 200.0, 100.0));

    let c = &tree.get(content).unwrap().geom;
    assert_eq!(c.total_bbox.y(), -900.0);
    assert_eq!(c.content_bbox, Rect::new(0.0, 0.0, 100.0, 100.0));
    let g = &tree.get(scroller).unwrap().geom;
    let thumb = g.scrollbars.y.unwrap().thumb;
    assert!((thumb.max_y() - 100.0).abs() < 0.01);
}

#[test]
fn stacked_frame_hides_lower_pages() {
    let mut tree = SceneTree::with_root("root");
    let root = tree.root();
    let stack = tree.add(root, "stack", Frame::stacked()).unwrap();
    styled(&mut tree, stack, |s| {
        s.stack_top = 1;
        s.set_grow(1.0, 1.0);
    });
    let a = tree.add(stack, "a", Text::new("first")).unwrap();
    let b = tree.add(stack, "b", Text::new("second")).unwrap();

    run(&mut tree, Size::new(120.0, 80.0));

    assert!(tree.get(a).unwrap().geom.content_bbox.is_empty());
    let shown = &tree.get(b).unwrap().geom;
    assert_eq!(shown.total_bbox, Rect::new(0.0, 0.0, 120.0, 80.0));
    assert!(!shown.vis_bbox.is_empty());
}

#[test]
fn stacked_children_align_within_the_stack() {
    let mut tree = SceneTree::with_root("root");
    let root = tree.root();
    let stack = tree.add(root, "stack", Frame::stacked()).unwrap();
    styled(&mut tree, stack, |s| {
        s.set_grow(1.0, 1.0);
    });
    let badge = tree.add(stack, "badge", Frame::new()).unwrap();
    styled(&mut tree, badge, |s| {
        s.set_size(Length::px(40.0), Length::px(20.0));
        s.justify_self = Some(Align::Center);
        s.align_self = Some(Align::End);
    });

    run(&mut tree, Size::new(100.0, 60.0));

    let geom = &tree.get(badge).unwrap().geom;
    assert_eq!(geom.rel_pos, Point::new(30.0, 40.0));
    assert_eq!(geom.total_bbox, Rect::new(30.0, 40.0, 40.0, 20.0));
}

#[test]
fn boxes_stay_inside_ancestor_clips() {
    let mut tree = SceneTree::with_root("root");
    let root = tree.root();
    let outer = tree.add(root, "outer", Frame::column()).unwrap();
    styled(&mut tree, outer, |s| {
        s.set_padding(Length::px(5.0));
        s.overflow = XY::splat(Overflow::Hidden);
        s.set_size(Length::px(80.0), Length::px(60.0));
    });
    let mut leaves = Vec::new();
    for i in 0..4 {
        let row = tree.add(outer, &format!("row{i}"), Frame::row()).unwrap();
        for j in 0..3 {
            let leaf = tree.add(row, &format!("leaf{j}"), Frame::new()).unwrap();
            styled(&mut tree, leaf, |s| {
                s.set_size(Length::px(30.0), Length::px(25.0));
            });
            leaves.push(leaf);
        }
    }

    run(&mut tree, Size::new(200.0, 200.0));

    let outer_g = tree.get(outer).unwrap().geom.clone();
    for (id, node) in tree.iter() {
        if id == root || id == outer {
            continue;
        }
        let parent = tree.get(tree.parent(id).unwrap()).unwrap();
        assert!(within(node.geom.content_bbox, parent.geom.content_bbox), "{}", node.name);
        assert!(within(node.geom.content_bbox, outer_g.content));
        assert!(within(node.geom.vis_bbox, node.geom.content_bbox));
    }
    // the overflowing rows are still laid out at full size
    let last = tree.get(*leaves.last().unwrap()).unwrap();
    assert_eq!(last.geom.actual, Size::new(30.0, 25.0));
}

#[test]
fn hidden_overflow_fits_children_and_gaps() {
    let mut tree = SceneTree::with_root("root");
    let root = tree.root();
    let row = tree.add(root, "row", Frame::row()).unwrap();
    styled(&mut tree, row, |s| {
        s.set_padding(Length::px(4.0));
        s.set_gap(Length::px(6.0));
        s.overflow.x = Overflow::Hidden;
        s.set_grow(1.0, 0.0);
    });
    let kids: Vec<WidgetId> = (0..3)
        .map(|i| {
            let id = tree.add(row, &format!("k{i}"), Frame::new()).unwrap();
            styled(&mut tree, id, |s| {
                s.set_min(Length::px(20.0), Length::px(10.0));
                s.set_grow(1.0, 0.0);
            });
            id
        })
        .collect();

    run(&mut tree, Size::new(150.0, 50.0));

    let container = tree.get(row).unwrap().geom.actual.width;
    let used: f32 = kids
        .iter()
        .map(|&k| tree.get(k).unwrap().geom.actual.width)
        .sum::<f32>()
        + 2.0 * 6.0
        + 2.0 * 4.0;
    assert!(used <= container + 0.01, "{used} > {container}");
    assert_eq!(container, 150.0);
}

#[test]
fn invisible_children_take_no_space() {
    let mut tree = SceneTree::with_root("root");
    let root = tree.root();
    let a = tree.add(root, "a", Frame::new()).unwrap();
    let b = tree.add(root, "b", Frame::new()).unwrap();
    for id in [a, b] {
        styled(&mut tree, id, |s| {
            s.set_size(Length::px(30.0), Length::px(10.0));
        });
    }
    tree.get_mut(a).unwrap().state.insert(StateFlags::HIDDEN);

    run(&mut tree, Size::new(100.0, 20.0));

    assert_eq!(tree.get(b).unwrap().geom.total_bbox.x(), 0.0);
    assert!(tree.get(a).unwrap().geom.vis_bbox.is_empty());
}
