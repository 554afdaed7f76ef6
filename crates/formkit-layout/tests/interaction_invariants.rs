//! Property-style invariants for canvas gestures and structural edits.
//!
//! Random operation streams run against the public `Canvas` API; after every
//! step the tree must validate and every control must sit inside its
//! parent's content area.

use formkit_core::geometry::Point;
use formkit_layout::hit::Handle;
use formkit_layout::{Canvas, ControlId, ControlKind, ParentRef, Target};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state >> 11
    }

    fn range(&mut self, min: i32, max: i32) -> i32 {
        debug_assert!(min <= max);
        let span = u64::from((max - min) as u32) + 1;
        min + (self.next_u64() % span) as i32
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }
}

fn ids(canvas: &Canvas) -> Vec<ControlId> {
    canvas.tree().paint_order().to_vec()
}

fn assert_contained(canvas: &Canvas) {
    canvas.tree().validate().expect("tree must validate");
    for id in ids(canvas) {
        let rect = canvas.absolute_rect(id).expect("abs");
        let bounds = canvas.content_bounds(id).expect("bounds");
        assert!(
            bounds.contains_rect(&rect),
            "control {id} at {rect:?} escapes {bounds:?}"
        );
    }
}

/// A window with a handful of nested containers and leaves.
fn seeded_canvas(rng: &mut Lcg) -> Canvas {
    let mut canvas = Canvas::new();
    let kinds = [
        ControlKind::PlainContainer,
        ControlKind::TitledContainer,
        ControlKind::TabContainer,
        ControlKind::Button,
        ControlKind::Label,
        ControlKind::Checkbox,
        ControlKind::Slider,
    ];
    let area = canvas
        .container_content_rect(ParentRef::Root)
        .expect("root area");
    for _ in 0..10 {
        let kind = kinds[rng.choose_index(kinds.len())];
        let point = Point::new(
            rng.range(area.left(), area.right() - 1),
            rng.range(area.top(), area.bottom() - 1),
        );
        canvas.drop_control(kind, point).expect("drop");
    }
    canvas
}

fn drag(canvas: &mut Canvas, from: Point, to: Point) {
    canvas.pointer_down(from).expect("down");
    canvas.pointer_move(Point::new((from.x + to.x) / 2, (from.y + to.y) / 2));
    canvas.pointer_move(to);
    canvas.pointer_up(to).expect("up");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn gestures_preserve_containment(seed in any::<u64>(), steps in 1usize..30) {
        let mut rng = Lcg::new(seed);
        let mut canvas = seeded_canvas(&mut rng);
        assert_contained(&canvas);

        for _ in 0..steps {
            let all = ids(&canvas);
            let id = all[rng.choose_index(all.len())];
            let Some(abs) = canvas.absolute_rect(id) else { continue };
            canvas.select(Some(Target::Control(id))).expect("select");
            let to = Point::new(rng.range(-200, 1200), rng.range(-200, 1000));
            if rng.choose_index(2) == 0 {
                let handle = Handle::ORDER[rng.choose_index(Handle::ORDER.len())];
                drag(&mut canvas, handle.center(&abs), to);
            } else {
                drag(&mut canvas, abs.center(), to);
            }
            prop_assert!(canvas.state().is_idle());
            assert_contained(&canvas);
            if let Some(rect) = canvas.absolute_rect(id) {
                prop_assert!(rect.width >= 0 && rect.height >= 0);
            }
        }
    }

    #[test]
    fn reparents_never_create_cycles(seed in any::<u64>(), steps in 1usize..40) {
        let mut rng = Lcg::new(seed);
        let mut canvas = seeded_canvas(&mut rng);

        for _ in 0..steps {
            let all = ids(&canvas);
            let id = all[rng.choose_index(all.len())];
            let target = all[rng.choose_index(all.len())];
            let parent = if rng.choose_index(4) == 0 {
                ParentRef::Root
            } else {
                ParentRef::Control(target)
            };
            let allowed = canvas.reparent_candidates(id).expect("candidates").contains(&parent);
            let result = canvas.request_reparent(id, parent);
            prop_assert_eq!(result.is_ok(), allowed);
            if allowed {
                prop_assert_eq!(canvas.tree().parent_of(id), Some(parent));
                // Reparented subtree is painted on top.
                let mut subtree = canvas.tree().descendants(id);
                subtree.push(id);
                subtree.sort_unstable();
                let order = canvas.tree().paint_order();
                let mut top = order[order.len() - subtree.len()..].to_vec();
                top.sort_unstable();
                prop_assert_eq!(top, subtree);
            }
            assert_contained(&canvas);
        }
    }

    #[test]
    fn delete_cascades_and_keeps_tree_valid(seed in any::<u64>()) {
        let mut rng = Lcg::new(seed);
        let mut canvas = seeded_canvas(&mut rng);
        while !canvas.tree().is_empty() {
            let all = ids(&canvas);
            let id = all[rng.choose_index(all.len())];
            let mut expected = canvas.tree().descendants(id);
            expected.insert(0, id);
            let mut removed = canvas.request_delete(id).expect("delete");
            expected.sort_unstable();
            removed.sort_unstable();
            prop_assert_eq!(removed, expected);
            canvas.tree().validate().expect("valid");
        }
    }
}

#[test]
fn most_recent_control_wins_overlap() {
    let mut canvas = Canvas::new();
    let center = canvas
        .container_content_rect(ParentRef::Root)
        .expect("area")
        .center();
    let first = canvas.drop_control(ControlKind::Button, center).expect("first");
    let second = canvas.drop_control(ControlKind::Label, center).expect("second");
    canvas.select(None).expect("deselect");

    canvas.pointer_down(center).expect("down");
    assert_eq!(canvas.selection(), Some(Target::Control(second)));
    canvas.pointer_up(center).expect("up");

    // Reparenting to the root again raises `first` above `second`.
    canvas
        .request_reparent(first, ParentRef::Root)
        .expect("reparent");
    canvas.select(None).expect("deselect");
    canvas.pointer_down(center).expect("down");
    assert_eq!(canvas.selection(), Some(Target::Control(first)));
}

#[test]
fn hidden_container_hides_children_from_hit_testing() {
    let mut canvas = Canvas::new();
    let area = canvas.container_content_rect(ParentRef::Root).expect("area");
    let group = canvas
        .drop_control(ControlKind::PlainContainer, area.center())
        .expect("group");
    let inner_area = canvas
        .container_content_rect(ParentRef::Control(group))
        .expect("inner");
    let button = canvas
        .drop_control(ControlKind::Button, inner_area.center())
        .expect("button");
    assert_eq!(canvas.tree().parent_of(button), Some(ParentRef::Control(group)));

    canvas
        .set_attribute(group, formkit_layout::AttrKey::Visible, false)
        .expect("hide");
    canvas.select(None).expect("deselect");
    canvas.pointer_down(inner_area.center()).expect("down");
    assert_eq!(canvas.selection(), Some(Target::MainWindow));
}
