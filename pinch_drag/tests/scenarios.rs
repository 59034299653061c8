//! End-to-end gesture scenarios over synthetic landmark sequences.

use hand_geometry::landmarks::{INDEX_TIP, MIDDLE_TIP, THUMB_TIP};
use hand_geometry::{HandFrame, Landmark, Point, Size};
use pinch_drag::{DragEvent, DragResolver, DragTarget, PinchDetector, TargetId, TieBreak};

/// Index and middle tips `spread` px apart, centred on `grip`.
fn hand(grip: Point, spread: i32) -> HandFrame {
    HandFrame::new(vec![
        Landmark::new(THUMB_TIP,  grip.x - 60,             grip.y + 40),
        Landmark::new(INDEX_TIP,  grip.x - spread / 2,     grip.y),
        Landmark::new(MIDDLE_TIP, grip.x + spread - spread / 2, grip.y),
    ])
}

fn five_boxes() -> DragResolver {
    let targets = [(200, 200), (500, 200), (800, 200), (300, 500), (700, 500)]
        .iter()
        .map(|&c| DragTarget::new(c.into(), Size::new(150, 150)))
        .collect();
    DragResolver::new(targets, PinchDetector::new(35.0, 5).unwrap())
}

#[test]
fn grab_move_release_scenario() {
    let mut r = DragResolver::new(
        vec![DragTarget::new(Point::new(200, 200), Size::new(150, 150))],
        PinchDetector::new(35.0, 5).unwrap(),
    );

    let at_center = hand(Point::new(200, 200), 10);
    for frame in 1..=5 {
        let rep = r.step(Some(&at_center));
        if frame < 5 {
            assert_eq!(rep.event, None, "frame {}", frame);
            assert!(!r.targets()[0].is_dragging());
        } else {
            assert_eq!(rep.event, Some(DragEvent::Grabbed { target: TargetId::from_index(0), offset: Point::new(0, 0) }));
            assert_eq!(rep.lock, Some(TargetId::from_index(0)));
        }
    }

    let offset = r.targets()[0].drag_offset();
    let moved = hand(Point::new(250, 220), 10);
    for _ in 0..3 {
        r.step(Some(&moved));
        assert_eq!(r.targets()[0].center(), Point::new(250, 220) + offset);
    }

    // Hand leaves the frame mid-drag: nothing is released.
    for _ in 0..20 {
        let rep = r.step(None);
        assert_eq!(rep.lock, Some(TargetId::from_index(0)));
    }
    assert!(r.targets()[0].is_dragging());

    let apart = hand(Point::new(250, 220), 80);
    let events: Vec<_> = (0..5).filter_map(|_| r.step(Some(&apart)).event).collect();
    assert_eq!(events, vec![DragEvent::Dropped { target: TargetId::from_index(0), center: Point::new(250, 220) }]);
    assert!(!r.is_locked());
}

#[test]
fn second_box_can_be_grabbed_after_drop() {
    let mut r = five_boxes();
    let on_first = hand(Point::new(200, 200), 10);
    for _ in 0..5 { r.step(Some(&on_first)); }
    assert_eq!(r.lock(), Some(TargetId::from_index(0)));

    let open = hand(Point::new(200, 200), 100);
    for _ in 0..5 { r.step(Some(&open)); }
    assert_eq!(r.lock(), None);

    let on_third = hand(Point::new(800, 200), 10);
    for _ in 0..5 { r.step(Some(&on_third)); }
    assert_eq!(r.lock(), Some(TargetId::from_index(2)));
}

/// Small deterministic LCG so the sweep is reproducible without extra crates.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }
    fn below(&mut self, n: u32) -> i32 { (self.next() % n) as i32 }
}

#[test]
fn at_most_one_target_ever_drags() {
    for policy in [TieBreak::ListOrder, TieBreak::NearestCenter] {
        let mut r = five_boxes().with_tie_break(policy);
        let mut rng = Lcg(0x5eed);
        let mut grip = Point::new(400, 300);

        for _ in 0..5_000 {
            let frame = match rng.below(10) {
                0 => None,
                _ => {
                    grip = Point::new(
                        (grip.x + rng.below(61) - 30).clamp(0, 1279),
                        (grip.y + rng.below(61) - 30).clamp(0, 719),
                    );
                    let spread = if rng.below(3) == 0 { 90 } else { 12 };
                    Some(hand(grip, spread))
                }
            };
            let rep = r.step(frame.as_ref());

            let dragging: Vec<usize> = r.targets().iter()
                .enumerate()
                .filter(|(_, t)| t.is_dragging())
                .map(|(i, _)| i)
                .collect();
            assert!(dragging.len() <= 1);
            assert_eq!(rep.lock.map(|id| id.index()), dragging.first().copied());
        }
    }
}

#[test]
fn no_hand_frames_never_release() {
    let mut r = five_boxes();
    let grab = hand(Point::new(300, 500), 10);
    for _ in 0..5 { r.step(Some(&grab)); }
    let before = r.targets()[3].clone();
    for _ in 0..100 {
        assert_eq!(r.step(None).event, None);
    }
    assert_eq!(r.targets()[3], before);
    assert_eq!(r.lock(), Some(TargetId::from_index(3)));
}
