#![allow(clippy::float_cmp)]

use std::cell::RefCell;

use super::*;
use crate::camera::Point;
use crate::debounce::ManualClock;
use crate::doc::{ObjectPatch, SceneObject};
use crate::engine::EngineConfig;
use crate::input::{Button, Modifiers, Tool};

#[derive(Default)]
struct Recorder {
    saves: RefCell<Vec<(String, SavePayload)>>,
}

impl DocumentBackend for Recorder {
    fn save(&self, doc_id: &str, payload: SavePayload) {
        self.saves.borrow_mut().push((doc_id.to_owned(), payload));
    }
}

struct Fixture {
    engine: EngineCore,
    clock: ManualClock,
    recorder: Rc<Recorder>,
    bridge: PersistenceBridge,
}

fn open(doc_id: &str) -> Fixture {
    let clock = ManualClock::new(1_000_000.0);
    let mut engine = EngineCore::with_clock(EngineConfig::default(), Box::new(clock.clone()));
    engine.mount(800.0, 600.0).unwrap();
    let recorder = Rc::new(Recorder::default());
    let backend: Rc<dyn DocumentBackend> = recorder.clone();
    let bridge = PersistenceBridge::open(&mut engine.store, doc_id, backend, Box::new(clock.clone()));
    Fixture { engine, clock, recorder, bridge }
}

fn document(id: &str, objects: &[&str]) -> Document {
    let mut doc = Document::draft(0);
    doc.id = id.to_owned();
    for (i, obj) in objects.iter().enumerate() {
        let offset = f64::from(u32::try_from(i).unwrap()) * 10.0;
        doc.pages[0].objects.push(SceneObject::rectangle((*obj).into(), offset, offset, 20.0, 20.0));
    }
    doc
}

// =============================================================
// Hydration
// =============================================================

#[test]
fn hydrate_replaces_pages_once() {
    let mut f = open("doc-1");
    assert!(!f.bridge.hydrate(&mut f.engine, document("doc-1", &["a", "b"])).is_empty());
    assert!(f.bridge.is_hydrated());
    assert_eq!(f.engine.store.objects().len(), 2);
    assert_eq!(f.engine.surface.drawables().len(), 2);

    f.engine.update_object("a", &ObjectPatch::position(99.0, 99.0));
    assert!(f.bridge.hydrate(&mut f.engine, document("doc-1", &["z"])).is_empty());
    assert_eq!(f.engine.object("a").unwrap().left, 99.0);
    assert!(f.engine.object("z").is_none());
}

#[test]
fn hydrate_does_not_trigger_a_save() {
    let mut f = open("doc-1");
    f.bridge.hydrate(&mut f.engine, document("doc-1", &["a"]));
    f.clock.advance(5_000.0);
    assert!(!f.engine.tick());
    assert!(f.recorder.saves.borrow().is_empty());
}

#[test]
fn hydrate_rejects_other_document() {
    let mut f = open("doc-1");
    assert!(f.bridge.hydrate(&mut f.engine, document("doc-2", &["a"])).is_empty());
    assert!(!f.bridge.is_hydrated());
    assert!(f.engine.store.objects().is_empty());
}

#[test]
fn hydrate_with_no_pages_gets_a_blank_page() {
    let mut f = open("doc-1");
    let mut doc = document("doc-1", &[]);
    doc.pages.clear();
    f.bridge.hydrate(&mut f.engine, doc);
    assert_eq!(f.engine.store.pages().len(), 1);
    assert_eq!(f.engine.store.pages()[0].name, "Page 1");
}

// =============================================================
// Saving
// =============================================================

#[test]
fn debounced_change_saves_current_pages() {
    let mut f = open("doc-1");
    f.bridge.hydrate(&mut f.engine, document("doc-1", &["a"]));

    f.engine.update_object("a", &ObjectPatch::position(1.0, 1.0));
    f.clock.advance(300.0);
    f.engine.update_object("a", &ObjectPatch::position(2.0, 2.0));
    f.clock.advance(999.0);
    assert!(!f.engine.tick());
    f.clock.advance(1.0);
    assert!(f.engine.tick());

    let saves = f.recorder.saves.borrow();
    assert_eq!(saves.len(), 1);
    let (doc_id, payload) = &saves[0];
    assert_eq!(doc_id, "doc-1");
    assert_eq!(payload.pages[0].objects[0].left, 2.0);
    assert_eq!(payload.updated_at, 1_001_300);
}

#[test]
fn edits_during_inflight_save_schedule_another() {
    let mut f = open("doc-1");
    f.engine.set_tool(Tool::Rectangle);
    f.engine.on_pointer_down(Point::new(10.0, 10.0), Button::Primary, Modifiers::default());
    f.engine.on_pointer_up(Point::new(10.0, 10.0), Button::Primary, Modifiers::default());
    f.clock.advance(1_000.0);
    assert!(f.engine.tick());

    let id = f.engine.store.objects()[0].id.clone();
    f.engine.update_object(&id, &ObjectPatch::position(0.0, 0.0));
    f.clock.advance(1_000.0);
    assert!(f.engine.tick());
    assert_eq!(f.recorder.saves.borrow().len(), 2);
}

#[test]
fn payload_uses_camel_case() {
    let payload = SavePayload { pages: Vec::new(), updated_at: 42 };
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json, serde_json::json!({ "pages": [], "updatedAt": 42 }));
}

// =============================================================
// Close
// =============================================================

#[test]
fn close_cancels_pending_and_unsubscribes() {
    let mut f = open("doc-1");
    f.bridge.hydrate(&mut f.engine, document("doc-1", &["a"]));
    f.engine.update_object("a", &ObjectPatch::position(5.0, 5.0));

    f.bridge.close(&mut f.engine.store);
    assert!(!f.bridge.is_open());
    assert!(!f.engine.store.has_pending_save());

    f.engine.update_object("a", &ObjectPatch::position(6.0, 6.0));
    f.clock.advance(2_000.0);
    assert!(f.engine.tick());
    assert!(f.recorder.saves.borrow().is_empty());

    f.bridge.close(&mut f.engine.store);
    assert!(f.bridge.hydrate(&mut f.engine, document("doc-1", &["b"])).is_empty());
}
