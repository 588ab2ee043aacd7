use std::cell::RefCell;
use std::rc::Rc;

use super::*;

type Callback = dyn FnMut(&mut Vec<String>);

fn recorder(label: &'static str) -> Rc<RefCell<Callback>> {
    Rc::new(RefCell::new(move |log: &mut Vec<String>| log.push(label.to_owned())))
}

fn invoke_all(registry: &Registry<Callback>) -> Vec<String> {
    let mut log = Vec::new();
    for cb in registry.snapshot() {
        let mut cb = cb.borrow_mut();
        (&mut *cb)(&mut log);
    }
    log
}

#[test]
fn register_adds_entry() {
    let registry: Registry<Callback> = Registry::new();
    let _sub = registry.register("a", 0, recorder("a"));
    assert_eq!(registry.len(), 1);
    assert!(registry.contains("a"));
}

#[test]
fn reregistering_same_key_replaces_callback() {
    let registry: Registry<Callback> = Registry::new();
    let _first = registry.register("layer", 0, recorder("first"));
    let _second = registry.register("layer", 0, recorder("second"));

    assert_eq!(registry.len(), 1);
    assert_eq!(invoke_all(&registry), vec!["second"]);
}

#[test]
fn snapshot_orders_by_descending_depth() {
    let registry: Registry<Callback> = Registry::new();
    let _low = registry.register("low", -5, recorder("low"));
    let _high = registry.register("high", 10, recorder("high"));
    let _mid = registry.register("mid", 0, recorder("mid"));

    assert_eq!(invoke_all(&registry), vec!["high", "mid", "low"]);
    assert_eq!(registry.keys(), vec!["high", "mid", "low"]);
}

#[test]
fn equal_depth_keeps_registration_order() {
    let registry: Registry<Callback> = Registry::new();
    let _a = registry.register("a", 1, recorder("a"));
    let _b = registry.register("b", 1, recorder("b"));
    let _c = registry.register("c", 1, recorder("c"));
    assert_eq!(invoke_all(&registry), vec!["a", "b", "c"]);
}

#[test]
fn dropping_subscription_unregisters() {
    let registry: Registry<Callback> = Registry::new();
    let sub = registry.register("a", 0, recorder("a"));
    drop(sub);
    assert!(registry.is_empty());
}

#[test]
fn dropping_replaced_subscription_keeps_newer_entry() {
    let registry: Registry<Callback> = Registry::new();
    let first = registry.register("layer", 0, recorder("first"));
    let _second = registry.register("layer", 0, recorder("second"));
    drop(first);

    assert_eq!(registry.len(), 1);
    assert_eq!(invoke_all(&registry), vec!["second"]);
}

#[test]
fn subscription_outliving_registry_drops_cleanly() {
    let registry: Registry<Callback> = Registry::new();
    let sub = registry.register("a", 0, recorder("a"));
    drop(registry);
    assert_eq!(sub.key(), "a");
    drop(sub);
}

#[test]
fn callback_can_register_during_snapshot_invocation() {
    let registry: Rc<Registry<Callback>> = Rc::new(Registry::new());
    let held: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

    let reg = Rc::clone(&registry);
    let held_inner = Rc::clone(&held);
    let cb: Rc<RefCell<Callback>> = Rc::new(RefCell::new(move |log: &mut Vec<String>| {
        log.push("outer".to_owned());
        held_inner.borrow_mut().push(reg.register("late", 0, recorder("late")));
    }));
    let _outer = registry.register("outer", 0, cb);

    assert_eq!(invoke_all(&registry), vec!["outer"]);
    assert!(registry.contains("late"));
}
