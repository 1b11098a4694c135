use std::cell::{Cell, RefCell};
use std::rc::Rc;

use data_drive_core::{Callback, Listener, Notifier};

#[test]
fn notifier_calls_in_registration_order_with_payload() {
    let notifier: Notifier<&'static str> = Notifier::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let seen = Rc::clone(&seen);
        notifier.subscribe(move |payload: &&'static str| {
            seen.borrow_mut().push(format!("{tag}:{payload}"));
        });
    }
    notifier.notify(&"a1");
    assert_eq!(*seen.borrow(), vec!["first:a1", "second:a1", "third:a1"]);
}

#[test]
fn notifier_remove_by_identity_matrix() {
    let notifier: Notifier<()> = Notifier::new();
    let v1 = Rc::new(Cell::new(0));
    let v2 = Rc::new(Cell::new(0));
    let l1 = {
        let v1 = Rc::clone(&v1);
        notifier.subscribe(move |_| v1.set(v1.get() + 1))
    };
    {
        let v2 = Rc::clone(&v2);
        notifier.subscribe(move |_| v2.set(v2.get() + 1));
    }
    notifier.remove(&l1).notify(&());
    assert_eq!(v1.get(), 0);
    assert_eq!(v2.get(), 1);

    // Removing again is a no-op.
    notifier.remove(&l1).notify(&());
    assert_eq!(v2.get(), 2);
}

#[test]
fn notifier_add_during_notify_waits_for_next_call() {
    let notifier: Notifier<u32> = Notifier::new();
    let late_calls = Rc::new(Cell::new(0));
    let added = Rc::new(Cell::new(false));

    let late: Callback<u32> = {
        let late_calls = Rc::clone(&late_calls);
        Rc::new(move |_| late_calls.set(late_calls.get() + 1))
    };
    {
        let handle = notifier.clone();
        let added = Rc::clone(&added);
        notifier.subscribe(move |_| {
            if !added.get() {
                added.set(true);
                handle.add(Rc::clone(&late));
            }
        });
    }

    notifier.notify(&1);
    assert_eq!(late_calls.get(), 0);
    notifier.notify(&2);
    assert_eq!(late_calls.get(), 1);
}

#[test]
fn notifier_remove_during_notify_keeps_inflight_snapshot() {
    let notifier: Notifier<u32> = Notifier::new();
    let second_calls = Rc::new(Cell::new(0));

    let second: Callback<u32> = {
        let second_calls = Rc::clone(&second_calls);
        Rc::new(move |_| second_calls.set(second_calls.get() + 1))
    };
    {
        let handle = notifier.clone();
        let second = Rc::clone(&second);
        notifier.subscribe(move |_| {
            handle.remove(&second);
        });
    }
    notifier.add(second);

    notifier.notify(&1);
    assert_eq!(second_calls.get(), 1);
    notifier.notify(&2);
    assert_eq!(second_calls.get(), 1);
    assert_eq!(notifier.len(), 1);
}

#[test]
fn listener_receives_and_moves_between_sources() {
    let a: Notifier<i32> = Notifier::new();
    let b: Notifier<i32> = Notifier::new();
    let count = Rc::new(Cell::new(0));
    let received = Rc::new(Cell::new(0));

    let listener = {
        let count = Rc::clone(&count);
        let received = Rc::clone(&received);
        Listener::new(move |v: &i32| {
            count.set(count.get() + 1);
            received.set(*v);
        })
    };
    listener.listen(&a);
    listener.listen(&b);
    a.notify(&1);
    b.notify(&2);

    assert_eq!(count.get(), 1);
    assert_eq!(received.get(), 2);
    assert!(listener.is_listening());
    assert!(a.is_empty());
}

#[test]
fn listener_shutdown_detaches() {
    let source: Notifier<()> = Notifier::new();
    let count = Rc::new(Cell::new(0));
    let listener = {
        let count = Rc::clone(&count);
        Listener::new(move |_: &()| count.set(count.get() + 1))
    };
    listener.listen(&source);
    listener.shutdown();
    source.notify(&());

    assert_eq!(count.get(), 0);
    assert!(!listener.is_listening());
    assert!(source.is_empty());
}
