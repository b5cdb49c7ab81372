//! Minimal push-based reactivity for exercising the renderer's effects.
//!
//! Signals remember which effects read them and re-run those effects
//! synchronously on `set`. There is no batching, no disposal and no glitch
//! protection; tests only need "writes show up in the DOM".

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use template::{Runtime, Value};

struct Effect {
    run: RefCell<Box<dyn FnMut()>>,
}

thread_local! {
    /// Innermost tracking scope last. `None` marks an untracked region.
    static OBSERVERS: RefCell<Vec<Option<Rc<Effect>>>> = const { RefCell::new(Vec::new()) };
}

fn current_observer() -> Option<Rc<Effect>> {
    OBSERVERS.with(|stack| stack.borrow().last().cloned().flatten())
}

fn with_observer(observer: Option<Rc<Effect>>, f: impl FnOnce()) {
    OBSERVERS.with(|stack| stack.borrow_mut().push(observer));
    f();
    OBSERVERS.with(|stack| stack.borrow_mut().pop());
}

impl Effect {
    fn execute(self: &Rc<Self>) {
        // An effect that writes a signal it reads would re-enter itself.
        let Ok(mut run) = self.run.try_borrow_mut() else {
            log::warn!(target: "template_test_support", "skipping re-entrant effect run");
            return;
        };
        with_observer(Some(self.clone()), || (&mut **run)());
    }
}

/// `Runtime` backed by `Signal` dependency tracking.
#[derive(Default)]
pub struct SignalRuntime {
    effects: Cell<usize>,
}

impl SignalRuntime {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Number of effects registered so far.
    pub fn effect_count(&self) -> usize {
        self.effects.get()
    }
}

impl Runtime for SignalRuntime {
    fn effect(&self, f: Box<dyn FnMut()>) {
        self.effects.set(self.effects.get() + 1);
        let effect = Rc::new(Effect {
            run: RefCell::new(f),
        });
        effect.execute();
    }

    fn untracked(&self, f: &mut dyn FnMut()) {
        with_observer(None, f);
    }
}

struct SignalState<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Rc<Effect>>>,
}

/// Observable cell. Clones share state.
pub struct Signal<T> {
    state: Rc<SignalState<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: Rc::new(SignalState {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Reads the value, subscribing the running effect if any.
    pub fn get(&self) -> T {
        if let Some(observer) = current_observer() {
            let mut subscribers = self.state.subscribers.borrow_mut();
            if !subscribers.iter().any(|s| Rc::ptr_eq(s, &observer)) {
                subscribers.push(observer);
            }
        }
        self.state.value.borrow().clone()
    }

    /// Reads without subscribing.
    pub fn peek(&self) -> T {
        self.state.value.borrow().clone()
    }

    /// Stores `value` and re-runs every subscribed effect.
    pub fn set(&self, value: T) {
        *self.state.value.borrow_mut() = value;
        let subscribers = self.state.subscribers.borrow().clone();
        for effect in subscribers {
            effect.execute();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.subscribers.borrow().len()
    }

    /// Reader value for template holes.
    pub fn reader<N>(&self) -> Value<N>
    where
        T: Into<Value<N>>,
        N: 'static,
    {
        let signal = self.clone();
        Value::reactive(move || signal.get().into())
    }
}
