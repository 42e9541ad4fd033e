//! Ordered listener lists for lifecycle and layout events.
//!
//! Listeners run in registration order. There is no isolation between them:
//! a failing layout listener stops the remaining ones for that frame.

use crate::error::LayoutError;

/// Event a listener is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// After a successful initialization.
    Initialize,
    /// At the start of deinitialization, before resources are released.
    Deinitialize,
    /// Once per frame, between frame start and frame end.
    Layout,
}

/// Token returned on registration, used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken {
    kind: ListenerKind,
    id: u64,
}

impl ListenerToken {
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }
}

/// Listener for initialize/deinitialize events.
pub type LifecycleCallback = Box<dyn FnMut(&egui::Context)>;

/// Listener producing the frame's UI.
pub type LayoutCallback = Box<dyn FnMut(&egui::Context) -> Result<(), LayoutError>>;

/// Ordered list of listeners for one event kind.
pub struct CallbackList<F: ?Sized> {
    kind: ListenerKind,
    entries: Vec<(u64, Box<F>)>,
    next_id: u64,
}

impl<F: ?Sized> CallbackList<F> {
    pub fn new(kind: ListenerKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Append a listener.
    pub fn register(&mut self, callback: Box<F>) -> ListenerToken {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, callback));
        ListenerToken {
            kind: self.kind,
            id,
        }
    }

    /// Remove a listener. Returns `false` for tokens of another list or
    /// listeners that were already removed.
    pub fn unregister(&mut self, token: ListenerToken) -> bool {
        if token.kind != self.kind {
            return false;
        }
        let before = self.entries.len();
        self.entries.retain(|(id, _)| *id != token.id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Listeners in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<F>> {
        self.entries.iter_mut().map(|(_, callback)| callback)
    }
}

impl CallbackList<dyn FnMut(&egui::Context)> {
    /// Invoke every listener.
    pub fn invoke(&mut self, ctx: &egui::Context) {
        for callback in self.iter_mut() {
            callback(ctx);
        }
    }
}

impl CallbackList<dyn FnMut(&egui::Context) -> Result<(), LayoutError>> {
    /// Invoke listeners until one fails.
    pub fn try_invoke(&mut self, ctx: &egui::Context) -> Result<(), LayoutError> {
        self.iter_mut().try_for_each(|callback| callback(ctx))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_invocation_follows_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut list: CallbackList<dyn FnMut(&egui::Context)> =
            CallbackList::new(ListenerKind::Initialize);

        for i in 0..3 {
            let order = order.clone();
            list.register(Box::new(move |_| order.borrow_mut().push(i)));
        }

        list.invoke(&egui::Context::default());
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unregister_by_token() {
        let mut list: CallbackList<dyn FnMut(&egui::Context)> =
            CallbackList::new(ListenerKind::Deinitialize);
        let first = list.register(Box::new(|_| {}));
        let _second = list.register(Box::new(|_| {}));

        assert!(list.unregister(first));
        assert!(!list.unregister(first));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_token_of_other_kind_is_rejected() {
        let mut init: CallbackList<dyn FnMut(&egui::Context)> =
            CallbackList::new(ListenerKind::Initialize);
        let mut deinit: CallbackList<dyn FnMut(&egui::Context)> =
            CallbackList::new(ListenerKind::Deinitialize);
        let token = init.register(Box::new(|_| {}));
        deinit.register(Box::new(|_| {}));

        assert_eq!(token.kind(), ListenerKind::Initialize);
        assert!(!deinit.unregister(token));
        assert_eq!(deinit.len(), 1);
    }

    #[test]
    fn test_failing_layout_stops_later_listeners() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let mut list: CallbackList<dyn FnMut(&egui::Context) -> Result<(), LayoutError>> =
            CallbackList::new(ListenerKind::Layout);

        let first = ran.clone();
        list.register(Box::new(move |_| {
            first.borrow_mut().push("first");
            Err("broken".into())
        }));
        let second = ran.clone();
        list.register(Box::new(move |_| {
            second.borrow_mut().push("second");
            Ok(())
        }));

        assert!(list.try_invoke(&egui::Context::default()).is_err());
        assert_eq!(*ran.borrow(), vec!["first"]);
    }
}
