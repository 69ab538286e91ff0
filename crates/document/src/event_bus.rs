use callback::{DecodedPayload, Event, EventType};
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    pub struct SubscriptionId;
}

type Handler<C> = Box<dyn FnMut(&mut C, &Event, &DecodedPayload)>;

struct Subscription<C> {
    code: i32,
    handler: Handler<C>,
}

/// Routes engine callbacks to the handlers subscribed to their event type.
///
/// Handlers run in subscription order and receive the payload decoded once per
/// event. `C` is the state handlers mutate; the bus does not own it so handlers can
/// be registered before that state exists.
pub struct EventBus<C> {
    subscriptions: SlotMap<SubscriptionId, Subscription<C>>,
    order: Vec<SubscriptionId>,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> EventBus<C> {
    pub fn new() -> Self {
        Self {
            subscriptions: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, event_type: EventType, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut C, &Event, &DecodedPayload) + 'static,
    {
        self.subscribe_code(event_type.code(), handler)
    }

    /// Subscribes to a raw type code, including codes this build does not know.
    pub fn subscribe_code<F>(&mut self, code: i32, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut C, &Event, &DecodedPayload) + 'static,
    {
        let id = self.subscriptions.insert(Subscription {
            code,
            handler: Box::new(handler),
        });
        self.order.push(id);
        id
    }

    /// Returns false when `id` was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        if self.subscriptions.remove(id).is_none() {
            return false;
        }
        self.order.retain(|other| *other != id);
        true
    }

    pub fn unsubscribe_all(&mut self) {
        self.subscriptions.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn has_subscribers(&self, code: i32) -> bool {
        self.subscriptions
            .values()
            .any(|subscription| subscription.code == code)
    }

    /// Runs every handler subscribed to `event`'s type and returns how many ran.
    /// Events nobody listens to are not decoded.
    pub fn dispatch(&mut self, context: &mut C, event: &Event) -> usize {
        if !self.has_subscribers(event.code) {
            tracing::trace!("[document] no subscriber for {}", event.name());
            return 0;
        }
        let decoded = event.decode();
        let mut handled = 0;
        for id in &self.order {
            let Some(subscription) = self.subscriptions.get_mut(*id) else {
                continue;
            };
            if subscription.code != event.code {
                continue;
            }
            (subscription.handler)(context, event, &decoded);
            handled += 1;
        }
        handled
    }
}
