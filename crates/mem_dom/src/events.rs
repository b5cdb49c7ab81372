use crate::{Document, NodeId};
use template::value::{Event, Handler};

impl Document {
    /// Dispatches `event` at `target` and bubbles it through the ancestors.
    ///
    /// Handlers for each node are collected before any runs, so a handler may
    /// mutate the tree freely. Returns the number of handlers invoked.
    pub fn dispatch(&self, target: NodeId, event: &str) -> usize {
        let mut path = vec![target];
        {
            let arena = self.arena();
            let mut current = target;
            while let Some(parent) = arena.node(current).parent {
                path.push(parent);
                current = parent;
            }
        }

        let mut invoked = 0;
        for node in path {
            let handlers: Vec<Handler<NodeId>> = {
                let arena = self.arena();
                match arena.element(node) {
                    Some(element) => element
                        .listeners
                        .iter()
                        .filter(|l| l.event == event)
                        .map(|l| l.handler.clone())
                        .collect(),
                    None => continue,
                }
            };
            let payload = Event {
                name: event.to_string(),
                target,
                current_target: node,
            };
            for handler in handlers {
                handler(&payload);
                invoked += 1;
            }
        }
        log::trace!(target: "mem_dom", "dispatched {event} at {target}: {invoked} handler(s)");
        invoked
    }
}
