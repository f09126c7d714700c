// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

/*!
Process-wide services shared by every widget.

The services are created once with [`init`] and handed to each widget, which
registers its render-core channel so that process-wide events (such as a change of
the installed plugins) can be broadcast to every live render core. [`Services::teardown`]
drops all registrations and refuses new ones.
*/

use crate::render_core::CoreMessage;
use alloc::sync::Arc;
use crossbeam_channel::Sender;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Error returned by the process-wide services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Error, derive_more::Display)]
#[non_exhaustive]
pub enum ServiceError {
    /// [`init`] was already called in this process.
    #[display("The web view services are already initialized")]
    AlreadyInitialized,
    /// [`Services::teardown`] was called.
    #[display("The web view services were torn down")]
    TornDown,
}

struct Entry {
    /// Distinguishes registrations that reuse a slab slot.
    id: u64,
    sender: Sender<CoreMessage>,
}

enum State {
    Running { entries: slab::Slab<Entry>, next_id: u64 },
    TornDown,
}

pub struct Services {
    state: Mutex<State>,
}

static GLOBAL_SERVICES: OnceLock<Arc<Services>> = OnceLock::new();

/// Create the process-wide services. Can only succeed once per process.
pub fn init() -> Result<Arc<Services>, ServiceError> {
    let services = Arc::new(Services::new());
    GLOBAL_SERVICES.set(services.clone()).map_err(|_| ServiceError::AlreadyInitialized)?;
    Ok(services)
}

/// The services created by [`init`], if any.
pub fn global() -> Option<Arc<Services>> {
    GLOBAL_SERVICES.get().cloned()
}

impl Default for Services {
    fn default() -> Self {
        Self::new()
    }
}

impl Services {
    /// A standalone instance, not reachable through [`global`].
    pub fn new() -> Self {
        Self { state: Mutex::new(State::Running { entries: slab::Slab::new(), next_id: 0 }) }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `sender` to the broadcast list until the returned guard is dropped.
    pub fn register(self: &Arc<Self>, sender: Sender<CoreMessage>) -> Result<Registration, ServiceError> {
        match &mut *self.lock() {
            State::Running { entries, next_id } => {
                *next_id += 1;
                let id = *next_id;
                let key = entries.insert(Entry { id, sender });
                Ok(Registration { services: Arc::downgrade(self), key, id })
            }
            State::TornDown => Err(ServiceError::TornDown),
        }
    }

    /// Number of live registrations.
    pub fn registered(&self) -> usize {
        match &*self.lock() {
            State::Running { entries, .. } => entries.len(),
            State::TornDown => 0,
        }
    }

    /// Tell every registered render core that the set of plugins changed.
    /// Returns how many were notified.
    pub fn notify_plugins_changed(&self) -> usize {
        let mut state = self.lock();
        let State::Running { entries, .. } = &mut *state else { return 0 };
        let mut notified = 0;
        entries.retain(|key, entry| {
            if entry.sender.send(CoreMessage::PluginsChanged).is_ok() {
                notified += 1;
                true
            } else {
                log::debug!("Dropping registration {key}: render core is gone");
                false
            }
        });
        notified
    }

    /// Drop every registration. Further registrations fail with [`ServiceError::TornDown`].
    pub fn teardown(&self) {
        *self.lock() = State::TornDown;
    }

    pub fn is_torn_down(&self) -> bool {
        matches!(&*self.lock(), State::TornDown)
    }

    fn unregister(&self, key: usize, id: u64) {
        if let State::Running { entries, .. } = &mut *self.lock() {
            if entries.get(key).is_some_and(|entry| entry.id == id) {
                entries.remove(key);
            }
        }
    }
}

/// Keeps a widget registered with the [`Services`]. Unregisters when dropped.
pub struct Registration {
    services: alloc::sync::Weak<Services>,
    key: usize,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(services) = self.services.upgrade() {
            services.unregister(self.key, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_registered_channels() {
        let services = Arc::new(Services::new());
        let (a_sender, a_receiver) = crossbeam_channel::unbounded();
        let (b_sender, b_receiver) = crossbeam_channel::unbounded();
        let a = services.register(a_sender).unwrap();
        let b = services.register(b_sender).unwrap();
        assert_eq!(services.registered(), 2);

        assert_eq!(services.notify_plugins_changed(), 2);
        assert_eq!(a_receiver.try_recv(), Ok(CoreMessage::PluginsChanged));
        assert_eq!(b_receiver.try_recv(), Ok(CoreMessage::PluginsChanged));

        drop(a);
        assert_eq!(services.registered(), 1);
        assert_eq!(services.notify_plugins_changed(), 1);
        assert!(a_receiver.try_recv().is_err());
        drop(b);
        assert_eq!(services.registered(), 0);
    }

    #[test]
    fn dead_receivers_are_pruned() {
        let services = Arc::new(Services::new());
        let (sender, receiver) = crossbeam_channel::unbounded();
        let _registration = services.register(sender).unwrap();
        drop(receiver);
        assert_eq!(services.notify_plugins_changed(), 0);
        assert_eq!(services.registered(), 0);
    }

    #[test]
    fn stale_guard_keeps_reused_slot() {
        let services = Arc::new(Services::new());
        let (dead_sender, dead_receiver) = crossbeam_channel::unbounded();
        let stale = services.register(dead_sender).unwrap();
        drop(dead_receiver);
        services.notify_plugins_changed();
        let (sender, receiver) = crossbeam_channel::unbounded();
        let _live = services.register(sender).unwrap();
        drop(stale);
        assert_eq!(services.notify_plugins_changed(), 1);
        assert_eq!(receiver.try_recv(), Ok(CoreMessage::PluginsChanged));
    }

    #[test]
    fn teardown_refuses_registrations() {
        let services = Arc::new(Services::new());
        let (sender, _receiver) = crossbeam_channel::unbounded();
        let registration = services.register(sender.clone()).unwrap();
        services.teardown();
        assert!(services.is_torn_down());
        assert_eq!(services.register(sender).err(), Some(ServiceError::TornDown));
        assert_eq!(services.notify_plugins_changed(), 0);
        // Dropping a registration after teardown is fine.
        drop(registration);
    }

    #[test]
    fn init_once() {
        let services = init().unwrap();
        assert!(Arc::ptr_eq(&services, &global().unwrap()));
        assert_eq!(init().err(), Some(ServiceError::AlreadyInitialized));
    }
}
