// ============================================================================
// REACTIVITY - Sistema de notificaciones/subscribers para reactividad
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

type Callback = Rc<dyn Fn()>;

pub type SubscriptionId = usize;

/// Estado reactivo con sistema de notificaciones.
/// Los clones comparten valor y subscribers (misma celda).
pub struct ReactiveState<T> {
    value: Rc<RefCell<T>>,
    subscribers: Rc<RefCell<Vec<(SubscriptionId, Callback)>>>,
    next_id: Rc<RefCell<SubscriptionId>>,
}

impl<T> ReactiveState<T> {
    /// Crear nuevo estado reactivo
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            subscribers: Rc::new(RefCell::new(Vec::new())),
            next_id: Rc::new(RefCell::new(0)),
        }
    }

    /// Leer el valor actual (clonado)
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// Leer a través de un closure sin clonar
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Establecer nuevo valor y notificar subscribers
    pub fn set(&self, new_value: T) {
        *self.value.borrow_mut() = new_value;
        self.notify();
    }

    /// Actualizar valor usando closure y notificar
    pub fn update<F>(&self, updater: F)
    where
        F: FnOnce(&mut T),
    {
        updater(&mut *self.value.borrow_mut());
        self.notify();
    }

    /// Suscribirse a cambios; devuelve un id para darse de baja
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + 'static,
    {
        let id = {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            *next
        };
        self.subscribers.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    /// Darse de baja de las notificaciones
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    /// Notificar a todos los subscribers
    // Los callbacks se clonan antes de invocarse: un subscriber puede volver
    // a leer (o darse de baja) sin chocar con el borrow de la lista.
    fn notify(&self) {
        let callbacks: Vec<Callback> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in callbacks {
            (*callback)();
        }
    }
}

impl<T> Clone for ReactiveState<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            subscribers: self.subscribers.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn set_notifies_subscribers() {
        let state = ReactiveState::new(0u32);
        let hits = Rc::new(Cell::new(0));
        let hits_inner = hits.clone();
        state.subscribe(move || hits_inner.set(hits_inner.get() + 1));

        state.set(1);
        state.update(|v| *v += 1);

        assert_eq!(state.get(), 2);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let state = ReactiveState::new(0u32);
        let hits = Rc::new(Cell::new(0));
        let hits_inner = hits.clone();
        let id = state.subscribe(move || hits_inner.set(hits_inner.get() + 1));

        state.set(1);
        state.unsubscribe(id);
        state.set(2);

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn clones_share_the_same_cell() {
        let state = ReactiveState::new(0u32);
        let clone = state.clone();
        let hits = Rc::new(Cell::new(0));
        let hits_inner = hits.clone();
        clone.subscribe(move || hits_inner.set(hits_inner.get() + 1));

        state.set(7);

        assert_eq!(clone.get(), 7);
        assert_eq!(hits.get(), 1);
    }
}
