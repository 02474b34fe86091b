use crate::model::client::{Client, ClientId};

/// The live set of relay connections.
///
/// Owned by the relay loop, which is the only place it is mutated, so no
/// locking is involved.
#[derive(Debug, Default)]
pub struct Registry {
    clients: Vec<Client>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn register(&mut self, client: Client) {
        self.clients.push(client);
    }

    /// Remove a client by id. Removing an absent client is a no-op and
    /// returns `None`.
    pub fn unregister(&mut self, id: ClientId) -> Option<Client> {
        let index = self.clients.iter().position(|c| c.id == id)?;
        Some(self.clients.swap_remove(index))
    }

    /// Current membership. Order is unspecified.
    pub fn all(&self) -> &[Client] {
        &self.clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_unregister() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        let (a, _rx_a) = Client::new();
        let (b, _rx_b) = Client::new();
        let (a_id, b_id) = (a.id, b.id);
        registry.register(a);
        registry.register(b);
        assert_eq!(registry.len(), 2);

        let removed = registry.unregister(a_id).map(|c| c.id);
        assert_eq!(removed, Some(a_id));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.all()[0].id, b_id);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut registry = Registry::new();
        let (a, _rx_a) = Client::new();
        let (b, _rx_b) = Client::new();
        let a_id = a.id;
        registry.register(a);
        registry.register(b);

        assert!(registry.unregister(a_id).is_some());
        assert!(registry.unregister(a_id).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregister_unknown_client_leaves_set_untouched() {
        let mut registry = Registry::new();
        let (a, _rx_a) = Client::new();
        let (stranger, _rx_s) = Client::new();
        registry.register(a);

        assert!(registry.unregister(stranger.id).is_none());
        assert_eq!(registry.len(), 1);
    }
}
