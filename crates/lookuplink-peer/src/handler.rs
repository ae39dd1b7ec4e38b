use crate::peer::LookupPeer;

/// Notified once every time a [`LookupPeer`] establishes a fresh connection.
///
/// The hook runs after the protocol preamble has been written and before the
/// pending command, so it may issue its own commands (typically `IDENTIFY`
/// and `REGISTER`) on the new connection.
pub trait ReconnectHandler: Send {
    fn on_reconnect(&mut self, peer: &mut LookupPeer);
}

impl<F> ReconnectHandler for F
where
    F: FnMut(&mut LookupPeer) + Send,
{
    fn on_reconnect(&mut self, peer: &mut LookupPeer) {
        self(peer)
    }
}
