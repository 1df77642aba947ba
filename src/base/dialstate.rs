/// The current state of a single dial attempt.
///
/// ```text
/// Created -> Protected -> Connected -> Open -> Closed
///    \           \            \
///     `-----------`------------`--> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialState {
    /// The socket has been allocated but not yet handed to the protect callback.
    #[default]
    Created,

    /// The protect callback accepted the descriptor.
    Protected,

    /// The stream handshake finished, or the datagram peer was set.
    Connected,

    /// Ownership passed to the caller as a `Connection`.
    Open,

    /// The caller closed the connection.
    Closed,

    /// Socket creation, protection or connect failed; the descriptor is gone.
    Failed,
}
