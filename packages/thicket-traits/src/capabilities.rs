use bitflags::bitflags;

bitflags! {
    /// Feature probes for the host environment embedding a document.
    ///
    /// Probed once when the document is constructed: the matching event and
    /// style mechanisms are selected at that point and never re-probed. The
    /// modern capability wins when both are reported.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct HostCapabilities: u8 {
        /// The standard multi-listener registration model.
        const EVENT_LISTENERS = 0b0000_0001;
        /// The single-slot, "on"-prefixed legacy registration model.
        const LEGACY_EVENTS = 0b0000_0010;
        /// Resolved style lookup from recorded computed values.
        const COMPUTED_STYLE = 0b0000_0100;
        /// Cascaded style lookup from authored declarations.
        const CASCADED_STYLE = 0b0000_1000;
    }
}

impl HostCapabilities {
    /// Capability set of a current host.
    pub const fn modern() -> Self {
        Self::EVENT_LISTENERS.union(Self::COMPUTED_STYLE)
    }

    /// Capability set of an old host that only has the fallback mechanisms.
    pub const fn legacy() -> Self {
        Self::LEGACY_EVENTS.union(Self::CASCADED_STYLE)
    }
}
