use thicket_traits::HostCapabilities;

/// Options used when constructing a [`Document`](crate::Document)
#[derive(Default)]
pub struct DocumentConfig {
    /// Capability probes for the embedding host. Defaults to
    /// [`HostCapabilities::modern`]
    pub capabilities: Option<HostCapabilities>,
}
