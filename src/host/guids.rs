//! Class and interface identifiers of the runtime hosting API.

use uguid::{guid, Guid};

/// `CLSID_CLRMetaHost`, created through `CLRCreateInstance`.
pub const CLSID_CLR_META_HOST: Guid = guid!("9280188d-0e8e-4867-b30c-7fa83884e8de");

/// `IID_ICLRMetaHost`
pub const IID_ICLR_META_HOST: Guid = guid!("d332db9e-b9b3-4125-8207-a14884f53216");

/// `IID_ICLRRuntimeInfo`
pub const IID_ICLR_RUNTIME_INFO: Guid = guid!("bd39d1d2-ba2f-486a-89b0-b4b0cb466891");

/// `CLSID_CLRRuntimeHost`, requested from `ICLRRuntimeInfo::GetInterface`.
pub const CLSID_CLR_RUNTIME_HOST: Guid = guid!("90f1a06e-7712-4762-86b5-7a5eba6bdb02");

/// `IID_ICLRRuntimeHost`, shared by the legacy and the modern host.
pub const IID_ICLR_RUNTIME_HOST: Guid = guid!("90f1a06c-7712-4762-86b5-7a5eba6bdb02");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_text() {
        assert_eq!(
            CLSID_CLR_META_HOST.to_string(),
            "9280188d-0e8e-4867-b30c-7fa83884e8de"
        );
        assert_eq!(
            IID_ICLR_RUNTIME_HOST.to_string(),
            "90f1a06c-7712-4762-86b5-7a5eba6bdb02"
        );
    }

    #[test]
    fn test_host_class_and_interface_differ() {
        assert_ne!(CLSID_CLR_RUNTIME_HOST, IID_ICLR_RUNTIME_HOST);
    }
}
