//! Device identity derived from the ESP32 factory MAC address.
//!
//! Produces a stable unique ID in the form `proofer_xxyyzz` (last 3
//! bytes of the 6-byte MAC in lowercase hex).  It is deterministic
//! across reboots and is used both as the discovery `uniq_id` and as the
//! topic base (`proofer/xxyyzz`).

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Unique ID string, e.g. `proofer_efcafe`.
pub type DeviceIdString = heapless::String<24>;

/// Read the factory MAC address from eFuse.
#[cfg(feature = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(feature = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Derive the unique ID from the last 3 MAC bytes.
pub fn unique_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    use core::fmt::Write;
    let _ = write!(id, "proofer_{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    id
}

/// Topic base for this device, e.g. `proofer/efcafe`.
pub fn topic_base(mac: &MacAddress) -> heapless::String<32> {
    let mut base = heapless::String::<32>::new();
    use core::fmt::Write;
    let _ = write!(base, "proofer/{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    base
}
