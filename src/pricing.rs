//! Delivery charge calculation.
//!
//! The charge is weight based: total shipped grams rounded up to whole
//! kilograms (a partial kilogram counts as a full one), multiplied by a
//! per-kilogram rate. Deliveries within the home state get the local rate.

/// State served at the local rate. Matched case-insensitively.
pub const LOCAL_STATE: &str = "gujarat";

/// Per-kilogram rate for deliveries within [`LOCAL_STATE`].
pub const LOCAL_RATE_PER_KG: u64 = 30;

/// Per-kilogram rate everywhere else.
pub const STANDARD_RATE_PER_KG: u64 = 90;

/// Whole kilograms to charge for, rounding any partial kilogram up.
pub fn chargeable_kilograms(total_grams: u64) -> u64 {
    total_grams.div_ceil(1000)
}

/// Delivery charge for a shipment of `total_grams` to `state`.
pub fn delivery_charge(total_grams: u64, state: &str) -> u64 {
    let rate = if state.eq_ignore_ascii_case(LOCAL_STATE) {
        LOCAL_RATE_PER_KG
    } else {
        STANDARD_RATE_PER_KG
    };
    chargeable_kilograms(total_grams) * rate
}
