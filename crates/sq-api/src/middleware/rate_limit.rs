//! Per-IP rate limits built on `tower_governor`.
//!
//! A quota is expressed as "one request replenished every N milliseconds"
//! plus a burst size. Clients are keyed by [`SmartIpKeyExtractor`], which reads
//! `X-Forwarded-For`/`X-Real-IP`/`Forwarded` before falling back to the peer
//! address, so the server must be run with connect info.
//!
//! [`SmartIpKeyExtractor`]: tower_governor::key_extractor::SmartIpKeyExtractor

/// General API traffic: 10 requests per second, burst of 30
pub const GENERAL_REPLENISH_MS: u64 = 100;
pub const GENERAL_BURST_SIZE: u32 = 30;

/// Login, password change and invitation acceptance: one every 2 seconds, burst of 5
pub const AUTH_REPLENISH_MS: u64 = 2_000;
pub const AUTH_BURST_SIZE: u32 = 5;

/// Access code redemption: one every 3 seconds, burst of 5
pub const REDEEM_REPLENISH_MS: u64 = 3_000;
pub const REDEEM_BURST_SIZE: u32 = 5;

/// Build a `GovernorLayer` keyed by client IP.
///
/// Takes the replenish interval in milliseconds and the burst size.
#[macro_export]
macro_rules! make_rate_limit_layer {
    ($replenish_ms:expr, $burst:expr) => {{
        let config = ::tower_governor::governor::GovernorConfigBuilder::default()
            .per_millisecond($replenish_ms)
            .burst_size($burst)
            .key_extractor(::tower_governor::key_extractor::SmartIpKeyExtractor)
            .use_headers()
            .finish()
            .expect("rate limit interval and burst size are non-zero");
        ::tower_governor::GovernorLayer::new(config)
    }};
}
