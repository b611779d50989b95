//! # Protocol Configuration & Constants
//!
//! Every magic number in dPACE lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! These values define the rental policy every deployment agrees on.
//! Changing them under live bookings is somewhere between "difficult" and
//! "career-ending", so choose wisely during devnet.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Protocol fingerprint for network identification. Used in handshakes,
/// status responses, and version negotiation to identify the protocol
/// family and build generation.
pub const PROTOCOL_FINGERPRINT: &str = "ALAS-DPACE-2026";

/// The full version string, assembled at compile time so we don't allocate
/// for something this trivial at runtime.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Human-readable prefix for party addresses. Bech32 HRP — short enough to
/// type, long enough to be unambiguous.
pub const ADDRESS_HRP: &str = "dpace";

/// Ed25519 secret keys are 32 bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes. If yours isn't, something
/// has gone terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

/// Digest output length in bytes. Both SHA-256 and BLAKE3 produce 32 bytes.
pub const DIGEST_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Booking Policy
// ---------------------------------------------------------------------------

/// The escalation window, in seconds of ledger time. A car may not force-end
/// a booking before `created_at + POLICY_WINDOW_SECS`. Roughly 24 hours plus
/// a grace margin: long enough that a renter stuck in a dead zone isn't
/// punished, short enough that a ghosting renter doesn't strand the car
/// for a week.
pub const POLICY_WINDOW_SECS: i64 = 87_000;

/// Minimum deposit (in escrow units) a renter must attach at registration.
/// Skin in the game; the exact figure comes from the rental policy, not
/// from any consensus rule.
pub const MIN_RENTER_DEPOSIT: u64 = 20;
