//! # SMS Notification Seam
//!
//! Loyalty notifications are fire-and-forget: they run after the refill
//! transaction commits and a delivery failure never affects the
//! committed record. The transport is behind a trait so deployments can
//! plug in a gateway while tests and offline sync use the no-op.
//!
//! ## Notification Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Notifications are sent ONLY for refills that are:                     │
//! │    • recorded online (no client_id), and                               │
//! │    • attached to a registered customer                                 │
//! │                                                                         │
//! │  free_quantity > 0          → thank-you message                        │
//! │  exactly 1 paid unit to go  → "almost free" reminder                   │
//! │  otherwise                  → nothing                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::info;

/// Outbound SMS transport.
///
/// Implementations must be infallible from the caller's perspective:
/// log and swallow delivery errors internally.
pub trait SmsNotifier: Send + Sync {
    /// Sent when a refill included free units.
    fn send_free_refill_thanks(&self, phone_number: &str, names: &str, free_quantity: i64);

    /// Sent when the customer's next paid refill unit will be free.
    fn send_almost_free_reminder(&self, phone_number: &str, names: &str);
}

/// Default notifier: logs the would-be message and sends nothing.
///
/// Used in tests and in deployments without an SMS gateway.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSms;

impl SmsNotifier for NoopSms {
    fn send_free_refill_thanks(&self, phone_number: &str, names: &str, free_quantity: i64) {
        info!(
            phone = %phone_number,
            customer = %names,
            free_quantity,
            "SMS (noop): free refill thank-you"
        );
    }

    fn send_almost_free_reminder(&self, phone_number: &str, names: &str) {
        info!(
            phone = %phone_number,
            customer = %names,
            "SMS (noop): next refill free reminder"
        );
    }
}
