//! Reload notifications.
//!
//! Subscribers registered on a provider are invoked after every background
//! reload attempt that completes without an unhandled error.

pub mod subscriber;

pub use subscriber::{ReloadEvent, ReloadOutcome, SubscriberRegistry, SubscriptionHandle};
