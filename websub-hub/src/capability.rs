//! Capability registry for optional adaptor hooks.
//!
//! An adaptor declares which optional hooks it implements through
//! [`HubAdaptor::hooks`](crate::HubAdaptor::hooks). The hub reads that
//! declaration once at construction and keeps the resulting [`Capabilities`]
//! for its whole lifetime, so no workflow has to ask the adaptor again per request.

use std::collections::HashSet;
use std::fmt;

/// Optional adaptor hooks.
///
/// Topic registration, deregistration and content updates are mandatory and
/// therefore not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Subscription,
    SubscriptionValidation,
    SubscriptionIntentVerified,
    Unsubscription,
    UnsubscriptionValidation,
    UnsubscriptionIntentVerified,
}

impl Hook {
    pub const ALL: [Hook; 6] = [
        Hook::Subscription,
        Hook::SubscriptionValidation,
        Hook::SubscriptionIntentVerified,
        Hook::Unsubscription,
        Hook::UnsubscriptionValidation,
        Hook::UnsubscriptionIntentVerified,
    ];

    /// Name of the adaptor method backing this hook.
    pub fn method_name(self) -> &'static str {
        match self {
            Hook::Subscription => "on_subscription",
            Hook::SubscriptionValidation => "on_subscription_validation",
            Hook::SubscriptionIntentVerified => "on_subscription_intent_verified",
            Hook::Unsubscription => "on_unsubscription",
            Hook::UnsubscriptionValidation => "on_unsubscription_validation",
            Hook::UnsubscriptionIntentVerified => "on_unsubscription_intent_verified",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// The set of optional hooks an adaptor implements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookSet {
    hooks: HashSet<Hook>,
}

impl HookSet {
    /// No optional hooks: every subscription and unsubscription is accepted.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every optional hook.
    pub fn all() -> Self {
        Hook::ALL.into_iter().collect()
    }

    pub fn with(mut self, hook: Hook) -> Self {
        self.hooks.insert(hook);
        self
    }

    pub fn contains(&self, hook: Hook) -> bool {
        self.hooks.contains(&hook)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl FromIterator<Hook> for HookSet {
    fn from_iter<I: IntoIterator<Item = Hook>>(iter: I) -> Self {
        Self {
            hooks: iter.into_iter().collect(),
        }
    }
}

/// Which optional hooks the dispatcher may call.
///
/// When a (un)subscription hook is absent the request is accepted with `202`.
/// When a validation or intent-verified hook is absent that step is skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub subscription: bool,
    pub subscription_validation: bool,
    pub subscription_intent_verified: bool,
    pub unsubscription: bool,
    pub unsubscription_validation: bool,
    pub unsubscription_intent_verified: bool,
}

impl Capabilities {
    /// Compute capabilities from a hook declaration.
    pub fn from_hooks(hooks: &HookSet) -> Self {
        Self {
            subscription: hooks.contains(Hook::Subscription),
            subscription_validation: hooks.contains(Hook::SubscriptionValidation),
            subscription_intent_verified: hooks.contains(Hook::SubscriptionIntentVerified),
            unsubscription: hooks.contains(Hook::Unsubscription),
            unsubscription_validation: hooks.contains(Hook::UnsubscriptionValidation),
            unsubscription_intent_verified: hooks.contains(Hook::UnsubscriptionIntentVerified),
        }
    }

    pub fn supports(&self, hook: Hook) -> bool {
        match hook {
            Hook::Subscription => self.subscription,
            Hook::SubscriptionValidation => self.subscription_validation,
            Hook::SubscriptionIntentVerified => self.subscription_intent_verified,
            Hook::Unsubscription => self.unsubscription,
            Hook::UnsubscriptionValidation => self.unsubscription_validation,
            Hook::UnsubscriptionIntentVerified => self.unsubscription_intent_verified,
        }
    }
}
