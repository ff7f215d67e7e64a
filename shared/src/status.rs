//! Status lifecycles of the backend resources.
//!
//! The backend owns the real state machines. The tables here are what the
//! console allows an operator to request: an action that is not permitted from
//! the current status is shown disabled and never sent.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

macro_rules! status {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub enum $name {
            $($variant,)+
            #[default]
            Unknown,
        }

        impl $name {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                    Self::Unknown => "unknown",
                }
            }
        }

        impl StatusName for $name {
            fn name(self) -> &'static str {
                self.as_str()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Self::$variant,)+
                    _ => Self::Unknown,
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Ok(match Value::deserialize(deserializer)? {
                    Value::String(text) => Self::from(text.as_str()),
                    _ => Self::Unknown,
                })
            }
        }
    };
}

status!(CarStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Blocked => "blocked",
});

status!(BookingStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Ongoing => "ongoing",
    Completed => "completed",
    Cancelled => "cancelled",
});

status!(DiscountStatus {
    Pending => "pending",
    Active => "active",
    Inactive => "inactive",
    Expired => "expired",
});

status!(TicketStatus {
    Open => "open",
    Answered => "answered",
    Closed => "closed",
});

status!(WithdrawalStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

/// A resource status as the backend spells it.
pub trait StatusName: Copy + for<'a> From<&'a str> {
    fn name(self) -> &'static str;
}

/// An operator action that moves a resource from one status to another.
pub trait Transition: Copy + Sized + 'static {
    type Status: StatusName;

    fn all() -> &'static [Self];

    /// Path segment used in the console's action routes.
    fn slug(self) -> &'static str;

    fn label(self) -> &'static str;

    /// Status sent to the backend when the action is applied.
    fn target(self) -> &'static str;

    fn permitted_from(self, status: Self::Status) -> bool;

    #[must_use]
    fn from_slug(slug: &str) -> Option<Self> {
        Self::all().iter().copied().find(|action| action.slug() == slug)
    }
}

macro_rules! transitions {
    ($name:ident for $status:ident {
        $($variant:ident => ($slug:literal, $label:literal, $target:literal, $($from:ident)|+)),+ $(,)?
    }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
        }

        impl Transition for $name {
            type Status = $status;

            fn all() -> &'static [Self] {
                &[$(Self::$variant,)+]
            }

            fn slug(self) -> &'static str {
                match self {
                    $(Self::$variant => $slug,)+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            fn target(self) -> &'static str {
                match self {
                    $(Self::$variant => $target,)+
                }
            }

            fn permitted_from(self, status: $status) -> bool {
                match self {
                    $(Self::$variant => matches!(status, $($status::$from)|+),)+
                }
            }
        }
    };
}

transitions!(CarAction for CarStatus {
    Approve => ("approve", "Approve", "approved", Pending | Rejected),
    Reject => ("reject", "Reject", "rejected", Pending),
    Block => ("block", "Block", "blocked", Approved),
    Unblock => ("unblock", "Unblock", "approved", Blocked),
});

transitions!(BookingAction for BookingStatus {
    Confirm => ("confirm", "Confirm", "confirmed", Pending),
    Start => ("start", "Start", "ongoing", Confirmed),
    Complete => ("complete", "Complete", "completed", Ongoing),
    Cancel => ("cancel", "Cancel", "cancelled", Pending | Confirmed),
});

transitions!(DiscountAction for DiscountStatus {
    Activate => ("activate", "Activate", "active", Inactive),
    Deactivate => ("deactivate", "Deactivate", "inactive", Active),
});

transitions!(TicketAction for TicketStatus {
    Close => ("close", "Close", "closed", Open | Answered),
    Reopen => ("reopen", "Reopen", "open", Closed),
});

transitions!(WithdrawalAction for WithdrawalStatus {
    Approve => ("approve", "Approve", "approved", Pending),
    Reject => ("reject", "Reject", "rejected", Pending),
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_discount_cannot_be_activated() {
        assert!(!DiscountAction::Activate.permitted_from(DiscountStatus::Pending));
        assert!(!DiscountAction::Deactivate.permitted_from(DiscountStatus::Pending));
        assert!(DiscountAction::Activate.permitted_from(DiscountStatus::Inactive));
        assert!(DiscountAction::Deactivate.permitted_from(DiscountStatus::Active));
    }

    #[test]
    fn test_expired_discount_is_frozen() {
        for action in DiscountAction::all() {
            assert!(!action.permitted_from(DiscountStatus::Expired));
        }
    }

    #[test]
    fn test_unknown_status_permits_nothing() {
        for action in BookingAction::all() {
            assert!(!action.permitted_from(BookingStatus::Unknown));
        }
        for action in CarAction::all() {
            assert!(!action.permitted_from(CarStatus::Unknown));
        }
    }

    #[test]
    fn test_booking_cancellation() {
        assert!(BookingAction::Cancel.permitted_from(BookingStatus::Pending));
        assert!(BookingAction::Cancel.permitted_from(BookingStatus::Confirmed));
        assert!(!BookingAction::Cancel.permitted_from(BookingStatus::Ongoing));
        assert!(!BookingAction::Cancel.permitted_from(BookingStatus::Completed));
    }

    #[test]
    fn test_status_parsing_is_lenient() {
        assert_eq!(CarStatus::from(" Approved "), CarStatus::Approved);
        assert_eq!(TicketStatus::from("CLOSED"), TicketStatus::Closed);
        assert_eq!(WithdrawalStatus::from("paid"), WithdrawalStatus::Unknown);
    }

    #[test]
    fn test_status_deserialization() {
        let status: DiscountStatus = serde_json::from_str("\"Active\"").unwrap();
        assert_eq!(status, DiscountStatus::Active);

        let status: DiscountStatus = serde_json::from_str("1").unwrap();
        assert_eq!(status, DiscountStatus::Unknown);

        assert_eq!(
            serde_json::to_string(&BookingStatus::Ongoing).unwrap(),
            "\"ongoing\""
        );
    }

    #[test]
    fn test_action_slugs_round_trip() {
        assert_eq!(TicketAction::from_slug("reopen"), Some(TicketAction::Reopen));
        assert_eq!(WithdrawalAction::from_slug("approve"), Some(WithdrawalAction::Approve));
        assert_eq!(CarAction::from_slug("delete"), None);
    }

    #[test]
    fn test_unblocking_restores_approval() {
        assert_eq!(CarAction::Unblock.target(), CarStatus::Approved.as_str());
        assert!(CarAction::Unblock.permitted_from(CarStatus::Blocked));
        assert!(!CarAction::Block.permitted_from(CarStatus::Blocked));
    }
}
