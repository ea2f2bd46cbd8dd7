//! The closed set of notification kinds.

use std::fmt;

/// Business meaning of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// First successful login after sign-up.
    UserRegistrationWelcome,
    /// Identity verification approved.
    KycApproved,
    /// Identity verification rejected.
    KycRejected,
    /// Identity verification still pending.
    KycReminder,
    /// Account password changed.
    PasswordChanged,
    /// Deposit request recorded.
    DepositRequested,
    /// Deposit approved.
    DepositApproved,
    /// Deposit rejected.
    DepositRejected,
    /// Withdrawal request recorded.
    WithdrawalRequested,
    /// Withdrawal paid out.
    WithdrawalApproved,
    /// Purchase settled.
    BuyCompleted,
    /// Sale settled.
    SellCompleted,
    /// Operator notifications. Their content is chosen by
    /// [`AuditEvent`](crate::domain::classify::AuditEvent); there is no
    /// account-holder template.
    GenericAudit,
}

impl NotificationKind {
    /// Stable identifier used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserRegistrationWelcome => "user_registration_welcome",
            Self::KycApproved => "kyc_approved",
            Self::KycRejected => "kyc_rejected",
            Self::KycReminder => "kyc_reminder",
            Self::PasswordChanged => "password_changed",
            Self::DepositRequested => "deposit_requested",
            Self::DepositApproved => "deposit_approved",
            Self::DepositRejected => "deposit_rejected",
            Self::WithdrawalRequested => "withdrawal_requested",
            Self::WithdrawalApproved => "withdrawal_approved",
            Self::BuyCompleted => "buy_completed",
            Self::SellCompleted => "sell_completed",
            Self::GenericAudit => "generic_audit",
        }
    }

    /// Returns `true` if the account must be re-read after the triggering
    /// mutation before rendering.
    #[must_use]
    pub fn reflects_mutation(self) -> bool {
        matches!(
            self,
            Self::DepositApproved
                | Self::DepositRejected
                | Self::WithdrawalApproved
                | Self::BuyCompleted
                | Self::SellCompleted
        )
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::NotificationKind;

    #[test]
    fn test_log_identifiers_are_snake_case() {
        assert_eq!(NotificationKind::GenericAudit.to_string(), "generic_audit");
        assert_eq!(NotificationKind::KycReminder.as_str(), "kyc_reminder");
    }

    #[test]
    fn test_requests_render_from_the_record_as_inserted() {
        assert!(!NotificationKind::DepositRequested.reflects_mutation());
        assert!(NotificationKind::BuyCompleted.reflects_mutation());
    }
}
