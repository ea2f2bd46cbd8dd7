//! Event classification: which notifications a change event calls for.
//!
//! Classification is pure. It looks only at the collection, the operation
//! and the changed fields; account state (such as the welcome marker) is
//! checked later, once the account has been resolved.

use feedwatch_core::account::fields as account_fields;
use feedwatch_core::collection::Collection;
use feedwatch_core::event::{ChangeEvent, OperationType};

use crate::domain::kind::NotificationKind;
use crate::domain::record::{self, fields};

/// One-time code cleared when a login is confirmed.
pub const VERIFICATION_CODE: &str = "verificationCode";
/// Flag flipped to `true` on the first confirmed login.
pub const FIRST_LOGIN_DONE: &str = "isFirstLoginDone";
/// Password hash.
pub const PASSWORD: &str = "password";

const KYC_APPROVED: [&str; 2] = ["FirstLevelVerified", "SecondLevelVerified"];
const KYC_REJECTED: [&str; 2] = ["FirstLevelRejected", "SecondLevelRejected"];

/// Operator notification owed for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    /// A balance transaction was created.
    BalanceCreated,
    /// A balance transaction changed status.
    BalanceStatusChanged,
    /// A trade was created.
    TradeCreated,
    /// A trade changed status.
    TradeStatusChanged,
    /// An account was created.
    AccountCreated,
}

impl AuditEvent {
    /// Returns `true` if operators also get an SMS for this event.
    #[must_use]
    pub fn has_sms(self) -> bool {
        self != Self::AccountCreated
    }
}

/// Every notification an event calls for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationPlan {
    /// Operator notification, if any.
    pub audit: Option<AuditEvent>,
    /// User-facing kinds, in delivery order.
    pub kinds: Vec<NotificationKind>,
}

impl NotificationPlan {
    /// Returns `true` if nothing is to be sent.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.audit.is_none() && self.kinds.is_empty()
    }
}

/// Classifies `event` observed on `collection`.
#[must_use]
pub fn classify(collection: Collection, event: &ChangeEvent) -> NotificationPlan {
    match collection {
        Collection::BalanceTransactions => classify_balance(event),
        Collection::Transactions => classify_trade(event),
        Collection::Users => classify_account(event),
    }
}

fn classify_balance(event: &ChangeEvent) -> NotificationPlan {
    let record = &event.full_document;
    let type_code = record::type_code(record);
    let mut plan = NotificationPlan::default();

    match event.operation {
        OperationType::Insert => {
            plan.audit = Some(AuditEvent::BalanceCreated);
            if record::is_deposit(&type_code) {
                plan.kinds.push(NotificationKind::DepositRequested);
            } else if record::is_withdrawal(&type_code) {
                plan.kinds.push(NotificationKind::WithdrawalRequested);
            }
        }
        OperationType::Update => {
            if !event.touched(fields::STATUS) {
                return plan;
            }
            plan.audit = Some(AuditEvent::BalanceStatusChanged);
            let status = record::status_code(record);
            if record::is_deposit(&type_code) {
                if record::is_approved(&status) {
                    plan.kinds.push(NotificationKind::DepositApproved);
                } else if record::is_rejected(&status) {
                    plan.kinds.push(NotificationKind::DepositRejected);
                }
            }
            if record::is_withdrawal(&type_code) && record::is_approved(&status) {
                plan.kinds.push(NotificationKind::WithdrawalApproved);
            }
        }
    }
    plan
}

fn classify_trade(event: &ChangeEvent) -> NotificationPlan {
    let record = &event.full_document;
    let audit = match event.operation {
        OperationType::Insert => AuditEvent::TradeCreated,
        OperationType::Update if event.touched(fields::STATUS) => AuditEvent::TradeStatusChanged,
        OperationType::Update => return NotificationPlan::default(),
    };

    let mut kinds = Vec::new();
    if record::is_settled(&record::status_code(record)) {
        let type_code = record::type_code(record);
        if record::is_buy(&type_code) {
            kinds.push(NotificationKind::BuyCompleted);
        } else if record::is_sell(&type_code) {
            kinds.push(NotificationKind::SellCompleted);
        }
    }
    NotificationPlan {
        audit: Some(audit),
        kinds,
    }
}

fn classify_account(event: &ChangeEvent) -> NotificationPlan {
    let mut plan = NotificationPlan::default();
    if event.is_insert() {
        plan.audit = Some(AuditEvent::AccountCreated);
        return plan;
    }

    if is_welcome_transition(event) {
        plan.kinds.push(NotificationKind::UserRegistrationWelcome);
    }
    if let Some(status) = event
        .updated_fields
        .text(account_fields::VERIFICATION_STATUS)
    {
        if KYC_APPROVED.contains(&status.as_str()) {
            plan.kinds.push(NotificationKind::KycApproved);
        } else if KYC_REJECTED.contains(&status.as_str()) {
            plan.kinds.push(NotificationKind::KycRejected);
        }
    }
    if event.updated_fields.contains(PASSWORD) {
        plan.kinds.push(NotificationKind::PasswordChanged);
    }
    plan
}

/// Returns `true` if a single update both cleared the one-time verification
/// code and flipped the first-login flag to `true`.
///
/// The code alone is cleared on every login, so it never qualifies on its
/// own; the welcome marker on the account is checked separately.
#[must_use]
pub fn is_welcome_transition(event: &ChangeEvent) -> bool {
    if event.is_insert() {
        return false;
    }
    let code_cleared = event.removed_fields.iter().any(|f| f == VERIFICATION_CODE)
        || (event.updated_fields.contains(VERIFICATION_CODE)
            && event.updated_fields.text(VERIFICATION_CODE).is_none());
    code_cleared && event.updated_fields.is_true(FIRST_LOGIN_DONE)
}

#[cfg(test)]
mod tests {
    use feedwatch_core::collection::Collection;
    use feedwatch_core::document::Document;
    use feedwatch_core::event::{ChangeEvent, ResumeToken};
    use serde_json::{Value, json};

    use super::{AuditEvent, NotificationPlan, classify, is_welcome_transition};
    use crate::domain::kind::NotificationKind;

    fn insert(doc: Value) -> ChangeEvent {
        ChangeEvent::insert("r-1", Document::from_value(doc), ResumeToken::new("1"))
    }

    fn update(doc: Value, updated: Value) -> ChangeEvent {
        ChangeEvent::update(
            "r-1",
            Document::from_value(doc),
            Document::from_value(updated),
            Vec::new(),
            ResumeToken::new("2"),
        )
    }

    #[test]
    fn test_deposit_insert_requests_audit_and_user_notification() {
        // Arrange
        let event = insert(json!({ "type": "OnlineDeposit", "amount": 500_000 }));

        // Act
        let plan = classify(Collection::BalanceTransactions, &event);

        // Assert
        assert_eq!(
            plan,
            NotificationPlan {
                audit: Some(AuditEvent::BalanceCreated),
                kinds: vec![NotificationKind::DepositRequested],
            }
        );
    }

    #[test]
    fn test_withdrawal_insert_requests_withdrawal_notification() {
        let plan = classify(
            Collection::BalanceTransactions,
            &insert(json!({ "type": "Withdraw" })),
        );
        assert_eq!(plan.kinds, vec![NotificationKind::WithdrawalRequested]);
    }

    #[test]
    fn test_balance_update_without_status_is_inert() {
        let event = update(
            json!({ "type": "OnlineDeposit", "status": "Accepted" }),
            json!({ "confirmDescription": "checked" }),
        );

        let plan = classify(Collection::BalanceTransactions, &event);

        assert!(plan.is_inert());
    }

    #[test]
    fn test_deposit_status_update_maps_approved_and_rejected() {
        let approved = update(
            json!({ "type": "OfflineDeposit", "status": "Accepted" }),
            json!({ "status": "Accepted" }),
        );
        let rejected = update(
            json!({ "type": "OfflineDeposit", "status": "Declined" }),
            json!({ "status": "Declined" }),
        );

        assert_eq!(
            classify(Collection::BalanceTransactions, &approved).kinds,
            vec![NotificationKind::DepositApproved]
        );
        assert_eq!(
            classify(Collection::BalanceTransactions, &rejected).kinds,
            vec![NotificationKind::DepositRejected]
        );
    }

    #[test]
    fn test_pending_status_update_only_audits() {
        let event = update(
            json!({ "type": "Withdraw", "status": "Pending" }),
            json!({ "status": "Pending" }),
        );

        let plan = classify(Collection::BalanceTransactions, &event);

        assert_eq!(plan.audit, Some(AuditEvent::BalanceStatusChanged));
        assert!(plan.kinds.is_empty());
    }

    #[test]
    fn test_settled_trade_insert_notifies_buyer() {
        let plan = classify(
            Collection::Transactions,
            &insert(json!({ "type": "Buy", "status": "Successful" })),
        );
        assert_eq!(plan.audit, Some(AuditEvent::TradeCreated));
        assert_eq!(plan.kinds, vec![NotificationKind::BuyCompleted]);
    }

    #[test]
    fn test_trade_status_update_to_confirmed_notifies_seller() {
        let event = update(
            json!({ "type": "sell", "status": "Confirmed" }),
            json!({ "status": "Confirmed" }),
        );
        let plan = classify(Collection::Transactions, &event);
        assert_eq!(plan.audit, Some(AuditEvent::TradeStatusChanged));
        assert_eq!(plan.kinds, vec![NotificationKind::SellCompleted]);
    }

    #[test]
    fn test_trade_update_without_status_is_inert() {
        let event = update(json!({ "type": "Buy", "status": "Successful" }), json!({ "wage": 10 }));
        assert!(classify(Collection::Transactions, &event).is_inert());
    }

    #[test]
    fn test_account_insert_only_audits_without_sms() {
        let plan = classify(Collection::Users, &insert(json!({ "firstName": "Sara" })));
        assert_eq!(plan.audit, Some(AuditEvent::AccountCreated));
        assert!(!AuditEvent::AccountCreated.has_sms());
        assert!(plan.kinds.is_empty());
    }

    #[test]
    fn test_welcome_requires_both_changes_in_one_event() {
        let code_only = update(json!({}), json!({ "verificationCode": null }));
        let flag_only = update(json!({}), json!({ "isFirstLoginDone": true }));
        let both = update(
            json!({}),
            json!({ "verificationCode": "", "isFirstLoginDone": true }),
        );

        assert!(!is_welcome_transition(&code_only));
        assert!(!is_welcome_transition(&flag_only));
        assert!(is_welcome_transition(&both));
    }

    #[test]
    fn test_welcome_accepts_removed_verification_code() {
        let event = ChangeEvent::update(
            "u-1",
            Document::new(),
            Document::from_value(json!({ "isFirstLoginDone": true })),
            vec!["verificationCode".to_owned()],
            ResumeToken::new("3"),
        );
        assert!(is_welcome_transition(&event));
    }

    #[test]
    fn test_new_verification_code_is_not_a_welcome() {
        let event = update(
            json!({}),
            json!({ "verificationCode": "48213", "isFirstLoginDone": true }),
        );
        assert!(!is_welcome_transition(&event));
    }

    #[test]
    fn test_account_update_can_yield_several_kinds() {
        let event = update(
            json!({}),
            json!({ "verificationStatus": "FirstLevelRejected", "password": "hash" }),
        );

        let plan = classify(Collection::Users, &event);

        assert_eq!(
            plan.kinds,
            vec![NotificationKind::KycRejected, NotificationKind::PasswordChanged]
        );
        assert_eq!(plan.audit, None);
    }
}
