//! `SeaORM` active enums mirroring the PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerflow_core::audit::UsageOutcome as DomainUsageOutcome;
use ledgerflow_core::coa::{AccountType as DomainAccountType, NormalBalance as DomainNormalBalance};
use ledgerflow_core::ledger::SubledgerKind as DomainSubledgerKind;
use ledgerflow_core::workflow::JournalStatus as DomainJournalStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "asset")]
    Asset,
    #[sea_orm(string_value = "liability")]
    Liability,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "normal_balance")]
pub enum NormalBalance {
    #[sea_orm(string_value = "debit")]
    Debit,
    #[sea_orm(string_value = "credit")]
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_status")]
pub enum JournalStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "pending_approval")]
    PendingApproval,
    #[sea_orm(string_value = "posted")]
    Posted,
    #[sea_orm(string_value = "reversed")]
    Reversed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "subledger_kind")]
pub enum SubledgerKind {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "vendor")]
    Vendor,
    #[sea_orm(string_value = "employee")]
    Employee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "usage_outcome")]
pub enum UsageOutcome {
    #[sea_orm(string_value = "matched")]
    Matched,
    #[sea_orm(string_value = "fallback_used")]
    FallbackUsed,
    #[sea_orm(string_value = "no_rule_matched")]
    NoRuleMatched,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Two-way mapping between a column enum and its domain enum.
macro_rules! domain_enum {
    ($db:ident, $domain:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<$domain> for $db {
            fn from(value: $domain) -> Self {
                match value {
                    $($domain::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$db> for $domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }
    };
}

domain_enum!(AccountType, DomainAccountType, [Asset, Liability, Equity, Income, Expense]);
domain_enum!(NormalBalance, DomainNormalBalance, [Debit, Credit]);
domain_enum!(
    JournalStatus,
    DomainJournalStatus,
    [Draft, PendingApproval, Posted, Reversed, Cancelled]
);
domain_enum!(SubledgerKind, DomainSubledgerKind, [Customer, Vendor, Employee]);
domain_enum!(
    UsageOutcome,
    DomainUsageOutcome,
    [Matched, FallbackUsed, NoRuleMatched, Failed]
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_domain() {
        for status in DomainJournalStatus::ALL {
            let column: JournalStatus = status.into();
            assert_eq!(DomainJournalStatus::from(column), status);
        }
    }

    #[test]
    fn test_string_values_match_serde_names() {
        assert_eq!(JournalStatus::PendingApproval.to_value(), "pending_approval");
        assert_eq!(UsageOutcome::NoRuleMatched.to_value(), "no_rule_matched");
        assert_eq!(AccountType::Income.to_value(), "income");
    }
}
