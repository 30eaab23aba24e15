//! Reward lifecycle status, derived on every read.
//!
//! Nothing here is persisted. The status is a pure function of the facts
//! known about the recipient and the reward at read time:
//!
//! ```text
//! no platform account ........................ PENDING_SIGNUP
//! payment recorded ........................... COMPLETE
//! identity or payout destination invalid .... MISSING_PAYOUT_INFO
//! company without received invoice .......... PENDING_INVOICE
//! otherwise .................................. PROCESSING
//! ```
//!
//! Self views only expose the summary granularity, where the two payout
//! checks collapse into `PROCESSING`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::currency::{Currency, Network};

/// Reward status exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardStatus {
    /// Recipient has no platform account yet.
    PendingSignup,
    /// Identity or payout destination is missing or invalid.
    MissingPayoutInfo,
    /// Recipient is a company and its invoice has not arrived.
    PendingInvoice,
    /// Ready to be paid.
    Processing,
    /// Payment recorded.
    Complete,
}

impl RewardStatus {
    /// Wire name. Status sorts compare these names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingSignup => "PENDING_SIGNUP",
            Self::MissingPayoutInfo => "MISSING_PAYOUT_INFO",
            Self::PendingInvoice => "PENDING_INVOICE",
            Self::Processing => "PROCESSING",
            Self::Complete => "COMPLETE",
        }
    }
}

/// How much of the state machine a view exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGranularity {
    /// Every state, used by project lead views.
    Detailed,
    /// `PENDING_SIGNUP`, `PROCESSING` or `COMPLETE`, used by self views.
    Summary,
}

/// Payment method preferred for USD rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferredPayoutMethod {
    /// Bank transfer.
    Fiat,
    /// Stablecoin on ethereum.
    Crypto,
}

/// Legal identity declared by a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    /// Individual.
    Person {
        /// Given name.
        first_name: Option<String>,
        /// Family name.
        last_name: Option<String>,
    },
    /// Legal entity.
    Company {
        /// Registered name.
        name: Option<String>,
        /// Registration number.
        identification_number: Option<String>,
        /// Given name of the owner.
        owner_first_name: Option<String>,
        /// Family name of the owner.
        owner_last_name: Option<String>,
    },
}

fn present(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

impl Identity {
    /// Whether every mandatory field is filled in.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Person {
                first_name,
                last_name,
            } => present(first_name.as_ref()) && present(last_name.as_ref()),
            Self::Company {
                name,
                identification_number,
                owner_first_name,
                owner_last_name,
            } => {
                present(name.as_ref())
                    && present(identification_number.as_ref())
                    && present(owner_first_name.as_ref())
                    && present(owner_last_name.as_ref())
            }
        }
    }

    /// Whether the identity is a company.
    #[must_use]
    pub const fn is_company(&self) -> bool {
        matches!(self, Self::Company { .. })
    }
}

/// Wallet declared for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Network of the address.
    pub network: Network,
    /// Address or name service handle.
    pub address: String,
}

/// Bank coordinates for fiat payouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// International bank account number.
    pub iban: String,
    /// Bank identifier code.
    pub bic: String,
}

impl BankAccount {
    /// Whether both coordinates are filled in.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.iban.trim().is_empty() && !self.bic.trim().is_empty()
    }
}

/// Payout settings of a registered user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutInfo {
    /// Declared identity.
    pub identity: Option<Identity>,
    /// Preferred method for USD rewards.
    pub usd_preferred_method: Option<PreferredPayoutMethod>,
    /// Declared wallets.
    pub wallets: Vec<Wallet>,
    /// Declared bank account.
    pub bank_account: Option<BankAccount>,
}

impl PayoutInfo {
    /// Whether a valid identity is declared.
    #[must_use]
    pub fn has_valid_identity(&self) -> bool {
        self.identity.as_ref().is_some_and(Identity::is_valid)
    }

    /// Whether the declared identity is a valid company.
    #[must_use]
    pub fn is_valid_company(&self) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|i| i.is_company() && i.is_valid())
    }

    fn has_wallet(&self, network: Network) -> bool {
        self.wallets
            .iter()
            .any(|w| w.network == network && !w.address.trim().is_empty())
    }

    /// Whether a payment in `currency` has somewhere to go.
    #[must_use]
    pub fn can_receive(&self, currency: Currency) -> bool {
        match currency.network() {
            Some(network) => self.has_wallet(network),
            None => match self.usd_preferred_method {
                Some(PreferredPayoutMethod::Fiat) => {
                    self.bank_account.as_ref().is_some_and(BankAccount::is_valid)
                }
                Some(PreferredPayoutMethod::Crypto) | None => self.has_wallet(Network::Ethereum),
            },
        }
    }
}

/// Facts a reward status is derived from.
#[derive(Debug, Clone, Copy)]
pub struct RewardFacts<'a> {
    /// Recipient has signed up on the platform.
    pub recipient_registered: bool,
    /// A payment has been recorded for the reward.
    pub paid: bool,
    /// Currency of the reward.
    pub currency: Currency,
    /// Recipient payout settings, when any were saved.
    pub payout_info: Option<&'a PayoutInfo>,
    /// The recipient's invoice for this reward has arrived.
    pub invoice_received: bool,
}

impl RewardFacts<'_> {
    /// Derives the status at the requested granularity.
    #[must_use]
    pub fn status(&self, granularity: StatusGranularity) -> RewardStatus {
        if !self.recipient_registered {
            return RewardStatus::PendingSignup;
        }
        if self.paid {
            return RewardStatus::Complete;
        }
        match granularity {
            StatusGranularity::Summary => RewardStatus::Processing,
            StatusGranularity::Detailed => self.payout_status(),
        }
    }

    fn payout_status(&self) -> RewardStatus {
        let Some(info) = self.payout_info else {
            return RewardStatus::MissingPayoutInfo;
        };
        if !info.has_valid_identity() || !info.can_receive(self.currency) {
            return RewardStatus::MissingPayoutInfo;
        }
        if info.is_valid_company() && !self.invoice_received {
            return RewardStatus::PendingInvoice;
        }
        RewardStatus::Processing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_the_wire_format() {
        for status in [
            RewardStatus::PendingSignup,
            RewardStatus::MissingPayoutInfo,
            RewardStatus::PendingInvoice,
            RewardStatus::Processing,
            RewardStatus::Complete,
        ] {
            let json = serde_json::to_string(&status).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    fn person() -> Identity {
        Identity::Person {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
        }
    }

    fn company() -> Identity {
        Identity::Company {
            name: Some("Analytical Engines Ltd".to_string()),
            identification_number: Some("RCS-42".to_string()),
            owner_first_name: Some("Charles".to_string()),
            owner_last_name: Some("Babbage".to_string()),
        }
    }

    fn wallet(network: Network) -> Wallet {
        Wallet {
            network,
            address: "0xabc".to_string(),
        }
    }

    fn complete_info(identity: Identity) -> PayoutInfo {
        PayoutInfo {
            identity: Some(identity),
            usd_preferred_method: Some(PreferredPayoutMethod::Crypto),
            wallets: vec![
                wallet(Network::Ethereum),
                wallet(Network::Optimism),
                wallet(Network::Starknet),
                wallet(Network::Aptos),
            ],
            bank_account: None,
        }
    }

    fn facts(info: Option<&PayoutInfo>, currency: Currency) -> RewardFacts<'_> {
        RewardFacts {
            recipient_registered: true,
            paid: false,
            currency,
            payout_info: info,
            invoice_received: false,
        }
    }

    #[test]
    fn unregistered_recipient_is_pending_signup_whatever_else() {
        let info = complete_info(person());
        let mut f = facts(Some(&info), Currency::Eth);
        f.recipient_registered = false;
        f.paid = true;
        assert_eq!(f.status(StatusGranularity::Detailed), RewardStatus::PendingSignup);
        assert_eq!(f.status(StatusGranularity::Summary), RewardStatus::PendingSignup);
    }

    #[test]
    fn payment_completes_regardless_of_payout_info() {
        let mut f = facts(None, Currency::Usd);
        f.paid = true;
        assert_eq!(f.status(StatusGranularity::Detailed), RewardStatus::Complete);
        assert_eq!(f.status(StatusGranularity::Summary), RewardStatus::Complete);
    }

    #[test]
    fn missing_payout_info_without_any_settings() {
        let f = facts(None, Currency::Eth);
        assert_eq!(f.status(StatusGranularity::Detailed), RewardStatus::MissingPayoutInfo);
        assert_eq!(f.status(StatusGranularity::Summary), RewardStatus::Processing);
    }

    #[test]
    fn incomplete_identity_is_missing_payout_info() {
        let mut info = complete_info(person());
        info.identity = Some(Identity::Person {
            first_name: Some("Ada".to_string()),
            last_name: Some("  ".to_string()),
        });
        assert_eq!(
            facts(Some(&info), Currency::Eth).status(StatusGranularity::Detailed),
            RewardStatus::MissingPayoutInfo
        );
    }

    #[test]
    fn wallet_must_match_currency_network() {
        let mut info = complete_info(person());
        info.wallets = vec![wallet(Network::Ethereum)];
        assert_eq!(
            facts(Some(&info), Currency::Eth).status(StatusGranularity::Detailed),
            RewardStatus::Processing
        );
        assert_eq!(
            facts(Some(&info), Currency::Stark).status(StatusGranularity::Detailed),
            RewardStatus::MissingPayoutInfo
        );
        assert_eq!(
            facts(Some(&info), Currency::Apt).status(StatusGranularity::Detailed),
            RewardStatus::MissingPayoutInfo
        );
    }

    #[test]
    fn usd_follows_preferred_method() {
        let mut info = complete_info(person());
        info.usd_preferred_method = Some(PreferredPayoutMethod::Fiat);
        assert_eq!(
            facts(Some(&info), Currency::Usd).status(StatusGranularity::Detailed),
            RewardStatus::MissingPayoutInfo
        );

        info.bank_account = Some(BankAccount {
            iban: "FR7630006000011234567890189".to_string(),
            bic: "AGRIFRPP".to_string(),
        });
        assert_eq!(
            facts(Some(&info), Currency::Usd).status(StatusGranularity::Detailed),
            RewardStatus::Processing
        );

        info.usd_preferred_method = Some(PreferredPayoutMethod::Crypto);
        info.wallets.clear();
        assert_eq!(
            facts(Some(&info), Currency::Usd).status(StatusGranularity::Detailed),
            RewardStatus::MissingPayoutInfo
        );
    }

    #[test]
    fn company_waits_for_invoice() {
        let info = complete_info(company());
        let mut f = facts(Some(&info), Currency::Op);
        assert_eq!(f.status(StatusGranularity::Detailed), RewardStatus::PendingInvoice);
        assert_eq!(f.status(StatusGranularity::Summary), RewardStatus::Processing);
        f.invoice_received = true;
        assert_eq!(f.status(StatusGranularity::Detailed), RewardStatus::Processing);
    }

    #[test]
    fn person_never_waits_for_invoice() {
        let info = complete_info(person());
        assert_eq!(
            facts(Some(&info), Currency::Op).status(StatusGranularity::Detailed),
            RewardStatus::Processing
        );
    }

    #[test]
    fn serializes_screaming_snake_case() {
        let json = serde_json::to_string(&RewardStatus::MissingPayoutInfo).unwrap_or_default();
        assert_eq!(json, "\"MISSING_PAYOUT_INFO\"");
    }
}
