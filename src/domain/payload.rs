//! Envelopes framing the domain records on the wire.
//!
//! Outbound envelopes always carry their records; inbound ones use `Option`
//! because the register may send `null` in place of the record.

use super::model::{Customer, Employee, Order};
use serde::{Deserialize, Serialize};

/// Sent on the `employee` channel to sign in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePayload {
    pub employee: Employee,
}

/// Sent on the `order` channel for a bill payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillPayPayload {
    pub employee: Employee,
    pub order: Order,
}

/// Sent on the `order` channel to redeem a reward for the current customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemPayload {
    pub employee: Employee,
    pub order: Order,
    pub customer: Customer,
}

/// Received on the `customer` channel when a customer checks in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomerPayload {
    #[serde(default)]
    pub customer: Option<Customer>,
}

/// Received on the `order` channel when a customer picks a reward.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderPayload {
    #[serde(default)]
    pub order: Option<Order>,
}
