// services/billing.rs - subscription billing summaries

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::database::{record::timestamp_of, Collection, Record, Store};
use crate::filter::Filter;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub students: usize,
    pub teachers: usize,
    pub documents: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    pub school_id: String,
    pub subscription_plan: Option<String>,
    pub subscription_status: Option<String>,
    pub monthly_fee: Decimal,
    pub next_billing_date: String,
    pub usage: Usage,
    /// Plan changes, newest first
    pub history: Vec<Record>,
}

/// Premium schools pay 99 a month, every other plan 49
pub fn monthly_fee(plan: Option<&str>) -> Decimal {
    match plan {
        Some("premium") => Decimal::from(99),
        _ => Decimal::from(49),
    }
}

/// Plans renew 30 days out
pub fn next_billing_date() -> DateTime<Utc> {
    Utc::now() + Duration::days(30)
}

pub async fn summary(store: &Store, school: &Record) -> BillingSummary {
    let school_id = school.id().unwrap_or_default().to_string();
    let by_school = Filter::new().eq("schoolId", school_id.as_str());
    let plan = school.get_str("subscriptionPlan").map(str::to_string);

    let mut history = store.find(Collection::Billing, &by_school).await;
    history.reverse();

    BillingSummary {
        monthly_fee: monthly_fee(plan.as_deref()),
        subscription_plan: plan,
        subscription_status: school.get_str("subscriptionStatus").map(str::to_string),
        next_billing_date: timestamp_of(next_billing_date()),
        usage: Usage {
            students: store.count(Collection::Students, &by_school).await,
            teachers: store.count(Collection::Teachers, &by_school).await,
            documents: store.count(Collection::Documents, &by_school).await,
        },
        history,
        school_id,
    }
}

/// Record a plan or status change for the school's billing history
pub async fn record_change(store: &Store, school: &Record, changed_by: &str) -> Record {
    let plan = school.get_str("subscriptionPlan");
    let entry = Record::new()
        .with("schoolId", school.id())
        .with("subscriptionPlan", plan)
        .with("subscriptionStatus", school.get_str("subscriptionStatus"))
        .with("monthlyFee", serde_json::json!(monthly_fee(plan)))
        .with("changedBy", changed_by);
    store.create(Collection::Billing, entry).await
}
