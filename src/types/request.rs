//! Request schemas for the prediction endpoints.
//!
//! Field names on the wire are PascalCase, matching the column names the
//! models were trained on. Every field is required; a missing or mistyped
//! field is rejected during deserialization, before any scoring attempt.

use serde::{Deserialize, Serialize};

/// Customer behavioral record scored by `/predict/lr` and `/predict/rf`.
///
/// Recency/Frequency/Monetary are RFM aggregates over the customer's
/// transaction history; the remaining fields describe the most recent
/// transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerData {
    /// Days since the customer's last transaction
    pub recency: f64,

    /// Number of transactions in the observation window
    pub frequency: f64,

    /// Total transaction value in the observation window
    pub monetary: f64,

    /// Hour of day of the transaction (0-23)
    pub transaction_hour: i32,

    /// Day of month of the transaction (1-31)
    pub transaction_day: i32,

    /// Month of the transaction (1-12)
    pub transaction_month: i32,

    /// Transaction currency code (e.g. "UGX")
    pub currency_code: String,

    /// Numeric country dialing code as a string (e.g. "256")
    pub country_code: String,

    /// Product identifier (e.g. "P1")
    pub product_id: String,
}

/// Transaction-level record scored by `/predict_lr/` and `/predict_rf/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransactionData {
    /// Days since the customer's last transaction
    pub recency: f64,

    /// Number of transactions in the observation window
    pub frequency: f64,

    /// Total transaction value in the observation window
    pub monetary: f64,

    /// Count of transactions on the account
    pub transaction_count: i64,

    /// Amount of the transaction being scored
    pub transaction_amount: f64,

    /// Spending stability measure from the training pipeline
    pub stability: f64,

    /// Transaction value measure from the training pipeline
    pub value: f64,

    /// Pricing strategy bucket
    pub pricing_strategy: String,

    /// Customer region
    pub region: String,

    /// Payment instrument type
    pub payment_type: String,

    /// Device type used for the transaction
    pub device_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_data_wire_names() {
        let json = r#"{
            "Recency": 1.0, "Frequency": 2.0, "Monetary": 100.0,
            "TransactionHour": 10, "TransactionDay": 1, "TransactionMonth": 1,
            "CurrencyCode": "UGX", "CountryCode": "256", "ProductId": "P1"
        }"#;

        let data: CustomerData = serde_json::from_str(json).unwrap();
        assert_eq!(data.recency, 1.0);
        assert_eq!(data.transaction_hour, 10);
        assert_eq!(data.currency_code, "UGX");
        assert_eq!(data.product_id, "P1");
    }

    #[test]
    fn test_customer_data_missing_field_rejected() {
        // No ProductId: must fail at deserialization, never reach scoring
        let json = r#"{
            "Recency": 1.0, "Frequency": 2.0, "Monetary": 100.0,
            "TransactionHour": 10, "TransactionDay": 1, "TransactionMonth": 1,
            "CurrencyCode": "UGX", "CountryCode": "256"
        }"#;

        assert!(serde_json::from_str::<CustomerData>(json).is_err());
    }

    #[test]
    fn test_transaction_data_roundtrip() {
        let data = TransactionData {
            recency: 5.0,
            frequency: 12.0,
            monetary: 2500.0,
            transaction_count: 40,
            transaction_amount: 120.5,
            stability: 0.8,
            value: 310.0,
            pricing_strategy: "2".to_string(),
            region: "Central".to_string(),
            payment_type: "airtime".to_string(),
            device_type: "android".to_string(),
        };

        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"TransactionCount\":40"));
        assert!(json.contains("\"DeviceType\":\"android\""));

        let back: TransactionData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.transaction_count, data.transaction_count);
        assert_eq!(back.region, data.region);
    }

    #[test]
    fn test_transaction_data_wrong_type_rejected() {
        let json = r#"{
            "Recency": 5.0, "Frequency": 12.0, "Monetary": 2500.0,
            "TransactionCount": "forty", "TransactionAmount": 120.5,
            "Stability": 0.8, "Value": 310.0,
            "PricingStrategy": "2", "Region": "Central",
            "PaymentType": "airtime", "DeviceType": "android"
        }"#;

        assert!(serde_json::from_str::<TransactionData>(json).is_err());
    }
}
