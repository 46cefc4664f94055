//! Test Request Generator
//!
//! Generates randomized prediction requests and posts them to a running
//! Credit Scoring API instance, exercising both request schemas and both
//! classifiers.

use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Request generator producing low-risk and high-risk payloads
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    /// Generate a low-risk customer payload for /predict/lr and /predict/rf
    fn generate_customer_low_risk(&mut self) -> Value {
        self.request_counter += 1;
        json!({
            "Recency": self.rng.gen_range(1.0..30.0),
            "Frequency": self.rng.gen_range(5.0..50.0),
            "Monetary": self.rng.gen_range(100.0..5000.0),
            "TransactionHour": self.rng.gen_range(8..20),
            "TransactionDay": self.rng.gen_range(1..29),
            "TransactionMonth": self.rng.gen_range(1..13),
            "CurrencyCode": self.random_choice(&["UGX", "KES", "TZS"]),
            "CountryCode": self.random_choice(&["256", "254", "255"]),
            "ProductId": self.random_choice(&["P1", "P2", "P3", "P4"]),
        })
    }

    /// Generate a high-risk customer payload (stale, infrequent, low value)
    fn generate_customer_high_risk(&mut self) -> Value {
        self.request_counter += 1;
        json!({
            "Recency": self.rng.gen_range(90.0..365.0),
            "Frequency": self.rng.gen_range(1.0..3.0),
            "Monetary": self.rng.gen_range(1.0..100.0),
            "TransactionHour": self.rng.gen_range(0..6),
            "TransactionDay": self.rng.gen_range(1..29),
            "TransactionMonth": self.rng.gen_range(1..13),
            "CurrencyCode": "UGX",
            "CountryCode": "256",
            "ProductId": self.random_choice(&["P9", "P10"]),
        })
    }

    /// Generate a transaction payload for /predict_lr/ and /predict_rf/
    fn generate_transaction(&mut self, high_risk: bool) -> Value {
        self.request_counter += 1;
        let (recency, frequency, amount) = if high_risk {
            (
                self.rng.gen_range(90.0..365.0),
                self.rng.gen_range(1.0..3.0),
                self.rng.gen_range(1.0..50.0),
            )
        } else {
            (
                self.rng.gen_range(1.0..30.0),
                self.rng.gen_range(5.0..50.0),
                self.rng.gen_range(100.0..2000.0),
            )
        };

        json!({
            "Recency": recency,
            "Frequency": frequency,
            "Monetary": self.rng.gen_range(100.0..5000.0),
            "TransactionCount": self.rng.gen_range(1..200),
            "TransactionAmount": amount,
            "Stability": self.rng.gen_range(0.0..1.0),
            "Value": self.rng.gen_range(10.0..1000.0),
            "PricingStrategy": self.random_choice(&["0", "1", "2", "4"]),
            "Region": self.random_choice(&["Central", "Eastern", "Northern", "Western"]),
            "PaymentType": self.random_choice(&["airtime", "data", "utility", "tv"]),
            "DeviceType": self.random_choice(&["android", "ios", "web"]),
        })
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("request_generator=info".parse()?),
        )
        .init();

    info!("Starting Test Request Generator");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("http://localhost:8000");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let high_risk_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        count = count,
        high_risk_rate = high_risk_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::new();

    // Confirm the service is up before driving load
    match client.get(base_url).send().await {
        Ok(response) => {
            let status: Value = response.json().await?;
            info!(status = %status, "Service is up");
        }
        Err(e) => {
            warn!(error = %e, "Service not reachable, exiting");
            return Ok(());
        }
    }

    let endpoints = [
        ("/predict/lr", true),
        ("/predict/rf", true),
        ("/predict_lr/", false),
        ("/predict_rf/", false),
    ];

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();
    let mut positive_count = 0u64;
    let mut error_count = 0u64;

    info!("Starting to post {} requests...", count);

    for i in 0..count {
        let high_risk = rng.gen_bool(high_risk_rate);
        let (path, customer_schema) = endpoints[(i % endpoints.len() as u64) as usize];

        let payload = if customer_schema {
            if high_risk {
                generator.generate_customer_high_risk()
            } else {
                generator.generate_customer_low_risk()
            }
        } else {
            generator.generate_transaction(high_risk)
        };

        let url = format!("{}{}", base_url, path);
        match client.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                let body: Value = response.json().await?;
                if body["prediction"].as_i64() == Some(1) {
                    positive_count += 1;
                }
                if let Some(probability) = body["probability"].as_f64() {
                    info!(
                        endpoint = path,
                        prediction = body["prediction"].as_i64(),
                        probability = probability,
                        "Scored"
                    );
                }
            }
            Ok(response) => {
                error_count += 1;
                warn!(endpoint = path, status = %response.status(), "Request rejected");
            }
            Err(e) => {
                error_count += 1;
                warn!(endpoint = path, error = %e, "Request failed");
            }
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Posted {}/{} requests ({} positive labels, {} errors)",
                i + 1,
                count,
                positive_count,
                error_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Posted {} requests ({} positive labels, {} errors)",
        count, positive_count, error_count
    );

    Ok(())
}
