use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use lambda_runtime::{service_fn, LambdaEvent};
use safety::doses::DoseMonitor;
use safety::interactions::{InteractionCheckRequest, InteractionEngine, RuleBook};
use safety::records::{
    AdministeredDose, InMemoryStore, MedicationRepository, PrescriptionRepository, Snapshot,
};
use safety::verification::{AdministrationVerifier, BarcodeIndex, VerificationRequest};
use safety::{Error, MonitorConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use ulid::Ulid;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum SafetyRequest {
    DueDoses {
        patient_id: Option<String>,
        window_minutes: Option<i64>,
    },
    OverdueDoses {
        patient_id: Option<String>,
        threshold_minutes: Option<i64>,
    },
    DaySchedule {
        patient_id: String,
    },
    CheckInteractions {
        #[serde(default)]
        request: InteractionCheckRequest,
    },
    CheckPrescription {
        medication_id: String,
        #[serde(default)]
        request: InteractionCheckRequest,
        #[serde(default)]
        override_requested: bool,
    },
    VerifyAdministration {
        patient_barcode: String,
        medication_barcode: String,
        prescription_id: String,
        administered_dose: AdministeredDose,
        administered_route: String,
        administered_at: Option<DateTime<Utc>>,
        #[serde(default)]
        barcodes: BarcodeIndex,
    },
}

/// Invocation payload: an action plus the records it runs against.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(flatten)]
    request: SafetyRequest,
    #[serde(default)]
    snapshot: Snapshot,
    now: Option<DateTime<Utc>>,
}

struct Services {
    config: MonitorConfig,
    engine: InteractionEngine,
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = MonitorConfig::from_env();
    config.validate()?;
    let rules = load_rules()?;

    let services = Services {
        config,
        engine: InteractionEngine::new(Arc::new(rules)),
    };

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| async {
        handle(event, &services).await
    }))
    .await
}

fn load_rules() -> anyhow::Result<RuleBook> {
    let Ok(path) = std::env::var("INTERACTION_RULES_PATH") else {
        tracing::warn!("INTERACTION_RULES_PATH not set, interaction checks use an empty rule book");
        return Ok(RuleBook::default());
    };

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read interaction rules from {}", path))?;
    let rules = RuleBook::from_json(&json)
        .with_context(|| format!("Invalid interaction rules in {}", path))?;
    if rules.is_empty() {
        tracing::warn!("Interaction rule file {} contains no rules", path);
    } else {
        tracing::info!("Loaded interaction rules from {}", path);
    }
    Ok(rules)
}

async fn handle(
    event: LambdaEvent<Value>,
    services: &Services,
) -> Result<Value, lambda_runtime::Error> {
    let request_id = Ulid::new().to_string();
    tracing::info!("Handling request {} ({})", request_id, event.context.request_id);

    let envelope: Envelope =
        serde_json::from_value(event.payload).context("Invalid safety request")?;

    match dispatch(envelope, services).await {
        Ok(result) => Ok(json!({ "request_id": request_id, "result": result })),
        Err(e) => {
            tracing::error!("Request {} failed: {:#}", request_id, e);
            Err(e.into())
        }
    }
}

async fn dispatch(envelope: Envelope, services: &Services) -> anyhow::Result<Value> {
    let now = envelope.now.unwrap_or_else(Utc::now);
    let store = Arc::new(InMemoryStore::new(envelope.snapshot));
    let monitor = DoseMonitor::new(
        store.clone(),
        store.clone(),
        store.clone(),
        services.config,
    );

    let result = match envelope.request {
        SafetyRequest::DueDoses {
            patient_id,
            window_minutes,
        } => serde_json::to_value(
            monitor
                .due_doses(patient_id.as_deref(), now, window_minutes)
                .await?,
        )?,
        SafetyRequest::OverdueDoses {
            patient_id,
            threshold_minutes,
        } => serde_json::to_value(
            monitor
                .overdue_doses(patient_id.as_deref(), now, threshold_minutes)
                .await?,
        )?,
        SafetyRequest::DaySchedule { patient_id } => {
            serde_json::to_value(monitor.day_schedule(&patient_id, now).await?)?
        }
        SafetyRequest::CheckInteractions { request } => {
            serde_json::to_value(services.engine.batch_check(request).await?)?
        }
        SafetyRequest::CheckPrescription {
            medication_id,
            request,
            override_requested,
        } => {
            let (interactions, decision) = services
                .engine
                .check_new_prescription(&medication_id, request, override_requested)
                .await?;
            json!({ "interactions": interactions, "decision": decision })
        }
        SafetyRequest::VerifyAdministration {
            patient_barcode,
            medication_barcode,
            prescription_id,
            administered_dose,
            administered_route,
            administered_at,
            barcodes,
        } => {
            let prescription = PrescriptionRepository::find_by_id(store.as_ref(), &prescription_id)
                .await?
                .ok_or_else(|| Error::not_found(format!("prescription {}", prescription_id)))?;
            let medication =
                MedicationRepository::find_by_id(store.as_ref(), &prescription.medication_id)
                    .await?
                    .ok_or_else(|| {
                        Error::not_found(format!("medication {}", prescription.medication_id))
                    })?;

            let request = VerificationRequest::new(
                patient_barcode,
                medication_barcode,
                prescription_id,
                administered_dose,
                administered_route,
                administered_at.unwrap_or(now),
            );
            let verifier = AdministrationVerifier::new(Arc::new(barcodes));
            serde_json::to_value(verifier.verify(&request, &prescription, &medication)?)?
        }
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services(rules: RuleBook) -> Services {
        Services {
            config: MonitorConfig::default(),
            engine: InteractionEngine::new(Arc::new(rules)),
        }
    }

    fn snapshot() -> Value {
        json!({
            "medications": [
                { "id": "med-1", "name": "Metformin" },
                { "id": "med-2", "name": "Insulin", "is_high_alert": true }
            ],
            "prescriptions": [
                {
                    "id": "rx-1",
                    "patient_id": "pat-1",
                    "medication_id": "med-1",
                    "prescriber_id": "dr-1",
                    "dosage": { "value": 500.0, "unit": "mg", "route": "oral", "frequency": "BID" },
                    "start_date": "2024-03-01T00:00:00Z"
                }
            ],
            "administrations": []
        })
    }

    fn envelope(body: Value) -> Envelope {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn reports_overdue_doses() {
        let body = json!({
            "action": "overdue_doses",
            "patient_id": "pat-1",
            "now": "2024-03-10T10:00:00Z",
            "snapshot": snapshot()
        });

        let result = dispatch(envelope(body), &services(RuleBook::default()))
            .await
            .unwrap();
        let items = result.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["overdue_minutes"], 60);
        assert_eq!(items[0]["severity"], "high");
    }

    #[tokio::test]
    async fn reports_due_doses() {
        let body = json!({
            "action": "due_doses",
            "now": "2024-03-10T16:30:00Z",
            "snapshot": snapshot()
        });

        let result = dispatch(envelope(body), &services(RuleBook::default()))
            .await
            .unwrap();
        let items = result.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["scheduled_time"], "2024-03-10T17:00:00Z");
    }

    #[tokio::test]
    async fn blocks_prescription_with_severe_interaction() {
        let rules = RuleBook::from_json(
            r#"{ "drug_drug": [
                { "medication_ids": ["warfarin", "aspirin"], "severity": "severe" }
            ] }"#,
        )
        .unwrap();
        let body = json!({
            "action": "check_prescription",
            "medication_id": "aspirin",
            "request": { "medication_ids": ["warfarin"] }
        });

        let result = dispatch(envelope(body), &services(rules)).await.unwrap();
        assert_eq!(result["decision"]["allowed"], false);
        assert_eq!(result["interactions"]["total_interaction_count"], 1);
    }

    #[tokio::test]
    async fn verifies_administration() {
        let body = json!({
            "action": "verify_administration",
            "patient_barcode": "WB-0001",
            "medication_barcode": "0093-1048",
            "prescription_id": "rx-1",
            "administered_dose": { "value": 250.0, "unit": "mg" },
            "administered_route": "oral",
            "administered_at": "2024-03-10T09:10:00Z",
            "barcodes": {
                "patients": { "WB-0001": "pat-1" },
                "medications": { "0093-1048": "med-1" }
            },
            "snapshot": snapshot()
        });

        let result = dispatch(envelope(body), &services(RuleBook::default()))
            .await
            .unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["warnings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn oversized_window_is_an_error() {
        let body = json!({
            "action": "due_doses",
            "window_minutes": i64::MAX,
            "now": "2024-03-10T16:30:00Z",
            "snapshot": snapshot()
        });

        let result = dispatch(envelope(body), &services(RuleBook::default())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unknown_prescription_is_an_error() {
        let body = json!({
            "action": "verify_administration",
            "patient_barcode": "WB-0001",
            "medication_barcode": "0093-1048",
            "prescription_id": "rx-404",
            "administered_dose": { "value": 500.0, "unit": "mg" },
            "administered_route": "oral"
        });

        let result = dispatch(envelope(body), &services(RuleBook::default())).await;
        assert!(result.is_err());
    }
}
